use crate::models::{VitalSigns, VitalValue};

/// Systolic and diastolic pressure in mmHg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BloodPressure {
    pub systolic: u32,
    pub diastolic: u32,
}

/// Parse "systolic/diastolic" integers. Anything else is `None`.
pub fn parse_blood_pressure(value: &VitalValue) -> Option<BloodPressure> {
    let VitalValue::Text(text) = value else {
        return None;
    };
    let (systolic, diastolic) = text.trim().split_once('/')?;
    Some(BloodPressure {
        systolic: systolic.trim().parse().ok()?,
        diastolic: diastolic.trim().parse().ok()?,
    })
}

pub fn reading(value: &Option<VitalValue>) -> Option<f64> {
    value.as_ref().and_then(VitalValue::as_number)
}

/// Present measurements with their units, in form order.
pub fn vitals_parts(vitals: &VitalSigns) -> Vec<String> {
    let shown = |v: &Option<VitalValue>| v.as_ref().and_then(VitalValue::display);
    let mut parts = Vec::new();

    if let Some(v) = shown(&vitals.pulse) {
        parts.push(format!("דופק {v} לדקה"));
    }
    if let Some(v) = shown(&vitals.blood_pressure) {
        parts.push(format!("לחץ דם {v} מ\"מ כספית"));
    }
    if let Some(v) = shown(&vitals.temperature) {
        parts.push(format!("חום {v}°C"));
    }
    if let Some(v) = shown(&vitals.saturation) {
        parts.push(format!("סטורציה {v}%"));
    }
    if let Some(v) = shown(&vitals.respiratory_rate) {
        parts.push(format!("קצב נשימה {v} לדקה"));
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> VitalValue {
        VitalValue::Text(s.into())
    }

    #[test]
    fn parses_blood_pressure() {
        assert_eq!(
            parse_blood_pressure(&text("165/95")),
            Some(BloodPressure {
                systolic: 165,
                diastolic: 95
            })
        );
        assert_eq!(
            parse_blood_pressure(&text(" 120 / 80 ")),
            Some(BloodPressure {
                systolic: 120,
                diastolic: 80
            })
        );
    }

    #[test]
    fn rejects_malformed_blood_pressure() {
        assert_eq!(parse_blood_pressure(&text("high")), None);
        assert_eq!(parse_blood_pressure(&text("120")), None);
        assert_eq!(parse_blood_pressure(&text("120/eighty")), None);
        assert_eq!(parse_blood_pressure(&VitalValue::Number(120.0)), None);
    }

    #[test]
    fn lists_only_present_measurements() {
        let vitals = VitalSigns {
            pulse: Some(VitalValue::Number(88.0)),
            temperature: Some(text("37.2")),
            saturation: Some(text("  ")),
            ..Default::default()
        };
        assert_eq!(vitals_parts(&vitals), vec!["דופק 88 לדקה", "חום 37.2°C"]);
    }

    #[test]
    fn no_vitals_no_parts() {
        assert!(vitals_parts(&VitalSigns::default()).is_empty());
    }
}
