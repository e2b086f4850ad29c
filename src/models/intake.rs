use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a collaborator hands the pipeline a record that breaks
/// the intake contract. These are programming errors, not degradations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("Intake record is missing required field: {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    #[serde(other)]
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

/// A vital-sign value as entered on the form: either a number or free text
/// ("120/80", "37,5", "n/a").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VitalValue {
    Number(f64),
    Text(String),
}

impl VitalValue {
    /// Numeric reading, or `None` for blank / non-numeric text. A comma is
    /// accepted as the decimal separator.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            VitalValue::Number(n) if n.is_finite() => Some(*n),
            VitalValue::Number(_) => None,
            VitalValue::Text(s) => s
                .trim()
                .replacen(',', ".", 1)
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite()),
        }
    }

    /// Display form, `None` when blank.
    pub fn display(&self) -> Option<String> {
        match self {
            VitalValue::Number(n) => Some(format_number(*n)),
            VitalValue::Text(s) => {
                let t = s.trim();
                (!t.is_empty()).then(|| t.to_string())
            }
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VitalSigns {
    pub pulse: Option<VitalValue>,
    pub blood_pressure: Option<VitalValue>,
    pub temperature: Option<VitalValue>,
    pub saturation: Option<VitalValue>,
    pub respiratory_rate: Option<VitalValue>,
}

/// Structured and free-text answers collected by the intake form.
///
/// Owned by the caller. The pipeline reads it and only ever writes
/// `narrative`, through [`PatientIntakeRecord::attach_narrative`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientIntakeRecord {
    pub age: u32,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub is_smoker: bool,
    pub main_complaint: String,
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub medical_sections: String,
    #[serde(default)]
    pub allergies: String,
    #[serde(default)]
    pub medications: String,
    #[serde(default)]
    pub vital_signs: VitalSigns,
    #[serde(default)]
    pub standard_answers: BTreeMap<String, String>,
    #[serde(default)]
    pub dynamic_answers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

impl PatientIntakeRecord {
    /// Check the fields the pipeline cannot work without.
    pub fn validate(&self) -> Result<(), IntakeError> {
        if self.main_complaint.trim().is_empty() {
            return Err(IntakeError::MissingField("mainComplaint"));
        }
        Ok(())
    }

    /// Standard answers followed by dynamic answers, in key order within each.
    pub fn all_answers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.standard_answers
            .iter()
            .chain(self.dynamic_answers.iter())
            .map(|(q, a)| (q.as_str(), a.as_str()))
    }

    pub fn attach_narrative(&mut self, text: impl Into<String>) {
        self.narrative = Some(text.into());
    }
}
