//! Fixed Hebrew wording of the locally built narrative.

use crate::models::Gender;

pub const LABEL_COMPLAINT_DESCRIPTION: &str = "תיאור התלונה";
pub const LABEL_ASSOCIATED_SYMPTOMS: &str = "תסמינים נלווים";
pub const LABEL_ASSOCIATED_FINDINGS: &str = "ממצאים נוספים";
pub const LABEL_AGGRAVATING: &str = "גורמים מחמירים";
pub const LABEL_RELIEVING: &str = "גורמים מקלים";
pub const LABEL_TREATMENTS: &str = "טיפולים שננקטו";
pub const LABEL_NEGATIVE_FINDINGS: &str = "ממצאים שליליים";
pub const LABEL_NOTES: &str = "הערות";
pub const LABEL_RED_FLAGS: &str = "דגלים אדומים";
pub const LABEL_VITALS: &str = "סימנים חיוניים";

pub const DEFAULT_SECTIONS: &str = "ללא";
pub const DEFAULT_ALLERGIES: &str = "ללא אלרגיות ידועות";
pub const DEFAULT_PROFILE: &str = "לא צוין";

pub const TECHNICAL_ISSUE_NOTICE: &str = "לא ניתן היה להפיק סיכום מפורט עקב תקלה טכנית.";

pub fn age_phrase(gender: Gender, age: u32) -> String {
    let noun = match gender {
        Gender::Male => "בן",
        Gender::Female => "בת",
        Gender::Other => "בן/בת",
    };
    format!("{noun} {age}")
}

pub fn smoking_phrase(gender: Gender, is_smoker: bool) -> &'static str {
    match (gender, is_smoker) {
        (Gender::Male, true) => "מעשן",
        (Gender::Male, false) => "לא מעשן",
        (Gender::Female, true) => "מעשנת",
        (Gender::Female, false) => "לא מעשנת",
        (Gender::Other, true) => "מעשן/ת",
        (Gender::Other, false) => "לא מעשן/ת",
    }
}

pub fn no_regular_medication(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "אינו נוטל תרופות באופן קבוע",
        Gender::Female => "אינה נוטלת תרופות באופן קבוע",
        Gender::Other => "אינו/ה נוטל/ת תרופות באופן קבוע",
    }
}

/// "denies <finding>" in the patient's grammatical gender.
pub fn denies(gender: Gender, finding: &str) -> String {
    let verb = match gender {
        Gender::Male => "מכחיש",
        Gender::Female => "מכחישה",
        Gender::Other => "מכחיש/ה",
    };
    format!("{verb} {finding}")
}

/// `text` trimmed, or `default` when blank.
pub fn or_default<'a>(text: &'a str, default: &'a str) -> &'a str {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        default
    } else {
        trimmed
    }
}
