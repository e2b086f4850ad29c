use crate::models::{PatientIntakeRecord, RedFlag, VitalSigns};

use super::vitals::{parse_blood_pressure, reading};

// ═══════════════════════════════════════════════════════════
// Messages
// ═══════════════════════════════════════════════════════════

pub const MSG_HEADACHE_SUDDEN: &str = "כאב ראש בהופעה פתאומית, יש לשקול הערכה נוירולוגית דחופה";
pub const MSG_HEADACHE_NECK: &str = "כאב ראש עם נוקשות צוואר, יש לשלול דלקת קרום המוח";
pub const MSG_HEADACHE_NEURO: &str = "כאב ראש עם חסר נוירולוגי, נדרשת הערכה נוירולוגית דחופה";
pub const MSG_CHEST_DYSPNEA: &str = "כאב בחזה עם קוצר נשימה, יש לשלול אירוע לבבי או ריאתי חריף";
pub const MSG_CHEST_RADIATION: &str = "כאב בחזה המקרין ליד או ללסת, יש לשלול תסמונת כלילית חריפה";
pub const MSG_CHEST_SWEATING: &str = "כאב בחזה עם הזעה, יש לשלול תסמונת כלילית חריפה";
pub const MSG_ABDOMEN_BLEEDING: &str = "כאב בטן עם סימני דימום ממערכת העיכול";
pub const MSG_ABDOMEN_RIGID: &str = "כאב בטן עם קשיחות דופן, יש לשלול בטן חריפה";
pub const MSG_ABDOMEN_PREGNANCY: &str = "כאב בטן בהריון, יש לשלול הריון מחוץ לרחם";
pub const MSG_DYSPNEA_REST: &str = "קוצר נשימה במנוחה";
pub const MSG_DYSPNEA_CYANOSIS: &str = "קוצר נשימה עם כיחלון";
pub const MSG_DYSPNEA_CHEST: &str = "קוצר נשימה עם כאב בחזה, יש לשלול תסחיף ריאתי או אירוע לבבי";
pub const MSG_HEAD_INJURY_LOC: &str = "חבלת ראש עם אובדן הכרה, נדרשת הדמיה דחופה";
pub const MSG_HEAD_INJURY_VOMITING: &str = "חבלת ראש עם הקאות";
pub const MSG_HEAD_INJURY_ANTICOAGULANT: &str = "חבלת ראש במטופל הנוטל נוגדי קרישה";

pub const MSG_SEVERE_BREATHING: &str = "קושי נשימתי משמעותי";
pub const MSG_BLOODY_VOMIT: &str = "הקאה דמית";
pub const MSG_VERY_HIGH_FEVER: &str = "דיווח על חום גבוה מאוד";
pub const MSG_CONFUSION: &str = "בלבול או חוסר התמצאות";
pub const MSG_LOSS_OF_CONSCIOUSNESS: &str = "אובדן הכרה";

pub const MSG_HIGH_FEVER: &str = "חום גבוה מעל 39 מעלות";
pub const MSG_TACHYCARDIA: &str = "דופק מהיר מאוד";
pub const MSG_BRADYCARDIA: &str = "דופק איטי מאוד";
pub const MSG_LOW_SATURATION: &str = "סטורציה נמוכה";
pub const MSG_HYPERTENSION: &str = "לחץ דם גבוה";

// ═══════════════════════════════════════════════════════════
// Rule tables
// ═══════════════════════════════════════════════════════════

/// Complaint families with their own red-flag rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplaintCategory {
    Headache,
    ChestPain,
    AbdominalPain,
    Dyspnea,
    HeadInjury,
}

impl ComplaintCategory {
    pub const ALL: [ComplaintCategory; 5] = [
        ComplaintCategory::Headache,
        ComplaintCategory::ChestPain,
        ComplaintCategory::AbdominalPain,
        ComplaintCategory::Dyspnea,
        ComplaintCategory::HeadInjury,
    ];

    fn keywords(self) -> &'static [&'static str] {
        match self {
            ComplaintCategory::Headache => &["כאב ראש", "כאבי ראש", "מיגרנה", "headache", "migraine"],
            ComplaintCategory::ChestPain => {
                &["כאב בחזה", "כאבים בחזה", "לחץ בחזה", "chest pain", "chest pressure"]
            }
            ComplaintCategory::AbdominalPain => &[
                "כאב בטן",
                "כאבי בטן",
                "כאב בבטן",
                "abdominal",
                "stomach",
                "belly",
            ],
            ComplaintCategory::Dyspnea => &[
                "קוצר נשימה",
                "קשיי נשימה",
                "קושי בנשימה",
                "dyspnea",
                "shortness of breath",
            ],
            ComplaintCategory::HeadInjury => &[
                "חבלת ראש",
                "חבלה בראש",
                "מכה בראש",
                "head injury",
                "head trauma",
            ],
        }
    }

    fn rules(self) -> &'static [FlagRule] {
        match self {
            ComplaintCategory::Headache => HEADACHE_RULES,
            ComplaintCategory::ChestPain => CHEST_PAIN_RULES,
            ComplaintCategory::AbdominalPain => ABDOMINAL_PAIN_RULES,
            ComplaintCategory::Dyspnea => DYSPNEA_RULES,
            ComplaintCategory::HeadInjury => HEAD_INJURY_RULES,
        }
    }

    /// Case-insensitive substring match on the main complaint.
    pub fn matches(self, complaint: &str) -> bool {
        contains_any(&complaint.to_lowercase(), self.keywords())
    }

    /// Every category the complaint belongs to, in table order.
    pub fn detect(complaint: &str) -> Vec<ComplaintCategory> {
        Self::ALL
            .into_iter()
            .filter(|c| c.matches(complaint))
            .collect()
    }
}

/// Which text of an answered question a rule scans for its keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Answer,
    Question,
    Either,
}

/// Fires when some positively answered question carries a keyword in scope.
struct FlagRule {
    scope: Scope,
    keywords: &'static [&'static str],
    message: &'static str,
}

const HEADACHE_RULES: &[FlagRule] = &[
    FlagRule {
        scope: Scope::Either,
        keywords: &["sudden", "thunderclap", "worst headache", "פתאומי", "בפתאומיות", "הכאב הגרוע ביותר"],
        message: MSG_HEADACHE_SUDDEN,
    },
    FlagRule {
        scope: Scope::Either,
        keywords: &["stiff neck", "neck stiffness", "נוקשות צוואר", "צוואר נוקשה"],
        message: MSG_HEADACHE_NECK,
    },
    FlagRule {
        scope: Scope::Either,
        keywords: &["weakness", "numbness", "slurred", "double vision", "חולשה", "נימול", "הפרעה בדיבור", "ראייה כפולה"],
        message: MSG_HEADACHE_NEURO,
    },
];

const CHEST_PAIN_RULES: &[FlagRule] = &[
    FlagRule {
        scope: Scope::Either,
        keywords: &["shortness of breath", "dyspnea", "קוצר נשימה", "קשיי נשימה", "קושי בנשימה"],
        message: MSG_CHEST_DYSPNEA,
    },
    FlagRule {
        scope: Scope::Answer,
        keywords: &["left arm", "jaw", "shoulder", "יד שמאל", "לסת", "כתף"],
        message: MSG_CHEST_RADIATION,
    },
    FlagRule {
        scope: Scope::Either,
        keywords: &["sweat", "הזעה", "מזיע"],
        message: MSG_CHEST_SWEATING,
    },
];

const ABDOMINAL_PAIN_RULES: &[FlagRule] = &[
    FlagRule {
        scope: Scope::Either,
        keywords: &["blood in stool", "bloody stool", "black stool", "דם בצואה", "צואה שחורה"],
        message: MSG_ABDOMEN_BLEEDING,
    },
    FlagRule {
        scope: Scope::Either,
        keywords: &["rigid", "board-like", "בטן קשה", "קשיחות"],
        message: MSG_ABDOMEN_RIGID,
    },
    FlagRule {
        scope: Scope::Question,
        keywords: &["pregnan", "הריון"],
        message: MSG_ABDOMEN_PREGNANCY,
    },
];

const DYSPNEA_RULES: &[FlagRule] = &[
    FlagRule {
        scope: Scope::Either,
        keywords: &["at rest", "במנוחה"],
        message: MSG_DYSPNEA_REST,
    },
    FlagRule {
        scope: Scope::Either,
        keywords: &["cyanosis", "blue lips", "כיחלון", "שפתיים כחולות"],
        message: MSG_DYSPNEA_CYANOSIS,
    },
    FlagRule {
        scope: Scope::Either,
        keywords: &["chest pain", "כאב בחזה", "כאבים בחזה"],
        message: MSG_DYSPNEA_CHEST,
    },
];

const HEAD_INJURY_RULES: &[FlagRule] = &[
    FlagRule {
        scope: Scope::Either,
        keywords: &["loss of consciousness", "lost consciousness", "איבוד הכרה", "אובדן הכרה", "איבד הכרה"],
        message: MSG_HEAD_INJURY_LOC,
    },
    FlagRule {
        scope: Scope::Either,
        keywords: &["vomit", "הקאה", "הקאות", "הקיא"],
        message: MSG_HEAD_INJURY_VOMITING,
    },
    FlagRule {
        scope: Scope::Either,
        keywords: &["anticoagul", "blood thinner", "coumadin", "eliquis", "נוגדי קרישה", "קומדין", "אליקוויס"],
        message: MSG_HEAD_INJURY_ANTICOAGULANT,
    },
];

/// Checked for every complaint.
const GENERAL_RULES: &[FlagRule] = &[
    FlagRule {
        scope: Scope::Either,
        keywords: &["severe shortness of breath", "severe difficulty breathing", "קוצר נשימה קשה", "קושי נשימתי קשה"],
        message: MSG_SEVERE_BREATHING,
    },
    FlagRule {
        scope: Scope::Either,
        keywords: &["vomiting blood", "bloody vomit", "blood in vomit", "הקאה דמית", "הקאות דמיות", "דם בהקאה"],
        message: MSG_BLOODY_VOMIT,
    },
    FlagRule {
        scope: Scope::Either,
        keywords: &["very high fever", "fever over 40", "חום גבוה מאוד", "חום מעל 40"],
        message: MSG_VERY_HIGH_FEVER,
    },
    FlagRule {
        scope: Scope::Either,
        keywords: &["confus", "disorient", "בלבול", "מבולבל", "חוסר התמצאות"],
        message: MSG_CONFUSION,
    },
    FlagRule {
        scope: Scope::Either,
        keywords: &["loss of consciousness", "lost consciousness", "fainted", "passed out", "איבוד הכרה", "אובדן הכרה", "התעלף", "התעלפות"],
        message: MSG_LOSS_OF_CONSCIOUSNESS,
    },
];

const DENIAL_TERMS: &[&str] = &["no", "none", "denies", "never", "לא", "אין", "ללא"];

// ═══════════════════════════════════════════════════════════
// Evaluation
// ═══════════════════════════════════════════════════════════

fn contains_any(haystack_lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack_lower.contains(k))
}

/// An answer is affirmative unless it contains a denial term anywhere.
///
/// Plain substring test: "now", "no change" and Hebrew words containing
/// "לא" all read as denials. Blank answers are never affirmative.
pub fn is_positive_response(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    !answer.is_empty() && !contains_any(&answer, DENIAL_TERMS)
}

impl FlagRule {
    fn fires(&self, answers: &[(String, String)]) -> bool {
        answers.iter().any(|(question, answer)| {
            let hit = match self.scope {
                Scope::Answer => contains_any(answer, self.keywords),
                Scope::Question => contains_any(question, self.keywords),
                Scope::Either => {
                    contains_any(answer, self.keywords) || contains_any(question, self.keywords)
                }
            };
            hit && is_positive_response(answer)
        })
    }
}

/// Threshold checks on the vital signs. Missing or non-numeric readings are skipped.
pub fn vital_sign_flags(vitals: &VitalSigns) -> Vec<RedFlag> {
    let mut flags = Vec::new();

    if reading(&vitals.temperature).is_some_and(|t| t >= 39.0) {
        flags.push(RedFlag::new(MSG_HIGH_FEVER));
    }
    if let Some(pulse) = reading(&vitals.pulse) {
        if pulse > 120.0 {
            flags.push(RedFlag::new(MSG_TACHYCARDIA));
        } else if pulse < 50.0 {
            flags.push(RedFlag::new(MSG_BRADYCARDIA));
        }
    }
    if reading(&vitals.saturation).is_some_and(|s| s < 94.0) {
        flags.push(RedFlag::new(MSG_LOW_SATURATION));
    }
    if let Some(bp) = vitals.blood_pressure.as_ref().and_then(parse_blood_pressure) {
        if bp.systolic > 160 || bp.diastolic > 100 {
            flags.push(RedFlag::new(MSG_HYPERTENSION));
        }
    }

    flags
}

/// All red flags for the record: complaint rules, general rules, then vital
/// signs. Each rule contributes at most once; equal messages from different
/// rules are kept.
pub fn detect_red_flags(record: &PatientIntakeRecord) -> Vec<RedFlag> {
    let answers: Vec<(String, String)> = record
        .all_answers()
        .map(|(q, a)| (q.to_lowercase(), a.to_lowercase()))
        .collect();

    let complaint_rules = ComplaintCategory::detect(&record.main_complaint)
        .into_iter()
        .flat_map(|c| c.rules().iter());

    let mut flags: Vec<RedFlag> = complaint_rules
        .chain(GENERAL_RULES.iter())
        .filter(|rule| rule.fires(&answers))
        .map(|rule| RedFlag::new(rule.message))
        .collect();

    flags.extend(vital_sign_flags(&record.vital_signs));
    flags
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
