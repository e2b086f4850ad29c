use std::sync::LazyLock;

use regex::Regex;

use super::rules::ComplaintCategory;
use crate::models::PatientIntakeRecord;

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\d+\s*[.)\-:]|[-*•])\s*").expect("Invalid list marker regex pattern")
});

const HEADACHE_QUESTIONS: &[&str] = &[
    "האם הכאב התחיל בפתאומיות?",
    "האם יש נוקשות בצוואר?",
    "האם יש רגישות לאור או לרעש?",
    "האם יש חולשה, נימול או הפרעה בדיבור?",
];

const CHEST_PAIN_QUESTIONS: &[&str] = &[
    "האם הכאב מקרין ליד, לכתף או ללסת?",
    "האם יש קוצר נשימה?",
    "האם יש הזעה מוגברת?",
    "האם הכאב מחמיר במאמץ?",
];

const ABDOMINAL_PAIN_QUESTIONS: &[&str] = &[
    "איפה ממוקם הכאב בבטן?",
    "האם יש בחילות או הקאות?",
    "האם יש דם בצואה או צואה שחורה?",
    "האם את בהריון?",
];

const DYSPNEA_QUESTIONS: &[&str] = &[
    "האם קוצר הנשימה מופיע גם במנוחה?",
    "האם יש כאב בחזה?",
    "האם יש שיעול או ליחה?",
    "האם יש נפיחות ברגליים?",
];

const HEAD_INJURY_QUESTIONS: &[&str] = &[
    "האם היה איבוד הכרה?",
    "האם היו הקאות לאחר החבלה?",
    "האם את/ה נוטל/ת נוגדי קרישה?",
    "האם יש כאב ראש מתגבר?",
];

const GENERIC_QUESTIONS: &[&str] = &[
    "כמה זמן נמשכת התלונה?",
    "מה מחמיר את התלונה?",
    "מה מקל על התלונה?",
    "האם נטלת תרופות כלשהן בעקבות התלונה?",
    "האם יש חום?",
];

fn bank(category: ComplaintCategory) -> &'static [&'static str] {
    match category {
        ComplaintCategory::Headache => HEADACHE_QUESTIONS,
        ComplaintCategory::ChestPain => CHEST_PAIN_QUESTIONS,
        ComplaintCategory::AbdominalPain => ABDOMINAL_PAIN_QUESTIONS,
        ComplaintCategory::Dyspnea => DYSPNEA_QUESTIONS,
        ComplaintCategory::HeadInjury => HEAD_INJURY_QUESTIONS,
    }
}

/// Split generated text into questions, one per non-empty line, with list
/// numbering and bullets removed.
pub fn parse_questions(text: &str, limit: usize) -> Vec<String> {
    text.lines()
        .map(|line| LIST_MARKER.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .take(limit)
        .collect()
}

/// Complaint-keyed questions from the built-in bank, skipping any the record
/// already answers. Generic questions fill the remainder.
pub fn local_questions(record: &PatientIntakeRecord, limit: usize) -> Vec<String> {
    let answered: Vec<&str> = record.all_answers().map(|(q, _)| q.trim()).collect();

    let mut questions: Vec<String> = Vec::new();
    let candidates = ComplaintCategory::detect(&record.main_complaint)
        .into_iter()
        .flat_map(|c| bank(c).iter())
        .chain(GENERIC_QUESTIONS.iter());

    for question in candidates {
        if questions.len() >= limit {
            break;
        }
        if answered.contains(question) || questions.iter().any(|q| q == question) {
            continue;
        }
        questions.push((*question).to_string());
    }
    questions
}
