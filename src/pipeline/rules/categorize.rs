use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::phrasing;
use crate::models::{Gender, PatientIntakeRecord};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Narrative section an answer lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    Duration,
    Location,
    Character,
    Aggravating,
    Relieving,
    AssociatedSymptom,
    Treatment,
    AssociatedFinding,
    NegativeFinding,
    Note,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorizedAnswer {
    pub bucket: Bucket,
    pub entry: String,
}

/// Answers grouped by bucket, each bucket in answer order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CategorizedAnswers {
    buckets: BTreeMap<Bucket, Vec<String>>,
}

impl CategorizedAnswers {
    pub fn push(&mut self, answer: CategorizedAnswer) {
        self.buckets
            .entry(answer.bucket)
            .or_default()
            .push(answer.entry);
    }

    pub fn get(&self, bucket: Bucket) -> &[String] {
        self.buckets.get(&bucket).map(Vec::as_slice).unwrap_or(&[])
    }
}

enum Target {
    Bucket(Bucket),
    /// Split into symptom or treatment by `TREATMENT_PATTERN`.
    SymptomOrTreatment,
}

/// A compiled question pattern and where matching answers go.
struct CategoryPattern {
    regex: Regex,
    target: Target,
}

fn pattern(regex: &str, target: Target) -> CategoryPattern {
    CategoryPattern {
        regex: Regex::new(regex).expect("Invalid category regex pattern"),
        target,
    }
}

// ═══════════════════════════════════════════════════════════
// Pattern tables
// ═══════════════════════════════════════════════════════════

/// Question patterns in priority order; the first match wins.
static CATEGORY_PATTERNS: LazyLock<Vec<CategoryPattern>> = LazyLock::new(|| {
    vec![
        pattern(
            r"(?i)how\s+long|since\s+when|duration|when\s+did|onset|\bstart|כמה\s+זמן|משך|ממתי|מתי|התחיל|הופיע",
            Target::Bucket(Bucket::Duration),
        ),
        pattern(
            r"(?i)\bwhere\b|locat|radiat|spread|איפה|היכן|מיקום|ממוקם|מקרין|הקרנה|מתפשט",
            Target::Bucket(Bucket::Location),
        ),
        pattern(
            r"(?i)describe|character|quality|what\s+kind|what\s+type|feel\s+like|אופי|תאר|סוג\s+ה|איך\s+מרגיש",
            Target::Bucket(Bucket::Character),
        ),
        pattern(
            r"(?i)worse|aggravat|exacerbat|trigger|מחמיר|החמרה|מגביר",
            Target::Bucket(Bucket::Aggravating),
        ),
        pattern(
            r"(?i)better|reliev|\beas(?:e|es|ing)\b|improv|\bhelps?\b|מקל|הקלה|משפר|עוזר",
            Target::Bucket(Bucket::Relieving),
        ),
        pattern(
            r"(?i)do\s+you\s+have|have\s+you\s+had|is\s+there|are\s+there|any\s+other|symptom|accompan|experienc|treat|medicat|did\s+you\s+take|have\s+you\s+taken|tried|painkiller|האם\s+יש|האם\s+היו|האם\s+היה|האם\s+הייתה|תסמינ|נלוו|טיפול|תרופ|נטלת|לקחת|ניסית|משכך",
            Target::SymptomOrTreatment,
        ),
    ]
});

static TREATMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)treat|medicat|\btak(?:e|en)\b|tried|\bpills?\b|painkiller|טיפול|תרופ|נטלת|לקחת|ניסית|כדור|משכך",
    )
    .expect("Invalid treatment regex pattern")
});

/// Questions about identity or contact details; their answers never enter
/// the clinical narrative.
static PERSONAL_DATA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\bname\b|\bid\b|identity|phone|address|e-?mail|occupation|\bjob\b|\bשם\b|תעודת\s+זהות|ת\.ז|טלפון|כתובת|דוא"ל|מייל|עיסוק|מקצוע"#,
    )
    .expect("Invalid personal data regex pattern")
});

/// Answer opens with a negation word.
static NEGATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:no|none|denies|לא|אין|ללא|שולל|שוללת)(?:\W|$)")
        .expect("Invalid negation regex pattern")
});

const NOTE_PREFIXES: &[&str] = &["הערות", "הערה", "notes", "note"];

/// Longest first, so "do you have any" wins over "do you have".
const INTERROGATIVE_PREFIXES: &[&str] = &[
    "do you have any",
    "do you have",
    "have you had any",
    "have you had",
    "have you taken",
    "have you tried",
    "did you take",
    "did you try",
    "did you have",
    "is there any",
    "is there",
    "are there any",
    "are there",
    "are you",
    "האם יש לך",
    "האם יש",
    "האם היו",
    "האם הייתה",
    "האם היתה",
    "האם היה",
    "האם נטלת",
    "האם לקחת",
    "האם ניסית",
    "האם",
];

const AFFIRMATIVE_ANSWERS: &[&str] = &["yes", "y", "yep", "true", "כן"];

// ═══════════════════════════════════════════════════════════
// Categorization
// ═══════════════════════════════════════════════════════════

/// Case-insensitive ASCII prefix match on whole words, safe on multi-byte text.
fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    let rest = &text[prefix.len()..];
    let at_boundary = rest.chars().next().map_or(true, |c| !c.is_alphanumeric());
    (head.eq_ignore_ascii_case(prefix) && at_boundary).then_some(rest)
}

pub fn is_note_question(question: &str) -> bool {
    let question = question.trim_start();
    NOTE_PREFIXES
        .iter()
        .any(|p| strip_prefix_ignore_case(question, p).is_some())
}

pub fn is_negated(answer: &str) -> bool {
    NEGATION_PATTERN.is_match(answer)
}

fn is_bare_affirmative(answer: &str) -> bool {
    let answer = answer.trim().trim_end_matches(['.', '!']).to_lowercase();
    AFFIRMATIVE_ANSWERS.contains(&answer.as_str())
}

/// The thing a yes/no question asks about: interrogative prefix and
/// trailing punctuation stripped.
pub fn finding_name(question: &str) -> String {
    let question = question.trim();
    let stripped = INTERROGATIVE_PREFIXES
        .iter()
        .find_map(|p| strip_prefix_ignore_case(question, p))
        .unwrap_or(question);
    let finding = stripped
        .trim()
        .trim_end_matches(['?', '.', ':', '!', ' '])
        .trim();
    if finding.is_empty() {
        question.trim_end_matches(['?', '.', ':']).to_string()
    } else {
        finding.to_string()
    }
}

fn finding_entry(question: &str, answer: &str) -> String {
    let finding = finding_name(question);
    if is_bare_affirmative(answer) {
        finding
    } else {
        format!("{finding} ({})", answer.trim())
    }
}

/// Place one answered question. `None` when the answer is blank or the
/// question asks for personal data.
pub fn categorize(question: &str, answer: &str, gender: Gender) -> Option<CategorizedAnswer> {
    let answer_text = answer.trim();
    if answer_text.is_empty() {
        return None;
    }

    if is_note_question(question) {
        return Some(CategorizedAnswer {
            bucket: Bucket::Note,
            entry: answer_text.to_string(),
        });
    }

    let matched = CATEGORY_PATTERNS
        .iter()
        .find(|p| p.regex.is_match(question))
        .map(|p| match p.target {
            Target::Bucket(bucket) => bucket,
            Target::SymptomOrTreatment if TREATMENT_PATTERN.is_match(question) => {
                Bucket::Treatment
            }
            Target::SymptomOrTreatment => Bucket::AssociatedSymptom,
        });

    let bucket = match matched {
        Some(bucket) => bucket,
        None if PERSONAL_DATA_PATTERN.is_match(question) => return None,
        None => Bucket::AssociatedFinding,
    };

    if is_negated(answer_text) {
        return Some(CategorizedAnswer {
            bucket: Bucket::NegativeFinding,
            entry: phrasing::denies(gender, &finding_name(question)),
        });
    }

    let entry = match bucket {
        Bucket::AssociatedSymptom | Bucket::Treatment | Bucket::AssociatedFinding => {
            finding_entry(question, answer_text)
        }
        _ => answer_text.to_string(),
    };
    Some(CategorizedAnswer { bucket, entry })
}

/// Categorize every answer of the record, standard answers first.
pub fn categorize_answers(record: &PatientIntakeRecord) -> CategorizedAnswers {
    let mut categorized = CategorizedAnswers::default();
    for (question, answer) in record.all_answers() {
        if let Some(answer) = categorize(question, answer, record.gender) {
            categorized.push(answer);
        }
    }
    categorized
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
