use crate::models::{PatientIntakeRecord, RedFlag};

use super::categorize::{categorize_answers, Bucket, CategorizedAnswers};
use super::phrasing::{self, *};
use super::vitals::vitals_parts;

/// Fixed-format profile line.
pub fn header_line(record: &PatientIntakeRecord) -> String {
    let medications = record.medications.trim();
    let medications = if medications.is_empty() {
        phrasing::no_regular_medication(record.gender).to_string()
    } else {
        format!("תרופות קבועות: {medications}")
    };
    format!(
        "פרופיל {}, סעיפים: {}, אלרגיות: {}, {}.",
        or_default(&record.profile, DEFAULT_PROFILE),
        or_default(&record.medical_sections, DEFAULT_SECTIONS),
        or_default(&record.allergies, DEFAULT_ALLERGIES),
        medications
    )
}

fn demographic_line(record: &PatientIntakeRecord) -> String {
    format!(
        "{}, {}, פונה בשל {}.",
        age_phrase(record.gender, record.age),
        smoking_phrase(record.gender, record.is_smoker),
        record.main_complaint.trim()
    )
}

fn labelled(label: &str, entries: &[String], separator: &str) -> Option<String> {
    (!entries.is_empty()).then(|| format!("{label}: {}.", entries.join(separator)))
}

fn answer_paragraphs(answers: &CategorizedAnswers) -> Vec<String> {
    let description: Vec<String> = [Bucket::Duration, Bucket::Location, Bucket::Character]
        .into_iter()
        .flat_map(|b| answers.get(b).iter().cloned())
        .collect();

    [
        labelled(LABEL_COMPLAINT_DESCRIPTION, &description, ", "),
        labelled(LABEL_ASSOCIATED_SYMPTOMS, answers.get(Bucket::AssociatedSymptom), ", "),
        labelled(LABEL_ASSOCIATED_FINDINGS, answers.get(Bucket::AssociatedFinding), ", "),
        labelled(LABEL_AGGRAVATING, answers.get(Bucket::Aggravating), ", "),
        labelled(LABEL_RELIEVING, answers.get(Bucket::Relieving), ", "),
        labelled(LABEL_TREATMENTS, answers.get(Bucket::Treatment), ", "),
        labelled(LABEL_NEGATIVE_FINDINGS, answers.get(Bucket::NegativeFinding), ", "),
        labelled(LABEL_NOTES, answers.get(Bucket::Note), "; "),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Full rule-based narrative. Empty sections are left out.
pub fn build_narrative(record: &PatientIntakeRecord, red_flags: &[RedFlag]) -> String {
    let mut paragraphs = vec![header_line(record), demographic_line(record)];

    let vitals = vitals_parts(&record.vital_signs);
    if !vitals.is_empty() {
        paragraphs.push(format!("{LABEL_VITALS}: {}.", vitals.join(", ")));
    }

    paragraphs.extend(answer_paragraphs(&categorize_answers(record)));

    let flags: Vec<String> = red_flags.iter().map(|f| f.message.clone()).collect();
    if let Some(p) = labelled(LABEL_RED_FLAGS, &flags, "; ") {
        paragraphs.push(p);
    }

    paragraphs.join("\n\n")
}

/// Last-resort summary: plain formatting only, nothing that can fail.
pub fn basic_summary(record: &PatientIntakeRecord) -> String {
    let complaint = or_default(&record.main_complaint, "תלונה לא ידועה");
    format!(
        "{}\n\n{} פונה בשל {}.\n\n{}",
        header_line(record),
        age_phrase(record.gender, record.age),
        complaint,
        TECHNICAL_ISSUE_NOTICE
    )
}
