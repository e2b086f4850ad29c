use crate::models::{PatientIntakeRecord, VitalSigns, VitalValue};

/// Line label the simulated backend reads the complaint back from.
pub const COMPLAINT_LABEL: &str = "Main complaint:";

/// Task phrases that identify the prompt kind.
pub const SUMMARY_TASK: &str = "Write a clinical anamnesis summary";
pub const FOLLOW_UP_TASK: &str = "Suggest follow-up questions";

/// Token limit for the question-generation call.
pub const FOLLOW_UP_MAX_TOKENS: u32 = 300;

/// How many follow-up questions to ask for.
pub const FOLLOW_UP_COUNT: usize = 5;

pub const SUMMARY_SYSTEM_PROMPT: &str = r#"
You are a clinical documentation assistant working in an emergency intake
setting. Your ONLY role is to turn the patient's intake answers into a concise
anamnesis written in Hebrew, in the style of a physician's admission note.

RULES:
1. Use ONLY information present in the intake. Never invent findings.
2. Never diagnose and never recommend treatment.
3. Mention denied symptoms as negative findings.
4. Keep measurements and units exactly as given.
5. Output plain text paragraphs, no Markdown.
"#;

pub const FOLLOW_UP_SYSTEM_PROMPT: &str = r#"
You are a triage nurse assistant. Suggest short follow-up questions that help
characterize the main complaint. Write the questions in Hebrew.
Output one question per line with no numbering commentary before or after.
Never repeat a question that was already answered.
"#;

/// Build the summary prompt for one intake record.
pub fn build_summary_prompt(record: &PatientIntakeRecord) -> String {
    let mut prompt = format!("{SUMMARY_TASK} for the intake below.\n\n");
    push_intake(&mut prompt, record);

    prompt.push_str("\nAnswers:\n");
    let mut any = false;
    for (question, answer) in record.all_answers() {
        if answer.trim().is_empty() {
            continue;
        }
        prompt.push_str(&format!("- {}: {}\n", question.trim(), answer.trim()));
        any = true;
    }
    if !any {
        prompt.push_str("- (none)\n");
    }
    prompt
}

/// Build the question-generation prompt for one intake record.
pub fn build_follow_up_prompt(record: &PatientIntakeRecord, count: usize) -> String {
    let mut prompt = format!("{FOLLOW_UP_TASK} (up to {count}) for the intake below.\n\n");
    push_intake(&mut prompt, record);

    let answered: Vec<&str> = record
        .all_answers()
        .filter(|(_, a)| !a.trim().is_empty())
        .map(|(q, _)| q.trim())
        .collect();
    if !answered.is_empty() {
        prompt.push_str("\nAlready answered:\n");
        for question in answered {
            prompt.push_str(&format!("- {question}\n"));
        }
    }
    prompt
}

fn push_intake(prompt: &mut String, record: &PatientIntakeRecord) {
    prompt.push_str(&format!("{COMPLAINT_LABEL} {}\n", record.main_complaint.trim()));
    prompt.push_str(&format!("Age: {}\n", record.age));
    prompt.push_str(&format!("Gender: {}\n", record.gender.as_str()));
    prompt.push_str(&format!(
        "Smoker: {}\n",
        if record.is_smoker { "yes" } else { "no" }
    ));
    push_optional(prompt, "Medical profile", &record.profile);
    push_optional(prompt, "Medical sections", &record.medical_sections);
    push_optional(prompt, "Allergies", &record.allergies);
    push_optional(prompt, "Regular medications", &record.medications);

    let vitals = vitals_summary(&record.vital_signs);
    if !vitals.is_empty() {
        prompt.push_str(&format!("Vital signs: {}\n", vitals.join(", ")));
    }
}

fn push_optional(prompt: &mut String, label: &str, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        prompt.push_str(&format!("{label}: {value}\n"));
    }
}

fn vitals_summary(vitals: &VitalSigns) -> Vec<String> {
    [
        ("pulse", &vitals.pulse),
        ("blood pressure", &vitals.blood_pressure),
        ("temperature", &vitals.temperature),
        ("saturation", &vitals.saturation),
        ("respiratory rate", &vitals.respiratory_rate),
    ]
    .into_iter()
    .filter_map(|(name, value)| {
        value
            .as_ref()
            .and_then(VitalValue::display)
            .map(|v| format!("{name} {v}"))
    })
    .collect()
}
