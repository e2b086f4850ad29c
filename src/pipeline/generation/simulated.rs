use std::sync::LazyLock;

use regex::Regex;

use super::types::{GenerationBackend, GenerationRequest, ModelInfo};
use super::GenerationError;
use crate::pipeline::prompt::{COMPLAINT_LABEL, FOLLOW_UP_TASK, SUMMARY_TASK};

static COMPLAINT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?m)^{}\s*(.+)$", regex::escape(COMPLAINT_LABEL)))
        .expect("Invalid complaint line regex pattern")
});

static ANSWER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^- .+: .+$").expect("Invalid answer line regex pattern"));

/// Models reported in simulated mode.
const SIMULATED_MODELS: &[(&str, i64)] = &[
    ("gpt-4o-mini", 1_721_172_741),
    ("gpt-4o", 1_715_367_049),
    ("gpt-3.5-turbo", 1_677_610_602),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptIntent {
    FollowUpQuestions,
    Summary,
    Other,
}

fn classify(prompt: &str) -> PromptIntent {
    if prompt.contains(FOLLOW_UP_TASK) {
        PromptIntent::FollowUpQuestions
    } else if prompt.contains(SUMMARY_TASK) {
        PromptIntent::Summary
    } else {
        PromptIntent::Other
    }
}

/// Deterministic offline backend for development and demos.
///
/// Never touches the network. Responses depend only on the prompt text.
#[derive(Debug, Default, Clone)]
pub struct SimulatedBackend;

impl SimulatedBackend {
    pub fn new() -> Self {
        Self
    }
}

fn complaint_of(prompt: &str) -> String {
    COMPLAINT_LINE
        .captures(prompt)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "תלונה לא מוגדרת".to_string())
}

impl GenerationBackend for SimulatedBackend {
    fn name(&self) -> &str {
        "simulated"
    }

    fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let prompt = &request.prompt;
        let text = match classify(prompt) {
            PromptIntent::FollowUpQuestions => {
                let complaint = complaint_of(prompt);
                format!(
                    "1. מתי התחיל ה{complaint}?\n\
                     2. האם ה{complaint} מחמיר עם מאמץ?\n\
                     3. האם יש תסמינים נוספים?\n\
                     4. האם נטלת תרופות כלשהן?"
                )
            }
            PromptIntent::Summary => {
                let complaint = complaint_of(prompt);
                let answers = ANSWER_LINE.find_iter(prompt).count();
                format!(
                    "סיכום אנמנזה (סימולציה): המטופל/ת פונה בשל {complaint}. \
                     נסקרו {answers} תשובות בשאלון. יש להשלים הערכה קלינית."
                )
            }
            PromptIntent::Other => "תגובה מדומה.".to_string(),
        };
        Ok(text)
    }

    fn list_models(&self) -> Result<Vec<ModelInfo>, GenerationError> {
        Ok(SIMULATED_MODELS
            .iter()
            .map(|(id, created)| ModelInfo {
                id: (*id).to_string(),
                created: *created,
            })
            .collect())
    }
}
