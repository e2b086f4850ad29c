//! Local, deterministic clinical synthesis.
//!
//! Builds the narrative and red-flag list from the intake record alone, with
//! no external calls. This is the fallback when generation is unavailable.

pub mod categorize;
pub mod narrative;
pub mod phrasing;
pub mod red_flags;
pub mod vitals;

pub use categorize::{categorize, categorize_answers, Bucket, CategorizedAnswer, CategorizedAnswers};
pub use narrative::{basic_summary, build_narrative};
pub use red_flags::{detect_red_flags, is_positive_response, vital_sign_flags, ComplaintCategory};

use thiserror::Error;

use crate::models::PatientIntakeRecord;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RuleEngineError {
    #[error("Rule engine panicked: {0}")]
    Panicked(String),

    #[error("Rule engine produced an empty narrative")]
    EmptyNarrative,
}

/// Local narrative synthesis (allows mocking).
pub trait NarrativeSynthesizer: Send + Sync {
    fn synthesize(&self, record: &PatientIntakeRecord) -> Result<String, RuleEngineError>;
}

/// Pattern-table synthesizer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClinicalRuleEngine;

impl ClinicalRuleEngine {
    pub fn new() -> Self {
        Self
    }
}

impl NarrativeSynthesizer for ClinicalRuleEngine {
    fn synthesize(&self, record: &PatientIntakeRecord) -> Result<String, RuleEngineError> {
        let flags = detect_red_flags(record);
        let text = build_narrative(record, &flags);
        if text.trim().is_empty() {
            return Err(RuleEngineError::EmptyNarrative);
        }
        Ok(text)
    }
}
