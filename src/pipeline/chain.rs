use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use super::generation::{GenerationError, GenerationGateway, GenerationOptions};
use super::prompt::{
    build_follow_up_prompt, build_summary_prompt, FOLLOW_UP_COUNT, FOLLOW_UP_MAX_TOKENS,
    FOLLOW_UP_SYSTEM_PROMPT, SUMMARY_SYSTEM_PROMPT,
};
use super::questions::{local_questions, parse_questions};
use super::rules::{
    basic_summary, detect_red_flags, ClinicalRuleEngine, NarrativeSynthesizer, RuleEngineError,
};
use crate::clock::Clock;
use crate::models::{IntakeError, NarrativeResult, NarrativeSource, PatientIntakeRecord, RedFlag};
use crate::pipeline_config::PipelineConfig;

/// Stages of narrative production, tried in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainState {
    CheckCache,
    CallRemote,
    LocalRules,
    Basic,
}

/// Produces a narrative for every valid record: cache, then generation
/// backend, then local rules, then a fixed basic summary.
///
/// Red flags always come from the local rule set, whatever the narrative
/// source. Only backend results are cached.
pub struct DegradationChain {
    gateway: GenerationGateway,
    synthesizer: Box<dyn NarrativeSynthesizer>,
}

impl DegradationChain {
    pub fn new(gateway: GenerationGateway, synthesizer: Box<dyn NarrativeSynthesizer>) -> Self {
        Self {
            gateway,
            synthesizer,
        }
    }

    pub fn with_rule_engine(gateway: GenerationGateway) -> Self {
        Self::new(gateway, Box::new(ClinicalRuleEngine::new()))
    }

    pub fn from_config(
        config: &PipelineConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GenerationError> {
        Ok(Self::with_rule_engine(GenerationGateway::from_config(
            config, clock,
        )?))
    }

    pub fn gateway(&self) -> &GenerationGateway {
        &self.gateway
    }

    /// Narrative and red flags for `record`.
    ///
    /// Fails only when the record itself breaks the intake contract.
    pub fn produce_narrative(
        &self,
        record: &PatientIntakeRecord,
    ) -> Result<NarrativeResult, IntakeError> {
        record.validate()?;

        let red_flags = detect_red_flags(record);
        let options = GenerationOptions::default().with_system(SUMMARY_SYSTEM_PROMPT);
        let request = self
            .gateway
            .resolve_request(&build_summary_prompt(record), &options);

        let mut state = ChainState::CheckCache;
        loop {
            state = match state {
                ChainState::CheckCache => match self.gateway.cached_response(&request) {
                    Some(text) if !text.trim().is_empty() => {
                        return Ok(finish(text, red_flags, NarrativeSource::Cache));
                    }
                    _ => ChainState::CallRemote,
                },
                ChainState::CallRemote => match self.gateway.generate(&request) {
                    Ok(text) if !text.trim().is_empty() => {
                        return Ok(finish(text, red_flags, NarrativeSource::Remote));
                    }
                    Ok(_) => {
                        tracing::warn!("Generation returned blank text, using local rules");
                        ChainState::LocalRules
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Generation unavailable, using local rules");
                        ChainState::LocalRules
                    }
                },
                ChainState::LocalRules => match self.run_synthesizer(record) {
                    Ok(text) => {
                        return Ok(finish(text, red_flags, NarrativeSource::LocalRules));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Local rules failed, using basic summary");
                        ChainState::Basic
                    }
                },
                ChainState::Basic => {
                    return Ok(finish(basic_summary(record), red_flags, NarrativeSource::Basic));
                }
            };
        }
    }

    /// Red flags alone, for highlighting against a narrative obtained elsewhere.
    pub fn detect_red_flags(&self, record: &PatientIntakeRecord) -> Vec<RedFlag> {
        detect_red_flags(record)
    }

    /// Follow-up questions for the intake form. Falls back to the built-in
    /// question bank when generation fails or yields nothing usable.
    pub fn follow_up_questions(&self, record: &PatientIntakeRecord) -> Vec<String> {
        let prompt = build_follow_up_prompt(record, FOLLOW_UP_COUNT);
        let options = GenerationOptions::default()
            .with_max_tokens(FOLLOW_UP_MAX_TOKENS)
            .with_system(FOLLOW_UP_SYSTEM_PROMPT);

        match self.gateway.send_prompt(&prompt, &options) {
            Ok(generated) => {
                let questions = parse_questions(&generated.text, FOLLOW_UP_COUNT);
                if !questions.is_empty() {
                    return questions;
                }
                tracing::warn!("Generated follow-up list was empty, using question bank");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Follow-up generation unavailable, using question bank");
            }
        }
        local_questions(record, FOLLOW_UP_COUNT)
    }

    /// Run the synthesizer with panics turned into errors.
    fn run_synthesizer(&self, record: &PatientIntakeRecord) -> Result<String, RuleEngineError> {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.synthesizer.synthesize(record)));
        match outcome {
            Ok(Ok(text)) if text.trim().is_empty() => Err(RuleEngineError::EmptyNarrative),
            Ok(result) => result,
            Err(payload) => Err(RuleEngineError::Panicked(panic_message(payload.as_ref()))),
        }
    }
}

fn finish(text: String, red_flags: Vec<RedFlag>, source: NarrativeSource) -> NarrativeResult {
    tracing::info!(
        source = %source,
        degraded = source.is_degraded(),
        red_flags = red_flags.len(),
        chars = text.chars().count(),
        "Narrative produced"
    );
    NarrativeResult {
        text,
        red_flags,
        source,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
