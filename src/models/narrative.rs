use serde::{Deserialize, Serialize};

/// A clinically urgent pattern found in the answers or vital signs.
/// The message is both the display text and the identity of the flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RedFlag {
    pub message: String,
}

impl RedFlag {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Which stage of the degradation chain produced the narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NarrativeSource {
    Cache,
    Remote,
    LocalRules,
    Basic,
}

impl NarrativeSource {
    pub fn as_str(self) -> &'static str {
        match self {
            NarrativeSource::Cache => "cache",
            NarrativeSource::Remote => "remote",
            NarrativeSource::LocalRules => "local_rules",
            NarrativeSource::Basic => "basic",
        }
    }

    /// True for the locally synthesized fallbacks.
    pub fn is_degraded(self) -> bool {
        matches!(self, NarrativeSource::LocalRules | NarrativeSource::Basic)
    }
}

impl std::fmt::Display for NarrativeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeResult {
    /// Never empty.
    pub text: String,
    pub red_flags: Vec<RedFlag>,
    pub source: NarrativeSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&NarrativeSource::LocalRules).unwrap();
        assert_eq!(json, "\"LOCAL_RULES\"");
        let json = serde_json::to_string(&NarrativeSource::Cache).unwrap();
        assert_eq!(json, "\"CACHE\"");
    }

    #[test]
    fn degraded_sources() {
        assert!(!NarrativeSource::Cache.is_degraded());
        assert!(!NarrativeSource::Remote.is_degraded());
        assert!(NarrativeSource::LocalRules.is_degraded());
        assert!(NarrativeSource::Basic.is_degraded());
    }

    #[test]
    fn result_serializes_camel_case() {
        let result = NarrativeResult {
            text: "narrative".into(),
            red_flags: vec![RedFlag::new("דופק מהיר מאוד")],
            source: NarrativeSource::Remote,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"redFlags\""));
        assert!(json.contains("\"REMOTE\""));
    }
}
