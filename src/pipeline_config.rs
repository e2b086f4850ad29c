//! Pipeline configuration.
//!
//! Built once at start-up (usually from the environment) and handed to the
//! cache, gateway and degradation chain constructors. Nothing in the pipeline
//! reads configuration globally.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config;

// ═══════════════════════════════════════════════════════════
// Defaults
// ═══════════════════════════════════════════════════════════

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 1500;
pub const DEFAULT_CACHE_TTL_MS: u64 = 86_400_000;
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

const ENV_PREFIX: &str = "ANAMNESIS_";

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Everything the generation pipeline needs to know about its environment.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    /// Bearer credential for the generation backend. Never serialized.
    #[serde(skip)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub use_cache: bool,
    pub cache_ttl: Duration,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// `None` disables the disk tier.
    pub disk_cache_path: Option<PathBuf>,
    /// `true` talks to the real backend, `false` uses the simulated one.
    pub production: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            use_cache: true,
            cache_ttl: Duration::from_millis(DEFAULT_CACHE_TTL_MS),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            disk_cache_path: Some(config::default_cache_dir()),
            production: false,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════

impl PipelineConfig {
    /// Read `ANAMNESIS_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Absent keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| -> Option<(String, String)> {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty() || name == "DISK_CACHE_PATH")
                .map(|v| (key, v))
        };

        let mut cfg = Self::default();

        cfg.api_key = get("API_KEY")
            .map(|(_, v)| v)
            .or_else(|| lookup("OPENAI_API_KEY").filter(|v| !v.trim().is_empty()));

        if let Some((_, v)) = get("BASE_URL") {
            cfg.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some((_, v)) = get("MODEL") {
            cfg.model = v;
        }
        if let Some((k, v)) = get("TEMPERATURE") {
            cfg.temperature = parse_number(&k, &v)?;
        }
        if let Some((k, v)) = get("MAX_TOKENS") {
            cfg.max_tokens = parse_number(&k, &v)?;
        }
        if let Some((k, v)) = get("USE_CACHE") {
            cfg.use_cache = parse_flag(&k, &v)?;
        }
        if let Some((k, v)) = get("CACHE_TTL_MS") {
            cfg.cache_ttl = Duration::from_millis(parse_number(&k, &v)?);
        }
        if let Some((k, v)) = get("TIMEOUT_MS") {
            cfg.timeout = Duration::from_millis(parse_number(&k, &v)?);
        }
        if let Some((k, v)) = get("MAX_RETRIES") {
            cfg.max_retries = parse_number(&k, &v)?;
        }
        if let Some((k, v)) = get("RETRY_DELAY_MS") {
            cfg.retry_delay = Duration::from_millis(parse_number(&k, &v)?);
        }
        if let Some((_, v)) = get("DISK_CACHE_PATH") {
            cfg.disk_cache_path = match v.to_lowercase().as_str() {
                "" | "off" | "none" => None,
                _ => Some(PathBuf::from(v)),
            };
        }
        if let Some((k, v)) = get("PRODUCTION") {
            cfg.production = parse_flag(&k, &v)?;
        }

        Ok(cfg)
    }

    /// Copy of this config with caching fully disabled.
    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self.disk_cache_path = None;
        self
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true/false".to_string(),
        }),
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert!((cfg.temperature - 0.2).abs() < f32::EPSILON);
        assert!(cfg.use_cache);
        assert_eq!(cfg.cache_ttl, Duration::from_millis(86_400_000));
        assert_eq!(cfg.timeout, Duration::from_millis(15_000));
        assert_eq!(cfg.max_retries, 2);
        assert_eq!(cfg.retry_delay, Duration::from_millis(1_000));
        assert!(!cfg.production);
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn empty_lookup_yields_defaults() {
        let cfg = PipelineConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg.model, DEFAULT_MODEL);
        assert_eq!(cfg.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(cfg.disk_cache_path.is_some());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = PipelineConfig::from_lookup(lookup_from(&[
            ("ANAMNESIS_API_KEY", "sk-test"),
            ("ANAMNESIS_BASE_URL", "http://localhost:8080/v1/"),
            ("ANAMNESIS_MODEL", "local-model"),
            ("ANAMNESIS_TEMPERATURE", "0.7"),
            ("ANAMNESIS_MAX_TOKENS", "300"),
            ("ANAMNESIS_USE_CACHE", "false"),
            ("ANAMNESIS_CACHE_TTL_MS", "5000"),
            ("ANAMNESIS_TIMEOUT_MS", "2000"),
            ("ANAMNESIS_MAX_RETRIES", "4"),
            ("ANAMNESIS_RETRY_DELAY_MS", "10"),
            ("ANAMNESIS_DISK_CACHE_PATH", "/tmp/anamnesis-cache"),
            ("ANAMNESIS_PRODUCTION", "yes"),
        ]))
        .unwrap();

        assert_eq!(cfg.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.base_url, "http://localhost:8080/v1");
        assert_eq!(cfg.model, "local-model");
        assert!((cfg.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(cfg.max_tokens, 300);
        assert!(!cfg.use_cache);
        assert_eq!(cfg.cache_ttl, Duration::from_millis(5000));
        assert_eq!(cfg.timeout, Duration::from_millis(2000));
        assert_eq!(cfg.max_retries, 4);
        assert_eq!(cfg.retry_delay, Duration::from_millis(10));
        assert_eq!(
            cfg.disk_cache_path,
            Some(PathBuf::from("/tmp/anamnesis-cache"))
        );
        assert!(cfg.production);
    }

    #[test]
    fn openai_key_is_fallback_credential() {
        let cfg =
            PipelineConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-fallback")])).unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("sk-fallback"));
    }

    #[test]
    fn disk_cache_can_be_disabled() {
        for value in ["", "off", "none"] {
            let cfg = PipelineConfig::from_lookup(lookup_from(&[(
                "ANAMNESIS_DISK_CACHE_PATH",
                value,
            )]))
            .unwrap();
            assert!(cfg.disk_cache_path.is_none(), "value {value:?}");
        }
    }

    #[test]
    fn invalid_number_is_rejected() {
        let err = PipelineConfig::from_lookup(lookup_from(&[("ANAMNESIS_MAX_RETRIES", "many")]))
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value, .. } => {
                assert_eq!(key, "ANAMNESIS_MAX_RETRIES");
                assert_eq!(value, "many");
            }
        }
    }

    #[test]
    fn invalid_flag_is_rejected() {
        let result = PipelineConfig::from_lookup(lookup_from(&[("ANAMNESIS_PRODUCTION", "maybe")]));
        assert!(result.is_err());
    }

    #[test]
    fn without_cache_disables_both_tiers() {
        let cfg = PipelineConfig::default().without_cache();
        assert!(!cfg.use_cache);
        assert!(cfg.disk_cache_path.is_none());
    }

    #[test]
    fn api_key_is_not_serialized() {
        let cfg = PipelineConfig {
            api_key: Some("sk-secret".into()),
            ..PipelineConfig::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("sk-secret"));
        assert!(json.contains("\"model\":\"gpt-4o-mini\""));
    }
}
