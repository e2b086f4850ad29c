use serde::{Deserialize, Serialize};

use super::GenerationError;

/// Per-call overrides of the gateway defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// System instruction sent ahead of the prompt.
    pub system: Option<String>,
}

impl GenerationOptions {
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Gateway-wide model parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationDefaults {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationDefaults {
    /// Merge per-call options over these defaults.
    pub fn resolve(&self, prompt: &str, options: &GenerationOptions) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            model: options.model.clone().unwrap_or_else(|| self.model.clone()),
            temperature: options.temperature.unwrap_or(self.temperature),
            max_tokens: options.max_tokens.unwrap_or(self.max_tokens),
            system: options.system.clone(),
        }
    }
}

/// Fully resolved request. Its JSON form is the cache key material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl GenerationRequest {
    /// Chat messages in send order: optional system, then the prompt.
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system.as_deref().filter(|s| !s.trim().is_empty()) {
            messages.push(ChatMessage {
                role: "system".into(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".into(),
            content: self.prompt.clone(),
        });
        messages
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub created: i64,
}

/// Text generation backend abstraction (allows mocking).
pub trait GenerationBackend: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// One attempt: no retries, no caching.
    fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError>;

    fn list_models(&self) -> Result<Vec<ModelInfo>, GenerationError>;
}
