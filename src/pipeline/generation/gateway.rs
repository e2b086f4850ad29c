use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::http::HttpBackend;
use super::simulated::SimulatedBackend;
use super::types::{
    GenerationBackend, GenerationDefaults, GenerationOptions, GenerationRequest, ModelInfo,
};
use super::GenerationError;
use crate::cache::{CacheSettings, ClearReport, TieredCache};
use crate::clock::Clock;
use crate::pipeline_config::PipelineConfig;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub defaults: GenerationDefaults,
    /// Extra attempts after the first one.
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub cache_ttl: Duration,
}

impl GatewaySettings {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            defaults: GenerationDefaults {
                model: config.model.clone(),
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            },
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
            cache_ttl: config.cache_ttl,
        }
    }
}

/// Where a gateway response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextOrigin {
    Cache,
    Backend,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedText {
    pub text: String,
    pub origin: TextOrigin,
}

// ═══════════════════════════════════════════════════════════
// Gateway
// ═══════════════════════════════════════════════════════════

/// Cache-aware, retrying front for a generation backend.
///
/// The gateway never falls back to local synthesis; callers decide what to do
/// with an error.
pub struct GenerationGateway {
    backend: Arc<dyn GenerationBackend>,
    cache: Option<Arc<TieredCache>>,
    clock: Arc<dyn Clock>,
    settings: GatewaySettings,
}

impl GenerationGateway {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        cache: Option<Arc<TieredCache>>,
        clock: Arc<dyn Clock>,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            backend,
            cache,
            clock,
            settings,
        }
    }

    /// Wire up the backend and cache described by `config`.
    ///
    /// Production mode talks to the HTTP backend; otherwise the simulated one.
    pub fn from_config(
        config: &PipelineConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GenerationError> {
        let backend: Arc<dyn GenerationBackend> = if config.production {
            Arc::new(HttpBackend::new(
                &config.base_url,
                config.api_key.clone(),
                config.timeout,
            )?)
        } else {
            Arc::new(SimulatedBackend::new())
        };

        let cache = config.use_cache.then(|| {
            Arc::new(TieredCache::new(
                CacheSettings {
                    memory_enabled: true,
                    disk_dir: config.disk_cache_path.clone(),
                    default_ttl: config.cache_ttl,
                },
                clock.clone(),
            ))
        });

        tracing::info!(
            backend = backend.name(),
            model = %config.model,
            cache = cache.is_some(),
            disk_cache = cache.as_ref().is_some_and(|c| c.has_disk_tier()),
            cache_ttl_secs = cache.as_ref().map(|c| c.default_ttl().as_secs()),
            "Generation gateway configured"
        );

        Ok(Self::new(
            backend,
            cache,
            clock,
            GatewaySettings::from_config(config),
        ))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn cache(&self) -> Option<&TieredCache> {
        self.cache.as_deref()
    }

    /// Merge per-call options over the gateway defaults.
    pub fn resolve_request(&self, prompt: &str, options: &GenerationOptions) -> GenerationRequest {
        self.settings.defaults.resolve(prompt, options)
    }

    /// Cached text for `request`, if caching is on and a live entry exists.
    pub fn cached_response(&self, request: &GenerationRequest) -> Option<String> {
        self.cache.as_ref()?.get(request)
    }

    /// Call the backend with bounded retries and cache a success.
    ///
    /// Makes at most `max_retries + 1` attempts, sleeping `retry_delay` on the
    /// injected clock between them. Non-retryable errors return at once.
    /// Blank text counts as a malformed response and is never cached.
    pub fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let attempts = self.settings.max_retries.saturating_add(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            let outcome = self.backend.complete(request).and_then(|text| {
                if text.trim().is_empty() {
                    Err(GenerationError::MalformedResponse(
                        "backend returned blank text".into(),
                    ))
                } else {
                    Ok(text)
                }
            });

            match outcome {
                Ok(text) => {
                    tracing::debug!(
                        backend = self.backend.name(),
                        attempt,
                        chars = text.chars().count(),
                        "Generation succeeded"
                    );
                    if let Some(cache) = &self.cache {
                        cache.set(request, &text, Some(self.settings.cache_ttl));
                    }
                    return Ok(text);
                }
                Err(e) if !e.is_retryable() => {
                    tracing::warn!(
                        backend = self.backend.name(),
                        attempt,
                        error = %e,
                        "Generation failed with non-retryable error"
                    );
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        backend = self.backend.name(),
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "Generation attempt failed"
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        self.clock.sleep(self.settings.retry_delay);
                    }
                }
            }
        }

        Err(GenerationError::RetriesExhausted {
            attempts,
            last: Box::new(last_error.unwrap_or_else(|| {
                GenerationError::HttpClient("no attempt was made".into())
            })),
        })
    }

    /// Cache lookup, then backend call on a miss.
    pub fn send_prompt(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GeneratedText, GenerationError> {
        let request = self.resolve_request(prompt, options);
        if let Some(text) = self.cached_response(&request) {
            return Ok(GeneratedText {
                text,
                origin: TextOrigin::Cache,
            });
        }
        let text = self.generate(&request)?;
        Ok(GeneratedText {
            text,
            origin: TextOrigin::Backend,
        })
    }

    /// Lightweight reachability probe: one model listing, no retries.
    pub fn test_connection(&self) -> bool {
        match self.backend.list_models() {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), error = %e, "Connection test failed");
                false
            }
        }
    }

    pub fn get_available_models(&self) -> Result<Vec<ModelInfo>, GenerationError> {
        self.backend.list_models()
    }

    /// Empty both cache tiers. A gateway without a cache reports nothing removed.
    pub fn clear_cache(&self) -> ClearReport {
        match &self.cache {
            Some(cache) => cache.clear(),
            None => ClearReport::default(),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
