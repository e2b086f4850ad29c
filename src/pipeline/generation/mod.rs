pub mod gateway;
pub mod http;
pub mod simulated;
pub mod types;

pub use gateway::*;
pub use http::*;
pub use simulated::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation backend is not reachable at {0}")]
    Connection(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Generation backend returned error (status {status}): {body}")]
    Backend { status: u16, body: String },

    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),

    #[error("Generation failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<GenerationError>,
    },
}

impl GenerationError {
    /// Network faults, timeouts, server-side errors and unparseable bodies
    /// may succeed on a later attempt. Credential and request errors won't.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Connection(_)
            | GenerationError::Timeout(_)
            | GenerationError::HttpClient(_)
            | GenerationError::MalformedResponse(_) => true,
            GenerationError::Backend { status, .. } => {
                *status >= 500 || matches!(*status, 408 | 429)
            }
            GenerationError::Authentication(_) | GenerationError::RetriesExhausted { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(GenerationError::Connection("http://x".into()).is_retryable());
        assert!(GenerationError::Timeout(15_000).is_retryable());
        assert!(GenerationError::HttpClient("reset".into()).is_retryable());
        assert!(GenerationError::MalformedResponse("no choices".into()).is_retryable());
    }

    #[test]
    fn server_errors_and_rate_limits_are_retryable() {
        for status in [500, 502, 503, 429, 408] {
            let e = GenerationError::Backend {
                status,
                body: String::new(),
            };
            assert!(e.is_retryable(), "status {status}");
        }
    }

    #[test]
    fn client_errors_fail_fast() {
        assert!(!GenerationError::Authentication("bad key".into()).is_retryable());
        for status in [400, 404, 422] {
            let e = GenerationError::Backend {
                status,
                body: "bad request".into(),
            };
            assert!(!e.is_retryable(), "status {status}");
        }
    }

    #[test]
    fn exhausted_error_reports_attempts_and_cause() {
        let e = GenerationError::RetriesExhausted {
            attempts: 3,
            last: Box::new(GenerationError::Timeout(15_000)),
        };
        let text = e.to_string();
        assert!(text.contains("3 attempts"));
        assert!(text.contains("timed out"));
        assert!(!e.is_retryable());
    }
}
