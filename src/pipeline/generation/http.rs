use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::{ChatMessage, GenerationBackend, GenerationRequest, ModelInfo};
use super::GenerationError;

/// OpenAI-compatible chat completions client.
pub struct HttpBackend {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client,
            timeout,
        })
    }

    fn bearer(&self) -> Result<String, GenerationError> {
        self.api_key
            .as_deref()
            .map(|key| format!("Bearer {key}"))
            .ok_or_else(|| GenerationError::Authentication("no API key configured".into()))
    }

    fn transport_error(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout(self.timeout.as_millis() as u64)
        } else if e.is_connect() {
            GenerationError::Connection(self.base_url.clone())
        } else {
            GenerationError::HttpClient(e.to_string())
        }
    }

    /// Map a non-success status, or return the body of a successful response.
    fn read_body(&self, response: reqwest::blocking::Response) -> Result<String, GenerationError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(GenerationError::Authentication(format!(
                    "status {}",
                    status.as_u16()
                )));
            }
            return Err(GenerationError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        response.text().map_err(|e| self.transport_error(e))
    }
}

/// Request body for POST /chat/completions
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

/// Response body from POST /chat/completions
#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Response body from GET /models
#[derive(Deserialize)]
struct ModelListResponse {
    data: Vec<ModelInfo>,
}

/// Pull the first choice's text out of a chat completion body.
fn extract_completion(body: &str) -> Result<String, GenerationError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| GenerationError::MalformedResponse("response has no completion text".into()))
}

fn extract_models(body: &str) -> Result<Vec<ModelInfo>, GenerationError> {
    let parsed: ModelListResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
    Ok(parsed.data)
}

impl GenerationBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let bearer = self.bearer()?;
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &request.model,
            messages: request.messages(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, bearer)
            .json(&body)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let text = self.read_body(response)?;
        extract_completion(&text)
    }

    fn list_models(&self) -> Result<Vec<ModelInfo>, GenerationError> {
        let bearer = self.bearer()?;
        let url = format!("{}/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, bearer)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let text = self.read_body(response)?;
        extract_models(&text)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::clock::ManualClock;
    use crate::pipeline::generation::{
        GatewaySettings, GenerationDefaults, GenerationGateway, GenerationOptions,
    };

    fn backend(key: Option<&str>) -> HttpBackend {
        HttpBackend::new(
            "https://api.example.test/v1/",
            key.map(String::from),
            Duration::from_secs(15),
        )
        .unwrap()
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            prompt: "p".into(),
            model: "gpt-4o-mini".into(),
            temperature: 0.2,
            max_tokens: 100,
            system: None,
        }
    }

    #[test]
    fn constructor_trims_trailing_slash() {
        assert_eq!(backend(Some("k")).base_url, "https://api.example.test/v1");
    }

    #[test]
    fn blank_key_counts_as_missing() {
        assert!(backend(Some("   ")).api_key.is_none());
    }

    #[test]
    fn missing_key_fails_before_network() {
        let err = backend(None).complete(&request()).unwrap_err();
        assert!(matches!(err, GenerationError::Authentication(_)));
        assert!(!err.is_retryable());

        let err = backend(None).list_models().unwrap_err();
        assert!(matches!(err, GenerationError::Authentication(_)));
    }

    #[test]
    fn extracts_first_choice_content() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"סיכום"}}]}"#;
        assert_eq!(extract_completion(body).unwrap(), "סיכום");
    }

    #[test]
    fn empty_choices_is_malformed() {
        let err = extract_completion(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
    }

    #[test]
    fn null_or_blank_content_is_malformed() {
        let null = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert!(extract_completion(null).is_err());
        let blank = r#"{"choices":[{"message":{"role":"assistant","content":"  "}}]}"#;
        assert!(extract_completion(blank).is_err());
    }

    #[test]
    fn non_json_body_is_malformed() {
        let err = extract_completion("<html>bad gateway</html>").unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn extracts_model_list() {
        let body = r#"{"object":"list","data":[{"id":"gpt-4o","created":1},{"id":"gpt-4o-mini","created":2}]}"#;
        let models = extract_models(body).unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[1].id, "gpt-4o-mini");
    }

    #[test]
    fn request_body_uses_chat_shape() {
        let req = request();
        let body = ChatCompletionRequest {
            model: &req.model,
            messages: req.messages(),
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 100);
    }

    // ── Local HTTP stub ─────────────────────────────────────

    /// Answers every connection with the same status and body, counting hits.
    struct StubServer {
        url: String,
        hits: Arc<AtomicUsize>,
    }

    impl StubServer {
        fn start(status: u16, body: &'static str) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let addr = listener.local_addr().unwrap();
            let hits = Arc::new(AtomicUsize::new(0));
            let counter = hits.clone();

            thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(mut stream) = stream else { break };
                    counter.fetch_add(1, Ordering::SeqCst);
                    drain_request(&stream);
                    let response = format!(
                        "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = stream.write_all(response.as_bytes());
                }
            });

            Self {
                url: format!("http://{addr}/v1"),
                hits,
            }
        }

        fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    fn drain_request(stream: &TcpStream) {
        let mut reader = BufReader::new(stream);
        let mut content_length = 0;
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).unwrap_or(0) == 0 {
                return;
            }
            let header = line.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
        }
        let mut body = vec![0; content_length];
        let _ = reader.read_exact(&mut body);
    }

    fn stub_gateway(server: &StubServer, max_retries: u32) -> (GenerationGateway, Arc<ManualClock>) {
        let backend = HttpBackend::new(&server.url, Some("sk-test".into()), Duration::from_secs(5))
            .unwrap();
        let clock = Arc::new(ManualClock::fixed());
        let gateway = GenerationGateway::new(
            Arc::new(backend),
            None,
            clock.clone(),
            GatewaySettings {
                defaults: GenerationDefaults {
                    model: "gpt-4o-mini".into(),
                    temperature: 0.2,
                    max_tokens: 100,
                },
                max_retries,
                retry_delay: Duration::from_millis(500),
                cache_ttl: Duration::from_secs(60),
            },
        );
        (gateway, clock)
    }

    #[test]
    fn rejected_credentials_fail_after_one_request() {
        for status in [401, 403] {
            let server = StubServer::start(status, r#"{"error":"invalid key"}"#);
            let (gateway, clock) = stub_gateway(&server, 2);

            let err = gateway
                .send_prompt("p", &GenerationOptions::default())
                .unwrap_err();
            assert!(matches!(err, GenerationError::Authentication(_)), "status {status}: {err}");
            assert_eq!(server.hits(), 1, "status {status}");
            assert!(clock.recorded_sleeps().is_empty());
        }
    }

    #[test]
    fn server_error_is_retried_until_exhausted() {
        let server = StubServer::start(503, r#"{"error":"overloaded"}"#);
        let (gateway, clock) = stub_gateway(&server, 2);

        let err = gateway
            .send_prompt("p", &GenerationOptions::default())
            .unwrap_err();
        match err {
            GenerationError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, GenerationError::Backend { status: 503, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(server.hits(), 3);
        assert_eq!(clock.recorded_sleeps().len(), 2);
    }

    #[test]
    fn empty_success_body_is_retried_as_malformed() {
        let server = StubServer::start(200, "{}");
        let (gateway, _clock) = stub_gateway(&server, 2);

        let err = gateway
            .send_prompt("p", &GenerationOptions::default())
            .unwrap_err();
        match err {
            GenerationError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, GenerationError::MalformedResponse(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(server.hits(), 3);
    }

    #[test]
    fn bad_request_fails_fast() {
        let server = StubServer::start(400, r#"{"error":"bad model"}"#);
        let (gateway, _clock) = stub_gateway(&server, 2);

        let err = gateway
            .send_prompt("p", &GenerationOptions::default())
            .unwrap_err();
        assert!(matches!(err, GenerationError::Backend { status: 400, .. }));
        assert_eq!(server.hits(), 1);
    }

    #[test]
    fn completion_is_read_from_stub() {
        let server = StubServer::start(
            200,
            r#"{"choices":[{"message":{"role":"assistant","content":"סיכום"}}]}"#,
        );
        let (gateway, _clock) = stub_gateway(&server, 2);

        let text = gateway
            .send_prompt("p", &GenerationOptions::default())
            .unwrap();
        assert_eq!(text.text, "סיכום");
        assert_eq!(server.hits(), 1);
    }

    #[test]
    fn connection_test_reports_rejected_key() {
        let server = StubServer::start(401, "{}");
        let (gateway, _clock) = stub_gateway(&server, 0);
        assert!(!gateway.test_connection());
        assert_eq!(server.hits(), 1);
    }
}
