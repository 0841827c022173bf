//! CompletionClient - Chat Completions call against a hosted DeepSeek model.
//!
//! One POST per submission, no streaming and no retries. The HTTP layer sits
//! behind [`ChatTransport`] so the request/response handling can be exercised
//! without a network.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parley_core::config::{AppConfig, Credentials};
use parley_core::conversation::ChatMessage;
use parley_core::model::{ModelSelector, Provider};
use parley_core::{ParleyError, Result};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

/// Reply used when a success response carries no usable content.
pub const EMPTY_REPLY_PLACEHOLDER: &str = "Entschuldigung, ich konnte keine Antwort generieren.";

/// An outgoing HTTP request, fully prepared.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
}

impl TransportRequest {
    /// First header value named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and raw body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Sends prepared requests. Implemented over reqwest by [`HttpTransport`].
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn post(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with a whole-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ParleyError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn post(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let headers = header_map(&request.headers)?;
        let body = serde_json::to_vec(&request.body)
            .map_err(|err| TransportError(format!("failed to encode request body: {err}")))?;

        let response = self
            .client
            .post(&request.url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    TransportError(format!("request timed out: {err}"))
                } else {
                    TransportError(err.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| TransportError(format!("failed to read response body: {err}")))?;

        Ok(TransportResponse { status, body })
    }
}

/// Builds the header set, one value per name; a later entry replaces an earlier one.
fn header_map(headers: &[(String, String)]) -> std::result::Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| TransportError(format!("invalid header name '{name}': {err}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|err| TransportError(format!("invalid value for header '{name}': {err}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Shape of a 2xx response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionPayload {
    /// `choices[0].message.content` is a non-empty string.
    Success {
        content: String,
        usage: Option<Usage>,
    },
    /// The provider reported an error inside a success response.
    ProviderError { message: String },
    /// Anything else.
    Malformed { reason: String },
}

impl CompletionPayload {
    /// Classifies a response body.
    pub fn parse(body: &str) -> Self {
        match serde_json::from_str::<ChatCompletionResponse>(body) {
            Ok(response) => {
                let usage = response.usage;
                match response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                {
                    Some(content) if !content.is_empty() => Self::Success { content, usage },
                    Some(_) => Self::Malformed {
                        reason: "empty message content".into(),
                    },
                    None => Self::Malformed {
                        reason: "no message content in choices".into(),
                    },
                }
            }
            Err(parse_err) => match serde_json::from_str::<ErrorResponse>(body) {
                Ok(wrapper) => Self::ProviderError {
                    message: wrapper.error.message,
                },
                Err(_) => Self::Malformed {
                    reason: parse_err.to_string(),
                },
            },
        }
    }

    /// Reply text, or a `MalformedResponse` error for every other shape.
    pub fn into_reply(self, provider: Provider) -> Result<String> {
        match self {
            Self::Success { content, .. } => Ok(content),
            Self::ProviderError { message } => Err(ParleyError::MalformedResponse {
                provider: provider.label().to_string(),
                message: format!("provider error in success response: {message}"),
            }),
            Self::Malformed { reason } => Err(ParleyError::MalformedResponse {
                provider: provider.label().to_string(),
                message: reason,
            }),
        }
    }
}

/// Client for the provider's chat-completions endpoint.
#[derive(Clone)]
pub struct CompletionClient {
    transport: Arc<dyn ChatTransport>,
    provider: Provider,
    endpoint: String,
    referer: String,
    title: String,
}

impl CompletionClient {
    /// Creates a client using `transport` and the settings in `config`.
    pub fn new(transport: Arc<dyn ChatTransport>, config: &AppConfig) -> Self {
        Self {
            transport,
            provider: config.provider,
            endpoint: config.endpoint_url().to_string(),
            referer: config.client_referer.clone(),
            title: config.client_title.clone(),
        }
    }

    /// Creates a client backed by [`HttpTransport`].
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let transport = HttpTransport::new(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self::new(Arc::new(transport), config))
    }

    /// Sends `messages` to `model` and returns the reply text.
    ///
    /// The system prompt is prepended here. A missing credential fails before
    /// anything is sent. Success responses without usable content yield
    /// [`EMPTY_REPLY_PLACEHOLDER`].
    pub async fn complete(
        &self,
        model: ModelSelector,
        credentials: &Credentials,
        messages: &[ChatMessage],
    ) -> Result<String> {
        let api_key = credentials
            .for_model(model)
            .ok_or_else(|| ParleyError::missing_credential(model.id()))?;

        let request = self.build_request(model, api_key, messages)?;
        let label = self.provider.label();

        tracing::debug!(
            provider = label,
            model = %request.body["model"],
            message_count = messages.len() + 1,
            "Sending chat completion request"
        );

        let response = self
            .transport
            .post(request)
            .await
            .map_err(|err| {
                tracing::error!(provider = label, error = %err, "Request failed");
                ParleyError::transport(label, err.0)
            })?;

        if !response.is_success() {
            tracing::error!(provider = label, status = response.status, "API error response");
            return Err(ParleyError::remote_request(
                label,
                response.status,
                response.body,
            ));
        }

        let payload = CompletionPayload::parse(&response.body);
        if let CompletionPayload::Success { usage, .. } = &payload {
            tracing::info!(provider = label, usage = ?usage, "Chat completion succeeded");
        }

        match payload.into_reply(self.provider) {
            Ok(reply) => Ok(reply),
            Err(err) => {
                tracing::warn!(error = %err, "Unusable completion response, using placeholder");
                Ok(EMPTY_REPLY_PLACEHOLDER.to_string())
            }
        }
    }

    fn build_request(
        &self,
        model: ModelSelector,
        api_key: &str,
        messages: &[ChatMessage],
    ) -> Result<TransportRequest> {
        let profile = model.profile(self.provider);

        let mut all_messages = Vec::with_capacity(messages.len() + 1);
        all_messages.push(ChatMessage::system(profile.system_prompt.clone()));
        all_messages.extend_from_slice(messages);

        let body = ChatCompletionRequest {
            model: &profile.remote_model,
            messages: all_messages,
            temperature: profile.temperature,
            max_tokens: profile.max_tokens,
            stream: false,
        };

        Ok(TransportRequest {
            url: self.endpoint.clone(),
            headers: vec![
                ("Content-Type".into(), "application/json".into()),
                ("Authorization".into(), format!("Bearer {api_key}")),
                ("HTTP-Referer".into(), self.referer.clone()),
                ("X-Title".into(), self.title.clone()),
            ],
            body: serde_json::to_value(&body)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StubTransport {
        response: std::result::Result<TransportResponse, TransportError>,
        requests: Mutex<Vec<TransportRequest>>,
    }

    impl StubTransport {
        fn replying(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(TransportResponse {
                    status,
                    body: body.to_string(),
                }),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatTransport for StubTransport {
        async fn post(
            &self,
            request: TransportRequest,
        ) -> std::result::Result<TransportResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            self.response.clone()
        }
    }

    fn credentials() -> Credentials {
        Credentials::new(Some("sk-v3".into()), Some("sk-r1".into()))
    }

    #[test]
    fn test_parse_success() {
        let payload = CompletionPayload::parse(
            r#"{"choices":[{"message":{"role":"assistant","content":"Hi!"}}],"usage":{"prompt_tokens":3,"completion_tokens":2,"total_tokens":5}}"#,
        );
        assert_eq!(
            payload,
            CompletionPayload::Success {
                content: "Hi!".into(),
                usage: Some(Usage {
                    prompt_tokens: 3,
                    completion_tokens: 2,
                    total_tokens: 5
                }),
            }
        );
    }

    #[test]
    fn test_parse_other_shapes() {
        assert!(matches!(
            CompletionPayload::parse(r#"{"choices":[]}"#),
            CompletionPayload::Malformed { .. }
        ));
        assert!(matches!(
            CompletionPayload::parse(r#"{"choices":[{"message":{"content":""}}]}"#),
            CompletionPayload::Malformed { .. }
        ));
        assert!(matches!(
            CompletionPayload::parse(r#"{"choices":[{"message":{"content":null}}]}"#),
            CompletionPayload::Malformed { .. }
        ));
        assert!(matches!(
            CompletionPayload::parse("<html>gateway</html>"),
            CompletionPayload::Malformed { .. }
        ));
        assert_eq!(
            CompletionPayload::parse(r#"{"error":{"message":"rate limited","code":429}}"#),
            CompletionPayload::ProviderError {
                message: "rate limited".into()
            }
        );
    }

    #[tokio::test]
    async fn test_request_shape() {
        let transport = StubTransport::replying(
            200,
            r#"{"choices":[{"message":{"content":"Hi!"}}]}"#,
        );
        let client = CompletionClient::new(transport.clone(), &AppConfig::default());

        let reply = client
            .complete(ModelSelector::DeepSeekV3, &credentials(), &[ChatMessage::user("Hallo")])
            .await
            .unwrap();
        assert_eq!(reply, "Hi!");

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.url, "https://openrouter.ai/api/v1/chat/completions");
        assert_eq!(request.header("authorization"), Some("Bearer sk-v3"));
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(request.header("X-Title"), Some("DeepSeek Deutsch Chatbot"));
        assert_eq!(request.header("HTTP-Referer"), Some("http://localhost"));

        let body = &request.body;
        assert_eq!(body["model"], "deepseek/deepseek-chat");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["stream"], false);
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "Hallo");
    }

    #[tokio::test]
    async fn test_deepseek_provider_and_endpoint_override() {
        let transport = StubTransport::replying(200, r#"{"choices":[{"message":{"content":"ok"}}]}"#);
        let config = AppConfig {
            provider: Provider::DeepSeek,
            endpoint: Some("http://127.0.0.1:9/v1/chat".into()),
            ..AppConfig::default()
        };
        let client = CompletionClient::new(transport.clone(), &config);

        client
            .complete(ModelSelector::DeepSeekR1, &credentials(), &[ChatMessage::user("x")])
            .await
            .unwrap();

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].url, "http://127.0.0.1:9/v1/chat");
        assert_eq!(requests[0].body["model"], "deepseek-reasoner");
        assert_eq!(requests[0].header("Authorization"), Some("Bearer sk-r1"));
    }

    #[tokio::test]
    async fn test_missing_credential_sends_nothing() {
        let transport = StubTransport::replying(200, "{}");
        let client = CompletionClient::new(transport.clone(), &AppConfig::default());
        let credentials = Credentials::new(Some("sk-v3".into()), None);

        let err = client
            .complete(ModelSelector::DeepSeekR1, &credentials, &[ChatMessage::user("x")])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "API key not found for deepseek-r1");
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let transport = StubTransport::replying(500, "insufficient balance");
        let client = CompletionClient::new(transport, &AppConfig::default());

        let err = client
            .complete(ModelSelector::DeepSeekV3, &credentials(), &[ChatMessage::user("x")])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "OpenRouter API Error: 500 - insufficient balance");
    }

    #[tokio::test]
    async fn test_malformed_success_yields_placeholder() {
        let transport = StubTransport::replying(200, r#"{"unexpected":true}"#);
        let client = CompletionClient::new(transport, &AppConfig::default());

        let reply = client
            .complete(ModelSelector::DeepSeekV3, &credentials(), &[ChatMessage::user("x")])
            .await
            .unwrap();
        assert_eq!(reply, EMPTY_REPLY_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let transport = Arc::new(StubTransport {
            response: Err(TransportError("connection refused".into())),
            requests: Mutex::new(Vec::new()),
        });
        let client = CompletionClient::new(transport, &AppConfig::default());

        let err = client
            .complete(ModelSelector::DeepSeekV3, &credentials(), &[ChatMessage::user("x")])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ParleyError::transport("OpenRouter", "connection refused")
        );
    }

    /// Reads one HTTP/1.1 request (head plus `Content-Length` body) from `stream`.
    async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
        use tokio::io::AsyncReadExt;

        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.trim()
                            .eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if raw.len() >= head_end + 4 + content_length {
                    return text;
                }
            }
        }
        String::from_utf8_lossy(&raw).to_string()
    }

    #[tokio::test]
    async fn test_http_transport_sends_single_content_type() {
        use tokio::io::AsyncWriteExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;

            let reply = r#"{"choices":[{"message":{"content":"Hi!"}}]}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                reply.len(),
                reply
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            request
        });

        let config = AppConfig {
            endpoint: Some(format!("http://{addr}/v1/chat/completions")),
            ..AppConfig::default()
        };
        let client = CompletionClient::from_config(&config).unwrap();

        let reply = client
            .complete(ModelSelector::DeepSeekV3, &credentials(), &[ChatMessage::user("Hallo")])
            .await
            .unwrap();
        assert_eq!(reply, "Hi!");

        let request = server.await.unwrap();
        let head = request.split("\r\n\r\n").next().unwrap();
        assert!(head.starts_with("POST /v1/chat/completions HTTP/1.1"));

        let content_types: Vec<&str> = head
            .lines()
            .filter(|line| line.to_ascii_lowercase().starts_with("content-type:"))
            .collect();
        assert_eq!(content_types.len(), 1, "headers: {head}");
        assert!(content_types[0].to_ascii_lowercase().ends_with("application/json"));
        assert!(head.lines().any(|line| line.eq_ignore_ascii_case("authorization: Bearer sk-v3")));
        assert!(request.contains(r#""content":"Hallo""#));
    }

    #[test]
    fn test_header_map_rejects_invalid_name() {
        let err = header_map(&[("Bad Header".into(), "x".into())]).unwrap_err();
        assert!(err.0.starts_with("invalid header name 'Bad Header'"));
    }
}
