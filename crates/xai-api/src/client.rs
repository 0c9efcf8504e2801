//! xAI chat-completions HTTP client.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use xai_types::{ApiError, ConfigError, ModelResponse, Usage};

use crate::stream::ChatStream;
use crate::wire::{self, ChatCompletionRequest};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.x.ai";

/// Client for the xAI chat-completions API.
///
/// One network exchange per call, no silent recovery: every failure is
/// classified into an [`ApiError`] kind and surfaced. The client never
/// retries on its own; see [`crate::retry`] for caller-directed backoff.
/// Cloning is cheap and the client is safe to share across concurrent tasks.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client. A failure to assemble the underlying HTTP
    /// client is a construction-time problem, not a request failure.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Send a non-streaming request and decode the full response.
    pub async fn chat(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<(ModelResponse, Usage), ApiError> {
        let response = self.send(request).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        wire::decode_response(&body)
    }

    /// Send a streaming request and return the live event stream.
    pub async fn chat_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatStream, ApiError> {
        let response = self.send(request).await?;
        Ok(ChatStream::new(response.bytes_stream()))
    }

    async fn send(&self, request: &ChatCompletionRequest) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(|_| {
                ApiError::Auth {
                    message: "invalid API key format".into(),
                }
            })?,
        );

        let body = serde_json::to_string(request).map_err(|e| ApiError::BadRequest {
            message: format!("failed to serialize request: {e}"),
        })?;

        tracing::debug!(model = %request.model, stream = request.stream, "POST {url}");

        let result = self.http.post(&url).headers(headers).body(body).send().await;

        match result {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }
                let retry_after = parse_retry_after(response.headers());
                let body_text = response.text().await.unwrap_or_default();
                Err(classify_error(status.as_u16(), &body_text, retry_after))
            }
            Err(e) if e.is_timeout() => Err(ApiError::Timeout),
            Err(e) => Err(ApiError::Network(e.to_string())),
        }
    }
}

/// Parse the `retry-after` header value as seconds and convert to milliseconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<f64>().ok())
        .map(|secs| (secs * 1000.0) as u64)
}

/// Classify an HTTP error response into a typed ApiError.
fn classify_error(status: u16, body: &str, retry_after: Option<u64>) -> ApiError {
    let message = extract_error_message(body);

    match status {
        401 | 403 => ApiError::Auth { message },
        400 | 404 | 422 => ApiError::BadRequest { message },
        429 => ApiError::RateLimited {
            retry_after_ms: retry_after,
        },
        _ => ApiError::Server { status, message },
    }
}

/// Pull a human-readable message out of an error body.
///
/// xAI returns either `{"error": {"message": "..."}}` or `{"error": "..."}`;
/// anything else falls back to the raw body.
fn extract_error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: Option<ErrorField>,
    }
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum ErrorField {
        Detail { message: String },
        Plain(String),
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .map(|e| match e {
            ErrorField::Detail { message } => message,
            ErrorField::Plain(message) => message,
        })
        .unwrap_or_else(|| body.to_string())
}
