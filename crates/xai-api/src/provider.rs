//! Grok chat-completions provider.

use crate::client::{ApiClient, DEFAULT_BASE_URL};
use crate::credentials::{CredentialResolver, EnvCredential, resolve_api_key};
use crate::stream::ChatStream;
use crate::wire::{self, ChatCompletionRequest};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use xai_types::provider::{ChatProvider, EventStream};
use xai_types::{
    ApiError, ConfigError, Message, ModelResponse, ModelSettings, ToolDefinition, Usage,
};

/// The closed set of supported Grok model identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrokModelName {
    Grok2Vision1212,
    Grok21212,
    Grok2,
    Grok2Latest,
}

impl GrokModelName {
    pub const ALL: [GrokModelName; 4] = [
        GrokModelName::Grok2Vision1212,
        GrokModelName::Grok21212,
        GrokModelName::Grok2,
        GrokModelName::Grok2Latest,
    ];

    /// The wire identifier sent in requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            GrokModelName::Grok2Vision1212 => "grok-2-vision-1212",
            GrokModelName::Grok21212 => "grok-2-1212",
            GrokModelName::Grok2 => "grok-2",
            GrokModelName::Grok2Latest => "grok-2-latest",
        }
    }
}

impl FromStr for GrokModelName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|m| m.as_str() == s)
            .copied()
            .ok_or_else(|| ConfigError::UnknownModel { name: s.to_string() })
    }
}

impl std::fmt::Display for GrokModelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Grok model handle: model name, credentials, and tool configuration
/// bound to one shared HTTP client.
///
/// Immutable after construction and cheap to clone; one handle may serve many
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct GrokProvider {
    client: ApiClient,
    model: GrokModelName,
    tools: Vec<ToolDefinition>,
    allow_text_result: bool,
}

impl GrokProvider {
    /// Construct a handle for the given model.
    ///
    /// An explicit `api_key` wins; otherwise the `XAI_API_KEY` environment
    /// variable is consulted. An unknown model name or unresolvable
    /// credential fails here, before any network call.
    pub fn new(model_name: &str, api_key: Option<String>) -> Result<Self, ConfigError> {
        Self::with_resolver(model_name, api_key, &EnvCredential::new())
    }

    /// Like [`GrokProvider::new`] but with an injected credential source.
    pub fn with_resolver(
        model_name: &str,
        api_key: Option<String>,
        resolver: &dyn CredentialResolver,
    ) -> Result<Self, ConfigError> {
        let model = GrokModelName::from_str(model_name)?;
        let api_key = resolve_api_key(api_key, resolver)?;
        let client = ApiClient::new(api_key, DEFAULT_BASE_URL)?;

        Ok(Self {
            client,
            model,
            tools: Vec::new(),
            allow_text_result: true,
        })
    }

    /// Point the handle at a different endpoint (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(base_url);
        self
    }

    /// Tools offered to the model on every request.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Whether a plain-text answer is acceptable. When `false` (and tools are
    /// configured) the model is required to call a tool.
    pub fn with_allow_text_result(mut self, allow: bool) -> Self {
        self.allow_text_result = allow;
        self
    }

    pub fn model(&self) -> GrokModelName {
        self.model
    }

    /// One non-streaming exchange.
    pub async fn request(
        &self,
        messages: &[Message],
        settings: Option<&ModelSettings>,
    ) -> Result<(ModelResponse, Usage), ApiError> {
        let request = self.build(messages, settings, false)?;
        self.client.chat(&request).await
    }

    /// Start a streaming exchange. Drop the returned [`ChatStream`] to
    /// cancel; call [`ChatStream::finish`] to aggregate.
    pub async fn request_stream(
        &self,
        messages: &[Message],
        settings: Option<&ModelSettings>,
    ) -> Result<ChatStream, ApiError> {
        let request = self.build(messages, settings, true)?;
        self.client.chat_stream(&request).await
    }

    fn build(
        &self,
        messages: &[Message],
        settings: Option<&ModelSettings>,
        stream: bool,
    ) -> Result<ChatCompletionRequest, ApiError> {
        if messages.is_empty() {
            return Err(ApiError::BadRequest {
                message: "conversation history is empty".into(),
            });
        }
        Ok(wire::build_request(
            self.model.as_str(),
            messages,
            settings,
            &self.tools,
            self.allow_text_result,
            stream,
        ))
    }
}

impl ChatProvider for GrokProvider {
    fn request<'a>(
        &'a self,
        messages: &'a [Message],
        settings: Option<&'a ModelSettings>,
    ) -> Pin<Box<dyn Future<Output = Result<(ModelResponse, Usage), ApiError>> + Send + 'a>> {
        Box::pin(GrokProvider::request(self, messages, settings))
    }

    fn request_stream<'a>(
        &'a self,
        messages: &'a [Message],
        settings: Option<&'a ModelSettings>,
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, ApiError>> + Send + 'a>> {
        Box::pin(async move {
            let stream = GrokProvider::request_stream(self, messages, settings).await?;
            Ok(Box::pin(stream) as EventStream)
        })
    }

    fn name(&self) -> &str {
        "xai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredential;

    fn test_resolver() -> StaticCredential {
        StaticCredential(Some("test-key".into()))
    }

    #[test]
    fn model_name_round_trips() {
        for model in GrokModelName::ALL {
            assert_eq!(model.as_str().parse::<GrokModelName>().unwrap(), model);
        }
    }

    #[test]
    fn unknown_model_is_config_error() {
        let err = "grok-99".parse::<GrokModelName>().unwrap_err();
        match err {
            ConfigError::UnknownModel { name } => assert_eq!(name, "grok-99"),
            other => panic!("expected UnknownModel, got {other:?}"),
        }
    }

    #[test]
    fn new_rejects_unknown_model_before_credentials() {
        // Model validation happens first even with no key anywhere
        let err =
            GrokProvider::with_resolver("not-a-model", None, &StaticCredential(None)).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownModel { .. }));
    }

    #[test]
    fn new_rejects_missing_credentials() {
        let err = GrokProvider::with_resolver("grok-2", None, &StaticCredential(None)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey { .. }));
    }

    #[test]
    fn explicit_key_constructs() {
        let provider =
            GrokProvider::with_resolver("grok-2-latest", Some("sk-test".into()), &StaticCredential(None))
                .unwrap();
        assert_eq!(provider.model(), GrokModelName::Grok2Latest);
    }

    #[test]
    fn provider_name() {
        let provider = GrokProvider::with_resolver("grok-2", None, &test_resolver()).unwrap();
        assert_eq!(ChatProvider::name(&provider), "xai");
    }

    #[test]
    fn allow_text_result_defaults_true() {
        let provider = GrokProvider::with_resolver("grok-2", None, &test_resolver()).unwrap();
        assert!(provider.allow_text_result);
    }

    #[tokio::test]
    async fn empty_history_rejected_before_network() {
        // base_url points nowhere routable; the check must fire first
        let provider = GrokProvider::with_resolver("grok-2", None, &test_resolver())
            .unwrap()
            .with_base_url("http://127.0.0.1:1");

        let err = provider.request(&[], None).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { .. }));

        let err = provider.request_stream(&[], None).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest { .. }));
    }

    #[test]
    fn debug_does_not_leak_api_key() {
        let provider = GrokProvider::with_resolver(
            "grok-2",
            Some("sk-secret".into()),
            &StaticCredential(None),
        )
        .unwrap();
        let rendered = format!("{provider:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn display_matches_wire_identifier() {
        assert_eq!(GrokModelName::Grok2Vision1212.to_string(), "grok-2-vision-1212");
        assert_eq!(GrokModelName::Grok21212.to_string(), "grok-2-1212");
    }
}
