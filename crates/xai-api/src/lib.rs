//! xAI (Grok) chat-completions client with SSE streaming.

mod client;
mod credentials;
mod provider;
pub mod retry;
mod sse;
mod stream;
mod wire;

pub use client::ApiClient;
pub use credentials::{API_KEY_ENV_VAR, CredentialResolver, EnvCredential, StaticCredential};
pub use provider::{GrokModelName, GrokProvider};
pub use retry::RetryConfig;
pub use stream::ChatStream;
pub use wire::ChatCompletionRequest;
