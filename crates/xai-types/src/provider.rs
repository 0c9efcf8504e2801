//! Provider trait for chat-completion APIs.

use crate::{ApiError, Message, ModelResponse, ModelSettings, StreamEvent, Usage};
use futures_core::Stream;
use std::future::Future;
use std::pin::Pin;

/// A boxed async stream of canonical events from a provider.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, ApiError>> + Send>>;

/// A chat-completion provider bound to one model and one set of credentials.
///
/// Providers translate the shared message model into their native wire format
/// and back. Dyn-compatible so the agent framework can hold
/// `Arc<dyn ChatProvider>`. The history slice is borrowed for the duration of
/// the call and never mutated.
pub trait ChatProvider: Send + Sync {
    /// One request/response exchange: exactly one network call, exactly one
    /// `(ModelResponse, Usage)` pair or one classified error.
    fn request<'a>(
        &'a self,
        messages: &'a [Message],
        settings: Option<&'a ModelSettings>,
    ) -> Pin<Box<dyn Future<Output = Result<(ModelResponse, Usage), ApiError>> + Send + 'a>>;

    /// Start a streaming exchange, returning a stream of canonical events.
    ///
    /// Dropping the returned stream cancels delivery and releases the
    /// underlying connection.
    fn request_stream<'a>(
        &'a self,
        messages: &'a [Message],
        settings: Option<&'a ModelSettings>,
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, ApiError>> + Send + 'a>>;

    /// Provider name for logging/display (e.g., "xai").
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn provider_is_dyn_compatible() {
        // Compile-time check: ChatProvider can be used as a trait object.
        fn _accept(_p: &dyn ChatProvider) {}
    }

    #[test]
    fn arc_provider_is_send_sync() {
        // Compile-time assert: Arc<dyn ChatProvider> is Send + Sync.
        fn _assert_send_sync<T: Send + Sync>() {}
        _assert_send_sync::<Arc<dyn ChatProvider>>();
    }
}
