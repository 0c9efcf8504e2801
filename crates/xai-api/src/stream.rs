//! Async stream that decodes chat-completion chunks into canonical events.

use crate::sse::SseParser;
use crate::wire::{self, ChatCompletionChunk};
use futures_core::Stream;
use futures_util::StreamExt;
use pin_project_lite::pin_project;
use std::collections::{BTreeMap, VecDeque};
use std::pin::Pin;
use std::task::{Context, Poll};
use xai_types::{
    ApiError, FinishReason, ModelResponse, ResponsePart, StreamEvent, ToolCall, Usage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    /// Still reading from the transport.
    Open,
    /// `[DONE]` sentinel observed; the stream ends cleanly.
    Done,
    /// A terminal error was yielded; nothing follows.
    Failed,
}

pin_project! {
    /// A live streaming response: yields canonical [`StreamEvent`]s in
    /// provider emission order.
    ///
    /// The stream owns the HTTP response body; dropping it at any point
    /// cancels delivery and releases the connection. A transport failure or
    /// EOF before the `[DONE]` sentinel yields
    /// [`ApiError::StreamInterrupted`] carrying all text delivered so far.
    pub struct ChatStream {
        #[pin]
        inner: Pin<Box<dyn Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>,
        parser: SseParser,
        pending: VecDeque<Result<StreamEvent, ApiError>>,
        partial: String,
        finish_reason: Option<FinishReason>,
        usage: Option<Usage>,
        state: StreamState,
    }
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream")
            .field("state", &self.state)
            .field("partial_len", &self.partial.len())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl ChatStream {
    /// Wrap a raw byte stream (normally `reqwest::Response::bytes_stream`).
    pub fn new(
        byte_stream: impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            parser: SseParser::new(),
            pending: VecDeque::new(),
            partial: String::new(),
            finish_reason: None,
            usage: None,
            state: StreamState::Open,
        }
    }

    /// Text content delivered so far.
    pub fn partial_text(&self) -> &str {
        &self.partial
    }

    /// Drain the stream and return the aggregated response and usage.
    ///
    /// Tool-call argument fragments are assembled per call index; the
    /// concatenation of all text deltas becomes the response text. Any stream
    /// error terminates aggregation and propagates.
    pub async fn finish(self) -> Result<(ModelResponse, Usage), ApiError> {
        let mut this = std::pin::pin!(self);
        let mut text = String::new();
        let mut calls: BTreeMap<usize, PartialCall> = BTreeMap::new();
        let mut reason = None;
        let mut usage = None;

        while let Some(event) = this.as_mut().next().await {
            match event? {
                StreamEvent::TextDelta { text: delta } => text.push_str(&delta),
                StreamEvent::ToolCallDelta {
                    index,
                    id,
                    name,
                    arguments,
                } => {
                    let call = calls.entry(index).or_default();
                    if let Some(id) = id {
                        call.id = id;
                    }
                    if let Some(name) = name {
                        call.name = name;
                    }
                    call.arguments.push_str(&arguments);
                }
                StreamEvent::Finished {
                    reason: r,
                    usage: u,
                } => {
                    reason = r;
                    usage = u;
                }
            }
        }

        let mut parts = Vec::new();
        if !text.is_empty() {
            parts.push(ResponsePart::Text { text });
        }
        for (_, call) in calls {
            parts.push(ResponsePart::ToolCall(ToolCall {
                id: call.id,
                name: call.name,
                arguments: call.arguments,
            }));
        }

        Ok((
            ModelResponse {
                parts,
                finish_reason: reason,
            },
            usage.unwrap_or_default(),
        ))
    }
}

#[derive(Default)]
struct PartialCall {
    id: String,
    name: String,
    arguments: String,
}

impl Stream for ChatStream {
    type Item = Result<StreamEvent, ApiError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            // Drain decoded items before reading more bytes
            if let Some(item) = this.pending.pop_front() {
                match &item {
                    Ok(StreamEvent::TextDelta { text }) => this.partial.push_str(text),
                    Err(_) => {
                        *this.state = StreamState::Failed;
                        this.pending.clear();
                    }
                    _ => {}
                }
                return Poll::Ready(Some(item));
            }

            if *this.state != StreamState::Open {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    let text = String::from_utf8_lossy(&bytes);
                    for frame in this.parser.feed(&text) {
                        if frame == "[DONE]" {
                            *this.state = StreamState::Done;
                            this.pending.push_back(Ok(StreamEvent::Finished {
                                reason: *this.finish_reason,
                                usage: this.usage.clone(),
                            }));
                            break;
                        }
                        match serde_json::from_str::<ChatCompletionChunk>(&frame) {
                            Ok(chunk) => {
                                let (events, reason, usage) = wire::chunk_events(chunk);
                                if reason.is_some() {
                                    *this.finish_reason = reason;
                                }
                                if usage.is_some() {
                                    *this.usage = usage;
                                }
                                this.pending.extend(events.into_iter().map(Ok));
                            }
                            Err(e) => {
                                this.pending.push_back(Err(ApiError::Decode {
                                    message: e.to_string(),
                                    payload: wire::truncate_payload(&frame),
                                }));
                                break;
                            }
                        }
                    }
                    // Loop back to drain whatever the frames produced
                }
                Poll::Ready(Some(Err(e))) => {
                    tracing::debug!("transport error mid-stream: {e}");
                    *this.state = StreamState::Failed;
                    return Poll::Ready(Some(Err(ApiError::StreamInterrupted {
                        partial: this.partial.clone(),
                    })));
                }
                Poll::Ready(None) => {
                    // EOF without the sentinel is a dropped connection
                    *this.state = StreamState::Failed;
                    return Poll::Ready(Some(Err(ApiError::StreamInterrupted {
                        partial: this.partial.clone(),
                    })));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
