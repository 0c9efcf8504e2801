//! Integration tests for HTTP-level behavior of the adapter.
//!
//! Uses a raw TCP test server with canned responses to verify error
//! classification, the no-retry policy, and end-to-end request/stream
//! behavior through `GrokProvider`.
//!
//! Run with: `cargo test -p xai-api --test client_integration -- --ignored`

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use xai_api::{GrokProvider, StaticCredential};
use xai_types::{ApiError, FinishReason, Message};

/// Minimal valid SSE body for one complete streamed response.
const SSE_SUCCESS_BODY: &str = "\
data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hello\"},\"finish_reason\":null}]}\n\
\n\
data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\" world\"},\"finish_reason\":null}]}\n\
\n\
data: {\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\
\n\
data: {\"choices\":[],\"usage\":{\"prompt_tokens\":12,\"completion_tokens\":6,\"total_tokens\":18}}\n\
\n\
data: [DONE]\n\
\n";

/// Same body cut off mid-stream: no finish_reason, no [DONE].
const SSE_TRUNCATED_BODY: &str = "\
data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hello\"},\"finish_reason\":null}]}\n\
\n\
data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\" wor\"},\"finish_reason\":null}]}\n\
\n";

const JSON_SUCCESS_BODY: &str = "{\
\"choices\":[{\"index\":0,\"message\":{\"role\":\"assistant\",\"content\":\"Hi there\"},\"finish_reason\":\"stop\"}],\
\"usage\":{\"prompt_tokens\":9,\"completion_tokens\":3,\"total_tokens\":12}}";

fn http_response(status_line: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status_line}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len(),
    )
}

fn http_200_json(body: &str) -> String {
    http_response("200 OK", "application/json", body)
}

fn http_200_sse(body: &str) -> String {
    http_response("200 OK", "text/event-stream", body)
}

fn http_401() -> String {
    http_response(
        "401 Unauthorized",
        "application/json",
        r#"{"error":{"message":"invalid api key"}}"#,
    )
}

fn http_429() -> String {
    let body = r#"{"error":{"message":"rate limited"}}"#;
    format!(
        "HTTP/1.1 429 Too Many Requests\r\n\
         Content-Type: application/json\r\n\
         Retry-After: 0.25\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        body.len(),
        body
    )
}

fn http_500() -> String {
    http_response(
        "500 Internal Server Error",
        "application/json",
        r#"{"error":{"message":"internal error"}}"#,
    )
}

/// Start a test TCP server that returns pre-configured responses.
/// `responses` is a list of HTTP response strings — one per incoming
/// connection. Returns the server address and the request counter.
async fn start_test_server(responses: Vec<String>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = Arc::clone(&counter);

    tokio::spawn(async move {
        let responses = Arc::new(responses);
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let idx = counter_clone.fetch_add(1, Ordering::SeqCst);
            let responses = Arc::clone(&responses);

            tokio::spawn(async move {
                // Read the HTTP request (consume it so the socket doesn't hang)
                let mut buf = vec![0u8; 8192];
                let _ = socket.read(&mut buf).await;

                if idx < responses.len() {
                    let _ = socket.write_all(responses[idx].as_bytes()).await;
                    let _ = socket.flush().await;
                }
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{addr}"), counter)
}

fn make_provider(base_url: &str) -> GrokProvider {
    GrokProvider::with_resolver("grok-2", None, &StaticCredential(Some("test-key".into())))
        .unwrap()
        .with_base_url(base_url)
}

fn history() -> Vec<Message> {
    vec![Message::user("say hello")]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
#[ignore]
async fn non_streaming_request_decodes_response() {
    let (base_url, counter) = start_test_server(vec![http_200_json(JSON_SUCCESS_BODY)]).await;
    let provider = make_provider(&base_url);

    let (response, usage) = provider.request(&history(), None).await.unwrap();
    assert_eq!(response.text(), "Hi there");
    assert_eq!(response.finish_reason, Some(FinishReason::Stop));
    assert_eq!(usage.prompt_tokens, 9);
    assert_eq!(usage.total_tokens, 12);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
#[ignore]
async fn streaming_request_aggregates() {
    let (base_url, _) = start_test_server(vec![http_200_sse(SSE_SUCCESS_BODY)]).await;
    let provider = make_provider(&base_url);

    let stream = provider.request_stream(&history(), None).await.unwrap();
    let (response, usage) = stream.finish().await.unwrap();
    assert_eq!(response.text(), "Hello world");
    assert_eq!(response.finish_reason, Some(FinishReason::Stop));
    assert_eq!(usage.completion_tokens, 6);
}

#[tokio::test]
#[ignore]
async fn mid_stream_close_surfaces_interruption_with_partial() {
    let (base_url, _) = start_test_server(vec![http_200_sse(SSE_TRUNCATED_BODY)]).await;
    let provider = make_provider(&base_url);

    let stream = provider.request_stream(&history(), None).await.unwrap();
    match stream.finish().await {
        Err(ApiError::StreamInterrupted { partial }) => assert_eq!(partial, "Hello wor"),
        other => panic!("expected StreamInterrupted, got {other:?}"),
    }
}

#[tokio::test]
#[ignore]
async fn auth_failure_classified_and_not_retried() {
    let (base_url, counter) = start_test_server(vec![http_401(), http_200_json(JSON_SUCCESS_BODY)]).await;
    let provider = make_provider(&base_url);

    let err = provider.request(&history(), None).await.unwrap_err();
    match err {
        ApiError::Auth { message } => assert_eq!(message, "invalid api key"),
        other => panic!("expected Auth, got {other:?}"),
    }
    assert_eq!(counter.load(Ordering::SeqCst), 1, "no retry after 401");
}

#[tokio::test]
#[ignore]
async fn rate_limit_classified_and_not_retried() {
    let (base_url, counter) = start_test_server(vec![http_429(), http_200_json(JSON_SUCCESS_BODY)]).await;
    let provider = make_provider(&base_url);

    let err = provider.request(&history(), None).await.unwrap_err();
    match err {
        ApiError::RateLimited { retry_after_ms } => assert_eq!(retry_after_ms, Some(250)),
        other => panic!("expected RateLimited, got {other:?}"),
    }
    // The adapter surfaces the error; backoff belongs to the caller
    assert_eq!(counter.load(Ordering::SeqCst), 1, "no silent retry after 429");
}

#[tokio::test]
#[ignore]
async fn server_error_classified() {
    let (base_url, _) = start_test_server(vec![http_500()]).await;
    let provider = make_provider(&base_url);

    let err = provider.request(&history(), None).await.unwrap_err();
    match err {
        ApiError::Server { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "internal error");
        }
        other => panic!("expected Server, got {other:?}"),
    }
}

#[tokio::test]
#[ignore]
async fn malformed_success_body_is_decode_error() {
    let (base_url, _) = start_test_server(vec![http_200_json(r#"{"surprise":true}"#)]).await;
    let provider = make_provider(&base_url);

    let err = provider.request(&history(), None).await.unwrap_err();
    match err {
        ApiError::Decode { payload, .. } => assert_eq!(payload, r#"{"surprise":true}"#),
        other => panic!("expected Decode, got {other:?}"),
    }
}

#[tokio::test]
#[ignore]
async fn connection_refused_is_network_error() {
    // Nothing listens on this port
    let provider = make_provider("http://127.0.0.1:1");

    let err = provider.request(&history(), None).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "got {err:?}");
}
