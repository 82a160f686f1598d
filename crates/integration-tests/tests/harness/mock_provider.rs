//! Mock provider server for integration tests
//!
//! Serves one scripted reply to every POST and records what it received, so
//! tests can assert on both the parsed result and the outgoing request.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// What the mock answers with
#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with a JSON body
    Json(Value),
    /// 200 `text/event-stream`, one `data:` event per entry
    Sse(Vec<String>),
    /// Arbitrary status with a raw body
    Status(u16, String),
    /// Wait, then send the inner reply
    Delayed(Duration, Box<Self>),
}

/// Request as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Path and query
    pub uri: String,
    /// Request headers
    pub headers: HeaderMap,
    /// Parsed JSON body
    pub body: Value,
}

/// Mock provider backend
pub struct MockProvider {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    reply: Reply,
    request_count: AtomicU32,
    last_request: Mutex<Option<RecordedRequest>>,
}

impl MockProvider {
    /// Start the mock server, returning immediately
    pub async fn start(reply: Reply) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            reply,
            request_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        });

        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for an OpenAI-compatible provider
    pub fn openai_base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Base URL for a Gemini provider
    pub fn gemini_base_url(&self) -> String {
        format!("http://{}/v1beta", self.addr)
    }

    /// Number of requests received
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::Relaxed)
    }

    /// Most recent request
    pub fn last_request(&self) -> RecordedRequest {
        self.state
            .last_request
            .lock()
            .unwrap()
            .clone()
            .expect("mock received no request")
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle(State(state): State<Arc<MockState>>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    *state.last_request.lock().unwrap() = Some(RecordedRequest {
        uri: uri.to_string(),
        headers,
        body,
    });

    let mut reply = state.reply.clone();
    while let Reply::Delayed(delay, inner) = reply {
        tokio::time::sleep(delay).await;
        reply = *inner;
    }

    match reply {
        Reply::Json(value) => (StatusCode::OK, axum::Json(value)).into_response(),
        Reply::Sse(events) => {
            let body: String = events.iter().map(|data| format!("data: {data}\n\n")).collect();
            (StatusCode::OK, [(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
        }
        Reply::Status(status, body) => {
            let status = StatusCode::from_u16(status).unwrap();
            (status, body).into_response()
        }
        Reply::Delayed(..) => unreachable!("delays are unwrapped above"),
    }
}
