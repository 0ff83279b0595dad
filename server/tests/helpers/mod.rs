//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for sending requests through the full axum router with
//! recording fakes in place of the content API and assistant clients.
//!
//! ## Call Log
//!
//! Both fakes append to one shared [`CallLog`], so tests can assert on the
//! exact order of outbound calls across clients.
//!
//! ## Stub Servers
//!
//! Use [`spawn_stub_server()`] to exercise the real reqwest clients against a
//! local axum router standing in for the remote APIs.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{self, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use relay_server::api::{create_router, AppState};
use relay_server::assistant::{AssistantApi, AssistantError, MessageResponse};
use relay_server::config::Config;
use relay_server::graph::{CommentApi, GraphError};
use tokio::task::JoinHandle;
use tower::ServiceExt;

// ============================================================================
// Call log
// ============================================================================

/// An outbound call made by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FetchComment(String),
    CreateSession,
    SendMessage { session_id: String, text: String },
    PostReply { comment_id: String, message: String },
}

/// Shared, ordered record of outbound calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }

    /// Replies posted so far as `(comment_id, message)`.
    pub fn posted(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::PostReply {
                    comment_id,
                    message,
                } => Some((comment_id, message)),
                _ => None,
            })
            .collect()
    }
}

// ============================================================================
// Fakes
// ============================================================================

/// In-memory content API.
#[derive(Default)]
pub struct FakeComments {
    pub log: CallLog,
    /// Comment text by ID; unknown IDs fail with 404.
    pub comments: HashMap<String, String>,
    /// Comment IDs whose reply post fails.
    pub failing_posts: Vec<String>,
}

impl FakeComments {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn with_comment(mut self, id: &str, text: &str) -> Self {
        self.comments.insert(id.to_string(), text.to_string());
        self
    }

    pub fn failing_post(mut self, id: &str) -> Self {
        self.failing_posts.push(id.to_string());
        self
    }
}

#[async_trait]
impl CommentApi for FakeComments {
    async fn fetch_comment(&self, comment_id: &str) -> Result<String, GraphError> {
        self.log.push(Call::FetchComment(comment_id.to_string()));
        self.comments
            .get(comment_id)
            .cloned()
            .ok_or_else(|| GraphError::Api {
                status: 404,
                message: format!("Unsupported get request. Object with ID '{comment_id}'"),
            })
    }

    async fn post_reply(&self, comment_id: &str, message: &str) -> Result<(), GraphError> {
        self.log.push(Call::PostReply {
            comment_id: comment_id.to_string(),
            message: message.to_string(),
        });
        if self.failing_posts.iter().any(|id| id == comment_id) {
            return Err(GraphError::Api {
                status: 500,
                message: "An unexpected error has occurred".into(),
            });
        }
        Ok(())
    }
}

/// How the fake assistant behaves.
#[derive(Debug, Clone)]
pub enum AssistantBehavior {
    /// Answer every message with this raw response body.
    Respond(serde_json::Value),
    /// Fail to create sessions.
    FailSession,
    /// Create sessions but fail to answer.
    FailMessage,
}

/// Scripted assistant.
pub struct FakeAssistant {
    pub log: CallLog,
    pub behavior: AssistantBehavior,
}

impl FakeAssistant {
    pub const fn new(log: CallLog, behavior: AssistantBehavior) -> Self {
        Self { log, behavior }
    }

    /// Assistant that answers every message with `text`.
    pub fn replying(log: CallLog, text: &str) -> Self {
        Self::new(log, AssistantBehavior::Respond(generic_text(text)))
    }
}

#[async_trait]
impl AssistantApi for FakeAssistant {
    async fn create_session(&self) -> Result<String, AssistantError> {
        self.log.push(Call::CreateSession);
        match self.behavior {
            AssistantBehavior::FailSession => Err(AssistantError::Api {
                status: 401,
                message: "Unauthorized".into(),
            }),
            _ => Ok("session-1".into()),
        }
    }

    async fn send_message(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<MessageResponse, AssistantError> {
        self.log.push(Call::SendMessage {
            session_id: session_id.to_string(),
            text: text.to_string(),
        });
        match &self.behavior {
            AssistantBehavior::Respond(body) => Ok(serde_json::from_value(body.clone())?),
            _ => Err(AssistantError::Api {
                status: 404,
                message: "Invalid Session".into(),
            }),
        }
    }
}

/// Assistant response body with a single text item.
pub fn generic_text(text: &str) -> serde_json::Value {
    serde_json::json!({
        "output": {"generic": [{"response_type": "text", "text": text}]}
    })
}

// ============================================================================
// Payloads
// ============================================================================

/// A feed change for a new comment.
pub fn comment_change(comment_id: &str) -> serde_json::Value {
    serde_json::json!({
        "field": "feed",
        "value": {"item": "comment", "verb": "add", "comment_id": comment_id}
    })
}

/// A delivery with one entry holding `changes`.
pub fn delivery(changes: Vec<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({
        "object": "page",
        "entry": [{"id": "page-1", "time": 1_700_000_000, "changes": changes}]
    })
}

// ============================================================================
// Test App
// ============================================================================

/// Router wired to fakes, plus the shared call log.
pub struct TestApp {
    pub router: Router,
    pub log: CallLog,
    pub config: Config,
}

impl TestApp {
    /// Build an app with the given fakes and the default test config.
    pub fn new(comments: FakeComments, assistant: FakeAssistant) -> Self {
        Self::with_config(Config::default_for_test(), comments, assistant)
    }

    /// Build an app with a custom config.
    pub fn with_config(config: Config, comments: FakeComments, assistant: FakeAssistant) -> Self {
        let log = comments.log.clone();
        let state = AppState::new(config.clone(), Arc::new(comments), Arc::new(assistant));
        Self {
            router: create_router(state),
            log,
            config,
        }
    }

    /// App whose assistant answers `reply` to every comment in `comments`.
    pub fn replying(comments: &[(&str, &str)], reply: &str) -> Self {
        let log = CallLog::default();
        let fake = comments
            .iter()
            .fold(FakeComments::new(log.clone()), |fake, (id, text)| {
                fake.with_comment(id, text)
            });
        Self::new(fake, FakeAssistant::replying(log, reply))
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// POST a JSON delivery to `/webhook`.
    pub async fn deliver(&self, payload: &serde_json::Value) -> Response<Body> {
        let req = Self::request(Method::POST, "/webhook")
            .header("Content-Type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        self.oneshot(req).await
    }
}

// ============================================================================
// Stub Server
// ============================================================================

/// A running stub server bound to a random port.
pub struct StubServer {
    /// Server address (127.0.0.1:PORT).
    pub addr: SocketAddr,
    /// Base URL for HTTP requests (e.g., `http://127.0.0.1:12345`).
    pub url: String,
    /// Handle to the server task for cleanup.
    _handle: JoinHandle<()>,
}

/// Spawn `router` as a real HTTP server on a random port.
pub async fn spawn_stub_server(router: Router) -> StubServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub server");
    let addr = listener.local_addr().expect("Failed to get local addr");
    let url = format!("http://{addr}");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Stub server failed");
    });

    StubServer {
        addr,
        url,
        _handle: handle,
    }
}

// ============================================================================
// Body helpers
// ============================================================================

/// Collect a response body as a UTF-8 string.
pub async fn body_to_string(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("Response body is not UTF-8")
}

/// Collect a response body as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Failed to parse response as JSON: {e}\nBody: {preview}")
    })
}
