//! Mock Telegram Bot API server for integration tests.
//!
//! Serves `getMe` and `getUpdates` for a single bot token:
//! - queued updates are returned once their `update_id` reaches the requested offset
//! - offsets received are recorded
//! - failure mode answers every call with HTTP 500

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const TOKEN: &str = "test-token";

#[derive(Default)]
struct ApiState {
    updates: Mutex<Vec<Value>>,
    offsets: Mutex<Vec<Option<i64>>>,
    next_update_id: AtomicI64,
    failing: AtomicBool,
}

/// A mock Bot API server.
pub struct MockBotApi {
    addr: SocketAddr,
    state: Arc<ApiState>,
    handle: JoinHandle<()>,
}

impl MockBotApi {
    /// Start on an available port.
    pub async fn start() -> Self {
        let state = Arc::new(ApiState {
            next_update_id: AtomicI64::new(100),
            ..Default::default()
        });
        let app = Router::new()
            .route(&format!("/bot{TOKEN}/getMe"), post(get_me))
            .route(&format!("/bot{TOKEN}/getUpdates"), post(get_updates))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Queue a channel post.
    pub fn post_channel_message(&self, chat_id: i64, username: Option<&str>, text: &str) {
        let update_id = self.state.next_update_id.fetch_add(1, Ordering::SeqCst);
        let mut chat = json!({"id": chat_id, "type": "channel"});
        if let Some(username) = username {
            chat["username"] = json!(username);
        }
        self.state.updates.lock().push(json!({
            "update_id": update_id,
            "channel_post": {
                "message_id": update_id,
                "date": 1700000000,
                "chat": chat,
                "text": text,
            }
        }));
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    /// Offsets passed to `getUpdates` so far.
    pub fn offsets(&self) -> Vec<Option<i64>> {
        self.state.offsets.lock().clone()
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}

fn failure() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"ok": false, "error_code": 500, "description": "mock failure"})),
    )
        .into_response()
}

async fn get_me(State(state): State<Arc<ApiState>>) -> Response {
    if state.failing.load(Ordering::SeqCst) {
        return failure();
    }
    Json(json!({"ok": true, "result": {"id": 1, "username": "mock_bot"}})).into_response()
}

async fn get_updates(State(state): State<Arc<ApiState>>, Json(body): Json<Value>) -> Response {
    if state.failing.load(Ordering::SeqCst) {
        return failure();
    }
    let offset = body.get("offset").and_then(Value::as_i64);
    state.offsets.lock().push(offset);

    let pending: Vec<Value> = state
        .updates
        .lock()
        .iter()
        .filter(|u| offset.map_or(true, |o| u["update_id"].as_i64().unwrap_or(0) >= o))
        .cloned()
        .collect();
    if pending.is_empty() {
        // short long-poll
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    Json(json!({"ok": true, "result": pending})).into_response()
}
