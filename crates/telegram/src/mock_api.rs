//! In-process stand-in for the Telegram Bot API used by the transport tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use {
    axum::{Json, Router, body::Bytes, extract::State, http::Uri, routing::post},
    serde_json::{Value, json},
    tokio::{sync::oneshot, task::JoinHandle},
};

/// One request seen by the mock, keyed by Bot API method name.
#[derive(Debug, Clone)]
pub(crate) struct CapturedRequest {
    pub method: String,
    pub body: String,
}

impl CapturedRequest {
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

#[derive(Clone, Default)]
pub(crate) struct MockTelegramApi {
    pub requests: Arc<Mutex<Vec<CapturedRequest>>>,
    /// Update batches handed out by successive `getUpdates` calls.
    pub updates: Arc<Mutex<VecDeque<Vec<Value>>>>,
    /// Number of upcoming send requests answered with a 429 retry-after.
    pub rate_limited: Arc<AtomicUsize>,
    pub reject_token: Arc<AtomicBool>,
    pub reject_uploads: Arc<AtomicBool>,
}

impl MockTelegramApi {
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.method).collect()
    }

    pub fn push_updates(&self, batch: Vec<Value>) {
        self.updates
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(batch);
    }
}

fn message_result(chat_id: i64) -> Value {
    json!({
        "ok": true,
        "result": {
            "message_id": 1,
            "date": 0,
            "chat": { "id": chat_id, "type": "private", "first_name": "Alice" },
            "text": "ok"
        }
    })
}

async fn telegram_api_handler(
    State(state): State<MockTelegramApi>,
    uri: Uri,
    body: Bytes,
) -> Json<Value> {
    let method = uri
        .path()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    state
        .requests
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .push(CapturedRequest {
            method: method.clone(),
            body: String::from_utf8_lossy(&body).to_string(),
        });

    let response = match method.as_str() {
        "GetMe" if state.reject_token.load(Ordering::SeqCst) => json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        }),
        "GetMe" => json!({
            "ok": true,
            "result": {
                "id": 777,
                "is_bot": true,
                "first_name": "Reelbot",
                "username": "reel_bot",
                "can_join_groups": true,
                "can_read_all_group_messages": false,
                "supports_inline_queries": false,
                "can_connect_to_business": false,
                "has_main_web_app": false
            }
        }),
        "GetUpdates" => {
            let batch = state
                .updates
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front();
            match batch {
                Some(updates) => json!({ "ok": true, "result": updates }),
                None => {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    json!({ "ok": true, "result": [] })
                },
            }
        },
        "SendMessage" | "SendVideo" | "SendAudio" => {
            let limited = state
                .rate_limited
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if limited {
                json!({
                    "ok": false,
                    "error_code": 429,
                    "description": "Too Many Requests: retry after 1",
                    "parameters": { "retry_after": 1 }
                })
            } else if method != "SendMessage" && state.reject_uploads.load(Ordering::SeqCst) {
                json!({
                    "ok": false,
                    "error_code": 413,
                    "description": "Request Entity Too Large"
                })
            } else {
                message_result(42)
            }
        },
        _ => json!({ "ok": true, "result": true }),
    };
    Json(response)
}

/// A running mock server; dropped servers keep running until `shutdown`.
pub(crate) struct MockServer {
    pub api: MockTelegramApi,
    pub url: reqwest::Url,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub async fn start() -> Self {
        let api = MockTelegramApi::default();
        let app = Router::new()
            .route("/{*path}", post(telegram_api_handler))
            .with_state(api.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock telegram api");
        });

        let url = reqwest::Url::parse(&format!("http://{addr}/")).expect("parse api url");
        Self {
            api,
            url,
            shutdown,
            handle,
        }
    }

    pub fn bot(&self) -> teloxide::Bot {
        teloxide::Bot::new("test-token").set_api_url(self.url.clone())
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}
