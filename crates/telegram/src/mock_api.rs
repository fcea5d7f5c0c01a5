//! In-process Bot API server for tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    axum::{Json, Router, body::Bytes, extract::State, http::Uri, routing::post},
    serde_json::{Value, json},
    teloxide::Bot,
    tokio::{sync::oneshot, task::JoinHandle},
};

/// A scripted response for the next call of a method.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// 429 with `retry_after` seconds.
    RetryAfter(u32),
    Error(u16, &'static str),
    Result(Value),
}

#[derive(Default)]
struct Recorded {
    /// Raw request bodies keyed by lowercased method name.
    requests: HashMap<String, Vec<String>>,
    scripted: HashMap<String, VecDeque<Reply>>,
}

#[derive(Clone, Default)]
struct ApiState {
    recorded: Arc<Mutex<Recorded>>,
}

pub(crate) struct MockTelegramApi {
    state: ApiState,
    url: reqwest::Url,
    shutdown_tx: oneshot::Sender<()>,
    server: JoinHandle<()>,
}

pub(crate) fn message_json(chat_id: i64, text: &str) -> Value {
    json!({
        "message_id": 1,
        "date": 0,
        "chat": { "id": chat_id, "type": "private", "first_name": "Operator" },
        "text": text,
    })
}

fn me_json() -> Value {
    json!({
        "id": 4242,
        "is_bot": true,
        "first_name": "wa2tg",
        "username": "wa2tg_bot",
        "can_join_groups": false,
        "can_read_all_group_messages": false,
        "supports_inline_queries": false,
        "can_connect_to_business": false,
        "has_main_web_app": false,
    })
}

fn default_result(method: &str) -> Value {
    match method {
        "getme" => me_json(),
        "getupdates" => json!([]),
        "sendmessage" | "sendphoto" => message_json(42, "ok"),
        _ => json!(true),
    }
}

async fn telegram_api_handler(
    State(state): State<ApiState>,
    uri: Uri,
    body: Bytes,
) -> Json<Value> {
    let method = uri
        .path()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    let scripted = {
        let mut recorded = state.recorded.lock().unwrap();
        recorded
            .requests
            .entry(method.clone())
            .or_default()
            .push(String::from_utf8_lossy(&body).to_string());
        recorded
            .scripted
            .get_mut(&method)
            .and_then(VecDeque::pop_front)
    };

    let reply = match scripted {
        Some(reply) => reply,
        None => {
            if method == "getupdates" {
                // stand-in for the long-poll wait
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            Reply::Result(default_result(&method))
        },
    };

    Json(match reply {
        Reply::Result(result) => json!({ "ok": true, "result": result }),
        Reply::RetryAfter(secs) => json!({
            "ok": false,
            "error_code": 429,
            "description": format!("Too Many Requests: retry after {secs}"),
            "parameters": { "retry_after": secs },
        }),
        Reply::Error(code, description) => json!({
            "ok": false,
            "error_code": code,
            "description": description,
        }),
    })
}

impl MockTelegramApi {
    pub async fn start() -> Self {
        let state = ApiState::default();
        let app = Router::new()
            .route("/{*path}", post(telegram_api_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock telegram api");
        });

        let url = reqwest::Url::parse(&format!("http://{addr}/")).expect("parse api url");
        Self {
            state,
            url,
            shutdown_tx,
            server,
        }
    }

    pub fn bot(&self) -> Bot {
        Bot::new("test-token").set_api_url(self.url.clone())
    }

    /// Queue a response for the next call of `method` (lowercase).
    pub fn script(&self, method: &str, reply: Reply) {
        self.state
            .recorded
            .lock()
            .unwrap()
            .scripted
            .entry(method.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn requests_for(&self, method: &str) -> Vec<String> {
        self.state
            .recorded
            .lock()
            .unwrap()
            .requests
            .get(method)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.server.await;
    }
}
