//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// Frame pushed to every connected live client.
#[derive(Debug, Clone)]
pub enum ServerFrame {
    Text(String),
    Close,
}

#[derive(Default)]
struct LiveState {
    accepted: AtomicU32,
    open: AtomicU32,
    paths: Mutex<Vec<String>>,
}

/// In-process live results feed serving `/polls/{id}/results`.
pub struct ResultsServer {
    pub addr: SocketAddr,
    frames: broadcast::Sender<ServerFrame>,
    state: Arc<LiveState>,
}

impl ResultsServer {
    pub async fn start() -> Self {
        let (frames, _) = broadcast::channel(64);
        let state = Arc::new(LiveState::default());

        let app = Router::new()
            .route("/polls/{id}/results", get(results_ws))
            .with_state((frames.clone(), state.clone()));

        let addr = serve(app).await;
        Self { addr, frames, state }
    }

    /// `host:port` to configure the client with.
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    /// Send a vote delta to every connected client.
    pub fn send_delta(&self, option_id: &str, votes: u64) {
        self.send_text(&json!({ "pollOptionId": option_id, "votes": votes }).to_string());
    }

    pub fn send_text(&self, text: &str) {
        let _ = self.frames.send(ServerFrame::Text(text.to_string()));
    }

    /// Close every connected client from the server side.
    pub fn close_all(&self) {
        let _ = self.frames.send(ServerFrame::Close);
    }

    /// Handshakes accepted so far.
    pub fn accepted(&self) -> u32 {
        self.state.accepted.load(Ordering::SeqCst)
    }

    /// Connections currently open.
    pub fn open_connections(&self) -> u32 {
        self.state.open.load(Ordering::SeqCst)
    }

    /// Poll ids requested, in connection order.
    pub fn requested_polls(&self) -> Vec<String> {
        self.state.paths.lock().unwrap().clone()
    }
}

async fn results_ws(
    ws: WebSocketUpgrade,
    Path(poll_id): Path<String>,
    State((frames, state)): State<(broadcast::Sender<ServerFrame>, Arc<LiveState>)>,
) -> Response {
    // Subscribed before the 101 goes out, so the client never sees Open first.
    let rx = frames.subscribe();
    ws.on_upgrade(move |socket| serve_socket(socket, poll_id, rx, state))
}

async fn serve_socket(
    mut socket: WebSocket,
    poll_id: String,
    mut frames: broadcast::Receiver<ServerFrame>,
    state: Arc<LiveState>,
) {
    state.paths.lock().unwrap().push(poll_id);
    state.open.fetch_add(1, Ordering::SeqCst);
    state.accepted.fetch_add(1, Ordering::SeqCst);

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Ok(ServerFrame::Text(text)) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Ok(ServerFrame::Close) => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
                Err(_) => break,
            },
            msg = socket.recv() => match msg {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    state.open.fetch_sub(1, Ordering::SeqCst);
}

/// Votes received by the mock polls API.
pub type VoteLog = Arc<Mutex<Vec<(String, String)>>>;

/// In-process polls API serving one poll.
pub struct ApiServer {
    pub addr: SocketAddr,
    pub votes: VoteLog,
}

impl ApiServer {
    pub async fn start(poll: Value) -> Self {
        let votes: VoteLog = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .route("/polls/{id}", get(get_poll))
            .route("/polls/{id}/votes", post(post_vote))
            .with_state((Arc::new(poll), votes.clone()));

        let addr = serve(app).await;
        Self { addr, votes }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

type ApiState = (Arc<Value>, VoteLog);

async fn get_poll(Path(id): Path<String>, State((poll, _)): State<ApiState>) -> Response {
    if poll["id"] == id.as_str() {
        Json(json!({ "poll": poll.as_ref().clone() })).into_response()
    } else {
        (StatusCode::NOT_FOUND, "poll not found").into_response()
    }
}

async fn post_vote(
    Path(id): Path<String>,
    State((poll, votes)): State<ApiState>,
    Json(body): Json<Value>,
) -> Response {
    if poll["id"] != id.as_str() {
        return (StatusCode::NOT_FOUND, "poll not found").into_response();
    }
    let Some(option_id) = body["pollOptionId"].as_str() else {
        return (StatusCode::BAD_REQUEST, "missing pollOptionId").into_response();
    };

    votes.lock().unwrap().push((id, option_id.to_string()));
    StatusCode::CREATED.into_response()
}

/// Sample poll body in the API's JSON shape.
pub fn sample_poll() -> Value {
    json!({
        "id": "poll-1",
        "title": "Best editor?",
        "createdAt": "2024-03-01T12:00:00Z",
        "options": [
            { "id": "vim", "title": "Vim", "score": 3 },
            { "id": "emacs", "title": "Emacs", "score": 2 }
        ]
    })
}

/// Bind an ephemeral port and serve `app` in the background.
async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A port nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Poll `check` until it holds or `timeout` elapses.
pub async fn wait_until<F>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

/// Run `fut` with a timeout, panicking with `what` if it elapses.
pub async fn within<T>(what: &str, fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {}", what))
}
