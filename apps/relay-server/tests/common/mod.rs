use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use relay_server::config::Config;
use relay_server::AppState;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default configuration for tests.
pub fn test_config() -> Config {
    Config {
        welcome_message: "Welcome to the test relay".to_string(),
        ..Config::default()
    }
}

/// Build a test AppState with default configuration.
pub fn test_state() -> AppState {
    AppState::new(test_config())
}

/// Build the full application router wired to the test state.
pub fn test_app() -> (Router, AppState) {
    let state = test_state();
    let app = relay_server::routes::router().with_state(state.clone());
    (app, state)
}

/// Start an actual TCP server for WebSocket testing. The server runs in the
/// background.
pub async fn start_ws_server() -> (SocketAddr, AppState) {
    start_ws_server_with(test_config()).await
}

/// Like [`start_ws_server`], with a custom configuration.
pub async fn start_ws_server_with(config: Config) -> (SocketAddr, AppState) {
    let state = AppState::new(config);
    let app = relay_server::routes::router().with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

/// Open a WebSocket connection to the relay.
pub async fn connect(addr: SocketAddr) -> WsClient {
    let url = format!("ws://{addr}/");
    let (ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");
    ws
}

/// Read the next JSON frame, skipping control frames.
pub async fn next_json(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let msg = time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for frame")
            .expect("stream ended")
            .expect("ws read error");

        match msg {
            Message::Text(text) => return serde_json::from_str(&text).expect("parse frame"),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("Expected text frame, got: {other:?}"),
        }
    }
}

/// Read frames until one of the given type arrives.
pub async fn next_of_type(ws: &mut WsClient, kind: &str) -> serde_json::Value {
    loop {
        let frame = next_json(ws).await;
        if frame["type"] == kind {
            return frame;
        }
    }
}

/// Assert that no frame arrives within a short window.
pub async fn assert_silent(ws: &mut WsClient) {
    if let Ok(Some(Ok(msg))) = time::timeout(Duration::from_millis(200), ws.next()).await {
        panic!("Expected no frame, got: {msg:?}");
    }
}

pub async fn send_json(ws: &mut WsClient, value: serde_json::Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("send frame");
}

/// Connect and consume the greeting (`system` + `registerPending`).
pub async fn connect_greeted(addr: SocketAddr) -> WsClient {
    let mut ws = connect(addr).await;
    let welcome = next_json(&mut ws).await;
    assert_eq!(welcome["type"], "system");
    let pending = next_json(&mut ws).await;
    assert_eq!(pending["type"], "registerPending");
    ws
}

/// Connect, register under `name`, and return the client with its id.
/// Consumes the `registerAck` and the caller's own `userlist`.
pub async fn connect_registered(addr: SocketAddr, name: &str) -> (WsClient, String) {
    let mut ws = connect_greeted(addr).await;
    send_json(&mut ws, serde_json::json!({"type": "register", "username": name})).await;

    let ack = next_json(&mut ws).await;
    assert_eq!(ack["type"], "registerAck");
    let id = ack["clientId"].as_str().expect("clientId").to_string();
    let list = next_json(&mut ws).await;
    assert_eq!(list["type"], "userlist");
    (ws, id)
}

/// Ids in a `userlist` frame, in order.
pub fn user_ids(frame: &serde_json::Value) -> Vec<String> {
    frame["users"]
        .as_array()
        .expect("users array")
        .iter()
        .map(|u| u["clientId"].as_str().unwrap().to_string())
        .collect()
}
