//! WebSocket upgrade handler and per-connection tasks.
//!
//! Each socket gets a reader loop (this task) and a spawned writer that
//! drains the connection's outbound queue. A stalled socket write only ever
//! blocks the writer, so a server-side close always reaches
//! [`Gateway::disconnect`](super::Gateway::disconnect).

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use relay_common::{ConnectionId, PrefixedId};
use tokio::sync::mpsc;
use tokio::time;

use crate::AppState;

use super::connection::Connection;

/// Close codes (4000-range for application-level).
const CLOSE_REJECTED: u16 = 4000;
const CLOSE_BY_SERVER: u16 = 4008;

/// How long the writer may take to flush its close frame after the session
/// ended before it is aborted.
const WRITER_GRACE_SECS: u64 = 2;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(ws_upgrade))
        .route("/ws", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: AppState) {
    let (mut ws_tx, ws_rx) = socket.split();

    let id = ConnectionId::generate();
    let (connection, outbound_rx) = Connection::new(id.clone(), state.config.send_buffer);

    if state.gateway.accept(connection.clone()).is_err() {
        let _ = send_close(&mut ws_tx, CLOSE_REJECTED, "Connection rejected").await;
        return;
    }

    let mut writer = tokio::spawn(write_loop(connection.clone(), ws_tx, outbound_rx));

    read_loop(&state, &connection, ws_rx).await;

    state.gateway.disconnect(&id);

    if time::timeout(Duration::from_secs(WRITER_GRACE_SECS), &mut writer)
        .await
        .is_err()
    {
        tracing::warn!(connection_id = %id, "writer stalled, aborting");
        writer.abort();
    }
}

/// Feed client frames to the gateway until the client goes away or the
/// connection is closed from our side.
async fn read_loop(state: &AppState, connection: &Connection, mut ws_rx: SplitStream<WebSocket>) {
    let id = connection.id();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        state.gateway.handle_frame(id, text.as_str());
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        let text = String::from_utf8_lossy(&bytes);
                        state.gateway.handle_frame(id, &text);
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(?e, connection_id = %id, "ws read error");
                        break;
                    }
                }
            }

            // Slow reader, failed write, or shutdown.
            _ = connection.closed() => break,
        }
    }
}

/// Flush queued frames to the socket. Once the connection is closed the
/// client is sent a close frame and the writer exits.
async fn write_loop(
    connection: Connection,
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<Arc<str>>,
) {
    let id = connection.id().clone();

    loop {
        tokio::select! {
            biased;

            _ = connection.closed() => {
                let _ = send_close(&mut ws_tx, CLOSE_BY_SERVER, "Closed by server").await;
                break;
            }

            frame = outbound_rx.recv() => {
                let Some(frame) = frame else { break };
                if let Err(e) = ws_tx.send(Message::Text(frame.to_string().into())).await {
                    tracing::warn!(?e, connection_id = %id, "ws write failed");
                    break;
                }
            }
        }
    }

    // Wakes the reader if the socket failed underneath it.
    connection.close();
}

/// Send a WebSocket close frame with a code and reason.
async fn send_close(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    code: u16,
    reason: &str,
) -> Result<(), axum::Error> {
    let close_msg = Message::Close(Some(CloseFrame {
        code,
        reason: reason.to_string().into(),
    }));
    ws_tx.send(close_msg).await
}
