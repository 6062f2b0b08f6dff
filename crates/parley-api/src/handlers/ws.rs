//! WebSocket upgrade handler.
//!
//! The socket is split in two tasks. The forwarder drains the connection's
//! outbound queue onto the wire and sends a close frame once the sink is
//! closed. The inbound loop only watches for the peer going away, since
//! clients never send events over the socket.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use parley_realtime::connection::{ConnectionSink, Handshake};

use crate::dto::request::WsQuery;
use crate::state::AppState;

/// GET /ws?token={token}
///
/// Authentication happens after the upgrade so a rejected client still
/// receives the `exception` frame.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let handshake = Handshake {
        auth_token: query.token,
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    ws.on_upgrade(move |socket| handle_socket(state, handshake, socket))
}

async fn handle_socket(state: AppState, handshake: Handshake, socket: WebSocket) {
    let (ws_tx, mut ws_rx) = socket.split();
    let (sink, outbound_rx) = ConnectionSink::channel(state.realtime.channel_buffer_size());

    let forwarder = tokio::spawn(forward_outbound(ws_tx, outbound_rx, sink.clone()));

    let handle = match state.gateway.connect(&handshake, sink.clone()).await {
        Ok(handle) => handle,
        Err(_) => {
            let _ = forwarder.await;
            return;
        }
    };

    let mut shutdown = state.realtime.shutdown_receiver();

    loop {
        tokio::select! {
            inbound = ws_rx.next() => match inbound {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(conn_id = %handle.id, error = %e, "WebSocket read error");
                    break;
                }
            },
            _ = sink.closed() => break,
            _ = shutdown.recv() => break,
        }
    }

    // Detaching closes the sink, which lets the forwarder finish.
    state.gateway.disconnect(&handle).await;
    let _ = forwarder.await;

    info!(conn_id = %handle.id, user_id = %handle.user_id, "WebSocket connection closed");
}

/// Write queued frames until the sink closes, then flush what is left and say goodbye.
async fn forward_outbound(
    mut ws_tx: futures::stream::SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<String>,
    sink: ConnectionSink,
) {
    loop {
        tokio::select! {
            biased;
            frame = outbound_rx.recv() => match frame {
                Some(frame) => {
                    if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                        return;
                    }
                }
                None => break,
            },
            _ = sink.closed() => break,
        }
    }

    while let Ok(frame) = outbound_rx.try_recv() {
        if ws_tx.send(Message::Text(frame.into())).await.is_err() {
            return;
        }
    }
    let _ = ws_tx.send(Message::Close(None)).await;
}
