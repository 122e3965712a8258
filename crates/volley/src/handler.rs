//! Per-connection handler: the gateway between one socket and the rooms.
//!
//! Each connection gets a bounded outbound queue that rooms push into, drained
//! by a writer task. The reading side decodes client intents and hands
//! them to the [`RoomManager`](volley_room::RoomManager). Both reply
//! paths (room broadcasts and direct rejections) go through the same
//! queue, so a client sees them in the order they were produced.

use std::sync::Arc;

use tokio::sync::mpsc;
use volley_protocol::{ClientMessage, Codec, ConnectionId, ProtocolError, ServerMessage};
use volley_room::{PlayerSender, RoomError};
use volley_transport::{Connection, WebSocketConnection};

use crate::VolleyError;
use crate::server::ServerState;

/// Runs room cleanup when the connection task ends, however it ends.
///
/// `Drop` can't be async, so cleanup is spawned onto the runtime.
struct DisconnectGuard<C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for DisconnectGuard<C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let destroyed = state.rooms.on_disconnect(conn_id).await;
            tracing::debug!(%conn_id, destroyed = destroyed.len(), "connection cleaned up");
        });
    }
}

pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), VolleyError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let conn = Arc::new(conn);
    let (tx, rx) = PlayerSender::channel(state.outbound_queue_size);
    let writer = tokio::spawn(write_loop(Arc::clone(&conn), Arc::clone(&state), rx));
    let _guard = DisconnectGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    let result = read_loop(&conn, &state, &tx).await;
    writer.abort();
    result
}

async fn read_loop<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    tx: &PlayerSender,
) -> Result<(), VolleyError> {
    let conn_id = conn.id();
    loop {
        let Some(data) = conn.recv().await? else {
            tracing::info!(%conn_id, "connection closed cleanly");
            return Ok(());
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode client message");
                tx.send(ServerMessage::Error {
                    message: e.to_string(),
                });
                continue;
            }
        };

        dispatch(conn_id, msg, state, tx).await;
    }
}

async fn dispatch<C: Codec>(
    conn_id: ConnectionId,
    msg: ClientMessage,
    state: &ServerState<C>,
    tx: &PlayerSender,
) {
    match msg {
        ClientMessage::CreateRoom { ruleset } => {
            let code = state.rooms.create_room(conn_id, tx.clone(), ruleset).await;
            tracing::debug!(%conn_id, room = %code, "created room");
        }

        ClientMessage::JoinRoom { room_code } => {
            let result = state
                .rooms
                .join_room(conn_id, tx.clone(), &room_code)
                .await;
            match result {
                Ok(role) => {
                    tracing::debug!(%conn_id, room = %room_code, %role, "joined room");
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "join rejected");
                    tx.send(rejection(&e));
                }
            }
        }

        ClientMessage::PaddleMove { room_code, role, y } => {
            state.rooms.apply_paddle_input(&room_code, role, y).await;
        }

        ClientMessage::EndGame { room_code } => {
            let ended = state.rooms.end_room(&room_code).await;
            if !ended {
                tracing::debug!(%conn_id, room = %room_code, "end for unknown room");
            }
        }
    }
}

/// What a client is told when its join fails.
///
/// A room whose actor stopped between lookup and join is gone as far as
/// the client can tell.
fn rejection(err: &RoomError) -> ServerMessage {
    match err {
        RoomError::RoomFull(_) => ServerMessage::RoomFull,
        RoomError::NotFound(_) | RoomError::Unavailable(_) => ServerMessage::RoomNotFound,
    }
}

async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut rx: mpsc::Receiver<ServerMessage>,
) {
    while let Some(msg) = rx.recv().await {
        if let Err(e) = send_message(&conn, &state.codec, &msg).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, stopping writer");
            break;
        }
    }
}

async fn send_message<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    msg: &ServerMessage,
) -> Result<(), VolleyError> {
    let bytes = codec.encode(msg)?;
    if C::TEXT {
        let text = String::from_utf8(bytes)
            .map_err(|e| ProtocolError::InvalidMessage(e.to_string()))?;
        conn.send_text(&text).await?;
    } else {
        conn.send(&bytes).await?;
    }
    Ok(())
}
