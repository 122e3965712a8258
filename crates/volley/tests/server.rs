//! End-to-end tests: a real server on an OS-assigned port, driven by
//! plain WebSocket clients speaking the JSON protocol.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;
use volley::prelude::*;

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

// =========================================================================
// Helpers
// =========================================================================

/// Starts a server in the background and returns its address.
async fn start_server() -> String {
    let server = VolleyServer::builder()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should bind");
    let addr = server.local_addr().expect("bound address").to_string();
    tokio::spawn(server.run());
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("client should connect");
    ws
}

async fn send(ws: &mut ClientWs, value: Value) {
    ws.send(Message::text(value.to_string()))
        .await
        .expect("send should succeed");
}

/// Next JSON message from the server, failing after five seconds.
async fn recv(ws: &mut ClientWs) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for the server")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).expect("server sent invalid JSON");
        }
    }
}

/// Next message of type `ty`, skipping the steady stream of snapshots.
async fn recv_type(ws: &mut ClientWs, ty: &str) -> Value {
    for _ in 0..500 {
        let msg = recv(ws).await;
        if msg["type"] == ty {
            return msg;
        }
        assert_eq!(msg["type"], "gameState", "unexpected message {msg}");
    }
    panic!("no {ty} message arrived");
}

/// Creates a room from `ws` and returns its code.
async fn create_room(ws: &mut ClientWs, ruleset: &str) -> String {
    send(ws, json!({"type": "createRoom", "ruleset": ruleset})).await;
    let msg = recv(ws).await;
    assert_eq!(msg["type"], "roomCreated");
    msg["roomCode"].as_str().expect("roomCode").to_string()
}

/// Two clients in a started match.
async fn matched(addr: &str) -> (ClientWs, ClientWs, String) {
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    let code = create_room(&mut a, "normal").await;

    send(&mut b, json!({"type": "joinRoom", "roomCode": code})).await;
    assert_eq!(
        recv(&mut b).await,
        json!({"type": "roomJoined", "roomCode": code, "role": "playerB"})
    );
    for ws in [&mut a, &mut b] {
        assert_eq!(
            recv(ws).await,
            json!({"type": "startGame", "ruleset": "normal"})
        );
    }
    (a, b, code)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_create_room_returns_code() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    let code = create_room(&mut ws, "special").await;
    assert!(RoomCode::new(code.as_str()).is_well_formed(), "bad code {code}");
}

#[tokio::test]
async fn test_create_room_without_ruleset_is_normal() {
    let addr = start_server().await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;

    send(&mut a, json!({"type": "createRoom"})).await;
    let code = recv(&mut a).await["roomCode"].clone();
    send(&mut b, json!({"type": "joinRoom", "roomCode": code})).await;

    assert_eq!(recv(&mut a).await["ruleset"], "normal");
}

#[tokio::test]
async fn test_join_unknown_room() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(&mut ws, json!({"type": "joinRoom", "roomCode": "ZZZZZ"})).await;
    assert_eq!(recv(&mut ws).await, json!({"type": "roomNotFound"}));
}

#[tokio::test]
async fn test_match_broadcasts_snapshots_to_both() {
    let addr = start_server().await;
    let (mut a, mut b, _code) = matched(&addr).await;

    for ws in [&mut a, &mut b] {
        let msg = recv(ws).await;
        assert_eq!(msg["type"], "gameState");
        let state = &msg["state"];
        assert_eq!(state["gameType"], "normal");
        assert_eq!(state["ball"]["x"], 405.0);
        assert_eq!(state["ball"]["y"], 205.0);
        assert_eq!(state["scoreA"], 0);
        assert_eq!(state["scoreB"], 0);
    }
}

#[tokio::test]
async fn test_third_player_gets_room_full() {
    let addr = start_server().await;
    let (_a, _b, code) = matched(&addr).await;
    let mut c = connect(&addr).await;

    send(&mut c, json!({"type": "joinRoom", "roomCode": code})).await;
    assert_eq!(recv(&mut c).await, json!({"type": "roomFull"}));
}

#[tokio::test]
async fn test_paddle_move_is_clamped_and_seen_by_opponent() {
    let addr = start_server().await;
    let (mut a, mut b, code) = matched(&addr).await;

    send(
        &mut b,
        json!({"type": "paddleMove", "roomCode": code, "role": "playerB", "y": 1000}),
    )
    .await;

    let mut seen = false;
    for _ in 0..120 {
        let msg = recv(&mut a).await;
        if msg["state"]["playerB"]["y"] == 300.0 {
            seen = true;
            break;
        }
    }
    assert!(seen, "opponent never saw the paddle move");
}

#[tokio::test]
async fn test_end_game_notifies_both_players() {
    let addr = start_server().await;
    let (mut a, mut b, code) = matched(&addr).await;

    send(&mut a, json!({"type": "endGame", "roomCode": code})).await;
    recv_type(&mut a, "gameEnded").await;
    recv_type(&mut b, "gameEnded").await;

    // The code is released.
    let mut c = connect(&addr).await;
    send(&mut c, json!({"type": "joinRoom", "roomCode": code})).await;
    assert_eq!(recv(&mut c).await, json!({"type": "roomNotFound"}));
}

#[tokio::test]
async fn test_invalid_message_gets_error_and_connection_survives() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::text("not json".to_string())).await.unwrap();
    let msg = recv(&mut ws).await;
    assert_eq!(msg["type"], "error");
    assert!(msg["message"].as_str().is_some_and(|m| !m.is_empty()));

    send(&mut ws, json!({"type": "dance"})).await;
    assert_eq!(recv(&mut ws).await["type"], "error");

    // Still usable.
    create_room(&mut ws, "normal").await;
}

#[tokio::test]
async fn test_room_is_released_after_both_players_disconnect() {
    let addr = start_server().await;
    let (a, b, code) = matched(&addr).await;

    drop(a);
    drop(b);
    // Cleanup runs asynchronously once each socket is seen closing.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let mut c = connect(&addr).await;
    send(&mut c, json!({"type": "joinRoom", "roomCode": code})).await;
    assert_eq!(recv(&mut c).await, json!({"type": "roomNotFound"}));
}

#[tokio::test]
async fn test_leaver_slot_can_be_refilled() {
    let addr = start_server().await;
    let (mut a, b, code) = matched(&addr).await;

    drop(b);
    tokio::time::sleep(Duration::from_millis(300)).await;

    let mut c = connect(&addr).await;
    send(&mut c, json!({"type": "joinRoom", "roomCode": code})).await;
    assert_eq!(
        recv(&mut c).await,
        json!({"type": "roomJoined", "roomCode": code, "role": "playerB"})
    );
    recv_type(&mut a, "startGame").await;
}

#[tokio::test]
async fn test_run_until_stops_accepting() {
    let server = VolleyServer::builder()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should bind");
    let addr = server.local_addr().expect("bound address").to_string();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let task = tokio::spawn(server.run_until(async {
        let _ = stop_rx.await;
    }));

    let mut ws = connect(&addr).await;
    create_room(&mut ws, "normal").await;

    stop_tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("server should stop")
        .expect("server task panicked");
    assert!(result.is_ok());

    let refused = tokio_tungstenite::connect_async(format!("ws://{addr}")).await;
    assert!(refused.is_err(), "listener should be closed");
}
