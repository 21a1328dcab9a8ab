//! Integration tests for the live connection: auth, join/snapshot, presence
//! fan-out, comment validation and leave broadcasts.

use futures_util::{SinkExt, StreamExt};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use draftly_live::build_app;
use draftly_live::config::{self, Config};
use draftly_live::ws::state::GatewayState;
use draftly_live::ws::userctx;

const TEST_SECRET: &str = "it-test-secret";

type WsClient = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Install the shared test configuration. First caller wins; every test uses
/// the same secret and the same fast heartbeat so that is fine. Clients that
/// poll their stream answer pings automatically and are unaffected; only a
/// client that stops polling goes silent.
fn init_test_env() {
    config::init_config(Config {
        cloud_auth_jwt_secret: Some(TEST_SECRET.to_string()),
        heartbeat_secs: 1,
        pong_timeout_secs: 2,
        ..Config::default()
    });
    userctx::init_user_ctx_cache();
}

/// Mint a user JWT the way the app service issues them.
fn user_token(uid: &str, name: &str) -> String {
    let exp = chrono::Utc::now().timestamp() as usize + 3600;
    let claims = json!({ "sub": uid, "name": name, "type": "user", "exp": exp });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("Failed to mint test JWT")
}

/// Start the server on an ephemeral port and return its address.
async fn start_test_server() -> SocketAddr {
    init_test_env();
    let state = GatewayState::new();
    let app = build_app(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });
    addr
}

async fn connect(addr: SocketAddr, token: &str) -> WsClient {
    let url = format!("ws://{}/ws?token={}", addr, token);
    let (client, _response) = tokio_tungstenite::connect_async(url)
        .await
        .expect("Failed to connect");
    client
}

async fn send_json(client: &mut WsClient, payload: Value) {
    client
        .send(Message::text(payload.to_string()))
        .await
        .expect("Failed to send frame");
}

/// Next JSON frame within two seconds, skipping protocol-level frames.
async fn next_json(client: &mut WsClient) -> Value {
    next_json_within(client, Duration::from_secs(2)).await
}

async fn next_json_within(client: &mut WsClient, deadline: Duration) -> Value {
    loop {
        let frame = tokio::time::timeout(deadline, client.next())
            .await
            .expect("Timed out waiting for a frame")
            .expect("Stream ended")
            .expect("Receive error");
        match frame {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {:?}", other),
        }
    }
}

/// Assert no JSON frame arrives within the given window.
async fn expect_silence(client: &mut WsClient, window: Duration) {
    loop {
        match tokio::time::timeout(window, client.next()).await {
            Err(_) => return, // timed out: silence, as expected
            Ok(Some(Ok(Message::Ping(_)))) | Ok(Some(Ok(Message::Pong(_)))) => continue,
            Ok(other) => panic!("expected silence, got: {:?}", other),
        }
    }
}

#[tokio::test]
async fn invalid_token_gets_auth_error() {
    let addr = start_test_server().await;

    let mut client = connect(addr, "not-a-jwt").await;
    let msg = next_json(&mut client).await;
    assert_eq!(msg["type"], "auth-error");
    assert!(msg["reason"].as_str().unwrap().contains("JWT"));
}

#[tokio::test]
async fn join_snapshot_presence_and_leave_flow() {
    let addr = start_test_server().await;

    // A joins an empty room and sees a snapshot with only itself.
    let mut alice = connect(addr, &user_token("u-alice", "Alice")).await;
    send_json(&mut alice, json!({ "type": "join-room", "roomKey": "proj-1" })).await;
    let snapshot = next_json(&mut alice).await;
    assert_eq!(snapshot["type"], "room-snapshot");
    assert_eq!(snapshot["members"].as_array().unwrap().len(), 1);
    assert_eq!(snapshot["members"][0]["userId"], "u-alice");

    // B joins: B's snapshot has both members, A hears user-joined.
    let mut bob = connect(addr, &user_token("u-bob", "Bob")).await;
    send_json(&mut bob, json!({ "type": "join-room", "roomKey": "proj-1" })).await;
    let snapshot = next_json(&mut bob).await;
    assert_eq!(snapshot["type"], "room-snapshot");
    let ids: Vec<&str> = snapshot["members"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["userId"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["u-alice", "u-bob"]);

    let joined = next_json(&mut alice).await;
    assert_eq!(joined["type"], "user-joined");
    assert_eq!(joined["userId"], "u-bob");
    assert_eq!(joined["displayName"], "Bob");

    // A moves its cursor; B receives the presence update, A hears nothing.
    send_json(
        &mut alice,
        json!({ "type": "cursor-move", "roomKey": "proj-1", "cursor": { "x": 10.0, "y": 20.0 } }),
    )
    .await;
    let update = next_json(&mut bob).await;
    assert_eq!(update["type"], "presence-update");
    assert_eq!(update["userId"], "u-alice");
    assert_eq!(update["partialState"]["cursor"]["x"], 10.0);
    assert_eq!(update["partialState"]["cursor"]["y"], 20.0);

    // A disconnects; B hears user-left.
    alice.close(None).await.unwrap();
    let left = next_json(&mut bob).await;
    assert_eq!(left["type"], "user-left");
    assert_eq!(left["userId"], "u-alice");
}

#[tokio::test]
async fn comments_fan_out_and_empty_ones_are_rejected() {
    let addr = start_test_server().await;

    let mut alice = connect(addr, &user_token("u-alice", "Alice")).await;
    let mut bob = connect(addr, &user_token("u-bob", "Bob")).await;
    send_json(&mut alice, json!({ "type": "join-room", "roomKey": "proj-2" })).await;
    let _ = next_json(&mut alice).await; // snapshot
    send_json(&mut bob, json!({ "type": "join-room", "roomKey": "proj-2" })).await;
    let _ = next_json(&mut bob).await; // snapshot
    let _ = next_json(&mut alice).await; // user-joined for bob

    // A valid comment reaches both members with the same id and timestamp.
    send_json(
        &mut alice,
        json!({ "type": "submit-comment", "roomKey": "proj-2", "content": "Looks good" }),
    )
    .await;
    let to_alice = next_json(&mut alice).await;
    let to_bob = next_json(&mut bob).await;
    assert_eq!(to_alice["type"], "comment-broadcast");
    assert_eq!(to_alice["authorName"], "Alice");
    assert_eq!(to_alice["content"], "Looks good");
    assert_eq!(to_alice["id"], to_bob["id"]);
    assert_eq!(to_alice["createdAt"], to_bob["createdAt"]);

    // An empty comment bounces back to the author only.
    send_json(
        &mut bob,
        json!({ "type": "submit-comment", "roomKey": "proj-2", "content": "   " }),
    )
    .await;
    let rejected = next_json(&mut bob).await;
    assert_eq!(rejected["type"], "invalid-input");
    expect_silence(&mut alice, Duration::from_millis(300)).await;
}

#[tokio::test]
async fn silent_peer_is_reaped_by_heartbeat_timeout() {
    let addr = start_test_server().await;

    let mut alice = connect(addr, &user_token("u-alice", "Alice")).await;
    let mut bob = connect(addr, &user_token("u-bob", "Bob")).await;
    send_json(&mut alice, json!({ "type": "join-room", "roomKey": "proj-4" })).await;
    let _ = next_json(&mut alice).await; // snapshot
    send_json(&mut bob, json!({ "type": "join-room", "roomKey": "proj-4" })).await;
    let _ = next_json(&mut bob).await; // snapshot
    let _ = next_json(&mut alice).await; // user-joined for bob

    // Alice goes silent: the connection stays open but her stream is never
    // polled again, so no pong ever answers the server's pings. Dropping the
    // client would close the socket and take the ordinary disconnect path
    // instead.
    let _alice_unpolled = alice;

    // Bob, who keeps polling (and thus ponging), sees the departure within
    // the heartbeat window: one ping interval plus the pong deadline.
    let left = next_json_within(&mut bob, Duration::from_secs(8)).await;
    assert_eq!(left["type"], "user-left");
    assert_eq!(left["userId"], "u-alice");
}

#[tokio::test]
async fn explicit_leave_then_rejoin_reconverges() {
    let addr = start_test_server().await;

    let mut alice = connect(addr, &user_token("u-alice", "Alice")).await;
    let mut bob = connect(addr, &user_token("u-bob", "Bob")).await;
    send_json(&mut alice, json!({ "type": "join-room", "roomKey": "proj-3" })).await;
    let _ = next_json(&mut alice).await;
    send_json(&mut bob, json!({ "type": "join-room", "roomKey": "proj-3" })).await;
    let _ = next_json(&mut bob).await;
    let _ = next_json(&mut alice).await; // user-joined for bob

    send_json(&mut bob, json!({ "type": "leave-room", "roomKey": "proj-3" })).await;
    let left = next_json(&mut alice).await;
    assert_eq!(left["type"], "user-left");
    assert_eq!(left["userId"], "u-bob");

    // Leaving a room you are not in is a no-op; nothing reaches A.
    send_json(&mut bob, json!({ "type": "leave-room", "roomKey": "proj-3" })).await;
    expect_silence(&mut alice, Duration::from_millis(300)).await;

    // Re-join self-heals: the snapshot shows the current membership.
    send_json(&mut bob, json!({ "type": "join-room", "roomKey": "proj-3" })).await;
    let snapshot = next_json(&mut bob).await;
    assert_eq!(snapshot["type"], "room-snapshot");
    assert_eq!(snapshot["members"].as_array().unwrap().len(), 2);
}
