use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        RawQuery, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};
use tracing::{debug, error, info, warn};

use crate::models::{ClientMessage, RelayError, ServerMessage, Session};
use crate::services::auth_service;
use crate::ws::state::{GatewayState, SessionHandle};
use crate::ws::{msg_comment_handler, msg_presence_handler, msg_room_handler};

/// WebSocket handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    State(state): State<Arc<GatewayState>>,
) -> Response {
    info!("New WebSocket connection attempt");

    // Authenticate before taking over the socket. The result is carried into
    // the upgraded connection so a refused client still gets an auth-error
    // frame instead of a bare close.
    let auth_result = match auth_service::get_ws_auth_token(&headers, query.as_deref()) {
        Ok(token) => auth_service::authenticate(&token).await,
        Err(reason) => Err(RelayError::Unauthenticated(reason)),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, auth_result, state))
}

/// Handle WebSocket connection
async fn handle_socket(
    mut socket: WebSocket,
    auth_result: Result<Session, RelayError>,
    state: Arc<GatewayState>,
) {
    let session = match auth_result {
        Ok(session) => session,
        Err(e) => {
            warn!("Refusing connection: {}", e);
            let reason = match e {
                RelayError::Unauthenticated(reason) => reason,
                other => other.to_string(),
            };
            if let Ok(frame) = serde_json::to_string(&ServerMessage::AuthError { reason }) {
                let _ = socket.send(Message::Text(frame)).await;
            }
            let _ = socket.close().await;
            return;
        }
    };

    info!(
        "Session {} established for user {} ({})",
        session.id, session.user_id, session.display_name
    );

    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    // Register the session so broadcasts can reach it.
    state.sessions.write().await.insert(
        session.id,
        SessionHandle {
            session: session.clone(),
            sender: tx.clone(),
        },
    );

    // Writer task: owns the sink, forwards everything pushed to the channel.
    let mut send_task = tokio::spawn(async move {
        let mut ws_sender = ws_sender;
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    // Heartbeat task: ping on the configured interval, give up when a pong
    // misses its deadline.
    let (pong_tx, mut pong_rx) = mpsc::unbounded_channel::<()>();
    let ping_tx = tx.clone();
    let config = crate::config::get_config();
    let heartbeat = Duration::from_secs(config.heartbeat_secs);
    // A silent connection is presumed dead after this deadline and runs the
    // same cleanup path as an explicit disconnect.
    let pong_deadline = Duration::from_secs(config.pong_timeout_secs);
    let mut ping_task = tokio::spawn(async move {
        let mut ping_timer = interval(heartbeat);
        // Skip the first immediate tick
        ping_timer.tick().await;

        loop {
            ping_timer.tick().await;

            if ping_tx.send(Message::Ping(Vec::new())).is_err() {
                break;
            }

            match timeout(pong_deadline, pong_rx.recv()).await {
                Ok(Some(())) => {}
                _ => {
                    warn!("Missed heartbeat, closing connection");
                    let _ = ping_tx.send(Message::Close(Some(CloseFrame {
                        code: 1001,
                        reason: "Heartbeat timeout".into(),
                    })));
                    break;
                }
            }
        }
    });

    // Reader task: dispatch incoming messages until the connection drops.
    let reader_state = state.clone();
    let reader_session = session.clone();
    let reader_tx = tx.clone();
    let mut recv_task = tokio::spawn(async move {
        loop {
            match ws_receiver.next().await {
                Some(Ok(Message::Text(text))) => {
                    let msg: ClientMessage = match serde_json::from_str(&text) {
                        Ok(msg) => msg,
                        Err(e) => {
                            error!("Failed to parse message from {}: {}", reader_session.id, e);
                            let reason = format!("Malformed message: {}", e);
                            crate::ws::broadcast::send_to(
                                &reader_state,
                                reader_session.id,
                                &ServerMessage::InvalidInput { reason },
                            )
                            .await;
                            continue;
                        }
                    };
                    dispatch_message(&reader_state, &reader_session, msg).await;
                }
                Some(Ok(Message::Pong(_))) => {
                    let _ = pong_tx.send(());
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = reader_tx.send(Message::Pong(data));
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!("Session {} closed by client: {:?}", reader_session.id, frame);
                    break;
                }
                Some(Ok(Message::Binary(_))) => {
                    debug!("Ignoring binary frame from session {}", reader_session.id);
                }
                Some(Err(e)) => {
                    warn!("Receive error on session {}: {}", reader_session.id, e);
                    break;
                }
                None => break,
            }
        }
    });

    // Whichever task ends first takes the connection down with it. The ping
    // task ending means a missed heartbeat: a dead peer must not keep its
    // presence alive waiting on a read that will never return.
    tokio::select! {
        _ = (&mut send_task) => { recv_task.abort(); ping_task.abort(); }
        _ = (&mut recv_task) => { send_task.abort(); ping_task.abort(); }
        _ = (&mut ping_task) => { send_task.abort(); recv_task.abort(); }
    };

    // Exactly one teardown per connection ends up here, explicit close and
    // heartbeat timeout alike.
    msg_room_handler::disconnect_cleanup(&state, &session).await;
    info!("Session {} terminated", session.id);
}

async fn dispatch_message(state: &GatewayState, session: &Session, msg: ClientMessage) {
    match msg {
        ClientMessage::JoinRoom { room_key } => {
            msg_room_handler::handle_join(state, session, &room_key).await;
        }
        ClientMessage::LeaveRoom { room_key } => {
            msg_room_handler::handle_leave(state, session, &room_key).await;
        }
        ClientMessage::StatusUpdate { status } => {
            msg_presence_handler::handle_status_update(state, session, status).await;
        }
        ClientMessage::CursorMove { room_key, cursor } => {
            msg_presence_handler::handle_cursor_move(state, session, &room_key, cursor).await;
        }
        ClientMessage::SubmitComment {
            room_key,
            content,
            target,
        } => {
            msg_comment_handler::handle_submit_comment(state, session, &room_key, &content, target)
                .await;
        }
    }
}
