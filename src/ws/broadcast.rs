use axum::extract::ws::Message;
use tracing::{debug, error};
use uuid::Uuid;

use crate::models::ServerMessage;
use crate::ws::state::GatewayState;

/// Fan one event out to every current member of a room, optionally excluding
/// the originating session. Returns the number of members the frame was
/// handed to.
///
/// Membership is snapshotted at call time; a member that is mid-disconnect
/// simply misses the event and reconciles from the next room snapshot.
/// Delivery is at-most-once and never reported back to the sender.
pub async fn publish(
    state: &GatewayState,
    room_key: &str,
    message: &ServerMessage,
    exclude: Option<Uuid>,
) -> usize {
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to serialize broadcast for room {}: {}", room_key, e);
            return 0;
        }
    };

    let member_ids = state.rooms.read().await.members_of(room_key);
    let sessions = state.sessions.read().await;

    let mut delivered = 0;
    for session_id in member_ids {
        if Some(session_id) == exclude {
            continue;
        }
        let Some(handle) = sessions.get(&session_id) else {
            // Session already torn down between snapshot and send.
            continue;
        };
        if handle.sender.send(Message::Text(text.clone())).is_ok() {
            delivered += 1;
        }
    }
    debug!(
        "Broadcast to room {}: {} recipient(s)",
        room_key, delivered
    );
    delivered
}

/// Push a message to a single session, e.g. a room snapshot for a joiner or
/// an inline validation error. Failures mean the session is gone and are
/// ignored.
pub async fn send_to(state: &GatewayState, session_id: Uuid, message: &ServerMessage) {
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to serialize message for {}: {}", session_id, e);
            return;
        }
    };
    if let Some(handle) = state.sessions.read().await.get(&session_id) {
        let _ = handle.sender.send(Message::Text(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Session;
    use crate::ws::state::SessionHandle;
    use tokio::sync::mpsc;

    async fn connect(state: &GatewayState, user_id: &str) -> (Uuid, mpsc::UnboundedReceiver<Message>) {
        let session = Session::new(user_id.to_string(), user_id.to_string(), None);
        let id = session.id;
        let (tx, rx) = mpsc::unbounded_channel();
        state
            .sessions
            .write()
            .await
            .insert(id, SessionHandle { session, sender: tx });
        (id, rx)
    }

    #[tokio::test]
    async fn publish_excludes_the_sender() {
        let state = GatewayState::new();
        let (a, mut rx_a) = connect(&state, "u-a").await;
        let (b, mut rx_b) = connect(&state, "u-b").await;
        {
            let mut rooms = state.rooms.write().await;
            rooms.join("proj-1", a);
            rooms.join("proj-1", b);
        }

        let delivered = publish(
            &state,
            "proj-1",
            &ServerMessage::UserLeft {
                user_id: "u-x".to_string(),
            },
            Some(a),
        )
        .await;

        assert_eq!(delivered, 1);
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn publish_skips_torn_down_sessions() {
        let state = GatewayState::new();
        let (a, _rx_a) = connect(&state, "u-a").await;
        let (b, mut rx_b) = connect(&state, "u-b").await;
        {
            let mut rooms = state.rooms.write().await;
            rooms.join("proj-1", a);
            rooms.join("proj-1", b);
        }
        // a's handle is gone but its registry entry is not cleaned up yet.
        state.sessions.write().await.remove(&a);

        let delivered = publish(
            &state,
            "proj-1",
            &ServerMessage::UserLeft {
                user_id: "u-x".to_string(),
            },
            None,
        )
        .await;

        assert_eq!(delivered, 1);
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let state = GatewayState::new();
        let (a, mut rx_a) = connect(&state, "u-a").await;
        state.rooms.write().await.join("proj-1", a);

        for user in ["u-1", "u-2", "u-3"] {
            publish(
                &state,
                "proj-1",
                &ServerMessage::UserLeft {
                    user_id: user.to_string(),
                },
                None,
            )
            .await;
        }

        let mut seen = Vec::new();
        while let Ok(Message::Text(text)) = rx_a.try_recv() {
            let msg: ServerMessage = serde_json::from_str(&text).unwrap();
            if let ServerMessage::UserLeft { user_id } = msg {
                seen.push(user_id);
            }
        }
        assert_eq!(seen, vec!["u-1", "u-2", "u-3"]);
    }
}
