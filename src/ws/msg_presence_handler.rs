use tracing::debug;

use crate::models::{CursorPosition, PresencePatch, PresenceStatus, ServerMessage, Session};
use crate::ws::broadcast;
use crate::ws::state::GatewayState;

/// Apply a status change to the sender's current room and fan it out.
/// Dropped silently when the session is not in any room.
pub async fn handle_status_update(state: &GatewayState, session: &Session, status: PresenceStatus) {
    let Some(room_key) = state
        .rooms
        .read()
        .await
        .room_of(session.id)
        .map(str::to_string)
    else {
        debug!("Status update from roomless session {}", session.id);
        return;
    };

    let patch = PresencePatch {
        status: Some(status),
        cursor: None,
    };
    apply_and_publish(state, session, &room_key, patch).await;
}

/// Apply a cursor move and fan it out to the other room members. The claimed
/// room must match the session's actual room; stale frames from a room the
/// session already left are dropped.
pub async fn handle_cursor_move(
    state: &GatewayState,
    session: &Session,
    room_key: &str,
    cursor: CursorPosition,
) {
    let in_room = state.rooms.read().await.room_of(session.id) == Some(room_key);
    if !in_room {
        debug!(
            "Cursor move for room {} from non-member session {}",
            room_key, session.id
        );
        return;
    }

    let patch = PresencePatch {
        status: None,
        cursor: Some(cursor),
    };
    apply_and_publish(state, session, room_key, patch).await;
}

async fn apply_and_publish(
    state: &GatewayState,
    session: &Session,
    room_key: &str,
    patch: PresencePatch,
) {
    let applied = state
        .presence
        .write()
        .await
        .merge(room_key, &session.user_id, &patch);
    if !applied {
        // The record is gone; the user departed while this frame was inbound.
        return;
    }

    broadcast::publish(
        state,
        room_key,
        &ServerMessage::PresenceUpdate {
            user_id: session.user_id.clone(),
            partial_state: patch,
        },
        Some(session.id),
    )
    .await;
}
