use chrono::Utc;
use tracing::{debug, info};

use crate::models::{PresenceRecord, PresenceStatus, ServerMessage, Session};
use crate::ws::broadcast;
use crate::ws::rooms::JoinOutcome;
use crate::ws::state::GatewayState;

/// Put a session into a room: register membership, seed presence, send the
/// joiner its room snapshot and announce the join to everyone else.
pub async fn handle_join(state: &GatewayState, session: &Session, room_key: &str) {
    let outcome = state.rooms.write().await.join(room_key, session.id);

    match outcome {
        JoinOutcome::AlreadyMember => {
            // Nothing changed; re-send the snapshot so an out-of-sync client
            // reconciles its member list.
            let members = state.presence.read().await.snapshot(room_key);
            broadcast::send_to(state, session.id, &ServerMessage::RoomSnapshot { members }).await;
        }
        JoinOutcome::Joined { vacated } => {
            if let Some(old_room) = vacated {
                announce_departure(state, &old_room, session).await;
            }

            let record = PresenceRecord {
                user_id: session.user_id.clone(),
                display_name: session.display_name.clone(),
                color: session.color.clone(),
                status: PresenceStatus::Online,
                cursor: None,
                last_seen: Utc::now(),
            };
            let (members, already_present) = {
                let mut presence = state.presence.write().await;
                // Another session of the same user may already be in the
                // room; presence is per user, not per session.
                let already_present = presence.contains(room_key, &session.user_id);
                presence.seed(room_key, record);
                (presence.snapshot(room_key), already_present)
            };

            // The snapshot includes the joiner itself, so its local view
            // converges within one round trip.
            broadcast::send_to(state, session.id, &ServerMessage::RoomSnapshot { members }).await;
            if !already_present {
                broadcast::publish(
                    state,
                    room_key,
                    &ServerMessage::UserJoined {
                        user_id: session.user_id.clone(),
                        display_name: session.display_name.clone(),
                        color: session.color.clone(),
                    },
                    Some(session.id),
                )
                .await;
            }

            info!("User {} joined room {}", session.user_id, room_key);
        }
    }
}

/// Take a session out of a room. A no-op when the session is not a member,
/// so the explicit-leave and disconnect paths can overlap safely.
pub async fn handle_leave(state: &GatewayState, session: &Session, room_key: &str) {
    let removed = state.rooms.write().await.leave(room_key, session.id);
    if !removed {
        debug!(
            "Session {} left room {} it was not in",
            session.id, room_key
        );
        return;
    }

    announce_departure(state, room_key, session).await;
    info!("User {} left room {}", session.user_id, room_key);
}

/// Connection teardown: vacate whatever room the session was in and drop its
/// handle. Invoked exactly once per connection by the gateway.
pub async fn disconnect_cleanup(state: &GatewayState, session: &Session) {
    // Bind before branching: an `if let` on the expression would hold the
    // write guard across the announce, which itself takes the rooms lock.
    let vacated = state.rooms.write().await.remove_session(session.id);
    if let Some(room_key) = vacated {
        announce_departure(state, &room_key, session).await;
        info!(
            "User {} left room {} on disconnect",
            session.user_id, room_key
        );
    }
    state.sessions.write().await.remove(&session.id);
}

async fn announce_departure(state: &GatewayState, room_key: &str, session: &Session) {
    // The user stays present while another of their sessions (a second tab)
    // remains a member of the room. The departing session has already been
    // removed from the registry by the caller.
    let remaining = state.rooms.read().await.members_of(room_key);
    let user_still_member = {
        let sessions = state.sessions.read().await;
        remaining.iter().any(|id| {
            sessions
                .get(id)
                .is_some_and(|handle| handle.session.user_id == session.user_id)
        })
    };
    if user_still_member {
        debug!(
            "User {} still in room {} via another session",
            session.user_id, room_key
        );
        return;
    }

    state
        .presence
        .write()
        .await
        .remove(room_key, &session.user_id);
    broadcast::publish(
        state,
        room_key,
        &ServerMessage::UserLeft {
            user_id: session.user_id.clone(),
        },
        Some(session.id),
    )
    .await;
}
