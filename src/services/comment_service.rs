use chrono::Utc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::clients::app_service_client;
use crate::models::{CommentEvent, CursorPosition, RelayError, ServerMessage, Session};
use crate::ws::broadcast;
use crate::ws::state::GatewayState;

/// Accept a comment submission, stamp it and fan it out to the room.
///
/// Persistence is handed to the app service fire-and-forget: a failed save is
/// logged but never blocks or cancels the live broadcast. Collaborators see
/// the comment immediately even if durable storage catches up later or not
/// at all.
pub async fn submit_comment(
    state: &GatewayState,
    session: &Session,
    room_key: &str,
    content: &str,
    target: Option<CursorPosition>,
) -> Result<CommentEvent, RelayError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(RelayError::InvalidInput(
            "Comment content must not be empty".to_string(),
        ));
    }

    let is_member =
        state.rooms.read().await.room_of(session.id) == Some(room_key);
    if !is_member {
        return Err(RelayError::InvalidInput(format!(
            "Session is not a member of room {}",
            room_key
        )));
    }

    let event = CommentEvent {
        id: Uuid::new_v4(),
        author_id: session.user_id.clone(),
        author_name: session.display_name.clone(),
        content: content.to_string(),
        target,
        created_at: Utc::now(),
    };

    // Hand off to durable storage without waiting for it.
    if let Some(client) = app_service_client::get_app_service_client() {
        let room_key = room_key.to_string();
        let persisted = event.clone();
        tokio::spawn(async move {
            if let Err(e) = client.save_comment(&room_key, &persisted).await {
                error!(
                    "Failed to persist comment {} for room {}: {}",
                    persisted.id, room_key, e
                );
            }
        });
    } else {
        debug!("App service client not configured; comment {} not persisted", event.id);
    }

    // The author receives the broadcast too, so every client renders the
    // comment with the same id and timestamp.
    broadcast::publish(
        state,
        room_key,
        &ServerMessage::CommentBroadcast(event.clone()),
        None,
    )
    .await;

    Ok(event)
}
