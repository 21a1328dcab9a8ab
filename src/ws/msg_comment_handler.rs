use tracing::debug;

use crate::models::{CursorPosition, RelayError, ServerMessage, Session};
use crate::services::comment_service;
use crate::ws::broadcast;
use crate::ws::state::GatewayState;

/// Run a comment submission through the relay. Validation failures go back
/// to the author only; nothing is broadcast for a rejected comment.
pub async fn handle_submit_comment(
    state: &GatewayState,
    session: &Session,
    room_key: &str,
    content: &str,
    target: Option<CursorPosition>,
) {
    match comment_service::submit_comment(state, session, room_key, content, target).await {
        Ok(event) => {
            debug!(
                "Comment {} by {} relayed to room {}",
                event.id, session.user_id, room_key
            );
        }
        Err(e) => {
            let reason = match e {
                RelayError::InvalidInput(reason) => reason,
                other => other.to_string(),
            };
            broadcast::send_to(state, session.id, &ServerMessage::InvalidInput { reason }).await;
        }
    }
}
