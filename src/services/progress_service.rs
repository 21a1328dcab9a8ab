use tracing::info;

use crate::models::{ProgressEvent, ServerMessage};
use crate::ws::broadcast;
use crate::ws::state::GatewayState;

/// Relay a backend job-progress event into a room.
///
/// Called by backend workers, in-process or via the authenticated REST
/// endpoint. The payload is relayed as received; beyond deserialization no
/// validation applies. Returns the number of members reached.
pub async fn relay_progress(
    state: &GatewayState,
    room_key: &str,
    event: ProgressEvent,
) -> usize {
    if event.terminal {
        info!(
            "Job {} ({:?}) finished for room {}",
            event.job_id, event.job_type, room_key
        );
    }
    broadcast::publish(
        state,
        room_key,
        &ServerMessage::ProgressUpdate(event),
        None,
    )
    .await
}
