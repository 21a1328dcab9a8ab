use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::auth::auth;
use crate::models::{ErrorResponse, ProgressAccepted, ProgressEvent};
use crate::services::progress_service;
use crate::ws::state::GatewayState;

/// Service name backend job workers authenticate as.
pub const WORKERS_SERVICE: &str = "draftly-workers";

/// Relay a job-progress event into a room
pub async fn relay_progress(
    State(state): State<Arc<GatewayState>>,
    Path(room_key): Path<String>,
    Extension(prpls): Extension<Vec<String>>,
    Json(event): Json<ProgressEvent>,
) -> Result<(StatusCode, Json<ProgressAccepted>), (StatusCode, Json<ErrorResponse>)> {

    // Only backend workers (or cloud admins) may push progress
    let _ = auth::ensure_service(&prpls, WORKERS_SERVICE)?;

    let delivered = progress_service::relay_progress(&state, &room_key, event).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(ProgressAccepted {
            delivered: delivered as u32,
        }),
    ))
}
