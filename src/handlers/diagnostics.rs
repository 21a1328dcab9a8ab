use axum::{extract::{Extension, State}, http::StatusCode, Json};
use std::sync::{Arc, Mutex, OnceLock};
use sysinfo::System;
use tracing::info;

use crate::auth::auth;
use crate::models::{DiagnosticsResponse, ErrorResponse};
use crate::ws::state::GatewayState;
use crate::ws::userctx;

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

/// Operator view of the gateway
pub async fn diagnostics(
    State(state): State<Arc<GatewayState>>,
    Extension(prpls): Extension<Vec<String>>,
) -> Result<(StatusCode, Json<DiagnosticsResponse>), (StatusCode, Json<ErrorResponse>)> {

    // Only cloud admins may inspect the gateway
    let _ = auth::ensure_cloud_admin(&prpls)?;

    // Aggregate gateway counters
    let n_conn = state.sessions.read().await.len() as u32;
    let n_rooms = state.rooms.read().await.room_count() as u32;
    let n_presence = state.presence.read().await.record_count() as u32;
    let n_user_ctx = userctx::cached_user_count() as u32;

    // System stats
    let (cpu_usage, memory_alloc, memory_free, memory_total) = {
        let sys_lock = SYSTEM_MONITOR.get_or_init(|| {
            Mutex::new(System::new_all())
        });
        match sys_lock.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.refresh_memory();
                (
                    sys.global_cpu_info().cpu_usage(),
                    sys.used_memory(),
                    sys.free_memory(),
                    sys.total_memory(),
                )
            }
            Err(_) => (0.0, 0, 0, 0)
        }
    };

    info!(
        "Diagnostics: CPU: {:.2}%, Mem: {}/{} MB (Free: {} MB), Conn: {}, Rooms: {}",
        cpu_usage,
        memory_alloc / 1024 / 1024,
        memory_total / 1024 / 1024,
        memory_free / 1024 / 1024,
        n_conn,
        n_rooms
    );

    Ok((
        StatusCode::OK,
        Json(DiagnosticsResponse {
            n_conn,
            n_rooms,
            n_presence,
            n_user_ctx,
            cpu_usage,
            memory_alloc,
            memory_total,
            memory_free,
        }),
    ))
}
