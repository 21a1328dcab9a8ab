use axum::{middleware, routing::{get, post}, Router};
use std::sync::Arc;

use crate::handlers::{diagnostics, health_check, ready_check, relay_progress};
use crate::routes::auth_middleware::auth_middleware;
use crate::ws::state::GatewayState;

/// Create API routes
pub fn create_api_routes(state: Arc<GatewayState>) -> Router {
    let protected = Router::<Arc<GatewayState>>::new()
        .route("/v1/diagnostics", get(diagnostics))
        .route("/v1/rooms/:room_key/progress", post(relay_progress))
        .route_layer(middleware::from_fn(auth_middleware)); // Applies to all routes added above

    Router::<Arc<GatewayState>>::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .merge(protected)
        .with_state(state)
}
