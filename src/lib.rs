pub mod auth;
pub mod clients;
pub mod config;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod ws;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::routes::api::create_api_routes;
use crate::ws::state::GatewayState;

/// Assemble the full application router over a gateway state instance.
/// Tests construct isolated states and call this directly.
pub fn build_app(state: Arc<GatewayState>) -> Router {
    // REST surface
    let api_routes = create_api_routes(state.clone());

    // The persistent duplex connection
    let ws_route = Router::new()
        .route("/ws", get(ws::handler::websocket_handler))
        .with_state(state);

    Router::new()
        // Mount API routes
        .nest("/api", api_routes)
        // Mount the live connection endpoint
        .merge(ws_route)
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add tracing layer
        .layer(TraceLayer::new_for_http())
}
