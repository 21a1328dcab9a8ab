use draftly_live::build_app;
use draftly_live::clients::app_service_client;
use draftly_live::config::{self, Config};
use draftly_live::ws::state::GatewayState;
use draftly_live::ws::userctx;

use std::panic;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() {

    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "draftly_live=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });
    config::init_config(config.clone());

    // Initialize the identity cache
    userctx::init_user_ctx_cache();

    // Initialize the app service client (identity roster + comment persistence)
    match (&config.app_service_url, &config.cloud_auth_jwt_secret) {
        (Some(url), Some(secret)) => {
            if let Err(e) = app_service_client::init_app_service_client(
                url.clone(),
                secret.clone(),
                config.cloud_service_name.clone(),
            ) {
                error!("Failed to initialize app service client: {}", e);
            } else {
                info!("App service client initialized for {}", url);
            }
        }
        _ => {
            warn!("App service not configured - comments will not be persisted and display names fall back to token claims");
        }
    }

    // Gateway state: rooms, presence, connected sessions
    let state = GatewayState::new();

    // Combine all routes
    let app_routes = build_app(state);

    // Start the server
    let listener = tokio::net::TcpListener::bind(config.server_address())
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", config.server_address()));

    info!("🚀 Server running on http://{}", config.server_address());
    info!("📡 Live connection available at ws://{}/ws", config.server_address());
    info!("📚 Swagger UI available at http://{}/swagger", config.server_address());

    axum::serve(listener, app_routes)
        .await
        .expect("Server failed to start");
}
