use moka::sync::Cache;
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{error, info};

use crate::clients::app_service_client;

/// Identity info for a user, fetched from the app service. The app service
/// roster is authoritative for identity; the presence store is authoritative
/// for live status.
#[derive(Clone, Debug)]
pub struct UserCtx {
    pub display_name: String,
    pub avatar_url: Option<String>,
}

static USER_CTX_CACHE: OnceLock<Cache<String, UserCtx>> = OnceLock::new();

pub fn init_user_ctx_cache() {
    USER_CTX_CACHE.get_or_init(|| {
        Cache::builder()
            .max_capacity(100_000)
            .time_to_idle(Duration::from_secs(5 * 60))
            .build()
    });
    info!("User cache initialized");
}

fn get_user_ctx_cache() -> &'static Cache<String, UserCtx> {
    USER_CTX_CACHE
        .get()
        .expect("User cache not initialized. Call init_user_ctx_cache() first.")
}

/// Number of cached identities; used by the diagnostics endpoint.
pub fn cached_user_count() -> u64 {
    USER_CTX_CACHE
        .get()
        .map(|cache| cache.entry_count())
        .unwrap_or(0)
}

fn parse_profile_from_json(uid: &str, profile_json: &Value) -> UserCtx {
    let display_name = profile_json
        .get("displayName")
        .and_then(|v| v.as_str())
        .unwrap_or(uid)
        .to_string();
    let avatar_url = profile_json
        .get("avatarUrl")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());
    UserCtx {
        display_name,
        avatar_url,
    }
}

async fn fetch_user_ctx_from_service(uid: &str) -> Result<UserCtx, String> {
    let client = app_service_client::get_app_service_client()
        .ok_or_else(|| "App service client not initialized".to_string())?;

    let profile_json = client.get_profile(uid).await.map_err(|e| {
        error!("Failed to retrieve profile for user {}: {}", uid, e);
        format!("Failed to retrieve profile: {}", e)
    })?;

    Ok(parse_profile_from_json(uid, &profile_json))
}

pub async fn get_or_fetch_user_ctx(uid: &str) -> Result<UserCtx, String> {
    let cache = get_user_ctx_cache();

    if let Some(ctx) = cache.get(uid) {
        return Ok(ctx);
    }

    info!("User context cache miss for uid {}. Refreshing from app service.", uid);
    let fetched_ctx = fetch_user_ctx_from_service(uid).await?;

    cache.insert(uid.to_string(), fetched_ctx.clone());
    Ok(fetched_ctx)
}
