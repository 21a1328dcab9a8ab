use axum::http::{self, HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use tracing::{info, warn};

use crate::models::{RelayError, Session};
use crate::ws::userctx;

// Get the auth token from a request
pub fn get_auth_token<B>(req: &http::Request<B>) -> Result<String, String> {
    // 1. Try to get token from Authorization header
    if let Some(auth_header) = req.headers().get(http::header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| "Invalid Authorization header".to_string())?;
        Ok(auth_str
            .strip_prefix("Bearer ")
            .unwrap_or(auth_str)
            .to_string())
    }
    // 2. Try to get token from cookies
    else {
        let cookie_header = req
            .headers()
            .get(http::header::COOKIE)
            .ok_or_else(|| "Missing Authorization header or Cookie".to_string())?
            .to_str()
            .map_err(|_| "Invalid Cookie header".to_string())?;

        for cookie in cookie::Cookie::split_parse(cookie_header) {
            if let Ok(c) = cookie {
                if c.name() == "auth_token" {
                    return Ok(c.value().to_string());
                }
            }
        }
        Err("auth_token cookie not found".to_string())
    }
}

// Get the auth token from a WebSocket upgrade request. Browsers cannot set
// headers on WebSocket connects, so a `token` query parameter is also accepted.
pub fn get_ws_auth_token(headers: &HeaderMap, query: Option<&str>) -> Result<String, String> {
    if let Some(auth_header) = headers.get(http::header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| "Invalid Authorization header".to_string())?;
        return Ok(auth_str
            .strip_prefix("Bearer ")
            .unwrap_or(auth_str)
            .to_string());
    }

    if let Some(cookie_header) = headers.get(http::header::COOKIE) {
        let cookie_str = cookie_header
            .to_str()
            .map_err(|_| "Invalid Cookie header".to_string())?;
        for cookie in cookie::Cookie::split_parse(cookie_str) {
            if let Ok(c) = cookie {
                if c.name() == "auth_token" {
                    return Ok(c.value().to_string());
                }
            }
        }
    }

    if let Some(query) = query {
        for pair in query.split('&') {
            if let Some(value) = pair.strip_prefix("token=") {
                if !value.is_empty() {
                    return Ok(value.to_string());
                }
            }
        }
    }

    Err("No credential token on upgrade request".to_string())
}

/// Authenticate a credential token into a fresh Session.
///
/// Validates the JWT, takes the user id from the `sub` claim and resolves the
/// display identity through the app service roster. When the roster is
/// unreachable the `name` claim (or the uid) stands in, so a roster outage
/// degrades labels instead of refusing collaborators.
pub async fn authenticate(token: &str) -> Result<Session, RelayError> {
    let config = crate::config::get_config();
    let secret = config
        .cloud_auth_jwt_secret
        .as_ref()
        .ok_or_else(|| RelayError::Unauthenticated("No JWT secret configured".to_string()))?;

    let token_data = validate_jwt(token, secret)
        .map_err(|e| RelayError::Unauthenticated(format!("JWT validation failed: {}", e)))?;

    let uid = token_data
        .claims
        .get("sub")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            RelayError::Unauthenticated("Can't extract a UID from the JWT token".to_string())
        })?;
    info!("JWT token validated successfully for user: {}", uid);

    let claimed_name = token_data
        .claims
        .get("name")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    match userctx::get_or_fetch_user_ctx(uid).await {
        Ok(ctx) => Ok(Session::new(
            uid.to_string(),
            ctx.display_name,
            ctx.avatar_url,
        )),
        Err(e) => {
            warn!("Falling back to token identity for {}: {}", uid, e);
            let display_name = claimed_name.unwrap_or_else(|| uid.to_string());
            Ok(Session::new(uid.to_string(), display_name, None))
        }
    }
}

// Validate a JWT token and return the token data
pub fn validate_jwt(
    token: &str,
    secret: &str,
) -> Result<TokenData<serde_json::Value>, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<serde_json::Value>(token, &decoding_key, &validation)
}
