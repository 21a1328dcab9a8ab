use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::{error, info};

use crate::config;
use crate::services::auth_service::{get_auth_token, validate_jwt};

pub async fn auth_middleware(
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {

    // 1. Get the auth token from the request
    let token = match get_auth_token(&req) {
        Ok(token) => token,
        Err(_) => return Err(StatusCode::UNAUTHORIZED),
    };

    // 2. Validate Token
    let config = config::get_config();
    let secret = match &config.cloud_auth_jwt_secret {
        Some(secret) => secret,
        None => {
            error!("Cloud auth JWT secret not configured");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    let token_data = match validate_jwt(&token, secret) {
        Ok(token_data) => token_data,
        Err(e) => {
            error!("JWT validation failed: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    // 3. Determine the type of token (user/service)
    let token_type = token_data.claims.get("type").and_then(|v| v.as_str()).ok_or_else(|| {
        error!("JWT token does not contain 'type' claim");
        StatusCode::UNAUTHORIZED
    })?;

    let sub = token_data.claims.get("sub").and_then(|v| v.as_str()).ok_or_else(|| {
        error!("JWT token does not contain 'sub' claim");
        StatusCode::UNAUTHORIZED
    })?;

    // 4. Collect the principals this token grants
    let prpls: Vec<String> = if token_type == "service" {
        info!("Service token validated successfully for {}", sub);
        vec![format!("s/{}", sub)]
    } else {
        info!("User token validated successfully for {}", sub);
        match token_data.claims.get("roles").and_then(|v| v.as_array()) {
            Some(roles_array) => roles_array
                .iter()
                .filter_map(|r| r.as_str().map(|s| s.to_string()))
                .collect(),
            None => Vec::new(),
        }
    };

    // 5. Attach the principals for the handlers
    req.extensions_mut().insert(prpls);
    Ok(next.run(req).await)
}
