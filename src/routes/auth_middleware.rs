use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::{error, info};
use crate::config;
use crate::services::auth_service::{get_auth_token, user_id_from_claims, validate_jwt};

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
    let secret = match &config.jwt_secret {
        Some(secret) => secret,
        None => {
            error!("JWT secret not configured");
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

    // 3. Extract the user id from the claims
    let user_id = match user_id_from_claims(&token_data.claims) {
        Some(user_id) => user_id,
        None => {
            error!("JWT token does not carry a user id claim");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };
    info!("Token validated successfully for user: {}", user_id);

    // 4. Set the user id into request extensions for downstream handlers
    req.extensions_mut().insert(user_id);

    // Token is valid, proceed to next middleware/handler
    Ok(next.run(req).await)
}
