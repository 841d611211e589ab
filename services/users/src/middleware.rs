//! Middleware for JWT token validation and authentication

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use common::error::ApiError;
use tracing::{error, warn};

use crate::state::AppState;

/// Validate the bearer token and attach the current [`crate::models::User`]
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Err(ApiError::Unauthorized(
            "Not authorized, no token".to_string(),
        ));
    };

    let claims = state.jwt_service.validate(bearer.token()).map_err(|e| {
        warn!("Rejected token: {}", e);
        ApiError::Unauthorized("Not authorized".to_string())
    })?;

    let user = state
        .user_repository
        .find_by_id(claims.sub)
        .await
        .map_err(|e| {
            error!("Failed to load user {}: {}", claims.sub, e);
            ApiError::Unauthorized("Not authorized".to_string())
        })?
        .ok_or_else(|| ApiError::Unauthorized("Not authorized".to_string()))?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
