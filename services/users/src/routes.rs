//! Users service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use common::error::{ApiError, ApiResult};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::{
    middleware::auth_middleware,
    models::{
        AuthResponse, LoginRequest, NewUser, RegisterRequest, UpdateProfileRequest, UpdateUser,
        User, UserResponse,
    },
    repositories::user::{hash_password, is_unique_violation, verify_password},
    state::AppState,
    validation,
};

/// Create the router for the users service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let account_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected_routes);

    // The gateway forwards both prefixes here
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", account_routes.clone())
        .nest("/api/users", account_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "users-service"
    }))
}

fn issue_token(state: &AppState, user: &User) -> ApiResult<String> {
    state.jwt_service.issue(user.id, user.role).map_err(|e| {
        error!("Failed to issue token: {}", e);
        ApiError::internal("Server error", e)
    })
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let role = validation::validate_registration(&payload).map_err(ApiError::BadRequest)?;

    let username = payload.username.trim().to_string();
    let email = validation::normalize_email(&payload.email);

    let existing = state
        .user_repository
        .find_by_email_or_username(&email, &username)
        .await
        .map_err(|e| ApiError::internal("Server error", e))?;

    if existing.is_some() {
        return Err(ApiError::BadRequest("User already exists".to_string()));
    }

    let password_hash =
        hash_password(&payload.password).map_err(|e| ApiError::internal("Server error", e))?;

    let new_user = NewUser {
        username,
        email,
        password_hash,
        contact: payload.contact.trim().to_string(),
        role,
    };

    let user = match state.user_repository.create(&new_user).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::BadRequest("User already exists".to_string()));
        }
        Err(e) => {
            error!("Failed to create user: {}", e);
            return Err(ApiError::internal("Server error", e));
        }
    };

    info!("Registered user {} as {}", user.id, user.role);

    let token = issue_token(&state, &user)?;
    let response = AuthResponse {
        user: UserResponse::from(&user),
        token,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_email(&payload.email).map_err(ApiError::BadRequest)?;
    if payload.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }

    let email = validation::normalize_email(&payload.email);

    if !state.login_limiter.is_allowed(&email).await {
        return Err(ApiError::TooManyRequests(
            "Too many login attempts, please try again later".to_string(),
        ));
    }

    let user = state
        .user_repository
        .find_by_email(&email)
        .await
        .map_err(|e| ApiError::internal("Server error", e))?;

    let authenticated = match &user {
        Some(user) => verify_password(&user.password_hash, &payload.password)
            .map_err(|e| ApiError::internal("Server error", e))?,
        None => false,
    };

    let Some(user) = user.filter(|_| authenticated) else {
        warn!("Failed login for {}", email);
        state.login_limiter.record_failure(&email).await;
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    };

    state.login_limiter.reset(&email).await;

    let token = issue_token(&state, &user)?;
    let response = AuthResponse {
        user: UserResponse::from(&user),
        token,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Current user's profile
pub async fn get_profile(Extension(user): Extension<User>) -> impl IntoResponse {
    Json(UserResponse::from(&user))
}

/// Update the current user's profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateProfileRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_profile_update(&payload).map_err(ApiError::BadRequest)?;

    let update = UpdateUser {
        username: payload.username.map(|u| u.trim().to_string()),
        contact: payload.contact.map(|c| c.trim().to_string()),
        profile_picture: payload.profile_picture,
    };

    let updated = match state.user_repository.update(user.id, &update).await {
        Ok(updated) => updated,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::BadRequest("Username is already taken".to_string()));
        }
        Err(e) => {
            error!("Failed to update profile: {}", e);
            return Err(ApiError::internal("Server error", e));
        }
    };

    let updated = updated.ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(&updated)))
}
