//! Bookings service routes

use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
};
use axum_extra::extract::WithRejection;
use common::error::{ApiError, ApiResult};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth::auth_middleware,
    directory::VenueDirectory,
    models::{AuthUser, CreateBookingRequest, ListQuery, StatusRequest},
    state::AppState,
    store::BookingStore,
};

/// Create the router for the bookings service
pub fn create_router<S, D>(state: AppState<S, D>) -> Router
where
    S: BookingStore + 'static,
    D: VenueDirectory + 'static,
{
    let protected_routes = Router::new()
        .route(
            "/api/bookings",
            get(list_bookings::<S, D>).post(create_booking::<S, D>),
        )
        .route("/api/bookings/owner/venues", get(owner_bookings::<S, D>))
        .route("/api/bookings/:id", get(get_booking::<S, D>))
        .route("/api/bookings/:id/cancel", put(cancel_booking::<S, D>))
        .route("/api/bookings/:id/status", put(update_status::<S, D>))
        .route_layer(middleware::from_fn_with_state(
            state.authenticator.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "bookings-service"
    }))
}

/// Book a venue
pub async fn create_booking<S, D>(
    State(state): State<AppState<S, D>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateBookingRequest>, ApiError>,
) -> ApiResult<impl IntoResponse>
where
    S: BookingStore,
    D: VenueDirectory,
{
    let created = state.service.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// The caller's bookings
pub async fn list_bookings<S, D>(
    State(state): State<AppState<S, D>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Query(query), _): WithRejection<Query<ListQuery>, ApiError>,
) -> ApiResult<impl IntoResponse>
where
    S: BookingStore,
    D: VenueDirectory,
{
    Ok(Json(state.service.list(&user, &query).await?))
}

/// One booking
pub async fn get_booking<S, D>(
    State(state): State<AppState<S, D>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult<impl IntoResponse>
where
    S: BookingStore,
    D: VenueDirectory,
{
    Ok(Json(state.service.get(&user, &id).await?))
}

/// Cancel one of the caller's bookings
pub async fn cancel_booking<S, D>(
    State(state): State<AppState<S, D>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<String>, ApiError>,
) -> ApiResult<impl IntoResponse>
where
    S: BookingStore,
    D: VenueDirectory,
{
    Ok(Json(state.service.cancel(&user, &id).await?))
}

/// Set a booking's status as the venue's owner
pub async fn update_status<S, D>(
    State(state): State<AppState<S, D>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<String>, ApiError>,
    WithRejection(body, _): WithRejection<Bytes, ApiError>,
) -> ApiResult<impl IntoResponse>
where
    S: BookingStore,
    D: VenueDirectory,
{
    let payload = StatusRequest::from_body(&body);
    Ok(Json(
        state
            .service
            .set_status(&user, &id, payload.status.as_deref())
            .await?,
    ))
}

/// Bookings on the caller's venues
pub async fn owner_bookings<S, D>(
    State(state): State<AppState<S, D>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Query(query), _): WithRejection<Query<ListQuery>, ApiError>,
) -> ApiResult<impl IntoResponse>
where
    S: BookingStore,
    D: VenueDirectory,
{
    Ok(Json(state.service.owner_bookings(&user, &query).await?))
}
