//! Venues service routes

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use common::error::{ApiError, ApiResult};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    form::VenueInput,
    models::{OwnerStatsResponse, OwnerVenuesResponse, Venue, VenueMessage, VenueRecord},
    repositories::is_unique_violation,
    slug::{disambiguate, slugify},
    state::AppState,
    stats::owner_statistics,
};

/// Create the router for the venues service
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    let uploads = ServeDir::new(state.image_store.dir());

    Router::new()
        .route("/health", get(health_check))
        .route("/api/venues", get(list_venues).post(create_venue))
        .route(
            "/api/venues/:id",
            get(get_venue).put(update_venue).delete(delete_venue),
        )
        .route("/api/venues/owner/:owner_contact", get(owner_venues))
        .route("/api/venues/owner/:owner_contact/stats", get(owner_stats))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "venues-service"
    }))
}

fn parse_venue_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| ApiError::BadRequest("Invalid venue ID format".to_string()))
}

fn venue_not_found() -> ApiError {
    ApiError::NotFound("Venue not found".to_string())
}

async fn find_venue(state: &AppState, id: Uuid) -> ApiResult<Venue> {
    state
        .venue_repository
        .find_by_id(id)
        .await
        .map_err(|e| {
            error!("Failed to load venue {}: {}", id, e);
            ApiError::internal("Error fetching venue", e)
        })?
        .ok_or_else(venue_not_found)
}

/// Create a venue from a multipart or JSON form
pub async fn create_venue(
    State(state): State<AppState>,
    input: VenueInput,
) -> ApiResult<impl IntoResponse> {
    let image_upload = input.image.clone();
    let mut record = input.into_new_record(String::new())?;

    if let Some(upload) = image_upload {
        record.image = state
            .image_store
            .save(upload.file_name.as_deref(), &upload.bytes)
            .await
            .map_err(|e| {
                error!("Failed to store venue image: {}", e);
                ApiError::internal("Error creating venue", e)
            })?;
    }

    let venue = match insert_with_unique_slug(&state, &record).await {
        Ok(venue) => venue,
        Err(e) => {
            error!("Failed to create venue: {}", e);
            discard_image(&state, &record.image).await;
            return Err(ApiError::internal("Error creating venue", e));
        }
    };

    info!("Created venue {} ({})", venue.id, venue.slug);

    Ok((
        StatusCode::CREATED,
        Json(VenueMessage {
            message: "Venue created successfully".to_string(),
            venue,
        }),
    ))
}

async fn insert_with_unique_slug(state: &AppState, record: &VenueRecord) -> anyhow::Result<Venue> {
    let base = slugify(&record.title);
    let taken = state.venue_repository.slug_exists(&base).await?;
    let slug = disambiguate(base.clone(), taken, Utc::now().timestamp_millis());

    match state.venue_repository.create(record, &slug).await {
        // Another create claimed the slug between the check and the insert
        Err(e) if is_unique_violation(&e) => {
            let slug = disambiguate(base, true, Utc::now().timestamp_millis());
            state.venue_repository.create(record, &slug).await
        }
        result => result,
    }
}

/// Edit a venue; absent fields keep their stored values
pub async fn update_venue(
    State(state): State<AppState>,
    Path(id): Path<String>,
    input: VenueInput,
) -> ApiResult<impl IntoResponse> {
    let id = parse_venue_id(&id)?;
    let existing = find_venue(&state, id).await?;

    let image = match &input.image {
        Some(upload) => state
            .image_store
            .save(upload.file_name.as_deref(), &upload.bytes)
            .await
            .map_err(|e| {
                error!("Failed to store venue image: {}", e);
                ApiError::internal("Error updating venue", e)
            })?,
        None => existing.image.clone(),
    };

    let record = input.merge_into(&existing, image);

    let updated = match state.venue_repository.update(id, &record).await {
        Ok(Some(updated)) => updated,
        result => {
            if record.image != existing.image {
                discard_image(&state, &record.image).await;
            }
            return Err(match result {
                Err(e) => {
                    error!("Failed to update venue {}: {}", id, e);
                    ApiError::internal("Error updating venue", e)
                }
                _ => venue_not_found(),
            });
        }
    };

    if updated.image != existing.image {
        discard_image(&state, &existing.image).await;
    }

    info!("Updated venue {}", id);

    Ok(Json(VenueMessage {
        message: "Venue updated successfully".to_string(),
        venue: updated,
    }))
}

/// Delete a venue and its image
pub async fn delete_venue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_venue_id(&id)?;

    let deleted = state
        .venue_repository
        .delete(id)
        .await
        .map_err(|e| {
            error!("Failed to delete venue {}: {}", id, e);
            ApiError::internal("Error deleting venue", e)
        })?
        .ok_or_else(venue_not_found)?;

    discard_image(&state, &deleted.image).await;

    info!("Deleted venue {}", id);

    Ok(Json(serde_json::json!({
        "message": "Venue deleted successfully"
    })))
}

async fn discard_image(state: &AppState, image: &str) {
    if image.is_empty() {
        return;
    }
    if let Err(e) = state.image_store.remove(image).await {
        warn!("Failed to remove image {}: {}", image, e);
    }
}

/// All venues, newest first
pub async fn list_venues(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let venues = state.venue_repository.list_all().await.map_err(|e| {
        error!("Failed to list venues: {}", e);
        ApiError::internal("Error fetching venues", e)
    })?;

    Ok(Json(venues))
}

/// A single venue
pub async fn get_venue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_venue_id(&id)?;
    let venue = find_venue(&state, id).await?;

    Ok(Json(venue))
}

async fn load_owner_venues(state: &AppState, owner_contact: &str) -> ApiResult<Vec<Venue>> {
    if owner_contact.trim().is_empty() {
        return Err(ApiError::BadRequest("Owner contact is required".to_string()));
    }

    state
        .venue_repository
        .list_by_owner(owner_contact)
        .await
        .map_err(|e| {
            error!("Failed to list venues of {}: {}", owner_contact, e);
            ApiError::internal("Error fetching owner venues", e)
        })
}

/// Venues of one owner
pub async fn owner_venues(
    State(state): State<AppState>,
    Path(owner_contact): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let venues = load_owner_venues(&state, &owner_contact).await?;

    Ok(Json(OwnerVenuesResponse {
        message: format!("Found {} venues", venues.len()),
        venues,
        owner_contact,
    }))
}

/// Statistics over one owner's venues
pub async fn owner_stats(
    State(state): State<AppState>,
    Path(owner_contact): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let venues = load_owner_venues(&state, &owner_contact).await?;

    Ok(Json(OwnerStatsResponse {
        statistics: owner_statistics(&venues),
        owner_contact,
    }))
}
