//! Booking operations
//!
//! Every operation takes the authenticated caller and returns either a
//! response payload or an [`ApiError`] carrying the client-facing message.

use common::{
    dates::{parse_calendar_day, today},
    error::{ApiError, ApiResult},
};
use futures_util::future::join_all;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    directory::VenueDirectory,
    models::{
        AuthUser, Booking, BookingEnvelope, BookingFilter, BookingPage, BookingStatus,
        BookingUser, BookingView, CallerSummary, CreateBookingRequest, ListQuery, NewBooking,
        Pagination, RemoteVenue,
    },
    store::{BookingStore, StoreError},
};

fn already_booked() -> ApiError {
    ApiError::BadRequest("Venue already booked on this date".to_string())
}

fn booking_not_found() -> ApiError {
    ApiError::NotFound("Booking not found".to_string())
}

fn parse_booking_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| ApiError::BadRequest("Invalid booking ID format".to_string()))
}

/// Booking orchestration over a store and the venue directory
pub struct BookingService<S, D> {
    store: S,
    directory: D,
}

impl<S, D> BookingService<S, D>
where
    S: BookingStore,
    D: VenueDirectory,
{
    pub fn new(store: S, directory: D) -> Self {
        Self { store, directory }
    }

    /// Venue for a read path; lookup failures become `None`
    async fn venue_or_none(&self, id: Uuid) -> Option<RemoteVenue> {
        match self.directory.fetch_venue(id).await {
            Ok(venue) => venue,
            Err(e) => {
                warn!("Failed to fetch venue {}: {}", id, e);
                None
            }
        }
    }

    async fn enrich(&self, bookings: Vec<Booking>) -> Vec<BookingView> {
        join_all(bookings.into_iter().map(|booking| async move {
            let venue = self.venue_or_none(booking.venue).await;
            BookingView::new(booking, venue)
        }))
        .await
    }

    async fn load(&self, id: &str, context: &'static str) -> ApiResult<Booking> {
        let id = parse_booking_id(id)?;
        self.store
            .find_by_id(id)
            .await
            .map_err(|e| {
                error!("Failed to load booking {}: {}", id, e);
                ApiError::internal(context, e)
            })?
            .ok_or_else(booking_not_found)
    }

    /// Book a venue for a calendar day
    pub async fn create(
        &self,
        user: &AuthUser,
        request: CreateBookingRequest,
    ) -> ApiResult<BookingEnvelope> {
        let (Some(venue_id), Some(date)) = (
            request.venue.filter(|v| !v.trim().is_empty()),
            request.date.filter(|d| !d.trim().is_empty()),
        ) else {
            return Err(ApiError::BadRequest(
                "Venue and date are required".to_string(),
            ));
        };

        let venue_id = Uuid::parse_str(venue_id.trim())
            .map_err(|_| ApiError::BadRequest("Invalid venue ID format".to_string()))?;

        let venue = self
            .directory
            .fetch_venue(venue_id)
            .await
            .map_err(|e| {
                error!("Error creating booking: {}", e);
                ApiError::internal("Error creating booking", e)
            })?
            .ok_or_else(|| ApiError::NotFound("Venue not found".to_string()))?;

        let date = parse_calendar_day(&date)
            .filter(|day| *day >= today())
            .ok_or_else(|| ApiError::BadRequest("Invalid or past date".to_string()))?;

        if venue.is_unavailable_on(date) {
            return Err(ApiError::BadRequest(
                "Venue unavailable on this date".to_string(),
            ));
        }

        let taken = self
            .store
            .has_active_booking(venue_id, date)
            .await
            .map_err(|e| ApiError::internal("Error creating booking", e))?;
        if taken {
            return Err(already_booked());
        }

        let booking = self
            .store
            .insert(&NewBooking {
                user: user.id,
                venue: venue_id,
                date,
            })
            .await
            .map_err(|e| match e {
                StoreError::SlotTaken => already_booked(),
                e => {
                    error!("Error creating booking: {}", e);
                    ApiError::internal("Error creating booking", e)
                }
            })?;

        info!("Booking {} created for venue {} on {}", booking.id, venue_id, date);

        let mut view = BookingView::new(booking, Some(venue));
        view.user = BookingUser::Summary {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        };

        Ok(BookingEnvelope::new(
            Some("Booking created successfully".to_string()),
            view,
        ))
    }

    /// The caller's own bookings
    pub async fn list(&self, user: &AuthUser, query: &ListQuery) -> ApiResult<BookingPage> {
        let filter = BookingFilter {
            user: Some(user.id),
            venues: None,
            status: query.status(),
        };

        let (bookings, total) = self
            .store
            .list(&filter, query.limit(), query.offset())
            .await
            .map_err(|e| {
                error!("Error fetching bookings: {}", e);
                ApiError::internal("Error fetching bookings", e)
            })?;

        let data = self.enrich(bookings).await;

        Ok(BookingPage {
            success: true,
            pagination: Pagination::new(query.page(), query.limit(), data.len(), total),
            data,
            user: Some(CallerSummary {
                id: user.id,
                username: user.username.clone(),
                role: user.role,
            }),
        })
    }

    /// A booking visible to its user or to the owner of its venue
    pub async fn get(&self, user: &AuthUser, id: &str) -> ApiResult<BookingEnvelope> {
        let booking = self.load(id, "Error fetching booking details").await?;
        let venue = self.venue_or_none(booking.venue).await;

        let is_booker = booking.user == user.id;
        let is_venue_owner = venue.as_ref().is_some_and(|v| user.owns(v));
        if !is_booker && !is_venue_owner {
            return Err(ApiError::Forbidden(
                "You are not authorized to view this booking".to_string(),
            ));
        }

        Ok(BookingEnvelope::new(None, BookingView::new(booking, venue)))
    }

    /// Cancel one of the caller's bookings
    pub async fn cancel(&self, user: &AuthUser, id: &str) -> ApiResult<BookingEnvelope> {
        let booking = self.load(id, "Error cancelling booking").await?;

        if booking.user != user.id {
            return Err(ApiError::Forbidden(
                "You are not authorized to cancel this booking".to_string(),
            ));
        }

        if booking.status == BookingStatus::Cancelled {
            return Err(ApiError::BadRequest(
                "Booking is already cancelled".to_string(),
            ));
        }

        if booking.date < today() {
            return Err(ApiError::BadRequest(
                "Cannot cancel past bookings".to_string(),
            ));
        }

        let cancelled = self
            .store
            .set_status(booking.id, BookingStatus::Cancelled)
            .await
            .map_err(|e| {
                error!("Error cancelling booking {}: {}", booking.id, e);
                ApiError::internal("Error cancelling booking", e)
            })?
            .ok_or_else(booking_not_found)?;

        info!("Booking {} cancelled by {}", cancelled.id, user.id);

        let venue = self.venue_or_none(cancelled.venue).await;
        Ok(BookingEnvelope::new(
            Some("Booking cancelled successfully".to_string()),
            BookingView::new(cancelled, venue),
        ))
    }

    /// Move a booking to another status on behalf of the venue's owner
    pub async fn set_status(
        &self,
        user: &AuthUser,
        id: &str,
        status: Option<&str>,
    ) -> ApiResult<BookingEnvelope> {
        if !user.is_venue_owner() {
            return Err(ApiError::Forbidden(
                "Only venue owners can update booking status".to_string(),
            ));
        }

        let booking = self.load(id, "Error updating booking status").await?;

        let venue = self.venue_or_none(booking.venue).await;
        let Some(venue) = venue.filter(|v| user.owns(v)) else {
            return Err(ApiError::Forbidden(
                "You can only update bookings for your own venues".to_string(),
            ));
        };

        let next: BookingStatus = status.and_then(|s| s.parse().ok()).ok_or_else(|| {
            ApiError::BadRequest(
                "Invalid status. Must be: Pending, Confirmed, or Cancelled".to_string(),
            )
        })?;

        if !booking.status.can_transition_to(next) {
            return Err(ApiError::BadRequest(format!(
                "Cannot change booking status from {} to {}",
                booking.status, next
            )));
        }

        let updated = self
            .store
            .set_status(booking.id, next)
            .await
            .map_err(|e| {
                error!("Error updating booking status {}: {}", booking.id, e);
                ApiError::internal("Error updating booking status", e)
            })?
            .ok_or_else(booking_not_found)?;

        info!(
            "Booking {} moved from {} to {} by {}",
            updated.id, booking.status, next, user.id
        );

        Ok(BookingEnvelope::new(
            Some(format!("Booking status updated to {} successfully", next)),
            BookingView::new(updated, Some(venue)),
        ))
    }

    /// Bookings on the venues the caller owns
    pub async fn owner_bookings(
        &self,
        user: &AuthUser,
        query: &ListQuery,
    ) -> ApiResult<BookingPage> {
        if !user.is_venue_owner() {
            return Err(ApiError::Forbidden(
                "Only venue owners can access this endpoint".to_string(),
            ));
        }

        let venue_ids: Vec<Uuid> = match user.contact.as_deref() {
            Some(contact) => self
                .directory
                .venues_by_owner(contact)
                .await
                .map_err(|e| {
                    error!("Error fetching owner venues: {}", e);
                    ApiError::internal("Error fetching venue bookings", e)
                })?
                .into_iter()
                .map(|v| v.id)
                .collect(),
            None => Vec::new(),
        };

        let (bookings, total) = if venue_ids.is_empty() {
            (Vec::new(), 0)
        } else {
            let filter = BookingFilter {
                user: None,
                venues: Some(venue_ids),
                status: query.status(),
            };
            self.store
                .list(&filter, query.limit(), query.offset())
                .await
                .map_err(|e| {
                    error!("Error fetching venue bookings: {}", e);
                    ApiError::internal("Error fetching venue bookings", e)
                })?
        };

        let data = self.enrich(bookings).await;

        Ok(BookingPage {
            success: true,
            pagination: Pagination::new(query.page(), query.limit(), data.len(), total),
            data,
            user: None,
        })
    }
}
