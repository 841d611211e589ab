//! In-memory store and venue directory for tests

use chrono::{NaiveDate, Utc};
use serde_json::{Map, json};
use std::{
    collections::HashMap,
    future::{Future, ready},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};
use uuid::Uuid;

use crate::{
    directory::{DirectoryError, VenueDirectory},
    models::{Booking, BookingFilter, BookingStatus, NewBooking, PaymentStatus, RemoteVenue},
    store::{BookingStore, StoreError, StoreResult},
};

/// Venue priced 25000 with 200 seats owned by `contact`
pub fn venue(contact: &str, unavailable_dates: &[&str]) -> RemoteVenue {
    let mut rest = Map::new();
    rest.insert("title".to_string(), json!("Grand Hall"));
    rest.insert("price".to_string(), json!(25000));
    rest.insert("seating".to_string(), json!(200));

    RemoteVenue {
        id: Uuid::new_v4(),
        owner_contact: contact.to_string(),
        unavailable_dates: unavailable_dates.iter().map(|d| d.to_string()).collect(),
        rest,
    }
}

/// Bookings in insertion order; the slot rule mirrors the partial unique index
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingStore {
    bookings: Arc<Mutex<Vec<Booking>>>,
    skip_conflict_check: Arc<AtomicBool>,
}

impl InMemoryBookingStore {
    /// Make `has_active_booking` always answer false, as if a concurrent
    /// insert landed after the check
    pub fn fail_conflict_check(&self) {
        self.skip_conflict_check.store(true, Ordering::SeqCst);
    }

    /// Insert a booking directly, bypassing every rule
    pub fn seed(&self, user: Uuid, venue: Uuid, date: NaiveDate) -> Uuid {
        let booking = new_booking(&NewBooking { user, venue, date });
        let id = booking.id;
        self.bookings.lock().unwrap().push(booking);
        id
    }

    fn insert_now(&self, booking: &NewBooking) -> StoreResult<Booking> {
        let mut bookings = self.bookings.lock().unwrap();
        let taken = bookings.iter().any(|b| {
            b.venue == booking.venue && b.date == booking.date && b.status != BookingStatus::Cancelled
        });
        if taken {
            return Err(StoreError::SlotTaken);
        }

        let booking = new_booking(booking);
        bookings.push(booking.clone());
        Ok(booking)
    }

    fn list_now(&self, filter: &BookingFilter, limit: i64, offset: i64) -> (Vec<Booking>, i64) {
        let bookings = self.bookings.lock().unwrap();
        let matching: Vec<Booking> = bookings
            .iter()
            .rev()
            .filter(|b| filter.user.is_none_or(|user| b.user == user))
            .filter(|b| {
                filter
                    .venues
                    .as_ref()
                    .is_none_or(|venues| venues.contains(&b.venue))
            })
            .filter(|b| filter.status.is_none_or(|status| b.status == status))
            .cloned()
            .collect();

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        (page, total)
    }

    fn set_status_now(&self, id: Uuid, status: BookingStatus) -> Option<Booking> {
        let mut bookings = self.bookings.lock().unwrap();
        let booking = bookings.iter_mut().find(|b| b.id == id)?;
        booking.status = status;
        booking.updated_at = Utc::now();
        Some(booking.clone())
    }
}

fn new_booking(booking: &NewBooking) -> Booking {
    let now = Utc::now();
    Booking {
        id: Uuid::new_v4(),
        user: booking.user,
        venue: booking.venue,
        date: booking.date,
        status: BookingStatus::Pending,
        payment_status: PaymentStatus::Pending,
        created_at: now,
        updated_at: now,
    }
}

impl BookingStore for InMemoryBookingStore {
    fn insert(&self, booking: &NewBooking) -> impl Future<Output = StoreResult<Booking>> + Send {
        ready(self.insert_now(booking))
    }

    fn find_by_id(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<Booking>>> + Send {
        let found = self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id)
            .cloned();
        ready(Ok(found))
    }

    fn has_active_booking(
        &self,
        venue: Uuid,
        date: NaiveDate,
    ) -> impl Future<Output = StoreResult<bool>> + Send {
        let taken = !self.skip_conflict_check.load(Ordering::SeqCst)
            && self.bookings.lock().unwrap().iter().any(|b| {
                b.venue == venue && b.date == date && b.status != BookingStatus::Cancelled
            });
        ready(Ok(taken))
    }

    fn list(
        &self,
        filter: &BookingFilter,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = StoreResult<(Vec<Booking>, i64)>> + Send {
        ready(Ok(self.list_now(filter, limit, offset)))
    }

    fn set_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> impl Future<Output = StoreResult<Option<Booking>>> + Send {
        ready(Ok(self.set_status_now(id, status)))
    }
}

/// Fixed set of venues that can be switched offline
#[derive(Debug, Clone, Default)]
pub struct StaticVenueDirectory {
    venues: Arc<HashMap<Uuid, RemoteVenue>>,
    unreachable: Arc<AtomicBool>,
}

impl StaticVenueDirectory {
    pub fn new(venues: Vec<RemoteVenue>) -> Self {
        Self {
            venues: Arc::new(venues.into_iter().map(|v| (v.id, v)).collect()),
            unreachable: Arc::default(),
        }
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<(), DirectoryError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(DirectoryError::Status(
                reqwest::StatusCode::SERVICE_UNAVAILABLE,
            ));
        }
        Ok(())
    }
}

impl VenueDirectory for StaticVenueDirectory {
    fn fetch_venue(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<RemoteVenue>, DirectoryError>> + Send {
        let result = self
            .check_reachable()
            .map(|_| self.venues.get(&id).cloned());
        ready(result)
    }

    fn venues_by_owner(
        &self,
        contact: &str,
    ) -> impl Future<Output = Result<Vec<RemoteVenue>, DirectoryError>> + Send {
        let result = self.check_reachable().map(|_| {
            self.venues
                .values()
                .filter(|v| v.owner_contact == contact)
                .cloned()
                .collect()
        });
        ready(result)
    }
}
