//! Booking models for request and response payloads

use chrono::{DateTime, NaiveDate, Utc};
use common::{dates::parse_calendar_day, jwt::Role};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Booking lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    /// Allowed moves: Pending to Confirmed or Cancelled, Confirmed to Cancelled
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(BookingStatus::Pending),
            "Confirmed" => Ok(BookingStatus::Confirmed),
            "Cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("Invalid booking status: {}", other)),
        }
    }
}

/// Payment state; bookings start Pending and nothing in this service settles them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Paid,
    Pending,
    Failed,
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Paid" => Ok(PaymentStatus::Paid),
            "Pending" => Ok(PaymentStatus::Pending),
            "Failed" => Ok(PaymentStatus::Failed),
            other => Err(format!("Invalid payment status: {}", other)),
        }
    }
}

/// Stored booking
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub user: Uuid,
    pub venue: Uuid,
    pub date: NaiveDate,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking to insert
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user: Uuid,
    pub venue: Uuid,
    pub date: NaiveDate,
}

/// Venue as returned by the venues service
///
/// Only the fields this service reasons about are typed; everything else is
/// passed through untouched to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteVenue {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(default)]
    pub owner_contact: String,
    #[serde(default)]
    pub unavailable_dates: Vec<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl RemoteVenue {
    /// Whether the venue blocks the given calendar day
    pub fn is_unavailable_on(&self, day: NaiveDate) -> bool {
        self.unavailable_dates
            .iter()
            .filter_map(|d| parse_calendar_day(d))
            .any(|d| d == day)
    }
}

/// Venues service owner listing
#[derive(Debug, Deserialize)]
pub struct OwnerVenues {
    #[serde(default)]
    pub venues: Vec<RemoteVenue>,
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: Option<String>,
    pub email: Option<String>,
    /// Known only when the users service vouched for the token
    pub contact: Option<String>,
    pub role: Role,
}

impl AuthUser {
    pub fn is_venue_owner(&self) -> bool {
        self.role == Role::VenueOwner
    }

    /// Whether the caller's contact matches a venue's owner contact
    pub fn owns(&self, venue: &RemoteVenue) -> bool {
        self.is_venue_owner()
            && self
                .contact
                .as_deref()
                .is_some_and(|contact| contact == venue.owner_contact)
    }
}

/// Profile payload from the users service
#[derive(Debug, Deserialize)]
pub struct RemoteProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub contact: String,
    #[serde(default)]
    pub role: Role,
}

impl From<RemoteProfile> for AuthUser {
    fn from(profile: RemoteProfile) -> Self {
        Self {
            id: profile.id,
            username: Some(profile.username),
            email: Some(profile.email),
            contact: Some(profile.contact),
            role: profile.role,
        }
    }
}

/// Create booking request
#[derive(Debug, Default, Deserialize)]
pub struct CreateBookingRequest {
    pub venue: Option<String>,
    pub date: Option<String>,
}

/// Set status request
///
/// Read leniently: a missing body, malformed JSON or a non-string `status`
/// all become `None` so ownership is checked before the value is judged.
#[derive(Debug, Default, PartialEq)]
pub struct StatusRequest {
    pub status: Option<String>,
}

impl StatusRequest {
    pub fn from_body(body: &[u8]) -> Self {
        let status = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|body| body.get("status").and_then(Value::as_str).map(str::to_string));
        Self { status }
    }
}

/// Listing query; malformed values fall back to defaults
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListQuery {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    /// Status filter, ignored unless it names a known status
    pub fn status(&self) -> Option<BookingStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .as_deref()
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| *l >= 1)
            .map(|l| l.min(Self::MAX_LIMIT))
            .unwrap_or(Self::DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

/// Store-level listing filter
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub user: Option<Uuid>,
    /// Restrict to these venues when set
    pub venues: Option<Vec<Uuid>>,
    pub status: Option<BookingStatus>,
}

/// User reference inside a booking view
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum BookingUser {
    Id(Uuid),
    Summary {
        #[serde(rename = "_id")]
        id: Uuid,
        username: Option<String>,
        email: Option<String>,
    },
}

/// Booking with its venue attached
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: BookingUser,
    /// Null when the venues service could not supply it
    pub venue: Option<RemoteVenue>,
    pub date: NaiveDate,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingView {
    pub fn new(booking: Booking, venue: Option<RemoteVenue>) -> Self {
        Self {
            id: booking.id,
            user: BookingUser::Id(booking.user),
            venue,
            date: booking.date,
            status: booking.status,
            payment_status: booking.payment_status,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

/// Pagination block of list responses
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current: i64,
    /// Number of pages
    pub total: i64,
    pub count: usize,
    pub total_bookings: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, count: usize, total_bookings: i64) -> Self {
        Self {
            current: page,
            total: (total_bookings + limit - 1) / limit,
            count,
            total_bookings,
        }
    }
}

/// Caller summary on the caller's own listing
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CallerSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: Option<String>,
    pub role: Role,
}

/// One page of bookings
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookingPage {
    pub success: bool,
    pub data: Vec<BookingView>,
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<CallerSummary>,
}

/// Successful single-booking response
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookingEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: BookingView,
}

impl BookingEnvelope {
    pub fn new(message: Option<String>, data: BookingView) -> Self {
        Self {
            success: true,
            message,
            data,
        }
    }
}
