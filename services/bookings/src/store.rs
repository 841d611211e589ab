//! Booking persistence

use chrono::NaiveDate;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::future::Future;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Booking, BookingFilter, BookingStatus, NewBooking};

/// Booking store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// A live booking already holds the venue on that day
    #[error("Venue already booked on this date")]
    SlotTaken,

    #[error("Corrupt booking row: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Booking store.
///
/// Implementations must refuse a second non-cancelled booking for the same
/// venue and day with [`StoreError::SlotTaken`].
pub trait BookingStore: Send + Sync {
    /// Insert a Pending booking with Pending payment
    fn insert(&self, booking: &NewBooking) -> impl Future<Output = StoreResult<Booking>> + Send;

    fn find_by_id(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<Booking>>> + Send;

    /// Whether a non-cancelled booking exists for the venue on that day
    fn has_active_booking(
        &self,
        venue: Uuid,
        date: NaiveDate,
    ) -> impl Future<Output = StoreResult<bool>> + Send;

    /// One page of matching bookings, newest first, with the total match count
    fn list(
        &self,
        filter: &BookingFilter,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = StoreResult<(Vec<Booking>, i64)>> + Send;

    fn set_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> impl Future<Output = StoreResult<Option<Booking>>> + Send;
}

const BOOKING_COLUMNS: &str =
    "id, user_id, venue_id, booking_date, status, payment_status, created_at, updated_at";

fn booking_from_row(row: &PgRow) -> StoreResult<Booking> {
    let status: String = row.get("status");
    let payment_status: String = row.get("payment_status");

    Ok(Booking {
        id: row.get("id"),
        user: row.get("user_id"),
        venue: row.get("venue_id"),
        date: row.get("booking_date"),
        status: status.parse().map_err(StoreError::Corrupt)?,
        payment_status: payment_status.parse().map_err(StoreError::Corrupt)?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// PostgreSQL booking store
#[derive(Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl BookingStore for PgBookingStore {
    fn insert(&self, booking: &NewBooking) -> impl Future<Output = StoreResult<Booking>> + Send {
        let pool = self.pool.clone();
        let booking = booking.clone();

        async move {
            let query = format!(
                r#"
                INSERT INTO bookings (user_id, venue_id, booking_date, status, payment_status)
                VALUES ($1, $2, $3, 'Pending', 'Pending')
                RETURNING {BOOKING_COLUMNS}
                "#
            );

            let result = sqlx::query(&query)
                .bind(booking.user)
                .bind(booking.venue)
                .bind(booking.date)
                .fetch_one(&pool)
                .await;

            match result {
                Ok(row) => booking_from_row(&row),
                Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                    Err(StoreError::SlotTaken)
                }
                Err(e) => Err(e.into()),
            }
        }
    }

    fn find_by_id(&self, id: Uuid) -> impl Future<Output = StoreResult<Option<Booking>>> + Send {
        let pool = self.pool.clone();

        async move {
            let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");

            let row = sqlx::query(&query).bind(id).fetch_optional(&pool).await?;

            row.as_ref().map(booking_from_row).transpose()
        }
    }

    fn has_active_booking(
        &self,
        venue: Uuid,
        date: NaiveDate,
    ) -> impl Future<Output = StoreResult<bool>> + Send {
        let pool = self.pool.clone();

        async move {
            let row = sqlx::query(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM bookings
                    WHERE venue_id = $1 AND booking_date = $2 AND status <> 'Cancelled'
                ) AS taken
                "#,
            )
            .bind(venue)
            .bind(date)
            .fetch_one(&pool)
            .await?;

            Ok(row.get("taken"))
        }
    }

    fn list(
        &self,
        filter: &BookingFilter,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = StoreResult<(Vec<Booking>, i64)>> + Send {
        let pool = self.pool.clone();
        let filter = filter.clone();

        async move {
            const WHERE: &str = r#"
                WHERE ($1::uuid IS NULL OR user_id = $1)
                  AND ($2::uuid[] IS NULL OR venue_id = ANY($2))
                  AND ($3::text IS NULL OR status = $3)
            "#;

            let status = filter.status.map(|s| s.as_str());

            let query = format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings {WHERE} ORDER BY created_at DESC LIMIT $4 OFFSET $5"
            );
            let rows = sqlx::query(&query)
                .bind(filter.user)
                .bind(filter.venues.as_deref())
                .bind(status)
                .bind(limit)
                .bind(offset)
                .fetch_all(&pool)
                .await?;

            let count_query = format!("SELECT COUNT(*) AS total FROM bookings {WHERE}");
            let total: i64 = sqlx::query(&count_query)
                .bind(filter.user)
                .bind(filter.venues.as_deref())
                .bind(status)
                .fetch_one(&pool)
                .await?
                .get("total");

            let bookings = rows
                .iter()
                .map(booking_from_row)
                .collect::<StoreResult<Vec<_>>>()?;

            Ok((bookings, total))
        }
    }

    fn set_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> impl Future<Output = StoreResult<Option<Booking>>> + Send {
        let pool = self.pool.clone();

        async move {
            let query = format!(
                r#"
                UPDATE bookings SET status = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING {BOOKING_COLUMNS}
                "#
            );

            let row = sqlx::query(&query)
                .bind(id)
                .bind(status.as_str())
                .fetch_optional(&pool)
                .await?;

            row.as_ref().map(booking_from_row).transpose()
        }
    }
}
