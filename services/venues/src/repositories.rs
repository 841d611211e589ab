//! Repositories for database operations

use anyhow::Result;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::models::{Venue, VenueRecord};

const VENUE_COLUMNS: &str = r#"
    id, title, category, location, price, seating, has_parking, has_ac,
    has_catering, image, unavailable_dates, slug, owner_contact, created_at, updated_at
"#;

fn venue_from_row(row: &PgRow) -> Venue {
    Venue {
        id: row.get("id"),
        title: row.get("title"),
        category: row.get("category"),
        location: row.get("location"),
        price: row.get("price"),
        seating: row.get("seating"),
        has_parking: row.get("has_parking"),
        has_ac: row.get("has_ac"),
        has_catering: row.get("has_catering"),
        image: row.get("image"),
        unavailable_dates: row.get("unavailable_dates"),
        slug: row.get("slug"),
        owner_contact: row.get("owner_contact"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Whether an error is a unique-constraint violation
pub fn is_unique_violation(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|e| e.is_unique_violation())
}

/// Venue repository for database operations
#[derive(Clone)]
pub struct VenueRepository {
    pool: PgPool,
}

impl VenueRepository {
    /// Create a new venue repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a venue under the given slug
    pub async fn create(&self, record: &VenueRecord, slug: &str) -> Result<Venue> {
        let query = format!(
            r#"
            INSERT INTO venues (title, category, location, price, seating, has_parking,
                has_ac, has_catering, image, unavailable_dates, slug, owner_contact)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {VENUE_COLUMNS}
            "#
        );

        let row = sqlx::query(&query)
            .bind(&record.title)
            .bind(&record.category)
            .bind(&record.location)
            .bind(record.price)
            .bind(record.seating)
            .bind(record.has_parking)
            .bind(record.has_ac)
            .bind(record.has_catering)
            .bind(&record.image)
            .bind(&record.unavailable_dates)
            .bind(slug)
            .bind(&record.owner_contact)
            .fetch_one(&self.pool)
            .await?;

        Ok(venue_from_row(&row))
    }

    /// Find a venue by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Venue>> {
        let query = format!("SELECT {VENUE_COLUMNS} FROM venues WHERE id = $1");

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(venue_from_row))
    }

    /// All venues, newest first
    pub async fn list_all(&self) -> Result<Vec<Venue>> {
        let query = format!("SELECT {VENUE_COLUMNS} FROM venues ORDER BY created_at DESC");

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(venue_from_row).collect())
    }

    /// Venues of one owner, newest first
    pub async fn list_by_owner(&self, owner_contact: &str) -> Result<Vec<Venue>> {
        let query = format!(
            "SELECT {VENUE_COLUMNS} FROM venues WHERE owner_contact = $1 ORDER BY created_at DESC"
        );

        let rows = sqlx::query(&query)
            .bind(owner_contact)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(venue_from_row).collect())
    }

    /// Whether a slug is already in use
    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM venues WHERE slug = $1) AS taken")
            .bind(slug)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("taken"))
    }

    /// Replace a venue's fields; the slug is kept
    pub async fn update(&self, id: Uuid, record: &VenueRecord) -> Result<Option<Venue>> {
        let query = format!(
            r#"
            UPDATE venues
            SET title = $2, category = $3, location = $4, price = $5, seating = $6,
                has_parking = $7, has_ac = $8, has_catering = $9, image = $10,
                unavailable_dates = $11, owner_contact = $12, updated_at = NOW()
            WHERE id = $1
            RETURNING {VENUE_COLUMNS}
            "#
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(&record.title)
            .bind(&record.category)
            .bind(&record.location)
            .bind(record.price)
            .bind(record.seating)
            .bind(record.has_parking)
            .bind(record.has_ac)
            .bind(record.has_catering)
            .bind(&record.image)
            .bind(&record.unavailable_dates)
            .bind(&record.owner_contact)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(venue_from_row))
    }

    /// Delete a venue, returning the removed row
    pub async fn delete(&self, id: Uuid) -> Result<Option<Venue>> {
        let query = format!("DELETE FROM venues WHERE id = $1 RETURNING {VENUE_COLUMNS}");

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(venue_from_row))
    }
}
