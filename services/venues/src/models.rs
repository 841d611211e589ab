//! Venue models for request and response payloads

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Venue listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub location: String,
    pub price: f64,
    pub seating: i32,
    pub has_parking: bool,
    #[serde(rename = "hasAC")]
    pub has_ac: bool,
    pub has_catering: bool,
    /// Relative URL of the uploaded image, empty when none
    pub image: String,
    pub unavailable_dates: Vec<NaiveDate>,
    pub slug: String,
    pub owner_contact: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fully resolved venue fields, used for inserts and updates
#[derive(Debug, Clone, PartialEq)]
pub struct VenueRecord {
    pub title: String,
    pub category: String,
    pub location: String,
    pub price: f64,
    pub seating: i32,
    pub has_parking: bool,
    pub has_ac: bool,
    pub has_catering: bool,
    pub image: String,
    pub unavailable_dates: Vec<NaiveDate>,
    pub owner_contact: String,
}

/// Response for create and edit
#[derive(Debug, Serialize)]
pub struct VenueMessage {
    pub message: String,
    pub venue: Venue,
}

/// Response for owner-scoped listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerVenuesResponse {
    pub message: String,
    pub venues: Vec<Venue>,
    pub owner_contact: String,
}

/// Condensed venue entry inside owner statistics
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VenueDigest {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub price: f64,
    pub seating: i32,
    pub created_at: DateTime<Utc>,
}

/// Derived statistics over one owner's venues
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OwnerStatistics {
    pub total_venues: usize,
    pub total_seating: i64,
    pub average_price: f64,
    pub categories_count: BTreeMap<String, usize>,
    pub venues: Vec<VenueDigest>,
}

/// Response for owner statistics
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerStatsResponse {
    pub owner_contact: String,
    pub statistics: OwnerStatistics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_venue_wire_names() {
        let venue = Venue {
            id: Uuid::new_v4(),
            title: "Grand Hall".to_string(),
            category: "Banquet".to_string(),
            location: "Nairobi".to_string(),
            price: 25000.0,
            seating: 200,
            has_parking: true,
            has_ac: true,
            has_catering: false,
            image: "/uploads/hall.jpg".to_string(),
            unavailable_dates: vec![NaiveDate::from_ymd_opt(2099, 1, 2).unwrap()],
            slug: "grand-hall".to_string(),
            owner_contact: "9876543210".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&venue).unwrap();
        assert_eq!(json["_id"], venue.id.to_string());
        assert_eq!(json["hasAC"], true);
        assert_eq!(json["hasParking"], true);
        assert_eq!(json["ownerContact"], "9876543210");
        assert_eq!(json["unavailableDates"][0], "2099-01-02");

        let back: Venue = serde_json::from_value(json).unwrap();
        assert_eq!(back, venue);
    }
}
