//! Venue form input
//!
//! Venue create and edit accept either `multipart/form-data` (with an
//! optional `image` file) or a JSON object. Both are flattened into string
//! fields and then coerced the same way.

use axum::{
    Json, async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use chrono::NaiveDate;
use common::{dates::parse_calendar_day, error::ApiError};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

use crate::models::{Venue, VenueRecord};

/// Uploaded image bytes with the client's file name
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

/// Raw venue input: string fields by name plus an optional image
#[derive(Debug, Default, Clone)]
pub struct VenueInput {
    fields: HashMap<String, Vec<String>>,
    pub image: Option<ImageUpload>,
}

#[async_trait]
impl<S> FromRequest<S> for VenueInput
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            return Self::from_multipart(multipart).await;
        }

        let Json(body) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        Self::from_json(body)
    }
}

impl VenueInput {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut input = VenueInput::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == "image" {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                if !bytes.is_empty() {
                    input.image = Some(ImageUpload { file_name, bytes });
                }
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            input.push(&name, text);
        }

        Ok(input)
    }

    fn from_json(body: Value) -> Result<Self, ApiError> {
        let Value::Object(map) = body else {
            return Err(ApiError::BadRequest(
                "Request body must be a JSON object".to_string(),
            ));
        };

        let mut input = VenueInput::default();
        for (name, value) in map {
            match value {
                Value::Null => {}
                Value::Array(items) if name == "unavailableDates" => {
                    input.push(&name, Value::Array(items).to_string());
                }
                Value::Array(items) => {
                    for item in items {
                        input.push(&name, json_scalar(item));
                    }
                }
                other => input.push(&name, json_scalar(other)),
            }
        }

        Ok(input)
    }

    #[cfg(test)]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut input = VenueInput::default();
        for (name, value) in pairs {
            input.push(name, value.to_string());
        }
        input
    }

    fn push(&mut self, name: &str, value: String) {
        self.fields.entry(name.to_string()).or_default().push(value);
    }

    /// First non-blank value of a field
    fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn flag(&self, name: &str) -> Option<bool> {
        self.text(name).map(|value| parse_bool(&value))
    }

    fn dates(&self) -> Option<Vec<NaiveDate>> {
        self.fields
            .get("unavailableDates")
            .map(|values| parse_dates(values))
    }

    /// Owner contact, which every create must carry
    pub fn owner_contact(&self) -> Option<String> {
        self.text("ownerContact")
    }

    /// Resolve the fields of a new venue; `image` is the stored image path
    pub fn into_new_record(self, image: String) -> Result<VenueRecord, ApiError> {
        let owner_contact = self
            .owner_contact()
            .ok_or_else(|| ApiError::BadRequest("Owner contact is required".to_string()))?;

        let required = |name: &str| {
            self.text(name)
                .ok_or_else(|| ApiError::BadRequest(format!("{} is required", capitalize(name))))
        };

        Ok(VenueRecord {
            title: required("title")?,
            category: required("category")?,
            location: required("location")?,
            price: coerce_price(self.text("price").as_deref()),
            seating: coerce_seating(self.text("seating").as_deref()),
            has_parking: self.flag("hasParking").unwrap_or(false),
            has_ac: self.flag("hasAC").unwrap_or(false),
            has_catering: self.flag("hasCatering").unwrap_or(false),
            image,
            unavailable_dates: self.dates().unwrap_or_default(),
            owner_contact,
        })
    }

    /// Merge the provided fields over a stored venue
    pub fn merge_into(&self, venue: &Venue, image: String) -> VenueRecord {
        let price = coerce_price(self.text("price").as_deref());
        let seating = coerce_seating(self.text("seating").as_deref());

        VenueRecord {
            title: self.text("title").unwrap_or_else(|| venue.title.clone()),
            category: self.text("category").unwrap_or_else(|| venue.category.clone()),
            location: self.text("location").unwrap_or_else(|| venue.location.clone()),
            price: if price > 0.0 { price } else { venue.price },
            seating: if seating > 0 { seating } else { venue.seating },
            has_parking: self.flag("hasParking").unwrap_or(venue.has_parking),
            has_ac: self.flag("hasAC").unwrap_or(venue.has_ac),
            has_catering: self.flag("hasCatering").unwrap_or(venue.has_catering),
            image,
            unavailable_dates: self
                .dates()
                .unwrap_or_else(|| venue.unavailable_dates.clone()),
            owner_contact: self
                .owner_contact()
                .unwrap_or_else(|| venue.owner_contact.clone()),
        }
    }
}

fn json_scalar(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Form booleans are true only for the literal `true`
pub fn parse_bool(value: &str) -> bool {
    value.trim() == "true"
}

/// Non-numeric and negative prices become 0
pub fn coerce_price(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(0.0)
}

/// Non-numeric and negative seat counts become 0; fractions are truncated
pub fn coerce_seating(value: Option<&str>) -> i32 {
    let seats = coerce_price(value).trunc();
    if seats >= i32::MAX as f64 {
        i32::MAX
    } else {
        seats as i32
    }
}

/// Parse unavailable dates from a JSON array string or one date per value
pub fn parse_dates(values: &[String]) -> Vec<NaiveDate> {
    let mut raw: Vec<String> = Vec::new();

    for value in values {
        let value = value.trim();
        if value.starts_with('[') {
            match serde_json::from_str::<Vec<Value>>(value) {
                Ok(items) => raw.extend(items.into_iter().map(json_scalar)),
                Err(e) => warn!("Invalid unavailableDates format {:?}: {}", value, e),
            }
        } else if !value.is_empty() {
            raw.push(value.to_string());
        }
    }

    let mut dates: Vec<NaiveDate> = raw
        .iter()
        .filter_map(|value| {
            let day = parse_calendar_day(value);
            if day.is_none() {
                warn!("Ignoring unparseable unavailable date {:?}", value);
            }
            day
        })
        .collect();

    dates.sort();
    dates.dedup();
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stored_venue() -> Venue {
        Venue {
            id: Uuid::new_v4(),
            title: "Grand Hall".to_string(),
            category: "Banquet".to_string(),
            location: "Pune".to_string(),
            price: 25000.0,
            seating: 200,
            has_parking: true,
            has_ac: false,
            has_catering: true,
            image: "/uploads/old.jpg".to_string(),
            unavailable_dates: vec![day(2099, 5, 1)],
            slug: "grand-hall".to_string(),
            owner_contact: "9876543210".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_record_coerces_fields() {
        let input = VenueInput::from_pairs([
            ("title", "Grand Hall"),
            ("category", "Banquet"),
            ("location", "Pune"),
            ("price", "-5"),
            ("seating", "abc"),
            ("hasParking", "true"),
            ("hasAC", "yes"),
            ("unavailableDates", r#"["2099-01-02T10:00:00.000Z", "2099-01-01"]"#),
            ("ownerContact", "9876543210"),
        ]);

        let record = input.into_new_record(String::new()).unwrap();
        assert_eq!(record.price, 0.0);
        assert_eq!(record.seating, 0);
        assert!(record.has_parking);
        assert!(!record.has_ac);
        assert!(!record.has_catering);
        assert_eq!(record.unavailable_dates, vec![day(2099, 1, 1), day(2099, 1, 2)]);
    }

    #[test]
    fn test_owner_contact_is_required() {
        let input = VenueInput::from_pairs([("title", "Grand Hall")]);
        match input.into_new_record(String::new()) {
            Err(ApiError::BadRequest(message)) => {
                assert_eq!(message, "Owner contact is required")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_title_is_required() {
        let input = VenueInput::from_pairs([("ownerContact", "1"), ("category", "c")]);
        assert!(matches!(
            input.into_new_record(String::new()),
            Err(ApiError::BadRequest(message)) if message == "Title is required"
        ));
    }

    #[test]
    fn test_invalid_date_list_becomes_empty() {
        assert!(parse_dates(&["[not json".to_string()]).is_empty());
        assert_eq!(
            parse_dates(&["2099-03-01".to_string(), "nope".to_string()]),
            vec![day(2099, 3, 1)]
        );
    }

    #[test]
    fn test_merge_keeps_stored_values() {
        let venue = stored_venue();
        let input = VenueInput::from_pairs([("price", "0"), ("location", " ")]);

        let record = input.merge_into(&venue, venue.image.clone());
        assert_eq!(record.price, 25000.0);
        assert_eq!(record.seating, 200);
        assert_eq!(record.location, "Pune");
        assert!(record.has_parking);
        assert_eq!(record.unavailable_dates, venue.unavailable_dates);
    }

    #[test]
    fn test_merge_applies_new_values() {
        let venue = stored_venue();
        let input = VenueInput::from_json(serde_json::json!({
            "title": "Grand Hall East",
            "price": 30000,
            "seating": "250",
            "hasParking": false,
            "unavailableDates": ["2099-06-01"],
        }))
        .unwrap();

        let record = input.merge_into(&venue, venue.image.clone());
        assert_eq!(record.title, "Grand Hall East");
        assert_eq!(record.price, 30000.0);
        assert_eq!(record.seating, 250);
        assert!(!record.has_parking);
        assert_eq!(record.unavailable_dates, vec![day(2099, 6, 1)]);
    }

    #[test]
    fn test_json_body_must_be_object() {
        assert!(VenueInput::from_json(serde_json::json!([1, 2])).is_err());
    }
}
