//! Owner statistics

use std::collections::BTreeMap;

use crate::models::{OwnerStatistics, Venue, VenueDigest};

/// Summarize one owner's venues
pub fn owner_statistics(venues: &[Venue]) -> OwnerStatistics {
    let total_venues = venues.len();
    let total_seating = venues.iter().map(|v| i64::from(v.seating)).sum();

    let average_price = if total_venues == 0 {
        0.0
    } else {
        let mean = venues.iter().map(|v| v.price).sum::<f64>() / total_venues as f64;
        (mean * 100.0).round() / 100.0
    };

    let mut categories_count = BTreeMap::new();
    for venue in venues {
        *categories_count.entry(venue.category.clone()).or_insert(0) += 1;
    }

    OwnerStatistics {
        total_venues,
        total_seating,
        average_price,
        categories_count,
        venues: venues
            .iter()
            .map(|v| VenueDigest {
                id: v.id,
                title: v.title.clone(),
                category: v.category.clone(),
                price: v.price,
                seating: v.seating,
                created_at: v.created_at,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn venue(category: &str, price: f64, seating: i32) -> Venue {
        Venue {
            id: Uuid::new_v4(),
            title: format!("{category} venue"),
            category: category.to_string(),
            location: "Pune".to_string(),
            price,
            seating,
            has_parking: false,
            has_ac: false,
            has_catering: false,
            image: String::new(),
            unavailable_dates: vec![],
            slug: Uuid::new_v4().to_string(),
            owner_contact: "9876543210".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_owner() {
        let stats = owner_statistics(&[]);
        assert_eq!(stats.total_venues, 0);
        assert_eq!(stats.total_seating, 0);
        assert_eq!(stats.average_price, 0.0);
        assert!(stats.categories_count.is_empty());
        assert!(stats.venues.is_empty());
    }

    #[test]
    fn test_totals_and_average() {
        let venues = vec![
            venue("Banquet", 100.0, 50),
            venue("Banquet", 200.0, 70),
            venue("Garden", 100.01, 30),
        ];

        let stats = owner_statistics(&venues);
        assert_eq!(stats.total_venues, 3);
        assert_eq!(stats.total_seating, 150);
        assert_eq!(stats.average_price, 133.34);
        assert_eq!(stats.categories_count["Banquet"], 2);
        assert_eq!(stats.categories_count["Garden"], 1);
        assert_eq!(stats.venues.len(), 3);
        assert_eq!(stats.venues[2].id, venues[2].id);
    }
}
