//! Calendar-day parsing shared by venues and bookings
//!
//! Venue unavailability and booking dates are compared by calendar day, so
//! every accepted input is reduced to a [`NaiveDate`] in UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse `YYYY-MM-DD`, an RFC 3339 timestamp or a naive `YYYY-MM-DDTHH:MM:SS`
/// timestamp into the UTC calendar day it falls on.
pub fn parse_calendar_day(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(input) {
        return Some(timestamp.with_timezone(&Utc).date_naive());
    }

    NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|timestamp| timestamp.date())
}

/// Today's calendar day in UTC
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_plain_date() {
        assert_eq!(parse_calendar_day("2099-01-01"), Some(day(2099, 1, 1)));
        assert_eq!(parse_calendar_day(" 2099-01-01 "), Some(day(2099, 1, 1)));
    }

    #[test]
    fn test_timestamps_reduce_to_their_day() {
        assert_eq!(
            parse_calendar_day("2099-01-01T18:30:00.000Z"),
            Some(day(2099, 1, 1))
        );
        assert_eq!(
            parse_calendar_day("2099-01-01T00:00:01+00:00"),
            Some(day(2099, 1, 1))
        );
        assert_eq!(
            parse_calendar_day("2099-01-01T23:59:59"),
            Some(day(2099, 1, 1))
        );
    }

    #[test]
    fn test_offsets_are_normalized_to_utc() {
        assert_eq!(
            parse_calendar_day("2099-01-02T01:00:00+05:00"),
            Some(day(2099, 1, 1))
        );
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert_eq!(parse_calendar_day(""), None);
        assert_eq!(parse_calendar_day("tomorrow"), None);
        assert_eq!(parse_calendar_day("2099-13-40"), None);
    }
}
