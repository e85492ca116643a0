//! Shared parsing utilities for raw feed records.
//!
//! Socrata returns every column as a JSON string, but other feeds send
//! numbers, so coordinate parsing accepts both.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use safepath_spatial::Coordinate;

/// Parses a Socrata datetime string (ISO 8601 with optional fractional seconds).
#[must_use]
pub fn parse_socrata_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

/// Parses a date column and, when present, overlays a separate
/// time-of-day column onto it.
#[must_use]
pub fn parse_date_and_time(date: &str, time: Option<&str>) -> Option<DateTime<Utc>> {
    let parsed = parse_socrata_date(date)?;
    if let Some(time_str) = time
        && let Ok(time) = time_str.trim().parse::<NaiveTime>()
    {
        return Some(NaiveDateTime::new(parsed.date_naive(), time).and_utc());
    }
    Some(parsed)
}

/// Reads a numeric value from a JSON string or number.
#[must_use]
pub fn parse_f64_value(value: Option<&serde_json::Value>) -> Option<f64> {
    let parsed = match value? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Parses a coordinate from raw latitude/longitude values. Returns `None`
/// if either is missing, unparseable, zero, or out of range.
#[must_use]
pub fn parse_coordinate(
    lat: Option<&serde_json::Value>,
    lng: Option<&serde_json::Value>,
) -> Option<Coordinate> {
    let latitude = parse_f64_value(lat)?;
    let longitude = parse_f64_value(lng)?;
    if latitude == 0.0 || longitude == 0.0 {
        return None;
    }
    let coordinate = Coordinate::new(latitude, longitude);
    coordinate.is_valid().then_some(coordinate)
}

/// Reads a non-empty, trimmed string from a JSON value. Numbers are
/// rendered as strings so numeric IDs survive.
#[must_use]
pub fn non_empty_str(value: Option<&serde_json::Value>) -> Option<String> {
    let s = match value? {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}
