// crates/timeline-core/src/geo.rs

//! # Geo Parsing Utilities
//!
//! Coordinate strings, fixed-point (E7) values, coordinate keys,
//! great-circle distance and timestamp handling shared by every extractor.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mean Earth radius used by [`haversine_km`].
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Scale of fixed-point coordinates (`latitudeE7`, `longitudeE7`).
pub const E7_SCALE: f64 = 1e7;

/// Decimal places kept in a [`coord_key`].
pub const COORD_KEY_DECIMALS: i32 = 4;

/// A finite latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Returns `None` unless both components are finite.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        (lat.is_finite() && lng.is_finite()).then_some(Self { lat, lng })
    }

    pub fn key(&self) -> String {
        coord_key(self.lat, self.lng)
    }
}

/// Parses a free-form geo value.
///
/// Accepts either a string or an object carrying a `latLng` string:
/// - `"geo:12.34,-56.78"` (scheme is case-insensitive)
/// - `"12.34°,-56.78°"`
/// - `{ "latLng": "12.34, -56.78" }`
///
/// Returns `None` for anything that does not split into exactly two finite
/// numbers.
pub fn parse_geo_value(input: &Value) -> Option<LatLng> {
    match input {
        Value::String(s) => parse_geo_str(s),
        Value::Object(_) => crate::alias::lookup_str(input, &crate::alias::LAT_LNG)
            .and_then(parse_geo_str),
        _ => None,
    }
}

/// String form of [`parse_geo_value`].
pub fn parse_geo_str(input: &str) -> Option<LatLng> {
    let mut s = input.trim();
    if s.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("geo:")) {
        s = &s[4..];
    }
    let cleaned = s.replace('\u{00b0}', "");

    let mut parts = cleaned.split(',');
    let lat = parse_token(parts.next()?)?;
    let lng = parse_token(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    LatLng::new(lat, lng)
}

fn parse_token(token: &str) -> Option<f64> {
    token.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Converts a fixed-point E7 JSON number to degrees.
///
/// Only JSON numbers are accepted; strings and nulls yield `None`.
pub fn e7_to_deg(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .map(|v| v / E7_SCALE)
        .filter(|v| v.is_finite())
}

/// Rounds half-up (toward positive infinity) to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    // `+ 0.0` folds negative zero so keys never print as "-0".
    (value * factor + 0.5).floor() / factor + 0.0
}

/// The `"lat,lng"` key used for place fallback ids and the locality cache.
pub fn coord_key(lat: f64, lng: f64) -> String {
    format!(
        "{},{}",
        round_to(lat, COORD_KEY_DECIMALS),
        round_to(lng, COORD_KEY_DECIMALS)
    )
}

/// Great-circle distance in kilometres.
pub fn haversine_km(a: &LatLng, b: &LatLng) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let s = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * s.sqrt().min(1.0).asin()
}

/// Parses an ISO-8601 timestamp.
///
/// RFC 3339 is tried first. Timestamps without an offset are read as UTC,
/// and a bare date resolves to midnight UTC.
pub fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Dwell seconds between two timestamps.
///
/// `0.0` unless both parse and `end` is strictly after `start`.
pub fn duration_seconds(start: Option<&str>, end: Option<&str>) -> f64 {
    match (start.and_then(parse_iso), end.and_then(parse_iso)) {
        (Some(s), Some(e)) if e > s => (e - s).num_milliseconds() as f64 / 1000.0,
        _ => 0.0,
    }
}

/// Renders a millisecond epoch as `YYYY-MM-DDTHH:MM:SS.sssZ`.
pub fn epoch_ms_to_iso(ms: i64) -> Option<String> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}
