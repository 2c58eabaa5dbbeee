// crates/timeline-core/src/extract/records.rs

//! Takeout raw location records (`locations`).
//!
//! Records become [`RawPoint`]s only; stays are produced by
//! [`crate::cluster::cluster_stays`].

use crate::alias::{self, lookup, lookup_f64, lookup_str, owned_str};
use crate::geo::{epoch_ms_to_iso, LatLng, E7_SCALE};
use crate::model::RawPoint;
use serde_json::Value;
use tracing::debug;

/// Reads every record with E7 coordinates and a timestamp.
///
/// The result is sorted ascending by its ISO timestamp string.
pub fn extract_points(docs: &[Value]) -> Vec<RawPoint> {
    let mut points = Vec::new();
    let mut dropped = 0usize;

    let records = docs
        .iter()
        .filter_map(|doc| doc.get("locations").and_then(Value::as_array))
        .flatten();

    for rec in records {
        match record_point(rec) {
            Some(p) => points.push(p),
            None => dropped += 1,
        }
    }

    points.sort_by(|a, b| a.ts.cmp(&b.ts));
    debug!(points = points.len(), dropped, "location records extracted");
    points
}

fn record_point(rec: &Value) -> Option<RawPoint> {
    let lat = lookup_f64(rec, &alias::LAT_E7)? / E7_SCALE;
    let lng = lookup_f64(rec, &alias::LNG_E7)? / E7_SCALE;
    let pos = LatLng::new(lat, lng)?;
    let ts = record_timestamp(rec)?;

    Some(RawPoint {
        lat: pos.lat,
        lng: pos.lng,
        ts,
        place_id: owned_str(rec, "placeId"),
    })
}

/// Direct ISO `timestamp`, else `timestampMs` (string or number) as ISO.
fn record_timestamp(rec: &Value) -> Option<String> {
    if let Some(ts) = lookup_str(rec, &alias::TIMESTAMP) {
        return Some(ts.to_owned());
    }
    let ms = match lookup(rec, &alias::TIMESTAMP_MS)? {
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        _ => return None,
    };
    epoch_ms_to_iso(ms)
}
