// crates/timeline-core/src/extract/device.rs

//! On-device timeline exports (array or `semanticSegments` object form).
//!
//! Only segments whose `visit` has a `topCandidate` with a parseable
//! `placeLocation` become visits. Activity and path segments are skipped.

use crate::alias::{self, lookup_str};
use crate::geo::{duration_seconds, parse_geo_value};
use crate::model::{Visit, VisitKind};
use serde_json::Value;
use tracing::debug;

/// Label used when a candidate carries no semantic type.
pub const UNKNOWN_LABEL: &str = "Unknown";

pub fn extract(docs: &[Value]) -> Vec<Visit> {
    let mut out = Vec::new();
    let mut skipped = 0usize;

    for doc in docs {
        for seg in segments(doc) {
            match segment_visit(seg) {
                Some(v) => out.push(v),
                None => skipped += 1,
            }
        }
    }

    debug!(visits = out.len(), skipped, "device export extracted");
    out
}

fn segments(doc: &Value) -> &[Value] {
    let list = if doc.is_array() {
        Some(doc)
    } else {
        doc.get("semanticSegments")
    };
    list.and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn segment_visit(seg: &Value) -> Option<Visit> {
    let candidate = seg.get("visit")?.get("topCandidate").filter(|c| c.is_object())?;
    let loc = candidate.get("placeLocation").and_then(parse_geo_value)?;

    let start = lookup_str(seg, &alias::START_TIME).map(str::to_owned);
    let end = lookup_str(seg, &alias::END_TIME).map(str::to_owned);
    let seconds = duration_seconds(start.as_deref(), end.as_deref());

    let name = lookup_str(candidate, &alias::SEMANTIC_TYPE).unwrap_or(UNKNOWN_LABEL);

    Some(Visit {
        kind: VisitKind::PlaceVisit,
        lat: loc.lat,
        lng: loc.lng,
        place_id: lookup_str(candidate, &alias::PLACE_ID).map(str::to_owned),
        name: Some(name.to_owned()),
        address: None,
        start,
        end,
        seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn visit_segment() -> Value {
        json!({
            "startTime": "2024-03-01T08:00:00.000+01:00",
            "endTime": "2024-03-01T09:30:00.000+01:00",
            "visit": {
                "hierarchyLevel": 0,
                "topCandidate": {
                    "placeId": "ChIJhome",
                    "semanticType": "HOME",
                    "placeLocation": { "latLng": "52.5200000°, 13.4050000°" }
                }
            }
        })
    }

    #[test]
    fn array_form_yields_visit() {
        let doc = json!([visit_segment()]);
        let visits = extract(&[doc]);
        assert_eq!(visits.len(), 1);
        let v = &visits[0];
        assert_eq!(v.kind, VisitKind::PlaceVisit);
        assert_eq!((v.lat, v.lng), (52.52, 13.405));
        assert_eq!(v.place_id.as_deref(), Some("ChIJhome"));
        assert_eq!(v.name.as_deref(), Some("HOME"));
        assert_eq!(v.seconds, 5400.0);
    }

    #[test]
    fn object_form_and_string_location() {
        let doc = json!({
            "semanticSegments": [{
                "startTime": "2024-03-01T10:00:00Z",
                "endTime": "2024-03-01T10:00:00Z",
                "visit": { "topCandidate": { "placeID": "legacy", "placeLocation": "geo:1.5,2.5" } }
            }]
        });
        let visits = extract(&[doc]);
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].place_id.as_deref(), Some("legacy"));
        assert_eq!(visits[0].name.as_deref(), Some(UNKNOWN_LABEL));
        assert_eq!(visits[0].seconds, 0.0);
    }

    #[test]
    fn non_visit_segments_are_skipped() {
        let doc = json!([
            { "startTime": "2024-03-01T10:00:00Z", "activity": { "start": { "latLng": "1,2" } } },
            { "timelinePath": [{ "point": "1,2", "time": "2024-03-01T10:00:00Z" }] },
            { "visit": { "topCandidate": { "placeLocation": { "latLng": "bad" } } } },
            { "visit": { "probability": 0.9 } },
            visit_segment()
        ]);
        assert_eq!(extract(&[doc]).len(), 1);
    }

    #[test]
    fn batches_are_concatenated_in_order() {
        let mut second = visit_segment();
        second["visit"]["topCandidate"]["placeId"] = json!("ChIJwork");
        let visits = extract(&[json!([visit_segment()]), json!({ "semanticSegments": [second] })]);
        let ids: Vec<_> = visits.iter().filter_map(|v| v.place_id.as_deref()).collect();
        assert_eq!(ids, ["ChIJhome", "ChIJwork"]);
    }
}
