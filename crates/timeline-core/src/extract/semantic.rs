// crates/timeline-core/src/extract/semantic.rs

//! Takeout semantic location history (`timelineObjects`).

use crate::alias::{self, lookup_f64, lookup_str, owned_str};
use crate::geo::{duration_seconds, LatLng, E7_SCALE};
use crate::model::{Visit, VisitKind};
use serde_json::Value;
use tracing::debug;

pub fn extract(docs: &[Value]) -> Vec<Visit> {
    let mut out = Vec::new();
    let mut dropped = 0usize;

    let objects = docs
        .iter()
        .filter_map(|doc| doc.get("timelineObjects").and_then(Value::as_array))
        .flatten();

    for obj in objects {
        let Some(pv) = obj.get("placeVisit").filter(|pv| pv.is_object()) else {
            continue;
        };
        match place_visit(pv) {
            Some(v) => out.push(v),
            None => dropped += 1,
        }
    }

    debug!(visits = out.len(), dropped, "semantic takeout extracted");
    out
}

fn place_visit(pv: &Value) -> Option<Visit> {
    let empty = Value::Null;
    let loc = pv.get("location").unwrap_or(&empty);
    let duration = pv.get("duration").unwrap_or(&empty);

    let lat_e7 = lookup_f64(loc, &alias::LAT_E7).or_else(|| lookup_f64(pv, &alias::CENTER_LAT_E7))?;
    let lng_e7 = lookup_f64(loc, &alias::LNG_E7).or_else(|| lookup_f64(pv, &alias::CENTER_LNG_E7))?;
    let pos = LatLng::new(lat_e7 / E7_SCALE, lng_e7 / E7_SCALE)?;

    let start = lookup_str(duration, &alias::START_TIME).map(str::to_owned);
    let end = lookup_str(duration, &alias::END_TIME).map(str::to_owned);
    let seconds = duration_seconds(start.as_deref(), end.as_deref());

    Some(Visit {
        kind: VisitKind::PlaceVisit,
        lat: pos.lat,
        lng: pos.lng,
        place_id: lookup_str(loc, &alias::PLACE_ID).map(str::to_owned),
        name: owned_str(loc, "name"),
        address: owned_str(loc, "address"),
        start,
        end,
        seconds,
    })
}
