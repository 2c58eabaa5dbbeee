// crates/timeline-core/src/model.rs
use crate::geo::{coord_key, parse_iso, LatLng};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a [`Visit`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitKind {
    /// Read directly from labeled export data.
    #[serde(rename = "placeVisit")]
    PlaceVisit,
    /// Synthesized by clustering raw GPS points.
    #[serde(rename = "stay")]
    Stay,
}

/// The uniform record every extractor produces.
///
/// `lat`/`lng` are always finite; records that cannot satisfy this are
/// dropped during extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub kind: VisitKind,
    pub lat: f64,
    pub lng: f64,
    pub place_id: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    /// Dwell duration, `0.0` when unknown.
    pub seconds: f64,
}

impl Visit {
    pub fn position(&self) -> LatLng {
        LatLng {
            lat: self.lat,
            lng: self.lng,
        }
    }

    pub fn coord_key(&self) -> String {
        coord_key(self.lat, self.lng)
    }

    /// Display name: `name`, then the first address line, then `placeId`,
    /// then the coordinate key.
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.address
                    .as_deref()
                    .and_then(|a| a.split('\n').next())
                    .filter(|s| !s.is_empty())
            })
            .or_else(|| self.place_id.as_deref().filter(|s| !s.is_empty()))
            .map(str::to_owned)
            .unwrap_or_else(|| self.coord_key())
    }
}

/// One GPS fix from a `records_takeout` export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPoint {
    pub lat: f64,
    pub lng: f64,
    /// ISO-8601; streams are ordered by this string.
    pub ts: String,
    pub place_id: Option<String>,
}

impl RawPoint {
    pub fn position(&self) -> LatLng {
        LatLng {
            lat: self.lat,
            lng: self.lng,
        }
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        parse_iso(&self.ts)
    }
}

/// City/country resolved for a coordinate key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locality {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Externally supplied `"lat,lng"` → locality lookup. Read-only.
pub type GeoCache = HashMap<String, Locality>;

/// Place summary row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSummary {
    pub key: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub visits: u64,
    pub seconds: f64,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// City or country summary row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalitySummary {
    pub name: String,
    pub visits: u64,
    pub seconds: f64,
}

/// The three ranked collections, each sorted by seconds then visits, descending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    pub countries: Vec<LocalitySummary>,
    pub cities: Vec<LocalitySummary>,
    pub places: Vec<PlaceSummary>,
}
