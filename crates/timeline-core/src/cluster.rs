// crates/timeline-core/src/cluster.rs

//! # Stay Clusterer
//!
//! Collapses a time-ordered GPS point stream into dwell episodes.
//!
//! The fold carries at most one open [`StayAccumulator`]. Each point is
//! either absorbed (close to the running centroid and soon after the last
//! absorbed point) or closes the episode and seeds a new one. Closed
//! episodes shorter than [`StayConfig::min_dwell_secs`] are discarded.

use crate::geo::{duration_seconds, haversine_km, LatLng};
use crate::model::{RawPoint, Visit, VisitKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Thresholds for stay detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StayConfig {
    /// Max distance from the running centroid, in km.
    pub max_distance_km: f64,
    /// Max gap between consecutive absorbed points, in seconds.
    pub max_gap_secs: i64,
    /// Minimum episode span to count as a stay, in seconds.
    pub min_dwell_secs: f64,
}

impl Default for StayConfig {
    fn default() -> Self {
        Self {
            max_distance_km: 0.2,
            max_gap_secs: 30 * 60,
            min_dwell_secs: 10.0 * 60.0,
        }
    }
}

/// State of one open episode.
#[derive(Debug, Clone, PartialEq)]
pub struct StayAccumulator {
    sum_lat: f64,
    sum_lng: f64,
    n: u32,
    start: String,
    end: String,
    end_at: Option<DateTime<Utc>>,
    place_id: Option<String>,
}

impl StayAccumulator {
    /// Seeds a new episode with `p`.
    pub fn open(p: &RawPoint) -> Self {
        Self {
            sum_lat: p.lat,
            sum_lng: p.lng,
            n: 1,
            start: p.ts.clone(),
            end: p.ts.clone(),
            end_at: p.instant(),
            place_id: p.place_id.clone(),
        }
    }

    pub fn centroid(&self) -> LatLng {
        LatLng {
            lat: self.sum_lat / self.n as f64,
            lng: self.sum_lng / self.n as f64,
        }
    }

    /// Whether `p` belongs to this episode. An unknown gap never absorbs.
    pub fn accepts(&self, p: &RawPoint, cfg: &StayConfig) -> bool {
        let near = haversine_km(&self.centroid(), &p.position()) <= cfg.max_distance_km;
        let soon = match (self.end_at, p.instant()) {
            (Some(end), Some(at)) => {
                (at - end).num_milliseconds() <= cfg.max_gap_secs.saturating_mul(1000)
            }
            _ => false,
        };
        near && soon
    }

    /// Extends the episode with `p`.
    pub fn absorb(self, p: &RawPoint) -> Self {
        Self {
            sum_lat: self.sum_lat + p.lat,
            sum_lng: self.sum_lng + p.lng,
            n: self.n + 1,
            start: self.start,
            end: p.ts.clone(),
            end_at: p.instant(),
            place_id: self.place_id.or_else(|| p.place_id.clone()),
        }
    }

    /// Closes the episode. `None` when it is shorter than the dwell floor.
    pub fn finish(self, cfg: &StayConfig) -> Option<Visit> {
        let seconds = duration_seconds(Some(&self.start), Some(&self.end));
        if seconds < cfg.min_dwell_secs {
            return None;
        }
        let c = self.centroid();
        Some(Visit {
            kind: VisitKind::Stay,
            lat: c.lat,
            lng: c.lng,
            place_id: self.place_id,
            name: None,
            address: None,
            start: Some(self.start),
            end: Some(self.end),
            seconds,
        })
    }
}

/// Clusters `points` (already sorted by timestamp) into stay visits.
pub fn cluster_stays<I>(points: I, cfg: &StayConfig) -> Vec<Visit>
where
    I: IntoIterator,
    I::Item: std::borrow::Borrow<RawPoint>,
{
    use std::borrow::Borrow;

    let mut episodes = 0usize;
    let (mut stays, open) = points.into_iter().fold(
        (Vec::new(), None::<StayAccumulator>),
        |(mut stays, open), p| {
            let p: &RawPoint = p.borrow();
            let next = match open {
                Some(acc) if acc.accepts(p, cfg) => acc.absorb(p),
                Some(acc) => {
                    episodes += 1;
                    stays.extend(acc.finish(cfg));
                    StayAccumulator::open(p)
                }
                None => StayAccumulator::open(p),
            };
            (stays, Some(next))
        },
    );
    if let Some(acc) = open {
        episodes += 1;
        stays.extend(acc.finish(cfg));
    }

    debug!(episodes, stays = stays.len(), "stay clustering finished");
    stays
}
