// crates/timeline-core/src/extract/mod.rs

//! # Format Extractors
//!
//! One strategy per [`DataType`]. The detector produces the tag, and
//! [`EXTRACTORS`] maps it to the function that turns parsed documents into
//! visits (or into raw points that still need clustering). Supporting a new
//! schema means one new `DataType` variant and one new table row.
//!
//! No extractor fails: records without usable coordinates are dropped.

use crate::cluster::{cluster_stays, StayConfig};
use crate::detect::DataType;
use crate::model::{RawPoint, Visit};
use serde_json::Value;

pub mod device;
pub mod records;
pub mod semantic;

pub type VisitExtractor = fn(&[Value]) -> Vec<Visit>;
pub type PointExtractor = fn(&[Value]) -> Vec<RawPoint>;

/// How a schema yields visits.
#[derive(Debug, Clone, Copy)]
pub enum Strategy {
    /// Visits are read directly from labeled segments.
    Visits(VisitExtractor),
    /// Raw points are read and must be clustered into stays.
    Points(PointExtractor),
}

/// Dispatch table, tag → strategy.
pub const EXTRACTORS: &[(DataType, Strategy)] = &[
    (DataType::DeviceExportArray, Strategy::Visits(device::extract)),
    (DataType::DeviceExportObject, Strategy::Visits(device::extract)),
    (DataType::SemanticTakeout, Strategy::Visits(semantic::extract)),
    (DataType::RecordsTakeout, Strategy::Points(records::extract_points)),
];

impl Strategy {
    /// Produces visits from `docs`. `on_cluster` sees the point count just
    /// before clustering starts and is never called for labeled schemas.
    pub fn run(self, docs: &[Value], stay: &StayConfig, on_cluster: impl FnOnce(usize)) -> Vec<Visit> {
        match self {
            Strategy::Visits(f) => f(docs),
            Strategy::Points(f) => {
                let points = f(docs);
                on_cluster(points.len());
                cluster_stays(points, stay)
            }
        }
    }
}

pub fn strategy_for(data_type: DataType) -> Option<Strategy> {
    EXTRACTORS
        .iter()
        .find(|(tag, _)| *tag == data_type)
        .map(|(_, strategy)| *strategy)
}

/// Runs the full extraction for `data_type`, clustering when needed.
///
/// Returns `None` for [`DataType::Unknown`].
pub fn extract_visits(data_type: DataType, docs: &[Value], stay: &StayConfig) -> Option<Vec<Visit>> {
    Some(strategy_for(data_type)?.run(docs, stay, |_| {}))
}
