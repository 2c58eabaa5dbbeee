// crates/timeline-core/src/lib.rs

//! # timeline-core
//!
//! Reads location-history exports (Takeout semantic history, Takeout raw
//! records, on-device timeline exports), normalizes them into [`Visit`]s and
//! ranks the places, cities and countries they cover.
//!
//! ```rust
//! use timeline_core::prelude::*;
//! use serde_json::json;
//!
//! let doc = json!({ "timelineObjects": [{ "placeVisit": {
//!     "location": { "latitudeE7": 485000000, "longitudeE7": 23500000, "name": "Cafe" },
//!     "duration": { "startTimestamp": "2019-06-01T10:00:00Z", "endTimestamp": "2019-06-01T11:00:00Z" }
//! } }] });
//!
//! assert_eq!(detect_type(&doc), DataType::SemanticTakeout);
//! let visits = extract_visits(DataType::SemanticTakeout, &[doc], &StayConfig::default()).unwrap();
//! let agg = aggregate(&visits, &GeoCache::new());
//! assert_eq!(agg.places[0].name, "Cafe");
//! assert_eq!(agg.places[0].seconds, 3600.0);
//! ```

pub mod aggregate;
pub mod alias; // Field-name fallbacks across schema versions
pub mod cluster;
pub mod detect;
pub mod error;
pub mod extract;
pub mod geo;
pub mod job; // The orchestrator + transport messages
pub mod loader;
pub mod model;
pub mod prelude;

// Re-exports
pub use crate::aggregate::aggregate;
pub use crate::cluster::{cluster_stays, StayAccumulator, StayConfig};
pub use crate::detect::{detect_type, DataType};
pub use crate::error::{Result, TimelineError};
pub use crate::extract::extract_visits;
pub use crate::job::{
    handle_message, run_job, DoneData, JobOptions, JobState, LoadRequest, MessageSink,
    WorkerMessage,
};
pub use crate::loader::{Acquire, MemorySource, Source};
#[cfg(feature = "fs")]
pub use crate::loader::FsSource;
pub use crate::model::{
    Aggregates, GeoCache, Locality, LocalitySummary, PlaceSummary, RawPoint, Visit, VisitKind,
};
