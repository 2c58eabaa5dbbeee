// crates/timeline-core/src/prelude.rs
pub use crate::aggregate::aggregate;
pub use crate::cluster::{cluster_stays, StayConfig};
pub use crate::detect::{detect_type, DataType};
pub use crate::error::{Result, TimelineError};
pub use crate::extract::extract_visits;
pub use crate::job::{handle_message, run_job, DoneData, JobOptions, LoadRequest, WorkerMessage};
pub use crate::loader::{Acquire, Source};
pub use crate::model::{Aggregates, GeoCache, Locality, Visit, VisitKind};
