// crates/timeline-core/src/job.rs

//! # Request Orchestrator
//!
//! Drives one load request through acquisition, detection, extraction,
//! optional clustering and aggregation, talking to the caller only through
//! [`WorkerMessage`]s: zero or more `progress` messages followed by exactly
//! one `done` or `error`.
//!
//! ```text
//! Idle → Acquiring ⇄ Parsing → Detecting → Extracting → (Clustering)
//!      → Aggregating | Passthrough → Done
//! any  → Failed
//! ```

use crate::aggregate::aggregate;
use crate::cluster::StayConfig;
use crate::detect::{detect_type, DataType};
use crate::error::{Result, TimelineError};
use crate::extract::strategy_for;
use crate::loader::{Acquire, Source};
use crate::model::{Aggregates, GeoCache, Visit};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::{debug, info, warn};

/// The only request tag that triggers a job.
pub const LOAD_REQUEST: &str = "load";

/// Visits returned alongside aggregates when the caller sets no limit.
pub const DEFAULT_PREVIEW_LIMIT: usize = 500;

// -----------------------------------------------------------------------------
// REQUEST
// -----------------------------------------------------------------------------

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Per-request options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOptions {
    /// Size of `visitsPreview`; [`DEFAULT_PREVIEW_LIMIT`] when unset.
    #[serde(default)]
    pub preview_limit: Option<usize>,
    /// Return every visit and skip aggregation.
    #[serde(default, deserialize_with = "null_as_default")]
    pub include_visits: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub geo_cache: GeoCache,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stay: StayConfig,
}

impl JobOptions {
    pub fn preview_limit(&self) -> usize {
        self.preview_limit.unwrap_or(DEFAULT_PREVIEW_LIMIT)
    }
}

/// A load request as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRequest<F> {
    #[serde(rename = "type")]
    pub kind: String,
    pub source: Option<Source<F>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: JobOptions,
}

impl<F> LoadRequest<F> {
    pub fn new(source: Source<F>, options: JobOptions) -> Self {
        Self {
            kind: LOAD_REQUEST.to_owned(),
            source: Some(source),
            options,
        }
    }
}

// -----------------------------------------------------------------------------
// RESPONSES
// -----------------------------------------------------------------------------

/// Terminal payload when `includeVisits` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullResult {
    pub data_type: DataType,
    pub visits_count: usize,
    pub visits: Vec<Visit>,
}

/// Terminal payload with aggregates and a size-capped visit prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    pub data_type: DataType,
    pub visits_count: usize,
    pub visits_preview: Vec<Visit>,
    pub agg: Aggregates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DoneData {
    Full(FullResult),
    Preview(PreviewResult),
}

impl DoneData {
    pub fn data_type(&self) -> DataType {
        match self {
            DoneData::Full(r) => r.data_type,
            DoneData::Preview(r) => r.data_type,
        }
    }

    pub fn visits_count(&self) -> usize {
        match self {
            DoneData::Full(r) => r.visits_count,
            DoneData::Preview(r) => r.visits_count,
        }
    }
}

/// Messages sent back over the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerMessage {
    Progress { message: String },
    Done { data: DoneData },
    Error { error: String },
}

impl WorkerMessage {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerMessage::Progress { .. })
    }
}

/// Receives messages for the caller.
pub trait MessageSink {
    fn post(&mut self, message: WorkerMessage);
}

impl<F: FnMut(WorkerMessage)> MessageSink for F {
    fn post(&mut self, message: WorkerMessage) {
        self(message)
    }
}

// -----------------------------------------------------------------------------
// STATE MACHINE
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Acquiring,
    Parsing,
    Detecting,
    Extracting,
    Clustering,
    Aggregating,
    Passthrough,
    Done,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One running job.
///
/// [`Job::finish`] consumes the job, so nothing can be posted after the
/// terminal message.
pub struct Job<'s> {
    state: JobState,
    sink: &'s mut dyn MessageSink,
}

impl<'s> Job<'s> {
    pub fn new(sink: &'s mut dyn MessageSink) -> Self {
        Self {
            state: JobState::Idle,
            sink,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn enter(&mut self, next: JobState) {
        debug!(from = %self.state, to = %next, "job transition");
        self.state = next;
    }

    /// Best-effort status line.
    pub fn progress(&mut self, message: impl Into<String>) {
        self.sink.post(WorkerMessage::Progress {
            message: message.into(),
        });
    }

    /// Posts the terminal message and returns the terminal state.
    pub fn finish(mut self, result: Result<DoneData>) -> JobState {
        match result {
            Ok(data) => {
                info!(
                    data_type = %data.data_type(),
                    visits = data.visits_count(),
                    "job done"
                );
                self.enter(JobState::Done);
                self.sink.post(WorkerMessage::Done { data });
            }
            Err(e) => {
                warn!(state = %self.state, error = %e, "job failed");
                self.enter(JobState::Failed);
                self.sink.post(WorkerMessage::Error {
                    error: e.to_string(),
                });
            }
        }
        self.state
    }
}

// -----------------------------------------------------------------------------
// STAGES
// -----------------------------------------------------------------------------

pub fn parse_document(text: &str) -> Result<Value> {
    Ok(serde_json::from_str(text)?)
}

/// Acquires and parses every document of `source`, in order.
pub fn acquire_documents<A: Acquire>(
    source: Option<&Source<A::File>>,
    acquirer: &mut A,
    job: &mut Job<'_>,
) -> Result<Vec<Value>> {
    match source {
        None => Ok(Vec::new()),
        Some(Source::Url { url }) if url.is_empty() => Ok(Vec::new()),
        Some(Source::Url { url }) => {
            job.enter(JobState::Acquiring);
            job.progress("Fetching file...");
            let text = acquirer.fetch_url(url)?;
            job.enter(JobState::Parsing);
            job.progress("Parsing JSON...");
            Ok(vec![parse_document(&text)?])
        }
        Some(Source::Files { files }) => {
            let total = files.len();
            let mut docs = Vec::with_capacity(total);
            for (i, file) in files.iter().enumerate() {
                job.enter(JobState::Acquiring);
                job.progress(format!("Reading file {}/{}...", i + 1, total));
                let text = acquirer.read_file(file)?;
                job.enter(JobState::Parsing);
                job.progress(format!("Parsing file {}/{}...", i + 1, total));
                docs.push(parse_document(&text)?);
            }
            Ok(docs)
        }
    }
}

/// Detects, extracts and summarizes already-parsed documents.
pub fn analyze(docs: &[Value], options: &JobOptions, job: &mut Job<'_>) -> Result<DoneData> {
    let first = docs.first().ok_or(TimelineError::NoInput)?;

    job.enter(JobState::Detecting);
    let data_type = detect_type(first);
    let strategy = strategy_for(data_type).ok_or(TimelineError::UnknownFormat)?;

    job.enter(JobState::Extracting);
    job.progress("Extracting visits...");
    let visits = strategy.run(docs, &options.stay, |points| {
        job.enter(JobState::Clustering);
        job.progress(format!("Clustering {points} points..."));
    });
    Ok(summarize(data_type, visits, options, job))
}

fn summarize(
    data_type: DataType,
    mut visits: Vec<Visit>,
    options: &JobOptions,
    job: &mut Job<'_>,
) -> DoneData {
    let visits_count = visits.len();

    if options.include_visits {
        job.enter(JobState::Passthrough);
        return DoneData::Full(FullResult {
            data_type,
            visits_count,
            visits,
        });
    }

    job.enter(JobState::Aggregating);
    job.progress("Aggregating...");
    let agg = aggregate(&visits, &options.geo_cache);
    visits.truncate(options.preview_limit());
    DoneData::Preview(PreviewResult {
        data_type,
        visits_count,
        visits_preview: visits,
        agg,
    })
}

/// Runs one load request to completion. Returns the terminal state.
pub fn run_job<A: Acquire>(
    request: &LoadRequest<A::File>,
    acquirer: &mut A,
    sink: &mut dyn MessageSink,
) -> JobState {
    let mut job = Job::new(sink);
    let result = acquire_documents(request.source.as_ref(), acquirer, &mut job)
        .and_then(|docs| analyze(&docs, &request.options, &mut job));
    job.finish(result)
}

/// Entry point for a raw transport message.
///
/// Messages whose `type` is not `"load"` are ignored and produce no output
/// (`None`). A load message that fails to deserialize ends in an `error`.
pub fn handle_message<A>(
    message: &Value,
    acquirer: &mut A,
    sink: &mut dyn MessageSink,
) -> Option<JobState>
where
    A: Acquire,
    A::File: DeserializeOwned,
{
    if message.get("type").and_then(Value::as_str) != Some(LOAD_REQUEST) {
        debug!("ignoring non-load message");
        return None;
    }
    match serde_json::from_value::<LoadRequest<A::File>>(message.clone()) {
        Ok(request) => Some(run_job(&request, acquirer, sink)),
        Err(e) => Some(Job::new(sink).finish(Err(TimelineError::InvalidRequest(e.to_string())))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemorySource;
    use serde_json::json;

    fn collect(request: &Value, src: &mut MemorySource) -> (Option<JobState>, Vec<WorkerMessage>) {
        let mut messages = Vec::new();
        let state = handle_message(request, src, &mut |m: WorkerMessage| messages.push(m));
        (state, messages)
    }

    fn semantic_doc() -> String {
        json!({
            "timelineObjects": [{
                "placeVisit": {
                    "location": { "latitudeE7": 10_000_000, "longitudeE7": 20_000_000, "name": "Home" },
                    "duration": {
                        "startTimestamp": "2024-01-01T00:00:00Z",
                        "endTimestamp": "2024-01-01T01:00:00Z"
                    }
                }
            }]
        })
        .to_string()
    }

    #[test]
    fn non_load_messages_are_ignored() {
        let (state, messages) = collect(&json!({ "type": "ping" }), &mut MemorySource::new());
        assert_eq!(state, None);
        assert!(messages.is_empty());
    }

    #[test]
    fn files_produce_progress_then_done() {
        let request = json!({ "type": "load", "source": { "files": [semantic_doc()] } });
        let (state, messages) = collect(&request, &mut MemorySource::new());

        assert_eq!(state, Some(JobState::Done));
        let progress: Vec<_> = messages
            .iter()
            .filter_map(|m| match m {
                WorkerMessage::Progress { message } => Some(message.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            progress,
            [
                "Reading file 1/1...",
                "Parsing file 1/1...",
                "Extracting visits...",
                "Aggregating..."
            ]
        );
        match messages.last() {
            Some(WorkerMessage::Done { data: DoneData::Preview(r) }) => {
                assert_eq!(r.data_type, DataType::SemanticTakeout);
                assert_eq!(r.visits_count, 1);
                assert_eq!(r.agg.places[0].name, "Home");
            }
            other => panic!("unexpected terminal message: {other:?}"),
        }
    }

    #[test]
    fn include_visits_skips_aggregation() {
        let request = json!({
            "type": "load",
            "source": { "files": [semantic_doc()] },
            "options": { "includeVisits": true }
        });
        let (_, messages) = collect(&request, &mut MemorySource::new());
        assert!(!messages
            .iter()
            .any(|m| matches!(m, WorkerMessage::Progress { message } if message == "Aggregating...")));
        assert!(matches!(
            messages.last(),
            Some(WorkerMessage::Done { data: DoneData::Full(r) }) if r.visits.len() == 1
        ));
    }

    #[test]
    fn empty_source_is_no_input() {
        for request in [
            json!({ "type": "load" }),
            json!({ "type": "load", "source": { "files": [] } }),
            json!({ "type": "load", "source": null, "options": null }),
            json!({ "type": "load", "source": { "url": "" } }),
        ] {
            let (state, messages) = collect(&request, &mut MemorySource::new());
            assert_eq!(state, Some(JobState::Failed));
            assert_eq!(
                messages,
                [WorkerMessage::Error {
                    error: "No JSON files provided.".into()
                }]
            );
        }
    }

    #[test]
    fn url_failure_reports_status() {
        let mut src = MemorySource::new().with_status("https://example.test/a.json", 503);
        let request = json!({ "type": "load", "source": { "url": "https://example.test/a.json" } });
        let (_, messages) = collect(&request, &mut src);
        assert_eq!(
            messages.last(),
            Some(&WorkerMessage::Error {
                error: "Fetch failed: 503".into()
            })
        );
        assert_eq!(messages.iter().filter(|m| m.is_terminal()).count(), 1);
    }

    #[test]
    fn malformed_json_propagates_parser_message() {
        let request = json!({ "type": "load", "source": { "files": ["{ nope"] } });
        let (_, messages) = collect(&request, &mut MemorySource::new());
        let expected = serde_json::from_str::<Value>("{ nope").unwrap_err().to_string();
        assert_eq!(messages.last(), Some(&WorkerMessage::Error { error: expected }));
    }

    #[test]
    fn invalid_options_fail_the_job() {
        let request = json!({
            "type": "load",
            "source": { "files": [semantic_doc()] },
            "options": { "previewLimit": -3 }
        });
        let (state, messages) = collect(&request, &mut MemorySource::new());
        assert_eq!(state, Some(JobState::Failed));
        assert!(matches!(
            &messages[..],
            [WorkerMessage::Error { error }] if error.starts_with("Invalid request")
        ));
    }

    /// File handle with no `Default` impl, like a browser blob.
    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Handle(String);

    struct HandleSource;

    impl Acquire for HandleSource {
        type File = Handle;

        fn fetch_url(&mut self, _url: &str) -> Result<String> {
            Err(TimelineError::Fetch { status: 404 })
        }

        fn read_file(&mut self, file: &Handle) -> Result<String> {
            Ok(file.0.clone())
        }
    }

    #[test]
    fn file_handles_need_no_default() {
        let request = json!({ "type": "load", "source": { "files": [semantic_doc()] } });
        let mut messages = Vec::new();
        let state = handle_message(&request, &mut HandleSource, &mut |m: WorkerMessage| {
            messages.push(m)
        });
        assert_eq!(state, Some(JobState::Done));

        let missing: LoadRequest<Handle> = serde_json::from_value(json!({ "type": "load" })).unwrap();
        assert_eq!(missing.source, None);
    }

    #[test]
    fn oversized_gap_option_still_finishes() {
        let doc = json!({
            "locations": [
                { "latitudeE7": 515_000_000, "longitudeE7": -1_200_000, "timestamp": "2024-02-02T08:00:00Z" },
                { "latitudeE7": 515_000_000, "longitudeE7": -1_200_000, "timestamp": "2024-02-02T08:12:00Z" }
            ]
        })
        .to_string();
        let request = json!({
            "type": "load",
            "source": { "files": [doc] },
            "options": { "includeVisits": true, "stay": { "maxGapSecs": i64::MAX } }
        });
        let (state, messages) = collect(&request, &mut MemorySource::new());
        assert_eq!(state, Some(JobState::Done));
        assert!(matches!(
            messages.last(),
            Some(WorkerMessage::Done { data: DoneData::Full(r) }) if r.visits.len() == 1 && r.visits[0].seconds == 720.0
        ));
    }

    #[test]
    fn options_defaults() {
        let opts: JobOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(opts.preview_limit(), DEFAULT_PREVIEW_LIMIT);
        assert!(!opts.include_visits);
        assert_eq!(opts.stay, StayConfig::default());

        let opts: JobOptions = serde_json::from_value(json!({
            "previewLimit": 3,
            "geoCache": { "1,2": { "city": "X" } },
            "stay": { "minDwellSecs": 60 }
        }))
        .unwrap();
        assert_eq!(opts.preview_limit(), 3);
        assert_eq!(opts.geo_cache["1,2"].city.as_deref(), Some("X"));
        assert_eq!(opts.stay.min_dwell_secs, 60.0);
        assert_eq!(opts.stay.max_distance_km, 0.2);
    }

    #[test]
    fn messages_serialize_with_type_tag() {
        let m = WorkerMessage::Progress {
            message: "Aggregating...".into(),
        };
        assert_eq!(
            serde_json::to_value(&m).unwrap(),
            json!({ "type": "progress", "message": "Aggregating..." })
        );
        let e = WorkerMessage::Error { error: "x".into() };
        assert_eq!(serde_json::to_value(&e).unwrap(), json!({ "type": "error", "error": "x" }));
    }
}
