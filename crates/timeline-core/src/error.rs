// crates/timeline-core/src/error.rs
use thiserror::Error;

/// Terminal failures of a job.
///
/// Anything not listed here (missing fields, bad coordinates, inverted
/// durations) is resolved locally by the extractors and never surfaces.
#[derive(Debug, Error)]
pub enum TimelineError {
    /// The remote side answered with a non-success status.
    #[error("Fetch failed: {status}")]
    Fetch { status: u16 },

    /// Transport or read failure while acquiring a document.
    #[error("{0}")]
    Acquisition(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No JSON files provided.")]
    NoInput,

    #[error("Couldn't detect format. Expected Takeout or on-device export.")]
    UnknownFormat,

    /// A document failed to parse. The parser message is kept verbatim.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

pub type Result<T> = std::result::Result<T, TimelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_worker_contract() {
        assert_eq!(
            TimelineError::Fetch { status: 404 }.to_string(),
            "Fetch failed: 404"
        );
        assert_eq!(TimelineError::NoInput.to_string(), "No JSON files provided.");
        assert!(TimelineError::UnknownFormat
            .to_string()
            .starts_with("Couldn't detect format"));
    }

    #[test]
    fn json_error_keeps_parser_message() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let expected = parse_err.to_string();
        let err: TimelineError = parse_err.into();
        assert_eq!(err.to_string(), expected);
    }
}
