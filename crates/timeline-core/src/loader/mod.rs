// crates/timeline-core/src/loader/mod.rs

//! # Document Acquisition
//!
//! The acquisition layer sits outside the core: it turns a request
//! [`Source`] into JSON text. Implementations plug in through [`Acquire`]:
//! the filesystem/HTTP source here, or the worker source in the wasm crate.

use crate::error::Result;
use serde::{Deserialize, Serialize};

#[cfg(feature = "fs")]
mod fs;
#[cfg(feature = "fs")]
pub use fs::{open_stream, FsSource};

/// Where a job's documents come from.
///
/// `F` is the file handle type of the acquirer (a path, a browser `Blob`,
/// an in-memory string...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source<F> {
    /// Fetch exactly one document.
    Url { url: String },
    /// Read each file in order. An empty list yields no documents.
    Files {
        #[serde(default = "Vec::new")]
        files: Vec<F>,
    },
}

impl<F> Source<F> {
    pub fn files(files: Vec<F>) -> Self {
        Source::Files { files }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Source::Url { url: url.into() }
    }
}

/// Turns request sources into raw JSON text.
///
/// Calls happen sequentially, one input at a time, in request order.
pub trait Acquire {
    type File;

    /// Fetches a document. Non-success responses map to
    /// [`crate::TimelineError::Fetch`].
    fn fetch_url(&mut self, url: &str) -> Result<String>;

    fn read_file(&mut self, file: &Self::File) -> Result<String>;
}

/// In-memory acquirer: files are the document texts themselves and URLs
/// are looked up in a fixed table.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub urls: Vec<(String, std::result::Result<String, u16>)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a URL answering with `body`.
    pub fn with_url(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.urls.push((url.into(), Ok(body.into())));
        self
    }

    /// Registers a URL answering with a non-success `status`.
    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.urls.push((url.into(), Err(status)));
        self
    }
}

impl Acquire for MemorySource {
    type File = String;

    fn fetch_url(&mut self, url: &str) -> Result<String> {
        match self.urls.iter().find(|(u, _)| u == url) {
            Some((_, Ok(body))) => Ok(body.clone()),
            Some((_, Err(status))) => Err(crate::TimelineError::Fetch { status: *status }),
            None => Err(crate::TimelineError::Fetch { status: 404 }),
        }
    }

    fn read_file(&mut self, file: &String) -> Result<String> {
        Ok(file.clone())
    }
}
