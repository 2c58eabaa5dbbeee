// crates/timeline-core/src/loader/fs.rs
use super::Acquire;
use crate::error::{Result, TimelineError};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

#[cfg(feature = "compact")]
use flate2::read::GzDecoder;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Opens a file, buffers it, and wraps it in a Gzip decoder when the
/// content starts with the gzip magic bytes.
pub fn open_stream(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).map_err(|e| {
        TimelineError::Acquisition(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let mut reader = BufReader::new(file);
    let is_gzip = reader.fill_buf()?.starts_with(&GZIP_MAGIC);

    if !is_gzip {
        return Ok(Box::new(reader));
    }

    #[cfg(feature = "compact")]
    {
        Ok(Box::new(GzDecoder::new(reader)))
    }

    #[cfg(not(feature = "compact"))]
    {
        Err(TimelineError::Acquisition(format!(
            "{} is gzip-compressed but 'compact' is disabled",
            path.display()
        )))
    }
}

/// Local files and (with `fetch`) HTTP URLs.
#[derive(Debug, Default)]
pub struct FsSource {
    #[cfg(feature = "fetch")]
    client: Option<reqwest::blocking::Client>,
}

impl FsSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Acquire for FsSource {
    type File = PathBuf;

    #[cfg(feature = "fetch")]
    fn fetch_url(&mut self, url: &str) -> Result<String> {
        let client = self.client.get_or_insert_with(reqwest::blocking::Client::new);
        let response = client
            .get(url)
            .send()
            .map_err(|e| TimelineError::Acquisition(format!("Fetch failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TimelineError::Fetch {
                status: status.as_u16(),
            });
        }
        response
            .text()
            .map_err(|e| TimelineError::Acquisition(format!("Fetch failed: {e}")))
    }

    #[cfg(not(feature = "fetch"))]
    fn fetch_url(&mut self, url: &str) -> Result<String> {
        Err(TimelineError::Acquisition(format!(
            "Cannot fetch {url}: built without the 'fetch' feature"
        )))
    }

    fn read_file(&mut self, file: &PathBuf) -> Result<String> {
        let mut reader = open_stream(file)?;
        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(|e| {
            TimelineError::Acquisition(format!("Failed to read {}: {}", file.display(), e))
        })?;
        Ok(text)
    }
}
