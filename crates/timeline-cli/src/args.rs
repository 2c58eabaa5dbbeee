use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for timeline-cli
#[derive(Debug, Parser)]
#[command(
    name = "timeline",
    version,
    about = "Summarize location-history exports (Takeout or on-device timeline)"
)]
pub struct CliArgs {
    /// Export file to read (.json or .json.gz); repeat for multi-file exports
    #[arg(short = 'i', long = "input", global = true)]
    pub inputs: Vec<PathBuf>,

    /// Fetch a single export from a URL instead of reading files
    #[arg(short = 'u', long = "url", global = true, conflicts_with = "inputs")]
    pub url: Option<String>,

    /// JSON file mapping "lat,lng" keys to { "city", "country" }
    #[arg(short = 'g', long = "geo-cache", global = true)]
    pub geo_cache: Option<PathBuf>,

    /// Number of visits kept in the preview
    #[arg(long = "preview-limit", global = true)]
    pub preview_limit: Option<usize>,

    /// Max distance from a stay's centroid, in km
    #[arg(long = "max-distance-km", global = true)]
    pub max_distance_km: Option<f64>,

    /// Max gap between points of one stay, in minutes
    #[arg(long = "max-gap-mins", global = true)]
    pub max_gap_mins: Option<i64>,

    /// Minimum stay duration, in minutes
    #[arg(long = "min-dwell-mins", global = true)]
    pub min_dwell_mins: Option<f64>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the detected export format of the first input
    Detect,

    /// Print the top countries, cities and places
    Summary {
        /// Rows per table
        #[arg(short = 'n', long = "top", default_value_t = 10)]
        top: usize,
    },

    /// Print every extracted visit as JSON
    Visits,

    /// Print the terminal worker message (done or error) as JSON
    Json {
        /// Include the full visit list instead of aggregates
        #[arg(long = "include-visits")]
        include_visits: bool,
    },
}
