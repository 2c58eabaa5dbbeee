//! timeline-cli — Command-line interface for timeline-core
//!
//! Runs one load job over local exports (or a URL) and prints the result.
//!
//! Usage examples
//! --------------
//!
//! - Which export is this?
//!   $ timeline -i Records.json detect
//!
//! - Top places, cities and countries, with a locality cache
//!   $ timeline -i "Semantic Location History/2019_JUNE.json" \
//!       -i "Semantic Location History/2019_JULY.json" \
//!       --geo-cache geo.json summary --top 5
//!
//! - Every visit as JSON, with a looser stay radius
//!   $ timeline -i Records.json.gz --max-distance-km 0.3 visits
//!
//! - The raw worker response
//!   $ timeline --url https://example.com/Timeline.json json
//!
//! Logging goes to stderr and honours `RUST_LOG`.
mod args;

use crate::args::{CliArgs, Commands};
use anyhow::{bail, Context};
use clap::Parser;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use timeline_core::job::{parse_document, DoneData, JobOptions, LoadRequest, WorkerMessage};
use timeline_core::model::{LocalitySummary, PlaceSummary};
use timeline_core::{detect_type, run_job, Acquire, FsSource, GeoCache, Source};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // Initialize logging based on verbosity
    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let source = match &args.url {
        Some(url) => Source::url(url.clone()),
        None => Source::files(args.inputs.clone()),
    };
    let mut options = build_options(&args)?;

    match args.command {
        Commands::Detect => {
            let mut fs = FsSource::new();
            let text = match &source {
                Source::Url { url } => fs.fetch_url(url)?,
                Source::Files { files } => match files.first() {
                    Some(path) => fs.read_file(path)?,
                    None => bail!("No JSON files provided."),
                },
            };
            println!("{}", detect_type(&parse_document(&text)?));
        }

        Commands::Summary { top } => {
            let data = expect_done(run(LoadRequest::new(source, options)))?;
            if let DoneData::Preview(result) = data {
                println!("Format: {}", result.data_type);
                println!("Visits: {}", result.visits_count);
                print_localities("Countries", &result.agg.countries, top);
                print_localities("Cities", &result.agg.cities, top);
                print_places(&result.agg.places, top);
            }
        }

        Commands::Visits => {
            options.include_visits = true;
            let data = expect_done(run(LoadRequest::new(source, options)))?;
            if let DoneData::Full(result) = data {
                println!("{}", serde_json::to_string_pretty(&result.visits)?);
            }
        }

        Commands::Json { include_visits } => {
            options.include_visits = include_visits;
            let terminal = run(LoadRequest::new(source, options));
            println!("{}", serde_json::to_string_pretty(&terminal)?);
            if let WorkerMessage::Error { error } = terminal {
                bail!(error);
            }
        }
    }

    Ok(())
}

fn build_options(args: &CliArgs) -> anyhow::Result<JobOptions> {
    let mut options = JobOptions {
        preview_limit: args.preview_limit,
        ..JobOptions::default()
    };

    if let Some(path) = &args.geo_cache {
        let file = File::open(path)
            .with_context(|| format!("Failed to open geo cache {}", path.display()))?;
        options.geo_cache = serde_json::from_reader::<_, GeoCache>(BufReader::new(file))
            .with_context(|| format!("Invalid geo cache {}", path.display()))?;
    }

    if let Some(km) = args.max_distance_km {
        options.stay.max_distance_km = km;
    }
    if let Some(mins) = args.max_gap_mins {
        options.stay.max_gap_secs = mins.saturating_mul(60);
    }
    if let Some(mins) = args.min_dwell_mins {
        options.stay.min_dwell_secs = mins * 60.0;
    }
    Ok(options)
}

/// Runs the job, logging progress, and returns the terminal message.
fn run(request: LoadRequest<PathBuf>) -> WorkerMessage {
    let mut terminal = None;
    let mut sink = |message: WorkerMessage| match message {
        WorkerMessage::Progress { message } => info!("{message}"),
        other => terminal = Some(other),
    };
    run_job(&request, &mut FsSource::new(), &mut sink);
    terminal.unwrap_or_else(|| WorkerMessage::Error {
        error: "job ended without a result".into(),
    })
}

fn expect_done(message: WorkerMessage) -> anyhow::Result<DoneData> {
    match message {
        WorkerMessage::Done { data } => Ok(data),
        WorkerMessage::Error { error } => bail!(error),
        WorkerMessage::Progress { .. } => bail!("job ended without a result"),
    }
}

fn hours(seconds: f64) -> String {
    format!("{:.1} h", seconds / 3600.0)
}

fn print_localities(title: &str, rows: &[LocalitySummary], top: usize) {
    println!("\n{title}:");
    if rows.is_empty() {
        println!("  (none; pass --geo-cache to resolve localities)");
    }
    for row in rows.iter().take(top) {
        println!("  {:>10}  {:>5} visits  {}", hours(row.seconds), row.visits, row.name);
    }
}

fn print_places(rows: &[PlaceSummary], top: usize) {
    println!("\nPlaces:");
    for row in rows.iter().take(top) {
        let locality = match (&row.city, &row.country) {
            (Some(city), Some(country)) => format!(" [{city}, {country}]"),
            (Some(place), None) | (None, Some(place)) => format!(" [{place}]"),
            (None, None) => String::new(),
        };
        println!(
            "  {:>10}  {:>5} visits  {} ({:.4}, {:.4}){}",
            hours(row.seconds),
            row.visits,
            row.name,
            row.lat,
            row.lng,
            locality
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_flags_convert_minutes() {
        let args = CliArgs::try_parse_from([
            "timeline",
            "--max-gap-mins",
            "45",
            "--min-dwell-mins",
            "2.5",
            "detect",
        ])
        .unwrap();
        let options = build_options(&args).unwrap();
        assert_eq!(options.stay.max_gap_secs, 45 * 60);
        assert_eq!(options.stay.min_dwell_secs, 150.0);
    }

    #[test]
    fn huge_gap_flag_saturates() {
        let max = i64::MAX.to_string();
        let args =
            CliArgs::try_parse_from(["timeline", "--max-gap-mins", max.as_str(), "detect"]).unwrap();
        assert_eq!(build_options(&args).unwrap().stay.max_gap_secs, i64::MAX);
    }
}
