//! timeline-cli
//! ============
//!
//! Command-line interface for the `timeline-core` location-history library.
//!
//! This crate primarily provides a binary (`timeline`). We include a small
//! library target so that docs.rs renders a documentation page and shows this
//! overview.
//!
//! Quick start
//! -----------
//!
//! ```text
//! cargo install timeline-cli
//! timeline --help
//! timeline -i Records.json detect
//! timeline -i Timeline.json --geo-cache cache.json summary --top 5
//! timeline --url https://example.com/export.json json
//! ```
//!
//! For programmatic access use the [`timeline-core`] crate directly.
//!
//! Links
//! -----
//! - Repository: <https://github.com/holg/timeline-rs>
//! - Core crate: <https://docs.rs/timeline-core>
//!
#![cfg_attr(docsrs, feature(doc_cfg))]

// This library target intentionally exposes no API; the binary is the primary
// deliverable.
