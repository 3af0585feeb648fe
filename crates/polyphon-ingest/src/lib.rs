//! Ingestion for polyphon.
//!
//! Reads the JSON-lines fact feed produced by format-specific importers and
//! applies it to the index, one transaction per fact. Also owns the layered
//! configuration shared by the command line tools.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod feed;
pub mod ingest;

pub use config::Config;
pub use error::{IngestError, IngestResult};
pub use feed::{FeedFact, FeedEntry};
pub use ingest::{EntryFailure, IngestSummary, Ingester};
