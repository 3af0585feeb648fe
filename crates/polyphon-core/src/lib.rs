//! Core of polyphon: a provenance-aware, multi-source entity index for music
//! metadata.
//!
//! Independent feeds assert facts about performers, works, recordings,
//! releases and their relationships, each keyed by external identifiers
//! (ISRC, ISWC, GRid, UPC, DPID, IPI, ISNI). The [`Index`] deduplicates those
//! facts, binds them to identifiers and keeps every source's version of a fact
//! side by side. The [`Resolver`](resolve::Resolver) fans out from a seed
//! identifier and merges the claims into a single view.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod provenance;
pub mod resolve;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
pub use provenance::SourcePolicy;
pub use resolve::{EntityView, Resolver};
pub use schema::{Index, IndexOptions, IndexStats};
pub use store::Assignment;
