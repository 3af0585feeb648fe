//! SQLite storage: connection setup and versioned migrations.

pub mod db;
pub mod migrations;

pub use db::{Index, IndexOptions, IndexStats};
