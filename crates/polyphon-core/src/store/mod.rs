//! Write and read paths over the [`Index`](crate::schema::Index).
//!
//! Every public write opens exactly one `IMMEDIATE` transaction and either
//! commits all of its rows or none of them. Inserts are attempted
//! optimistically; a unique-index violation falls back to selecting the
//! existing row, so replays never create duplicates and never fail.

mod identifiers;
mod links;
mod records;
mod sources;

pub use identifiers::Assignment;

use rusqlite::ErrorCode;

/// True for a violation of a UNIQUE index, which the write paths absorb.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Double-quote a table or column name.
pub(crate) fn quoted(name: &str) -> String {
    format!("\"{name}\"")
}
