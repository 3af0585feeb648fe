//! Ingestion error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while ingesting a fact feed.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A feed entry could not be parsed or was rejected as invalid.
    #[error("bad entry at {origin}:{line}: {message}")]
    Entry {
        origin: String,
        line: usize,
        message: String,
    },

    /// A feed file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A feed directory could not be walked.
    #[error("failed to walk feed directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// The path is neither a feed file nor a directory.
    #[error("not a feed file or directory: {}", .0.display())]
    UnsupportedPath(PathBuf),

    /// An error propagated from the index.
    #[error("storage error: {0}")]
    Storage(#[from] polyphon_core::Error),
}

impl IngestError {
    /// Returns `true` when the index itself failed; such errors always abort
    /// ingestion and are left to the caller to retry.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(e) if !is_entry_error(e))
    }

    /// Returns `true` when the error indicates a missing entity or path.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_not_found(),
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Core errors caused by the entry's content rather than by storage.
pub(crate) fn is_entry_error(err: &polyphon_core::Error) -> bool {
    matches!(
        err,
        polyphon_core::Error::InvalidData(_) | polyphon_core::Error::Serialization(_)
    )
}

/// Convenience alias for ingestion results.
pub type IngestResult<T> = std::result::Result<T, IngestError>;
