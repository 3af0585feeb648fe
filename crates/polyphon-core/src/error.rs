use thiserror::Error;

use crate::model::{Identifier, RecordKind, SourceId};

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No assignment binds the identifier to a record of the requested kind.
    #[error("identifier not found: {record_kind} {identifier}")]
    IdentifierNotFound {
        record_kind: RecordKind,
        identifier: Identifier,
    },

    #[error("source not found: {0}")]
    SourceNotFound(SourceId),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Returns `true` when the error means "entity unknown" rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::IdentifierNotFound { .. } | Self::SourceNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
