use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::model::ids::IdentifierId;

/// An external identifier such as an ISRC, ISWC or IPI name number.
///
/// Identifiers are global and kind-agnostic: the same `(type, value)` pair
/// may be bound to records of several kinds, and to several records of one
/// kind when different sources disagree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier {
    /// Identifier scheme (`isrc`, `iswc`, `ipi`, `cwr.work_id`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

macro_rules! scheme_constructor {
    ($fn_name:ident, $scheme:literal, $doc:literal) => {
        #[doc = $doc]
        #[must_use]
        pub fn $fn_name(value: impl Into<String>) -> Self {
            Self::new($scheme, value)
        }
    };
}

impl Identifier {
    #[must_use]
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }

    scheme_constructor!(isrc, "isrc", "International Standard Recording Code.");
    scheme_constructor!(iswc, "iswc", "International Standard Musical Work Code.");
    scheme_constructor!(grid, "grid", "Global Release Identifier.");
    scheme_constructor!(upc, "upc", "Universal Product Code.");
    scheme_constructor!(ean, "ean", "International Article Number.");
    scheme_constructor!(dpid, "dpid", "DDEX Party Identifier.");
    scheme_constructor!(ipi, "ipi", "Interested Parties Information name number.");
    scheme_constructor!(isni, "isni", "International Standard Name Identifier.");
    scheme_constructor!(doid, "doid", "Digital Object Identifier (EIDR).");
    scheme_constructor!(mbid, "mbid", "MusicBrainz identifier.");

    /// Reject identifiers with an empty scheme or value.
    pub fn validate(&self) -> Result<()> {
        if self.kind.trim().is_empty() {
            return Err(Error::InvalidData(format!(
                "identifier type must not be empty (value {:?})",
                self.value
            )));
        }
        if self.value.trim().is_empty() {
            return Err(Error::InvalidData(format!(
                "identifier value must not be empty (type {:?})",
                self.kind
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

/// A stored identifier row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentifierRecord {
    pub id: IdentifierId,
    #[serde(flatten)]
    pub identifier: Identifier,
}

impl IdentifierRecord {
    #[must_use]
    pub const fn new(id: IdentifierId, identifier: Identifier) -> Self {
        Self { id, identifier }
    }

    /// Read `id, type, value` starting at column `offset`.
    pub(crate) fn from_row(row: &rusqlite::Row, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            identifier: Identifier {
                kind: row.get(offset + 1)?,
                value: row.get(offset + 2)?,
            },
        })
    }
}

impl fmt::Display for IdentifierRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.identifier, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_constructors() {
        let isrc = Identifier::isrc("CASE01000001");
        assert_eq!(isrc.kind, "isrc");
        assert_eq!(isrc.value, "CASE01000001");
        assert_eq!(Identifier::ipi("00014107338").kind, "ipi");
    }

    #[test]
    fn test_validate_rejects_empty_parts() {
        assert!(Identifier::new("", "x").validate().is_err());
        assert!(Identifier::new("isrc", "  ").validate().is_err());
        assert!(Identifier::new("cwr.work_id", "W1").validate().is_ok());
    }

    #[test]
    fn test_serde_uses_type_field() {
        let json = serde_json::to_value(Identifier::dpid("PADPIDA2014")).unwrap();
        assert_eq!(json["type"], "dpid");
        assert_eq!(json["value"], "PADPIDA2014");
    }

    #[test]
    fn test_display() {
        assert_eq!(Identifier::upc("00602537").to_string(), "upc:00602537");
    }
}
