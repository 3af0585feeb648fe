//! The JSON-lines fact feed handed over by format-specific importers.
//!
//! Each line carries either a record bound to an identifier or a link between
//! two identifiers, optionally naming the source that asserts it:
//!
//! ```text
//! {"record": {"kind": "recording", "title": "Track A", "duration": "PT3M"}, "identifier": {"type": "isrc", "value": "CASE01000001"}, "source": "ernImport"}
//! {"link": {"kind": "performer_recording", "a": {"type": "dpid", "value": "P1"}, "b": {"type": "isrc", "value": "CASE01000001"}, "role": "MainArtist"}}
//! ```

use polyphon_core::model::{Identifier, Link, Record};
use polyphon_core::{Error, Result};
use serde::Deserialize;

/// The fact carried by one feed line.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedFact {
    Record {
        record: Record,
        identifier: Identifier,
    },
    Link(Link),
}

/// One parsed feed line.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub fact: FeedFact,

    /// Source asserting the fact; the feed's default when absent.
    pub source: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntry {
    record: Option<Record>,
    identifier: Option<Identifier>,
    link: Option<Link>,
    source: Option<String>,
}

impl FeedEntry {
    /// Parse one line. Returns `Ok(None)` for blank lines and `#` comments.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let raw: RawEntry = serde_json::from_str(line)?;
        let fact = match (raw.record, raw.identifier, raw.link) {
            (Some(record), Some(identifier), None) => FeedFact::Record { record, identifier },
            (Some(_), None, None) => {
                return Err(Error::InvalidData(
                    "record entry has no identifier".to_string(),
                ))
            }
            (None, None, Some(link)) => FeedFact::Link(link),
            (None, Some(_), Some(_)) => {
                return Err(Error::InvalidData(
                    "link entry must not carry an identifier".to_string(),
                ))
            }
            (Some(_), _, Some(_)) => {
                return Err(Error::InvalidData(
                    "entry carries both a record and a link".to_string(),
                ))
            }
            (None, _, None) => {
                return Err(Error::InvalidData(
                    "entry carries neither a record nor a link".to_string(),
                ))
            }
        };

        if raw.source.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(Error::InvalidData("source must not be empty".to_string()));
        }

        Ok(Some(Self {
            fact,
            source: raw.source,
        }))
    }
}
