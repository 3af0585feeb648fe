//! Provenance-aware merging of per-source claims.
//!
//! The index never collapses claims. When a caller wants a single "current"
//! value for a field, [`StringValue::merge`] picks it deterministically:
//! the claim from the source with the highest [`SourcePolicy`] priority wins,
//! and equal priorities fall back to the most recently ingested claim.
//!
//! ```no_run
//! use std::path::Path;
//! use polyphon_core::provenance::SourcePolicy;
//!
//! let policy = SourcePolicy::load(Path::new("config/sources.toml")).unwrap();
//! let priority = policy.priority_for("musicbrainz");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::RecordId;

/// Per-source priorities used to choose a "current" value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePolicy {
    /// Source name to priority (higher wins).
    #[serde(default)]
    pub source_priority: BTreeMap<String, u32>,
}

impl SourcePolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_priority(mut self, source: impl Into<String>, priority: u32) -> Self {
        self.source_priority.insert(source.into(), priority);
        self
    }

    /// Load a policy from a TOML file with a `[source_priority]` table.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            Error::InvalidData(format!(
                "failed to parse source policy from {}: {e}",
                path.display()
            ))
        })
    }

    /// Get the priority for a given source name.
    ///
    /// Returns 0 if the source is not found in the priority map.
    #[must_use]
    pub fn priority_for(&self, source: &str) -> u32 {
        if let Some(&priority) = self.source_priority.get(source) {
            return priority;
        }
        self.source_priority
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(source))
            .map_or(0, |(_, &priority)| priority)
    }
}

/// One source's claim for a field, as handed to [`StringValue::merge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub value: String,
    pub source: String,

    /// Record row the claim was read from; larger means ingested later.
    pub record: RecordId,
}

/// One source's value for a field, with its policy score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringSource {
    pub value: String,
    pub source: String,
    pub score: u32,
}

/// A merged scalar field: every claim plus the chosen current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringValue {
    pub value: String,
    pub sources: Vec<StringSource>,
}

impl StringValue {
    /// Merge claims for one field. Returns `None` when there are no claims.
    ///
    /// `sources` lists every claim in ingestion order. `value` is the claim
    /// with the highest source priority, ties going to the latest record.
    #[must_use]
    pub fn merge(claims: impl IntoIterator<Item = Claim>, policy: &SourcePolicy) -> Option<Self> {
        let mut claims: Vec<Claim> = claims.into_iter().collect();
        claims.sort_by_key(|c| c.record);

        let current = claims
            .iter()
            .max_by_key(|c| (policy.priority_for(&c.source), c.record))?
            .value
            .clone();

        let sources = claims
            .into_iter()
            .map(|c| StringSource {
                score: policy.priority_for(&c.source),
                value: c.value,
                source: c.source,
            })
            .collect();

        Some(Self {
            value: current,
            sources,
        })
    }

    /// True when every source agrees on the value.
    #[must_use]
    pub fn is_unanimous(&self) -> bool {
        self.sources.iter().all(|s| s.value == self.value)
    }
}
