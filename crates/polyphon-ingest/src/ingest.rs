//! Batch ingestion of JSON-lines feeds into the index.

use polyphon_core::model::Source;
use polyphon_core::Index;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{is_entry_error, IngestError, IngestResult};
use crate::feed::{FeedFact, FeedEntry};

/// File extensions picked up when walking a feed directory.
const FEED_EXTENSIONS: &[&str] = &["jsonl", "ndjson"];

/// A feed entry that was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFailure {
    pub origin: String,
    pub line: usize,
    pub message: String,
}

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub files: usize,
    pub records: usize,
    pub links: usize,

    /// Blank and comment lines.
    pub skipped: usize,
    pub failures: Vec<EntryFailure>,
}

impl IngestSummary {
    /// Fold another run into this one.
    pub fn absorb(&mut self, other: Self) {
        self.files += other.files;
        self.records += other.records;
        self.links += other.links;
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Applies feed entries to an [`Index`], one transaction per entry.
#[derive(Debug)]
pub struct Ingester<'a> {
    index: &'a mut Index,
    fail_fast: bool,
}

impl<'a> Ingester<'a> {
    #[must_use]
    pub fn new(index: &'a mut Index) -> Self {
        Self {
            index,
            fail_fast: false,
        }
    }

    /// Abort on the first bad entry instead of recording it and moving on.
    #[must_use]
    pub const fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Ingest every line of `reader`. `origin` names the feed in failures;
    /// entries without a source are attributed to `default_source`.
    ///
    /// # Errors
    ///
    /// Storage errors always abort. Bad entries abort only in fail-fast mode.
    pub fn ingest_reader<R: BufRead>(
        &mut self,
        reader: R,
        origin: &str,
        default_source: &str,
    ) -> IngestResult<IngestSummary> {
        let mut summary = IngestSummary::default();

        for (n, bytes) in reader.split(b'\n').enumerate() {
            let line_no = n + 1;
            let bytes = bytes.map_err(|source| IngestError::Io {
                path: PathBuf::from(origin),
                source,
            })?;

            let outcome = match String::from_utf8(bytes) {
                Ok(line) => FeedEntry::parse(&line).and_then(|entry| match entry {
                    Some(entry) => self.apply(entry, default_source).map(Some),
                    None => Ok(None),
                }),
                Err(e) => Err(polyphon_core::Error::InvalidData(format!(
                    "line is not valid UTF-8: {e}"
                ))),
            };

            match outcome {
                Ok(Some(Applied::Record)) => summary.records += 1,
                Ok(Some(Applied::Link)) => summary.links += 1,
                Ok(None) => summary.skipped += 1,
                Err(err) if is_entry_error(&err) => {
                    log::warn!("Skipping {origin}:{line_no}: {err}");
                    if self.fail_fast {
                        return Err(IngestError::Entry {
                            origin: origin.to_string(),
                            line: line_no,
                            message: err.to_string(),
                        });
                    }
                    summary.failures.push(EntryFailure {
                        origin: origin.to_string(),
                        line: line_no,
                        message: err.to_string(),
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }

        log::info!(
            "Ingested {origin}: {} records, {} links, {} skipped, {} failed",
            summary.records,
            summary.links,
            summary.skipped,
            summary.failures.len()
        );
        Ok(summary)
    }

    /// Ingest one feed file. The default source is `default_source` when
    /// given, otherwise the file stem.
    pub fn ingest_file(
        &mut self,
        path: &Path,
        default_source: Option<&str>,
    ) -> IngestResult<IngestSummary> {
        let source = match default_source {
            Some(source) => source.to_string(),
            None => path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| IngestError::UnsupportedPath(path.to_path_buf()))?
                .to_string(),
        };

        let file = File::open(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut summary =
            self.ingest_reader(BufReader::new(file), &path.display().to_string(), &source)?;
        summary.files = 1;
        Ok(summary)
    }

    /// Ingest a feed file, or every `*.jsonl` / `*.ndjson` file under a
    /// directory in sorted path order.
    pub fn ingest_path(
        &mut self,
        path: &Path,
        default_source: Option<&str>,
    ) -> IngestResult<IngestSummary> {
        let metadata = std::fs::metadata(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if metadata.is_file() {
            return self.ingest_file(path, default_source);
        }
        if !metadata.is_dir() {
            return Err(IngestError::UnsupportedPath(path.to_path_buf()));
        }

        let mut summary = IngestSummary::default();
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() && is_feed_file(entry.path()) {
                summary.absorb(self.ingest_file(entry.path(), default_source)?);
            }
        }
        Ok(summary)
    }

    fn apply(&mut self, entry: FeedEntry, default_source: &str) -> polyphon_core::Result<Applied> {
        let source = Source::new(entry.source.as_deref().unwrap_or(default_source));
        match entry.fact {
            FeedFact::Record { record, identifier } => {
                self.index.create_record(record, &identifier, &source)?;
                Ok(Applied::Record)
            }
            FeedFact::Link(link) => {
                self.index.create_link(link, &source)?;
                Ok(Applied::Link)
            }
        }
    }
}

enum Applied {
    Record,
    Link,
}

fn is_feed_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| FEED_EXTENSIONS.iter().any(|f| ext.eq_ignore_ascii_case(f)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyphon_core::model::{Identifier, RecordKind};

    const FEED: &str = r#"
# two sources disagree on a title
{"record": {"kind": "recording", "title": "Track A", "duration": "PT3M"}, "identifier": {"type": "isrc", "value": "CASE01000001"}}
{"record": {"kind": "recording", "title": "Track A (MB)", "duration": "PT3M"}, "identifier": {"type": "isrc", "value": "CASE01000001"}, "source": "musicbrainz"}
{"link": {"kind": "performer_recording", "a": {"type": "dpid", "value": "P1"}, "b": {"type": "isrc", "value": "CASE01000001"}, "role": "MainArtist"}}
"#;

    #[test]
    fn test_ingest_reader_applies_entries() {
        let mut index = Index::open_in_memory().unwrap();
        let summary = Ingester::new(&mut index)
            .ingest_reader(FEED.as_bytes(), "feed", "ernImport")
            .unwrap();

        assert_eq!(summary.records, 2);
        assert_eq!(summary.links, 1);
        assert_eq!(summary.skipped, 2);
        assert!(summary.is_clean());

        let names: Vec<_> = index.sources().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["ernImport", "musicbrainz"]);

        let seed = index
            .lookup_identifier(RecordKind::Recording, &Identifier::isrc("CASE01000001"))
            .unwrap();
        assert_eq!(index.recordings(&seed).unwrap().len(), 2);
    }

    #[test]
    fn test_replaying_a_feed_is_a_no_op() {
        let mut index = Index::open_in_memory().unwrap();
        let mut ingester = Ingester::new(&mut index);
        ingester.ingest_reader(FEED.as_bytes(), "feed", "ernImport").unwrap();
        ingester.ingest_reader(FEED.as_bytes(), "feed", "ernImport").unwrap();

        let stats = index.stats().unwrap();
        assert_eq!(stats.total_records(), 2);
        assert_eq!(stats.total_links(), 1);
        assert_eq!(stats.assignments, 2);
    }

    #[test]
    fn test_bad_entries_are_recorded_and_skipped() {
        let feed = "{\"record\": {\"kind\": \"album\"}}\n\
                    {\"record\": {\"kind\": \"work\", \"title\": \"X\"}, \"identifier\": {\"type\": \"iswc\", \"value\": \"T-1\"}}\n\
                    {\"record\": {\"kind\": \"work\", \"title\": \"Y\"}, \"identifier\": {\"type\": \"iswc\", \"value\": \"\"}}\n";
        let mut index = Index::open_in_memory().unwrap();
        let summary = Ingester::new(&mut index)
            .ingest_reader(feed.as_bytes(), "feed", "cwr")
            .unwrap();

        assert_eq!(summary.records, 1);
        let lines: Vec<_> = summary.failures.iter().map(|f| f.line).collect();
        assert_eq!(lines, vec![1, 3]);
    }

    #[test]
    fn test_fail_fast_stops_at_first_bad_entry() {
        let feed = "{\"record\": {\"kind\": \"work\", \"title\": \"X\"}, \"identifier\": {\"type\": \"iswc\", \"value\": \"T-1\"}}\n\
                    not json\n\
                    {\"record\": {\"kind\": \"work\", \"title\": \"Y\"}, \"identifier\": {\"type\": \"iswc\", \"value\": \"T-2\"}}\n";
        let mut index = Index::open_in_memory().unwrap();
        let err = Ingester::new(&mut index)
            .fail_fast(true)
            .ingest_reader(feed.as_bytes(), "feed", "cwr")
            .unwrap_err();

        assert!(matches!(err, IngestError::Entry { line: 2, .. }));
        assert!(!err.is_storage());
        assert_eq!(index.stats().unwrap().total_records(), 1);
    }

    #[test]
    fn test_invalid_utf8_line_is_a_failure() {
        let mut feed = Vec::new();
        feed.extend_from_slice(b"{\"record\": {\"kind\": \"work\", \"title\": \"X\"}, \"identifier\": {\"type\": \"iswc\", \"value\": \"T-1\"}}\n");
        feed.extend_from_slice(b"\xff\xfe bad\n");
        feed.extend_from_slice(b"{\"record\": {\"kind\": \"work\", \"title\": \"Y\"}, \"identifier\": {\"type\": \"iswc\", \"value\": \"T-2\"}}\r\n");

        let mut index = Index::open_in_memory().unwrap();
        let summary = Ingester::new(&mut index)
            .ingest_reader(feed.as_slice(), "feed", "cwr")
            .unwrap();

        assert_eq!(summary.records, 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].line, 2);
        assert!(summary.failures[0].message.contains("UTF-8"));
        assert_eq!(index.stats().unwrap().total_records(), 2);
    }

    #[test]
    fn test_invalid_utf8_line_aborts_in_fail_fast_mode() {
        let feed: &[u8] = b"\xff\n";
        let mut index = Index::open_in_memory().unwrap();
        let err = Ingester::new(&mut index)
            .fail_fast(true)
            .ingest_reader(feed, "feed", "cwr")
            .unwrap_err();
        assert!(matches!(err, IngestError::Entry { line: 1, .. }));
    }

    #[test]
    fn test_feed_file_detection() {
        assert!(is_feed_file(Path::new("a/ern.jsonl")));
        assert!(is_feed_file(Path::new("cwr.NDJSON")));
        assert!(!is_feed_file(Path::new("notes.txt")));
        assert!(!is_feed_file(Path::new("jsonl")));
    }
}
