//! Integration tests for the provenance index on a file-backed database.

use polyphon_core::model::{
    ComposerWorkLink, Identifier, PerformerRecordingLink, RecordKind, Recording, Shares, Source,
};
use polyphon_core::{Error, Index, IndexOptions, Resolver, SourcePolicy};
use std::path::Path;
use std::thread;
use tempfile::TempDir;

fn open(path: &Path) -> Index {
    Index::open(path, IndexOptions::default()).unwrap()
}

/// The ISRC scenario: two sources title the same recording differently and
/// both claims survive.
#[test]
fn test_two_sources_two_recordings() {
    let dir = TempDir::new().unwrap();
    let mut index = open(&dir.path().join("polyphon.db"));
    let isrc = Identifier::isrc("CASE01000001");

    index
        .create_record(Recording::new("Track A", "PT3M"), &isrc, &Source::new("ernImport"))
        .unwrap();
    index
        .create_record(
            Recording::new("Track A (MB)", "PT3M"),
            &isrc,
            &Source::new("musicbrainz"),
        )
        .unwrap();

    let seed = index.lookup_identifier(RecordKind::Recording, &isrc).unwrap();
    let rows = index.recordings(&seed).unwrap();
    let titles: Vec<_> = rows
        .iter()
        .map(|r| {
            (
                r.fact.title.clone(),
                index.source(r.source).unwrap().name,
            )
        })
        .collect();
    assert_eq!(
        titles,
        vec![
            ("Track A".to_string(), "ernImport".to_string()),
            ("Track A (MB)".to_string(), "musicbrainz".to_string()),
        ]
    );
}

/// Unknown identifiers are an error, not an empty result.
#[test]
fn test_lookup_before_ingestion() {
    let dir = TempDir::new().unwrap();
    let index = open(&dir.path().join("polyphon.db"));
    let err = index
        .lookup_identifier(RecordKind::Performer, &Identifier::dpid("UNKNOWN"))
        .unwrap_err();
    assert!(matches!(err, Error::IdentifierNotFound { .. }));
}

/// Data written through one connection is visible to a later one.
#[test]
fn test_index_persists_across_opens() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("polyphon.db");
    {
        let mut index = open(&path);
        index
            .create_performer_recording_link(
                PerformerRecordingLink {
                    performer: Identifier::dpid("P1"),
                    recording: Identifier::isrc("CASE01000001"),
                    role: "MainArtist".to_string(),
                },
                &Source::new("ernImport"),
            )
            .unwrap();
    }

    let mut index = open(&path);
    let performer = index.resolve_identifier(&Identifier::dpid("P1")).unwrap();
    assert_eq!(index.performer_recordings(&performer).unwrap().len(), 1);
}

/// Concurrent writers ingesting the same facts converge on one row each.
#[test]
fn test_concurrent_replays_converge() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("polyphon.db");
    drop(open(&path));

    let handles: Vec<_> = (0..4)
        .map(|n| {
            let path = path.clone();
            thread::spawn(move || {
                let mut index = open(&path);
                for _ in 0..10 {
                    index
                        .create_record(
                            Recording::new("Track A", "PT3M"),
                            &Identifier::isrc("CASE01000001"),
                            &Source::new("ernImport"),
                        )
                        .unwrap();
                    index
                        .create_composer_work_link(
                            ComposerWorkLink {
                                composer: Identifier::ipi("00014107338"),
                                work: Identifier::iswc("T-1"),
                                role: "Composer".to_string(),
                                shares: Shares::new(Some(f64::from(n) * 10.0), None, None),
                            },
                            &Source::new("cwr"),
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let index = open(&path);
    let stats = index.stats().unwrap();
    assert_eq!(stats.sources, 2);
    assert_eq!(stats.identifiers, 3);
    assert_eq!(stats.assignments, 1);
    assert_eq!(stats.total_records(), 1);
    assert_eq!(stats.total_links(), 1);
}

/// Resolution over a file-backed index honours the configured priorities.
#[test]
fn test_resolver_over_file_index() {
    let dir = TempDir::new().unwrap();
    let mut index = open(&dir.path().join("polyphon.db"));
    let isrc = Identifier::isrc("CASE01000001");
    for (title, source) in [("Track A", "ernImport"), ("Track A (MB)", "musicbrainz")] {
        index
            .create_record(Recording::new(title, "PT3M"), &isrc, &Source::new(source))
            .unwrap();
    }

    let policy = SourcePolicy::new().with_priority("ernImport", 100);
    let view = Resolver::new(&index, &policy)
        .resolve(RecordKind::Recording, &isrc, 1)
        .unwrap();
    let title = view.field("title").unwrap();
    assert_eq!(title.value, "Track A");
    assert_eq!(title.sources.len(), 2);
}
