use rusqlite::types::ToSql;
use rusqlite::{params, Connection};

use crate::error::Result;
use crate::model::{
    ComposerWorkLink, ContributorRecordingLink, Direction, EpisodeSupplementalLink,
    IdentifierId, IdentifierRecord, Link, LinkAttributes, LinkId, LinkKind, LinkRecord,
    OrganisationEpisodeLink, OrganisationSeasonLink, OrganisationSeriesLink,
    PerformerRecordingLink, PerformerReleaseLink, PerformerSongLink, PublisherWorkLink,
    RecordLabelRecordingLink, RecordLabelReleaseLink, RecordLabelSongLink, RecordingWorkLink,
    ReleaseRecordingLink, ReleaseSongLink, SeasonEpisodeLink, SeriesSeasonLink, Shares,
    SongRecordingLink, Source, SourceId,
};
use crate::schema::Index;

use super::identifiers::resolve_identifier;
use super::sources::resolve_source;
use super::{is_unique_violation, quoted};

const SHARE_COLUMNS: [&str; 3] = ["pr_share", "mr_share", "sr_share"];

// Link store
impl Index {
    /// Create-or-find a link between two identifiers on behalf of `source`.
    ///
    /// Both identifiers are created when absent. For the rights-share kinds a
    /// replay with the same (A, B, role, source) overwrites the stored shares;
    /// every other kind is append-or-find only.
    pub fn create_link(&mut self, link: impl Into<Link>, source: &Source) -> Result<LinkRecord> {
        let link = link.into();
        link.validate()?;

        let tx = self.begin_write()?;
        let source = resolve_source(&tx, &source.name)?;
        let a = resolve_identifier(&tx, &link.a)?;
        let b = resolve_identifier(&tx, &link.b)?;
        let id = upsert_link(&tx, &link, a.id, b.id, source.id)?;
        tx.commit()?;

        log::debug!(
            "Linked {} -> {} as {} #{id} from {}",
            a.identifier,
            b.identifier,
            link.kind,
            source.name
        );

        let (role, shares) = match link.kind.attributes() {
            LinkAttributes::None => (None, None),
            LinkAttributes::Role => (reported_role(link.stored_role()), None),
            LinkAttributes::RoleAndShares => (
                reported_role(link.stored_role()),
                Some(link.shares.unwrap_or_default()),
            ),
        };
        Ok(LinkRecord {
            id,
            kind: link.kind,
            a,
            b,
            role,
            shares,
            source: source.id,
        })
    }

    /// Links of `kind` touching `identifier`: on endpoint A when walking
    /// [`Direction::Forward`], on endpoint B when walking [`Direction::Reverse`].
    pub fn links(
        &self,
        kind: LinkKind,
        direction: Direction,
        identifier: &IdentifierRecord,
    ) -> Result<Vec<LinkRecord>> {
        let attributes = kind.attributes();
        let (a_col, b_col) = kind.endpoint_columns();
        let seed_col = match direction {
            Direction::Forward => a_col,
            Direction::Reverse => b_col,
        };

        let mut select = vec![
            "l.id", "ia.id", "ia.type", "ia.value", "ib.id", "ib.type", "ib.value", "l.source",
        ];
        if attributes != LinkAttributes::None {
            select.push("l.role");
        }
        if attributes == LinkAttributes::RoleAndShares {
            select.extend(["l.pr_share", "l.mr_share", "l.sr_share"]);
        }
        let sql = format!(
            "SELECT {}
             FROM {} l
             JOIN identifier ia ON ia.id = l.{a_col}
             JOIN identifier ib ON ib.id = l.{b_col}
             WHERE l.{seed_col} = ?1
             ORDER BY l.id",
            select.join(", "),
            quoted(kind.as_str()),
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let links = stmt
            .query_map([identifier.id], |row| {
                let role = match attributes {
                    LinkAttributes::None => None,
                    _ => reported_role(&row.get::<_, String>(8)?),
                };
                let shares = match attributes {
                    LinkAttributes::RoleAndShares => {
                        Some(Shares::new(row.get(9)?, row.get(10)?, row.get(11)?))
                    }
                    _ => None,
                };
                Ok(LinkRecord {
                    id: row.get(0)?,
                    kind,
                    a: IdentifierRecord::from_row(row, 1)?,
                    b: IdentifierRecord::from_row(row, 4)?,
                    role,
                    shares,
                    source: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(links)
    }
}

/// Roles are stored empty when absent; readers see `None`.
fn reported_role(stored: &str) -> Option<String> {
    (!stored.is_empty()).then(|| stored.to_string())
}

/// Insert the link row, or find the one already stored under the same unique
/// key. Rights shares are overwritten on the found row.
fn upsert_link(
    conn: &Connection,
    link: &Link,
    a: IdentifierId,
    b: IdentifierId,
    source: SourceId,
) -> Result<LinkId> {
    let kind = link.kind;
    let attributes = kind.attributes();
    let table = quoted(kind.as_str());
    let (a_col, b_col) = kind.endpoint_columns();

    let role = link.stored_role();
    let mut key_columns = vec![a_col, b_col];
    let mut key: Vec<&dyn ToSql> = vec![&a, &b];
    if attributes != LinkAttributes::None {
        key_columns.push("role");
        key.push(&role);
    }
    key_columns.push("source");
    key.push(&source);

    let shares = link.shares.unwrap_or_default();
    let share_values = [shares.performance, shares.mechanical, shares.synchronization];

    let mut columns = key_columns.clone();
    let mut values = key.clone();
    if attributes == LinkAttributes::RoleAndShares {
        columns.extend(SHARE_COLUMNS);
        values.extend(share_values.iter().map(|v| v as &dyn ToSql));
    }

    let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{i}")).collect();
    let insert = format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    );

    match conn.execute(&insert, values.as_slice()) {
        Ok(_) => Ok(LinkId::new(conn.last_insert_rowid())),
        Err(err) if is_unique_violation(&err) => {
            let predicate: Vec<String> = key_columns
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{c} = ?{}", i + 1))
                .collect();
            let select = format!("SELECT id FROM {table} WHERE {}", predicate.join(" AND "));
            let id: LinkId = conn.query_row(&select, key.as_slice(), |row| row.get(0))?;

            if attributes == LinkAttributes::RoleAndShares {
                let updated = conn.execute(
                    &format!(
                        "UPDATE {table} SET pr_share = ?1, mr_share = ?2, sr_share = ?3 WHERE id = ?4"
                    ),
                    params![share_values[0], share_values[1], share_values[2], id],
                )?;
                log::debug!("Updated shares on {kind} #{id} ({updated} row)");
            }
            Ok(id)
        }
        Err(err) => Err(err.into()),
    }
}

macro_rules! link_operations {
    ($( $variant:ident($input:ident): $create:ident, $forward:ident, $reverse:ident; )+) => {
        impl Index {
            $(
                #[doc = concat!("Create-or-find a `", stringify!($variant), "` link.")]
                pub fn $create(&mut self, link: $input, source: &Source) -> Result<LinkRecord> {
                    self.create_link(link, source)
                }

                #[doc = concat!(
                    "`", stringify!($variant),
                    "` links whose first endpoint is `identifier`."
                )]
                pub fn $forward(&self, identifier: &IdentifierRecord) -> Result<Vec<LinkRecord>> {
                    self.links(LinkKind::$variant, Direction::Forward, identifier)
                }

                #[doc = concat!(
                    "`", stringify!($variant),
                    "` links whose second endpoint is `identifier`."
                )]
                pub fn $reverse(&self, identifier: &IdentifierRecord) -> Result<Vec<LinkRecord>> {
                    self.links(LinkKind::$variant, Direction::Reverse, identifier)
                }
            )+
        }
    };
}

link_operations! {
    PerformerRecording(PerformerRecordingLink):
        create_performer_recording_link, performer_recordings, recording_performers;
    PerformerSong(PerformerSongLink):
        create_performer_song_link, performer_songs, song_performers;
    PerformerRelease(PerformerReleaseLink):
        create_performer_release_link, performer_releases, release_performers;
    ContributorRecording(ContributorRecordingLink):
        create_contributor_recording_link, contributor_recordings, recording_contributors;
    ComposerWork(ComposerWorkLink):
        create_composer_work_link, composer_works, work_composers;
    PublisherWork(PublisherWorkLink):
        create_publisher_work_link, publisher_works, work_publishers;
    RecordLabelRecording(RecordLabelRecordingLink):
        create_record_label_recording_link, record_label_recordings, recording_record_labels;
    RecordLabelSong(RecordLabelSongLink):
        create_record_label_song_link, record_label_songs, song_record_labels;
    RecordLabelRelease(RecordLabelReleaseLink):
        create_record_label_release_link, record_label_releases, release_record_labels;
    SongRecording(SongRecordingLink):
        create_song_recording_link, song_recordings, recording_songs;
    ReleaseRecording(ReleaseRecordingLink):
        create_release_recording_link, release_recordings, recording_releases;
    RecordingWork(RecordingWorkLink):
        create_recording_work_link, recording_works, work_recordings;
    ReleaseSong(ReleaseSongLink):
        create_release_song_link, release_songs, song_releases;
    OrganisationSeries(OrganisationSeriesLink):
        create_organisation_series_link, organisation_series, series_organisations;
    OrganisationSeason(OrganisationSeasonLink):
        create_organisation_season_link, organisation_seasons, season_organisations;
    OrganisationEpisode(OrganisationEpisodeLink):
        create_organisation_episode_link, organisation_episodes, episode_organisations;
    SeriesSeason(SeriesSeasonLink):
        create_series_season_link, series_seasons, season_series;
    SeasonEpisode(SeasonEpisodeLink):
        create_season_episode_link, season_episodes, episode_seasons;
    EpisodeSupplemental(EpisodeSupplementalLink):
        create_episode_supplemental_link, episode_supplementals, supplemental_episodes;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Identifier, Performer, RecordKind, Recording};

    fn composer_work(pr: f64) -> ComposerWorkLink {
        ComposerWorkLink {
            composer: Identifier::ipi("00014107338"),
            work: Identifier::iswc("T-000000001-0"),
            role: "Composer".to_string(),
            shares: Shares::new(Some(pr), None, None),
        }
    }

    fn performer_recording(role: &str) -> PerformerRecordingLink {
        PerformerRecordingLink {
            performer: Identifier::dpid("P1"),
            recording: Identifier::isrc("CASE01000001"),
            role: role.to_string(),
        }
    }

    #[test]
    fn test_link_auto_vivifies_identifiers() {
        let mut index = Index::open_in_memory().unwrap();
        let link = index
            .create_performer_recording_link(performer_recording("MainArtist"), &Source::new("ernImport"))
            .unwrap();
        assert_eq!(link.a.identifier, Identifier::dpid("P1"));
        assert_eq!(link.b.identifier, Identifier::isrc("CASE01000001"));
        assert_eq!(link.role.as_deref(), Some("MainArtist"));

        let stats = index.stats().unwrap();
        assert_eq!(stats.identifiers, 2);
        assert_eq!(stats.assignments, 0);
        assert_eq!(stats.links[&LinkKind::PerformerRecording], 1);
    }

    #[test]
    fn test_link_replay_creates_no_row() {
        let mut index = Index::open_in_memory().unwrap();
        let source = Source::new("ernImport");
        let first = index
            .create_performer_recording_link(performer_recording("MainArtist"), &source)
            .unwrap();
        let second = index
            .create_performer_recording_link(performer_recording("MainArtist"), &source)
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(index.stats().unwrap().links[&LinkKind::PerformerRecording], 1);
    }

    #[test]
    fn test_role_distinguishes_links() {
        let mut index = Index::open_in_memory().unwrap();
        let source = Source::new("ernImport");
        index
            .create_performer_recording_link(performer_recording("MainArtist"), &source)
            .unwrap();
        index
            .create_performer_recording_link(performer_recording("FeaturedArtist"), &source)
            .unwrap();
        let performer = index.resolve_identifier(&Identifier::dpid("P1")).unwrap();
        let roles: Vec<_> = index
            .performer_recordings(&performer)
            .unwrap()
            .into_iter()
            .filter_map(|l| l.role)
            .collect();
        assert_eq!(roles, vec!["MainArtist", "FeaturedArtist"]);
    }

    #[test]
    fn test_share_replay_overwrites_shares() {
        let mut index = Index::open_in_memory().unwrap();
        let source = Source::new("cwr");
        let first = index
            .create_composer_work_link(composer_work(50.0), &source)
            .unwrap();
        let second = index
            .create_composer_work_link(composer_work(60.0), &source)
            .unwrap();
        assert_eq!(first.id, second.id);

        let work = index
            .resolve_identifier(&Identifier::iswc("T-000000001-0"))
            .unwrap();
        let links = index.work_composers(&work).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].shares.unwrap().performance, Some(60.0));
        assert_eq!(links[0].role.as_deref(), Some("Composer"));
    }

    #[test]
    fn test_share_links_from_other_sources_are_separate() {
        let mut index = Index::open_in_memory().unwrap();
        index
            .create_composer_work_link(composer_work(50.0), &Source::new("cwr"))
            .unwrap();
        index
            .create_composer_work_link(composer_work(40.0), &Source::new("musicbrainz"))
            .unwrap();

        let composer = index.resolve_identifier(&Identifier::ipi("00014107338")).unwrap();
        let shares: Vec<_> = index
            .composer_works(&composer)
            .unwrap()
            .into_iter()
            .filter_map(|l| l.shares.and_then(|s| s.performance))
            .collect();
        assert_eq!(shares, vec![50.0, 40.0]);
    }

    #[test]
    fn test_publisher_share_replay() {
        let mut index = Index::open_in_memory().unwrap();
        let source = Source::new("cwr");
        let link = |mr: f64| PublisherWorkLink {
            publisher: Identifier::ipi("00000000001"),
            work: Identifier::iswc("T-1"),
            role: "OriginalPublisher".to_string(),
            shares: Shares::new(None, Some(mr), None),
        };
        index.create_publisher_work_link(link(25.0), &source).unwrap();
        index.create_publisher_work_link(link(75.0), &source).unwrap();

        let publisher = index.resolve_identifier(&Identifier::ipi("00000000001")).unwrap();
        let links = index.publisher_works(&publisher).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].shares.unwrap().mechanical, Some(75.0));
    }

    #[test]
    fn test_attribute_less_link_round_trip() {
        let mut index = Index::open_in_memory().unwrap();
        index
            .create_release_song_link(
                ReleaseSongLink {
                    release: Identifier::upc("00602537"),
                    song: Identifier::grid("A1-2425G-ABC1234002-M"),
                },
                &Source::new("ernImport"),
            )
            .unwrap();

        let song = index
            .resolve_identifier(&Identifier::grid("A1-2425G-ABC1234002-M"))
            .unwrap();
        let links = index.song_releases(&song).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].role, None);
        assert_eq!(links[0].neighbour(Direction::Reverse).identifier, Identifier::upc("00602537"));
        assert!(index.release_songs(&song).unwrap().is_empty());
    }

    #[test]
    fn test_links_reach_records_asserted_by_other_sources() {
        let mut index = Index::open_in_memory().unwrap();
        index
            .create_record(
                Performer::new("Alice"),
                &Identifier::dpid("P1"),
                &Source::new("musicbrainz"),
            )
            .unwrap();
        index
            .create_record(
                Recording::new("Track A", "PT3M"),
                &Identifier::isrc("CASE01000001"),
                &Source::new("ernImport"),
            )
            .unwrap();
        index
            .create_performer_recording_link(performer_recording("MainArtist"), &Source::new("ernImport"))
            .unwrap();

        let recording = index
            .lookup_identifier(RecordKind::Recording, &Identifier::isrc("CASE01000001"))
            .unwrap();
        let links = index.recording_performers(&recording).unwrap();
        let performers = index.performers(&links[0].a).unwrap();
        assert_eq!(performers[0].fact.name, "Alice");
    }

    #[test]
    fn test_missing_role_reads_as_none() {
        let mut index = Index::open_in_memory().unwrap();
        let created = index
            .create_link(
                Link::new(
                    LinkKind::PerformerRecording,
                    Identifier::dpid("P1"),
                    Identifier::isrc("R1"),
                ),
                &Source::new("ernImport"),
            )
            .unwrap();
        assert_eq!(created.role, None);

        let performer = index.resolve_identifier(&Identifier::dpid("P1")).unwrap();
        let links = index.performer_recordings(&performer).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].role, None);
    }

    #[test]
    fn test_failed_link_insert_rolls_back() {
        let mut index = Index::open_in_memory().unwrap();
        // Reject every link row so the transaction fails after both
        // identifiers and the source were written.
        index
            .conn()
            .execute_batch(
                "CREATE TRIGGER reject_link BEFORE INSERT ON performer_recording
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let err = index
            .create_performer_recording_link(performer_recording("MainArtist"), &Source::new("ernImport"))
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::Database(_)));

        let stats = index.stats().unwrap();
        assert_eq!(stats.identifiers, 0);
        assert_eq!(stats.sources, 0);
        assert_eq!(stats.links[&LinkKind::PerformerRecording], 0);
    }

    #[test]
    fn test_invalid_link_writes_nothing() {
        let mut index = Index::open_in_memory().unwrap();
        let link = Link::new(
            LinkKind::SongRecording,
            Identifier::grid("G1"),
            Identifier::isrc("R1"),
        )
        .with_role("Main");
        assert!(index.create_link(link, &Source::new("ernImport")).is_err());
        assert_eq!(index.stats().unwrap().identifiers, 0);
    }
}
