/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
-- Provenance sources
CREATE TABLE IF NOT EXISTS source (
    id         INTEGER PRIMARY KEY,
    name       TEXT NOT NULL,
    first_seen TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS source_unique_idx ON source (name);

-- External identifiers, global and kind-agnostic
CREATE TABLE IF NOT EXISTS identifier (
    id    INTEGER PRIMARY KEY,
    type  TEXT NOT NULL CHECK (type != ''),
    value TEXT NOT NULL CHECK (value != '')
);

CREATE UNIQUE INDEX IF NOT EXISTS identifier_unique_idx ON identifier (type, value);

-- Binding of identifiers to record rows; record_id refers to the table named by record_type
CREATE TABLE IF NOT EXISTS identifier_assignment (
    id            INTEGER PRIMARY KEY,
    identifier_id INTEGER NOT NULL REFERENCES identifier (id),
    record_type   TEXT NOT NULL,
    record_id     INTEGER NOT NULL,
    source        INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS identifier_assignment_identifier_idx ON identifier_assignment (identifier_id);
CREATE INDEX IF NOT EXISTS identifier_assignment_record_idx ON identifier_assignment (record_type, record_id);
CREATE UNIQUE INDEX IF NOT EXISTS identifier_assignment_unique_idx ON identifier_assignment (identifier_id, record_type, record_id, source);

-- Records

CREATE TABLE IF NOT EXISTS performer (
    id     INTEGER PRIMARY KEY,
    name   TEXT NOT NULL,
    source INTEGER NOT NULL REFERENCES source (id)
);

CREATE UNIQUE INDEX IF NOT EXISTS performer_unique_idx ON performer (name, source);

CREATE TABLE IF NOT EXISTS composer (
    id         INTEGER PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name  TEXT NOT NULL,
    source     INTEGER NOT NULL REFERENCES source (id)
);

CREATE UNIQUE INDEX IF NOT EXISTS composer_unique_idx ON composer (first_name, last_name, source);

CREATE TABLE IF NOT EXISTS record_label (
    id     INTEGER PRIMARY KEY,
    name   TEXT NOT NULL,
    source INTEGER NOT NULL REFERENCES source (id)
);

CREATE UNIQUE INDEX IF NOT EXISTS record_label_unique_idx ON record_label (name, source);

CREATE TABLE IF NOT EXISTS publisher (
    id     INTEGER PRIMARY KEY,
    name   TEXT NOT NULL,
    source INTEGER NOT NULL REFERENCES source (id)
);

CREATE UNIQUE INDEX IF NOT EXISTS publisher_unique_idx ON publisher (name, source);

CREATE TABLE IF NOT EXISTS recording (
    id       INTEGER PRIMARY KEY,
    title    TEXT NOT NULL,
    duration TEXT NOT NULL,
    source   INTEGER NOT NULL REFERENCES source (id)
);

CREATE UNIQUE INDEX IF NOT EXISTS recording_unique_idx ON recording (title, duration, source);

CREATE TABLE IF NOT EXISTS work (
    id     INTEGER PRIMARY KEY,
    title  TEXT NOT NULL,
    source INTEGER NOT NULL REFERENCES source (id)
);

CREATE UNIQUE INDEX IF NOT EXISTS work_unique_idx ON work (title, source);

CREATE TABLE IF NOT EXISTS song (
    id       INTEGER PRIMARY KEY,
    title    TEXT NOT NULL,
    duration TEXT NOT NULL,
    source   INTEGER NOT NULL REFERENCES source (id)
);

CREATE UNIQUE INDEX IF NOT EXISTS song_unique_idx ON song (title, duration, source);

CREATE TABLE IF NOT EXISTS release (
    id     INTEGER PRIMARY KEY,
    type   TEXT NOT NULL,
    title  TEXT NOT NULL,
    date   TEXT NOT NULL,
    source INTEGER NOT NULL REFERENCES source (id)
);

CREATE UNIQUE INDEX IF NOT EXISTS release_unique_idx ON release (type, title, date, source);

-- Links

CREATE TABLE IF NOT EXISTS performer_recording (
    id                   INTEGER PRIMARY KEY,
    performer_identifier INTEGER NOT NULL REFERENCES identifier (id),
    recording_identifier INTEGER NOT NULL REFERENCES identifier (id),
    role                 TEXT NOT NULL DEFAULT '',
    source               INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS performer_recording_performer_idx ON performer_recording (performer_identifier);
CREATE INDEX IF NOT EXISTS performer_recording_recording_idx ON performer_recording (recording_identifier);
CREATE UNIQUE INDEX IF NOT EXISTS performer_recording_unique_idx ON performer_recording (performer_identifier, recording_identifier, role, source);

CREATE TABLE IF NOT EXISTS performer_song (
    id                   INTEGER PRIMARY KEY,
    performer_identifier INTEGER NOT NULL REFERENCES identifier (id),
    song_identifier      INTEGER NOT NULL REFERENCES identifier (id),
    role                 TEXT NOT NULL DEFAULT '',
    source               INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS performer_song_performer_idx ON performer_song (performer_identifier);
CREATE INDEX IF NOT EXISTS performer_song_song_idx ON performer_song (song_identifier);
CREATE UNIQUE INDEX IF NOT EXISTS performer_song_unique_idx ON performer_song (performer_identifier, song_identifier, role, source);

CREATE TABLE IF NOT EXISTS performer_release (
    id                   INTEGER PRIMARY KEY,
    performer_identifier INTEGER NOT NULL REFERENCES identifier (id),
    release_identifier   INTEGER NOT NULL REFERENCES identifier (id),
    role                 TEXT NOT NULL DEFAULT '',
    source               INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS performer_release_performer_idx ON performer_release (performer_identifier);
CREATE INDEX IF NOT EXISTS performer_release_release_idx ON performer_release (release_identifier);
CREATE UNIQUE INDEX IF NOT EXISTS performer_release_unique_idx ON performer_release (performer_identifier, release_identifier, role, source);

CREATE TABLE IF NOT EXISTS composer_work (
    id                  INTEGER PRIMARY KEY,
    composer_identifier INTEGER NOT NULL REFERENCES identifier (id),
    work_identifier     INTEGER NOT NULL REFERENCES identifier (id),
    role                TEXT NOT NULL DEFAULT '',
    source              INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS composer_work_composer_idx ON composer_work (composer_identifier);
CREATE INDEX IF NOT EXISTS composer_work_work_idx ON composer_work (work_identifier);
CREATE UNIQUE INDEX IF NOT EXISTS composer_work_unique_idx ON composer_work (composer_identifier, work_identifier, role, source);

CREATE TABLE IF NOT EXISTS record_label_recording (
    id                      INTEGER PRIMARY KEY,
    record_label_identifier INTEGER NOT NULL REFERENCES identifier (id),
    recording_identifier    INTEGER NOT NULL REFERENCES identifier (id),
    source                  INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS record_label_recording_record_label_idx ON record_label_recording (record_label_identifier);
CREATE INDEX IF NOT EXISTS record_label_recording_recording_idx ON record_label_recording (recording_identifier);
CREATE UNIQUE INDEX IF NOT EXISTS record_label_recording_unique_idx ON record_label_recording (record_label_identifier, recording_identifier, source);

CREATE TABLE IF NOT EXISTS record_label_song (
    id                      INTEGER PRIMARY KEY,
    record_label_identifier INTEGER NOT NULL REFERENCES identifier (id),
    song_identifier         INTEGER NOT NULL REFERENCES identifier (id),
    source                  INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS record_label_song_record_label_idx ON record_label_song (record_label_identifier);
CREATE INDEX IF NOT EXISTS record_label_song_song_idx ON record_label_song (song_identifier);
CREATE UNIQUE INDEX IF NOT EXISTS record_label_song_unique_idx ON record_label_song (record_label_identifier, song_identifier, source);

CREATE TABLE IF NOT EXISTS record_label_release (
    id                      INTEGER PRIMARY KEY,
    record_label_identifier INTEGER NOT NULL REFERENCES identifier (id),
    release_identifier      INTEGER NOT NULL REFERENCES identifier (id),
    source                  INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS record_label_release_record_label_idx ON record_label_release (record_label_identifier);
CREATE INDEX IF NOT EXISTS record_label_release_release_idx ON record_label_release (release_identifier);
CREATE UNIQUE INDEX IF NOT EXISTS record_label_release_unique_idx ON record_label_release (record_label_identifier, release_identifier, source);

CREATE TABLE IF NOT EXISTS publisher_work (
    id                   INTEGER PRIMARY KEY,
    publisher_identifier INTEGER NOT NULL REFERENCES identifier (id),
    work_identifier      INTEGER NOT NULL REFERENCES identifier (id),
    source               INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS publisher_work_publisher_idx ON publisher_work (publisher_identifier);
CREATE INDEX IF NOT EXISTS publisher_work_work_idx ON publisher_work (work_identifier);
CREATE UNIQUE INDEX IF NOT EXISTS publisher_work_unique_idx ON publisher_work (publisher_identifier, work_identifier, source);

CREATE TABLE IF NOT EXISTS song_recording (
    id                   INTEGER PRIMARY KEY,
    song_identifier      INTEGER NOT NULL REFERENCES identifier (id),
    recording_identifier INTEGER NOT NULL REFERENCES identifier (id),
    source               INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS song_recording_song_idx ON song_recording (song_identifier);
CREATE INDEX IF NOT EXISTS song_recording_recording_idx ON song_recording (recording_identifier);
CREATE UNIQUE INDEX IF NOT EXISTS song_recording_unique_idx ON song_recording (song_identifier, recording_identifier, source);

CREATE TABLE IF NOT EXISTS release_recording (
    id                   INTEGER PRIMARY KEY,
    release_identifier   INTEGER NOT NULL REFERENCES identifier (id),
    recording_identifier INTEGER NOT NULL REFERENCES identifier (id),
    source               INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS release_recording_release_idx ON release_recording (release_identifier);
CREATE INDEX IF NOT EXISTS release_recording_recording_idx ON release_recording (recording_identifier);
CREATE UNIQUE INDEX IF NOT EXISTS release_recording_unique_idx ON release_recording (release_identifier, recording_identifier, source);

CREATE TABLE IF NOT EXISTS recording_work (
    id                   INTEGER PRIMARY KEY,
    recording_identifier INTEGER NOT NULL REFERENCES identifier (id),
    work_identifier      INTEGER NOT NULL REFERENCES identifier (id),
    source               INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS recording_work_recording_idx ON recording_work (recording_identifier);
CREATE INDEX IF NOT EXISTS recording_work_work_idx ON recording_work (work_identifier);
CREATE UNIQUE INDEX IF NOT EXISTS recording_work_unique_idx ON recording_work (recording_identifier, work_identifier, source);

CREATE TABLE IF NOT EXISTS release_song (
    id                 INTEGER PRIMARY KEY,
    release_identifier INTEGER NOT NULL REFERENCES identifier (id),
    song_identifier    INTEGER NOT NULL REFERENCES identifier (id),
    source             INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS release_song_release_idx ON release_song (release_identifier);
CREATE INDEX IF NOT EXISTS release_song_song_idx ON release_song (song_identifier);
CREATE UNIQUE INDEX IF NOT EXISTS release_song_unique_idx ON release_song (release_identifier, song_identifier, source);
"#;

const MIGRATION_002: &str = r#"
-- Records

CREATE TABLE IF NOT EXISTS contributor (
    id     INTEGER PRIMARY KEY,
    name   TEXT NOT NULL,
    source INTEGER NOT NULL REFERENCES source (id)
);

CREATE UNIQUE INDEX IF NOT EXISTS contributor_unique_idx ON contributor (name, source);

CREATE TABLE IF NOT EXISTS organisation (
    id     INTEGER PRIMARY KEY,
    name   TEXT NOT NULL,
    source INTEGER NOT NULL REFERENCES source (id)
);

CREATE UNIQUE INDEX IF NOT EXISTS organisation_unique_idx ON organisation (name, source);

CREATE TABLE IF NOT EXISTS series (
    id     INTEGER PRIMARY KEY,
    name   TEXT NOT NULL,
    source INTEGER NOT NULL REFERENCES source (id)
);

CREATE UNIQUE INDEX IF NOT EXISTS series_unique_idx ON series (name, source);

CREATE TABLE IF NOT EXISTS season (
    id     INTEGER PRIMARY KEY,
    name   TEXT NOT NULL,
    source INTEGER NOT NULL REFERENCES source (id)
);

CREATE UNIQUE INDEX IF NOT EXISTS season_unique_idx ON season (name, source);

CREATE TABLE IF NOT EXISTS episode (
    id     INTEGER PRIMARY KEY,
    name   TEXT NOT NULL,
    source INTEGER NOT NULL REFERENCES source (id)
);

CREATE UNIQUE INDEX IF NOT EXISTS episode_unique_idx ON episode (name, source);

CREATE TABLE IF NOT EXISTS supplemental (
    id     INTEGER PRIMARY KEY,
    name   TEXT NOT NULL,
    source INTEGER NOT NULL REFERENCES source (id)
);

CREATE UNIQUE INDEX IF NOT EXISTS supplemental_unique_idx ON supplemental (name, source);

-- Links

CREATE TABLE IF NOT EXISTS contributor_recording (
    id                     INTEGER PRIMARY KEY,
    contributor_identifier INTEGER NOT NULL REFERENCES identifier (id),
    recording_identifier   INTEGER NOT NULL REFERENCES identifier (id),
    role                   TEXT NOT NULL DEFAULT '',
    source                 INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS contributor_recording_contributor_idx ON contributor_recording (contributor_identifier);
CREATE INDEX IF NOT EXISTS contributor_recording_recording_idx ON contributor_recording (recording_identifier);
CREATE UNIQUE INDEX IF NOT EXISTS contributor_recording_unique_idx ON contributor_recording (contributor_identifier, recording_identifier, role, source);

CREATE TABLE IF NOT EXISTS organisation_series (
    id                      INTEGER PRIMARY KEY,
    organisation_identifier INTEGER NOT NULL REFERENCES identifier (id),
    series_identifier       INTEGER NOT NULL REFERENCES identifier (id),
    source                  INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS organisation_series_organisation_idx ON organisation_series (organisation_identifier);
CREATE INDEX IF NOT EXISTS organisation_series_series_idx ON organisation_series (series_identifier);
CREATE UNIQUE INDEX IF NOT EXISTS organisation_series_unique_idx ON organisation_series (organisation_identifier, series_identifier, source);

CREATE TABLE IF NOT EXISTS organisation_season (
    id                      INTEGER PRIMARY KEY,
    organisation_identifier INTEGER NOT NULL REFERENCES identifier (id),
    season_identifier       INTEGER NOT NULL REFERENCES identifier (id),
    source                  INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS organisation_season_organisation_idx ON organisation_season (organisation_identifier);
CREATE INDEX IF NOT EXISTS organisation_season_season_idx ON organisation_season (season_identifier);
CREATE UNIQUE INDEX IF NOT EXISTS organisation_season_unique_idx ON organisation_season (organisation_identifier, season_identifier, source);

CREATE TABLE IF NOT EXISTS organisation_episode (
    id                      INTEGER PRIMARY KEY,
    organisation_identifier INTEGER NOT NULL REFERENCES identifier (id),
    episode_identifier      INTEGER NOT NULL REFERENCES identifier (id),
    source                  INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS organisation_episode_organisation_idx ON organisation_episode (organisation_identifier);
CREATE INDEX IF NOT EXISTS organisation_episode_episode_idx ON organisation_episode (episode_identifier);
CREATE UNIQUE INDEX IF NOT EXISTS organisation_episode_unique_idx ON organisation_episode (organisation_identifier, episode_identifier, source);

CREATE TABLE IF NOT EXISTS series_season (
    id                INTEGER PRIMARY KEY,
    series_identifier INTEGER NOT NULL REFERENCES identifier (id),
    season_identifier INTEGER NOT NULL REFERENCES identifier (id),
    source            INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS series_season_series_idx ON series_season (series_identifier);
CREATE INDEX IF NOT EXISTS series_season_season_idx ON series_season (season_identifier);
CREATE UNIQUE INDEX IF NOT EXISTS series_season_unique_idx ON series_season (series_identifier, season_identifier, source);

CREATE TABLE IF NOT EXISTS season_episode (
    id                 INTEGER PRIMARY KEY,
    season_identifier  INTEGER NOT NULL REFERENCES identifier (id),
    episode_identifier INTEGER NOT NULL REFERENCES identifier (id),
    source             INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS season_episode_season_idx ON season_episode (season_identifier);
CREATE INDEX IF NOT EXISTS season_episode_episode_idx ON season_episode (episode_identifier);
CREATE UNIQUE INDEX IF NOT EXISTS season_episode_unique_idx ON season_episode (season_identifier, episode_identifier, source);

CREATE TABLE IF NOT EXISTS episode_supplemental (
    id                      INTEGER PRIMARY KEY,
    episode_identifier      INTEGER NOT NULL REFERENCES identifier (id),
    supplemental_identifier INTEGER NOT NULL REFERENCES identifier (id),
    source                  INTEGER NOT NULL REFERENCES source (id)
);

CREATE INDEX IF NOT EXISTS episode_supplemental_episode_idx ON episode_supplemental (episode_identifier);
CREATE INDEX IF NOT EXISTS episode_supplemental_supplemental_idx ON episode_supplemental (supplemental_identifier);
CREATE UNIQUE INDEX IF NOT EXISTS episode_supplemental_unique_idx ON episode_supplemental (episode_identifier, supplemental_identifier, source);
"#;

const MIGRATION_003: &str = r#"
-- Rights shares are the one mutable part of the index, keyed by the link's unique index
ALTER TABLE composer_work ADD COLUMN pr_share REAL;
ALTER TABLE composer_work ADD COLUMN mr_share REAL;
ALTER TABLE composer_work ADD COLUMN sr_share REAL;

ALTER TABLE publisher_work ADD COLUMN role TEXT NOT NULL DEFAULT '';
ALTER TABLE publisher_work ADD COLUMN pr_share REAL;
ALTER TABLE publisher_work ADD COLUMN mr_share REAL;
ALTER TABLE publisher_work ADD COLUMN sr_share REAL;

DROP INDEX IF EXISTS publisher_work_unique_idx;
CREATE UNIQUE INDEX IF NOT EXISTS publisher_work_unique_idx ON publisher_work (publisher_identifier, work_identifier, role, source);
"#;

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "music_index",
        sql: MIGRATION_001,
    },
    Migration {
        version: 2,
        name: "audiovisual_and_contributors",
        sql: MIGRATION_002,
    },
    Migration {
        version: 3,
        name: "rights_shares",
        sql: MIGRATION_003,
    },
];
