use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Error, Result};
use crate::model::{Source, SourceId, SourceRecord};
use crate::schema::Index;

use super::is_unique_violation;

// Source registry
impl Index {
    /// Get or create the source named `source.name`.
    pub fn resolve_source(&mut self, source: &Source) -> Result<SourceRecord> {
        let tx = self.begin_write()?;
        let record = resolve_source(&tx, &source.name)?;
        tx.commit()?;
        Ok(record)
    }

    /// Fetch a source by id.
    pub fn source(&self, id: SourceId) -> Result<SourceRecord> {
        self.conn
            .query_row(
                "SELECT id, name, first_seen FROM source WHERE id = ?1",
                [id],
                row_to_source,
            )
            .optional()?
            .ok_or(Error::SourceNotFound(id))
    }

    /// Every known source, in creation order.
    pub fn sources(&self) -> Result<Vec<SourceRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, first_seen FROM source ORDER BY id")?;
        let sources = stmt
            .query_map([], row_to_source)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sources)
    }
}

/// Get-or-create inside the caller's transaction.
pub(crate) fn resolve_source(conn: &Connection, name: &str) -> Result<SourceRecord> {
    if name.trim().is_empty() {
        return Err(Error::InvalidData("source name must not be empty".to_string()));
    }

    let first_seen = Utc::now();
    match conn.execute(
        "INSERT INTO source (name, first_seen) VALUES (?1, ?2)",
        params![name, first_seen.to_rfc3339()],
    ) {
        Ok(_) => {
            let record = SourceRecord {
                id: SourceId::new(conn.last_insert_rowid()),
                name: name.to_string(),
                first_seen,
            };
            log::debug!("Created source {} ({})", record.name, record.id);
            Ok(record)
        }
        Err(err) if is_unique_violation(&err) => Ok(conn.query_row(
            "SELECT id, name, first_seen FROM source WHERE name = ?1",
            [name],
            row_to_source,
        )?),
        Err(err) => Err(err.into()),
    }
}

fn row_to_source(row: &rusqlite::Row) -> rusqlite::Result<SourceRecord> {
    let first_seen: String = row.get(2)?;
    let first_seen = DateTime::parse_from_rfc3339(&first_seen)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);

    Ok(SourceRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        first_seen,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_source_is_idempotent() {
        let mut index = Index::open_in_memory().unwrap();
        let first = index.resolve_source(&Source::new("ernImport")).unwrap();
        let second = index.resolve_source(&Source::new("ernImport")).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.first_seen.timestamp(), second.first_seen.timestamp());
        assert_eq!(index.sources().unwrap().len(), 1);
    }

    #[test]
    fn test_sources_are_distinct_by_name() {
        let mut index = Index::open_in_memory().unwrap();
        let ern = index.resolve_source(&Source::new("ernImport")).unwrap();
        let mb = index.resolve_source(&Source::new("musicbrainz")).unwrap();
        assert_ne!(ern.id, mb.id);

        let names: Vec<_> = index
            .sources()
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["ernImport", "musicbrainz"]);
    }

    #[test]
    fn test_source_lookup() {
        let mut index = Index::open_in_memory().unwrap();
        let created = index.resolve_source(&Source::new("cwr")).unwrap();
        assert_eq!(index.source(created.id).unwrap().name, "cwr");

        let err = index.source(SourceId::new(999)).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(_)));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_empty_source_name_rejected() {
        let mut index = Index::open_in_memory().unwrap();
        let err = index.resolve_source(&Source::new(" ")).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }
}
