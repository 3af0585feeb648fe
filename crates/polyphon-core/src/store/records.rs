use rusqlite::types::ToSql;
use rusqlite::{params, Connection};

use crate::error::{Error, Result};
use crate::model::{
    Composer, Contributor, Episode, Fact, Identifier, IdentifierRecord, Organisation, Performer,
    Publisher, Record, RecordId, RecordKind, RecordLabel, RecordRow, Recording, Release, Season,
    Series, Song, Source, SourceId, Supplemental, Work,
};
use crate::schema::Index;

use super::identifiers::resolve_identifier;
use super::sources::resolve_source;
use super::{is_unique_violation, quoted};

// Record store
impl Index {
    /// Store a natural-key fact and bind it to `identifier` on behalf of
    /// `source`.
    ///
    /// Replaying the same arguments returns the same identifier and creates
    /// no rows. The record, identifier and assignment commit together or not
    /// at all.
    pub fn create_record(
        &mut self,
        record: impl Into<Record>,
        identifier: &Identifier,
        source: &Source,
    ) -> Result<IdentifierRecord> {
        let record = record.into();
        let kind = record.kind();
        identifier.validate()?;

        let tx = self.begin_write()?;
        let source = resolve_source(&tx, &source.name)?;
        let record_id = insert_or_select_record(&tx, &record, source.id)?;
        let identifier = resolve_identifier(&tx, identifier)?;
        tx.execute(
            "INSERT OR IGNORE INTO identifier_assignment (identifier_id, record_type, record_id, source)
             VALUES (?1, ?2, ?3, ?4)",
            params![identifier.id, kind.as_str(), record_id, source.id],
        )?;
        tx.commit()?;

        log::debug!(
            "Bound {kind} #{record_id} to {identifier} from {}",
            source.name
        );
        Ok(identifier)
    }

    /// Every record of `kind` bound to `identifier`, one per asserting
    /// source, in ingestion order.
    pub fn records(
        &self,
        kind: RecordKind,
        identifier: &IdentifierRecord,
    ) -> Result<Vec<RecordRow<Record>>> {
        self.record_rows(kind, identifier)?
            .into_iter()
            .map(|(id, values, source)| {
                let fact = Record::from_values(kind, values).ok_or_else(|| short_row(kind, id))?;
                Ok(RecordRow { id, fact, source })
            })
            .collect()
    }

    /// Typed variant of [`Index::records`].
    pub fn records_of<T: Fact>(&self, identifier: &IdentifierRecord) -> Result<Vec<RecordRow<T>>> {
        self.record_rows(T::KIND, identifier)?
            .into_iter()
            .map(|(id, values, source)| {
                let fact = T::from_values(values).ok_or_else(|| short_row(T::KIND, id))?;
                Ok(RecordRow { id, fact, source })
            })
            .collect()
    }

    fn record_rows(
        &self,
        kind: RecordKind,
        identifier: &IdentifierRecord,
    ) -> Result<Vec<(RecordId, Vec<String>, SourceId)>> {
        let columns = kind.columns();
        let select: Vec<String> = columns
            .iter()
            .map(|c| format!("r.{}", quoted(c)))
            .collect();
        let sql = format!(
            "SELECT DISTINCT r.id, {}, r.source
             FROM identifier_assignment a
             JOIN {} r ON r.id = a.record_id
             WHERE a.identifier_id = ?1 AND a.record_type = ?2
             ORDER BY r.id",
            select.join(", "),
            quoted(kind.as_str()),
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![identifier.id, kind.as_str()], |row| {
                let values = (1..=columns.len())
                    .map(|i| row.get(i))
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                Ok((row.get(0)?, values, row.get(columns.len() + 1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn short_row(kind: RecordKind, id: RecordId) -> Error {
    Error::InvalidData(format!("{kind} row {id} is missing natural-key columns"))
}

/// Insert the natural-key row, or find the one already stored for the same
/// key and source.
fn insert_or_select_record(conn: &Connection, record: &Record, source: SourceId) -> Result<RecordId> {
    let kind = record.kind();
    let table = quoted(kind.as_str());
    let columns: Vec<String> = kind.columns().iter().map(|c| quoted(c)).collect();

    let values = record.values();
    let mut params: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
    params.push(&source);

    let placeholders: Vec<String> = (1..=params.len()).map(|i| format!("?{i}")).collect();
    let insert = format!(
        "INSERT INTO {table} ({}, source) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    );

    match conn.execute(&insert, params.as_slice()) {
        Ok(_) => {
            let id = RecordId::new(conn.last_insert_rowid());
            log::debug!("Created {kind} #{id}");
            Ok(id)
        }
        Err(err) if is_unique_violation(&err) => {
            let predicate: Vec<String> = columns
                .iter()
                .chain(std::iter::once(&quoted("source")))
                .enumerate()
                .map(|(i, c)| format!("{c} = ?{}", i + 1))
                .collect();
            let select = format!("SELECT id FROM {table} WHERE {}", predicate.join(" AND "));
            Ok(conn.query_row(&select, params.as_slice(), |row| row.get(0))?)
        }
        Err(err) => Err(err.into()),
    }
}

macro_rules! record_queries {
    ($( $fn_name:ident => $kind:ident ),+ $(,)?) => {
        impl Index {
            $(
                #[doc = concat!(
                    "Every `", stringify!($kind),
                    "` record bound to `identifier`, across sources."
                )]
                pub fn $fn_name(&self, identifier: &IdentifierRecord) -> Result<Vec<RecordRow<$kind>>> {
                    self.records_of::<$kind>(identifier)
                }
            )+
        }
    };
}

record_queries! {
    performers => Performer,
    contributors => Contributor,
    composers => Composer,
    record_labels => RecordLabel,
    publishers => Publisher,
    recordings => Recording,
    works => Work,
    songs => Song,
    releases => Release,
    organisations => Organisation,
    series => Series,
    seasons => Season,
    episodes => Episode,
    supplementals => Supplemental,
}
