use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    AssignmentId, Identifier, IdentifierId, IdentifierRecord, RecordId, RecordKind, SourceId,
};
use crate::schema::Index;

/// A binding of an identifier to one record row, attributed to a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub identifier: IdentifierRecord,
    pub record_kind: RecordKind,
    pub record_id: RecordId,
    pub source: SourceId,
}

// Identifier registry
impl Index {
    /// Create-or-find an identifier. Never fails on absence.
    pub fn resolve_identifier(&mut self, identifier: &Identifier) -> Result<IdentifierRecord> {
        let tx = self.begin_write()?;
        let record = resolve_identifier(&tx, identifier)?;
        tx.commit()?;
        Ok(record)
    }

    /// Read-path lookup: the identifier must be assigned to at least one
    /// record of `kind`, otherwise [`Error::IdentifierNotFound`].
    pub fn lookup_identifier(
        &self,
        kind: RecordKind,
        identifier: &Identifier,
    ) -> Result<IdentifierRecord> {
        self.conn
            .query_row(
                "SELECT DISTINCT i.id, i.type, i.value
                 FROM identifier i
                 JOIN identifier_assignment a ON a.identifier_id = i.id
                 WHERE i.type = ?1 AND i.value = ?2 AND a.record_type = ?3
                 LIMIT 1",
                params![identifier.kind, identifier.value, kind.as_str()],
                |row| IdentifierRecord::from_row(row, 0),
            )
            .optional()?
            .ok_or_else(|| Error::IdentifierNotFound {
                record_kind: kind,
                identifier: identifier.clone(),
            })
    }

    /// Find an identifier by type and value, regardless of assignments.
    pub fn find_identifier(&self, identifier: &Identifier) -> Result<Option<IdentifierRecord>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, type, value FROM identifier WHERE type = ?1 AND value = ?2",
                params![identifier.kind, identifier.value],
                |row| IdentifierRecord::from_row(row, 0),
            )
            .optional()?)
    }

    /// Fetch an identifier by id, regardless of assignments.
    pub fn identifier(&self, id: IdentifierId) -> Result<Option<IdentifierRecord>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, type, value FROM identifier WHERE id = ?1",
                [id],
                |row| IdentifierRecord::from_row(row, 0),
            )
            .optional()?)
    }

    /// Every identifier bound to a record row, with the asserting source.
    pub fn record_identifiers(
        &self,
        kind: RecordKind,
        record_id: RecordId,
    ) -> Result<Vec<Assignment>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.id, i.id, i.type, i.value, a.record_id, a.source
             FROM identifier_assignment a
             JOIN identifier i ON i.id = a.identifier_id
             WHERE a.record_type = ?1 AND a.record_id = ?2
             ORDER BY a.id",
        )?;
        let assignments = stmt
            .query_map(params![kind.as_str(), record_id], |row| {
                Ok(Assignment {
                    id: row.get(0)?,
                    identifier: IdentifierRecord::from_row(row, 1)?,
                    record_kind: kind,
                    record_id: row.get(4)?,
                    source: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(assignments)
    }
}

/// Create-or-find inside the caller's transaction.
pub(crate) fn resolve_identifier(
    conn: &Connection,
    identifier: &Identifier,
) -> Result<IdentifierRecord> {
    identifier.validate()?;

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO identifier (type, value) VALUES (?1, ?2)",
        params![identifier.kind, identifier.value],
    )?;
    if inserted > 0 {
        log::debug!("Created identifier {identifier}");
    }

    let id = conn.query_row(
        "SELECT id FROM identifier WHERE type = ?1 AND value = ?2",
        params![identifier.kind, identifier.value],
        |row| row.get(0),
    )?;
    Ok(IdentifierRecord::new(id, identifier.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_identifier_is_idempotent() {
        let mut index = Index::open_in_memory().unwrap();
        let first = index
            .resolve_identifier(&Identifier::isrc("CASE01000001"))
            .unwrap();
        let second = index
            .resolve_identifier(&Identifier::isrc("CASE01000001"))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(index.stats().unwrap().identifiers, 1);
    }

    #[test]
    fn test_find_identifier_ignores_assignments() {
        let mut index = Index::open_in_memory().unwrap();
        assert!(index.find_identifier(&Identifier::isrc("R1")).unwrap().is_none());

        let created = index.resolve_identifier(&Identifier::isrc("R1")).unwrap();
        let found = index.find_identifier(&Identifier::isrc("R1")).unwrap();
        assert_eq!(found, Some(created));
    }

    #[test]
    fn test_same_value_different_scheme_is_distinct() {
        let mut index = Index::open_in_memory().unwrap();
        let upc = index.resolve_identifier(&Identifier::upc("0060")).unwrap();
        let ean = index.resolve_identifier(&Identifier::ean("0060")).unwrap();
        assert_ne!(upc.id, ean.id);
    }

    #[test]
    fn test_resolve_identifier_rejects_empty_value() {
        let mut index = Index::open_in_memory().unwrap();
        let err = index
            .resolve_identifier(&Identifier::new("isrc", ""))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
        assert_eq!(index.stats().unwrap().identifiers, 0);
    }

    #[test]
    fn test_lookup_unknown_identifier_fails() {
        let index = Index::open_in_memory().unwrap();
        let err = index
            .lookup_identifier(RecordKind::Performer, &Identifier::dpid("UNKNOWN"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::IdentifierNotFound {
                record_kind: RecordKind::Performer,
                ..
            }
        ));
    }

    #[test]
    fn test_lookup_requires_assignment_of_kind() {
        let mut index = Index::open_in_memory().unwrap();
        let created = index.resolve_identifier(&Identifier::dpid("P1")).unwrap();
        assert_eq!(index.identifier(created.id).unwrap(), Some(created));

        // Known identifier, but nothing assigns it to a performer yet.
        assert!(index
            .lookup_identifier(RecordKind::Performer, &Identifier::dpid("P1"))
            .unwrap_err()
            .is_not_found());
    }
}
