//! Read-only fan-out from a seed identifier to a provenance-merged view.
//!
//! A view holds every claim for every natural-key column of the entity, every
//! identifier bound to the entity's records, and its neighbours across all
//! link kinds touching the entity's kind, resolved recursively to a bounded
//! depth.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::model::{
    Direction, Identifier, IdentifierId, IdentifierRecord, LinkKind, LinkRecord, Record,
    RecordKind, RecordRow, SourceId,
};
use crate::provenance::{Claim, SourcePolicy, StringValue};
use crate::schema::Index;

/// One merged natural-key column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    pub column: String,
    #[serde(flatten)]
    pub value: StringValue,
}

/// Another identifier bound to the same entity, with the sources binding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub identifier: IdentifierRecord,
    pub sources: Vec<String>,
}

/// An entity reached through one link row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbour {
    pub kind: RecordKind,
    pub direction: Direction,
    pub link: LinkRecord,

    /// Source name of the link row.
    pub source: String,

    /// The neighbour's own view; `None` past the depth limit, on a cycle, or
    /// when no record of `kind` is bound to the neighbour identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<Box<EntityView>>,
}

impl Neighbour {
    #[must_use]
    pub const fn identifier(&self) -> &IdentifierRecord {
        self.link.neighbour(self.direction)
    }
}

/// Provenance-merged view of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub kind: RecordKind,
    pub identifier: IdentifierRecord,
    pub fields: Vec<FieldValue>,
    pub identifiers: Vec<Alias>,
    pub neighbours: Vec<Neighbour>,
}

impl EntityView {
    /// Merged value of one natural-key column.
    #[must_use]
    pub fn field(&self, column: &str) -> Option<&StringValue> {
        self.fields
            .iter()
            .find(|f| f.column == column)
            .map(|f| &f.value)
    }

    /// Human-readable label built from current values.
    #[must_use]
    pub fn label(&self) -> String {
        label(&self.fields)
    }

    /// Neighbours reached through one link kind.
    pub fn neighbours_of(&self, kind: LinkKind) -> impl Iterator<Item = &Neighbour> {
        self.neighbours.iter().filter(move |n| n.link.kind == kind)
    }
}

/// Label for a set of merged fields: the title when the kind has one,
/// otherwise every current value joined by spaces.
#[must_use]
pub fn label(fields: &[FieldValue]) -> String {
    if let Some(title) = fields.iter().find(|f| f.column == "title") {
        return title.value.value.clone();
    }
    fields
        .iter()
        .map(|f| f.value.value.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves views over an [`Index`] under a [`SourcePolicy`].
#[derive(Debug)]
pub struct Resolver<'a> {
    index: &'a Index,
    policy: &'a SourcePolicy,
    source_names: RefCell<HashMap<SourceId, String>>,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(index: &'a Index, policy: &'a SourcePolicy) -> Self {
        Self {
            index,
            policy,
            source_names: RefCell::new(HashMap::new()),
        }
    }

    /// Resolve `identifier` as an entity of `kind`, expanding neighbours
    /// `depth` levels deep.
    ///
    /// Fails with [`Error::IdentifierNotFound`] when nothing assigns the
    /// identifier to a record of `kind`.
    pub fn resolve(
        &self,
        kind: RecordKind,
        identifier: &Identifier,
        depth: usize,
    ) -> Result<EntityView> {
        let seed = self.index.lookup_identifier(kind, identifier)?;
        let mut path = HashSet::new();
        self.view(kind, seed, depth, &mut path)?
            .ok_or_else(|| Error::IdentifierNotFound {
                record_kind: kind,
                identifier: identifier.clone(),
            })
    }

    /// Merge every natural-key column of the `kind` records bound to
    /// `identifier`. Empty when no such record exists.
    pub fn fields(&self, kind: RecordKind, identifier: &IdentifierRecord) -> Result<Vec<FieldValue>> {
        let rows = self.index.records(kind, identifier)?;
        self.merge_fields(kind, &rows)
    }

    fn merge_fields(&self, kind: RecordKind, rows: &[RecordRow<Record>]) -> Result<Vec<FieldValue>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut claims: Vec<Vec<Claim>> = vec![Vec::with_capacity(rows.len()); kind.columns().len()];
        for row in rows {
            let source = self.source_name(row.source)?;
            for (column, value) in claims.iter_mut().zip(row.fact.values()) {
                column.push(Claim {
                    value: value.to_string(),
                    source: source.clone(),
                    record: row.id,
                });
            }
        }

        Ok(kind
            .columns()
            .iter()
            .zip(claims)
            .filter_map(|(column, claims)| {
                StringValue::merge(claims, self.policy).map(|value| FieldValue {
                    column: (*column).to_string(),
                    value,
                })
            })
            .collect())
    }

    /// Every link row touching `identifier` as an entity of `kind`, in both
    /// directions.
    pub fn links(
        &self,
        kind: RecordKind,
        identifier: &IdentifierRecord,
    ) -> Result<Vec<(LinkRecord, Direction)>> {
        let mut links = Vec::new();
        for (link_kind, direction) in LinkKind::touching(kind) {
            for link in self.index.links(link_kind, direction, identifier)? {
                links.push((link, direction));
            }
        }
        Ok(links)
    }

    /// Name of a source, cached for the life of the resolver.
    pub fn source_name(&self, id: SourceId) -> Result<String> {
        if let Some(name) = self.source_names.borrow().get(&id) {
            return Ok(name.clone());
        }
        let name = self.index.source(id)?.name;
        self.source_names.borrow_mut().insert(id, name.clone());
        Ok(name)
    }

    fn view(
        &self,
        kind: RecordKind,
        identifier: IdentifierRecord,
        depth: usize,
        path: &mut HashSet<(RecordKind, IdentifierId)>,
    ) -> Result<Option<EntityView>> {
        let rows = self.index.records(kind, &identifier)?;
        let fields = self.merge_fields(kind, &rows)?;
        if fields.is_empty() {
            return Ok(None);
        }

        path.insert((kind, identifier.id));
        let identifiers = self.aliases(kind, &rows)?;

        let mut neighbours = Vec::new();
        for (link, direction) in self.links(kind, &identifier)? {
            let neighbour_kind = link.kind.neighbour_kind(direction);
            let far = link.neighbour(direction).clone();
            let view = if depth > 0 && !path.contains(&(neighbour_kind, far.id)) {
                self.view(neighbour_kind, far, depth - 1, path)?.map(Box::new)
            } else {
                None
            };
            neighbours.push(Neighbour {
                kind: neighbour_kind,
                direction,
                source: self.source_name(link.source)?,
                link,
                view,
            });
        }
        path.remove(&(kind, identifier.id));

        Ok(Some(EntityView {
            kind,
            identifier,
            fields,
            identifiers,
            neighbours,
        }))
    }

    fn aliases(&self, kind: RecordKind, rows: &[RecordRow<Record>]) -> Result<Vec<Alias>> {
        let mut aliases: Vec<Alias> = Vec::new();
        for row in rows {
            for assignment in self.index.record_identifiers(kind, row.id)? {
                let source = self.source_name(assignment.source)?;
                match aliases
                    .iter_mut()
                    .find(|a| a.identifier.id == assignment.identifier.id)
                {
                    Some(alias) => {
                        if !alias.sources.contains(&source) {
                            alias.sources.push(source);
                        }
                    }
                    None => aliases.push(Alias {
                        identifier: assignment.identifier,
                        sources: vec![source],
                    }),
                }
            }
        }
        Ok(aliases)
    }
}
