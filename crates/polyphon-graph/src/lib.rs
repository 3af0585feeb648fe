//! Provenance neighbourhood graphs for polyphon.
//!
//! Walks the index breadth-first from a seed identifier and materialises the
//! reached entities and link rows as a petgraph directed graph. Edges keep
//! the link's own A to B direction and the name of the source asserting it.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction as EdgeDirection;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use thiserror::Error;

use polyphon_core::model::{
    Direction, Identifier, IdentifierId, IdentifierRecord, LinkId, LinkKind, RecordKind,
};
use polyphon_core::resolve::{label, Resolver};
use polyphon_core::{Index, SourcePolicy};

/// Errors raised while building a graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("index error: {0}")]
    Index(#[from] polyphon_core::Error),
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// An identifier seen as an entity of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityNode {
    pub kind: RecordKind,
    pub identifier: IdentifierRecord,

    /// Label from current values; `None` when no record of `kind` is bound
    /// to the identifier.
    pub label: Option<String>,
}

/// One link row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEdge {
    pub kind: LinkKind,
    pub link: LinkId,
    pub role: Option<String>,
    pub source: String,
}

/// The neighbourhood of a seed entity.
#[derive(Debug)]
pub struct ProvenanceGraph {
    graph: DiGraph<EntityNode, LinkEdge>,
    nodes: HashMap<(RecordKind, IdentifierId), NodeIndex>,
    seed: NodeIndex,
}

impl ProvenanceGraph {
    /// Build the graph reached from `identifier` as an entity of `kind`,
    /// following links up to `depth` hops.
    ///
    /// # Errors
    ///
    /// Fails when the seed is unknown or the index cannot be read.
    pub fn build(
        index: &Index,
        policy: &SourcePolicy,
        kind: RecordKind,
        identifier: &Identifier,
        depth: usize,
    ) -> GraphResult<Self> {
        let resolver = Resolver::new(index, policy);
        let seed = index.lookup_identifier(kind, identifier)?;

        let mut builder = Builder {
            resolver: &resolver,
            graph: DiGraph::new(),
            nodes: HashMap::new(),
            links: HashSet::new(),
        };
        let (seed_idx, _) = builder.node(kind, seed)?;

        let mut queue = VecDeque::from([(seed_idx, depth)]);
        while let Some((idx, remaining)) = queue.pop_front() {
            if remaining == 0 {
                continue;
            }
            let node = &builder.graph[idx];
            if node.label.is_none() {
                continue;
            }
            let (kind, identifier) = (node.kind, node.identifier.clone());

            for (link, direction) in resolver.links(kind, &identifier)? {
                if !builder.links.insert((link.kind, link.id)) {
                    continue;
                }
                let (a_kind, b_kind) = link.kind.endpoints();
                let (a_idx, a_new) = builder.node(a_kind, link.a.clone())?;
                let (b_idx, b_new) = builder.node(b_kind, link.b.clone())?;
                builder.graph.add_edge(
                    a_idx,
                    b_idx,
                    LinkEdge {
                        kind: link.kind,
                        link: link.id,
                        role: link.role.clone(),
                        source: resolver.source_name(link.source)?,
                    },
                );

                let (far, is_new) = match direction {
                    Direction::Forward => (b_idx, b_new),
                    Direction::Reverse => (a_idx, a_new),
                };
                if is_new {
                    queue.push_back((far, remaining - 1));
                }
            }
        }

        log::debug!(
            "Built graph around {identifier}: {} nodes, {} edges",
            builder.graph.node_count(),
            builder.graph.edge_count()
        );
        Ok(Self {
            graph: builder.graph,
            nodes: builder.nodes,
            seed: seed_idx,
        })
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn seed(&self) -> &EntityNode {
        &self.graph[self.seed]
    }

    /// The node for `identifier` seen as an entity of `kind`, if reached.
    #[must_use]
    pub fn node(&self, kind: RecordKind, identifier: IdentifierId) -> Option<&EntityNode> {
        self.nodes.get(&(kind, identifier)).map(|&idx| &self.graph[idx])
    }

    /// Every node linked to the given one, in either direction, with the
    /// connecting edge.
    #[must_use]
    pub fn neighbours(
        &self,
        kind: RecordKind,
        identifier: IdentifierId,
    ) -> Vec<(&EntityNode, &LinkEdge)> {
        let Some(&idx) = self.nodes.get(&(kind, identifier)) else {
            return Vec::new();
        };
        let outgoing = self
            .graph
            .edges_directed(idx, EdgeDirection::Outgoing)
            .map(|e| (&self.graph[e.target()], e.weight()));
        let incoming = self
            .graph
            .edges_directed(idx, EdgeDirection::Incoming)
            .map(|e| (&self.graph[e.source()], e.weight()));
        outgoing.chain(incoming).collect()
    }

    /// The underlying petgraph graph.
    #[must_use]
    pub const fn graph(&self) -> &DiGraph<EntityNode, LinkEdge> {
        &self.graph
    }

    /// Render as Graphviz DOT.
    #[must_use]
    pub fn to_dot(&self) -> String {
        Dot(self).to_string()
    }
}

struct Dot<'g>(&'g ProvenanceGraph);

/// Escape text for a double-quoted DOT label.
fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\r', "")
        .replace('\n', "\\n")
}

impl fmt::Display for Dot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ProvenanceGraph { graph, seed, .. } = self.0;

        writeln!(f, "digraph polyphon {{")?;
        writeln!(f, "  rankdir=LR;")?;
        writeln!(f, "  node [shape=box, fontname=\"Helvetica\"];")?;
        writeln!(f, "  edge [fontname=\"Helvetica\"];")?;
        writeln!(f)?;

        for idx in graph.node_indices() {
            let node = &graph[idx];
            let style = if idx == *seed {
                ", style=bold"
            } else if node.label.is_none() {
                ", style=dashed"
            } else {
                ""
            };
            writeln!(
                f,
                "  n{} [label=\"{}\\n{}\\n{}\"{style}];",
                idx.index(),
                node.kind,
                escape(node.label.as_deref().unwrap_or("?")),
                escape(&node.identifier.identifier.to_string())
            )?;
        }
        writeln!(f)?;

        for edge in graph.edge_references() {
            let link = edge.weight();
            let role = link
                .role
                .as_deref()
                .map(|role| format!(" ({})", escape(role)))
                .unwrap_or_default();
            writeln!(
                f,
                "  n{} -> n{} [label=\"{}{role}\\n{}\"];",
                edge.source().index(),
                edge.target().index(),
                link.kind,
                escape(&link.source)
            )?;
        }

        writeln!(f, "}}")
    }
}

struct Builder<'r, 'a> {
    resolver: &'r Resolver<'a>,
    graph: DiGraph<EntityNode, LinkEdge>,
    nodes: HashMap<(RecordKind, IdentifierId), NodeIndex>,
    links: HashSet<(LinkKind, LinkId)>,
}

impl Builder<'_, '_> {
    /// Get or add the node for an identifier as an entity of `kind`. The
    /// flag is true when the node was added.
    fn node(
        &mut self,
        kind: RecordKind,
        identifier: IdentifierRecord,
    ) -> GraphResult<(NodeIndex, bool)> {
        if let Some(&idx) = self.nodes.get(&(kind, identifier.id)) {
            return Ok((idx, false));
        }
        let fields = self.resolver.fields(kind, &identifier)?;
        let key = (kind, identifier.id);
        let idx = self.graph.add_node(EntityNode {
            kind,
            identifier,
            label: (!fields.is_empty()).then(|| label(&fields)),
        });
        self.nodes.insert(key, idx);
        Ok((idx, true))
    }
}
