use anyhow::Result;
use polyphon_core::model::{Identifier, RecordKind};
use polyphon_graph::ProvenanceGraph;
use polyphon_ingest::Config;

pub fn show_graph(
    config: &Config,
    kind: &str,
    scheme: &str,
    value: &str,
    depth: usize,
) -> Result<()> {
    let kind: RecordKind = kind.parse()?;
    let identifier = Identifier::new(scheme, value);

    let index = super::open_index(config)?;
    let policy = config.source_policy();
    let graph = ProvenanceGraph::build(&index, &policy, kind, &identifier, depth)?;

    log::info!(
        "Graph around {identifier}: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    print!("{}", graph.to_dot());

    Ok(())
}
