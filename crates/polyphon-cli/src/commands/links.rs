use anyhow::Result;
use polyphon_core::model::{Direction, Identifier, LinkKind, LinkRecord};
use polyphon_ingest::Config;

pub fn show_links(
    config: &Config,
    link_kind: &str,
    scheme: &str,
    value: &str,
    reverse: bool,
) -> Result<()> {
    let kind: LinkKind = link_kind.parse()?;
    let identifier = Identifier::new(scheme, value);
    let direction = if reverse {
        Direction::Reverse
    } else {
        Direction::Forward
    };

    let index = super::open_index(config)?;
    let Some(seed) = index.find_identifier(&identifier)? else {
        anyhow::bail!("identifier {identifier} not found");
    };
    let links = index.links(kind, direction, &seed)?;

    if links.is_empty() {
        println!("No {kind} links for {identifier}");
        return Ok(());
    }

    let (a_kind, b_kind) = kind.endpoints();
    println!("\n{kind} ({a_kind} -> {b_kind}) for {identifier}\n");
    for link in &links {
        let source = index.source(link.source)?;
        println!("  {}", describe(link, direction, &source.name));
    }
    println!("\n{} link(s)", links.len());

    Ok(())
}

fn describe(link: &LinkRecord, direction: Direction, source: &str) -> String {
    let mut parts = vec![
        format!("#{}", link.id),
        link.neighbour(direction).identifier.to_string(),
    ];
    if let Some(role) = &link.role {
        parts.push(format!("[{role}]"));
    }
    if let Some(shares) = &link.shares {
        let shares: Vec<String> = [
            ("pr", shares.performance),
            ("mr", shares.mechanical),
            ("sr", shares.synchronization),
        ]
        .into_iter()
        .filter_map(|(name, share)| share.map(|v| format!("{name} {v}%")))
        .collect();
        if !shares.is_empty() {
            parts.push(format!("({})", shares.join(", ")));
        }
    }
    parts.push(format!("from {source}"));
    parts.join(" ")
}
