use anyhow::Result;
use polyphon_core::model::{Direction, Identifier, RecordKind};
use polyphon_core::{EntityView, Resolver};
use polyphon_ingest::Config;

pub fn run_lookup(
    config: &Config,
    kind: &str,
    scheme: &str,
    value: &str,
    depth: usize,
    json: bool,
) -> Result<()> {
    let kind: RecordKind = kind.parse()?;
    let identifier = Identifier::new(scheme, value);

    let index = super::open_index(config)?;
    let policy = config.source_policy();
    let view = match Resolver::new(&index, &policy).resolve(kind, &identifier, depth) {
        Ok(view) => view,
        Err(e) if e.is_not_found() => anyhow::bail!("{kind} {identifier} not found"),
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        let mut lines = Vec::new();
        render_view(&view, 0, &mut lines);
        println!("{}", lines.join("\n"));
    }

    Ok(())
}

/// Render a view as indented text, one line per entry.
fn render_view(view: &EntityView, indent: usize, lines: &mut Vec<String>) {
    let pad = "  ".repeat(indent);
    lines.push(format!("{pad}{} {}: {}", view.kind, view.identifier.identifier, view.label()));

    for field in &view.fields {
        lines.push(format!("{pad}  {} = {}", field.column, field.value.value));
        if field.value.sources.len() > 1 {
            for claim in &field.value.sources {
                lines.push(format!(
                    "{pad}      {:?} from {} (priority {})",
                    claim.value, claim.source, claim.score
                ));
            }
        } else if let Some(claim) = field.value.sources.first() {
            lines.push(format!("{pad}      from {}", claim.source));
        }
    }

    let aliases: Vec<_> = view
        .identifiers
        .iter()
        .filter(|a| a.identifier.id != view.identifier.id)
        .collect();
    if !aliases.is_empty() {
        lines.push(format!("{pad}  identifiers:"));
        for alias in aliases {
            lines.push(format!(
                "{pad}    {} ({})",
                alias.identifier.identifier,
                alias.sources.join(", ")
            ));
        }
    }

    for neighbour in &view.neighbours {
        let arrow = match neighbour.direction {
            Direction::Forward => "->",
            Direction::Reverse => "<-",
        };
        let role = neighbour
            .link
            .role
            .as_deref()
            .map(|r| format!(" [{r}]"))
            .unwrap_or_default();
        lines.push(format!(
            "{pad}  {arrow} {}{role} {} (from {})",
            neighbour.link.kind,
            neighbour.identifier().identifier,
            neighbour.source
        ));
        if let Some(shares) = &neighbour.link.shares {
            lines.push(format!(
                "{pad}       shares: performance {}, mechanical {}, sync {}",
                share(shares.performance),
                share(shares.mechanical),
                share(shares.synchronization)
            ));
        }
        if let Some(child) = &neighbour.view {
            render_view(child, indent + 2, lines);
        }
    }
}

fn share(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v}%"))
}
