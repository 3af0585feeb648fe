use anyhow::Result;
use polyphon_ingest::Config;

pub fn show_sources(config: &Config) -> Result<()> {
    let index = super::open_index(config)?;
    let sources = index.sources()?;
    let policy = config.source_policy();

    if sources.is_empty() {
        println!("No sources yet. Run 'polyphon ingest <path>' to add some.");
        return Ok(());
    }

    println!("\n{:<4} {:<24} {:>8}  First seen", "ID", "Source", "Priority");
    for source in &sources {
        println!(
            "{:<4} {:<24} {:>8}  {}",
            source.id.get(),
            source.name,
            policy.priority_for(&source.name),
            source.first_seen.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}
