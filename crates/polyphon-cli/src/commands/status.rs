use anyhow::Result;
use polyphon_ingest::Config;

pub fn show_status(config: &Config) -> Result<()> {
    let index = super::open_index(config)?;
    let stats = index.stats()?;

    println!("\n📊 Polyphon Status\n");
    println!("Index:          {}", config.database_path.display());
    println!("Schema version: {}", index.schema_version()?);
    println!("Sources:        {}", stats.sources);
    println!("Identifiers:    {}", stats.identifiers);
    println!("Assignments:    {}", stats.assignments);

    println!("\nRecords:        {}", stats.total_records());
    for (kind, count) in stats.records.iter().filter(|(_, n)| **n > 0) {
        println!("  {:<24} {count}", kind.as_str());
    }

    println!("\nLinks:          {}", stats.total_links());
    for (kind, count) in stats.links.iter().filter(|(_, n)| **n > 0) {
        println!("  {:<24} {count}", kind.as_str());
    }

    Ok(())
}
