use anyhow::Result;
use polyphon_ingest::{Config, Ingester};
use std::path::Path;

pub fn run_ingest(config: &Config, path: &Path, source: Option<&str>) -> Result<()> {
    log::info!("Starting ingest of {}", path.display());

    let mut index = super::open_index(config)?;
    let summary = Ingester::new(&mut index)
        .fail_fast(config.fail_fast)
        .ingest_path(path, source)?;

    for failure in &summary.failures {
        eprintln!("  ✗ {}:{}: {}", failure.origin, failure.line, failure.message);
    }

    println!("\n✓ Ingest complete");
    println!("  Files:   {}", summary.files);
    println!("  Records: {}", summary.records);
    println!("  Links:   {}", summary.links);
    println!("  Skipped: {}", summary.skipped);
    if !summary.is_clean() {
        println!("  Failed:  {}", summary.failures.len());
    }

    Ok(())
}
