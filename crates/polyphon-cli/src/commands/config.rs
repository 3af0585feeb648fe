use anyhow::Result;
use polyphon_ingest::{config, Config};

/// Show the current effective configuration.
pub fn show_config(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    let config_path = config::config_file_path();
    println!("Config file: {}", config_path.display());
    let exists = config_path.exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    println!("  database_path: {}", config.database_path.display());
    println!("  busy_timeout_ms: {}", config.busy_timeout_ms);
    println!("  fail_fast: {}", config.fail_fast);
    println!("  log_level: {}", config.log_level);
    println!("  log_coloured: {}", config.log_coloured);

    if config.source_priority.is_empty() {
        println!("  source_priority: <none, latest claim wins>");
    } else {
        println!("  source_priority:");
        for (source, priority) in &config.source_priority {
            println!("    {source} = {priority}");
        }
    }

    println!("\nPriority: CLI args > ENV vars (POLY_*) > Config file > Defaults");

    Ok(())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    println!("{}", config::config_file_path().display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to set source priorities.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
