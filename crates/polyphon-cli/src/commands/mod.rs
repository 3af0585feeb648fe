pub mod config;
pub mod graph;
pub mod ingest;
pub mod links;
pub mod lookup;
pub mod sources;
pub mod status;

pub use graph::show_graph;
pub use ingest::run_ingest;
pub use links::show_links;
pub use lookup::run_lookup;
pub use sources::show_sources;
pub use status::show_status;

use anyhow::{anyhow, Context, Result};
use polyphon_core::Index;
use polyphon_ingest::Config;

/// Install the twyg logger. Logs go to stderr so that JSON and DOT output on
/// stdout stays clean.
pub fn setup_logging(config: &Config, verbose: bool) -> Result<()> {
    let level = if verbose {
        twyg::LogLevel::Debug
    } else {
        parse_level(&config.log_level)?
    };

    let opts = twyg::OptsBuilder::new()
        .coloured(config.log_coloured)
        .output(twyg::Output::Stderr)
        .level(level)
        .build()
        .map_err(|e| anyhow!("invalid logging options: {e}"))?;
    twyg::setup(opts).map_err(|e| anyhow!("failed to set up logging: {e}"))?;
    Ok(())
}

fn parse_level(level: &str) -> Result<twyg::LogLevel> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Ok(twyg::LogLevel::Trace),
        "debug" => Ok(twyg::LogLevel::Debug),
        "info" => Ok(twyg::LogLevel::Info),
        "warn" | "warning" => Ok(twyg::LogLevel::Warn),
        "error" => Ok(twyg::LogLevel::Error),
        other => anyhow::bail!(
            "Unknown log level: {}\n\nValid levels: error, warn, info, debug, trace",
            other
        ),
    }
}

/// Open the configured index.
pub(crate) fn open_index(config: &Config) -> Result<Index> {
    Index::open(&config.database_path, config.index_options()).with_context(|| {
        format!(
            "Failed to open index at {}",
            config.database_path.display()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert!(matches!(parse_level("INFO"), Ok(twyg::LogLevel::Info)));
        assert!(matches!(parse_level("warning"), Ok(twyg::LogLevel::Warn)));
        assert!(parse_level("loud").is_err());
    }
}
