use anyhow::Result;
use clap::Parser;
use polyphon_ingest::Config;
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "polyphon", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the database (default: ~/.local/share/polyphon/polyphon.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log at debug level regardless of the configured level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Ingest a JSON-lines fact feed, or a directory of feeds
    ///
    /// Each line of a feed is one fact: a record bound to an identifier, or a
    /// link between two identifiers. Lines may name the source asserting the
    /// fact; otherwise the source is the feed's file stem (so
    /// `musicbrainz.jsonl` asserts as "musicbrainz") unless --source is given.
    ///
    /// Directories are walked recursively and every *.jsonl / *.ndjson file is
    /// ingested in path order. Blank lines and lines starting with '#' are
    /// skipped.
    ///
    /// Ingestion is idempotent: replaying a feed creates nothing new, except
    /// that share percentages on composer and publisher links take the latest
    /// values.
    ///
    /// Malformed entries are reported and skipped unless fail_fast is set in
    /// the configuration, in which case the first one aborts the run.
    Ingest {
        /// Feed file or directory
        path: PathBuf,

        /// Source for entries that do not name one
        #[arg(long)]
        source: Option<String>,
    },
    /// Show the provenance-merged view of an entity
    ///
    /// Looks up TYPE:VALUE (for example `isrc CASE01000001`) as an entity of
    /// KIND and prints every claimed value of each field with the sources
    /// asserting it, the identifiers bound to the entity, and its neighbours
    /// across all link kinds.
    ///
    /// The current value of a field is chosen by source priority
    /// ([source_priority] in the config file), ties going to the most
    /// recently ingested claim.
    Lookup {
        /// Record kind (performer, recording, work, release, ...)
        kind: String,

        /// Identifier scheme (isrc, iswc, upc, ipi, dpid, ...)
        #[arg(value_name = "TYPE")]
        scheme: String,

        /// Identifier value
        value: String,

        /// How many levels of neighbours to expand
        #[arg(long, default_value_t = 1)]
        depth: usize,

        /// Print the view as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the links of one kind touching an identifier
    Links {
        /// Link kind (performer_recording, composer_work, ...)
        link_kind: String,

        /// Identifier scheme
        #[arg(value_name = "TYPE")]
        scheme: String,

        /// Identifier value
        value: String,

        /// Match the identifier on the link's second endpoint
        #[arg(long)]
        reverse: bool,
    },
    /// Print the neighbourhood of an entity as a Graphviz DOT graph
    Graph {
        /// Record kind of the seed entity
        kind: String,

        /// Identifier scheme
        #[arg(value_name = "TYPE")]
        scheme: String,

        /// Identifier value
        value: String,

        /// How many link hops to follow
        #[arg(long, default_value_t = 2)]
        depth: usize,
    },
    /// Show index statistics
    Status,
    /// List the sources known to the index
    Sources,
    /// Manage configuration
    ///
    /// Configuration is loaded from multiple sources with the following priority:
    /// 1. CLI arguments (highest)
    /// 2. Environment variables (POLY_* prefix)
    /// 3. Config file (~/.config/polyphon/config.toml)
    /// 4. Built-in defaults (lowest)
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Show the config file path
    Path,
    /// Create the config file with defaults if it does not exist
    Init,
    /// Print an example configuration
    Example,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.db {
        Some(db) => Config::load_with_db_path(db)?,
        None => Config::load()?,
    };
    commands::setup_logging(&config, cli.verbose)?;

    if let Commands::Config { command } = cli.command {
        return match command {
            ConfigCommands::Show => commands::config::show_config(&config),
            ConfigCommands::Path => commands::config::show_path(),
            ConfigCommands::Init => commands::config::init_config(),
            ConfigCommands::Example => commands::config::show_example(),
        };
    }

    // Ensure database directory exists
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match cli.command {
        Commands::Ingest { path, source } => {
            commands::run_ingest(&config, &path, source.as_deref())?;
        }
        Commands::Lookup {
            kind,
            scheme,
            value,
            depth,
            json,
        } => {
            commands::run_lookup(&config, &kind, &scheme, &value, depth, json)?;
        }
        Commands::Links {
            link_kind,
            scheme,
            value,
            reverse,
        } => {
            commands::show_links(&config, &link_kind, &scheme, &value, reverse)?;
        }
        Commands::Graph {
            kind,
            scheme,
            value,
            depth,
        } => {
            commands::show_graph(&config, &kind, &scheme, &value, depth)?;
        }
        Commands::Status => {
            commands::show_status(&config)?;
        }
        Commands::Sources => {
            commands::show_sources(&config)?;
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_lookup() {
        let cli = Cli::try_parse_from([
            "polyphon", "lookup", "recording", "isrc", "CASE01000001", "--depth", "2", "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Lookup {
                kind,
                scheme,
                value,
                depth,
                json,
            } => {
                assert_eq!(kind, "recording");
                assert_eq!(scheme, "isrc");
                assert_eq!(value, "CASE01000001");
                assert_eq!(depth, 2);
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_db_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["polyphon", "status", "--db", "/tmp/p.db"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/p.db")));
    }
}
