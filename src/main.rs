//! Weibo-Harvest main entry point
//!
//! Command-line interface for the Weibo-Harvest fetch-and-persist engine.

use anyhow::{bail, Context};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;
use weibo_harvest::config::{load_config, Config};
use weibo_harvest::engine::{build_http_client, FetchEngine, HttpTransport, LogProgress};
use weibo_harvest::strategies::{
    AdvancedKind, Comment1Strategy, Comment2Strategy, DetailStrategy, SearchKind,
    SearchListStrategy,
};
use weibo_harvest::{FetchStrategy, RecordSink, RunMode, SqliteDocStore};

/// Weibo-Harvest: fetch and persist Weibo search, detail, and comment data
#[derive(Parser, Debug)]
#[command(name = "weibo-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Fetch and persist Weibo data", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch search-result pages for a query
    Search {
        /// Search query (keep surrounding # marks for topics)
        query: String,

        /// Collection to persist into
        #[arg(short = 'o', long, value_name = "NAME")]
        collection: String,

        /// Search flavor: composite, realtime, or advanced
        #[arg(long, default_value = "composite")]
        kind: String,

        /// Advanced result filter: composite, hot, or original
        #[arg(long, default_value = "composite")]
        filter: String,

        /// Advanced time scope start, hour granularity (YYYY-MM-DD-HH)
        #[arg(long, value_name = "TIME")]
        time_start: Option<String>,

        /// Advanced time scope end, hour granularity (YYYY-MM-DD-HH)
        #[arg(long, value_name = "TIME")]
        time_end: Option<String>,

        /// Number of result pages to walk
        #[arg(long, default_value_t = 50)]
        pages: u32,

        /// Fetch one page at a time instead of fanning out
        #[arg(long)]
        sequential: bool,
    },

    /// Fetch detail pages for a set of mblogids
    Detail {
        /// mblogids to fetch
        #[arg(required = true)]
        ids: Vec<String>,

        /// Collection to persist into
        #[arg(short = 'o', long, value_name = "NAME")]
        collection: String,

        /// Fetch one page at a time instead of fanning out
        #[arg(long)]
        sequential: bool,
    },

    /// Walk comment threads under messages or level-1 comments
    Comments {
        /// Thread level: 1 for comments under a message, 2 for replies
        /// under a level-1 comment
        #[arg(long, default_value_t = 1)]
        level: u8,

        /// Author uid of each parent (repeat, paired with --mid by position)
        #[arg(long, required = true)]
        uid: Vec<String>,

        /// mid of each parent (repeat, paired with --uid by position)
        #[arg(long, required = true)]
        mid: Vec<String>,

        /// Collection to persist into
        #[arg(short = 'o', long, value_name = "NAME")]
        collection: String,

        /// Walk one thread at a time instead of fanning out
        #[arg(long)]
        sequential: bool,
    },

    /// List the collections currently holding documents
    Collections,

    /// Print persisted documents by identifier
    Show {
        /// Collection to read from
        collection: String,

        /// Document identifiers
        #[arg(required = true)]
        ids: Vec<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    let store = SqliteDocStore::open(std::path::Path::new(&config.storage.database_path))
        .with_context(|| format!("failed to open {}", config.storage.database_path))?;
    let sink = RecordSink::new(Arc::new(Mutex::new(store)));

    match cli.command {
        Command::Collections => {
            for name in sink.list_collections()? {
                println!("{}", name);
            }
            Ok(())
        }
        Command::Show { collection, ids } => {
            for doc in sink.find_by_ids(&collection, &ids)? {
                println!("{}", serde_json::to_string_pretty(&doc)?);
            }
            Ok(())
        }
        command => handle_fetch(command, &config, sink).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("weibo_harvest=info,warn"),
            1 => EnvFilter::new("weibo_harvest=debug,info"),
            2 => EnvFilter::new("weibo_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the strategy for a fetch subcommand and runs the engine over it
async fn handle_fetch(command: Command, config: &Config, sink: RecordSink) -> anyhow::Result<()> {
    let (strategy, sequential): (Arc<dyn FetchStrategy>, bool) = match command {
        Command::Search {
            query,
            collection,
            kind,
            filter,
            time_start,
            time_end,
            pages,
            sequential,
        } => {
            let mut strategy = SearchListStrategy::new(&query, &collection).pages(pages);
            strategy = match kind.as_str() {
                "composite" => strategy.kind(SearchKind::Composite),
                "realtime" => strategy.kind(SearchKind::Realtime),
                "advanced" => {
                    let filter = match filter.as_str() {
                        "composite" => AdvancedKind::Composite,
                        "hot" => AdvancedKind::Hot,
                        "original" => AdvancedKind::Original,
                        other => bail!("unknown filter: {} (composite|hot|original)", other),
                    };
                    strategy.advanced(
                        filter,
                        time_start.as_deref().map(parse_scope_time).transpose()?,
                        time_end.as_deref().map(parse_scope_time).transpose()?,
                    )
                }
                other => bail!("unknown search kind: {} (composite|realtime|advanced)", other),
            };
            (Arc::new(strategy), sequential)
        }
        Command::Detail {
            ids,
            collection,
            sequential,
        } => (Arc::new(DetailStrategy::new(ids, &collection)), sequential),
        Command::Comments {
            level,
            uid,
            mid,
            collection,
            sequential,
        } => {
            if uid.len() != mid.len() {
                bail!(
                    "--uid and --mid must be paired: got {} uids and {} mids",
                    uid.len(),
                    mid.len()
                );
            }
            let threads: Vec<(String, String)> = uid.into_iter().zip(mid).collect();
            let strategy: Arc<dyn FetchStrategy> = match level {
                1 => Arc::new(Comment1Strategy::new(threads, &collection)),
                2 => Arc::new(Comment2Strategy::new(threads, &collection)),
                other => bail!("unknown comment level: {} (1|2)", other),
            };
            (strategy, sequential)
        }
        Command::Collections | Command::Show { .. } => unreachable!(),
    };

    let client = build_http_client(config)?;
    let transport = Arc::new(HttpTransport::new(client.clone()));
    let engine = FetchEngine::new(
        transport,
        client,
        sink,
        Arc::new(LogProgress),
        &config.engine,
    );

    let mode = if sequential {
        RunMode::Sequential
    } else {
        RunMode::Concurrent
    };
    let ids = engine.run(strategy, mode).await;
    println!("persisted {} documents", ids.len());

    Ok(())
}

/// Parses the hour-granular advanced-search time scope format
fn parse_scope_time(text: &str) -> anyhow::Result<NaiveDateTime> {
    let date = NaiveDateTime::parse_from_str(&format!("{}:00", text), "%Y-%m-%d-%H:%M")
        .with_context(|| format!("time scope must be YYYY-MM-DD-HH, got {}", text))?;
    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scope_time() {
        let t = parse_scope_time("2024-03-01-08").unwrap();
        assert_eq!(t.format("%Y-%m-%d-%H").to_string(), "2024-03-01-08");
    }

    #[test]
    fn test_parse_scope_time_rejects_garbage() {
        assert!(parse_scope_time("march first").is_err());
    }
}
