//! mrrc-ingest: stream MARC records into a search index and manage its aliases.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mrrc_ingest::engine::HttpEngine;
use mrrc_ingest::pipeline::{ingest, run_pipeline, IngestRequest, JsonLinesSink, TitleSink};
use mrrc_ingest::source::open_source;
use mrrc_ingest::{IndexLifecycleManager, IngestConfig};
use std::io;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "mrrc-ingest")]
#[command(about = "Ingest MARC records into a search index and manage index aliases")]
#[command(version)]
struct Cli {
    /// Search engine URL
    #[arg(short, long, env = "MRRC_INGEST_URL")]
    url: Option<String>,

    /// Index to operate on
    #[arg(short, long)]
    index: Option<String>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Consumer {
    /// Bulk index into the search engine
    Es,
    /// Write documents as JSON lines to stdout
    Json,
    /// Write titles to stdout
    Title,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and ingest a record file (`-` for stdin, `.gz` is decompressed)
    Ingest {
        /// Record file
        file: String,

        /// Mapping ruleset
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Where mapped documents go
        #[arg(short = 'C', long, value_enum, default_value = "es")]
        consumer: Consumer,

        /// Index prefix and production alias name
        #[arg(short, long, default_value = "aleph")]
        prefix: String,

        /// Promote the alias to the new index on success
        #[arg(long)]
        auto: bool,
    },

    /// List indexes
    Indexes,

    /// List aliases and their indexes
    Aliases,

    /// Show search engine identity
    Ping,

    /// Delete the index named by --index
    Delete,

    /// Point the production alias at the index named by --index
    Promote {
        /// Alias name
        #[arg(short, long, default_value = "aleph")]
        prefix: String,
    },

    /// Copy the index named by --index into another index
    Reindex {
        /// Name of the new index
        #[arg(short, long)]
        destination: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &cli.config {
        Some(path) => IngestConfig::load(path)?,
        None => IngestConfig::default(),
    };
    if let Some(url) = &cli.url {
        config.engine_url.clone_from(url);
    }

    match cli.command {
        Commands::Ingest {
            file,
            rules,
            consumer,
            prefix,
            auto,
        } => {
            if let Some(rules) = rules {
                config.rules_path = rules;
            }
            config.validate()?;
            let mapper = config.load_mapper()?;
            let source =
                open_source(&file).with_context(|| format!("Failed to open input '{file}'"))?;

            match consumer {
                Consumer::Es => {
                    let engine = connect(&config)?;
                    let request = IngestRequest {
                        index: cli.index,
                        prefix,
                        auto_promote: auto,
                    };
                    let report = ingest(source, mapper, &engine, &request, &config.pipeline())?;
                    println!("{} documents indexed into {}", report.indexed, report.index);
                    if report.promoted {
                        println!("Alias {} now points to {}", request.prefix, report.index);
                    }
                },
                Consumer::Json => {
                    let mut sink = JsonLinesSink::new(io::stdout().lock());
                    let report = run_pipeline(source, mapper, &mut sink, &config.pipeline())?;
                    info!(documents = report.consumed, "wrote JSON documents");
                },
                Consumer::Title => {
                    let mut sink = TitleSink::new(io::stdout().lock());
                    let report = run_pipeline(source, mapper, &mut sink, &config.pipeline())?;
                    info!(documents = report.consumed, "wrote titles");
                },
            }
        },
        Commands::Indexes => {
            let engine = connect(&config)?;
            for index in IndexLifecycleManager::new(&engine).list_indexes()? {
                println!(
                    "\nName: {}\n  Documents: {}\n  Health: {}\n  Status: {}\n  UUID: {}\n  Size: {}",
                    index.name,
                    index.doc_count,
                    index.health,
                    index.status,
                    index.uuid,
                    index.store_size
                );
            }
        },
        Commands::Aliases => {
            let engine = connect(&config)?;
            for alias in IndexLifecycleManager::new(&engine).list_aliases()? {
                println!("\nAlias: {}\n  Index: {}", alias.alias, alias.index);
            }
        },
        Commands::Ping => {
            let engine = connect(&config)?;
            let info = IndexLifecycleManager::new(&engine).ping()?;
            println!(
                "\nName: {}\nCluster: {}\nVersion: {}\nLucene version: {}",
                info.name, info.cluster_name, info.version, info.lucene_version
            );
        },
        Commands::Delete => {
            let index = required_index(cli.index)?;
            let engine = connect(&config)?;
            IndexLifecycleManager::new(&engine).delete(&index)?;
            println!("Deleted {index}");
        },
        Commands::Promote { prefix } => {
            let index = required_index(cli.index)?;
            let engine = connect(&config)?;
            IndexLifecycleManager::new(&engine).promote(&index, &prefix)?;
            println!("Alias {prefix} now points to {index}");
        },
        Commands::Reindex { destination } => {
            let index = required_index(cli.index)?;
            let engine = connect(&config)?;
            let count = IndexLifecycleManager::new(&engine).reindex(&index, &destination)?;
            println!("{count} documents reindexed");
        },
    }

    Ok(())
}

fn connect(config: &IngestConfig) -> Result<HttpEngine> {
    HttpEngine::new(&config.engine_url, config.request_timeout())
        .with_context(|| format!("Failed to create client for {}", config.engine_url))
}

fn required_index(index: Option<String>) -> Result<String> {
    match index {
        Some(index) if !index.is_empty() => Ok(index),
        _ => bail!("This command needs an index name (--index)"),
    }
}
