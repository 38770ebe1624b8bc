//! # Positron CLI (`positron`)
//!
//! ## Usage
//!
//! ```bash
//! positron --config ./config/positron.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `positron init` | Create the index database and collection |
//! | `positron chunk <file>` | Show the chunks a file would produce |
//! | `positron ingest <file> --document-id <id>` | Chunk, embed, and index a file |
//! | `positron search "<query>"` | Ranked similarity search |
//! | `positron ask "<message>"` | Answer grounded in the index |
//! | `positron remove <id>` | Remove a document's chunks |
//! | `positron stats` | Index summary |

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use positron::config::{self, Config, DEFAULT_CONFIG_PATH};
use positron::{app, ask, ingest, logging, search, stats};

/// Positron: retrieval-augmented answers over your documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "positron",
    about = "Positron: retrieval-augmented answers over your documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the index database and collection. Idempotent.
    Init,

    /// Dry run: print the chunks a file would produce.
    ///
    /// Does not contact any provider or touch the index. Uses the config
    /// file when present, otherwise defaults.
    Chunk {
        /// File to chunk (`.pdf` is split by page, anything else is text).
        file: PathBuf,

        /// Override `chunking.chunk_size`.
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Override `chunking.overlap`.
        #[arg(long)]
        overlap: Option<usize>,
    },

    /// Chunk, embed, and index a file under a document id.
    ///
    /// An existing document with the same id is replaced.
    Ingest {
        file: PathBuf,

        /// Owning document id; chunk ids are `<id>_<n>`.
        #[arg(long)]
        document_id: i64,

        /// Source label stored in chunk metadata (defaults to the file name).
        #[arg(long)]
        source: Option<String>,

        /// Mark text as a web page capture (`type = web`).
        #[arg(long)]
        web: bool,
    },

    /// Ranked similarity search over indexed chunks.
    Search {
        query: String,

        /// Number of results (defaults to `retrieval.top_k`).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Answer a message, grounded in the most similar chunks.
    Ask {
        message: String,

        /// Number of chunks to ground on (defaults to `retrieval.top_k`).
        #[arg(long)]
        top_k: Option<usize>,

        /// Skip retrieval and answer ungrounded.
        #[arg(long)]
        no_context: bool,
    },

    /// Remove every chunk of a document.
    Remove { document_id: i64 },

    /// Print index statistics.
    Stats,
}

/// Load and validate the config file, then install logging from it.
fn load(path: &Path) -> anyhow::Result<Config> {
    let cfg = config::load_config(path)?;
    logging::init_with_config(&cfg.logging);
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // The dry run works without a config file.
        Commands::Chunk {
            file,
            chunk_size,
            overlap,
        } => {
            let mut cfg = config::load_or_default(&cli.config)?;
            if let Some(size) = chunk_size {
                cfg.chunking.chunk_size = size;
            }
            if let Some(overlap) = overlap {
                cfg.chunking.overlap = overlap;
            }
            config::validate(&cfg)?;
            logging::init_with_config(&cfg.logging);
            ingest::run_chunk(&cfg, &file)?;
        }
        Commands::Init => {
            let cfg = load(&cli.config)?;
            app::open_store(&cfg).await?;
            println!("Index initialized at {}", cfg.index.path.display());
        }
        Commands::Ingest {
            file,
            document_id,
            source,
            web,
        } => {
            let cfg = load(&cli.config)?;
            ingest::run_ingest(&cfg, &file, document_id, source.as_deref(), web).await?;
        }
        Commands::Search { query, top_k } => {
            let cfg = load(&cli.config)?;
            search::run_search(&cfg, &query, top_k).await?;
        }
        Commands::Ask {
            message,
            top_k,
            no_context,
        } => {
            let cfg = load(&cli.config)?;
            ask::run_ask(&cfg, &message, top_k, no_context).await?;
        }
        Commands::Remove { document_id } => {
            let cfg = load(&cli.config)?;
            ingest::run_remove(&cfg, document_id).await?;
        }
        Commands::Stats => {
            let cfg = load(&cli.config)?;
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
