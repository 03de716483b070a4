//! # Scripture Harness CLI (`scx`)
//!
//! ## Usage
//!
//! ```bash
//! scx --config ./config/scx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scx init` | Create the SQLite database and verse schema |
//! | `scx refs "<text>"` | Print citations parsed from text (no database) |
//! | `scx search "<query>"` | Hybrid ranked verse list |
//! | `scx context "<query>"` | Grounding document and sources |
//! | `scx chapter <book> <n>` | A whole chapter |
//! | `scx stats` | Verse and embedding counts |
//!
//! Logs go to stderr, filtered by `RUST_LOG` (default `warn`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use scripture_harness::{chapter, config, migrate, search, stats};

/// Scripture Harness CLI — hybrid Bible verse retrieval and grounding
/// context for AI tools.
#[derive(Parser)]
#[command(
    name = "scx",
    about = "Scripture Harness — hybrid Bible verse retrieval and grounding context for AI tools",
    version,
    long_about = "Scripture Harness finds verses relevant to a free-form question by combining \
    exact citation lookup with embedding similarity, expands them with surrounding verses, \
    and renders a grounding document for a language model."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/scx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite file and the `verses` / `verse_vectors` tables.
    /// Idempotent.
    Init,

    /// Print the canonical references found in text.
    Refs {
        /// Free text to scan for citations.
        text: String,
    },

    /// Hybrid search: exact citations plus vector similarity.
    Search {
        query: String,

        /// Number of vector results (defaults to `retrieval.n_results`).
        #[arg(long)]
        limit: Option<usize>,

        /// Restrict to one stored translation (e.g. `KJV`, `개역한글`).
        #[arg(long)]
        translation: Option<String>,
    },

    /// Build the grounding document for a question.
    Context {
        query: String,

        /// Preferred stored translation.
        #[arg(long)]
        translation: Option<String>,

        /// Display the overlay translation (e.g. ESV) for English queries.
        #[arg(long)]
        overlay: bool,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print one chapter. The book may be given in English or Korean.
    Chapter {
        book: String,
        chapter: u32,

        #[arg(long)]
        translation: Option<String>,
    },

    /// Show verse and embedding counts per translation.
    Stats,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Refs { text } = &cli.command {
        search::run_refs(text);
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Refs { .. } => {
            // Handled above (before config loading)
        }
        Commands::Search {
            query,
            limit,
            translation,
        } => {
            search::run_search(&cfg, &query, limit, translation).await?;
        }
        Commands::Context {
            query,
            translation,
            overlay,
            json,
        } => {
            search::run_context(&cfg, &query, translation, overlay, json).await?;
        }
        Commands::Chapter {
            book,
            chapter,
            translation,
        } => {
            chapter::run_chapter(&cfg, &book, chapter, translation).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
