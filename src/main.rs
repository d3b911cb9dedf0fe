//! Binary entry point for quote-sync.
//!
//! This binary provides the CLI interface over the quote reconciliation engine.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use quote_sync::cli::{self, AppContext};
use quote_sync::config::QuoteSyncConfig;
use quote_sync::observability;
use quote_sync::{ConflictPolicy, ResolveAction};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// quote-sync - keep a local quote collection reconciled with a remote one.
#[derive(Parser)]
#[command(name = "quote-sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "QUOTE_SYNC_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Add a quote (replaces an existing quote with the same text).
    Add {
        /// The quote text.
        text: String,

        /// The quote category.
        category: String,

        /// Also publish the quote to the remote.
        #[arg(long)]
        push: bool,
    },

    /// List quotes.
    List {
        /// Category filter; defaults to the last selected category.
        #[arg(short = 'C', long)]
        category: Option<String>,
    },

    /// List categories.
    Categories,

    /// Show a random quote.
    Random {
        /// Category filter; defaults to the last selected category.
        #[arg(short = 'C', long)]
        category: Option<String>,
    },

    /// Remember a category filter.
    Select {
        /// Category name, or `all`.
        category: String,
    },

    /// Import quotes from a JSON file.
    Import {
        /// Path to a JSON array of `{text, category}` objects.
        file: PathBuf,
    },

    /// Print all quotes as JSON.
    Export,

    /// Sync with the remote once.
    Sync {
        /// Conflict policy: server-wins, local-wins or merge.
        #[arg(short, long)]
        policy: Option<ConflictPolicy>,
    },

    /// Resolve a divergence.
    Resolve {
        /// local, server or merge.
        action: ResolveAction,
    },

    /// Auto-sync until Ctrl-C.
    Watch {
        /// Interval between syncs in milliseconds (minimum 1000).
        #[arg(short, long)]
        interval_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match QuoteSyncConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
async fn run_command(command: Commands, config: QuoteSyncConfig) -> quote_sync::Result<()> {
    let ctx = AppContext::from_config(config)?;
    let mut stdout = std::io::stdout().lock();
    let out: &mut dyn Write = &mut stdout;

    match command {
        Commands::Add {
            text,
            category,
            push,
        } => cli::cmd_add(&ctx, &text, &category, push, out).await,
        Commands::List { category } => cli::cmd_list(&ctx, category.as_deref(), out),
        Commands::Categories => cli::cmd_categories(&ctx, out),
        Commands::Random { category } => cli::cmd_random(&ctx, category.as_deref(), out),
        Commands::Select { category } => cli::cmd_select(&ctx, &category, out),
        Commands::Import { file } => cli::cmd_import(&ctx, &file, out),
        Commands::Export => cli::cmd_export(&ctx, out),
        Commands::Sync { policy } => cli::cmd_sync(&ctx, policy, out).await,
        Commands::Resolve { action } => cli::cmd_resolve(&ctx, action, out).await,
        Commands::Watch { interval_ms } => {
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            };
            cli::cmd_watch(&ctx, interval_ms, shutdown, out).await
        },
    }
}
