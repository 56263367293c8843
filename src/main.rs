//! # snipdex CLI
//!
//! The `snipdex` binary drives the build pipeline.
//!
//! ## Usage
//!
//! ```bash
//! snipdex --config ./config/snipdex.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `snipdex build` | Build every record and write `index.json` plus listing pages |
//! | `snipdex sources` | List configured repositories and their status |
//! | `snipdex inspect <repo> <file>` | Print one record with its ranking breakdown |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use snipdex::build::{run_build, BuildOptions};
use snipdex::config;
use snipdex::inspect::run_inspect;
use snipdex::progress::ProgressMode;
use snipdex::sources::list_sources;

/// snipdex: ranking, search tokens, and listing pages for snippet repositories.
#[derive(Parser)]
#[command(name = "snipdex", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/snipdex.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every record and write the index and listing pages.
    ///
    /// Repositories with configuration errors are skipped; the command
    /// still exits non-zero after writing everything else.
    Build {
        /// Count records and pages without writing anything.
        #[arg(long)]
        dry_run: bool,

        /// Skip git history; every record gets empty history.
        #[arg(long)]
        no_history: bool,

        /// Progress on stderr: off, human, or json. Defaults to human on a TTY.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// List configured repositories and their status.
    Sources,

    /// Build a single record and print it with its ranking breakdown.
    Inspect {
        /// Repository slug.
        repository: String,

        /// Content file name, e.g. `head.md`.
        file: String,

        /// Skip git history.
        #[arg(long)]
        no_history: bool,
    },
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("SNIPDEX_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Build {
            dry_run,
            no_history,
            progress,
        } => {
            let opts = BuildOptions {
                dry_run,
                no_history,
                progress: progress.unwrap_or_else(ProgressMode::default_for_tty),
            };
            run_build(&cfg, opts).await?;
        }
        Commands::Sources => {
            list_sources(&cfg)?;
        }
        Commands::Inspect {
            repository,
            file,
            no_history,
        } => {
            run_inspect(&cfg, &repository, &file, no_history).await?;
        }
    }

    Ok(())
}
