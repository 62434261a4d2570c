//! # Stargazer CLI (`stargazer`)
//!
//! ## Usage
//!
//! ```bash
//! stargazer --config ./config/stargazer.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `stargazer init` | Create the SQLite database and run schema migrations |
//! | `stargazer serve` | Ingest in the background and serve the trending report |
//! | `stargazer poll` | Ingest only; `--once` runs a single tick |
//! | `stargazer report` | Print the current ranking |
//! | `stargazer stats` | Print database statistics |
//!
//! The config file is optional. `APP_ENV`, `DATABASE_URL`, `GITHUB_TOKEN`
//! and `PORT` override it. A `.env` file in the working directory is loaded
//! first; variables already set in the process take precedence.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use stargazer::{config, ingest, migrate, report, server, stats};

/// Stargazer: ranks GitHub repositories by stars received in the last day.
#[derive(Parser)]
#[command(
    name = "stargazer",
    about = "Stargazer: ranks GitHub repositories by stars received in the last day",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = "./config/stargazer.toml")]
    config: PathBuf,

    /// Log filter, e.g. `info` or `stargazer=debug,tower_http=info`.
    /// `RUST_LOG` takes precedence when set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Poll GitHub in the background and serve the trending report over HTTP.
    Serve,

    /// Poll GitHub and store stars without serving.
    Poll {
        /// Run a single tick and exit.
        #[arg(long)]
        once: bool,
    },

    /// Compute the ranking now and print it.
    Report {
        /// Number of repositories to rank (defaults to `report.limit`).
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Show event counts and window coverage.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing .env is normal.
    let _ = dotenvy::dotenv();

    let cfg = config::load_config(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&cli.log_level)
            .with_context(|| format!("invalid log level: {}", cli.log_level))?,
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(cfg.is_dev())
        .init();

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Poll { once } => {
            ingest::run_poll(&cfg, once, server::shutdown_signal()).await?;
        }
        Commands::Report { limit } => {
            report::run_report(&cfg, limit).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
