//! # farewatch CLI
//!
//! The `farewatch` binary monitors weekend flight fares: it plans the
//! round-trip searches for the coming weeks, fetches and ranks results,
//! tracks prices across runs, and emails a ranked report.
//!
//! ## Usage
//!
//! ```bash
//! farewatch --config ./config/farewatch.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `farewatch init` | Create the SQLite database and run schema migrations |
//! | `farewatch plan` | Print the queries the next run would execute |
//! | `farewatch run` | Execute a full monitoring run |
//! | `farewatch history [KEY]` | Show the price ledger for a key |
//! | `farewatch stats` | Database overview |

mod config;
mod db;
mod email;
mod fetch;
mod history;
mod migrate;
mod models;
mod normalize;
mod planner;
mod rank;
mod report;
mod run;
mod stats;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// farewatch — a weekend flight-fare monitor.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/farewatch.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "farewatch",
    about = "farewatch — monitor weekend round-trip fares and track price changes",
    version,
    long_about = "farewatch plans round-trip flight searches matching weekend patterns \
    (depart Thursday or Friday, return Sunday or Monday), filters results against local-time \
    windows, ranks the cheapest fares per weekend, records best prices in a SQLite ledger, \
    and emails a report with price deltas."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/farewatch.toml`. Search scope, time windows,
    /// database, fetch, and email settings are read from this file; secrets
    /// come from the environment variables it names.
    #[arg(long, global = true, default_value = "./config/farewatch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the `price_history` and `runs`
    /// tables. Idempotent — running it multiple times is safe.
    Init,

    /// Print the queries the next run would execute.
    ///
    /// Pure planning: no fetches, no writes. Useful for verifying the
    /// horizon and pattern dates before a run.
    Plan {
        /// Plan as if today were this date (YYYY-MM-DD).
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Execute a full monitoring run.
    ///
    /// Plans queries, fetches each, normalizes and ranks results, records
    /// best prices in the history ledger, and emails the report.
    Run {
        /// Fetch and rank, but write nothing and send no email.
        #[arg(long)]
        dry_run: bool,

        /// Run even when the refresh interval has not elapsed.
        #[arg(long)]
        force: bool,

        /// Skip email delivery for this run.
        #[arg(long)]
        no_email: bool,
    },

    /// Show the price ledger.
    ///
    /// With KEY, prints that key's records newest-first; without, the most
    /// recently recorded entries across all keys.
    History {
        /// Composite history key (`provider:origin:destination:date:identity`).
        key: Option<String>,

        /// Maximum number of records to print.
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// Show database statistics.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Plan { today } => {
            planner::run_plan(&cfg, today);
        }
        Commands::Run {
            dry_run,
            force,
            no_email,
        } => {
            run::run_pipeline(&cfg, dry_run, force, no_email).await?;
        }
        Commands::History { key, limit } => {
            history::run_history(&cfg, key.as_deref(), limit).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
