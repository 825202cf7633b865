//! # Workbook Rollover CLI (`rollover`)
//!
//! The `rollover` binary rotates versioned spreadsheet artifacts to the
//! next reporting week: duplicate the latest workbook, advance its embedded
//! date, patch embedded queries and external links, refresh data
//! connections, and save.
//!
//! ## Usage
//!
//! ```bash
//! rollover --config ./rollover.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rollover run [JOB]` | Rotate every configured job, or one job |
//! | `rollover run --dry-run` | Resolve and report without mutating anything |
//! | `rollover jobs` | List jobs with folder health and latest week |
//! | `rollover clean [JOB]` | Delete the newest artifact to redo a week |
//!
//! A run exits non-zero when any job failed; the final summary lists every
//! job with OK/ERROR followed by the failed job names.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use workbook_rollover::{clean, config, jobs_cmd, runner};

/// Workbook Rollover: weekly workbook rotation and embedded-query
/// patching automation.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file describing the managed folders and jobs.
#[derive(Parser)]
#[command(
    name = "rollover",
    about = "Workbook Rollover — weekly workbook rotation and embedded-query patching",
    version,
    long_about = "Workbook Rollover advances versioned spreadsheet artifacts to the next \
    reporting week: it duplicates the latest workbook of each configured job, advances the \
    embedded reporting date, rewrites embedded query text and external links to the new data \
    window, refreshes live data connections, and saves the result."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./rollover.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Rotate jobs to the next reporting week.
    ///
    /// For each selected job: resolve the latest `PREFIX_Sxx` artifact,
    /// duplicate it under the successor week, advance the date cell, patch
    /// embedded queries and external links, refresh data connections, and
    /// save. Failures are isolated per job.
    Run {
        /// Job name; all configured jobs when omitted.
        job: Option<String>,

        /// Resolve and report without copying or mutating anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// List configured jobs and their folder health.
    ///
    /// Shows each job's folder, whether it exists, and the latest resolved
    /// week. Useful for verifying configuration before a run.
    Jobs,

    /// Delete each job's newest artifact.
    ///
    /// Lets a week be re-run from the previous artifact after a bad
    /// rotation. Only the highest-week file is removed.
    Clean {
        /// Job name; all configured jobs when omitted.
        job: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Run { job, dry_run } => {
            let results = runner::run_jobs(&cfg, job.as_deref(), dry_run)?;
            runner::print_summary(&results);
            if results.iter().any(|(_, ok)| !ok) {
                std::process::exit(1);
            }
        }
        Commands::Jobs => {
            jobs_cmd::list_jobs(&cfg)?;
        }
        Commands::Clean { job } => {
            clean::clean(&cfg, job.as_deref())?;
        }
    }

    Ok(())
}
