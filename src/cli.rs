//! CLI definitions for rangecron.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};

/// rangecron CLI.
#[derive(Parser)]
#[command(name = "rangecron")]
#[command(about = "Recurring cron jobs bounded by start/end date windows")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (defaults are used when omitted)
    #[arg(short, long, global = true, env = "RANGECRON_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the scheduler in the foreground until Ctrl-C
    Run,

    /// Add or update a recurring job
    Add(AddArgs),

    /// Remove a recurring job
    Remove {
        /// Recurring job id
        #[arg(long)]
        id: String,
    },

    /// Create a job for a recurring job right now
    Trigger {
        /// Recurring job id
        #[arg(long)]
        id: String,
    },

    /// List registered recurring jobs
    List,
}

#[derive(clap::Args)]
pub(crate) struct AddArgs {
    /// Recurring job id
    #[arg(long)]
    pub id: String,

    /// Cron expression in the configured format
    #[arg(long)]
    pub cron: String,

    /// Job type handed to the job factory
    #[arg(long)]
    pub job_type: String,

    /// Job method handed to the job factory
    #[arg(long)]
    pub method: String,

    /// Job argument; parsed as JSON, otherwise taken as a string
    #[arg(long = "arg")]
    pub args: Vec<String>,

    /// IANA or Windows time zone id (default: UTC)
    #[arg(long)]
    pub time_zone: Option<String>,

    /// Target queue (default: "default")
    #[arg(long)]
    pub queue: Option<String>,

    /// First local time the job may fire, e.g. 2024-05-01T00:00:00
    #[arg(long)]
    pub start: Option<NaiveDateTime>,

    /// Local time from which the job no longer fires
    #[arg(long)]
    pub end: Option<NaiveDateTime>,

    /// Only the end date counts; the whole end day is included
    #[arg(long, conflicts_with = "end_exact")]
    pub end_date_only: bool,

    /// The end bound is exact even when the scheduler ignores times
    #[arg(long)]
    pub end_exact: bool,
}
