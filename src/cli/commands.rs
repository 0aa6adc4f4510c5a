use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lt", about = concat!("labeltree v", env!("CARGO_PKG_VERSION"), " - Todoist labels that follow your task tree"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Todoist API token
    #[arg(short = 'a', long = "api-key", env = "TODOIST_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Config file (default: ./labeltree.toml if present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch Todoist and keep labels up to date
    Run(RunArgs),
    /// Show the label changes rules would make to a saved snapshot
    Plan(PlanArgs),
    /// Fetch all projects, sections, tasks, and labels and save them as JSON
    Dump(DumpArgs),
}

// ---------------------------------------------------------------------------
// Rule args
// ---------------------------------------------------------------------------

#[derive(Args, Default)]
pub struct RuleArgs {
    /// "label suffix": label the next (sub)task at or beneath any project,
    /// section, or task whose name ends in suffix. Example: "next_action -n"
    #[arg(short, long, num_args = 1.., value_name = "LABEL SUFFIX")]
    pub serial: Vec<String>,
    /// "label suffix": label every childless (sub)task at or beneath any item
    /// whose name ends in suffix. Example: "actionable -a"
    #[arg(short, long, num_args = 1.., value_name = "LABEL SUFFIX")]
    pub parallel: Vec<String>,
    /// "label suffix": label every (sub)task at or beneath any item whose name
    /// ends in suffix. Example: "parked -p"
    #[arg(short = 'l', long, num_args = 1.., value_name = "LABEL SUFFIX")]
    pub all: Vec<String>,
}

// ---------------------------------------------------------------------------
// Command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub rules: RuleArgs,
    /// Seconds between syncs (default: from config, else 5)
    #[arg(short, long)]
    pub delay: Option<u64>,
    /// Describe changes without writing them, then exit
    #[arg(short = 'n', long)]
    pub dry_run: bool,
    /// Update once, then stop watching for changes
    #[arg(short, long)]
    pub once: bool,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Snapshot file written by `lt dump`
    #[arg(long)]
    pub snapshot: PathBuf,
    #[command(flatten)]
    pub rules: RuleArgs,
}

#[derive(Args)]
pub struct DumpArgs {
    /// Where to write the snapshot
    pub path: PathBuf,
}
