mod run;
pub use run::cmd_run;

use std::path::Path;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::snapshot_io;
use crate::io::sync_api::SyncClient;
use crate::model::{Config, Policy};
use crate::ops::forest::Forest;
use crate::ops::plan::LabelPlan;
use crate::ops::rule::{self, Rule};

/// Settings shared by every command
pub struct Context {
    pub json: bool,
    pub api_key: Option<String>,
    pub config: Config,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let config = config_io::load_config(cli.config.as_deref(), &cwd)?;
    let ctx = Context {
        json: cli.json,
        api_key: cli.api_key.or_else(|| config.api_key.clone()),
        config,
    };

    match cli.command {
        Commands::Run(args) => cmd_run(args, &ctx),
        Commands::Plan(args) => cmd_plan(args, &ctx),
        Commands::Dump(args) => cmd_dump(args, &ctx),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Rules from the config file, then `--serial`, `--parallel`, and `--all`.
fn collect_rules(config: &Config, args: &RuleArgs) -> Result<Vec<Rule>, Box<dyn std::error::Error>> {
    let mut rules = config
        .rules
        .iter()
        .map(Rule::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    rules.extend(rule::parse_all(Policy::Serial, &args.serial)?);
    rules.extend(rule::parse_all(Policy::Parallel, &args.parallel)?);
    rules.extend(rule::parse_all(Policy::All, &args.all)?);

    if rules.is_empty() {
        return Err(
            "no rules given (use --serial, --parallel, --all, or [[rules]] in labeltree.toml)".into(),
        );
    }
    Ok(rules)
}

fn sync_client(ctx: &Context) -> Result<SyncClient, Box<dyn std::error::Error>> {
    let api_key = ctx
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or("no API key (use --api-key, TODOIST_API_KEY, or api_key in labeltree.toml)")?;
    Ok(SyncClient::new(api_key, &ctx.config.sync.api_url).with_batch_size(ctx.config.sync.batch_size))
}

/// Print a plan as text lines or JSON
fn print_plan(plan: &LabelPlan<'_>, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(&plan_to_json(plan))?);
    } else {
        for line in format_plan(plan) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_plan(args: PlanArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let rules = collect_rules(&ctx.config, &args.rules)?;
    let snapshot = snapshot_io::read_snapshot(&args.snapshot)?;
    let forest = Forest::build(&snapshot.projects, &snapshot.sections, &snapshot.items)?;
    let plan = LabelPlan::build(&snapshot, &forest, &rules);
    print_plan(&plan, ctx.json)?;
    Ok(())
}

fn cmd_dump(args: DumpArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let client = sync_client(ctx)?;
    let snapshot = client.read_all()?;
    snapshot_io::write_snapshot(&args.path, &snapshot)?;

    let path = display_path(&args.path);
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&dump_to_json(&path, &snapshot))?);
    } else {
        println!("{}", format_dump(&path, &snapshot));
    }
    Ok(())
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
