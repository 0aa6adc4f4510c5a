use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use super::{Context, collect_rules, print_plan, sync_client};
use crate::cli::commands::RunArgs;
use crate::io::sync_api::{FULL_SYNC, SyncClient, SyncError};
use crate::ops::forest::{Forest, ForestError};
use crate::ops::plan::{ChangeKind, LabelPlan};
use crate::ops::rule::Rule;

/// Error type for one read → plan → write cycle
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error("malformed hierarchy: {0}")]
    Forest(#[from] ForestError),
    #[error("could not print plan: {0}")]
    Output(#[from] serde_json::Error),
}

/// Poll for changes and keep labels in line with the rules.
///
/// `--once` and `--dry-run` stop after the first cycle and report its error;
/// otherwise a failed cycle is logged and the next one starts from a full
/// sync.
pub fn cmd_run(args: RunArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let rules = collect_rules(&ctx.config, &args.rules)?;
    let client = sync_client(ctx)?;
    let delay = Duration::from_secs(args.delay.unwrap_or(ctx.config.sync.delay_secs));
    let single = args.once || args.dry_run;

    for rule in &rules {
        info!(%rule, "loaded rule");
    }

    let mut sync_token = FULL_SYNC.to_string();
    loop {
        let started = Instant::now();
        let result = run_cycle(&client, &rules, &sync_token, args.dry_run, ctx.json);
        if single {
            return result.map(|_| ()).map_err(Into::into);
        }
        sync_token = next_cursor(result);
        pause(started, delay);
    }
}

/// Cursor for the cycle after `result`. A failed cycle is logged and the
/// next one starts from a full sync.
fn next_cursor(result: Result<String, CycleError>) -> String {
    result.unwrap_or_else(|e| {
        error!(error = %e, "sync cycle failed");
        FULL_SYNC.to_string()
    })
}

/// Read, plan, and (unless `dry_run`) write. Returns the cursor for the next
/// cycle.
fn run_cycle(
    client: &SyncClient,
    rules: &[Rule],
    sync_token: &str,
    dry_run: bool,
    json: bool,
) -> Result<String, CycleError> {
    let Some(snapshot) = client.read_changes(sync_token)? else {
        return Ok(sync_token.to_string());
    };
    let forest = Forest::build(&snapshot.projects, &snapshot.sections, &snapshot.items)?;
    let plan = LabelPlan::build(&snapshot, &forest, rules);

    if dry_run {
        print_plan(&plan, json)?;
        return Ok(snapshot.sync_token.clone());
    }
    if plan.is_empty() {
        info!("labels already up to date");
        return Ok(snapshot.sync_token.clone());
    }

    for label in plan.new_labels() {
        info!(%label, "creating new label");
    }
    for change in plan.changes() {
        match change.kind {
            ChangeKind::Add => info!(label = %change.label, task = %change.task.content, "adding label"),
            ChangeKind::Remove => {
                info!(label = %change.label, task = %change.task.content, "removing label")
            }
        }
    }

    let commands = plan.commands();
    Ok(client.write_changes(&snapshot.sync_token, &commands)?)
}

/// Sleep out whatever is left of `delay` since `started`
fn pause(started: Instant, delay: Duration) {
    let elapsed = started.elapsed();
    match delay.checked_sub(elapsed) {
        Some(remaining) => {
            info!(secs = remaining.as_secs_f64(), "waiting for changes");
            thread::sleep(remaining);
        }
        None => warn!(secs = elapsed.as_secs_f64(), "sync took longer than the delay"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::sync_api::mock::MockApi;
    use crate::model::{ItemKind, Policy};
    use serde_json::json;

    fn rules() -> Vec<Rule> {
        vec![Rule::parse(Policy::Serial, "next -n").unwrap()]
    }

    fn account(sync_token: &str, parent: Option<&str>) -> serde_json::Value {
        json!({
            "sync_token": sync_token,
            "full_sync": true,
            "projects": [{"id": "p", "name": "Errands -n", "child_order": 0}],
            "items": [
                {"id": "a", "content": "Buy stamps", "child_order": 0, "project_id": "p", "parent_id": parent},
                {"id": "b", "content": "Post letter", "child_order": 1, "project_id": "p", "labels": ["next"]}
            ],
            "labels": [{"id": "l", "name": "next"}]
        })
    }

    #[test]
    fn failed_cycle_restarts_from_full_sync() {
        let err = CycleError::Forest(ForestError::ParentCycle {
            kind: ItemKind::Task,
            id: "a".into(),
        });
        assert_eq!(next_cursor(Err(err)), FULL_SYNC);
        assert_eq!(next_cursor(Ok("abc".into())), "abc");
    }

    #[test]
    fn cycle_writes_one_update_per_changed_task() {
        let api = MockApi::start();
        api.reply("*", account("r1", None));
        api.reply("r1", json!({"sync_token": "w1", "sync_status": {}}));

        let token = run_cycle(&api.client(), &rules(), FULL_SYNC, false, false).unwrap();
        assert_eq!(token, "w1");

        let requests = api.requests();
        assert_eq!(requests.len(), 2);
        let commands = requests[1]["commands"].as_array().unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0]["args"], json!({"id": "a", "labels": ["next"]}));
        assert_eq!(commands[1]["args"], json!({"id": "b", "labels": []}));
    }

    #[test]
    fn dry_run_reads_but_never_writes() {
        let api = MockApi::start();
        api.reply("*", account("r1", None));

        let token = run_cycle(&api.client(), &rules(), FULL_SYNC, true, true).unwrap();
        assert_eq!(token, "r1");
        assert_eq!(api.requests().len(), 1);
    }

    #[test]
    fn unchanged_account_keeps_the_cursor() {
        let api = MockApi::start();
        api.reply("t5", json!({"sync_token": "t6", "full_sync": false}));

        let token = run_cycle(&api.client(), &rules(), "t5", false, false).unwrap();
        assert_eq!(token, "t5");
    }

    #[test]
    fn malformed_hierarchy_fails_the_cycle() {
        let api = MockApi::start();
        api.reply("*", account("r1", Some("gone")));

        let err = run_cycle(&api.client(), &rules(), FULL_SYNC, false, false).unwrap_err();
        assert!(matches!(err, CycleError::Forest(ForestError::DanglingParent { .. })));
        assert_eq!(next_cursor(Err(err)), FULL_SYNC);
        assert_eq!(api.requests().len(), 1);
    }
}
