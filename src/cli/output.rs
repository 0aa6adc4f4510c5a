use serde::Serialize;

use crate::model::Snapshot;
use crate::ops::plan::{ChangeKind, LabelPlan};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct PlanJson<'a> {
    pub new_labels: &'a [String],
    pub changes: Vec<ChangeJson<'a>>,
    pub updates: Vec<UpdateJson<'a>>,
}

#[derive(Serialize)]
pub struct ChangeJson<'a> {
    pub action: ChangeKind,
    pub label: &'a str,
    pub task_id: &'a str,
    pub content: &'a str,
}

#[derive(Serialize)]
pub struct UpdateJson<'a> {
    pub task_id: &'a str,
    pub labels: &'a [String],
}

#[derive(Serialize)]
pub struct DumpJson<'a> {
    pub path: &'a str,
    pub projects: usize,
    pub sections: usize,
    pub tasks: usize,
    pub labels: usize,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn plan_to_json<'a>(plan: &'a LabelPlan<'a>) -> PlanJson<'a> {
    PlanJson {
        new_labels: plan.new_labels(),
        changes: plan
            .changes()
            .iter()
            .map(|c| ChangeJson {
                action: c.kind,
                label: &c.label,
                task_id: &c.task.id,
                content: &c.task.content,
            })
            .collect(),
        updates: plan
            .updates()
            .map(|(task, labels)| UpdateJson {
                task_id: &task.id,
                labels,
            })
            .collect(),
    }
}

pub fn dump_to_json<'a>(path: &'a str, snapshot: &Snapshot) -> DumpJson<'a> {
    DumpJson {
        path,
        projects: snapshot.projects.len(),
        sections: snapshot.sections.len(),
        tasks: snapshot.items.len(),
        labels: snapshot.labels.len(),
    }
}

// ---------------------------------------------------------------------------
// Text output
// ---------------------------------------------------------------------------

/// One line per label creation and per label edit
pub fn format_plan(plan: &LabelPlan<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    for label in plan.new_labels() {
        lines.push(format!("creating new label '{}'", label));
    }
    for change in plan.changes() {
        lines.push(match change.kind {
            ChangeKind::Add => format!("adding label '{}' to '{}'", change.label, change.task.content),
            ChangeKind::Remove => {
                format!("removing label '{}' from '{}'", change.label, change.task.content)
            }
        });
    }
    if lines.is_empty() {
        lines.push("no label changes".to_string());
    }
    lines
}

pub fn format_dump(path: &str, snapshot: &Snapshot) -> String {
    format!(
        "saved {} projects, {} sections, {} tasks, {} labels to {}",
        snapshot.projects.len(),
        snapshot.sections.len(),
        snapshot.items.len(),
        snapshot.labels.len(),
        path
    )
}
