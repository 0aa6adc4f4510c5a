//! Turns rule selections into label edits and sync commands.
//!
//! Rules are applied in order against each task's running label list, so when
//! two rules manage the same label the later one has the final say. Each
//! changed task yields a single `item_update` carrying its full label list.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;
use uuid::Uuid;

use crate::model::{Snapshot, Task};
use crate::ops::forest::Forest;
use crate::ops::rule::Rule;
use crate::ops::select::select;

/// Whether a label is being applied or removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Remove,
}

/// One label edit on one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change<'a> {
    pub kind: ChangeKind,
    pub label: String,
    pub task: &'a Task,
}

/// The sync command types this tool sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    LabelAdd,
    ItemUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommandArgs {
    LabelAdd { name: String },
    ItemUpdate { id: String, labels: Vec<String> },
}

/// A write command for the sync endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    #[serde(rename = "type")]
    pub kind: CommandKind,
    pub uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<Uuid>,
    pub args: CommandArgs,
}

impl Command {
    /// Create a personal label
    pub fn label_add(name: &str) -> Self {
        Command {
            kind: CommandKind::LabelAdd,
            uuid: Uuid::new_v4(),
            temp_id: Some(Uuid::new_v4()),
            args: CommandArgs::LabelAdd {
                name: name.to_string(),
            },
        }
    }

    /// Replace a task's labels
    pub fn item_update(id: &str, labels: Vec<String>) -> Self {
        Command {
            kind: CommandKind::ItemUpdate,
            uuid: Uuid::new_v4(),
            temp_id: None,
            args: CommandArgs::ItemUpdate {
                id: id.to_string(),
                labels,
            },
        }
    }
}

#[derive(Debug, Clone)]
struct TaskLabels<'a> {
    task: &'a Task,
    labels: Vec<String>,
}

/// Label edits for one sync cycle
#[derive(Debug, Default, Clone)]
pub struct LabelPlan<'a> {
    new_labels: Vec<String>,
    touched: IndexMap<&'a str, TaskLabels<'a>>,
    changes: Vec<Change<'a>>,
}

impl<'a> LabelPlan<'a> {
    /// Run every rule against the forest and collect the resulting edits.
    pub fn build(snapshot: &'a Snapshot, forest: &Forest<'a>, rules: &[Rule]) -> LabelPlan<'a> {
        let existing: HashSet<&str> = snapshot.label_names().collect();
        let mut plan = LabelPlan::default();

        for rule in rules {
            let selection = select(forest, &rule.suffix, rule.policy);
            let label = rule.label.as_str();

            let to_add: Vec<&'a Task> = selection
                .to_mark
                .into_iter()
                .filter(|t| !plan.has_label(t, label))
                .collect();
            if !to_add.is_empty()
                && !existing.contains(label)
                && !plan.new_labels.iter().any(|l| l == label)
            {
                plan.new_labels.push(label.to_string());
            }
            for task in to_add {
                plan.apply(task, label, ChangeKind::Add);
            }

            for task in selection.to_clear {
                if plan.has_label(task, label) {
                    plan.apply(task, label, ChangeKind::Remove);
                }
            }
            tracing::debug!(rule = %rule, "applied rule");
        }

        // A later rule may take back every add of a new label
        let touched = &plan.touched;
        plan.new_labels.retain(|label| {
            touched
                .values()
                .any(|entry| entry.labels != entry.task.labels && entry.labels.contains(label))
        });
        plan
    }

    fn has_label(&self, task: &Task, label: &str) -> bool {
        match self.touched.get(task.id.as_str()) {
            Some(entry) => entry.labels.iter().any(|l| l == label),
            None => task.has_label(label),
        }
    }

    fn apply(&mut self, task: &'a Task, label: &str, kind: ChangeKind) {
        let entry = self.touched.entry(task.id.as_str()).or_insert_with(|| TaskLabels {
            task,
            labels: task.labels.clone(),
        });
        match kind {
            ChangeKind::Add => entry.labels.push(label.to_string()),
            ChangeKind::Remove => entry.labels.retain(|l| l != label),
        }
        self.changes.push(Change {
            kind,
            label: label.to_string(),
            task,
        });
    }

    /// Labels that must be created before they can be applied
    pub fn new_labels(&self) -> &[String] {
        &self.new_labels
    }

    /// Every edit, in the order the rules produced them
    pub fn changes(&self) -> &[Change<'a>] {
        &self.changes
    }

    /// Tasks whose final label list differs from the fetched one, with that list
    pub fn updates(&self) -> impl Iterator<Item = (&'a Task, &[String])> + '_ {
        self.touched
            .values()
            .filter(|entry| entry.labels != entry.task.labels)
            .map(|entry| (entry.task, entry.labels.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.new_labels.is_empty() && self.updates().next().is_none()
    }

    /// Sync commands: label creations first, then one update per changed task.
    pub fn commands(&self) -> Vec<Command> {
        let mut commands: Vec<Command> = self.new_labels.iter().map(|l| Command::label_add(l)).collect();
        commands.extend(
            self.updates()
                .map(|(task, labels)| Command::item_update(&task.id, labels.to_vec())),
        );
        commands
    }
}
