use indexmap::IndexMap;

use crate::model::{Item, Policy, Task};
use crate::ops::forest::{Forest, NodeRef};

/// Result of one selection pass: every task lands in exactly one list.
#[derive(Debug, Default, Clone)]
pub struct Selection<'a> {
    /// Selected tasks, in the order they were first reached
    pub to_mark: Vec<&'a Task>,
    /// Every other task, in input order
    pub to_clear: Vec<&'a Task>,
}

/// Whether an item's text (trailing whitespace ignored) ends with `suffix`.
/// Matching is case-sensitive and byte-exact.
pub fn is_marker(item: &Item<'_>, suffix: &str) -> bool {
    item.display_text().trim_end().ends_with(suffix)
}

/// Marked projects, sections, and tasks, in that order
pub fn markers<'f, 'a>(
    forest: &'f Forest<'a>,
    suffix: &'f str,
) -> impl Iterator<Item = NodeRef<'f, 'a>> {
    forest.nodes().filter(move |node| is_marker(&node.item(), suffix))
}

/// Pick tasks at or beneath every marked item according to `policy`.
///
/// A task reached from several markers is selected once. A marker with
/// nothing to select contributes nothing.
pub fn select<'a>(forest: &Forest<'a>, suffix: &str, policy: Policy) -> Selection<'a> {
    let mut selected: IndexMap<&'a str, &'a Task> = IndexMap::new();
    let mut add = |task: &'a Task| {
        selected.entry(task.id.as_str()).or_insert(task);
    };

    for marker in markers(forest, suffix) {
        let item = marker.item();
        tracing::debug!(kind = %item.kind(), id = item.id(), %policy, "marker");
        match policy {
            Policy::Serial => {
                if let Some(task) = marker.childless_tasks().next() {
                    add(task);
                }
            }
            Policy::Parallel => marker.childless_tasks().for_each(&mut add),
            Policy::All => marker.tasks().for_each(&mut add),
        }
    }

    let to_clear = forest
        .tasks()
        .filter(|t| !selected.contains_key(t.id.as_str()))
        .collect();

    Selection {
        to_mark: selected.into_values().collect(),
        to_clear,
    }
}
