//! Rebuilds the project/section/task hierarchy from the flat lists returned by
//! the sync API.
//!
//! Nodes live in an arena and refer to their children by index. Construction
//! goes through a private [`ForestBuilder`], which is the only place children
//! can be appended; [`ForestBuilder::seal`] sorts every child list once and
//! hands back an immutable [`Forest`]. Projects are the roots; there is no
//! single root node.
//!
//! Subprojects and subtasks may arrive before their parents and nest to any
//! depth, so their parent links are resolved with a FIFO worklist that runs
//! until a pass makes no progress.

use std::collections::{HashMap, VecDeque};

use crate::model::{Item, ItemKind, Project, Section, Task};

/// Index of a node in the forest arena
pub type NodeIndex = usize;

/// Error type for forest construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForestError {
    #[error("{kind} {id} has parent {parent_id}, which is not in the batch")]
    DanglingParent {
        kind: ItemKind,
        id: String,
        parent_id: String,
    },
    #[error("{kind} {id} is part of a parent cycle")]
    ParentCycle { kind: ItemKind, id: String },
    #[error("{kind} {id} belongs to {owner_kind} {owner_id}, which is not in the batch")]
    MissingOwner {
        kind: ItemKind,
        id: String,
        owner_kind: ItemKind,
        owner_id: String,
    },
}

#[derive(Debug)]
struct Node<'a> {
    item: Item<'a>,
    children: Vec<NodeIndex>,
}

/// Per-kind id lookup. Parent references only ever point at one kind, so the
/// three id spaces are kept apart.
#[derive(Debug, Default)]
struct KindIndex<'a> {
    projects: HashMap<&'a str, NodeIndex>,
    sections: HashMap<&'a str, NodeIndex>,
    tasks: HashMap<&'a str, NodeIndex>,
}

impl<'a> KindIndex<'a> {
    fn of(&self, kind: ItemKind) -> &HashMap<&'a str, NodeIndex> {
        match kind {
            ItemKind::Project => &self.projects,
            ItemKind::Section => &self.sections,
            ItemKind::Task => &self.tasks,
        }
    }

    fn of_mut(&mut self, kind: ItemKind) -> &mut HashMap<&'a str, NodeIndex> {
        match kind {
            ItemKind::Project => &mut self.projects,
            ItemKind::Section => &mut self.sections,
            ItemKind::Task => &mut self.tasks,
        }
    }
}

// ---------------------------------------------------------------------------
// Builder phase
// ---------------------------------------------------------------------------

/// Forest under construction. Children may be appended until [`seal`](Self::seal).
struct ForestBuilder<'a> {
    nodes: Vec<Node<'a>>,
    index: KindIndex<'a>,
    roots: Vec<NodeIndex>,
}

impl<'a> ForestBuilder<'a> {
    fn with_capacity(capacity: usize) -> Self {
        ForestBuilder {
            nodes: Vec::with_capacity(capacity),
            index: KindIndex::default(),
            roots: Vec::new(),
        }
    }

    /// Add an unattached node. Returns `None` if an item of the same kind and
    /// id was already added; the first one wins.
    fn push(&mut self, item: Item<'a>) -> Option<NodeIndex> {
        let ids = self.index.of_mut(item.kind());
        if ids.contains_key(item.id()) {
            tracing::debug!(kind = %item.kind(), id = item.id(), "skipping duplicate item");
            return None;
        }
        let ix = self.nodes.len();
        ids.insert(item.id(), ix);
        self.nodes.push(Node {
            item,
            children: Vec::new(),
        });
        Some(ix)
    }

    fn add_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        self.nodes[parent].children.push(child);
    }

    fn lookup(&self, kind: ItemKind, id: &str) -> Option<NodeIndex> {
        self.index.of(kind).get(id).copied()
    }

    /// Attach `child` under the `owner_kind` item `owner_id`, which must exist.
    fn attach_to_owner(
        &mut self,
        child: NodeIndex,
        owner_kind: ItemKind,
        owner_id: &str,
    ) -> Result<(), ForestError> {
        match self.lookup(owner_kind, owner_id) {
            Some(owner) => {
                self.add_child(owner, child);
                Ok(())
            }
            None => {
                let item = self.nodes[child].item;
                Err(ForestError::MissingOwner {
                    kind: item.kind(),
                    id: item.id().to_string(),
                    owner_kind,
                    owner_id: owner_id.to_string(),
                })
            }
        }
    }

    /// Attach same-kind children (subprojects or subtasks) to their parents.
    ///
    /// A node is attached once its parent is resolved, i.e. is itself a root
    /// of this kind or already attached. Unresolved nodes go to the back of
    /// the queue. A full pass without progress means some parent will never
    /// appear.
    fn attach_nested(
        &mut self,
        kind: ItemKind,
        mut pending: VecDeque<(NodeIndex, &'a str)>,
    ) -> Result<(), ForestError> {
        let mut resolved = vec![false; self.nodes.len()];
        for &ix in self.index.of(kind).values() {
            resolved[ix] = true;
        }
        for &(ix, _) in &pending {
            resolved[ix] = false;
        }

        while let Some(&(first, _)) = pending.front() {
            let mut progressed = false;
            for _ in 0..pending.len() {
                let Some((child, parent_id)) = pending.pop_front() else {
                    break;
                };
                match self.lookup(kind, parent_id) {
                    Some(parent) if resolved[parent] => {
                        self.add_child(parent, child);
                        resolved[child] = true;
                        progressed = true;
                    }
                    _ => pending.push_back((child, parent_id)),
                }
            }
            if !progressed {
                return Err(self.unresolved_error(kind, first, &pending));
            }
        }
        Ok(())
    }

    /// Explain why the remaining queue can't be attached: prefer naming a
    /// parent that is missing outright over reporting a cycle through `first`.
    fn unresolved_error(
        &self,
        kind: ItemKind,
        first: NodeIndex,
        pending: &VecDeque<(NodeIndex, &str)>,
    ) -> ForestError {
        let missing = pending
            .iter()
            .find(|(_, parent_id)| self.lookup(kind, parent_id).is_none());
        match missing {
            Some(&(child, parent_id)) => ForestError::DanglingParent {
                kind,
                id: self.nodes[child].item.id().to_string(),
                parent_id: parent_id.to_string(),
            },
            None => ForestError::ParentCycle {
                kind,
                id: self.nodes[first].item.id().to_string(),
            },
        }
    }

    /// Sort every child list by `(kind rank, sibling order)` and freeze.
    fn seal(mut self) -> Forest<'a> {
        for ix in 0..self.nodes.len() {
            let mut children = std::mem::take(&mut self.nodes[ix].children);
            children.sort_by_key(|&c| sort_key(&self.nodes[c].item));
            self.nodes[ix].children = children;
        }
        let mut roots = std::mem::take(&mut self.roots);
        roots.sort_by_key(|&r| sort_key(&self.nodes[r].item));

        Forest {
            nodes: self.nodes,
            index: self.index,
            roots,
        }
    }
}

/// Stable sort key; ties keep insertion order
fn sort_key(item: &Item<'_>) -> (u8, i64) {
    (item.kind().sort_rank(), item.order())
}

// ---------------------------------------------------------------------------
// Sealed forest
// ---------------------------------------------------------------------------

/// The project/section/task hierarchy for one sync cycle.
///
/// Borrows the records it was built from and is discarded after the
/// selection pass.
#[derive(Debug)]
pub struct Forest<'a> {
    nodes: Vec<Node<'a>>,
    index: KindIndex<'a>,
    roots: Vec<NodeIndex>,
}

impl<'a> Forest<'a> {
    /// Build the forest from the three flat lists, in any order.
    pub fn build(
        projects: &'a [Project],
        sections: &'a [Section],
        tasks: &'a [Task],
    ) -> Result<Forest<'a>, ForestError> {
        let mut builder = ForestBuilder::with_capacity(projects.len() + sections.len() + tasks.len());

        let mut pending = VecDeque::new();
        for project in projects {
            let Some(ix) = builder.push(Item::Project(project)) else {
                continue;
            };
            match project.parent_id.as_deref() {
                Some(parent_id) => pending.push_back((ix, parent_id)),
                None => builder.roots.push(ix),
            }
        }
        builder.attach_nested(ItemKind::Project, pending)?;

        for section in sections {
            let item = Item::Section(section);
            if let Some(ix) = builder.push(item)
                && let Some((owner_kind, owner_id)) = item.parent()
            {
                builder.attach_to_owner(ix, owner_kind, owner_id)?;
            }
        }

        // Subtasks wait for their parent task; the rest hang off a section or
        // project once all subtasks are placed.
        let mut pending = VecDeque::new();
        let mut top_level = Vec::new();
        for task in tasks {
            let item = Item::Task(task);
            let Some(ix) = builder.push(item) else {
                continue;
            };
            match item.parent() {
                Some((ItemKind::Task, parent_id)) => pending.push_back((ix, parent_id)),
                Some((owner_kind, owner_id)) => top_level.push((ix, owner_kind, owner_id)),
                None => {}
            }
        }
        builder.attach_nested(ItemKind::Task, pending)?;

        for (ix, owner_kind, owner_id) in top_level {
            builder.attach_to_owner(ix, owner_kind, owner_id)?;
        }

        let forest = builder.seal();
        tracing::debug!(nodes = forest.len(), roots = forest.roots.len(), "built forest");
        Ok(forest)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by id. Tasks shadow sections, which shadow projects,
    /// should ids collide across kinds.
    pub fn get(&self, id: &str) -> Option<NodeRef<'_, 'a>> {
        [ItemKind::Task, ItemKind::Section, ItemKind::Project]
            .into_iter()
            .find_map(|kind| self.get_kind(kind, id))
    }

    pub fn get_kind(&self, kind: ItemKind, id: &str) -> Option<NodeRef<'_, 'a>> {
        self.index.of(kind).get(id).map(|&index| self.node(index))
    }

    /// Top-level projects, sorted by sibling order
    pub fn roots(&self) -> impl Iterator<Item = NodeRef<'_, 'a>> {
        self.roots.iter().map(|&index| self.node(index))
    }

    /// Every node in input order: projects, then sections, then tasks.
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef<'_, 'a>> {
        (0..self.nodes.len()).map(|index| self.node(index))
    }

    /// Every task in input order, duplicates removed
    pub fn tasks(&self) -> impl Iterator<Item = &'a Task> + '_ {
        self.nodes.iter().filter_map(|n| n.item.as_task())
    }

    fn node(&self, index: NodeIndex) -> NodeRef<'_, 'a> {
        NodeRef {
            forest: self,
            index,
        }
    }
}

/// A handle to one node of a sealed [`Forest`]
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'f, 'a> {
    forest: &'f Forest<'a>,
    index: NodeIndex,
}

impl<'f, 'a> NodeRef<'f, 'a> {
    pub fn item(&self) -> Item<'a> {
        self.forest.nodes[self.index].item
    }

    pub fn is_childless(&self) -> bool {
        self.forest.nodes[self.index].children.is_empty()
    }

    /// Children in traversal order
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'f, 'a>> + use<'f, 'a> {
        let forest = self.forest;
        forest.nodes[self.index]
            .children
            .iter()
            .map(move |&index| NodeRef { forest, index })
    }

    /// This node and everything beneath it, post-order
    fn descendants(&self) -> impl Iterator<Item = NodeRef<'f, 'a>> + use<'f, 'a> {
        let forest = self.forest;
        PostOrder::new(forest, self.index).map(move |index| NodeRef { forest, index })
    }

    /// Every task at or beneath this node, post-order
    pub fn tasks(&self) -> impl Iterator<Item = &'a Task> + use<'f, 'a> {
        self.descendants().filter_map(|node| node.item().as_task())
    }

    /// Every task at or beneath this node that has no subtasks, post-order
    pub fn childless_tasks(&self) -> impl Iterator<Item = &'a Task> + use<'f, 'a> {
        self.descendants()
            .filter(NodeRef::is_childless)
            .filter_map(|node| node.item().as_task())
    }
}

/// Post-order walk with an explicit stack, so deep nesting can't overflow.
/// Each stack entry is a node and the position of its next unvisited child.
struct PostOrder<'f, 'a> {
    forest: &'f Forest<'a>,
    stack: Vec<(NodeIndex, usize)>,
}

impl<'f, 'a> PostOrder<'f, 'a> {
    fn new(forest: &'f Forest<'a>, start: NodeIndex) -> Self {
        PostOrder {
            forest,
            stack: vec![(start, 0)],
        }
    }
}

impl Iterator for PostOrder<'_, '_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        let forest = self.forest;
        loop {
            let (node, cursor) = *self.stack.last()?;
            let children = &forest.nodes[node].children;
            if let Some(&child) = children.get(cursor) {
                if let Some(top) = self.stack.last_mut() {
                    top.1 += 1;
                }
                self.stack.push((child, 0));
            } else {
                self.stack.pop();
                return Some(node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids<'a>(tasks: impl Iterator<Item = &'a Task>) -> Vec<&'a str> {
        tasks.map(|t| t.id.as_str()).collect()
    }

    fn child_ids<'a>(node: NodeRef<'_, 'a>) -> Vec<&'a str> {
        node.children().map(|c| c.item().id()).collect()
    }

    #[test]
    fn builds_project_section_task_hierarchy() {
        let projects = vec![Project::new("p", "Home", 0)];
        let sections = vec![Section::new("s", "Garden", 0, "p")];
        let tasks = vec![
            Task::new("t1", "Mow", 0, "p").in_section("s"),
            Task::new("t2", "Water", 1, "p"),
        ];
        let forest = Forest::build(&projects, &sections, &tasks).unwrap();

        assert_eq!(forest.len(), 4);
        let p = forest.get("p").unwrap();
        assert_eq!(child_ids(p), vec!["t2", "s"]);
        assert_eq!(child_ids(forest.get("s").unwrap()), vec!["t1"]);
        assert_eq!(forest.roots().count(), 1);
    }

    #[test]
    fn children_sorted_by_kind_then_order() {
        let projects = vec![
            Project::new("p", "Work", 0),
            Project::new("sub", "Sub", 0).with_parent("p"),
        ];
        let sections = vec![
            Section::new("s2", "Later", 2, "p"),
            Section::new("s1", "Soon", 1, "p"),
        ];
        let tasks = vec![
            Task::new("b", "B", 5, "p"),
            Task::new("a", "A", 1, "p"),
        ];
        let forest = Forest::build(&projects, &sections, &tasks).unwrap();
        assert_eq!(child_ids(forest.get("p").unwrap()), vec!["a", "b", "s1", "s2", "sub"]);
    }

    #[test]
    fn equal_order_keeps_input_order() {
        let projects = vec![Project::new("p", "Work", 0)];
        let tasks = vec![
            Task::new("x", "X", 0, "p"),
            Task::new("y", "Y", 0, "p"),
        ];
        let forest = Forest::build(&projects, &[], &tasks).unwrap();
        assert_eq!(child_ids(forest.get("p").unwrap()), vec!["x", "y"]);
    }

    #[test]
    fn resolves_children_listed_before_parents() {
        let projects = vec![
            Project::new("c", "Grandchild", 0).with_parent("b"),
            Project::new("b", "Child", 0).with_parent("a"),
            Project::new("a", "Root", 0),
        ];
        let tasks = vec![
            Task::new("t3", "Deepest", 0, "c").with_parent("t2"),
            Task::new("t2", "Middle", 0, "c").with_parent("t1"),
            Task::new("t1", "Top", 0, "c"),
        ];
        let forest = Forest::build(&projects, &[], &tasks).unwrap();

        assert_eq!(child_ids(forest.get("a").unwrap()), vec!["b"]);
        assert_eq!(child_ids(forest.get("b").unwrap()), vec!["c"]);
        assert_eq!(child_ids(forest.get("c").unwrap()), vec!["t1"]);
        assert_eq!(child_ids(forest.get("t2").unwrap()), vec!["t3"]);
        assert_eq!(ids(forest.get("a").unwrap().tasks()), vec!["t3", "t2", "t1"]);
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let projects = vec![Project::new("p", "Deep", 0)];
        let mut tasks = vec![Task::new("t0", "0", 0, "p")];
        for i in 1..100_000 {
            tasks.push(
                Task::new(format!("t{}", i), i.to_string(), 0, "p").with_parent(format!("t{}", i - 1)),
            );
        }
        let forest = Forest::build(&projects, &[], &tasks).unwrap();
        let leaves = ids(forest.get("p").unwrap().childless_tasks());
        assert_eq!(leaves, vec!["t99999"]);
        assert_eq!(forest.get("p").unwrap().tasks().count(), 100_000);
    }

    #[test]
    fn dangling_task_parent_fails() {
        let projects = vec![Project::new("p", "Home", 0)];
        let tasks = vec![
            Task::new("t1", "Fine", 0, "p"),
            Task::new("t2", "Orphan", 0, "p").with_parent("ghost"),
        ];
        let err = Forest::build(&projects, &[], &tasks).unwrap_err();
        assert_eq!(
            err,
            ForestError::DanglingParent {
                kind: ItemKind::Task,
                id: "t2".into(),
                parent_id: "ghost".into(),
            }
        );
    }

    #[test]
    fn dangling_parent_reported_even_behind_descendants() {
        let projects = vec![Project::new("p", "Home", 0)];
        let tasks = vec![
            Task::new("child", "Child", 0, "p").with_parent("orphan"),
            Task::new("orphan", "Orphan", 0, "p").with_parent("ghost"),
        ];
        let err = Forest::build(&projects, &[], &tasks).unwrap_err();
        assert!(matches!(err, ForestError::DanglingParent { ref id, .. } if id == "orphan"));
    }

    #[test]
    fn dangling_project_parent_fails() {
        let projects = vec![Project::new("sub", "Sub", 0).with_parent("gone")];
        let err = Forest::build(&projects, &[], &[]).unwrap_err();
        assert!(matches!(
            err,
            ForestError::DanglingParent { kind: ItemKind::Project, .. }
        ));
    }

    #[test]
    fn parent_cycle_fails() {
        let projects = vec![Project::new("p", "Home", 0)];
        let tasks = vec![
            Task::new("a", "A", 0, "p").with_parent("b"),
            Task::new("b", "B", 0, "p").with_parent("a"),
        ];
        let err = Forest::build(&projects, &[], &tasks).unwrap_err();
        assert_eq!(
            err,
            ForestError::ParentCycle {
                kind: ItemKind::Task,
                id: "a".into(),
            }
        );
    }

    #[test]
    fn cycle_error_names_a_stuck_item() {
        let projects = vec![
            Project::new("root", "Root", 0),
            Project::new("x", "X", 0).with_parent("y"),
            Project::new("ok", "Ok", 1).with_parent("root"),
            Project::new("y", "Y", 1).with_parent("x"),
        ];
        let err = Forest::build(&projects, &[], &[]).unwrap_err();
        assert_eq!(
            err,
            ForestError::ParentCycle {
                kind: ItemKind::Project,
                id: "x".into(),
            }
        );
    }

    #[test]
    fn section_without_project_fails() {
        let sections = vec![Section::new("s", "Lost", 0, "nowhere")];
        let err = Forest::build(&[], &sections, &[]).unwrap_err();
        assert_eq!(
            err,
            ForestError::MissingOwner {
                kind: ItemKind::Section,
                id: "s".into(),
                owner_kind: ItemKind::Project,
                owner_id: "nowhere".into(),
            }
        );
    }

    #[test]
    fn task_with_missing_section_fails() {
        let projects = vec![Project::new("p", "Home", 0)];
        let tasks = vec![Task::new("t", "T", 0, "p").in_section("gone")];
        let err = Forest::build(&projects, &[], &tasks).unwrap_err();
        assert!(matches!(
            err,
            ForestError::MissingOwner { owner_kind: ItemKind::Section, .. }
        ));
    }

    #[test]
    fn subtask_ignores_section_and_project() {
        let projects = vec![Project::new("p", "Home", 0)];
        let sections = vec![Section::new("s", "S", 0, "p")];
        let tasks = vec![
            Task::new("parent", "Parent", 0, "p").in_section("s"),
            Task::new("child", "Child", 0, "p").in_section("s").with_parent("parent"),
        ];
        let forest = Forest::build(&projects, &sections, &tasks).unwrap();
        assert_eq!(child_ids(forest.get("s").unwrap()), vec!["parent"]);
        assert_eq!(child_ids(forest.get("parent").unwrap()), vec!["child"]);
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let projects = vec![Project::new("p", "Home", 0)];
        let tasks = vec![
            Task::new("t", "First", 0, "p"),
            Task::new("t", "Second", 1, "p"),
        ];
        let forest = Forest::build(&projects, &[], &tasks).unwrap();
        assert_eq!(forest.tasks().count(), 1);
        assert_eq!(forest.get("t").unwrap().item().display_text(), "First");
    }

    #[test]
    fn childless_tasks_skip_parents_and_non_tasks() {
        let projects = vec![Project::new("p", "Home", 0)];
        let sections = vec![Section::new("empty", "Empty", 0, "p")];
        let tasks = vec![
            Task::new("d", "D", 0, "p"),
            Task::new("e", "E", 0, "p").with_parent("d"),
        ];
        let forest = Forest::build(&projects, &sections, &tasks).unwrap();
        let p = forest.get("p").unwrap();
        assert!(!p.is_childless());
        assert!(forest.get("e").unwrap().is_childless());
        assert_eq!(ids(p.childless_tasks()), vec!["e"]);
        assert_eq!(ids(p.tasks()), vec!["e", "d"]);
        assert!(forest.get("empty").unwrap().childless_tasks().next().is_none());
    }

    #[test]
    fn empty_input_builds_empty_forest() {
        let forest = Forest::build(&[], &[], &[]).unwrap();
        assert!(forest.is_empty());
        assert!(forest.get("anything").is_none());
    }
}
