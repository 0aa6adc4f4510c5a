use std::fmt;

use serde::Serialize;

use super::project::Project;
use super::section::Section;
use super::task::Task;

/// The kind of an item in the forest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Project,
    Section,
    Task,
}

impl ItemKind {
    /// Rank used when ordering the children of a node: a project's own tasks
    /// come first, then its sections, then its subprojects.
    pub fn sort_rank(self) -> u8 {
        match self {
            ItemKind::Task => 0,
            ItemKind::Section => 1,
            ItemKind::Project => 2,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Project => write!(f, "project"),
            ItemKind::Section => write!(f, "section"),
            ItemKind::Task => write!(f, "task"),
        }
    }
}

/// A borrowed project, section, or task
#[derive(Debug, Clone, Copy)]
pub enum Item<'a> {
    Project(&'a Project),
    Section(&'a Section),
    Task(&'a Task),
}

impl<'a> Item<'a> {
    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Project(_) => ItemKind::Project,
            Item::Section(_) => ItemKind::Section,
            Item::Task(_) => ItemKind::Task,
        }
    }

    pub fn id(&self) -> &'a str {
        match self {
            Item::Project(p) => &p.id,
            Item::Section(s) => &s.id,
            Item::Task(t) => &t.id,
        }
    }

    /// Structural parent id and its kind. A subtask's parent is its task,
    /// then its section, then its project; a top-level project has none.
    pub fn parent(&self) -> Option<(ItemKind, &'a str)> {
        match self {
            Item::Project(p) => p.parent_id.as_deref().map(|id| (ItemKind::Project, id)),
            Item::Section(s) => Some((ItemKind::Project, s.project_id.as_str())),
            Item::Task(t) => Some(match (&t.parent_id, &t.section_id) {
                (Some(id), _) => (ItemKind::Task, id.as_str()),
                (None, Some(id)) => (ItemKind::Section, id.as_str()),
                (None, None) => (ItemKind::Project, t.project_id.as_str()),
            }),
        }
    }

    pub fn parent_id(&self) -> Option<&'a str> {
        self.parent().map(|(_, id)| id)
    }

    /// Sibling order (`child_order` or `section_order`)
    pub fn order(&self) -> i64 {
        match self {
            Item::Project(p) => p.child_order,
            Item::Section(s) => s.section_order,
            Item::Task(t) => t.child_order,
        }
    }

    /// The text a marker suffix is matched against
    pub fn display_text(&self) -> &'a str {
        match self {
            Item::Project(p) => &p.name,
            Item::Section(s) => &s.name,
            Item::Task(t) => &t.content,
        }
    }

    pub fn as_task(&self) -> Option<&'a Task> {
        match self {
            Item::Task(t) => Some(t),
            _ => None,
        }
    }
}

impl<'a> From<&'a Project> for Item<'a> {
    fn from(p: &'a Project) -> Self {
        Item::Project(p)
    }
}

impl<'a> From<&'a Section> for Item<'a> {
    fn from(s: &'a Section) -> Self {
        Item::Section(s)
    }
}

impl<'a> From<&'a Task> for Item<'a> {
    fn from(t: &'a Task) -> Self {
        Item::Task(t)
    }
}
