use serde::{Deserialize, Serialize};

/// A task (the sync API calls these `items`).
///
/// The structural parent is resolved in priority order: `parent_id` (another
/// task), then `section_id`, then `project_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    /// Task title text
    pub content: String,
    /// Position among sibling tasks
    pub child_order: i64,
    /// Parent task, if this is a subtask
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Owning project (always set, even for subtasks)
    pub project_id: String,
    /// Owning section, if any
    #[serde(default)]
    pub section_id: Option<String>,
    /// Label names currently applied (without the `@` prefix)
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Task {
    /// Create a top-level task directly under a project
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        child_order: i64,
        project_id: impl Into<String>,
    ) -> Self {
        Task {
            id: id.into(),
            content: content.into(),
            child_order,
            parent_id: None,
            project_id: project_id.into(),
            section_id: None,
            labels: Vec::new(),
        }
    }

    pub fn in_section(mut self, section_id: impl Into<String>) -> Self {
        self.section_id = Some(section_id.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}
