use serde::{Deserialize, Serialize};

/// A Todoist project. Projects nest under other projects and are the roots
/// of the item forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Position among sibling projects
    pub child_order: i64,
    /// Enclosing project, if this is a subproject
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>, child_order: i64) -> Self {
        Project {
            id: id.into(),
            name: name.into(),
            child_order,
            parent_id: None,
        }
    }

    /// Builder-style setter for the parent project
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}
