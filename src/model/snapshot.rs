use serde::{Deserialize, Serialize};

use super::label::Label;
use super::project::Project;
use super::section::Section;
use super::task::Task;

/// The resource types requested from the sync endpoint
pub const RESOURCE_TYPES: [&str; 4] = ["items", "labels", "projects", "sections"];

/// One response from the sync endpoint: the account's projects, sections,
/// tasks, and labels, plus the cursor for the next request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub sync_token: String,
    /// False when the response only carries changes since the previous cursor
    #[serde(default)]
    pub full_sync: bool,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub sections: Vec<Section>,
    /// Tasks. The wire name is `items`.
    #[serde(default)]
    pub items: Vec<Task>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl Snapshot {
    /// True when the response carries no resources at all
    pub fn is_unchanged(&self) -> bool {
        self.projects.is_empty()
            && self.sections.is_empty()
            && self.items.is_empty()
            && self.labels.is_empty()
    }

    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(|l| l.name.as_str())
    }
}
