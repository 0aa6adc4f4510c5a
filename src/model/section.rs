use serde::{Deserialize, Serialize};

/// A section inside a project. Sections never nest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub name: String,
    /// Position among the sections of the owning project
    pub section_order: i64,
    /// Owning project (always set)
    pub project_id: String,
}

impl Section {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        section_order: i64,
        project_id: impl Into<String>,
    ) -> Self {
        Section {
            id: id.into(),
            name: name.into(),
            section_order,
            project_id: project_id.into(),
        }
    }
}
