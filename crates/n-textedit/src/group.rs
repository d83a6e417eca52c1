//! Named groups of edits, e.g. all edits produced by one refactoring step.

use n_text::Region;

use crate::edit::{EditId, EditTree};

/// A label plus the edits it stands for. The edits may live anywhere in the
/// tree; the group only references them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditGroup {
    name: String,
    edits: Vec<EditId>,
}

impl EditGroup {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            edits: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add(&mut self, edit: EditId) {
        self.edits.push(edit);
    }

    #[must_use]
    pub fn edits(&self) -> &[EditId] {
        &self.edits
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Region covering the group's live edits, or `None` if every edit was
    /// deleted. After an `apply` with region updating this is where the
    /// group's changes ended up.
    #[must_use]
    pub fn region(&self, tree: &EditTree) -> Option<Region> {
        tree.coverage(&self.edits)
    }
}
