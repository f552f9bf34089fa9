//! Configuration for the reconciliation engine.

/// Options controlling how a snapshot is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Regenerate the layout of dimensions before reading their bounds.
    pub regenerate_dimensions: bool,
    /// Add inserted entities to the groups that listed their prior ids.
    pub link_groups: bool,
}

impl ReconcileOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self {
            regenerate_dimensions: true,
            link_groups: true,
        }
    }

    /// Sets whether dimension layouts are regenerated before reading
    /// bounds.
    pub fn with_regenerate_dimensions(mut self, enabled: bool) -> Self {
        self.regenerate_dimensions = enabled;
        self
    }

    /// Sets whether the group linking pass runs.
    pub fn with_link_groups(mut self, enabled: bool) -> Self {
        self.link_groups = enabled;
        self
    }
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self::new()
    }
}
