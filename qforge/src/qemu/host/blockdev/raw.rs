use super::{NodeName, NodeOptions};

/// Format node exposing its upstream node's bytes unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNode {
    pub name: NodeName,
    /// Upstream protocol node.
    pub file: NodeName,
    pub options: NodeOptions,
}

impl RawNode {
    pub fn new(name: impl Into<NodeName>, file: impl Into<NodeName>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            options: NodeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: NodeOptions) -> Self {
        self.options = options;
        self
    }
}
