use std::path::PathBuf;

use super::{NodeName, NodeOptions};

/// Protocol node reading a host file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub name: NodeName,
    pub filename: PathBuf,
    pub options: NodeOptions,
}

impl FileNode {
    pub fn new(name: impl Into<NodeName>, filename: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            options: NodeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: NodeOptions) -> Self {
        self.options = options;
        self
    }
}
