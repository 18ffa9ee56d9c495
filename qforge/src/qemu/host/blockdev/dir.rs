use std::path::PathBuf;

use super::NodeName;

/// Protocol node presenting a host directory as a FAT image (`vvfat`).
///
/// Read-only unless cleared; QEMU's read-write vvfat support is fragile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirNode {
    pub name: NodeName,
    pub dir: PathBuf,
    pub label: Option<String>,
    pub read_only: bool,
}

impl DirNode {
    pub fn new(name: impl Into<NodeName>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            label: None,
            read_only: true,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
