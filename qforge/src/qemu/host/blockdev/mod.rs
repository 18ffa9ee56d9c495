//! Block-layer node graph.
//!
//! Mirrors QEMU's `-blockdev` model: protocol nodes access host storage and
//! format nodes interpret the bytes of an upstream node.
//!
//! ```text
//! {machine}-os-file (file) ──▶ {machine}-os (raw) ──▶ scsi-hd drive=
//! ```
//!
//! A node may only reference nodes already in the graph, which keeps the
//! graph acyclic.

mod dir;
mod file;
mod raw;

use qforge_shared::errors::{QforgeError, QforgeResult};

use super::registry::{Named, Registry};
use crate::qemu::option::{Options, Parameters};

pub use dir::DirNode;
pub use file::FileNode;
pub use raw::RawNode;

pub type NodeName = String;

/// Name of a child node, `{parent}-{sub}`.
pub fn child_name(parent: &str, sub: &str) -> NodeName {
    format!("{parent}-{sub}")
}

/// Zero-write detection mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetectZeroes {
    #[default]
    Off,
    On,
    /// Turn zero writes into discards; requires `discard=unmap`.
    Unmap,
}

/// Flags shared by every node driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeOptions {
    pub read_only: bool,
    /// Bypass the host page cache.
    pub cache_direct: bool,
    /// Ignore guest flush requests.
    pub cache_no_flush: bool,
    /// Pass guest discards down as unmaps.
    pub discard: bool,
    pub detect_zeroes: DetectZeroes,
}

impl NodeOptions {
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Default::default()
        }
    }

    fn apply(&self, params: &mut Parameters) {
        params
            .add_on("read-only", self.read_only)
            .add_on("cache.direct", self.cache_direct)
            .add_on("cache.no-flush", self.cache_no_flush);
        if self.discard {
            params.add("discard", "unmap");
        }
        match self.detect_zeroes {
            DetectZeroes::Off => {}
            DetectZeroes::On => {
                params.add("detect-zeroes", "on");
            }
            DetectZeroes::Unmap => {
                params.add("detect-zeroes", "unmap");
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockNode {
    File(FileNode),
    Dir(DirNode),
    Raw(RawNode),
}

impl BlockNode {
    pub fn driver(&self) -> &'static str {
        match self {
            BlockNode::File(_) => "file",
            BlockNode::Dir(_) => "vvfat",
            BlockNode::Raw(_) => "raw",
        }
    }

    /// Node this one reads from, if it is a format node.
    pub fn upstream(&self) -> Option<&str> {
        match self {
            BlockNode::Raw(node) => Some(&node.file),
            BlockNode::File(_) | BlockNode::Dir(_) => None,
        }
    }

    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params.add("driver", self.driver()).add("node-name", self.name());
        match self {
            BlockNode::File(node) => {
                node.options.apply(&mut params);
                params.add("filename", node.filename.display());
            }
            BlockNode::Dir(node) => {
                params.add_on("read-only", node.read_only);
                params.add_opt("label", node.label.as_deref());
                params.add("dir", node.dir.display());
            }
            BlockNode::Raw(node) => {
                node.options.apply(&mut params);
                params.add("file", &node.file);
            }
        }
        params
    }
}

impl Named for BlockNode {
    fn name(&self) -> &str {
        match self {
            BlockNode::File(node) => &node.name,
            BlockNode::Dir(node) => &node.name,
            BlockNode::Raw(node) => &node.name,
        }
    }
}

impl From<FileNode> for BlockNode {
    fn from(node: FileNode) -> Self {
        BlockNode::File(node)
    }
}

impl From<DirNode> for BlockNode {
    fn from(node: DirNode) -> Self {
        BlockNode::Dir(node)
    }
}

impl From<RawNode> for BlockNode {
    fn from(node: RawNode) -> Self {
        BlockNode::Raw(node)
    }
}

/// The `-blockdev` nodes of one machine.
#[derive(Debug, Clone)]
pub struct BlockGraph {
    nodes: Registry<BlockNode>,
}

impl Default for BlockGraph {
    fn default() -> Self {
        Self {
            nodes: Registry::new("block device graph"),
        }
    }
}

impl BlockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its name.
    ///
    /// Fails with a duplicate-name error on collision, or a configuration
    /// error when a format node names an upstream node not in the graph.
    pub fn add(&mut self, node: impl Into<BlockNode>) -> QforgeResult<NodeName> {
        let node = node.into();
        if let Some(upstream) = node.upstream() {
            if !self.nodes.contains(upstream) {
                return Err(QforgeError::UnresolvedReference {
                    kind: "block node",
                    referencer: format!("block node {}", node.name()),
                    reference: upstream.to_string(),
                });
            }
        }
        let name = node.name().to_string();
        self.nodes.add(node)?;
        tracing::trace!(node = %name, "Added block node");
        Ok(name)
    }

    pub fn find(&self, name: &str) -> Option<&BlockNode> {
        self.nodes.find(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BlockNode> {
        self.nodes.iter()
    }

    pub fn options(&self) -> Options {
        let mut opts = Options::new();
        for node in self.nodes.iter() {
            opts.add("blockdev", node.parameters());
        }
        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_raw_pair() {
        let mut graph = BlockGraph::new();
        let file = graph
            .add(FileNode::new("alpha-os-file", "/pool/os.raw").with_options(NodeOptions {
                discard: true,
                ..Default::default()
            }))
            .unwrap();
        let raw = graph
            .add(RawNode::new("alpha-os", &file).with_options(NodeOptions {
                discard: true,
                detect_zeroes: DetectZeroes::Unmap,
                ..Default::default()
            }))
            .unwrap();

        assert_eq!(raw, "alpha-os");
        let rendered: Vec<String> = graph.options().iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "-blockdev driver=file,node-name=alpha-os-file,discard=unmap,filename=/pool/os.raw",
                "-blockdev driver=raw,node-name=alpha-os,discard=unmap,detect-zeroes=unmap,file=alpha-os-file",
            ]
        );
    }

    #[test]
    fn test_format_node_requires_upstream() {
        let mut graph = BlockGraph::new();
        let err = graph.add(RawNode::new("alpha-os", "alpha-os-file")).unwrap_err();
        assert!(err.is_configuration());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_duplicate_node_name() {
        let mut graph = BlockGraph::new();
        graph.add(FileNode::new("cd", "/a.iso")).unwrap();
        let err = graph.add(DirNode::new("cd", "/share")).unwrap_err();
        assert!(err.is_duplicate_name());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_dir_node_parameters() {
        let node = BlockNode::from(DirNode::new("alpha-share", "/srv/share").with_label("SHARE"));
        assert_eq!(
            node.parameters().to_string(),
            "driver=vvfat,node-name=alpha-share,read-only=on,label=SHARE,dir=/srv/share"
        );
    }

    #[test]
    fn test_child_name() {
        assert_eq!(child_name("alpha-os", "file"), "alpha-os-file");
    }
}
