//! Tree materialization from flat path listings.
//!
//! The server only exposes a job's output as an unordered flat list of full
//! path strings, so the hierarchy is reconstructed client-side. Nodes live in
//! an arena owned by [`FileTree`]; the outside world holds [`NodeRef`]
//! handles stamped with the tree's generation, so a handle minted against a
//! tree that has since been replaced fails with `NotFound` instead of
//! resolving against the wrong arena.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::client::FileRecord;
use crate::error::{ExplorerError, Result};

/// Process-wide generation counter; each built tree gets a fresh stamp.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Stable handle to a node within one tree instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    generation: u64,
    index: u32,
}

/// Kind of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
}

#[derive(Debug, Clone)]
enum NodeData {
    /// Children in first-seen (display) order.
    Directory { children: Vec<u32> },
    File { record: FileRecord },
}

/// One reconstructed directory or file entry.
#[derive(Debug, Clone)]
struct TreeNode {
    name: String,
    parent: Option<u32>,
    data: NodeData,
}

/// A reconstructed directory hierarchy for one job's output.
///
/// Immutable after build; a newer poll result produces a brand-new tree
/// rather than patching this one in place.
#[derive(Debug, Clone)]
pub struct FileTree {
    nodes: Vec<TreeNode>,
    generation: u64,
    /// Input paths rejected during the build (malformed or conflicting).
    skipped: usize,
}

impl FileTree {
    /// Build a tree from a flat listing of `(full path, file record)` pairs.
    ///
    /// Paths are split on `/`; the final segment is the file name, preceding
    /// segments are directories, created on first sight and reused after.
    /// Leading and trailing delimiters are trimmed before splitting. A path
    /// that is empty after trimming, contains an empty segment, or collides
    /// with an existing node of the other kind is rejected on its own —
    /// the build continues and the rejection is tallied in [`skipped`].
    ///
    /// A duplicate full path silently overwrites the earlier file record, in
    /// supply order; duplicates never produce sibling nodes.
    ///
    /// [`skipped`]: FileTree::skipped
    pub fn build<I>(job_name: &str, entries: I) -> FileTree
    where
        I: IntoIterator<Item = (String, FileRecord)>,
    {
        let root = TreeNode {
            name: job_name.to_string(),
            parent: None,
            data: NodeData::Directory {
                children: Vec::new(),
            },
        };
        let mut tree = FileTree {
            nodes: vec![root],
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            skipped: 0,
        };

        // Transient (parent, name) -> child index map keeps the walk linear
        // in the total number of path segments.
        let mut by_name: HashMap<(u32, String), u32> = HashMap::new();

        for (path, record) in entries {
            if let Err(err) = tree.insert(&path, record, &mut by_name) {
                tracing::warn!(path = %path, %err, "skipping output path");
                tree.skipped += 1;
            }
        }
        tree
    }

    fn insert(
        &mut self,
        path: &str,
        record: FileRecord,
        by_name: &mut HashMap<(u32, String), u32>,
    ) -> Result<()> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(ExplorerError::MalformedPath(path.to_string()));
        }
        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ExplorerError::MalformedPath(path.to_string()));
        }
        let (file_name, dirs) = segments.split_last().unwrap();

        let mut current = 0u32;
        for &segment in dirs {
            current = match by_name.get(&(current, segment.to_string())) {
                Some(&idx) => match self.nodes[idx as usize].data {
                    NodeData::Directory { .. } => idx,
                    // Path descends through an existing file.
                    NodeData::File { .. } => {
                        return Err(ExplorerError::MalformedPath(path.to_string()))
                    }
                },
                None => self.push_child(
                    current,
                    segment,
                    NodeData::Directory {
                        children: Vec::new(),
                    },
                    by_name,
                ),
            };
        }

        match by_name.get(&(current, file_name.to_string())) {
            Some(&idx) => match &mut self.nodes[idx as usize].data {
                // Duplicate path: the later record wins.
                NodeData::File { record: existing } => *existing = record,
                NodeData::Directory { .. } => {
                    return Err(ExplorerError::MalformedPath(path.to_string()))
                }
            },
            None => {
                self.push_child(current, file_name, NodeData::File { record }, by_name);
            }
        }
        Ok(())
    }

    fn push_child(
        &mut self,
        parent: u32,
        name: &str,
        data: NodeData,
        by_name: &mut HashMap<(u32, String), u32>,
    ) -> u32 {
        let idx = self.nodes.len() as u32;
        self.nodes.push(TreeNode {
            name: name.to_string(),
            parent: Some(parent),
            data,
        });
        if let NodeData::Directory { children } = &mut self.nodes[parent as usize].data {
            children.push(idx);
        }
        by_name.insert((parent, name.to_string()), idx);
        idx
    }

    fn node(&self, node: NodeRef) -> Result<&TreeNode> {
        if node.generation != self.generation || node.index as usize >= self.nodes.len() {
            return Err(ExplorerError::NotFound(format!(
                "node #{} from a replaced tree",
                node.index
            )));
        }
        Ok(&self.nodes[node.index as usize])
    }

    fn make_ref(&self, index: u32) -> NodeRef {
        NodeRef {
            generation: self.generation,
            index,
        }
    }

    /// Handle to the root directory (named after the job).
    pub fn root(&self) -> NodeRef {
        self.make_ref(0)
    }

    pub fn name(&self, node: NodeRef) -> Result<&str> {
        Ok(&self.node(node)?.name)
    }

    pub fn kind(&self, node: NodeRef) -> Result<NodeKind> {
        Ok(match self.node(node)?.data {
            NodeData::Directory { .. } => NodeKind::Directory,
            NodeData::File { .. } => NodeKind::File,
        })
    }

    /// The originating file record; `NotFound` for directories.
    pub fn record(&self, node: NodeRef) -> Result<&FileRecord> {
        match &self.node(node)?.data {
            NodeData::File { record } => Ok(record),
            NodeData::Directory { .. } => Err(ExplorerError::NotFound(format!(
                "{} is a directory, not a file",
                self.node(node)?.name
            ))),
        }
    }

    pub fn parent(&self, node: NodeRef) -> Result<Option<NodeRef>> {
        Ok(self.node(node)?.parent.map(|idx| self.make_ref(idx)))
    }

    /// Children of a directory in display (first-seen) order; empty for files.
    pub fn children(&self, node: NodeRef) -> Result<Vec<NodeRef>> {
        Ok(match &self.node(node)?.data {
            NodeData::Directory { children } => {
                children.iter().map(|&idx| self.make_ref(idx)).collect()
            }
            NodeData::File { .. } => Vec::new(),
        })
    }

    /// Look up an immediate child by name.
    pub fn child_by_name(&self, node: NodeRef, name: &str) -> Result<Option<NodeRef>> {
        for child in self.children(node)? {
            if self.node(child)?.name == name {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    /// `/`-joined names from the root (exclusive) to `node` (inclusive).
    /// The root itself yields an empty string.
    pub fn path_of(&self, node: NodeRef) -> Result<String> {
        let mut segments = Vec::new();
        let mut current = self.node(node)?;
        while let Some(parent) = current.parent {
            segments.push(current.name.as_str());
            current = &self.nodes[parent as usize];
        }
        segments.reverse();
        Ok(segments.join("/"))
    }

    /// Re-resolve a `/`-joined path (as produced by [`path_of`]) against this
    /// tree. This is the recovery route for a `NotFound` raised by a handle
    /// into a replaced tree.
    ///
    /// [`path_of`]: FileTree::path_of
    pub fn resolve(&self, path: &str) -> Result<NodeRef> {
        let mut current = self.root();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self
                .child_by_name(current, segment)?
                .ok_or_else(|| ExplorerError::NotFound(path.to_string()))?;
        }
        Ok(current)
    }

    /// Total node count, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of input paths rejected during the build.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Whether the root directory has no entries ("no output yet" and "empty
    /// directory" are distinguished by callers via this, not a marker node).
    pub fn is_empty(&self) -> bool {
        matches!(&self.nodes[0].data, NodeData::Directory { children } if children.is_empty())
    }

    /// Structural equality under canonical (sorted-by-name) child ordering.
    ///
    /// Tree *shape* is independent of input order even though display order
    /// is first-seen; tests compare with this rather than insertion order.
    pub fn same_shape(&self, other: &FileTree) -> bool {
        fn shapes_eq(a: &FileTree, ai: u32, b: &FileTree, bi: u32) -> bool {
            let (an, bn) = (&a.nodes[ai as usize], &b.nodes[bi as usize]);
            if an.name != bn.name {
                return false;
            }
            match (&an.data, &bn.data) {
                (NodeData::File { .. }, NodeData::File { .. }) => true,
                (NodeData::Directory { children: ac }, NodeData::Directory { children: bc }) => {
                    if ac.len() != bc.len() {
                        return false;
                    }
                    let sorted = |t: &FileTree, c: &[u32]| {
                        let mut v: Vec<u32> = c.to_vec();
                        v.sort_by(|&x, &y| {
                            t.nodes[x as usize].name.cmp(&t.nodes[y as usize].name)
                        });
                        v
                    };
                    sorted(a, ac)
                        .into_iter()
                        .zip(sorted(b, bc))
                        .all(|(x, y)| shapes_eq(a, x, b, y))
                }
                _ => false,
            }
        }
        shapes_eq(self, 0, other, 0)
    }

    /// All root-to-leaf paths in the tree, one per file node.
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        for node in &self.nodes {
            if matches!(node.data, NodeData::File { .. }) {
                let mut segments = vec![node.name.as_str()];
                let mut parent = node.parent;
                while let Some(idx) = parent {
                    let ancestor = &self.nodes[idx as usize];
                    if ancestor.parent.is_some() {
                        segments.push(ancestor.name.as_str());
                    }
                    parent = ancestor.parent;
                }
                segments.reverse();
                paths.push(segments.join("/"));
            }
        }
        paths
    }
}
