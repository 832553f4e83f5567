//! Current-directory and breadcrumb state over a [`FileTree`].
//!
//! Pure, synchronous transitions; the state holds `NodeRef` handles only and
//! takes the tree as an explicit argument, so replacing the tree after a new
//! poll result invalidates every held handle at once (`NotFound`).

use crate::error::{ExplorerError, Result};
use crate::explorer::tree::{FileTree, NodeKind, NodeRef};

/// Breadcrumb trail from the root to the directory currently displayed.
///
/// Invariant: non-empty, first element is the tree root, last element is the
/// current directory, and consecutive elements are parent/child pairs in the
/// live tree.
#[derive(Debug, Clone)]
pub struct NavigationState {
    breadcrumbs: Vec<NodeRef>,
}

impl NavigationState {
    /// Start a browsing session at the tree root.
    pub fn start(tree: &FileTree) -> NavigationState {
        NavigationState {
            breadcrumbs: vec![tree.root()],
        }
    }

    /// The directory currently displayed.
    pub fn current(&self) -> NodeRef {
        *self.breadcrumbs.last().expect("breadcrumbs never empty")
    }

    /// The root-to-current trail.
    pub fn breadcrumbs(&self) -> &[NodeRef] {
        &self.breadcrumbs
    }

    /// Enter a directory.
    ///
    /// `node` must be a directory and either an immediate child of the
    /// current directory (descend: appended to the trail) or an existing
    /// breadcrumb (jump back: the trail is truncated to end at it). Anything
    /// else — a file, a deeper descendant, an unrelated node, or a handle
    /// into a replaced tree — fails with `NotFound` and leaves the state
    /// untouched.
    pub fn enter(&mut self, tree: &FileTree, node: NodeRef) -> Result<()> {
        if tree.kind(node)? != NodeKind::Directory {
            return Err(ExplorerError::NotFound(tree.path_of(node)?));
        }

        if let Some(pos) = self.breadcrumbs.iter().position(|&c| c == node) {
            self.breadcrumbs.truncate(pos + 1);
            return Ok(());
        }

        if tree.parent(node)? == Some(self.current()) {
            self.breadcrumbs.push(node);
            return Ok(());
        }

        Err(ExplorerError::NotFound(tree.path_of(node)?))
    }

    /// Validate a file for opening from the current directory.
    ///
    /// Does not move the current directory; the caller hands the returned
    /// handle to the selection state. Fails with `NotFound` unless `node` is
    /// a file and an immediate child of the current directory.
    pub fn open(&self, tree: &FileTree, node: NodeRef) -> Result<NodeRef> {
        if tree.kind(node)? != NodeKind::File || tree.parent(node)? != Some(self.current()) {
            return Err(ExplorerError::NotFound(tree.path_of(node)?));
        }
        Ok(node)
    }

    /// The trail as `(name, node)` pairs for clickable breadcrumb rendering.
    pub fn breadcrumb_trail(&self, tree: &FileTree) -> Result<Vec<(String, NodeRef)>> {
        self.breadcrumbs
            .iter()
            .map(|&c| Ok((tree.name(c)?.to_string(), c)))
            .collect()
    }
}
