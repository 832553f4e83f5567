//! Per-session facade tying one tree to its navigation and selection state.
//!
//! This is the entire read surface handed to a rendering collaborator:
//! directory entries in display order, the clickable breadcrumb trail, the
//! derived view mode and the selected nodes.

use crate::error::Result;
use crate::explorer::navigation::NavigationState;
use crate::explorer::selection::{SelectionState, ViewMode};
use crate::explorer::tree::{FileTree, NodeKind, NodeRef};

/// One row of the current directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: NodeKind,
    pub node: NodeRef,
}

/// A browsing session over one job's output tree.
pub struct Browser {
    tree: FileTree,
    nav: NavigationState,
    selection: SelectionState,
}

impl Browser {
    /// Open a session rooted at the tree's root directory.
    pub fn new(tree: FileTree) -> Browser {
        let nav = NavigationState::start(&tree);
        Browser {
            tree,
            nav,
            selection: SelectionState::new(),
        }
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    /// Entries of the current directory in display (first-seen) order.
    pub fn entries(&self) -> Result<Vec<DirEntry>> {
        self.tree
            .children(self.nav.current())?
            .into_iter()
            .map(|node| {
                Ok(DirEntry {
                    name: self.tree.name(node)?.to_string(),
                    kind: self.tree.kind(node)?,
                    node,
                })
            })
            .collect()
    }

    /// Breadcrumb trail as `(name, node)` pairs.
    pub fn breadcrumbs(&self) -> Result<Vec<(String, NodeRef)>> {
        self.nav.breadcrumb_trail(&self.tree)
    }

    /// Enter a directory (child of current, or a breadcrumb jump back).
    /// Always exits gallery mode: the file selection is cleared and the
    /// entered directory becomes the selected folder.
    pub fn enter(&mut self, node: NodeRef) -> Result<()> {
        self.nav.enter(&self.tree, node)?;
        self.selection.clear_file();
        self.selection.select_folder(&self.tree, node)?;
        Ok(())
    }

    /// Enter an immediate child directory by name.
    pub fn enter_child(&mut self, name: &str) -> Result<()> {
        let child = self
            .tree
            .child_by_name(self.nav.current(), name)?
            .ok_or_else(|| crate::error::ExplorerError::NotFound(name.to_string()))?;
        self.enter(child)
    }

    /// Open a file of the current directory, switching to gallery mode.
    pub fn open(&mut self, node: NodeRef) -> Result<()> {
        let file = self.nav.open(&self.tree, node)?;
        self.selection.select_file(&self.tree, file)
    }

    /// Select a directory without entering it (table mode).
    pub fn select_folder(&mut self, node: NodeRef) -> Result<()> {
        self.selection.select_folder(&self.tree, node)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn view_mode(&self) -> ViewMode {
        self.selection.view_mode()
    }

    pub fn selected_file(&self) -> Option<NodeRef> {
        self.selection.selected_file()
    }

    pub fn selected_folder(&self) -> Option<NodeRef> {
        self.selection.selected_folder()
    }

    pub fn current(&self) -> NodeRef {
        self.nav.current()
    }

    /// Count of input paths the build had to skip, for diagnostic display.
    pub fn skipped_paths(&self) -> usize {
        self.tree.skipped()
    }
}
