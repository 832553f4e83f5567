//! Dual file/folder selection and the view mode derived from it.

use crate::error::{ExplorerError, Result};
use crate::explorer::tree::{FileTree, NodeKind, NodeRef};

/// Which of the three mutually exclusive views the selection calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// A file and its folder are selected: detail/gallery rendering.
    Gallery,
    /// Only a folder is selected: tabular directory listing.
    Table,
    /// Nothing selected.
    Empty,
}

/// Tracks the selected file and/or folder.
///
/// Selecting a file always resolves and sets its parent folder from the live
/// tree, so a file-only selection is unreachable. The view mode is derived on
/// every call, never stored.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    file: Option<NodeRef>,
    folder: Option<NodeRef>,
}

impl SelectionState {
    pub fn new() -> SelectionState {
        SelectionState::default()
    }

    /// Select a file; its parent directory becomes the selected folder.
    pub fn select_file(&mut self, tree: &FileTree, file: NodeRef) -> Result<()> {
        if tree.kind(file)? != NodeKind::File {
            return Err(ExplorerError::NotFound(tree.path_of(file)?));
        }
        // Files always have a parent; the root is a directory.
        let folder = match tree.parent(file)? {
            Some(folder) => folder,
            None => return Err(ExplorerError::NotFound(tree.path_of(file)?)),
        };
        self.file = Some(file);
        self.folder = Some(folder);
        Ok(())
    }

    /// Select a folder, clearing any file selection.
    pub fn select_folder(&mut self, tree: &FileTree, folder: NodeRef) -> Result<()> {
        if tree.kind(folder)? != NodeKind::Directory {
            return Err(ExplorerError::NotFound(tree.path_of(folder)?));
        }
        self.folder = Some(folder);
        self.file = None;
        Ok(())
    }

    /// Clear both selections.
    pub fn clear(&mut self) {
        self.file = None;
        self.folder = None;
    }

    /// Clear only the file selection (leaving table mode if a folder is set).
    pub fn clear_file(&mut self) {
        self.file = None;
    }

    pub fn selected_file(&self) -> Option<NodeRef> {
        self.file
    }

    pub fn selected_folder(&self) -> Option<NodeRef> {
        self.folder
    }

    /// Derived view mode.
    pub fn view_mode(&self) -> ViewMode {
        match (self.file, self.folder) {
            (Some(_), Some(_)) => ViewMode::Gallery,
            (None, Some(_)) => ViewMode::Table,
            _ => ViewMode::Empty,
        }
    }
}
