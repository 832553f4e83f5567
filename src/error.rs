use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, ExplorerError>;

/// Error types surfaced by the explorer core.
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// A node reference does not resolve in the live tree, e.g. because the
    /// tree was replaced by a newer poll result. Recoverable: re-resolve the
    /// path against the new root.
    #[error("node not found: {0}")]
    NotFound(String),

    /// A path string could not be placed in the tree (empty segment, or a
    /// segment conflicting with an existing node of the other kind).
    #[error("malformed path: {0}")]
    MalformedPath(String),

    /// Transport or remote error while fetching job status or file content.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The poll update channel was closed while updates were still expected.
    #[error("update channel closed")]
    ChannelClosed,
}
