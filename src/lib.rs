//! Browser core for remote job output listings.
//!
//! A remote computational job exposes its output only as a flat list of full
//! file paths. This crate reconstructs that listing into a navigable
//! directory tree ([`explorer::tree::FileTree`]), tracks per-session
//! navigation and selection state over it ([`explorer::browser::Browser`]),
//! and keeps a set of in-flight jobs synchronized by polling their status
//! until terminal ([`poller::ResourcePoller`] feeding a
//! [`store::JobOutputStore`]).
//!
//! Transport, rendering, and blob persistence stay outside, behind the
//! traits in [`client`].

pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod explorer;
pub mod poller;
pub mod store;

pub use client::{BlobClient, FileRecord, JobId, JobState, JobStatusResponse, StatusClient};
pub use config::{ExplorerConfig, PollerConfig};
pub use error::{ExplorerError, Result};
pub use explorer::browser::{Browser, DirEntry};
pub use explorer::navigation::NavigationState;
pub use explorer::selection::{SelectionState, ViewMode};
pub use explorer::tree::{FileTree, NodeKind, NodeRef};
pub use poller::{PollStatus, PollUpdate, ResourcePoller};
pub use store::JobOutputStore;
