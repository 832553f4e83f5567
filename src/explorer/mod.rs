//! In-memory explorer over a job's reconstructed output tree.

pub mod browser;
pub mod navigation;
pub mod selection;
pub mod tree;
