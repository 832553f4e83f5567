//! Download glue: suggested names and blob payload assembly.
//!
//! The core never inspects file contents; it only pairs the bytes fetched by
//! a [`BlobClient`] with a name derived from the tree, ready for whatever
//! save-as mechanism the host environment provides.

use crate::client::BlobClient;
use crate::error::Result;
use crate::explorer::tree::{FileTree, NodeKind, NodeRef};

/// Bytes plus the name to save them under.
#[derive(Debug)]
pub struct DownloadPayload {
    pub bytes: Vec<u8>,
    pub name: String,
}

/// The display name a download of this node should suggest (its final path
/// segment).
pub fn suggested_name(tree: &FileTree, node: NodeRef) -> Result<String> {
    Ok(tree.name(node)?.to_string())
}

/// Fetch a file node's content and pair it with its suggested name.
pub async fn fetch_payload<C>(client: &C, tree: &FileTree, node: NodeRef) -> Result<DownloadPayload>
where
    C: BlobClient + ?Sized,
{
    let record = tree.record(node)?;
    let bytes = client.fetch_blob(record).await?;
    Ok(DownloadPayload {
        bytes,
        name: suggested_name(tree, node)?,
    })
}

/// Every file node under `node` (inclusive for files), in display order.
/// This is the listing behind a "download all" action on a directory.
pub fn collect_files(tree: &FileTree, node: NodeRef) -> Result<Vec<NodeRef>> {
    let mut files = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        match tree.kind(current)? {
            NodeKind::File => files.push(current),
            NodeKind::Directory => {
                // Reverse so children come off the stack in display order.
                for child in tree.children(current)?.into_iter().rev() {
                    stack.push(child);
                }
            }
        }
    }
    Ok(files)
}
