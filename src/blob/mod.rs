//! Blob Module
//!
//! Local storage for object bytes, and the transport used to read them from
//! other nodes. The overlay only tracks who holds a copy; the bytes stay here.

pub mod handlers;
pub mod protocol;
pub mod store;

pub use store::BlobStore;

use crate::overlay::types::Node;
use anyhow::Result;

/// Remote read of a peer's blob store.
///
/// Abstracted so the data path can be exercised without real peers.
#[async_trait::async_trait]
pub trait BlobTransport: Send + Sync {
    /// Returns `None` if `node` holds no copy of `key`.
    async fn fetch_blob(&self, node: &Node, key: &str) -> Result<Option<Vec<u8>>>;
}

#[cfg(test)]
mod tests;
