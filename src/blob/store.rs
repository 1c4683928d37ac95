use crate::overlay::publication::Publication;

use dashmap::DashMap;

struct StoredBlob {
    data: Vec<u8>,
    /// Keeps the key advertised while the blob is held.
    _publication: Publication,
}

/// Bytes of the objects this node holds a copy of.
///
/// Each blob owns the publication that advertises it, so removing a blob is
/// what stops its republishing.
pub struct BlobStore {
    blobs: DashMap<String, StoredBlob>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self {
            blobs: DashMap::new(),
        }
    }

    /// Stores `data` under `key`, replacing (and un-publishing) any previous blob.
    pub fn put(&self, key: &str, data: Vec<u8>, publication: Publication) {
        let size = data.len();
        self.blobs.insert(
            key.to_string(),
            StoredBlob {
                data,
                _publication: publication,
            },
        );
        tracing::debug!("Stored blob {} ({} bytes)", key, size);
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.get(key).map(|blob| blob.data.clone())
    }

    /// Removes the blob and stops advertising it. Returns whether it existed.
    pub fn delete(&self, key: &str) -> bool {
        self.blobs.remove(key).is_some()
    }

    /// Drops every blob, stopping all republishing.
    pub fn clear(&self) {
        self.blobs.clear();
    }

    pub fn keys(&self) -> Vec<String> {
        self.blobs.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl Default for BlobStore {
    fn default() -> Self {
        Self::new()
    }
}
