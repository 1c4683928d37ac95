//! Blob Module Tests
//!
//! ## Test Scopes
//! - **BlobStore**: put/get/delete bookkeeping.
//! - **Publication ownership**: deleting or replacing a blob stops its republisher.

#[cfg(test)]
mod tests {
    use crate::blob::BlobStore;
    use crate::overlay::Publication;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::watch;

    /// A publication whose loop counts its ticks.
    fn counting_publication(ticks: Arc<AtomicUsize>) -> Publication {
        let (_ready_tx, ready_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                ticks.fetch_add(1, Ordering::SeqCst);
            }
        });
        Publication::new(ready_rx, handle)
    }

    // ============================================================
    // BLOB STORE
    // ============================================================

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = BlobStore::new();

        store.put("book", b"contents".to_vec(), Publication::published());

        assert_eq!(store.get("book"), Some(b"contents".to_vec()));
        assert_eq!(store.len(), 1);
        assert!(store.delete("book"));
        assert!(!store.delete("book"));
        assert!(store.get("book").is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = BlobStore::new();

        store.put("book", b"v1".to_vec(), Publication::published());
        store.put("book", b"v2".to_vec(), Publication::published());

        assert_eq!(store.get("book"), Some(b"v2".to_vec()));
        assert_eq!(store.keys(), vec!["book".to_string()]);
    }

    #[tokio::test]
    async fn test_published_signal_is_ready() {
        let publication = Publication::published();
        let mut ready = publication.ready_signal();

        assert!(ready.is_ready());
        assert!(ready.wait().await);
    }

    // ============================================================
    // PUBLICATION OWNERSHIP
    // ============================================================

    #[tokio::test(start_paused = true)]
    async fn test_delete_stops_republishing() {
        let store = BlobStore::new();
        let ticks = Arc::new(AtomicUsize::new(0));
        store.put("book", b"x".to_vec(), counting_publication(ticks.clone()));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let before = ticks.load(Ordering::SeqCst);
        assert!(before >= 3);

        assert!(store.delete("book"));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replace_stops_old_republisher() {
        let store = BlobStore::new();
        let old_ticks = Arc::new(AtomicUsize::new(0));
        store.put("book", b"v1".to_vec(), counting_publication(old_ticks.clone()));
        tokio::time::sleep(Duration::from_millis(1500)).await;

        store.put("book", b"v2".to_vec(), Publication::published());
        let before = old_ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(old_ticks.load(Ordering::SeqCst), before);
    }

    #[tokio::test]
    async fn test_signal_reports_abandoned_publish() {
        let (ready_tx, ready_rx) = watch::channel(false);
        let publication = Publication::new(ready_rx, tokio::spawn(async {}));
        let mut ready = publication.ready_signal();

        drop(ready_tx);

        assert!(!ready.is_ready());
        assert!(!ready.wait().await);
    }
}
