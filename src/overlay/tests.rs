//! Overlay Module Tests
//!
//! ## Test Scopes
//! - **Membership**: member bookkeeping and root selection.
//! - **Publishing**: local registration, readiness, and stopping the republish loop.
//! - **Failure handling**: unreachable roots are evicted and the next root is used.
//!
//! *Note: multi-node join, transfer, and hand-off run against real listeners in the node tests.*

#[cfg(test)]
mod tests {
    use crate::config::NodeConfig;
    use crate::directory::ObjectDirectory;
    use crate::identifier::Id;
    use crate::overlay::{Node, OverlayService, PeerClient, Router};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    fn node(id: Id, port: u16) -> Node {
        let addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
        Node::new(id, addr)
    }

    fn test_config() -> NodeConfig {
        NodeConfig {
            republish_interval: Duration::from_secs(10),
            registration_timeout: Duration::from_secs(25),
            rpc_retries: 1,
            rpc_timeout: Duration::from_millis(200),
            ..NodeConfig::default()
        }
    }

    fn overlay_with(local: Node, config: &NodeConfig) -> (OverlayService, Arc<ObjectDirectory>) {
        let directory = Arc::new(ObjectDirectory::new());
        let client = PeerClient::new(config);
        (
            OverlayService::new(local, directory.clone(), client, config),
            directory,
        )
    }

    fn overlay(local: Node) -> (OverlayService, Arc<ObjectDirectory>) {
        overlay_with(local, &test_config())
    }

    /// An id sharing exactly `digits` leading digits (even) with `target`.
    fn id_sharing_prefix(target: &Id, digits: usize) -> Id {
        let mut bytes = *target.as_bytes();
        bytes[digits / 2] ^= 0xff;
        Id::from_bytes(bytes)
    }

    // ============================================================
    // MEMBERSHIP
    // ============================================================

    #[tokio::test]
    async fn test_add_member_ignores_self_and_duplicates() {
        let local = node(Id::random(), 7000);
        let (service, _) = overlay(local);
        let peer = node(Id::random(), 7001);

        assert!(!service.add_member(local));
        assert!(service.add_member(peer));
        assert!(!service.add_member(peer));
        assert_eq!(service.members(), vec![peer]);

        assert_eq!(service.remove_member(&peer.id), Some(peer));
        assert!(service.members().is_empty());
    }

    #[tokio::test]
    async fn test_alone_node_is_root_of_everything() {
        let local = node(Id::random(), 7000);
        let (service, _) = overlay(local);

        for i in 0..20 {
            assert_eq!(service.find_root(&format!("key-{}", i)), local);
        }
    }

    #[tokio::test]
    async fn test_root_is_best_matching_member() {
        let local = node(Id::random(), 7000);
        let (service, _) = overlay(local);
        for port in 7001..7010 {
            service.add_member(node(Id::random(), port));
        }
        let exact = node(Id::hash("book"), 7100);
        service.add_member(exact);

        assert_eq!(service.find_root("book"), exact);

        let hash = Id::hash("other");
        let root = service.find_root("other");
        for candidate in service.members().into_iter().chain([local]) {
            assert!(
                !hash.better_choice(&candidate.id, &root.id),
                "{} beats chosen root {}",
                candidate,
                root
            );
        }
    }

    #[tokio::test]
    async fn test_handle_leave_forgets_member() {
        let local = node(Id::random(), 7000);
        let (service, _) = overlay(local);
        let peer = node(Id::random(), 7001);
        service.add_member(peer);

        service.handle_leave(peer);

        assert!(service.members().is_empty());
    }

    // ============================================================
    // PUBLISHING
    // ============================================================

    #[tokio::test]
    async fn test_publish_once_registers_locally_when_root() {
        let local = node(Id::random(), 7000);
        let (service, directory) = overlay(local);

        let root = service.publish_once("book").await.unwrap();

        assert_eq!(root, local);
        assert_eq!(directory.get("book"), vec![local]);
    }

    #[tokio::test]
    async fn test_publish_signals_ready() {
        let local = node(Id::random(), 7000);
        let (service, directory) = overlay(local);

        let publication = service.publish("book").await.unwrap();
        let mut ready = publication.ready_signal();

        let fired = tokio::time::timeout(Duration::from_secs(5), ready.wait())
            .await
            .unwrap();
        assert!(fired);
        assert!(ready.is_ready());
        assert_eq!(directory.get("book"), vec![local]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_publication_stops_republishing() {
        let local = node(Id::random(), 7000);
        let (service, directory) = overlay(local);

        let publication = service.publish("book").await.unwrap();
        publication.ready_signal().wait().await;

        // Republishing keeps the entry alive well past one timeout.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(directory.get("book"), vec![local]);

        drop(publication);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(directory.get("book").is_empty());
    }

    #[tokio::test]
    async fn test_zero_republish_interval_still_publishes() {
        let local = node(Id::random(), 7000);
        let config = NodeConfig {
            republish_interval: Duration::ZERO,
            ..test_config()
        };
        let (service, directory) = overlay_with(local, &config);

        let publication = service.publish("book").await.unwrap();
        let mut ready = publication.ready_signal();

        let fired = tokio::time::timeout(Duration::from_secs(5), ready.wait())
            .await
            .unwrap();
        assert!(fired);
        assert_eq!(directory.get("book"), vec![local]);
    }

    #[tokio::test]
    async fn test_lookup_alone_reads_local_directory() {
        let local = node(Id::random(), 7000);
        let (service, directory) = overlay(local);
        let replica = node(Id::random(), 7001);
        directory.register("book", replica, Duration::from_secs(25));

        assert_eq!(service.lookup("book").await.unwrap(), vec![replica]);
        assert!(service.lookup("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_leave_closes_and_drains() {
        let local = node(Id::random(), 7000);
        let (service, directory) = overlay(local);
        directory.register("book", local, Duration::from_secs(25));

        service.leave().await;

        assert!(service.is_closed());
        assert_eq!(directory.key_count(), 0);
        assert!(service.publish("book").await.is_err());
        assert!(service.lookup("book").await.is_err());
    }

    // ============================================================
    // FAILURE HANDLING
    // ============================================================

    #[tokio::test]
    async fn test_unreachable_root_is_evicted() {
        let local = node(Id::random(), 7000);
        let (service, directory) = overlay(local);
        // Nothing listens on port 1; this member would otherwise own the key.
        let dead = node(Id::hash("book"), 1);
        service.add_member(dead);

        let root = service.publish_once("book").await.unwrap();

        assert_eq!(root, local);
        assert!(service.members().is_empty());
        assert_eq!(directory.get("book"), vec![local]);
    }

    #[tokio::test]
    async fn test_each_unreachable_root_is_tried_once() {
        let hash = Id::hash("book");
        let local = node(id_sharing_prefix(&hash, 0), 7000);
        let (service, directory) = overlay(local);
        // All three beat the local node for the key, and nothing listens on port 1.
        for digits in [2, 6, 10] {
            service.add_member(node(id_sharing_prefix(&hash, digits), 1));
        }
        assert_eq!(service.find_root("book").id.shared_prefix_length(&hash), 10);

        let root = service.publish_once("book").await.unwrap();

        assert_eq!(root, local);
        assert!(service.members().is_empty());
        assert_eq!(directory.get("book"), vec![local]);
    }
}
