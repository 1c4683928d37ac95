use super::client::PeerClient;
use super::publication::Publication;
use super::types::Node;
use super::Router;
use crate::config::{MIN_PERIOD, NodeConfig};
use crate::directory::ObjectDirectory;
use crate::identifier::Id;

use anyhow::Result;
use dashmap::DashMap;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Full-membership overlay: every node knows every other node, and the root
/// of a key is the known node that best matches the key's hash.
///
/// Cheap to clone; clones share membership, directory, and shutdown state.
#[derive(Clone)]
pub struct OverlayService {
    local: Node,
    members: Arc<DashMap<Id, Node>>,
    directory: Arc<ObjectDirectory>,
    client: PeerClient,
    republish_interval: Duration,
    registration_timeout: Duration,
    closed: Arc<AtomicBool>,
}

impl OverlayService {
    pub fn new(
        local: Node,
        directory: Arc<ObjectDirectory>,
        client: PeerClient,
        config: &NodeConfig,
    ) -> Self {
        Self {
            local,
            members: Arc::new(DashMap::new()),
            directory,
            client,
            republish_interval: config.republish_interval.max(MIN_PERIOD),
            registration_timeout: config.registration_timeout,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn local_node(&self) -> Node {
        self.local
    }

    /// Known members, excluding the local node.
    pub fn members(&self) -> Vec<Node> {
        self.members.iter().map(|entry| *entry.value()).collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Records `node` as a member. Returns `true` if it was not known before.
    pub fn add_member(&self, node: Node) -> bool {
        if node.id == self.local.id {
            return false;
        }
        self.members.insert(node.id, node).is_none()
    }

    pub fn remove_member(&self, id: &Id) -> Option<Node> {
        self.members.remove(id).map(|(_, node)| node)
    }

    /// The node responsible for `key` given current membership.
    pub fn find_root(&self, key: &str) -> Node {
        let hash = Id::hash(key);
        self.members
            .iter()
            .map(|entry| *entry.value())
            .fold(self.local, |best, candidate| {
                if hash.better_choice(&candidate.id, &best.id) {
                    candidate
                } else {
                    best
                }
            })
    }

    fn remove_bad_node(&self, node: &Node) {
        if self.remove_member(&node.id).is_some() {
            tracing::warn!("Removed unreachable member {}", node);
        }
    }

    /// Upper bound on distinct roots one operation may try: every member, then self.
    fn root_candidates(&self) -> usize {
        self.members.len() + 1
    }

    /// Registers the local node as an advertiser of `key` at the key's root.
    ///
    /// The peer client already retries each call. A root that still fails is
    /// dropped from membership and the next best root is tried once.
    pub async fn publish_once(&self, key: &str) -> Result<Node> {
        for _ in 0..self.root_candidates() {
            let root = self.find_root(key);
            if root == self.local {
                self.directory
                    .register(key, self.local, self.registration_timeout);
                return Ok(root);
            }

            match self
                .client
                .register(&root, key, &self.local, self.registration_timeout)
                .await
            {
                Ok(_) => return Ok(root),
                Err(e) => {
                    tracing::warn!("Publish of {} to root {} failed: {}", key, root, e);
                    self.remove_bad_node(&root);
                }
            }
        }

        Err(anyhow::anyhow!("Unable to reach a root for key {}", key))
    }

    /// Handles a join announcement (hello or notify) from `joiner`.
    ///
    /// Returns the membership as it was before the joiner arrived, and ships the
    /// joiner every directory entry it is now a better root for.
    pub fn handle_join(&self, joiner: Node) -> Vec<Node> {
        let snapshot = self.members();

        if self.add_member(joiner) {
            tracing::info!("Node {} joined, {} members known", joiner, self.members.len());
        }
        if !self.is_closed() {
            let service = self.clone();
            tokio::spawn(async move {
                service.transfer_to(joiner).await;
            });
        }

        snapshot
    }

    pub fn handle_leave(&self, leaver: Node) {
        if self.remove_member(&leaver.id).is_some() {
            tracing::info!("Node {} left, {} members known", leaver, self.members.len());
        }
    }

    /// Moves the entries `candidate` now owns out of the local directory and into its own.
    ///
    /// The entries are removed locally before the RPC; a failed send is not rolled back.
    pub async fn transfer_to(&self, candidate: Node) {
        let batch = self
            .directory
            .get_transfer_registrations(&self.local, &candidate);
        if batch.is_empty() {
            return;
        }

        let keys = batch.len();
        match self
            .client
            .register_all(&candidate, batch, self.registration_timeout)
            .await
        {
            Ok(()) => tracing::info!("Transferred {} keys to {}", keys, candidate),
            Err(e) => tracing::error!("Failed to transfer {} keys to {}: {}", keys, candidate, e),
        }
    }

    /// Ships every local directory entry to its root among the remaining members.
    async fn hand_off(&self, remaining: &[Node]) {
        let mut batches: HashMap<Id, (Node, HashMap<String, Vec<Node>>)> = HashMap::new();

        for (key, replicas) in self.directory.drain() {
            let hash = Id::hash(&key);
            let root = remaining.iter().copied().reduce(|best, candidate| {
                if hash.better_choice(&candidate.id, &best.id) {
                    candidate
                } else {
                    best
                }
            });
            match root {
                Some(root) => {
                    batches
                        .entry(root.id)
                        .or_insert_with(|| (root, HashMap::new()))
                        .1
                        .insert(key, replicas);
                }
                None => tracing::debug!("No member left to take over key {}", key),
            }
        }

        for (root, batch) in batches.into_values() {
            let keys = batch.len();
            if let Err(e) = self
                .client
                .register_all(&root, batch, self.registration_timeout)
                .await
            {
                tracing::error!("Failed to hand off {} keys to {}: {}", keys, root, e);
            } else {
                tracing::info!("Handed off {} keys to {}", keys, root);
            }
        }
    }
}

#[async_trait::async_trait]
impl Router for OverlayService {
    async fn publish(&self, key: &str) -> Result<Publication> {
        if self.is_closed() {
            return Err(anyhow::anyhow!("Node {} has left the overlay", self.local));
        }

        let (ready_tx, ready_rx) = watch::channel(false);
        let service = self.clone();
        let key = key.to_string();

        let republisher = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(service.republish_interval);
            loop {
                ticker.tick().await;
                if service.is_closed() {
                    break;
                }

                match service.publish_once(&key).await {
                    Ok(root) => {
                        if !*ready_tx.borrow() {
                            tracing::info!("Published {} at root {}", key, root);
                            ready_tx.send_replace(true);
                        } else {
                            tracing::trace!("Republished {} at root {}", key, root);
                        }
                    }
                    Err(e) => tracing::warn!("Failed to publish {}: {}", key, e),
                }
            }
        });

        Ok(Publication::new(ready_rx, republisher))
    }

    async fn lookup(&self, key: &str) -> Result<Vec<Node>> {
        if self.is_closed() {
            return Err(anyhow::anyhow!("Node {} has left the overlay", self.local));
        }

        for _ in 0..self.root_candidates() {
            let root = self.find_root(key);
            if root == self.local {
                return Ok(self.directory.get(key));
            }

            match self.client.get(&root, key).await {
                Ok(replicas) => return Ok(replicas),
                Err(e) => {
                    tracing::warn!("Lookup of {} at root {} failed: {}", key, root, e);
                    self.remove_bad_node(&root);
                }
            }
        }

        Err(anyhow::anyhow!("Unable to reach a root for key {}", key))
    }

    async fn join(&self, seed: SocketAddr) -> Result<()> {
        let hello = self.client.hello(seed, &self.local).await?;
        self.add_member(hello.node);
        for member in hello.members {
            self.add_member(member);
        }

        for member in self.members() {
            if member.id == hello.node.id {
                continue;
            }
            if let Err(e) = self.client.notify_join(&member, &self.local).await {
                tracing::warn!("Failed to announce join to {}: {}", member, e);
                self.remove_bad_node(&member);
            }
        }

        tracing::info!(
            "Joined overlay via {} ({} members known)",
            seed,
            self.members.len()
        );
        Ok(())
    }

    async fn leave(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let remaining = self.members();
        for member in &remaining {
            if let Err(e) = self.client.notify_leave(member, &self.local).await {
                tracing::warn!("Failed to announce leave to {}: {}", member, e);
            }
        }

        self.hand_off(&remaining).await;
        tracing::info!("Node {} left the overlay", self.local);
    }
}
