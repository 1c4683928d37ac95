//! Soft-State Object Directory
//!
//! Maps each key to the set of nodes currently advertising it. Every
//! registration carries a deadline; a registration whose deadline has passed is
//! treated as gone by every read and is physically removed by the reaper.

use crate::config::MIN_PERIOD;
use crate::identifier::Id;
use crate::overlay::types::Node;

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Advertiser -> expiry deadline.
type Registrations = HashMap<Node, Instant>;

/// The registry of advertisements for the keys this node is root of.
///
/// A single lock guards the whole map. Every operation holds it only for the
/// in-memory work and never across an `.await`. A key present in the map always
/// has at least one registration.
pub struct ObjectDirectory {
    data: Mutex<HashMap<String, Registrations>>,
}

impl ObjectDirectory {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }

    /// Registers `replica` as advertising `key` for `timeout`.
    ///
    /// Re-registering a live advertiser only pushes its deadline out.
    /// Returns `true` if the registration is new (or had already lapsed).
    pub fn register(&self, key: &str, replica: Node, timeout: Duration) -> bool {
        let now = Instant::now();
        let mut data = self.data.lock();

        let previous = data
            .entry(key.to_string())
            .or_default()
            .insert(replica, now + timeout);

        let added = previous.is_none_or(|deadline| deadline <= now);
        if added {
            tracing::debug!("Registered {} for key {}", replica, key);
        }
        added
    }

    /// Imports a batch of registrations, each with a fresh `timeout`.
    ///
    /// Existing deadlines for the same pairs are overwritten unconditionally.
    pub fn register_all(&self, registrations: HashMap<String, Vec<Node>>, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        let mut data = self.data.lock();

        for (key, replicas) in registrations {
            if replicas.is_empty() {
                continue;
            }
            let entry = data.entry(key).or_default();
            for replica in replicas {
                entry.insert(replica, deadline);
            }
        }
    }

    /// Removes a single registration immediately. Returns whether it was live.
    pub fn unregister(&self, key: &str, replica: &Node) -> bool {
        let now = Instant::now();
        let mut data = self.data.lock();

        let Some(replicas) = data.get_mut(key) else {
            return false;
        };
        let existed = replicas
            .remove(replica)
            .is_some_and(|deadline| deadline > now);
        if replicas.is_empty() {
            data.remove(key);
        }
        existed
    }

    /// Removes every advertiser of `key`, returning the ones that were live.
    pub fn unregister_all(&self, key: &str) -> Vec<Node> {
        let now = Instant::now();
        let removed = self.data.lock().remove(key);
        removed
            .map(|replicas| live_nodes(replicas, now))
            .unwrap_or_default()
    }

    /// Snapshot of the live advertisers of `key`, in no particular order.
    pub fn get(&self, key: &str) -> Vec<Node> {
        let now = Instant::now();
        let data = self.data.lock();

        data.get(key)
            .map(|replicas| {
                replicas
                    .iter()
                    .filter(|(_, deadline)| **deadline > now)
                    .map(|(node, _)| *node)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Removes and returns every key that `candidate` is a better root for than `local`.
    ///
    /// The scan and the removal happen under one lock acquisition, so no other
    /// operation observes a partially transferred directory.
    pub fn get_transfer_registrations(
        &self,
        local: &Node,
        candidate: &Node,
    ) -> HashMap<String, Vec<Node>> {
        let now = Instant::now();
        let mut data = self.data.lock();

        let keys: Vec<String> = data
            .keys()
            .filter(|key| Id::hash(key).better_choice(&candidate.id, &local.id))
            .cloned()
            .collect();

        let mut transfer = HashMap::new();
        for key in keys {
            if let Some(replicas) = data.remove(&key) {
                let live = live_nodes(replicas, now);
                if !live.is_empty() {
                    transfer.insert(key, live);
                }
            }
        }
        transfer
    }

    /// Removes and returns every live registration.
    pub fn drain(&self) -> HashMap<String, Vec<Node>> {
        let now = Instant::now();
        let drained = std::mem::take(&mut *self.data.lock());

        drained
            .into_iter()
            .filter_map(|(key, replicas)| {
                let live = live_nodes(replicas, now);
                (!live.is_empty()).then_some((key, live))
            })
            .collect()
    }

    /// Removes every registration whose deadline is at or before `now`.
    pub fn expire_due(&self, now: Instant) -> Vec<(String, Node)> {
        let mut expired = Vec::new();
        let mut data = self.data.lock();

        data.retain(|key, replicas| {
            replicas.retain(|node, deadline| {
                if *deadline <= now {
                    expired.push((key.clone(), *node));
                    false
                } else {
                    true
                }
            });
            !replicas.is_empty()
        });
        expired
    }

    /// Spawns the background sweep that drops lapsed registrations every `interval`.
    pub fn start_reaper(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(MIN_PERIOD));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                for (key, replica) in self.expire_due(Instant::now()) {
                    tracing::debug!("Expiring {} for node {}", key, replica);
                }
            }
        })
    }

    /// Number of keys with at least one live advertiser.
    pub fn key_count(&self) -> usize {
        let now = Instant::now();
        self.data
            .lock()
            .values()
            .filter(|replicas| replicas.values().any(|deadline| *deadline > now))
            .count()
    }

    pub fn registration_count(&self) -> usize {
        let now = Instant::now();
        self.data
            .lock()
            .values()
            .flat_map(|replicas| replicas.values())
            .filter(|deadline| **deadline > now)
            .count()
    }
}

impl Default for ObjectDirectory {
    fn default() -> Self {
        Self::new()
    }
}

fn live_nodes(replicas: Registrations, now: Instant) -> Vec<Node> {
    replicas
        .into_iter()
        .filter(|(_, deadline)| *deadline > now)
        .map(|(node, _)| node)
        .collect()
}
