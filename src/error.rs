//! Errors surfaced by the client data path.

use crate::overlay::types::Node;
use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum TapestryError {
    /// The root knows of no node advertising the key.
    #[error("no replicas returned for key {0}")]
    NoReplicas(String),

    /// Every advertised replica failed or held no data. Each failure is kept.
    #[error(
        "no replica of key {key} returned data ({} tried): {}",
        .replicas.len(),
        .errors.join("; ")
    )]
    ReplicasFailed {
        key: String,
        replicas: Vec<Node>,
        errors: Vec<String>,
    },

    #[error("lookup of key {key} failed: {source}")]
    Lookup { key: String, source: anyhow::Error },

    #[error("publish of key {key} failed: {source}")]
    Publish { key: String, source: anyhow::Error },

    #[error("unable to join overlay via {seed}: {source}")]
    Join {
        seed: SocketAddr,
        source: anyhow::Error,
    },

    #[error("invalid node configuration: {0}")]
    InvalidConfig(String),

    /// The node has left or been killed.
    #[error("tapestry node is shut down")]
    Closed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TapestryError {
    /// Whether the key could not be found anywhere, as opposed to a local failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TapestryError::NoReplicas(_) | TapestryError::ReplicasFailed { .. }
        )
    }
}
