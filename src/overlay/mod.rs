//! Overlay Routing Module
//!
//! The routing layer the data path is built on: it decides which node is the
//! root for a key, keeps advertisements alive there, and answers lookups.
//!
//! ## Core Mechanisms
//! - **Membership**: nodes join through a seed (hello) and announce themselves to
//!   every known member; a graceful leave is announced the same way.
//! - **Root finding**: the root of a key is the known node that best matches the
//!   key's hash under `Id::better_choice`.
//! - **Publishing**: a background loop re-registers the local node at the root
//!   every republish interval, so the root's soft state stays alive.
//! - **Ownership transfer**: whenever a new member appears, entries it now owns
//!   leave the local directory and are registered at the newcomer.

pub mod client;
pub mod handlers;
pub mod protocol;
pub mod publication;
pub mod service;
pub mod types;

pub use client::PeerClient;
pub use publication::{Publication, ReadySignal};
pub use service::OverlayService;
pub use types::Node;

use anyhow::Result;
use std::net::SocketAddr;

/// The routing layer as seen by the client data path.
#[async_trait::async_trait]
pub trait Router: Send + Sync {
    /// Starts advertising `key` at its root. Republishing continues until the
    /// returned handle is dropped.
    async fn publish(&self, key: &str) -> Result<Publication>;

    /// Returns the nodes currently advertising `key`.
    async fn lookup(&self, key: &str) -> Result<Vec<Node>>;

    async fn join(&self, seed: SocketAddr) -> Result<()>;

    /// Leaves the overlay, handing local directory state to the remaining members.
    async fn leave(&self);
}

#[cfg(test)]
mod tests;
