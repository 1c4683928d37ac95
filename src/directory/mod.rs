//! Object Directory Module
//!
//! The root node's record of "who has a copy of key K".
//!
//! ## Core Concepts
//! - **Soft state**: every advertisement expires unless the advertiser republishes it.
//! - **Refresh**: re-registering an advertiser resets its deadline instead of duplicating it.
//! - **Transfer**: when a neighbor becomes a better root for part of the identifier
//!   space, the affected entries are removed atomically and shipped to it.
//! - **Remote access**: every operation is also reachable over HTTP (`handlers`).

pub mod handlers;
pub mod protocol;
pub mod store;

pub use store::ObjectDirectory;
