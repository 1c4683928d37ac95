//! Tapestry Object Location Library
//!
//! A distributed hash table in the Tapestry style: nodes and objects share one
//! 160-bit identifier space, each object key has a root node, and the root keeps
//! a soft-state directory of which nodes currently hold a copy.
//!
//! ## Architecture Modules
//! - **`identifier`**: the identifier space, key hashing, and the ownership predicate
//!   that decides which of two nodes is the better root for a key.
//! - **`directory`**: the per-node object directory. Every registration expires unless
//!   it is refreshed, and entries can be handed to a node that becomes a better root.
//! - **`overlay`**: membership, root finding, the republish loop, and the peer RPC client.
//! - **`blob`**: local object bytes and the transport used to read them from replicas.
//! - **`node`**: the `Tapestry` facade (store, lookup, get, remove, leave, kill) and
//!   the HTTP server that hosts every endpoint.
//! - **`config`** / **`error`**: protocol constants, node settings, and the error type
//!   returned by the client data path.

pub mod blob;
pub mod config;
pub mod directory;
pub mod error;
pub mod identifier;
pub mod node;
pub mod overlay;

pub use config::NodeConfig;
pub use error::TapestryError;
pub use identifier::Id;
pub use node::Tapestry;
pub use overlay::Node;
