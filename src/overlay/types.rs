use crate::identifier::Id;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// A member of the overlay: its identifier and the address its RPC server listens on.
///
/// Equality and hashing are structural, so two `Node` values with the same id and
/// address are interchangeable (e.g. as directory keys).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Node {
    pub id: Id,
    pub address: SocketAddr,
}

impl Node {
    pub fn new(id: Id, address: SocketAddr) -> Self {
        Self { id, address }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.address)
    }
}
