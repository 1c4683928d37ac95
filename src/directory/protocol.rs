//! Directory Network Protocol
//!
//! Endpoints and DTOs that expose the directory to remote peers. Publishers
//! reach a key's root through `register`; a node handing off part of the
//! identifier space ships its entries through `register_all`.

use crate::overlay::types::Node;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

// --- API Endpoints ---

pub const ENDPOINT_REGISTER: &str = "/internal/directory/register";
/// Bulk import used by ownership transfer and graceful leave.
pub const ENDPOINT_REGISTER_ALL: &str = "/internal/directory/register_all";
pub const ENDPOINT_UNREGISTER: &str = "/internal/directory/unregister";
pub const ENDPOINT_UNREGISTER_ALL: &str = "/internal/directory/unregister_all";
pub const ENDPOINT_GET: &str = "/internal/directory/get";

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// --- Data Transfer Objects ---

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub key: String,
    pub replica: Node,
    /// Lifetime of the advertisement unless refreshed.
    pub timeout_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// `false` when the call only refreshed an existing registration.
    pub added: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterAllRequest {
    pub registrations: HashMap<String, Vec<Node>>,
    pub timeout_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterAllResponse {
    pub keys: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnregisterRequest {
    pub key: String,
    pub replica: Node,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnregisterResponse {
    pub existed: bool,
}

/// Request naming a single key (`unregister_all`, `get`).
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyRequest {
    pub key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplicasResponse {
    pub replicas: Vec<Node>,
}
