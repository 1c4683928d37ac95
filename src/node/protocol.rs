//! Client API Protocol
//!
//! Public HTTP endpoints of a node and the JSON bodies they return. Object
//! bytes travel as raw request and response bodies; everything else is JSON.

use crate::overlay::types::Node;
use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// PUT stores, GET fetches, DELETE removes the local copy.
pub const ENDPOINT_OBJECT: &str = "/objects/:key";
pub const ENDPOINT_LOOKUP: &str = "/lookup/:key";
pub const ENDPOINT_STATUS: &str = "/status";

// --- Data Transfer Objects ---

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreResponse {
    pub key: String,
    /// Whether the root had registered this node by the time the response was sent.
    pub published: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveResponse {
    pub existed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LookupResponse {
    pub key: String,
    pub replicas: Vec<Node>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Snapshot of a node's local state.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub node: Node,
    pub members: Vec<Node>,
    pub directory_keys: usize,
    pub directory_registrations: usize,
    pub blobs: Vec<String>,
}
