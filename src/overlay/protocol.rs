//! Overlay Membership Protocol
//!
//! A joining node says hello to a seed, learns the member list, then announces
//! itself to everyone else. A leaving node announces its departure.

use super::types::Node;
use serde::{Deserialize, Serialize};

pub const ENDPOINT_HELLO: &str = "/internal/hello";
pub const ENDPOINT_NOTIFY_JOIN: &str = "/internal/notify_join";
pub const ENDPOINT_NOTIFY_LEAVE: &str = "/internal/notify_leave";

#[derive(Debug, Serialize, Deserialize)]
pub struct HelloRequest {
    pub node: Node,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HelloResponse {
    /// The seed itself.
    pub node: Node,
    /// Every other member the seed knew about before the joiner arrived.
    pub members: Vec<Node>,
}

/// Join or leave announcement for `node`.
#[derive(Debug, Serialize, Deserialize)]
pub struct MembershipNotice {
    pub node: Node,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NoticeResponse {
    pub members: usize,
}
