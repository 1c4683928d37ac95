use serde::{Deserialize, Serialize};

/// Internal endpoint for reading a peer's local blob. Replies with the raw
/// bytes, or 404 when the peer holds no copy.
pub const ENDPOINT_FETCH_BLOB: &str = "/internal/blob";

#[derive(Debug, Serialize, Deserialize)]
pub struct FetchBlobRequest {
    pub key: String,
}
