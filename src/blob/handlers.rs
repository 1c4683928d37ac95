use axum::{Json, extract::Extension, http::StatusCode};
use std::sync::Arc;

use super::protocol::FetchBlobRequest;
use super::store::BlobStore;

pub async fn handle_fetch_blob(
    Extension(blobs): Extension<Arc<BlobStore>>,
    Json(req): Json<FetchBlobRequest>,
) -> (StatusCode, Vec<u8>) {
    match blobs.get(&req.key) {
        Some(data) => {
            tracing::debug!("Serving blob {} ({} bytes)", req.key, data.len());
            (StatusCode::OK, data)
        }
        None => (StatusCode::NOT_FOUND, Vec::new()),
    }
}
