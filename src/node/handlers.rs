use axum::{
    Json,
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
};
use std::sync::Arc;

use super::protocol::{
    ErrorResponse, LookupResponse, RemoveResponse, StatusResponse, StoreResponse,
};
use super::tapestry::Tapestry;
use crate::error::TapestryError;
use crate::overlay::OverlayService;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(e: TapestryError) -> ApiError {
    let status = match &e {
        e if e.is_not_found() => StatusCode::NOT_FOUND,
        TapestryError::Closed => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

pub async fn handle_store(
    Extension(tapestry): Extension<Arc<Tapestry>>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<StoreResponse>), ApiError> {
    let ready = tapestry.store(&key, body.to_vec()).await.map_err(|e| {
        tracing::error!("Failed to store {}: {}", key, e);
        api_error(e)
    })?;

    tracing::debug!("Stored {} ({} bytes)", key, body.len());
    Ok((
        StatusCode::OK,
        Json(StoreResponse {
            key,
            published: ready.is_ready(),
        }),
    ))
}

pub async fn handle_get(
    Extension(tapestry): Extension<Arc<Tapestry>>,
    Path(key): Path<String>,
) -> Result<Vec<u8>, ApiError> {
    tapestry.get(&key).await.map_err(|e| {
        tracing::debug!("Get of {} failed: {}", key, e);
        api_error(e)
    })
}

pub async fn handle_remove(
    Extension(tapestry): Extension<Arc<Tapestry>>,
    Path(key): Path<String>,
) -> (StatusCode, Json<RemoveResponse>) {
    let existed = tapestry.remove(&key);
    let status = if existed {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    (status, Json(RemoveResponse { existed }))
}

pub async fn handle_lookup(
    Extension(tapestry): Extension<Arc<Tapestry>>,
    Path(key): Path<String>,
) -> Result<Json<LookupResponse>, ApiError> {
    let replicas = tapestry.lookup(&key).await.map_err(api_error)?;
    Ok(Json(LookupResponse { key, replicas }))
}

pub async fn handle_status(
    Extension(tapestry): Extension<Arc<Tapestry>>,
    Extension(overlay): Extension<OverlayService>,
) -> Json<StatusResponse> {
    let mut blobs = tapestry.blobs().keys();
    blobs.sort();

    Json(StatusResponse {
        node: tapestry.local_node(),
        members: overlay.members(),
        directory_keys: tapestry.directory().key_count(),
        directory_registrations: tapestry.directory().registration_count(),
        blobs,
    })
}
