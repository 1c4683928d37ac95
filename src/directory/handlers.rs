use axum::{Json, extract::Extension, http::StatusCode};
use std::sync::Arc;
use std::time::Duration;

use super::protocol::{
    KeyRequest, RegisterAllRequest, RegisterAllResponse, RegisterRequest, RegisterResponse,
    ReplicasResponse, UnregisterRequest, UnregisterResponse,
};
use super::store::ObjectDirectory;

pub async fn handle_register(
    Extension(directory): Extension<Arc<ObjectDirectory>>,
    Json(req): Json<RegisterRequest>,
) -> (StatusCode, Json<RegisterResponse>) {
    let added = directory.register(
        &req.key,
        req.replica,
        Duration::from_millis(req.timeout_ms),
    );
    if added {
        tracing::info!("Key {} now advertised by {}", req.key, req.replica);
    }
    (StatusCode::OK, Json(RegisterResponse { added }))
}

pub async fn handle_register_all(
    Extension(directory): Extension<Arc<ObjectDirectory>>,
    Json(req): Json<RegisterAllRequest>,
) -> (StatusCode, Json<RegisterAllResponse>) {
    let keys = req.registrations.len();
    directory.register_all(req.registrations, Duration::from_millis(req.timeout_ms));
    tracing::info!("Absorbed registrations for {} transferred keys", keys);
    (StatusCode::OK, Json(RegisterAllResponse { keys }))
}

pub async fn handle_unregister(
    Extension(directory): Extension<Arc<ObjectDirectory>>,
    Json(req): Json<UnregisterRequest>,
) -> (StatusCode, Json<UnregisterResponse>) {
    let existed = directory.unregister(&req.key, &req.replica);
    (StatusCode::OK, Json(UnregisterResponse { existed }))
}

pub async fn handle_unregister_all(
    Extension(directory): Extension<Arc<ObjectDirectory>>,
    Json(req): Json<KeyRequest>,
) -> (StatusCode, Json<ReplicasResponse>) {
    let replicas = directory.unregister_all(&req.key);
    tracing::debug!("Withdrew key {} ({} advertisers)", req.key, replicas.len());
    (StatusCode::OK, Json(ReplicasResponse { replicas }))
}

pub async fn handle_get(
    Extension(directory): Extension<Arc<ObjectDirectory>>,
    Json(req): Json<KeyRequest>,
) -> (StatusCode, Json<ReplicasResponse>) {
    let replicas = directory.get(&req.key);
    (StatusCode::OK, Json(ReplicasResponse { replicas }))
}
