use axum::{Json, extract::Extension, http::StatusCode};

use super::protocol::{HelloRequest, HelloResponse, MembershipNotice, NoticeResponse};
use super::service::OverlayService;

pub async fn handle_hello(
    Extension(overlay): Extension<OverlayService>,
    Json(req): Json<HelloRequest>,
) -> (StatusCode, Json<HelloResponse>) {
    let local = overlay.local_node();

    if overlay.is_closed() {
        tracing::warn!("Rejecting hello from {}: node is leaving", req.node);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HelloResponse {
                node: local,
                members: vec![],
            }),
        );
    }

    let members = overlay.handle_join(req.node);
    (StatusCode::OK, Json(HelloResponse { node: local, members }))
}

pub async fn handle_notify_join(
    Extension(overlay): Extension<OverlayService>,
    Json(req): Json<MembershipNotice>,
) -> (StatusCode, Json<NoticeResponse>) {
    overlay.handle_join(req.node);
    (
        StatusCode::OK,
        Json(NoticeResponse {
            members: overlay.members().len(),
        }),
    )
}

pub async fn handle_notify_leave(
    Extension(overlay): Extension<OverlayService>,
    Json(req): Json<MembershipNotice>,
) -> (StatusCode, Json<NoticeResponse>) {
    overlay.handle_leave(req.node);
    (
        StatusCode::OK,
        Json(NoticeResponse {
            members: overlay.members().len(),
        }),
    )
}
