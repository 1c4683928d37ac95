//! HTTP surface of a node: internal peer RPCs plus the public client API.

use axum::{
    Router,
    extract::Extension,
    routing::{get, post, put},
};
use std::sync::Arc;

use super::handlers::{handle_get, handle_lookup, handle_remove, handle_status, handle_store};
use super::protocol::{ENDPOINT_LOOKUP, ENDPOINT_OBJECT, ENDPOINT_STATUS};
use super::tapestry::Tapestry;
use crate::blob::handlers::handle_fetch_blob;
use crate::blob::protocol::ENDPOINT_FETCH_BLOB;
use crate::directory::handlers::{
    handle_get as handle_directory_get, handle_register, handle_register_all, handle_unregister,
    handle_unregister_all,
};
use crate::directory::protocol::{
    ENDPOINT_GET, ENDPOINT_REGISTER, ENDPOINT_REGISTER_ALL, ENDPOINT_UNREGISTER,
    ENDPOINT_UNREGISTER_ALL,
};
use crate::overlay::OverlayService;
use crate::overlay::handlers::{handle_hello, handle_notify_join, handle_notify_leave};
use crate::overlay::protocol::{ENDPOINT_HELLO, ENDPOINT_NOTIFY_JOIN, ENDPOINT_NOTIFY_LEAVE};

pub fn build_router(tapestry: Arc<Tapestry>, overlay: OverlayService) -> Router {
    Router::new()
        // Directory RPCs served when this node is a key's root
        .route(ENDPOINT_REGISTER, post(handle_register))
        .route(ENDPOINT_REGISTER_ALL, post(handle_register_all))
        .route(ENDPOINT_UNREGISTER, post(handle_unregister))
        .route(ENDPOINT_UNREGISTER_ALL, post(handle_unregister_all))
        .route(ENDPOINT_GET, post(handle_directory_get))
        .route(ENDPOINT_FETCH_BLOB, post(handle_fetch_blob))
        // Membership
        .route(ENDPOINT_HELLO, post(handle_hello))
        .route(ENDPOINT_NOTIFY_JOIN, post(handle_notify_join))
        .route(ENDPOINT_NOTIFY_LEAVE, post(handle_notify_leave))
        // Client API
        .route(
            ENDPOINT_OBJECT,
            put(handle_store).get(handle_get).delete(handle_remove),
        )
        .route(ENDPOINT_LOOKUP, get(handle_lookup))
        .route(ENDPOINT_STATUS, get(handle_status))
        .layer(Extension(tapestry.directory().clone()))
        .layer(Extension(tapestry.blobs().clone()))
        .layer(Extension(overlay))
        .layer(Extension(tapestry))
}
