use axum::{
    body::{Body, Bytes},
    extract::{RawQuery, State},
    http::{header, HeaderMap, Method, Uri},
    response::Response,
    routing::any,
    Router,
};
use std::sync::Arc;

use crate::web::{AppError, AppState};

pub fn create_proxy_router() -> Router<Arc<AppState>> {
    Router::new().route("/{*path}", any(proxy_handler))
}

/// Relays the request to `{base_url}/{path}` and mirrors the upstream status and body.
///
/// The nested router sees the URI with the mount prefix stripped. Its path is still
/// percent-encoded, and it is forwarded in that form.
async fn proxy_handler(
    State(app_state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let path = uri.path().trim_start_matches('/');
    let forwarded = app_state
        .timocom
        .forward(
            method,
            path,
            query.as_deref(),
            headers.get(header::CONTENT_TYPE),
            body,
        )
        .await?;

    let mut builder = Response::builder().status(forwarded.status);
    if let Some(content_type) = forwarded.content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder
        .body(Body::from(forwarded.body))
        .map_err(|e| AppError::InternalServerError(format!("Failed to build proxy response: {e}")))
}
