//! The fetch endpoint.
//!
//! Inline JS/CSS registered with a component is served at
//! `GET /<url_prefix>/cache/<key>.<js|css>/`, with or without the trailing
//! slash. Unknown keys and unknown script types are 404.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use http::{header, StatusCode};

use compdeps_assets::{AssetRegistry, ContentCache};
use compdeps_core::DepsError;

/// Converts a [`DepsError`] into a plain-text response with its status code.
#[derive(Debug)]
pub struct ErrorResponse(pub DepsError);

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, self.0.to_string()).into_response()
    }
}

impl From<DepsError> for ErrorResponse {
    fn from(err: DepsError) -> Self {
        Self(err)
    }
}

/// Builds the router serving the registry's content cache.
pub fn cache_router(registry: &AssetRegistry) -> Router {
    let route = registry.settings().cache_route();
    Router::new()
        .route(&format!("{route}/"), get(serve_cached))
        .route(&route, get(serve_cached))
        .with_state(registry.cache().clone())
}

async fn serve_cached(
    State(cache): State<ContentCache>,
    Path(file): Path<String>,
) -> Result<Response, ErrorResponse> {
    let (kind, content) = cache.get_file(&file).map_err(|e| {
        tracing::debug!(file = %file, error = %e, "Cache lookup failed");
        ErrorResponse(e)
    })?;
    Ok((
        [(header::CONTENT_TYPE, kind.content_type())],
        content.to_string(),
    )
        .into_response())
}
