//! Response rewriting middleware.
//!
//! [`rewrite_html`] runs every `text/html` response through a [`Rewriter`].
//! Install it with `axum::middleware::from_fn_with_state`. Clients that
//! fetch fragments send [`STRATEGY_HEADER`] to pick a strategy per request.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::{header, HeaderMap, StatusCode};
use http_body_util::BodyExt;

use compdeps_core::DependencyStrategy;
use compdeps_html::Rewriter;

/// Request header overriding the rewrite strategy.
pub const STRATEGY_HEADER: &str = "x-compdeps-strategy";

/// Rewrites HTML responses so each dependency loads exactly once.
///
/// Non-HTML and non-UTF-8 responses pass through unchanged.
pub async fn rewrite_html(
    State(rewriter): State<Arc<Rewriter>>,
    request: Request,
    next: Next,
) -> Response {
    let strategy =
        requested_strategy(request.headers()).unwrap_or(rewriter.settings().default_strategy);
    let response = next.run(request).await;
    if strategy == DependencyStrategy::Ignore || !is_html(response.headers()) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read response body");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
        }
    };
    let Ok(html) = std::str::from_utf8(&bytes) else {
        return Response::from_parts(parts, Body::from(bytes));
    };

    let output = rewriter.rewrite_with(html, strategy);
    if !output.errors.is_empty() {
        tracing::debug!(errors = output.errors.len(), "Rewrote response with skipped components");
    }
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(output.html))
}

fn requested_strategy(headers: &HeaderMap) -> Option<DependencyStrategy> {
    let value = headers.get(STRATEGY_HEADER)?;
    match value.to_str().ok().map(str::parse::<DependencyStrategy>) {
        Some(Ok(strategy)) => Some(strategy),
        _ => {
            tracing::warn!(value = ?value, "Ignoring invalid {STRATEGY_HEADER} header");
            None
        }
    }
}

fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("text/html"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_requested_strategy() {
        let mut headers = HeaderMap::new();
        assert_eq!(requested_strategy(&headers), None);
        headers.insert(STRATEGY_HEADER, HeaderValue::from_static("fragment"));
        assert_eq!(requested_strategy(&headers), Some(DependencyStrategy::Fragment));
        headers.insert(STRATEGY_HEADER, HeaderValue::from_static("bogus"));
        assert_eq!(requested_strategy(&headers), None);
    }

    #[test]
    fn test_is_html() {
        let mut headers = HeaderMap::new();
        assert!(!is_html(&headers));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("Text/HTML; charset=utf-8"));
        assert!(is_html(&headers));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(!is_html(&headers));
    }
}
