//! The compdeps HTTP application.
//!
//! [`DepsApp`] serves the content cache and, optionally, a router of pages
//! whose HTML responses are rewritten on the way out.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use axum::response::Html;
//! use axum::routing::get;
//! use axum::Router;
//! use compdeps_assets::AssetRegistry;
//! use compdeps_core::Settings;
//! use compdeps_http::DepsApp;
//!
//! # async fn example() -> Result<(), compdeps_core::DepsError> {
//! let registry = Arc::new(AssetRegistry::new(&Settings::default()));
//! let pages = Router::new().route("/", get(|| async { Html("<p>hi</p>") }));
//! DepsApp::new(registry).pages(pages).run("127.0.0.1:8000").await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::Router;
use tower_http::trace::TraceLayer;

use compdeps_assets::AssetRegistry;
use compdeps_core::DepsError;
use compdeps_html::Rewriter;

use crate::handlers::cache_router;
use crate::middleware::rewrite_html;

/// The fetch endpoint plus rewritten pages.
pub struct DepsApp {
    registry: Arc<AssetRegistry>,
    rewriter: Arc<Rewriter>,
    pages: Option<Router>,
}

impl DepsApp {
    /// Creates an app serving the registry's content cache.
    pub fn new(registry: Arc<AssetRegistry>) -> Self {
        let rewriter = Arc::new(Rewriter::from_registry(Arc::clone(&registry)));
        Self {
            registry,
            rewriter,
            pages: None,
        }
    }

    /// Adds page routes whose HTML responses are rewritten.
    #[must_use]
    pub fn pages(mut self, pages: Router) -> Self {
        self.pages = Some(match self.pages.take() {
            Some(existing) => existing.merge(pages),
            None => pages,
        });
        self
    }

    /// The rewriter applied to page responses.
    pub fn rewriter(&self) -> &Arc<Rewriter> {
        &self.rewriter
    }

    /// Builds the axum router.
    pub fn into_router(self) -> Router {
        let mut router = cache_router(&self.registry);
        if let Some(pages) = self.pages {
            router = router.merge(pages.layer(from_fn_with_state(self.rewriter, rewrite_html)));
        }
        router.layer(TraceLayer::new_for_http())
    }

    /// Serves the app on `addr` until the server stops.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if the address cannot be bound, or
    /// an `Io` error if the server fails.
    pub async fn run(self, addr: &str) -> Result<(), DepsError> {
        let debug = self.registry.settings().debug;
        let router = self.into_router();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| DepsError::Configuration(format!("Failed to bind to {addr}: {e}")))?;

        if debug {
            tracing::info!("Serving component dependencies at http://{addr}/");
        }

        axum::serve(listener, router).await?;
        Ok(())
    }
}

impl std::fmt::Debug for DepsApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepsApp")
            .field("components", &self.registry.len())
            .field("cached", &self.registry.cache().len())
            .field("has_pages", &self.pages.is_some())
            .finish()
    }
}
