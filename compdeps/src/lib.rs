//! # compdeps
//!
//! Component dependency management for server-rendered HTML.
//!
//! Components render HTML with a marker comment. The rewriter collects the
//! JS/CSS of every rendered component, deduplicates it, and injects it into
//! the response. The client loader then makes sure each dependency loads
//! exactly once and initializes component instances after their scripts.
//!
//! This is the meta-crate that re-exports the sub-crates. Depend on it for
//! everything, or on individual crates for finer-grained control.

/// Settings, errors, and logging.
pub use compdeps_core as core;

/// Asset registry, content cache, resolver, and loader payloads.
pub use compdeps_assets as assets;

/// Marker parsing and the dependency-injecting HTML rewriter.
#[cfg(feature = "html")]
pub use compdeps_html as html;

/// Fetch endpoint and response rewriting middleware.
#[cfg(feature = "http")]
pub use compdeps_http as http;

/// Client-side dependency loader.
#[cfg(feature = "client")]
pub use compdeps_client as client;

/// The `compdeps` command-line tool.
#[cfg(feature = "cli")]
pub use compdeps_cli as cli;

/// Testing utilities.
#[cfg(feature = "testing")]
pub use compdeps_test as test;

/// Third-party crates re-exported for convenience.
pub mod deps {
    pub use axum;
    pub use serde;
    pub use serde_json;
    pub use tokio;
    pub use tracing;
    pub use tracing_subscriber;
}

/// The types most applications need.
pub mod prelude {
    pub use compdeps_assets::{AssetKind, AssetRegistry, AssetSpec, Payload};
    pub use compdeps_core::{DependencyStrategy, DepsError, DepsResult, Settings};

    #[cfg(feature = "html")]
    pub use compdeps_html::{RewriteOutput, Rewriter};

    #[cfg(feature = "http")]
    pub use compdeps_http::DepsApp;

    #[cfg(feature = "client")]
    pub use compdeps_client::{CallOutcome, Document, Loader};
}
