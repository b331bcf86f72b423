//! Logging integration for compdeps.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and spans for rewrite passes.

use crate::settings::{DependencyStrategy, Settings};

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level`. In debug mode a pretty,
/// human-readable format is used; otherwise structured JSON. Installing a
/// second subscriber is silently ignored.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for one rewrite pass.
///
/// # Examples
///
/// ```
/// use compdeps_core::logging::rewrite_span;
/// use compdeps_core::DependencyStrategy;
///
/// let span = rewrite_span(DependencyStrategy::Document, 512);
/// let _guard = span.enter();
/// tracing::debug!("rewriting");
/// ```
pub fn rewrite_span(strategy: DependencyStrategy, html_len: usize) -> tracing::Span {
    tracing::debug_span!("rewrite", strategy = %strategy, bytes = html_len)
}
