//! # compdeps-http
//!
//! The HTTP surface of compdeps, built on axum.
//!
//! ## Modules
//!
//! - [`handlers`] - The fetch endpoint serving inline content from the cache
//! - [`middleware`] - Rewriting `text/html` responses with the dependency rewriter
//! - [`server`] - [`DepsApp`], combining both into a runnable router

pub mod handlers;
pub mod middleware;
pub mod server;

pub use handlers::{cache_router, ErrorResponse};
pub use middleware::{rewrite_html, STRATEGY_HEADER};
pub use server::DepsApp;
