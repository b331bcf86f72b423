//! # compdeps-html
//!
//! Server-side HTML post-processing: find rendering markers, resolve the
//! components they name, and place each JS/CSS dependency into the output
//! exactly once.
//!
//! ## Modules
//!
//! - [`scan`] - Tokenizes markup, skipping raw text and attribute values
//! - [`marker`] - Parses rendering markers out of those comments
//! - [`rewriter`] - Replaces markers with style tags and a loader payload
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use compdeps_assets::{AssetKind, AssetRegistry, AssetSpec};
//! use compdeps_html::Rewriter;
//!
//! let registry = Arc::new(AssetRegistry::default());
//! registry
//!     .register("tbl_1a2b", "table", vec![AssetSpec::url(AssetKind::Style, "/tbl.css")])
//!     .unwrap();
//!
//! let rewriter = Rewriter::from_registry(registry);
//! let out = rewriter.rewrite(r#"<head></head><!-- RENDERED "tbl_1a2b,x1" --><table></table>"#);
//! assert!(out.html.contains(r#"<link href="/tbl.css""#));
//! assert!(!out.html.contains("RENDERED"));
//! ```

pub mod marker;
pub mod rewriter;
pub mod scan;

pub use compdeps_core::DependencyStrategy;
pub use marker::{parse_markers, MarkerParser, Markers, RenderMarker};
pub use rewriter::{RewriteOutput, Rewriter};
