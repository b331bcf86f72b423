//! # compdeps-assets
//!
//! The server-side data model for component dependencies.
//!
//! ## Modules
//!
//! - [`asset`] - [`ComponentAsset`], its kind, source, and render attributes
//! - [`cache`] - Content-addressed cache for inline JS/CSS
//! - [`registry`] - Write-once [`AssetRegistry`] of component definitions
//! - [`resolver`] - Pure lookups from component hash to assets
//! - [`tag`] - Rendering assets as `<script>`, `<link>`, and `<style>` tags
//! - [`payload`] - Loader instructions emitted for the client runtime

pub mod asset;
pub mod cache;
pub mod payload;
pub mod registry;
pub mod resolver;
pub mod tag;

pub use asset::{AssetKind, AssetSource, AssetSpec, Attr, ComponentAsset};
pub use cache::ContentCache;
pub use payload::{Instruction, Payload};
pub use registry::{AssetRegistry, ComponentDefinition, Registration};
pub use resolver::Resolver;
