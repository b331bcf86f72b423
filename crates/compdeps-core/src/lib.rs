//! # compdeps-core
//!
//! Core types, settings, and error types shared by every compdeps crate.
//! This crate has no dependency on the other workspace members.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Settings struct and dependency strategies
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{DepsError, DepsResult, MarkerFormatError};
pub use settings::{DependencyStrategy, Settings};
