//! # compdeps-cli
//!
//! The `compdeps` command-line tool.
//!
//! - `rewrite` - inject dependencies into rendered HTML from a file or stdin
//! - `serve` - serve the content cache of a registry manifest
//! - `check` - validate settings and a registry manifest
//!
//! Components come from a TOML registry manifest (see [`manifest`]).
//!
//! ```rust
//! use compdeps_cli::command::CommandRegistry;
//! use compdeps_cli::commands::register_builtin_commands;
//!
//! let mut registry = CommandRegistry::new();
//! register_builtin_commands(&mut registry);
//! assert_eq!(registry.list_commands(), vec!["check", "rewrite", "serve"]);
//! ```

pub mod command;
pub mod commands;
pub mod manifest;

pub use command::{load_settings, CommandRegistry, ManagementCommand};
pub use manifest::{Manifest, RegistrationReport};
