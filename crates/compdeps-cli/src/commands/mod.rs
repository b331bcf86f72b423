//! Built-in commands.

pub mod check;
pub mod rewrite;
pub mod serve;

pub use check::CheckCommand;
pub use rewrite::RewriteCommand;
pub use serve::ServeCommand;

use crate::command::CommandRegistry;

/// Registers `rewrite`, `serve`, and `check`.
pub fn register_builtin_commands(registry: &mut CommandRegistry) {
    registry.register(Box::new(RewriteCommand));
    registry.register(Box::new(ServeCommand));
    registry.register(Box::new(CheckCommand));
}
