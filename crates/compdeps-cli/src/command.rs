//! Command framework for the `compdeps` binary.
//!
//! Each subcommand implements [`ManagementCommand`]; [`CommandRegistry`]
//! assembles them into one clap `Command` and dispatches on the parsed
//! matches.
//!
//! ## Defining a Command
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use compdeps_cli::command::ManagementCommand;
//! use compdeps_core::{DepsError, Settings};
//!
//! struct HelloCommand;
//!
//! #[async_trait]
//! impl ManagementCommand for HelloCommand {
//!     fn name(&self) -> &'static str { "hello" }
//!     fn help(&self) -> &'static str { "Say hello" }
//!
//!     async fn handle(
//!         &self,
//!         _matches: &clap::ArgMatches,
//!         _settings: &Settings,
//!     ) -> Result<(), DepsError> {
//!         println!("hello");
//!         Ok(())
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use compdeps_core::{settings_loader, DepsError, Settings};

/// A subcommand of the `compdeps` binary.
#[async_trait]
pub trait ManagementCommand: Send + Sync {
    /// The subcommand name.
    fn name(&self) -> &'static str;

    /// One-line help text.
    fn help(&self) -> &'static str;

    /// Adds the command's arguments. The default adds none.
    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Runs the command.
    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings)
        -> Result<(), DepsError>;
}

/// The registered subcommands.
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn ManagementCommand>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Registers a command, replacing any with the same name.
    pub fn register(&mut self, command: Box<dyn ManagementCommand>) {
        let name = command.name().to_string();
        self.commands.insert(name, command);
    }

    /// The command named `name`.
    pub fn get(&self, name: &str) -> Option<&dyn ManagementCommand> {
        self.commands.get(name).map(AsRef::as_ref)
    }

    /// Sorted command names.
    pub fn list_commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Builds the top-level clap `Command`, including the global
    /// `--settings` option.
    pub fn build_cli(&self) -> clap::Command {
        let mut app = clap::Command::new("compdeps")
            .about("Component dependency rewriting and serving")
            .subcommand_required(true)
            .arg(
                clap::Arg::new("settings")
                    .long("settings")
                    .global(true)
                    .value_parser(clap::value_parser!(PathBuf))
                    .help("Settings file (TOML, or JSON by extension)"),
            );

        let mut entries: Vec<_> = self.commands.values().collect();
        entries.sort_by_key(|cmd| cmd.name());

        for cmd in entries {
            let subcmd = clap::Command::new(cmd.name()).about(cmd.help());
            app = app.subcommand(cmd.add_arguments(subcmd));
        }

        app
    }

    /// Dispatches to the subcommand named in `matches`.
    pub async fn execute(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), DepsError> {
        let (name, sub_matches) = matches
            .subcommand()
            .ok_or_else(|| DepsError::Configuration("No subcommand specified".to_string()))?;

        let cmd = self
            .get(name)
            .ok_or_else(|| DepsError::Configuration(format!("Unknown command: {name}")))?;

        cmd.handle(sub_matches, settings).await
    }
}

/// Loads settings from `--settings` if given, else from the environment.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, DepsError> {
    match path {
        Some(path) => settings_loader::from_file_with_env(path),
        None => settings_loader::from_env(),
    }
}

/// The required `--registry` option shared by every built-in command.
pub(crate) fn registry_arg() -> clap::Arg {
    clap::Arg::new("registry")
        .long("registry")
        .short('r')
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
        .help("Registry manifest (TOML)")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoCommand;

    #[async_trait]
    impl ManagementCommand for EchoCommand {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn help(&self) -> &'static str {
            "Echo test command"
        }

        fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
            cmd.arg(clap::Arg::new("fail").long("fail").action(clap::ArgAction::SetTrue))
        }

        async fn handle(
            &self,
            matches: &clap::ArgMatches,
            _settings: &Settings,
        ) -> Result<(), DepsError> {
            if matches.get_flag("fail") {
                return Err(DepsError::InvalidInput("asked to fail".to_string()));
            }
            Ok(())
        }
    }

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry.register(Box::new(EchoCommand));
        registry
    }

    #[test]
    fn test_register_and_list() {
        let registry = registry();
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
        assert_eq!(registry.list_commands(), vec!["echo"]);
        assert!(registry.get("missing").is_none());
    }

    #[tokio::test]
    async fn test_execute_dispatches() {
        let registry = registry();
        let settings = Settings::default();

        let matches = registry.build_cli().get_matches_from(["compdeps", "echo"]);
        assert!(registry.execute(&matches, &settings).await.is_ok());

        let matches = registry
            .build_cli()
            .get_matches_from(["compdeps", "echo", "--fail"]);
        assert!(registry.execute(&matches, &settings).await.is_err());
    }

    #[test]
    fn test_global_settings_flag() {
        let matches = registry()
            .build_cli()
            .get_matches_from(["compdeps", "echo", "--settings", "conf.toml"]);
        let path = matches.get_one::<PathBuf>("settings").unwrap();
        assert_eq!(path, &PathBuf::from("conf.toml"));
    }

    #[test]
    fn test_load_settings_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compdeps.toml");
        std::fs::write(&path, "url_prefix = \"deps\"\n").unwrap();
        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.url_prefix, "deps");
        assert!(load_settings(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
