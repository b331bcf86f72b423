//! The `serve` command.
//!
//! Serves the content cache of a registry manifest over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use compdeps_core::{DepsError, Settings};
use compdeps_http::DepsApp;

use crate::command::{registry_arg, ManagementCommand};
use crate::manifest::Manifest;

/// Starts the fetch endpoint server.
///
/// Binds to `127.0.0.1:8000` unless `--addr` says otherwise.
pub struct ServeCommand;

#[async_trait]
impl ManagementCommand for ServeCommand {
    fn name(&self) -> &'static str {
        "serve"
    }

    fn help(&self) -> &'static str {
        "Serve cached inline JS/CSS for a registry manifest"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(registry_arg()).arg(
            clap::Arg::new("addr")
                .long("addr")
                .default_value("127.0.0.1:8000")
                .help("Address to bind to"),
        )
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), DepsError> {
        let manifest_path = matches
            .get_one::<PathBuf>("registry")
            .ok_or_else(|| DepsError::InvalidInput("--registry is required".to_string()))?;
        let addr = matches
            .get_one::<String>("addr")
            .map_or("127.0.0.1:8000", String::as_str);

        let registry = Manifest::load(manifest_path)?.build_registry(settings)?;
        tracing::info!(
            components = registry.len(),
            cached = registry.cache().len(),
            "Starting server at http://{addr}/{}/cache/",
            settings.url_prefix.trim_matches('/')
        );

        DepsApp::new(Arc::new(registry)).run(addr).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments() {
        let cmd = ServeCommand.add_arguments(clap::Command::new("serve"));
        let matches = cmd.get_matches_from(["serve", "--registry", "c.toml"]);
        assert_eq!(
            matches.get_one::<String>("addr").map(String::as_str),
            Some("127.0.0.1:8000")
        );
        assert_eq!(
            matches.get_one::<PathBuf>("registry"),
            Some(&PathBuf::from("c.toml"))
        );
    }

    #[test]
    fn test_registry_required() {
        let cmd = ServeCommand.add_arguments(clap::Command::new("serve"));
        assert!(cmd.try_get_matches_from(["serve"]).is_err());
    }
}
