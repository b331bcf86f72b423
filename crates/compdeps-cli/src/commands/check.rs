//! The `check` command.
//!
//! Validates the settings and a registry manifest, reports how many
//! components and assets it defines, and fails on any error-level finding
//! (a conflicting re-registration, an unreadable inline file, bad settings).

use std::path::PathBuf;

use async_trait::async_trait;

use compdeps_assets::AssetRegistry;
use compdeps_core::{DepsError, Settings};

use crate::command::{registry_arg, ManagementCommand};
use crate::manifest::Manifest;

/// Checks settings and a registry manifest.
pub struct CheckCommand;

/// One finding.
#[derive(Debug, Clone)]
pub struct CheckMessage {
    /// Severity.
    pub level: CheckLevel,
    /// What is wrong.
    pub msg: String,
    /// How to fix it, if known.
    pub hint: Option<String>,
    /// Stable identifier, e.g. `registry.E002`.
    pub id: String,
}

/// Finding severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckLevel {
    /// Informational.
    Info,
    /// Possibly a problem.
    Warning,
    /// Must be fixed.
    Error,
}

impl std::fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Counts reported by a check run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManifestSummary {
    /// Components registered.
    pub components: usize,
    /// Assets declared.
    pub assets: usize,
    /// Inline assets declared.
    pub inline: usize,
}

/// Runs every check against `settings` and `manifest`.
pub fn run_checks(
    settings: &Settings,
    manifest: &Manifest,
) -> (Vec<CheckMessage>, ManifestSummary) {
    let mut messages = Vec::new();

    if let Err(e) = settings.validate() {
        messages.push(CheckMessage {
            level: CheckLevel::Error,
            msg: e.to_string(),
            hint: None,
            id: "settings.E001".to_string(),
        });
    }

    if settings.loader_script_url.is_none() && settings.default_strategy.uses_loader() {
        messages.push(CheckMessage {
            level: CheckLevel::Info,
            msg: format!(
                "The '{}' strategy emits loader calls but no loader_script_url is set",
                settings.default_strategy
            ),
            hint: Some("Include the loader runtime in your base template".to_string()),
            id: "settings.I001".to_string(),
        });
    }

    let registry = AssetRegistry::new(settings);
    let report = manifest.register_all(&registry);
    for err in report.errors {
        let id = match err {
            DepsError::RegistryConflict(_) => "registry.E002",
            _ => "registry.E001",
        };
        messages.push(CheckMessage {
            level: CheckLevel::Error,
            msg: err.to_string(),
            hint: None,
            id: id.to_string(),
        });
    }

    for entry in manifest.component.iter().filter(|c| c.asset.is_empty()) {
        messages.push(CheckMessage {
            level: CheckLevel::Warning,
            msg: format!("Component '{}' ({}) declares no assets", entry.name, entry.hash),
            hint: Some(
                "Remove it from the manifest unless markers for it are expected".to_string(),
            ),
            id: "registry.W001".to_string(),
        });
    }

    let summary = ManifestSummary {
        components: registry.len(),
        assets: manifest.asset_count(),
        inline: manifest.inline_count(),
    };
    (messages, summary)
}

#[async_trait]
impl ManagementCommand for CheckCommand {
    fn name(&self) -> &'static str {
        "check"
    }

    fn help(&self) -> &'static str {
        "Validate settings and a registry manifest"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(registry_arg())
    }

    async fn handle(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), DepsError> {
        let manifest_path = matches
            .get_one::<PathBuf>("registry")
            .ok_or_else(|| DepsError::InvalidInput("--registry is required".to_string()))?;
        let manifest = Manifest::load(manifest_path)?;
        let (messages, summary) = run_checks(settings, &manifest);

        println!(
            "{} component(s), {} asset(s) ({} inline)",
            summary.components, summary.assets, summary.inline
        );

        for msg in &messages {
            let hint_text = msg
                .hint
                .as_ref()
                .map_or(String::new(), |h| format!("\n\tHINT: {h}"));
            tracing::warn!("{} ({}): {}{}", msg.level, msg.id, msg.msg, hint_text);
        }

        let errors = messages
            .iter()
            .filter(|m| m.level >= CheckLevel::Error)
            .count();
        if errors > 0 {
            return Err(DepsError::Configuration(format!(
                "Check found {errors} error(s)"
            )));
        }

        tracing::info!("Check identified {} issue(s), none blocking", messages.len());
        Ok(())
    }
}
