//! The `rewrite` command.
//!
//! Reads rendered HTML from a file or stdin, rewrites it against a registry
//! manifest, and writes the result to stdout or `--output`.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use compdeps_core::{DependencyStrategy, DepsError, Settings};
use compdeps_html::{RewriteOutput, Rewriter};

use crate::command::{registry_arg, ManagementCommand};
use crate::manifest::Manifest;

/// Rewrites one HTML document.
pub struct RewriteCommand;

/// Rewrites `html` against the components in `manifest`.
///
/// `strategy` defaults to the configured one.
pub fn rewrite_document(
    manifest: &Manifest,
    settings: &Settings,
    html: &str,
    strategy: Option<DependencyStrategy>,
) -> Result<RewriteOutput, DepsError> {
    let registry = Arc::new(manifest.build_registry(settings)?);
    let rewriter = Rewriter::from_registry(registry);
    Ok(rewriter.rewrite_with(html, strategy.unwrap_or(settings.default_strategy)))
}

#[async_trait]
impl ManagementCommand for RewriteCommand {
    fn name(&self) -> &'static str {
        "rewrite"
    }

    fn help(&self) -> &'static str {
        "Inject component dependencies into rendered HTML"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(registry_arg())
            .arg(
                clap::Arg::new("strategy")
                    .long("strategy")
                    .short('s')
                    .value_parser(DependencyStrategy::ALL.map(DependencyStrategy::as_str))
                    .help("Dependency strategy (defaults to the configured one)"),
            )
            .arg(
                clap::Arg::new("output")
                    .long("output")
                    .short('o')
                    .value_parser(clap::value_parser!(PathBuf))
                    .help("Write to this file instead of stdout"),
            )
            .arg(
                clap::Arg::new("input")
                    .value_parser(clap::value_parser!(PathBuf))
                    .help("HTML file to rewrite; stdin when omitted or '-'"),
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
        let manifest = Manifest::load(manifest_path)?;

        let strategy = matches
            .get_one::<String>("strategy")
            .map(|s| s.parse::<DependencyStrategy>())
            .transpose()?;

        let html = match matches.get_one::<PathBuf>("input") {
            Some(path) if path.as_os_str() != "-" => tokio::fs::read_to_string(path).await?,
            _ => {
                let mut buf = String::new();
                tokio::io::stdin().read_to_string(&mut buf).await?;
                buf
            }
        };

        let output = rewrite_document(&manifest, settings, &html, strategy)?;
        tracing::info!(
            css = output.css.len(),
            instructions = output.js.len(),
            skipped = output.errors.len(),
            "Rewrote document"
        );

        match matches.get_one::<PathBuf>("output") {
            Some(path) => tokio::fs::write(path, output.html.as_bytes()).await?,
            None => std::io::stdout().write_all(output.html.as_bytes())?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    const MANIFEST: &str = r#"
[[component]]
hash = "tbl_1a2b"
name = "table"

[[component.asset]]
kind = "css"
url = "/tbl.css"
"#;

    #[test]
    fn test_rewrite_document() {
        let manifest = Manifest::from_toml_str(MANIFEST, ".").unwrap();
        let output = rewrite_document(
            &manifest,
            &Settings::default(),
            r#"<!-- RENDERED "tbl_1a2b,x1" --><table></table>"#,
            None,
        )
        .unwrap();
        assert!(output
            .html
            .starts_with(r#"<link href="/tbl.css" rel="stylesheet"><table></table>"#));
    }

    #[test]
    fn test_explicit_strategy() {
        let manifest = Manifest::from_toml_str(MANIFEST, ".").unwrap();
        let output = rewrite_document(
            &manifest,
            &Settings::default(),
            r#"<!-- RENDERED "tbl_1a2b,x1" --><table></table>"#,
            Some(DependencyStrategy::Append),
        )
        .unwrap();
        assert_eq!(
            output.html,
            r#"<table></table><link href="/tbl.css" rel="stylesheet">"#
        );
    }

    #[tokio::test]
    async fn test_handle_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("components.toml");
        let input = dir.path().join("page.html");
        let output = dir.path().join("out.html");
        std::fs::write(&manifest, MANIFEST).unwrap();
        std::fs::write(&input, r#"<!-- RENDERED "tbl_1a2b,x1" -->"#).unwrap();

        let cmd = RewriteCommand.add_arguments(clap::Command::new("rewrite"));
        let args: Vec<OsString> = vec![
            "rewrite".into(),
            "--registry".into(),
            manifest.into_os_string(),
            "--strategy".into(),
            "simple".into(),
            "-o".into(),
            output.clone().into_os_string(),
            input.into_os_string(),
        ];
        let matches = cmd.get_matches_from(args);
        RewriteCommand
            .handle(&matches, &Settings::default())
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            r#"<link href="/tbl.css" rel="stylesheet">"#
        );
    }
}
