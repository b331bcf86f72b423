//! The assembled `compdeps` command line, driven with real files.

use std::ffi::OsString;
use std::path::Path;

use compdeps_cli::commands::register_builtin_commands;
use compdeps_cli::{load_settings, CommandRegistry};
use compdeps_core::DepsError;

const MANIFEST: &str = r#"
[[component]]
hash = "tbl_1a2b"
name = "table"

[[component.asset]]
kind = "css"
url = "/tbl.css"

[[component.asset]]
kind = "js"
inline_file = "tbl.js"
attrs = { defer = true }
"#;

const CONFLICT: &str = r#"
[[component]]
hash = "tbl_1a2b"
name = "table"

[[component.asset]]
kind = "css"
url = "/tbl.css"

[[component]]
hash = "tbl_1a2b"
name = "table"

[[component.asset]]
kind = "css"
url = "/other.css"
"#;

fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry);
    registry
}

async fn run(args: &[&OsString], settings_file: Option<&Path>) -> Result<(), DepsError> {
    let registry = registry();
    let matches = registry
        .build_cli()
        .try_get_matches_from(
            std::iter::once(&OsString::from("compdeps")).chain(args.iter().copied()),
        )
        .map_err(|e| DepsError::InvalidInput(e.to_string()))?;
    let settings = load_settings(settings_file)?;
    registry.execute(&matches, &settings).await
}

#[tokio::test]
async fn test_rewrite_uses_settings_file_strategy() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tbl.js"), "initTable();").unwrap();
    let manifest = dir.path().join("components.toml");
    std::fs::write(&manifest, MANIFEST).unwrap();
    let settings = dir.path().join("settings.toml");
    std::fs::write(&settings, "default_strategy = \"append\"\n").unwrap();
    let input = dir.path().join("page.html");
    std::fs::write(&input, r#"<!-- RENDERED "tbl_1a2b,x1" --><table></table>"#).unwrap();
    let output = dir.path().join("out.html");

    let args: Vec<OsString> = vec![
        "rewrite".into(),
        "-r".into(),
        manifest.into_os_string(),
        "-o".into(),
        output.clone().into_os_string(),
        input.into_os_string(),
    ];
    let refs: Vec<&OsString> = args.iter().collect();
    run(&refs, Some(&settings)).await.unwrap();

    let html = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        html,
        r#"<table></table><link href="/tbl.css" rel="stylesheet"><script defer>initTable();</script>"#
    );
}

#[tokio::test]
async fn test_check_fails_on_conflicting_registration() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("components.toml");
    std::fs::write(&manifest, CONFLICT).unwrap();

    let args: Vec<OsString> = vec!["check".into(), "--registry".into(), manifest.into_os_string()];
    let refs: Vec<&OsString> = args.iter().collect();
    let err = run(&refs, None).await.unwrap_err();
    assert!(matches!(err, DepsError::Configuration(_)));
}

#[tokio::test]
async fn test_check_passes_on_valid_manifest() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tbl.js"), "initTable();").unwrap();
    let manifest = dir.path().join("components.toml");
    std::fs::write(&manifest, MANIFEST).unwrap();

    let args: Vec<OsString> = vec!["check".into(), "--registry".into(), manifest.into_os_string()];
    let refs: Vec<&OsString> = args.iter().collect();
    run(&refs, None).await.unwrap();
}

#[tokio::test]
async fn test_missing_registry_is_rejected() {
    let args: Vec<OsString> = vec!["rewrite".into()];
    let refs: Vec<&OsString> = args.iter().collect();
    assert!(run(&refs, None).await.is_err());
}
