//! Registry manifests.
//!
//! The CLI reads component definitions from a TOML file:
//!
//! ```toml
//! [[component]]
//! hash = "tbl_1a2b"
//! name = "table"
//!
//! [[component.asset]]
//! kind = "css"
//! url = "/static/tbl.css"
//!
//! [[component.asset]]
//! kind = "js"
//! inline_file = "tbl.js"
//! attrs = { defer = true, type = "module" }
//! ```
//!
//! Each asset has exactly one of `url`, `inline`, or `inline_file`.
//! `inline_file` paths are relative to the manifest's directory. In `attrs`,
//! `true` renders a valueless attribute and `false` omits it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use compdeps_assets::{AssetKind, AssetRegistry, AssetSpec, Registration};
use compdeps_core::{DepsError, Settings};

/// A parsed manifest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Component entries, in file order.
    #[serde(default)]
    pub component: Vec<ComponentEntry>,
    #[serde(skip)]
    base_dir: PathBuf,
}

/// One `[[component]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentEntry {
    /// Component-class hash used in markers.
    pub hash: String,
    /// Human-readable name.
    pub name: String,
    /// Assets, in declaration order.
    #[serde(default)]
    pub asset: Vec<AssetEntry>,
}

/// One `[[component.asset]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetEntry {
    /// `js` or `css`.
    pub kind: AssetKind,
    /// External URL.
    pub url: Option<String>,
    /// Inline source text.
    pub inline: Option<String>,
    /// File holding inline source text.
    pub inline_file: Option<PathBuf>,
    /// Extra attributes for the rendered tag.
    #[serde(default)]
    pub attrs: BTreeMap<String, AttrValue>,
}

/// An attribute value in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// `true` for a valueless attribute, `false` to omit it.
    Flag(bool),
    /// A string value.
    Text(String),
}

/// What registering a manifest did.
#[derive(Debug, Default)]
pub struct RegistrationReport {
    /// Newly registered components.
    pub inserted: usize,
    /// Components identical to an earlier entry.
    pub unchanged: usize,
    /// Entries that could not be registered.
    pub errors: Vec<DepsError>,
}

impl Manifest {
    /// Reads a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DepsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DepsError::Configuration(format!(
                "Failed to read manifest '{}': {e}",
                path.display()
            ))
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_toml_str(&content, base_dir)
    }

    /// Parses manifest text; `inline_file` paths resolve against `base_dir`.
    pub fn from_toml_str(content: &str, base_dir: impl Into<PathBuf>) -> Result<Self, DepsError> {
        let mut manifest: Self = toml::from_str(content)
            .map_err(|e| DepsError::Configuration(format!("Invalid manifest: {e}")))?;
        manifest.base_dir = base_dir.into();
        Ok(manifest)
    }

    /// Total number of assets across all components.
    pub fn asset_count(&self) -> usize {
        self.component.iter().map(|c| c.asset.len()).sum()
    }

    /// Number of inline assets.
    pub fn inline_count(&self) -> usize {
        self.component
            .iter()
            .flat_map(|c| &c.asset)
            .filter(|a| a.url.is_none())
            .count()
    }

    /// Registers every component, collecting per-entry failures.
    pub fn register_all(&self, registry: &AssetRegistry) -> RegistrationReport {
        let mut report = RegistrationReport::default();
        for entry in &self.component {
            let result = entry
                .specs(&self.base_dir)
                .and_then(|specs| registry.register(&entry.hash, &entry.name, specs));
            match result {
                Ok(Registration::Inserted) => report.inserted += 1,
                Ok(Registration::Unchanged) => report.unchanged += 1,
                Err(e) => {
                    tracing::warn!(hash = %entry.hash, error = %e, "Skipping manifest entry");
                    report.errors.push(e);
                }
            }
        }
        report
    }

    /// Builds a registry, failing on the first bad entry.
    pub fn build_registry(&self, settings: &Settings) -> Result<AssetRegistry, DepsError> {
        let registry = AssetRegistry::new(settings);
        let mut report = self.register_all(&registry);
        if !report.errors.is_empty() {
            return Err(report.errors.swap_remove(0));
        }
        tracing::debug!(components = report.inserted, "Loaded registry manifest");
        Ok(registry)
    }
}

impl ComponentEntry {
    fn specs(&self, base_dir: &Path) -> Result<Vec<AssetSpec>, DepsError> {
        self.asset
            .iter()
            .map(|asset| asset.to_spec(&self.hash, base_dir))
            .collect()
    }
}

impl AssetEntry {
    fn to_spec(&self, hash: &str, base_dir: &Path) -> Result<AssetSpec, DepsError> {
        let mut spec = match (&self.url, &self.inline, &self.inline_file) {
            (Some(url), None, None) => AssetSpec::url(self.kind, url.clone()),
            (None, Some(source), None) => AssetSpec::inline(self.kind, source.clone()),
            (None, None, Some(file)) => {
                let path = base_dir.join(file);
                let source = std::fs::read_to_string(&path).map_err(|e| {
                    DepsError::InvalidAsset(format!(
                        "component '{hash}': cannot read '{}': {e}",
                        path.display()
                    ))
                })?;
                AssetSpec::inline(self.kind, source)
            }
            _ => {
                return Err(DepsError::InvalidAsset(format!(
                    "component '{hash}': each {} asset needs exactly one of url, inline, inline_file",
                    self.kind
                )))
            }
        };
        for (name, value) in &self.attrs {
            spec = match value {
                AttrValue::Flag(true) => spec.with_flag(name.clone()),
                AttrValue::Flag(false) => spec,
                AttrValue::Text(text) => spec.with_attr(name.clone(), text.clone()),
            };
        }
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
[[component]]
hash = "tbl_1a2b"
name = "table"

[[component.asset]]
kind = "css"
url = "/tbl.css"

[[component.asset]]
kind = "js"
inline = "init()"
attrs = { defer = true, nomodule = false, "data-x" = "1" }
"#;

    #[test]
    fn test_parse_and_register() {
        let manifest = Manifest::from_toml_str(MANIFEST, ".").unwrap();
        assert_eq!(manifest.component.len(), 1);
        assert_eq!(manifest.asset_count(), 2);
        assert_eq!(manifest.inline_count(), 1);

        let registry = manifest.build_registry(&Settings::default()).unwrap();
        let def = registry.get("tbl_1a2b").unwrap();
        let js = def.scripts().next().unwrap();
        assert!(js.is_inline());
        let names: Vec<&str> = js.attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["data-x", "defer"]);
    }

    #[test]
    fn test_inline_file_relative_to_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("btn.js"), "click()").unwrap();
        let path = dir.path().join("components.toml");
        std::fs::write(
            &path,
            "[[component]]\nhash = \"btn\"\nname = \"button\"\n\n[[component.asset]]\nkind = \"js\"\ninline_file = \"btn.js\"\n",
        )
        .unwrap();

        let registry = Manifest::load(&path)
            .unwrap()
            .build_registry(&Settings::default())
            .unwrap();
        assert_eq!(registry.cache().len(), 1);
    }

    #[test]
    fn test_asset_needs_one_source() {
        let manifest = Manifest::from_toml_str(
            "[[component]]\nhash = \"a\"\nname = \"a\"\n[[component.asset]]\nkind = \"js\"\n",
            ".",
        )
        .unwrap();
        let report = manifest.register_all(&AssetRegistry::new(&Settings::default()));
        assert!(matches!(report.errors[0], DepsError::InvalidAsset(_)));
    }

    #[test]
    fn test_conflicting_entries_reported() {
        let text = format!(
            "{MANIFEST}\n[[component]]\nhash = \"tbl_1a2b\"\nname = \"other\"\n"
        );
        let manifest = Manifest::from_toml_str(&text, ".").unwrap();
        let report = manifest.register_all(&AssetRegistry::new(&Settings::default()));
        assert_eq!(report.inserted, 1);
        assert!(matches!(report.errors[0], DepsError::RegistryConflict(_)));
        assert!(manifest.build_registry(&Settings::default()).is_err());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let toml = "[[component]]\nhash=\"a\"\nname=\"a\"\nbogus=1\n";
        assert!(Manifest::from_toml_str(toml, ".").is_err());
    }
}
