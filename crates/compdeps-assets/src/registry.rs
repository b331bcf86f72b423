//! The component asset registry.
//!
//! [`AssetRegistry`] maps a component-class hash to its
//! [`ComponentDefinition`]. Entries are write-once: registering the same
//! definition again is a no-op, and registering a different definition under
//! an existing hash is rejected with [`DepsError::RegistryConflict`] so a
//! live page can never be served assets that disagree with its markers.
//!
//! Readers work on an immutable snapshot (`Arc<HashMap>`). Writers copy the
//! current map, insert, and publish the new map in one swap, so concurrent
//! readers never observe a half-written entry.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use compdeps_core::{DepsError, Settings};

use crate::asset::{
    is_valid_attr_name, is_valid_token, AssetKind, AssetSource, AssetSpec, ComponentAsset,
    SpecContent,
};
use crate::cache::{content_key, ContentCache};

/// A registered component: its class hash, display name, and ordered assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentDefinition {
    /// Opaque component-class hash carried by rendering markers.
    pub hash: String,
    /// Human-readable component name.
    pub name: String,
    /// Assets in declaration order.
    pub assets: Vec<ComponentAsset>,
}

impl ComponentDefinition {
    /// Iterates over the JS assets.
    pub fn scripts(&self) -> impl Iterator<Item = &ComponentAsset> {
        self.assets.iter().filter(|a| a.kind == AssetKind::Script)
    }

    /// Iterates over the CSS assets.
    pub fn styles(&self) -> impl Iterator<Item = &ComponentAsset> {
        self.assets.iter().filter(|a| a.kind == AssetKind::Style)
    }

    /// Returns `true` if the component has any JS, and therefore an
    /// initializer the client should call.
    pub fn has_scripts(&self) -> bool {
        self.scripts().next().is_some()
    }
}

/// The outcome of a successful [`AssetRegistry::register`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The hash was new and the definition was published.
    Inserted,
    /// An identical definition was already registered.
    Unchanged,
}

type Snapshot = Arc<HashMap<String, Arc<ComponentDefinition>>>;

/// Write-once registry of component definitions.
///
/// Owns the [`ContentCache`] that inline assets are stored in.
#[derive(Debug)]
pub struct AssetRegistry {
    components: RwLock<Snapshot>,
    cache: ContentCache,
    settings: Settings,
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl AssetRegistry {
    /// Creates an empty registry with its own content cache.
    pub fn new(settings: &Settings) -> Self {
        Self::with_cache(settings, ContentCache::new(settings.cache_key_length))
    }

    /// Creates an empty registry storing inline content in `cache`.
    pub fn with_cache(settings: &Settings, cache: ContentCache) -> Self {
        Self {
            components: RwLock::new(Arc::new(HashMap::new())),
            cache,
            settings: settings.clone(),
        }
    }

    /// Registers a component's assets under `hash`.
    ///
    /// Inline sources are moved into the content cache and referenced by
    /// their cache URL.
    ///
    /// # Errors
    ///
    /// - `InvalidAsset` if the hash is not a valid marker token, a URL is
    ///   empty, or an attribute name cannot be rendered.
    /// - `RegistryConflict` if `hash` is already registered with a different
    ///   definition. The original definition is kept.
    pub fn register(
        &self,
        hash: &str,
        name: &str,
        specs: Vec<AssetSpec>,
    ) -> Result<Registration, DepsError> {
        if !is_valid_token(hash) {
            return Err(DepsError::InvalidAsset(format!(
                "component hash '{hash}' must match [A-Za-z0-9_-]+"
            )));
        }

        let mut inline_sources = Vec::new();
        let mut assets = Vec::with_capacity(specs.len());
        for spec in specs {
            if let Some(bad) = spec.attrs.iter().find(|a| !is_valid_attr_name(&a.name)) {
                return Err(DepsError::InvalidAsset(format!(
                    "component '{hash}': invalid attribute name '{}'",
                    bad.name
                )));
            }
            let source = match spec.content {
                SpecContent::Url(url) => {
                    let url = url.trim();
                    if url.is_empty() {
                        return Err(DepsError::InvalidAsset(format!(
                            "component '{hash}': empty {} URL",
                            spec.kind
                        )));
                    }
                    AssetSource::Url(url.to_string())
                }
                SpecContent::Inline(source) => {
                    let key = content_key(&source, self.cache.key_length());
                    let url = self.settings.cache_url(&key, spec.kind.script_type());
                    inline_sources.push((spec.kind, source));
                    AssetSource::Inline { key, url }
                }
            };
            assets.push(ComponentAsset {
                kind: spec.kind,
                source,
                attrs: spec.attrs,
            });
        }

        let definition = ComponentDefinition {
            hash: hash.to_string(),
            name: name.to_string(),
            assets,
        };

        let mut guard = self
            .components
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = guard.get(hash) {
            if **existing == definition {
                return Ok(Registration::Unchanged);
            }
            tracing::warn!(
                hash = %hash,
                existing = %existing.name,
                rejected = %name,
                "Rejected conflicting component registration"
            );
            return Err(DepsError::RegistryConflict(format!(
                "component hash '{hash}' is already registered as '{}' with different assets",
                existing.name
            )));
        }

        for (kind, source) in &inline_sources {
            self.cache.put(*kind, source);
        }

        let mut next = HashMap::clone(&guard);
        next.insert(hash.to_string(), Arc::new(definition));
        *guard = Arc::new(next);
        drop(guard);

        tracing::debug!(hash = %hash, name = %name, "Registered component");
        Ok(Registration::Inserted)
    }

    /// Returns the current immutable snapshot of all definitions.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(
            &self
                .components
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Looks up a single definition.
    pub fn get(&self, hash: &str) -> Option<Arc<ComponentDefinition>> {
        self.snapshot().get(hash).cloned()
    }

    /// Returns `true` if `hash` is registered.
    pub fn contains(&self, hash: &str) -> bool {
        self.snapshot().contains_key(hash)
    }

    /// Returns all registered hashes, sorted.
    pub fn hashes(&self) -> Vec<String> {
        let mut hashes: Vec<String> = self.snapshot().keys().cloned().collect();
        hashes.sort_unstable();
        hashes
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether no component is registered.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// The content cache holding inline sources.
    pub const fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// The settings this registry builds cache URLs with.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_specs() -> Vec<AssetSpec> {
        vec![
            AssetSpec::url(AssetKind::Style, "/tbl.css"),
            AssetSpec::inline(AssetKind::Script, "initTable()").with_flag("defer"),
        ]
    }

    #[test]
    fn test_register_and_get() {
        let registry = AssetRegistry::default();
        let outcome = registry.register("tbl_1a2b", "table", table_specs()).unwrap();
        assert_eq!(outcome, Registration::Inserted);

        let def = registry.get("tbl_1a2b").unwrap();
        assert_eq!(def.name, "table");
        assert_eq!(def.assets.len(), 2);
        assert_eq!(def.assets[0].resource_id(), "/tbl.css");
        assert!(def.assets[1].resource_id().starts_with("/components/cache/"));
        assert!(def.assets[1].resource_id().ends_with(".js/"));
        assert!(def.has_scripts());
        assert_eq!(def.styles().count(), 1);
    }

    #[test]
    fn test_inline_content_goes_to_cache() {
        let registry = AssetRegistry::default();
        registry.register("tbl_1a2b", "table", table_specs()).unwrap();
        let def = registry.get("tbl_1a2b").unwrap();
        let key = def.assets[1].cache_key().unwrap();
        assert_eq!(
            &*registry.cache().get(key, AssetKind::Script).unwrap(),
            "initTable()"
        );
    }

    #[test]
    fn test_identical_reregistration_is_noop() {
        let registry = AssetRegistry::default();
        registry.register("tbl_1a2b", "table", table_specs()).unwrap();
        let outcome = registry.register("tbl_1a2b", "table", table_specs()).unwrap();
        assert_eq!(outcome, Registration::Unchanged);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_conflicting_reregistration_keeps_original() {
        let registry = AssetRegistry::default();
        registry.register("tbl_1a2b", "table", table_specs()).unwrap();

        let err = registry
            .register(
                "tbl_1a2b",
                "table",
                vec![AssetSpec::url(AssetKind::Style, "/other.css")],
            )
            .unwrap_err();
        assert!(matches!(err, DepsError::RegistryConflict(_)));

        let def = registry.get("tbl_1a2b").unwrap();
        assert_eq!(def.assets[0].resource_id(), "/tbl.css");
    }

    #[test]
    fn test_conflicting_inline_content_not_cached() {
        let registry = AssetRegistry::default();
        registry.register("c1", "one", Vec::new()).unwrap();
        let before = registry.cache().len();
        let _ = registry.register(
            "c1",
            "one",
            vec![AssetSpec::inline(AssetKind::Style, ".new {}")],
        );
        assert_eq!(registry.cache().len(), before);
    }

    #[test]
    fn test_invalid_registrations() {
        let registry = AssetRegistry::default();
        assert!(matches!(
            registry.register("bad hash", "x", Vec::new()),
            Err(DepsError::InvalidAsset(_))
        ));
        assert!(matches!(
            registry.register("ok", "x", vec![AssetSpec::url(AssetKind::Script, "  ")]),
            Err(DepsError::InvalidAsset(_))
        ));
        assert!(matches!(
            registry.register(
                "ok",
                "x",
                vec![AssetSpec::url(AssetKind::Script, "/a.js").with_flag("on load")]
            ),
            Err(DepsError::InvalidAsset(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_is_stable_across_writes() {
        let registry = AssetRegistry::default();
        registry.register("a", "a", Vec::new()).unwrap();
        let snapshot = registry.snapshot();
        registry.register("b", "b", Vec::new()).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.hashes(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let registry = Arc::new(AssetRegistry::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let hash = format!("c{i}");
                    registry
                        .register(&hash, "c", vec![AssetSpec::url(AssetKind::Script, "/c.js")])
                        .unwrap();
                    assert!(registry.contains(&hash));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 8);
    }
}
