//! Dependency resolution.
//!
//! [`Resolver`] turns a component-class hash into that component's ordered
//! assets. Lookups are pure reads of the registry snapshot, so they are
//! cheap, repeatable, and safe from any number of threads.

use std::sync::Arc;

use compdeps_core::DepsError;

use crate::asset::ComponentAsset;
use crate::registry::{AssetRegistry, ComponentDefinition};

/// Resolves component hashes against an [`AssetRegistry`].
#[derive(Debug, Clone)]
pub struct Resolver {
    registry: Arc<AssetRegistry>,
}

impl Resolver {
    /// Creates a resolver reading from `registry`.
    pub fn new(registry: Arc<AssetRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the definition registered under `hash`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownComponent` if nothing is registered under `hash`,
    /// e.g. a stale cache or a mismatched deployment.
    pub fn resolve(&self, hash: &str) -> Result<Arc<ComponentDefinition>, DepsError> {
        self.registry
            .get(hash)
            .ok_or_else(|| DepsError::UnknownComponent(hash.to_string()))
    }

    /// Returns the cached source of an inline asset, or `None` for a linked
    /// asset.
    ///
    /// # Errors
    ///
    /// Returns `CacheMiss` if an inline asset's content is no longer cached.
    pub fn inline_content(&self, asset: &ComponentAsset) -> Result<Option<Arc<str>>, DepsError> {
        match asset.cache_key() {
            Some(key) => self.registry.cache().get(key, asset.kind).map(Some),
            None => Ok(None),
        }
    }

    /// The registry this resolver reads from.
    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetKind, AssetSpec};

    fn resolver() -> Resolver {
        let registry = AssetRegistry::default();
        registry
            .register(
                "tbl_1a2b",
                "table",
                vec![
                    AssetSpec::url(AssetKind::Style, "/tbl.css"),
                    AssetSpec::inline(AssetKind::Script, "initTable()"),
                ],
            )
            .unwrap();
        Resolver::new(Arc::new(registry))
    }

    #[test]
    fn test_resolve_known() {
        let def = resolver().resolve("tbl_1a2b").unwrap();
        assert_eq!(def.assets.len(), 2);
    }

    #[test]
    fn test_resolve_unknown() {
        let err = resolver().resolve("zzz_000").unwrap_err();
        assert!(matches!(err, DepsError::UnknownComponent(ref h) if h == "zzz_000"));
    }

    #[test]
    fn test_resolve_is_repeatable() {
        let resolver = resolver();
        let a = resolver.resolve("tbl_1a2b").unwrap();
        let b = resolver.resolve("tbl_1a2b").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_inline_content() {
        let resolver = resolver();
        let def = resolver.resolve("tbl_1a2b").unwrap();
        assert!(resolver.inline_content(&def.assets[0]).unwrap().is_none());
        assert_eq!(
            resolver.inline_content(&def.assets[1]).unwrap().as_deref(),
            Some("initTable()")
        );
    }
}
