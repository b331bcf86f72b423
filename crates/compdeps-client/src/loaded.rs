//! The set of dependencies the page already has.

use std::collections::HashSet;

use compdeps_assets::AssetKind;

/// Tracks loaded resource ids, one namespace per kind.
///
/// An id is added at the moment a load is requested, not when it completes,
/// so a second request for an in-flight resource is deduplicated.
pub trait LoadedSet: Send {
    /// Whether `id` of this kind is loaded or loading.
    fn contains(&self, kind: AssetKind, id: &str) -> bool;

    /// Adds `id`. Returns `true` if it was not present.
    fn insert(&mut self, kind: AssetKind, id: &str) -> bool;

    /// Number of ids of this kind.
    fn count(&self, kind: AssetKind) -> usize;
}

/// A [`LoadedSet`] kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoadedSet {
    scripts: HashSet<String>,
    styles: HashSet<String>,
}

impl MemoryLoadedSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    const fn ids(&self, kind: AssetKind) -> &HashSet<String> {
        match kind {
            AssetKind::Script => &self.scripts,
            AssetKind::Style => &self.styles,
        }
    }
}

impl LoadedSet for MemoryLoadedSet {
    fn contains(&self, kind: AssetKind, id: &str) -> bool {
        self.ids(kind).contains(id)
    }

    fn insert(&mut self, kind: AssetKind, id: &str) -> bool {
        let ids = match kind {
            AssetKind::Script => &mut self.scripts,
            AssetKind::Style => &mut self.styles,
        };
        ids.insert(id.to_string())
    }

    fn count(&self, kind: AssetKind) -> usize {
        self.ids(kind).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_separate_namespaces() {
        let mut set = MemoryLoadedSet::new();
        assert!(set.insert(AssetKind::Script, "/a"));
        assert!(!set.insert(AssetKind::Script, "/a"));
        assert!(set.contains(AssetKind::Script, "/a"));
        assert!(!set.contains(AssetKind::Style, "/a"));
        assert_eq!(set.count(AssetKind::Script), 1);
        assert_eq!(set.count(AssetKind::Style), 0);
    }
}
