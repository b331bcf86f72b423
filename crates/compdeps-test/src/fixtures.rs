//! Ready-made registries and pages.

use std::sync::Arc;

use compdeps_assets::{AssetKind, AssetRegistry, AssetSpec};
use compdeps_core::Settings;

/// Settings used by the fixtures: defaults with debug logging off.
pub fn sample_settings() -> Settings {
    Settings {
        debug: false,
        ..Settings::default()
    }
}

/// Inline JS registered by [`sample_registry`] for `inline_07`.
pub const INLINE_JS: &str = "document.querySelectorAll('[data-x]').forEach((el) => el.hidden = false);";

/// Inline CSS registered by [`sample_registry`] for `inline_07`.
pub const INLINE_CSS: &str = ".badge { color: red; }";

/// A registry with four components:
///
/// - `tbl_1a2b` (table): `/tbl.css`
/// - `btn_01` (button): `/shared.css`, `/btn.css`, deferred `/btn.js`
/// - `card_02` (card): `/card.css`, `/shared.css`, `/card.js`
/// - `inline_07` (badge): inline CSS and JS served from the content cache
pub fn sample_registry() -> Arc<AssetRegistry> {
    registry_with(&sample_settings())
}

/// [`sample_registry`] built with explicit settings.
pub fn registry_with(settings: &Settings) -> Arc<AssetRegistry> {
    let registry = AssetRegistry::new(settings);
    let components = [
        (
            "tbl_1a2b",
            "table",
            vec![AssetSpec::url(AssetKind::Style, "/tbl.css")],
        ),
        (
            "btn_01",
            "button",
            vec![
                AssetSpec::url(AssetKind::Style, "/shared.css"),
                AssetSpec::url(AssetKind::Style, "/btn.css"),
                AssetSpec::url(AssetKind::Script, "/btn.js").with_flag("defer"),
            ],
        ),
        (
            "card_02",
            "card",
            vec![
                AssetSpec::url(AssetKind::Style, "/card.css"),
                AssetSpec::url(AssetKind::Style, "/shared.css"),
                AssetSpec::url(AssetKind::Script, "/card.js"),
            ],
        ),
        (
            "inline_07",
            "badge",
            vec![
                AssetSpec::inline(AssetKind::Style, INLINE_CSS),
                AssetSpec::inline(AssetKind::Script, INLINE_JS),
            ],
        ),
    ];
    for (hash, name, specs) in components {
        registry
            .register(hash, name, specs)
            .expect("fixture components are valid");
    }
    Arc::new(registry)
}

/// A full page rendering one table and one button.
pub const SAMPLE_PAGE: &str = concat!(
    "<!DOCTYPE html><html><head><title>t</title></head><body>",
    r#"<!-- RENDERED "tbl_1a2b,x1" --><table data-instance="x1"></table>"#,
    r#"<!-- RENDERED "btn_01,b1" --><button data-instance="b1"></button>"#,
    "</body></html>"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_registry() {
        let registry = sample_registry();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.cache().len(), 2);
        assert!(registry.get("inline_07").unwrap().assets.iter().all(|a| a.is_inline()));
    }
}
