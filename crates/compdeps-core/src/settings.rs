//! Settings for compdeps.
//!
//! [`Settings`] holds the marker syntax, placeholder tags, URL prefix of the
//! content cache endpoint, and the default [`DependencyStrategy`]. Settings
//! are passed explicitly to the objects that need them; there is no global
//! instance.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DepsError;

/// How the rewriter places a response's JS and CSS dependencies.
///
/// # Examples
///
/// ```
/// use compdeps_core::settings::DependencyStrategy;
///
/// let strategy: DependencyStrategy = "fragment".parse().unwrap();
/// assert_eq!(strategy, DependencyStrategy::Fragment);
/// assert_eq!(strategy.to_string(), "fragment");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyStrategy {
    /// Full page: CSS inline in the head, JS through the loader payload.
    #[default]
    Document,
    /// Partial HTML: everything goes through the loader payload.
    Fragment,
    /// Plain tags at the placeholders, no loader.
    Simple,
    /// Plain tags at the start of the output.
    Prepend,
    /// Plain tags at the end of the output.
    Append,
    /// Leave the HTML untouched.
    Ignore,
}

impl DependencyStrategy {
    /// All strategies, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Document,
        Self::Fragment,
        Self::Simple,
        Self::Prepend,
        Self::Append,
        Self::Ignore,
    ];

    /// The lowercase name used in configuration files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Fragment => "fragment",
            Self::Simple => "simple",
            Self::Prepend => "prepend",
            Self::Append => "append",
            Self::Ignore => "ignore",
        }
    }

    /// Returns `true` if this strategy emits a loader payload script.
    pub const fn uses_loader(self) -> bool {
        matches!(self, Self::Document | Self::Fragment)
    }
}

impl fmt::Display for DependencyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyStrategy {
    type Err = DepsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == wanted)
            .ok_or_else(|| {
                DepsError::Configuration(format!("Unknown dependency strategy '{s}'"))
            })
    }
}

/// The complete set of compdeps settings.
///
/// # Examples
///
/// ```
/// use compdeps_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert_eq!(settings.url_prefix, "components");
/// assert_eq!(settings.marker_prefix, "RENDERED");
/// assert_eq!(settings.cache_url("abc123", "js"), "/components/cache/abc123.js/");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,
    /// The log level filter (e.g. "info", "compdeps_html=debug").
    pub log_level: String,

    // ── Markers & placeholders ───────────────────────────────────────

    /// Literal that opens the payload of a rendering marker comment.
    pub marker_prefix: String,
    /// Tag marking where the JS payload goes.
    pub js_placeholder: String,
    /// Tag marking where CSS tags go.
    pub css_placeholder: String,

    // ── Rewriting ────────────────────────────────────────────────────

    /// Strategy used when the caller does not pick one.
    pub default_strategy: DependencyStrategy,
    /// URL of the client loader script, emitted by the document strategy.
    pub loader_script_url: Option<String>,

    // ── Content cache ────────────────────────────────────────────────

    /// First path segment of the content cache endpoint.
    pub url_prefix: String,
    /// Number of hex digits of the content hash used as cache key.
    pub cache_key_length: usize,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),

            marker_prefix: "RENDERED".to_string(),
            js_placeholder: r#"<script name="JS_PLACEHOLDER"></script>"#.to_string(),
            css_placeholder: r#"<link name="CSS_PLACEHOLDER">"#.to_string(),

            default_strategy: DependencyStrategy::Document,
            loader_script_url: None,

            url_prefix: "components".to_string(),
            cache_key_length: 16,

            extra: HashMap::new(),
        }
    }
}

impl Settings {
    /// Returns the fetch URL for a cached content key.
    pub fn cache_url(&self, key: &str, script_type: &str) -> String {
        format!(
            "/{}/cache/{key}.{script_type}/",
            self.url_prefix.trim_matches('/')
        )
    }

    /// Returns the axum route pattern serving the content cache.
    pub fn cache_route(&self) -> String {
        format!("/{}/cache/{{file}}", self.url_prefix.trim_matches('/'))
    }

    /// Checks values that deserialization alone cannot rule out.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error for an empty marker prefix, empty
    /// placeholders, or a cache key length outside `8..=64`.
    pub fn validate(&self) -> Result<(), DepsError> {
        if self.marker_prefix.trim().is_empty() {
            return Err(DepsError::Configuration(
                "marker_prefix must not be empty".to_string(),
            ));
        }
        if self.marker_prefix.contains('"') || self.marker_prefix.contains("--") {
            return Err(DepsError::Configuration(format!(
                "marker_prefix '{}' may not contain quotes or '--'",
                self.marker_prefix
            )));
        }
        if self.js_placeholder.is_empty() || self.css_placeholder.is_empty() {
            return Err(DepsError::Configuration(
                "placeholders must not be empty".to_string(),
            ));
        }
        if !(8..=64).contains(&self.cache_key_length) {
            return Err(DepsError::Configuration(format!(
                "cache_key_length must be between 8 and 64, got {}",
                self.cache_key_length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.debug);
        assert_eq!(s.log_level, "info");
        assert_eq!(s.marker_prefix, "RENDERED");
        assert_eq!(s.default_strategy, DependencyStrategy::Document);
        assert!(s.loader_script_url.is_none());
        assert_eq!(s.cache_key_length, 16);
        assert!(s.js_placeholder.contains("JS_PLACEHOLDER"));
        assert!(s.css_placeholder.contains("CSS_PLACEHOLDER"));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_cache_url_trims_slashes() {
        let s = Settings {
            url_prefix: "/assets/".to_string(),
            ..Settings::default()
        };
        assert_eq!(s.cache_url("k", "css"), "/assets/cache/k.css/");
        assert_eq!(s.cache_route(), "/assets/cache/{file}");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut s = Settings::default();
        s.marker_prefix = "  ".to_string();
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.marker_prefix = "A--B".to_string();
        assert!(s.validate().is_err());

        let mut s = Settings::default();
        s.cache_key_length = 4;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_strategy_parse_roundtrip() {
        for strategy in DependencyStrategy::ALL {
            let parsed: DependencyStrategy = strategy.as_str().parse().unwrap();
            assert_eq!(parsed, strategy);
        }
        assert_eq!(
            " Document ".parse::<DependencyStrategy>().unwrap(),
            DependencyStrategy::Document
        );
        assert!("inline".parse::<DependencyStrategy>().is_err());
    }

    #[test]
    fn test_strategy_uses_loader() {
        assert!(DependencyStrategy::Document.uses_loader());
        assert!(DependencyStrategy::Fragment.uses_loader());
        assert!(!DependencyStrategy::Simple.uses_loader());
        assert!(!DependencyStrategy::Ignore.uses_loader());
    }
}
