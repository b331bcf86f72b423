//! Component assets.
//!
//! A [`ComponentAsset`] is one loadable JS or CSS resource. Linked assets
//! are identified by their URL; inline assets are identified by the URL of
//! their entry in the [`ContentCache`](crate::cache::ContentCache), so the
//! client loader can treat both the same way.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"));
static ATTR_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_:][A-Za-z0-9_:.-]*$").expect("valid regex"));

/// Returns `true` if `s` is a valid marker token (component hash, instance
/// id, or input id).
pub fn is_valid_token(s: &str) -> bool {
    TOKEN_RE.is_match(s)
}

/// Returns `true` if `s` can be emitted as an HTML attribute name.
pub fn is_valid_attr_name(s: &str) -> bool {
    ATTR_NAME_RE.is_match(s)
}

/// Whether an asset is JavaScript or CSS.
///
/// Serialized as `"js"` / `"css"`, the same strings used by the fetch
/// endpoint and the loader payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetKind {
    /// A `<script>`.
    #[serde(rename = "js", alias = "script")]
    Script,
    /// A `<link rel="stylesheet">` or `<style>`.
    #[serde(rename = "css", alias = "style")]
    Style,
}

impl AssetKind {
    /// The script type used in cache URLs and payload calls.
    pub const fn script_type(self) -> &'static str {
        match self {
            Self::Script => "js",
            Self::Style => "css",
        }
    }

    /// Parses a script type (`js`/`css`), also accepting `script`/`style`.
    pub fn from_script_type(s: &str) -> Option<Self> {
        match s {
            "js" | "script" => Some(Self::Script),
            "css" | "style" => Some(Self::Style),
            _ => None,
        }
    }

    /// The MIME type the fetch endpoint serves this kind with.
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Script => "text/javascript; charset=utf-8",
            Self::Style => "text/css; charset=utf-8",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.script_type())
    }
}

/// One HTML attribute, emitted verbatim on the rendered tag.
///
/// Boolean attributes such as `defer` have no value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attr {
    /// The attribute name, e.g. `integrity`.
    pub name: String,
    /// The attribute value, or `None` for a boolean attribute.
    #[serde(default)]
    pub value: Option<String>,
}

impl Attr {
    /// Creates a `name="value"` attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Creates a boolean attribute such as `defer` or `async`.
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// Where an asset's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetSource {
    /// An external or static URL.
    Url(String),
    /// Inline content stored in the content cache under `key`, fetchable
    /// at `url`.
    Inline {
        /// Content hash used as cache key.
        key: String,
        /// Fetch endpoint URL for the cached content.
        url: String,
    },
}

/// A resolved, loadable resource belonging to a component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentAsset {
    /// JS or CSS.
    pub kind: AssetKind,
    /// URL or cached inline content.
    pub source: AssetSource,
    /// Extra attributes rendered on the tag, in order.
    #[serde(default)]
    pub attrs: Vec<Attr>,
}

impl ComponentAsset {
    /// The identifier used for deduplication: the URL for linked assets,
    /// the cache URL for inline ones.
    pub fn resource_id(&self) -> &str {
        match &self.source {
            AssetSource::Url(url) | AssetSource::Inline { url, .. } => url,
        }
    }

    /// The content cache key, if this asset is inline.
    pub fn cache_key(&self) -> Option<&str> {
        match &self.source {
            AssetSource::Inline { key, .. } => Some(key),
            AssetSource::Url(_) => None,
        }
    }

    /// Returns `true` if this asset's content lives in the content cache.
    pub const fn is_inline(&self) -> bool {
        matches!(self.source, AssetSource::Inline { .. })
    }
}

/// The body of an [`AssetSpec`] as given at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecContent {
    /// A URL to link to.
    Url(String),
    /// Literal JS or CSS source, moved into the content cache on registration.
    Inline(String),
}

/// An asset as declared by a component, before registration.
///
/// # Examples
///
/// ```
/// use compdeps_assets::asset::{AssetKind, AssetSpec};
///
/// let spec = AssetSpec::url(AssetKind::Script, "/static/chart.js")
///     .with_flag("defer")
///     .with_attr("crossorigin", "anonymous");
/// assert_eq!(spec.attrs.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSpec {
    /// JS or CSS.
    pub kind: AssetKind,
    /// URL or inline source.
    pub content: SpecContent,
    /// Extra attributes rendered on the tag.
    pub attrs: Vec<Attr>,
}

impl AssetSpec {
    /// Declares a linked asset.
    pub fn url(kind: AssetKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            content: SpecContent::Url(url.into()),
            attrs: Vec::new(),
        }
    }

    /// Declares an inline asset.
    pub fn inline(kind: AssetKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            content: SpecContent::Inline(source.into()),
            attrs: Vec::new(),
        }
    }

    /// Adds a `name="value"` attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push(Attr::new(name, value));
        self
    }

    /// Adds a boolean attribute.
    #[must_use]
    pub fn with_flag(mut self, name: impl Into<String>) -> Self {
        self.attrs.push(Attr::flag(name));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens() {
        assert!(is_valid_token("tbl_1a2b"));
        assert!(is_valid_token("x1"));
        assert!(is_valid_token("card-3"));
        assert!(!is_valid_token(""));
        assert!(!is_valid_token("a b"));
        assert!(!is_valid_token("a,b"));
        assert!(!is_valid_token("a\"b"));
    }

    #[test]
    fn test_attr_names() {
        assert!(is_valid_attr_name("defer"));
        assert!(is_valid_attr_name("data-x"));
        assert!(is_valid_attr_name("xml:lang"));
        assert!(!is_valid_attr_name("on click"));
        assert!(!is_valid_attr_name("a\"b"));
    }

    #[test]
    fn test_kind_script_type() {
        assert_eq!(AssetKind::Script.to_string(), "js");
        assert_eq!(AssetKind::Style.to_string(), "css");
        assert_eq!(AssetKind::from_script_type("css"), Some(AssetKind::Style));
        assert_eq!(AssetKind::from_script_type("script"), Some(AssetKind::Script));
        assert_eq!(AssetKind::from_script_type("html"), None);
    }

    #[test]
    fn test_kind_serde() {
        assert_eq!(serde_json::to_string(&AssetKind::Script).unwrap(), "\"js\"");
        let kind: AssetKind = serde_json::from_str("\"style\"").unwrap();
        assert_eq!(kind, AssetKind::Style);
    }

    #[test]
    fn test_resource_id() {
        let linked = ComponentAsset {
            kind: AssetKind::Style,
            source: AssetSource::Url("/tbl.css".into()),
            attrs: Vec::new(),
        };
        assert_eq!(linked.resource_id(), "/tbl.css");
        assert!(linked.cache_key().is_none());

        let inline = ComponentAsset {
            kind: AssetKind::Script,
            source: AssetSource::Inline {
                key: "abcd".into(),
                url: "/components/cache/abcd.js/".into(),
            },
            attrs: Vec::new(),
        };
        assert_eq!(inline.resource_id(), "/components/cache/abcd.js/");
        assert_eq!(inline.cache_key(), Some("abcd"));
        assert!(inline.is_inline());
    }
}
