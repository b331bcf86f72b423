//! Parsing of the `<script>`/`<link>` markup carried by `loadScript`.
//!
//! The loader must insert an element equivalent to the markup it was given,
//! with every attribute preserved. [`TagMarkup::parse`] turns one tag into
//! its element name and attribute list and exposes the resource id the
//! loaded set is keyed on.

use compdeps_assets::{AssetKind, Attr};
use thiserror::Error;

/// Errors from parsing tag markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagParseError {
    /// The markup was blank.
    #[error("empty tag markup")]
    Empty,
    /// The markup is not a `<script>` or `<link>` start tag.
    #[error("unsupported element in markup '{0}'")]
    UnsupportedElement(String),
    /// The start tag never closes.
    #[error("unterminated tag markup '{0}'")]
    Unterminated(String),
    /// The tag has no `src`/`href` to identify it by.
    #[error("tag has no resource id: '{0}'")]
    MissingResourceId(String),
    /// The tag does not match the declared dependency kind.
    #[error("expected a {expected} tag, got <{found}>")]
    KindMismatch {
        /// Declared kind.
        expected: AssetKind,
        /// Element name found.
        found: String,
    },
}

/// A parsed `<script>` or `<link>` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMarkup {
    kind: AssetKind,
    attrs: Vec<Attr>,
}

impl TagMarkup {
    /// Parses one start tag; a trailing `</script>` is accepted and ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use compdeps_client::markup::TagMarkup;
    ///
    /// let tag = TagMarkup::parse(r#"<script src="/a.js?x=1&amp;y=2" defer></script>"#).unwrap();
    /// assert_eq!(tag.resource_id(), Some("/a.js?x=1&y=2"));
    /// assert!(tag.has_attr("defer"));
    /// ```
    pub fn parse(markup: &str) -> Result<Self, TagParseError> {
        let src = markup.trim();
        if src.is_empty() {
            return Err(TagParseError::Empty);
        }
        let rest = src
            .strip_prefix('<')
            .ok_or_else(|| TagParseError::UnsupportedElement(src.to_string()))?;

        let name_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        let name = &rest[..name_len];
        let kind = if name.eq_ignore_ascii_case("script") {
            AssetKind::Script
        } else if name.eq_ignore_ascii_case("link") {
            AssetKind::Style
        } else {
            return Err(TagParseError::UnsupportedElement(src.to_string()));
        };

        let attrs = parse_attrs(&rest[name_len..])
            .ok_or_else(|| TagParseError::Unterminated(src.to_string()))?;
        Ok(Self { kind, attrs })
    }

    /// Parses markup and checks it against the declared kind.
    pub fn parse_as(kind: AssetKind, markup: &str) -> Result<Self, TagParseError> {
        let tag = Self::parse(markup)?;
        if tag.kind != kind {
            return Err(TagParseError::KindMismatch {
                expected: kind,
                found: tag.element_name().to_string(),
            });
        }
        if tag.resource_id().is_none() {
            return Err(TagParseError::MissingResourceId(markup.trim().to_string()));
        }
        Ok(tag)
    }

    /// Script or style.
    pub const fn kind(&self) -> AssetKind {
        self.kind
    }

    /// `script` or `link`.
    pub const fn element_name(&self) -> &'static str {
        match self.kind {
            AssetKind::Script => "script",
            AssetKind::Style => "link",
        }
    }

    /// The attributes, in source order, with entities decoded.
    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    /// The value of the first attribute named `name`. Flags yield `""`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    /// Whether an attribute named `name` is present.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// `src` for scripts, `href` for links.
    pub fn resource_id(&self) -> Option<&str> {
        let key = match self.kind {
            AssetKind::Script => "src",
            AssetKind::Style => "href",
        };
        self.attr(key).filter(|v| !v.is_empty())
    }
}

/// Parses attributes up to the closing `>`. `None` if there is no `>`.
fn parse_attrs(src: &str) -> Option<Vec<Attr>> {
    let mut attrs = Vec::new();
    let mut rest = src;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '/');
        if rest.starts_with('>') {
            return Some(attrs);
        }
        if rest.is_empty() {
            return None;
        }

        let name_len = rest
            .find(|c: char| c.is_ascii_whitespace() || matches!(c, '=' | '>' | '/'))
            .unwrap_or(rest.len());
        let name = rest[..name_len].to_ascii_lowercase();
        rest = rest[name_len..].trim_start();

        let Some(after_eq) = rest.strip_prefix('=') else {
            attrs.push(Attr::flag(name));
            continue;
        };
        let after_eq = after_eq.trim_start();
        let (raw, tail) = match after_eq.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &after_eq[1..];
                let end = body.find(quote)?;
                (&body[..end], &body[end + 1..])
            }
            _ => {
                let end = after_eq
                    .find(|c: char| c.is_ascii_whitespace() || c == '>')
                    .unwrap_or(after_eq.len());
                (&after_eq[..end], &after_eq[end..])
            }
        };
        attrs.push(Attr::new(name, unescape(raw)));
        rest = tail;
    }
}

/// Decodes the entities attribute escaping produces.
fn unescape(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_with_attributes() {
        let tag = TagMarkup::parse(
            r#"<script src="/x.js" type="module" defer data-x='a "b"' crossorigin=anonymous></script>"#,
        )
        .unwrap();
        assert_eq!(tag.kind(), AssetKind::Script);
        assert_eq!(tag.resource_id(), Some("/x.js"));
        assert_eq!(tag.attr("type"), Some("module"));
        assert_eq!(tag.attr("defer"), Some(""));
        assert_eq!(tag.attr("data-x"), Some(r#"a "b""#));
        assert_eq!(tag.attr("crossorigin"), Some("anonymous"));
        let names: Vec<&str> = tag.attrs().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["src", "type", "defer", "data-x", "crossorigin"]);
    }

    #[test]
    fn test_link() {
        let tag = TagMarkup::parse(r#"<LINK href="/a.css" rel="stylesheet" media="print"/>"#)
            .unwrap();
        assert_eq!(tag.kind(), AssetKind::Style);
        assert_eq!(tag.resource_id(), Some("/a.css"));
        assert_eq!(tag.attr("media"), Some("print"));
    }

    #[test]
    fn test_entities_decoded() {
        let tag = TagMarkup::parse(r#"<script src="/a.js?x=1&amp;y=&quot;2&quot;"></script>"#)
            .unwrap();
        assert_eq!(tag.resource_id(), Some(r#"/a.js?x=1&y="2""#));
    }

    #[test]
    fn test_errors() {
        assert_eq!(TagMarkup::parse("  "), Err(TagParseError::Empty));
        assert!(matches!(
            TagMarkup::parse("<div>"),
            Err(TagParseError::UnsupportedElement(_))
        ));
        assert!(matches!(
            TagMarkup::parse(r#"<script src="/a.js"#),
            Err(TagParseError::Unterminated(_))
        ));
        assert!(matches!(
            TagMarkup::parse_as(AssetKind::Style, r#"<script src="/a.js"></script>"#),
            Err(TagParseError::KindMismatch { .. })
        ));
        assert!(matches!(
            TagMarkup::parse_as(AssetKind::Script, "<script>inline()</script>"),
            Err(TagParseError::MissingResourceId(_))
        ));
    }
}
