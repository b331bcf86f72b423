//! Rendering marker parsing.
//!
//! Each component render emits one comment of the form
//!
//! ```text
//! <!-- RENDERED "componentHash,instanceId" -->
//! <!-- RENDERED "componentHash,instanceId,inputId" -->
//! ```
//!
//! [`MarkerParser::parse`] walks the markup comments of a document (see
//! [`scan`](crate::scan)) and yields a [`RenderMarker`] for each one whose
//! body starts with the marker prefix. A prefixed comment whose payload does
//! not parse yields a [`MarkerFormatError`]; it is up to the caller whether
//! to skip it or stop.

use std::ops::Range;

use compdeps_assets::asset::is_valid_token;
use compdeps_core::MarkerFormatError;

use crate::scan::{comments, Comments};

/// The marker prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "RENDERED";

/// One rendering marker found in HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderMarker<'a> {
    /// Component-class hash; key into the asset registry.
    pub component_hash: &'a str,
    /// Per-instance id; traceability and initializer lookup only.
    pub instance_id: &'a str,
    /// Optional id of the data factory passed to the initializer.
    pub input_id: Option<&'a str>,
    /// Byte range of the whole comment in the source.
    pub span: Range<usize>,
}

/// Parses rendering markers with a fixed prefix.
#[derive(Debug, Clone)]
pub struct MarkerParser {
    prefix: String,
}

impl Default for MarkerParser {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl MarkerParser {
    /// Creates a parser matching comments that start with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns a lazy iterator over the markers in `html`.
    pub fn parse<'a>(&'a self, html: &'a str) -> Markers<'a> {
        Markers {
            comments: comments(html),
            prefix: &self.prefix,
        }
    }
}

/// Parses markers using [`DEFAULT_PREFIX`].
///
/// # Examples
///
/// ```
/// use compdeps_html::parse_markers;
///
/// let html = r#"<!-- RENDERED "tbl_1a2b,x1" --><table></table>"#;
/// let marker = parse_markers(html).next().unwrap().unwrap();
/// assert_eq!(marker.component_hash, "tbl_1a2b");
/// assert_eq!(marker.instance_id, "x1");
/// assert_eq!(marker.span, 0..31);
/// ```
pub const fn parse_markers(html: &str) -> Markers<'_> {
    Markers {
        comments: comments(html),
        prefix: DEFAULT_PREFIX,
    }
}

/// Lazy, finite iterator over the markers of one document.
///
/// Clone it before consuming to walk the same markers again.
#[derive(Debug, Clone)]
pub struct Markers<'a> {
    comments: Comments<'a>,
    prefix: &'a str,
}

impl<'a> Markers<'a> {
    /// Collects the well-formed markers, dropping malformed ones.
    pub fn valid(self) -> Vec<RenderMarker<'a>> {
        self.filter_map(Result::ok).collect()
    }
}

impl<'a> Iterator for Markers<'a> {
    type Item = Result<RenderMarker<'a>, MarkerFormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        let src = self.comments.source();
        loop {
            let comment = self.comments.next()?;
            let body = src[comment.body.clone()].trim();

            let Some(after) = body.strip_prefix(self.prefix) else {
                continue;
            };
            // `RENDEREDX` is some other comment, not a malformed marker.
            let is_marker = after.is_empty()
                || after.starts_with(char::is_whitespace)
                || after.starts_with('"');
            if !is_marker {
                continue;
            }

            return Some(parse_payload(after.trim(), comment.span));
        }
    }
}

fn parse_payload(raw: &str, span: Range<usize>) -> Result<RenderMarker<'_>, MarkerFormatError> {
    let payload = match (raw.strip_prefix('"'), raw.ends_with('"')) {
        (Some(inner), true) if !inner.is_empty() => &inner[..inner.len() - 1],
        (None, false) => raw,
        _ => {
            return Err(MarkerFormatError::new(
                format!("unbalanced quotes in marker payload '{raw}'"),
                span,
            ))
        }
    };

    if payload.is_empty() {
        return Err(MarkerFormatError::new("empty marker payload", span));
    }

    let parts: Vec<&str> = payload.split(',').map(str::trim).collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(MarkerFormatError::new(
            format!(
                "expected 'componentHash,instanceId', got {} field(s) in '{payload}'",
                parts.len()
            ),
            span,
        ));
    }
    if let Some(bad) = parts.iter().find(|p| !is_valid_token(p)) {
        return Err(MarkerFormatError::new(
            format!("invalid token '{bad}' in marker payload '{payload}'"),
            span,
        ));
    }

    Ok(RenderMarker {
        component_hash: parts[0],
        instance_id: parts[1],
        input_id: parts.get(2).copied(),
        span,
    })
}
