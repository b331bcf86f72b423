//! Rendering assets as HTML tags.
//!
//! Linked assets render as `<script src>` / `<link href rel="stylesheet">`.
//! Inline assets render either linked through their cache URL or, when the
//! cached source is supplied, as literal `<script>` / `<style>` blocks.
//! Every declared attribute is emitted in declaration order.

use std::fmt::Write;

use crate::asset::{AssetKind, Attr, ComponentAsset};

/// Escapes HTML special characters for use inside an attribute value.
pub fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Renders attributes as ` name="value"` pairs, boolean attributes bare.
fn write_attrs(out: &mut String, attrs: &[Attr]) {
    for attr in attrs {
        match &attr.value {
            Some(value) => {
                let _ = write!(out, " {}=\"{}\"", attr.name, escape_attr(value));
            }
            None => {
                let _ = write!(out, " {}", attr.name);
            }
        }
    }
}

fn has_attr(attrs: &[Attr], name: &str) -> bool {
    attrs.iter().any(|a| a.name.eq_ignore_ascii_case(name))
}

/// Keeps inline source from closing its own element early.
fn guard_raw_text(source: &str, element: &str) -> String {
    let closing = format!("</{element}");
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(pos) = find_ignore_case(rest, &closing) {
        out.push_str(&rest[..pos]);
        out.push_str("<\\/");
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

/// Renders an asset as a tag that references it by URL.
///
/// # Examples
///
/// ```
/// use compdeps_assets::asset::{AssetKind, AssetSource, Attr, ComponentAsset};
/// use compdeps_assets::tag::render_linked;
///
/// let asset = ComponentAsset {
///     kind: AssetKind::Script,
///     source: AssetSource::Url("/a.js".into()),
///     attrs: vec![Attr::flag("defer")],
/// };
/// assert_eq!(render_linked(&asset), r#"<script src="/a.js" defer></script>"#);
/// ```
pub fn render_linked(asset: &ComponentAsset) -> String {
    let mut out = String::new();
    let url = escape_attr(asset.resource_id());
    match asset.kind {
        AssetKind::Script => {
            let _ = write!(out, "<script src=\"{url}\"");
            write_attrs(&mut out, &asset.attrs);
            out.push_str("></script>");
        }
        AssetKind::Style => {
            let _ = write!(out, "<link href=\"{url}\"");
            if !has_attr(&asset.attrs, "rel") {
                out.push_str(" rel=\"stylesheet\"");
            }
            write_attrs(&mut out, &asset.attrs);
            out.push('>');
        }
    }
    out
}

/// Renders inline source as a literal `<script>` or `<style>` element.
///
/// URL-only attributes (`src`, `href`, `rel`) are dropped.
pub fn render_inline(kind: AssetKind, source: &str, attrs: &[Attr]) -> String {
    let element = match kind {
        AssetKind::Script => "script",
        AssetKind::Style => "style",
    };
    let attrs: Vec<Attr> = attrs
        .iter()
        .filter(|a| !["src", "href", "rel"].iter().any(|n| a.name.eq_ignore_ascii_case(n)))
        .cloned()
        .collect();

    let mut out = String::new();
    let _ = write!(out, "<{element}");
    write_attrs(&mut out, &attrs);
    out.push('>');
    out.push_str(&guard_raw_text(source, element));
    let _ = write!(out, "</{element}>");
    out
}

/// Renders an asset, inlining it when its cached source is supplied.
pub fn render(asset: &ComponentAsset, inline_source: Option<&str>) -> String {
    match inline_source {
        Some(source) => render_inline(asset.kind, source, &asset.attrs),
        None => render_linked(asset),
    }
}
