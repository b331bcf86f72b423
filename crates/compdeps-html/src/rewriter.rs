//! The dependency-injecting HTML rewriter.
//!
//! [`Rewriter::rewrite`] takes rendered HTML, finds its rendering markers,
//! resolves each component's assets, and returns HTML in which:
//!
//! - every marker is removed,
//! - CSS is present as literal `<style>`/`<link>` tags (never deferred to
//!   script execution, so there is no unstyled flash),
//! - JS is delivered through one loader payload script,
//! - every asset appears at most once, deduplicated by resource id.
//!
//! Rewriting is total. Malformed markers, unknown components, and cache
//! misses are logged, collected in [`RewriteOutput::errors`], and skipped;
//! they never abort the page.

use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;

use compdeps_assets::payload::{Instruction, Payload};
use compdeps_assets::tag::{render, render_linked};
use compdeps_assets::{AssetKind, AssetRegistry, ComponentAsset, Resolver};
use compdeps_core::logging::rewrite_span;
use compdeps_core::{DependencyStrategy, DepsError, Settings};

use crate::marker::{MarkerParser, RenderMarker};
use crate::scan::{find_end_tag, find_markup, find_start_tag, prologue_end, rfind_end_tag};

/// The result of a rewrite.
#[derive(Debug)]
pub struct RewriteOutput {
    /// The rewritten HTML.
    pub html: String,
    /// Loader instructions for the JS dependencies (empty for strategies
    /// that emit plain tags).
    pub js: Payload,
    /// Rendered CSS tags, in first-discovery order.
    pub css: Vec<String>,
    /// Per-component problems that were skipped.
    pub errors: Vec<DepsError>,
}

/// Assets and initializer calls gathered from one document's markers.
#[derive(Debug, Default)]
struct Collected {
    styles: Vec<ComponentAsset>,
    scripts: Vec<ComponentAsset>,
    calls: Vec<Instruction>,
    marker_spans: Vec<Range<usize>>,
    errors: Vec<DepsError>,
}

impl Collected {
    fn is_empty(&self) -> bool {
        self.styles.is_empty() && self.scripts.is_empty() && self.calls.is_empty()
    }
}

/// Rewrites rendered HTML so each dependency loads exactly once.
#[derive(Debug, Clone)]
pub struct Rewriter {
    resolver: Resolver,
    parser: MarkerParser,
    settings: Settings,
}

impl Rewriter {
    /// Creates a rewriter from an explicit resolver and settings.
    pub fn new(resolver: Resolver, settings: Settings) -> Self {
        Self {
            parser: MarkerParser::new(settings.marker_prefix.clone()),
            resolver,
            settings,
        }
    }

    /// Creates a rewriter using the registry's own settings.
    pub fn from_registry(registry: Arc<AssetRegistry>) -> Self {
        let settings = registry.settings().clone();
        Self::new(Resolver::new(registry), settings)
    }

    /// The marker parser this rewriter uses.
    pub const fn parser(&self) -> &MarkerParser {
        &self.parser
    }

    /// The settings this rewriter uses.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Rewrites `html` with the configured default strategy.
    pub fn rewrite(&self, html: &str) -> RewriteOutput {
        self.rewrite_with(html, self.settings.default_strategy)
    }

    /// Rewrites `html` with an explicit strategy.
    pub fn rewrite_with(&self, html: &str, strategy: DependencyStrategy) -> RewriteOutput {
        if strategy == DependencyStrategy::Ignore {
            return Self::untouched(html);
        }

        let mut errors = Vec::new();
        let mut markers = Vec::new();
        for result in self.parser.parse(html) {
            match result {
                Ok(marker) => markers.push(marker),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed rendering marker");
                    errors.push(DepsError::MarkerFormat(e));
                }
            }
        }

        let mut output = self.rewrite_with_markers(html, &markers, strategy);
        errors.append(&mut output.errors);
        output.errors = errors;
        output
    }

    /// Rewrites `html` given its already-parsed markers.
    ///
    /// Marker spans must refer to `html`.
    pub fn rewrite_with_markers(
        &self,
        html: &str,
        markers: &[RenderMarker<'_>],
        strategy: DependencyStrategy,
    ) -> RewriteOutput {
        if strategy == DependencyStrategy::Ignore {
            return Self::untouched(html);
        }

        let span = rewrite_span(strategy, html.len());
        let _guard = span.enter();

        let mut collected = self.collect(markers);
        collected.marker_spans.retain(|s| {
            s.start <= s.end && html.is_char_boundary(s.start) && html.is_char_boundary(s.end)
        });
        collected.marker_spans.sort_by_key(|s| s.start);
        let stripped = strip_spans(html, &collected.marker_spans);

        let output = match strategy {
            DependencyStrategy::Document => self.render_document(stripped, &mut collected),
            DependencyStrategy::Fragment => self.render_fragment(stripped, &collected),
            DependencyStrategy::Simple => self.render_simple(stripped, &mut collected),
            DependencyStrategy::Prepend | DependencyStrategy::Append => {
                self.render_edges(stripped, &mut collected, strategy)
            }
            DependencyStrategy::Ignore => return Self::untouched(html),
        };

        tracing::debug!(
            markers = markers.len(),
            styles = collected.styles.len(),
            scripts = collected.scripts.len(),
            errors = collected.errors.len(),
            "Rewrote HTML"
        );

        RewriteOutput {
            errors: collected.errors,
            ..output
        }
    }

    fn untouched(html: &str) -> RewriteOutput {
        RewriteOutput {
            html: html.to_string(),
            js: Payload::new(),
            css: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Resolves every marker and gathers deduplicated assets in
    /// first-discovery order.
    fn collect(&self, markers: &[RenderMarker<'_>]) -> Collected {
        let mut collected = Collected::default();
        let mut seen_assets: HashSet<String> = HashSet::new();
        let mut seen_instances: HashSet<&str> = HashSet::new();

        for marker in markers {
            collected.marker_spans.push(marker.span.clone());

            let definition = match self.resolver.resolve(marker.component_hash) {
                Ok(definition) => definition,
                Err(e) => {
                    tracing::warn!(
                        hash = %marker.component_hash,
                        instance = %marker.instance_id,
                        error = %e,
                        "Skipping assets of unresolved component"
                    );
                    collected.errors.push(e);
                    continue;
                }
            };

            for asset in &definition.assets {
                if !seen_assets.insert(asset.resource_id().to_string()) {
                    continue;
                }
                match asset.kind {
                    AssetKind::Style => collected.styles.push(asset.clone()),
                    AssetKind::Script => collected.scripts.push(asset.clone()),
                }
            }

            if definition.has_scripts() && seen_instances.insert(marker.instance_id) {
                collected.calls.push(Instruction::Call {
                    name: definition.hash.clone(),
                    instance_id: marker.instance_id.to_string(),
                    input_id: marker.input_id.map(str::to_string),
                    deps: definition
                        .scripts()
                        .map(|asset| asset.resource_id().to_string())
                        .collect(),
                });
            }
        }

        collected
    }

    /// Renders an asset with its cached source inlined when it has one.
    ///
    /// A cache miss degrades to the linked form and is recorded.
    fn render_tag(&self, asset: &ComponentAsset, errors: &mut Vec<DepsError>) -> String {
        match self.resolver.inline_content(asset) {
            Ok(source) => render(asset, source.as_deref()),
            Err(e) => {
                tracing::warn!(asset = %asset.resource_id(), error = %e, "Inline content missing");
                errors.push(e);
                render_linked(asset)
            }
        }
    }

    fn render_styles(&self, collected: &mut Collected) -> Vec<String> {
        let mut errors = Vec::new();
        let tags = collected
            .styles
            .iter()
            .map(|asset| self.render_tag(asset, &mut errors))
            .collect();
        collected.errors.append(&mut errors);
        tags
    }

    fn loader_tag(&self) -> String {
        self.settings
            .loader_script_url
            .as_deref()
            .map(|url| {
                render_linked(&ComponentAsset {
                    kind: AssetKind::Script,
                    source: compdeps_assets::AssetSource::Url(url.to_string()),
                    attrs: Vec::new(),
                })
            })
            .unwrap_or_default()
    }

    fn render_document(&self, html: String, collected: &mut Collected) -> RewriteOutput {
        let css = self.render_styles(collected);

        let mut payload = Payload::new();
        for asset in &collected.styles {
            payload.push(Instruction::MarkLoaded {
                kind: AssetKind::Style,
                id: asset.resource_id().to_string(),
            });
        }
        for asset in &collected.scripts {
            payload.push(Instruction::Load {
                kind: AssetKind::Script,
                tag: render_linked(asset),
            });
        }
        payload.extend(collected.calls.iter().cloned());

        let js_block = if collected.is_empty() {
            String::new()
        } else {
            format!("{}{}", self.loader_tag(), payload.to_script_tag())
        };

        let html = place_css(&html, &self.settings.css_placeholder, &css.concat());
        let html = place_js(&html, &self.settings.js_placeholder, &js_block);

        RewriteOutput {
            html,
            js: payload,
            css,
            errors: Vec::new(),
        }
    }

    fn render_fragment(&self, html: String, collected: &Collected) -> RewriteOutput {
        let css: Vec<String> = collected.styles.iter().map(render_linked).collect();

        let mut payload = Payload::new();
        for (asset, tag) in collected.styles.iter().zip(&css) {
            payload.push(Instruction::Load {
                kind: asset.kind,
                tag: tag.clone(),
            });
        }
        for asset in &collected.scripts {
            payload.push(Instruction::Load {
                kind: AssetKind::Script,
                tag: render_linked(asset),
            });
        }
        payload.extend(collected.calls.iter().cloned());

        let js_block = if payload.is_empty() {
            String::new()
        } else {
            payload.to_script_tag()
        };

        let html = replace_placeholder(&html, &self.settings.css_placeholder, "").0;
        let (mut html, found) =
            replace_placeholder(&html, &self.settings.js_placeholder, &js_block);
        if !found {
            html.push_str(&js_block);
        }

        RewriteOutput {
            html,
            js: payload,
            css,
            errors: Vec::new(),
        }
    }

    fn render_scripts(&self, collected: &mut Collected) -> Vec<String> {
        let mut errors = Vec::new();
        let tags = collected
            .scripts
            .iter()
            .map(|asset| self.render_tag(asset, &mut errors))
            .collect();
        collected.errors.append(&mut errors);
        tags
    }

    fn render_simple(&self, html: String, collected: &mut Collected) -> RewriteOutput {
        let css = self.render_styles(collected);
        let js = self.render_scripts(collected);

        let html = place_css(&html, &self.settings.css_placeholder, &css.concat());
        let html = place_js(&html, &self.settings.js_placeholder, &js.concat());

        RewriteOutput {
            html,
            js: Payload::new(),
            css,
            errors: Vec::new(),
        }
    }

    fn render_edges(
        &self,
        html: String,
        collected: &mut Collected,
        strategy: DependencyStrategy,
    ) -> RewriteOutput {
        let css = self.render_styles(collected);
        let js = self.render_scripts(collected);
        let block = format!("{}{}", css.concat(), js.concat());

        let html = replace_placeholder(&html, &self.settings.css_placeholder, "").0;
        let html = replace_placeholder(&html, &self.settings.js_placeholder, "").0;
        let html = if strategy == DependencyStrategy::Prepend {
            block + &html
        } else {
            html + &block
        };

        RewriteOutput {
            html,
            js: Payload::new(),
            css,
            errors: Vec::new(),
        }
    }
}

/// Copies `html` without the given (sorted, non-overlapping) spans.
fn strip_spans(html: &str, spans: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for span in spans {
        if span.start < last {
            continue;
        }
        out.push_str(&html[last..span.start]);
        last = span.end;
    }
    out.push_str(&html[last..]);
    out
}

/// Replaces the first placeholder tag with `block` and removes any further
/// ones. Placeholder text inside raw text or attribute values is not a tag
/// and stays. Returns whether a placeholder was found.
fn replace_placeholder(html: &str, placeholder: &str, block: &str) -> (String, bool) {
    let spans = find_markup(html, placeholder);
    let mut out = String::with_capacity(html.len() + block.len());
    let mut last = 0;
    for (i, span) in spans.iter().enumerate() {
        out.push_str(&html[last..span.start]);
        if i == 0 {
            out.push_str(block);
        }
        last = span.end;
    }
    out.push_str(&html[last..]);
    (out, !spans.is_empty())
}

/// Places CSS at its placeholder, else before `</head>`, else before the
/// first `<body>`, else after the doctype and `<html>`/`<head>` prologue.
fn place_css(html: &str, placeholder: &str, block: &str) -> String {
    let (out, found) = replace_placeholder(html, placeholder, block);
    if found || block.is_empty() {
        return out;
    }
    let pos = find_end_tag(&out, "head")
        .or_else(|| find_start_tag(&out, "body"))
        .unwrap_or_else(|| prologue_end(&out));
    insert_at(&out, pos, block)
}

/// Places JS at its placeholder, else before the last `</body>`, else at the end.
fn place_js(html: &str, placeholder: &str, block: &str) -> String {
    let (out, found) = replace_placeholder(html, placeholder, block);
    if found || block.is_empty() {
        return out;
    }
    let pos = rfind_end_tag(&out, "body").unwrap_or(out.len());
    insert_at(&out, pos, block)
}

fn insert_at(html: &str, pos: usize, block: &str) -> String {
    let mut out = String::with_capacity(html.len() + block.len());
    out.push_str(&html[..pos]);
    out.push_str(block);
    out.push_str(&html[pos..]);
    out
}
