//! A minimal HTML scanner.
//!
//! [`tokens`] yields the markup-level pieces of a document: comments, start
//! tags, end tags, and declarations such as `<!DOCTYPE html>`. Text that
//! merely looks like markup is skipped when it sits inside an attribute
//! value or inside the raw text of `<script>`, `<style>`, `<textarea>`,
//! `<title>`, or `<xmp>`. That is all the rewriter needs; no DOM is built.
//!
//! [`comments`] narrows the stream to comments for the marker parser, and
//! the `find_*` helpers locate insertion points and placeholders.

use std::ops::Range;

/// Elements whose content is raw text and never contains markup.
const RAW_TEXT_ELEMENTS: [&str; 5] = ["script", "style", "textarea", "title", "xmp"];

/// A comment found in markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// The whole comment, `<!--` through `-->`.
    pub span: Range<usize>,
    /// The text between the delimiters.
    pub body: Range<usize>,
}

/// A start or end tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// The whole tag, `<` through `>`.
    pub span: Range<usize>,
    /// The element name.
    pub name: Range<usize>,
}

impl Tag {
    /// Whether this tag names `element`, ignoring ASCII case.
    pub fn is(&self, src: &str, element: &str) -> bool {
        src[self.name.clone()].eq_ignore_ascii_case(element)
    }
}

/// One piece of markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `<!-- ... -->`.
    Comment(Comment),
    /// `<name ...>`.
    StartTag(Tag),
    /// `</name>`.
    EndTag(Tag),
    /// `<!DOCTYPE ...>`, `<?...>`, and other bogus comments.
    Declaration(Range<usize>),
}

impl Token {
    /// Byte range of the token in the source.
    pub fn span(&self) -> Range<usize> {
        match self {
            Self::Comment(c) => c.span.clone(),
            Self::StartTag(t) | Self::EndTag(t) => t.span.clone(),
            Self::Declaration(span) => span.clone(),
        }
    }
}

/// Lazy iterator over the markup tokens of an HTML string.
///
/// Cloning the iterator forks the scan at its current position.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    src: &'a str,
    pos: usize,
}

/// Scans `src` for markup tokens in document order.
pub const fn tokens(src: &str) -> Tokens<'_> {
    Tokens { src, pos: 0 }
}

impl<'a> Tokens<'a> {
    /// The source being scanned.
    pub const fn source(&self) -> &'a str {
        self.src
    }

    fn comment(&mut self, start: usize) -> Option<Token> {
        let bytes = self.src.as_bytes();
        let body_start = start + 4;
        let (body_end, end) = if bytes[start..].starts_with(b"<!-->") {
            (body_start, start + 5)
        } else if bytes[start..].starts_with(b"<!--->") {
            (body_start, start + 6)
        } else if let Some(close) = find_bytes(bytes, body_start, b"-->") {
            (close, close + 3)
        } else {
            // An unterminated comment swallows the rest of the input.
            self.pos = bytes.len();
            return None;
        };
        self.pos = end;
        Some(Token::Comment(Comment {
            span: start..end,
            body: body_start..body_end,
        }))
    }
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let bytes = self.src.as_bytes();
        let len = bytes.len();

        while self.pos < len {
            let Some(offset) = bytes[self.pos..].iter().position(|&b| b == b'<') else {
                self.pos = len;
                return None;
            };
            let start = self.pos + offset;
            let rest = &bytes[start..];

            if rest.starts_with(b"<!--") {
                return self.comment(start);
            }

            if rest.starts_with(b"</") && rest.get(2).is_some_and(u8::is_ascii_alphabetic) {
                let name = tag_name(bytes, start + 2);
                let end = skip_past_gt(bytes, name.end);
                self.pos = end;
                return Some(Token::EndTag(Tag {
                    span: start..end,
                    name,
                }));
            }

            if rest.starts_with(b"</") || rest.starts_with(b"<!") || rest.starts_with(b"<?") {
                let end = skip_past_gt(bytes, start + 2);
                self.pos = end;
                return Some(Token::Declaration(start..end));
            }

            if rest.get(1).is_some_and(u8::is_ascii_alphabetic) {
                let name = tag_name(bytes, start + 1);
                let end = skip_tag(bytes, name.end);
                let tag = Tag {
                    span: start..end,
                    name,
                };
                self.pos = end;

                if let Some(raw) = RAW_TEXT_ELEMENTS.iter().find(|el| tag.is(self.src, el)) {
                    // Resume at the closing tag so it is reported as an end tag.
                    self.pos = find_ignore_case(self.src, end, &format!("</{raw}")).unwrap_or(len);
                }
                return Some(Token::StartTag(tag));
            }

            self.pos = start + 1;
        }

        None
    }
}

/// Lazy iterator over the comments of an HTML string.
#[derive(Debug, Clone)]
pub struct Comments<'a> {
    tokens: Tokens<'a>,
}

/// Scans `src` for markup comments in document order.
///
/// # Examples
///
/// ```
/// use compdeps_html::scan::comments;
///
/// let html = r#"<!-- a --><script>"<!-- b -->"</script><p title="<!-- c -->"></p>"#;
/// let found: Vec<_> = comments(html).map(|c| &html[c.body]).collect();
/// assert_eq!(found, vec![" a "]);
/// ```
pub const fn comments(src: &str) -> Comments<'_> {
    Comments {
        tokens: tokens(src),
    }
}

impl<'a> Comments<'a> {
    /// The source being scanned.
    pub const fn source(&self) -> &'a str {
        self.tokens.source()
    }
}

impl Iterator for Comments<'_> {
    type Item = Comment;

    fn next(&mut self) -> Option<Comment> {
        self.tokens.find_map(|token| match token {
            Token::Comment(c) => Some(c),
            _ => None,
        })
    }
}

/// Byte ranges where `needle` occurs as markup, that is, starting at a real
/// tag, comment, or declaration. Occurrences never overlap.
pub fn find_markup(src: &str, needle: &str) -> Vec<Range<usize>> {
    let mut found = Vec::new();
    if needle.is_empty() {
        return found;
    }
    let mut last_end = 0;
    for token in tokens(src) {
        let start = token.span().start;
        if start >= last_end && src[start..].starts_with(needle) {
            last_end = start + needle.len();
            found.push(start..last_end);
        }
    }
    found
}

/// Offset of the first start tag for `element`.
pub fn find_start_tag(src: &str, element: &str) -> Option<usize> {
    tokens(src).find_map(|token| match token {
        Token::StartTag(tag) if tag.is(src, element) => Some(tag.span.start),
        _ => None,
    })
}

/// Offset of the first end tag for `element`.
pub fn find_end_tag(src: &str, element: &str) -> Option<usize> {
    tokens(src).find_map(|token| match token {
        Token::EndTag(tag) if tag.is(src, element) => Some(tag.span.start),
        _ => None,
    })
}

/// Offset of the last end tag for `element`.
pub fn rfind_end_tag(src: &str, element: &str) -> Option<usize> {
    tokens(src)
        .filter_map(|token| match token {
            Token::EndTag(tag) if tag.is(src, element) => Some(tag.span.start),
            _ => None,
        })
        .last()
}

/// The offset just past the document prologue: any leading declarations,
/// comments, and `<html>`/`<head>` start tags, separated only by whitespace.
pub fn prologue_end(src: &str) -> usize {
    let mut point = 0;
    for token in tokens(src) {
        let span = token.span();
        if !src[point..span.start].trim().is_empty() {
            break;
        }
        let leading = match &token {
            Token::Declaration(_) | Token::Comment(_) => true,
            Token::StartTag(tag) => tag.is(src, "html") || tag.is(src, "head"),
            Token::EndTag(_) => false,
        };
        if !leading {
            break;
        }
        point = span.end;
    }
    point
}

fn tag_name(bytes: &[u8], from: usize) -> Range<usize> {
    let end = bytes[from..]
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'-'))
        .map_or(bytes.len(), |p| from + p);
    from..end
}

/// Skips over a start tag's attributes, honouring quoted values. Returns the
/// index just past the closing `>`.
fn skip_tag(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'"' | b'\'') => {
                i = bytes[i + 1..]
                    .iter()
                    .position(|&b| b == quote)
                    .map_or(bytes.len(), |p| i + 1 + p + 1);
            }
            b'>' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_past_gt(bytes: &[u8], from: usize) -> usize {
    bytes[from.min(bytes.len())..]
        .iter()
        .position(|&b| b == b'>')
        .map_or(bytes.len(), |p| from + p + 1)
}

fn find_bytes(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p)
}

fn find_ignore_case(haystack: &str, from: usize, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .get(from..)?
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
        .map(|p| from + p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bodies(html: &str) -> Vec<&str> {
        comments(html).map(|c| &html[c.body]).collect()
    }

    #[test]
    fn test_finds_comments_in_order() {
        assert_eq!(bodies("<!--a--><p>x</p><!-- b -->"), vec!["a", " b "]);
    }

    #[test]
    fn test_spans_cover_delimiters() {
        let html = "ab<!--c-->d";
        let c = comments(html).next().unwrap();
        assert_eq!(&html[c.span], "<!--c-->");
    }

    #[test]
    fn test_skips_script_and_style_raw_text() {
        let html =
            "<script>var s = '<!-- x -->';</script><STYLE>/* <!-- y --> */</STYLE><!-- z -->";
        assert_eq!(bodies(html), vec![" z "]);
    }

    #[test]
    fn test_skips_textarea_and_title() {
        let html = "<title><!-- t --></title><textarea><!-- u --></textarea>";
        assert!(bodies(html).is_empty());
    }

    #[test]
    fn test_skips_attribute_values() {
        let html = r#"<div data-a="<!-- q -->" data-b='<!-- r -->'>ok</div><!-- s -->"#;
        assert_eq!(bodies(html), vec![" s "]);
    }

    #[test]
    fn test_gt_inside_attribute_does_not_end_tag() {
        let html = r#"<a title="1 > 0 <!-- n -->">x</a>"#;
        assert!(bodies(html).is_empty());
    }

    #[test]
    fn test_unterminated_comment_ends_scan() {
        assert!(bodies("<p><!-- open").is_empty());
    }

    #[test]
    fn test_unterminated_script_hides_rest() {
        assert!(bodies("<script>x<!-- a -->").is_empty());
    }

    #[test]
    fn test_doctype_and_end_tags_are_skipped() {
        assert_eq!(bodies("<!DOCTYPE html></p><!--k-->"), vec!["k"]);
    }

    #[test]
    fn test_empty_comments_end_immediately() {
        assert_eq!(bodies("<!--><!--m-->"), vec!["", "m"]);
        assert_eq!(bodies("<!---><!--m-->"), vec!["", "m"]);
        let html = "<!-->x";
        assert_eq!(&html[comments(html).next().unwrap().span], "<!-->");
    }

    #[test]
    fn test_handles_non_ascii_text() {
        assert_eq!(bodies("<p>héllo → <!--ü--></p>"), vec!["ü"]);
    }

    #[test]
    fn test_tokens_report_raw_text_end_tags() {
        let html = "<!DOCTYPE html><title>a</b></title><p>";
        let kinds: Vec<&str> = tokens(html)
            .map(|t| match t {
                Token::Comment(_) => "comment",
                Token::StartTag(_) => "start",
                Token::EndTag(_) => "end",
                Token::Declaration(_) => "decl",
            })
            .collect();
        assert_eq!(kinds, vec!["decl", "start", "end", "start"]);
    }

    #[test]
    fn test_find_markup_skips_raw_text_and_attributes() {
        let html = r#"<script>'<P>'</script><a title="<P>"><P></a><P>"#;
        let found = find_markup(html, "<P>");
        assert_eq!(found.len(), 2);
        assert_eq!(&html[found[0].clone()], "<P>");
        assert_eq!(found[0].start, html.find("><P></a>").unwrap() + 1);
    }

    #[test]
    fn test_find_tags_ignore_case() {
        assert_eq!(find_end_tag("<HEAD></HEAD>", "head"), Some(6));
        assert_eq!(rfind_end_tag("</body></BODY>", "body"), Some(7));
        assert_eq!(find_start_tag("<script>'<body>'</script><Body>", "body"), Some(25));
        assert_eq!(find_end_tag("<script>'</head>'</script>", "head"), None);
    }

    #[test]
    fn test_prologue_end() {
        let html = "<!DOCTYPE html>\n<html lang=\"en\"><head><title>t</title>";
        assert_eq!(prologue_end(html), html.find("<title>").unwrap());
        assert_eq!(prologue_end("<p></p>"), 0);
        assert_eq!(prologue_end("text<html>"), 0);
    }
}
