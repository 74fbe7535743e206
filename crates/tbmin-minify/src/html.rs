//! HTML minification.
//!
//! Text between tags is buffered until the next boundary is known, so
//! whitespace can be judged against both neighbours: next to a block-level
//! tag it never renders and is dropped, between inline content it collapses
//! to one space. Raw-text bodies are either delegated to the CSS / JS
//! minifiers or copied byte for byte.

use tbmin_lexer::html::is_html_whitespace;
use tbmin_lexer::token::{is_block_level, is_invisible};
use tbmin_lexer::{HtmlScanner, HtmlToken, LexerError, Region, RegionKind, Tag};

use crate::{Capability, EmbeddedPolicy, Language, Minified, MinifyConfig};

/// How a neighbour of a text run treats whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    /// Block-level tag or the document edge.
    Block,
    Inline,
}

pub fn minify(source: &str, policy: EmbeddedPolicy, config: &MinifyConfig) -> Minified {
    let mut scanner = HtmlScanner::new(source);
    let mut writer = HtmlWriter::new(policy, config, source.len());
    for token in scanner.by_ref() {
        writer.push(token);
    }
    writer.flush_text(Boundary::Block);

    let mut diagnostics = scanner.into_diagnostics();
    diagnostics.append(&mut writer.diagnostics);
    diagnostics.sort_by_key(|d| (d.line, d.column));

    Minified {
        output: writer.out,
        diagnostics,
    }
}

struct HtmlWriter<'c> {
    policy: EmbeddedPolicy,
    config: &'c MinifyConfig,
    out: String,
    /// Text seen since the last boundary; removed comments do not end it.
    text: String,
    prev: Boundary,
    diagnostics: Vec<LexerError>,
}

impl<'c> HtmlWriter<'c> {
    fn new(policy: EmbeddedPolicy, config: &'c MinifyConfig, capacity: usize) -> Self {
        Self {
            policy,
            config,
            out: String::with_capacity(capacity),
            text: String::new(),
            prev: Boundary::Block,
            diagnostics: Vec::new(),
        }
    }

    fn push(&mut self, token: HtmlToken<'_>) {
        match token {
            HtmlToken::Text(text) => self.text.push_str(text),
            HtmlToken::Comment { text, conditional } => {
                if conditional || !self.config.remove_comments {
                    self.flush_text(Boundary::Inline);
                    self.out.push_str(text);
                    self.prev = Boundary::Inline;
                }
            }
            HtmlToken::Verbatim(text) => {
                self.flush_text(Boundary::Inline);
                self.out.push_str(text);
                self.prev = Boundary::Inline;
            }
            HtmlToken::Tag(tag) => {
                let boundary = self.boundary_of(&tag);
                self.flush_text(boundary);
                self.write_tag(&tag);
                self.prev = boundary;
            }
            HtmlToken::Body(region) => self.write_body(region),
        }
    }

    /// An invisible element (`<script>`, `<meta>`, ...) is transparent: it
    /// continues a block boundary only when nothing but whitespace has been
    /// seen since, otherwise it sits between inline content.
    fn boundary_of(&self, tag: &Tag<'_>) -> Boundary {
        if is_block_level(tag.name) {
            return Boundary::Block;
        }
        let blank = self.text.trim_matches(is_html_whitespace).is_empty();
        if is_invisible(tag.name) && self.prev == Boundary::Block && blank {
            Boundary::Block
        } else {
            Boundary::Inline
        }
    }

    /// Emit buffered text, now that the boundary after it is known.
    fn flush_text(&mut self, next: Boundary) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        if !self.config.collapse_whitespace {
            self.out.push_str(&text);
            return;
        }

        let body = text.trim_matches(is_html_whitespace);
        if body.is_empty() {
            if self.prev == Boundary::Inline && next == Boundary::Inline {
                self.out.push(self.separator(&text));
            }
            return;
        }

        let leading = &text[..text.len() - text.trim_start_matches(is_html_whitespace).len()];
        let trailing = &text[text.trim_end_matches(is_html_whitespace).len()..];

        if !leading.is_empty() && self.prev == Boundary::Inline {
            self.out.push(self.separator(leading));
        }
        self.push_collapsed(body);
        if !trailing.is_empty() && next == Boundary::Inline {
            self.out.push(self.separator(trailing));
        }
    }

    /// Copy `body`, replacing each inner whitespace run with one separator.
    fn push_collapsed(&mut self, body: &str) {
        let mut rest = body;
        while let Some(ws_start) = rest.find(is_html_whitespace) {
            self.out.push_str(&rest[..ws_start]);
            let after = rest[ws_start..].trim_start_matches(is_html_whitespace);
            let run = &rest[ws_start..rest.len() - after.len()];
            let sep = self.separator(run);
            self.out.push(sep);
            rest = after;
        }
        self.out.push_str(rest);
    }

    fn separator(&self, run: &str) -> char {
        if self.config.preserve_line_breaks && run.contains('\n') {
            '\n'
        } else {
            ' '
        }
    }

    /// Rebuild a tag with single spaces between attributes. Attribute values
    /// are copied exactly as written.
    fn write_tag(&mut self, tag: &Tag<'_>) {
        if !self.config.collapse_whitespace {
            self.out.push_str(tag.raw);
            return;
        }

        self.out.push('<');
        if tag.closing {
            self.out.push('/');
        }
        self.out.push_str(tag.name);
        for attr in &tag.attributes {
            if !attr.leading.is_empty() {
                let sep = self.separator(attr.leading);
                self.out.push(sep);
            }
            self.out.push_str(attr.name);
            if let Some(value) = attr.value {
                self.out.push('=');
                match attr.quote {
                    Some(q) => {
                        self.out.push(q);
                        self.out.push_str(value);
                        self.out.push(q);
                    }
                    None => self.out.push_str(value),
                }
            }
        }
        if tag.self_closing {
            // `a=b/>` would read the slash as part of the value
            let unquoted_last = tag
                .attributes
                .last()
                .is_some_and(|a| a.value.is_some() && a.quote.is_none());
            if unquoted_last {
                self.out.push(' ');
            }
            self.out.push('/');
        }
        self.out.push('>');
    }

    fn write_body(&mut self, region: Region<'_>) {
        let language = match region.kind {
            RegionKind::ScriptBody
                if self.config.minify_embedded_js
                    && self.policy.contains(Capability::JsMinifier) =>
            {
                Language::Js
            }
            RegionKind::StyleBody
                if self.config.minify_embedded_css
                    && self.policy.contains(Capability::CssMinifier) =>
            {
                Language::Css
            }
            _ => {
                self.out.push_str(region.text);
                return;
            }
        };

        let output = self.delegate(language, region);
        self.out.push_str(output.as_deref().unwrap_or(region.text));
    }

    /// Minify an embedded body. `None` means the original must be kept: the
    /// delegate panicked, had to pass something through, or produced text
    /// that would close the element early.
    fn delegate(&mut self, language: Language, region: Region<'_>) -> Option<String> {
        let (result, closing) = match language {
            Language::Css => (crate::try_minify_css(region.text, self.config), "</style"),
            _ => (crate::try_minify_js(region.text, self.config), "</script"),
        };
        let minified = result.ok()?;

        if !minified.diagnostics.is_empty() {
            self.diagnostics.extend(
                minified
                    .diagnostics
                    .iter()
                    .map(|d| relocate(d, &region)),
            );
            return None;
        }
        if minified.output.to_ascii_lowercase().contains(closing) {
            return None;
        }
        Some(minified.output)
    }
}

/// Translate a diagnostic inside an embedded body to document coordinates.
fn relocate(diagnostic: &LexerError, region: &Region<'_>) -> LexerError {
    let line = region.span.line + diagnostic.line - 1;
    let column = if diagnostic.line == 1 {
        region.span.column + diagnostic.column - 1
    } else {
        diagnostic.column
    };
    LexerError::new(diagnostic.kind, line, column)
}
