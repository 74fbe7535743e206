//! HTML segmenter.
//!
//! Splits a document into text, tags, comments and verbatim declarations,
//! and hands the bodies of `script`, `style`, `pre` and `textarea` out as
//! classified [`Region`]s. This is a tokenizer, not a tree builder: tags are
//! not matched against each other except to find the end of a raw body.

use crate::stream::{CharStream, Checkpoint};
use crate::token::{Region, RegionKind};
use crate::{ErrorKind, LexerError};

/// Elements whose content is not markup for the minifier's purposes.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "pre", "textarea"];

/// `type` values (lowercased, parameters stripped) that browsers execute.
pub const EXECUTABLE_SCRIPT_TYPES: &[&str] = &[
    "",
    "application/ecmascript",
    "application/javascript",
    "application/x-ecmascript",
    "application/x-javascript",
    "module",
    "text/ecmascript",
    "text/javascript",
    "text/javascript1.0",
    "text/javascript1.1",
    "text/javascript1.2",
    "text/javascript1.3",
    "text/javascript1.4",
    "text/javascript1.5",
    "text/jscript",
    "text/livescript",
    "text/x-ecmascript",
    "text/x-javascript",
];

/// HTML whitespace. Deliberately excludes U+00A0, which renders.
pub fn is_html_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{000C}')
}

/// An attribute as written in a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: &'a str,
    /// Value without its quotes.
    pub value: Option<&'a str>,
    pub quote: Option<char>,
    /// Whitespace that preceded the attribute.
    pub leading: &'a str,
}

/// A start or end tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
    pub name: &'a str,
    pub closing: bool,
    pub self_closing: bool,
    pub attributes: Vec<Attribute<'a>>,
    /// Whitespace between the last attribute and `>` / `/>`.
    pub trailing: &'a str,
    /// The tag exactly as written.
    pub raw: &'a str,
}

impl<'a> Tag<'a> {
    /// Case-insensitive tag name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute<'a>> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    fn opens_raw_text(&self) -> bool {
        !self.closing && RAW_TEXT_ELEMENTS.iter().any(|name| self.is(name))
    }

    /// Classify the body this start tag opens.
    pub fn body_kind(&self) -> RegionKind {
        let mime = self
            .attribute("type")
            .and_then(|a| a.value)
            .map(|v| {
                v.split(';')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_ascii_lowercase()
            })
            .unwrap_or_default();

        if self.is("script") && EXECUTABLE_SCRIPT_TYPES.contains(&mime.as_str()) {
            RegionKind::ScriptBody
        } else if self.is("style") && (mime.is_empty() || mime == "text/css") {
            RegionKind::StyleBody
        } else {
            RegionKind::PreservedBlock
        }
    }
}

/// A segment of an HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlToken<'a> {
    Text(&'a str),
    Tag(Tag<'a>),
    /// A complete `<!-- ... -->`, delimiters included.
    Comment { text: &'a str, conditional: bool },
    /// Doctype, processing instruction, CDATA, or anything passed through
    /// untouched because it could not be segmented.
    Verbatim(&'a str),
    /// Body of a raw-text element.
    Body(Region<'a>),
}

impl HtmlToken<'_> {
    /// How the span this token covers is treated: everything outside a
    /// raw-text body is plain markup.
    pub fn region_kind(&self) -> RegionKind {
        match self {
            HtmlToken::Body(region) => region.kind,
            _ => RegionKind::PlainMarkup,
        }
    }
}

/// HTML scanner. Yields [`HtmlToken`]s lazily and never fails.
pub struct HtmlScanner<'a> {
    stream: CharStream<'a>,
    /// Raw-text element whose body comes next, and its classification.
    pending_body: Option<(&'a str, RegionKind)>,
    diagnostics: Vec<LexerError>,
}

impl<'a> HtmlScanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            stream: CharStream::new(source),
            pending_body: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn diagnostics(&self) -> &[LexerError] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<LexerError> {
        self.diagnostics
    }

    fn scan(&mut self) -> Option<HtmlToken<'a>> {
        if let Some((name, kind)) = self.pending_body.take() {
            if let Some(body) = self.scan_body(name, kind) {
                return Some(body);
            }
        }

        if self.stream.is_at_end() {
            return None;
        }

        if self.at_markup_start() {
            Some(self.scan_markup())
        } else {
            Some(self.scan_text())
        }
    }

    /// `<` followed by something that opens a tag, comment or declaration.
    fn at_markup_start(&self) -> bool {
        if self.stream.peek(0) != '<' {
            return false;
        }
        match self.stream.peek(1) {
            c if c.is_ascii_alphabetic() => true,
            '/' => self.stream.peek(2).is_ascii_alphabetic(),
            '!' | '?' => true,
            _ => false,
        }
    }

    fn scan_text(&mut self) -> HtmlToken<'a> {
        let start = self.stream.position();
        self.stream.advance();
        while !self.stream.is_at_end() && !self.at_markup_start() {
            self.stream.advance();
        }
        HtmlToken::Text(self.stream.slice_from(start))
    }

    fn scan_markup(&mut self) -> HtmlToken<'a> {
        let start = self.stream.checkpoint();

        if self.stream.starts_with("<!--") {
            return self.scan_comment(start);
        }
        if self.stream.starts_with("<![CDATA[") {
            return self.scan_declaration(start, "]]>");
        }
        if self.stream.starts_with_ignore_case("<!doctype") || self.stream.starts_with("<![") {
            return self.scan_declaration(start, ">");
        }
        if self.stream.starts_with("<!") || self.stream.starts_with("<?") {
            // Bogus comment: passed through as written
            let span = self.stream.span_from(start);
            self.diagnostics
                .push(LexerError::at(ErrorKind::UnknownRegion, span));
            return self.scan_declaration(start, ">");
        }
        self.scan_tag(start)
    }

    fn scan_comment(&mut self, start: Checkpoint) -> HtmlToken<'a> {
        self.stream.advance_n(4);

        // `<!-->` and `<!--->` are complete (empty) comments
        let terminated = if self.stream.eat(">") || self.stream.eat("->") {
            true
        } else if self.stream.skip_until("-->") {
            self.stream.advance_n(3);
            true
        } else {
            false
        };

        let text = self.stream.slice_from(start.offset());
        if !terminated {
            let span = self.stream.span_from(start);
            self.diagnostics
                .push(LexerError::at(ErrorKind::UnterminatedComment, span));
            return HtmlToken::Verbatim(text);
        }

        let body = &text[4..];
        let conditional = body.starts_with('[') || body.starts_with("<![");
        HtmlToken::Comment { text, conditional }
    }

    fn scan_declaration(&mut self, start: Checkpoint, terminator: &str) -> HtmlToken<'a> {
        if self.stream.skip_until(terminator) {
            self.stream.advance_n(terminator.len());
        } else {
            let span = self.stream.span_from(start);
            self.diagnostics
                .push(LexerError::at(ErrorKind::UnknownRegion, span));
        }
        HtmlToken::Verbatim(self.stream.slice_from(start.offset()))
    }

    fn scan_tag(&mut self, start: Checkpoint) -> HtmlToken<'a> {
        self.stream.advance(); // `<`
        let closing = self.stream.eat("/");
        let name = self
            .stream
            .skip_while(|c| !is_html_whitespace(c) && c != '/' && c != '>');

        let mut attributes = Vec::new();
        let mut self_closing = false;

        let trailing = loop {
            let before_ws = self.stream.checkpoint();
            let leading = self.stream.skip_while(is_html_whitespace);

            if self.stream.is_at_end() {
                return self.unterminated_tag(start);
            }
            match self.stream.peek(0) {
                '>' => {
                    self.stream.advance();
                    break leading;
                }
                '/' if self.stream.peek(1) == '>' => {
                    self.stream.advance_n(2);
                    self_closing = true;
                    break leading;
                }
                '/' => {
                    // Stray slash between attributes: drop it, keep scanning
                    self.stream.advance();
                }
                _ => {
                    self.stream.restore(before_ws);
                    match self.scan_attribute() {
                        Some(attr) => attributes.push(attr),
                        None => return self.unterminated_tag(start),
                    }
                }
            }
        };

        let tag = Tag {
            name,
            closing,
            self_closing,
            attributes,
            trailing,
            raw: self.stream.slice_from(start.offset()),
        };
        if tag.opens_raw_text() {
            self.pending_body = Some((name, tag.body_kind()));
        }
        HtmlToken::Tag(tag)
    }

    /// Scan one attribute, including its leading whitespace. `None` when the
    /// input ends inside a quoted value.
    fn scan_attribute(&mut self) -> Option<Attribute<'a>> {
        let leading = self.stream.skip_while(is_html_whitespace);

        let name_start = self.stream.position();
        self.stream
            .skip_while(|c| !is_html_whitespace(c) && c != '/' && c != '>' && c != '=');
        if self.stream.position() == name_start {
            // `=` in name position is part of the name
            self.stream.advance();
        }
        let name = self.stream.slice_from(name_start);

        let after_name = self.stream.checkpoint();
        self.stream.skip_while(is_html_whitespace);
        if !self.stream.eat("=") {
            self.stream.restore(after_name);
            return Some(Attribute {
                name,
                value: None,
                quote: None,
                leading,
            });
        }
        self.stream.skip_while(is_html_whitespace);

        let (value, quote) = match self.stream.peek(0) {
            q @ ('"' | '\'') => {
                self.stream.advance();
                let value = self.stream.skip_while(|c| c != q);
                if self.stream.is_at_end() {
                    return None;
                }
                self.stream.advance();
                (value, Some(q))
            }
            _ => (
                self.stream
                    .skip_while(|c| !is_html_whitespace(c) && c != '>'),
                None,
            ),
        };

        Some(Attribute {
            name,
            value: Some(value),
            quote,
            leading,
        })
    }

    fn unterminated_tag(&mut self, start: Checkpoint) -> HtmlToken<'a> {
        self.stream.restore(start);
        let span = self.stream.span_from(start);
        self.diagnostics
            .push(LexerError::at(ErrorKind::UnknownRegion, span));
        HtmlToken::Verbatim(self.stream.skip_to_end())
    }

    /// Scan a raw-text body up to its end tag. Without an end tag the rest
    /// of the document becomes a preserved block.
    fn scan_body(&mut self, name: &str, kind: RegionKind) -> Option<HtmlToken<'a>> {
        let start = self.stream.checkpoint();
        let mut kind = kind;

        loop {
            if self.stream.is_at_end() {
                let span = self.stream.span_from(start);
                self.diagnostics
                    .push(LexerError::at(ErrorKind::UnbalancedTag, span));
                kind = RegionKind::PreservedBlock;
                break;
            }
            if self.at_end_tag(name) {
                break;
            }
            self.stream.advance();
        }

        let span = self.stream.span_from(start);
        if span.is_empty() {
            return None;
        }
        Some(HtmlToken::Body(Region {
            kind,
            span,
            text: self.stream.slice_from(span.start),
        }))
    }

    /// `</name` followed by whitespace, `/`, `>` or end of input.
    fn at_end_tag(&self, name: &str) -> bool {
        let rest = self.stream.rest().as_bytes();
        let end = 2 + name.len();
        rest.len() >= end
            && rest.starts_with(b"</")
            && rest[2..end].eq_ignore_ascii_case(name.as_bytes())
            && rest
                .get(end)
                .map_or(true, |&b| b.is_ascii_whitespace() || b == b'/' || b == b'>')
    }
}

impl<'a> Iterator for HtmlScanner<'a> {
    type Item = HtmlToken<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.scan()
    }
}
