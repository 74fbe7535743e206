//! CSS minification.
//!
//! A single forward pass over the characters. Strings, `url(...)` and
//! escapes are copied verbatim. A whitespace run becomes one space unless
//! a structural character on either side makes it redundant; a removed
//! comment leaves a space only where two words would otherwise join.

use tbmin_lexer::{split_bom, CharStream, Checkpoint, ErrorKind, LexerError};

use crate::{Minified, MinifyConfig};

/// At-rules whose block holds rules rather than declarations.
const NESTING_AT_RULES: &[&str] = &[
    "media",
    "supports",
    "document",
    "layer",
    "container",
    "scope",
    "starting-style",
    "keyframes",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Rules,
    Declarations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Pending {
    None,
    /// A removed comment, with no whitespace around it.
    Comment,
    Space,
    Newline,
}

pub fn minify(source: &str, config: &MinifyConfig) -> Minified {
    let (bom, body) = split_bom(source);
    let mut minifier = CssMinifier::new(body, config);
    minifier.out.push_str(bom);
    minifier.body_start = bom.len();
    minifier.stmt_start = bom.len();
    minifier.run();

    Minified {
        output: minifier.out,
        diagnostics: minifier.diagnostics,
    }
}

struct CssMinifier<'a, 'c> {
    stream: CharStream<'a>,
    config: &'c MinifyConfig,
    out: String,
    body_start: usize,
    pending: Pending,
    blocks: Vec<Block>,
    /// Name of the at-rule whose prelude is being written.
    at_rule: Option<&'a str>,
    /// Output offset where the current statement began.
    stmt_start: usize,
    /// The last byte written is a `;` that ends a declaration.
    trailing_semicolon: bool,
    diagnostics: Vec<LexerError>,
}

impl<'a, 'c> CssMinifier<'a, 'c> {
    fn new(source: &'a str, config: &'c MinifyConfig) -> Self {
        Self {
            stream: CharStream::new(source),
            config,
            out: String::with_capacity(source.len()),
            body_start: 0,
            pending: Pending::None,
            blocks: Vec::new(),
            at_rule: None,
            stmt_start: 0,
            trailing_semicolon: false,
            diagnostics: Vec::new(),
        }
    }

    fn run(&mut self) {
        while !self.stream.is_at_end() {
            let c = self.stream.peek(0);
            let done = match c {
                '/' if self.stream.peek(1) == '*' => self.comment(),
                c if is_css_whitespace(c) => {
                    self.whitespace();
                    true
                }
                '"' | '\'' => self.verbatim(c, Self::scan_string),
                'u' | 'U' if self.at_url() => self.verbatim(c, Self::scan_url),
                '\\' => {
                    self.flush(c);
                    let start = self.stream.position();
                    self.stream.advance_n(2);
                    self.emit(self.stream.slice_from(start));
                    true
                }
                '{' => {
                    self.open_block();
                    true
                }
                '}' => {
                    self.close_block();
                    true
                }
                ';' => {
                    self.flush(c);
                    self.stream.advance();
                    self.emit(";");
                    self.trailing_semicolon = true;
                    self.end_statement();
                    true
                }
                '@' if self.out.len() == self.stmt_start => {
                    self.at_keyword();
                    true
                }
                _ => {
                    self.flush(c);
                    self.stream.advance();
                    self.emit_char(c);
                    true
                }
            };
            if !done {
                return;
            }
        }
    }

    // --- Output ---

    fn emit(&mut self, text: &str) {
        self.out.push_str(text);
        self.trailing_semicolon = false;
    }

    fn emit_char(&mut self, c: char) {
        self.out.push(c);
        self.trailing_semicolon = false;
    }

    fn note_space(&mut self, newline: bool) {
        let pending = if newline { Pending::Newline } else { Pending::Space };
        self.pending = self.pending.max(pending);
    }

    /// Write the pending whitespace if it still separates something before
    /// `next`.
    fn flush(&mut self, next: char) {
        let pending = std::mem::replace(&mut self.pending, Pending::None);
        if pending == Pending::None || self.out.len() == self.body_start {
            return;
        }
        let Some(prev) = self.out.chars().next_back() else {
            return;
        };
        if pending == Pending::Newline && self.config.preserve_line_breaks {
            self.emit_char('\n');
            return;
        }
        if pending == Pending::Comment && !joins(prev, next) {
            return;
        }
        if prev.is_whitespace() || no_space_after(prev) || self.no_space_before(next) {
            return;
        }
        self.emit_char(' ');
    }

    fn no_space_before(&self, next: char) -> bool {
        match next {
            '{' | '}' | ';' | ',' | '>' | '~' | ')' | '!' => true,
            ':' => {
                self.at_rule.is_some()
                    || (self.in_declarations() && self.at_property() && !self.opens_nested_rule())
            }
            _ => false,
        }
    }

    fn in_declarations(&self) -> bool {
        self.blocks.last() == Some(&Block::Declarations)
    }

    /// The statement so far is a bare property name.
    fn at_property(&self) -> bool {
        let stmt = self.out[self.stmt_start..].trim_start();
        !stmt.is_empty()
            && stmt
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '*'))
    }

    /// Whether the statement at the cursor reaches a `{` before a `;` or
    /// `}`, making it the selector of a nested rule (`span :hover {`).
    fn opens_nested_rule(&self) -> bool {
        let mut ahead = self.stream.clone();
        while !ahead.is_at_end() {
            match ahead.peek(0) {
                '{' => return true,
                ';' | '}' => return false,
                '"' | '\'' => {
                    if !Self::scan_string(&mut ahead) {
                        return false;
                    }
                }
                '/' if ahead.peek(1) == '*' => {
                    ahead.advance_n(2);
                    if !ahead.skip_until("*/") {
                        return false;
                    }
                    ahead.advance_n(2);
                }
                '\\' => ahead.advance_n(2),
                _ => {
                    ahead.advance();
                }
            }
        }
        false
    }

    fn end_statement(&mut self) {
        self.at_rule = None;
        self.stmt_start = self.out.len();
    }

    // --- Structure ---

    fn whitespace(&mut self) {
        let ws = self.stream.skip_while(is_css_whitespace);
        if self.config.collapse_whitespace {
            self.note_space(ws.contains('\n'));
        } else {
            self.pending = Pending::None;
            self.emit(ws);
        }
    }

    fn comment(&mut self) -> bool {
        let start = self.stream.checkpoint();
        self.stream.advance_n(2);
        if !self.stream.skip_until("*/") {
            self.unterminated(ErrorKind::UnterminatedComment, start);
            return false;
        }
        self.stream.advance_n(2);

        if self.config.remove_comments {
            self.pending = self.pending.max(Pending::Comment);
        } else {
            let statement_start = self.out.len() == self.stmt_start;
            self.flush('/');
            self.emit(self.stream.slice_from(start.offset()));
            if statement_start {
                self.stmt_start = self.out.len();
            }
        }
        true
    }

    fn open_block(&mut self) {
        self.pending = Pending::None;
        self.stream.advance();
        let block = match self.at_rule {
            Some(name) if is_nesting_at_rule(name) => Block::Rules,
            _ => Block::Declarations,
        };
        self.blocks.push(block);
        self.emit_char('{');
        self.end_statement();
    }

    fn close_block(&mut self) {
        self.pending = Pending::None;
        self.stream.advance();
        if self.config.strip_trailing_semicolons && self.trailing_semicolon {
            self.out.pop();
        }
        self.blocks.pop();
        self.emit_char('}');
        self.end_statement();
    }

    fn at_keyword(&mut self) {
        self.flush('@');
        let start = self.stream.position();
        self.stream.advance();
        let name = self
            .stream
            .skip_while(|c| c.is_alphanumeric() || matches!(c, '-' | '_'));
        self.emit(self.stream.slice_from(start));
        self.at_rule = Some(name);
    }

    // --- Verbatim spans ---

    /// `url(` not preceded by more of an identifier.
    fn at_url(&self) -> bool {
        if !self.stream.starts_with_ignore_case("url(") {
            return false;
        }
        self.pending != Pending::None
            || !self
                .out
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '\\'))
    }

    /// Copy a span recognized by `scan` unchanged, or everything that is
    /// left if it does not terminate.
    fn verbatim(&mut self, next: char, scan: fn(&mut CharStream<'a>) -> bool) -> bool {
        self.flush(next);
        let start = self.stream.checkpoint();
        if !scan(&mut self.stream) {
            self.unterminated(ErrorKind::UnterminatedLiteral, start);
            return false;
        }
        self.emit(self.stream.slice_from(start.offset()));
        true
    }

    /// Quoted string. A raw line break leaves it unterminated.
    fn scan_string(stream: &mut CharStream<'a>) -> bool {
        let quote = stream.advance();
        while !stream.is_at_end() {
            match stream.advance() {
                c if c == quote => return true,
                '\\' => {
                    stream.advance();
                }
                '\n' | '\r' | '\u{000C}' => return false,
                _ => {}
            }
        }
        false
    }

    /// `url(...)`, quoted or not.
    fn scan_url(stream: &mut CharStream<'a>) -> bool {
        stream.advance_n(4);
        while !stream.is_at_end() {
            match stream.peek(0) {
                ')' => {
                    stream.advance();
                    return true;
                }
                '"' | '\'' => {
                    if !Self::scan_string(stream) {
                        return false;
                    }
                }
                '\\' => stream.advance_n(2),
                _ => {
                    stream.advance();
                }
            }
        }
        false
    }

    /// Record the failure and pass the rest of the input through.
    fn unterminated(&mut self, kind: ErrorKind, start: Checkpoint) {
        let span = self.stream.span_from(start);
        self.diagnostics.push(LexerError::at(kind, span));
        self.stream.restore(start);
        let rest = self.stream.skip_to_end();
        self.flush(rest.chars().next().unwrap_or_default());
        self.emit(rest);
    }
}

fn is_css_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{000C}')
}

fn no_space_after(c: char) -> bool {
    matches!(c, '{' | '}' | ';' | ',' | '>' | '~' | '(' | ':' | '!')
}

/// Writing `prev` and `next` side by side would merge two tokens.
fn joins(prev: char, next: char) -> bool {
    let word = |c: char| c.is_alphanumeric() || matches!(c, '-' | '_' | '\\') || !c.is_ascii();
    (word(prev) && word(next)) || (prev.is_ascii_digit() && next == '.')
}

fn is_nesting_at_rule(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    let unprefixed = match name.strip_prefix('-') {
        Some(rest) => rest.split_once('-').map_or(rest, |(_, n)| n),
        None => name.as_str(),
    };
    NESTING_AT_RULES.contains(&unprefixed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn min(source: &str) -> String {
        minify(source, &MinifyConfig::default()).output
    }

    fn min_with(source: &str, config: MinifyConfig) -> String {
        minify(source, &config).output
    }

    // =========================================================================
    // Rules and declarations
    // =========================================================================

    #[test]
    fn test_simple_rule() {
        assert_eq!(min("body {\n  color: red;   /* red */\n}"), "body{color:red;}");
    }

    #[test]
    fn test_strip_trailing_semicolons() {
        let config = MinifyConfig::default().with_strip_trailing_semicolons(true);
        assert_eq!(min_with("a { color: red; }", config), "a{color:red}");
        assert_eq!(min_with("a { content: \"x;\" }", config), "a{content:\"x;\"}");
    }

    #[test]
    fn test_selector_lists_and_combinators() {
        assert_eq!(min("h1 , h2 > p ~ a {}"), "h1,h2>p~a{}");
        assert_eq!(min("ul  li  a {}"), "ul li a{}");
    }

    #[test]
    fn test_descendant_pseudo_class_keeps_space() {
        assert_eq!(min("a :hover { x: y }"), "a :hover{x:y}");
    }

    #[test]
    fn test_values_keep_single_spaces() {
        assert_eq!(
            min("a { margin : 0  auto ; width: calc( 1px  +  2px ) }"),
            "a{margin:0 auto;width:calc(1px + 2px)}"
        );
    }

    #[test]
    fn test_important() {
        assert_eq!(min("a { color: red ! important }"), "a{color:red!important}");
    }

    // =========================================================================
    // At-rules
    // =========================================================================

    #[test]
    fn test_nested_rule_descendant_pseudo_class() {
        assert_eq!(
            min(".card { color: red; span :hover { color: blue } }"),
            ".card{color:red;span :hover{color:blue}}"
        );
        assert_eq!(
            min(".card { a :is(\"{\") { x: y } }"),
            ".card{a :is(\"{\"){x:y}}"
        );
        assert_eq!(min(".card { color : red }"), ".card{color:red}");
    }

    #[test]
    fn test_media_query() {
        assert_eq!(
            min("@media screen and (max-width : 600px) {\n  a { color : red }\n}"),
            "@media screen and (max-width:600px){a{color:red}}"
        );
    }

    #[test]
    fn test_nested_rule_blocks() {
        assert_eq!(
            min("@supports (display: grid) { div :first-child { float : none } }"),
            "@supports (display:grid){div :first-child{float:none}}"
        );
    }

    #[test]
    fn test_prefixed_keyframes() {
        assert_eq!(
            min("@-webkit-keyframes spin { from { top : 0 } }"),
            "@-webkit-keyframes spin{from{top:0}}"
        );
    }

    #[test]
    fn test_statement_at_rule() {
        assert_eq!(
            min("@import url( \"a.css\" ) screen ;\na{}"),
            "@import url( \"a.css\" ) screen;a{}"
        );
    }

    // =========================================================================
    // Verbatim spans
    // =========================================================================

    #[test]
    fn test_strings_untouched() {
        assert_eq!(
            min("a::after { content: \"  /* x */  \" }"),
            "a::after{content:\"  /* x */  \"}"
        );
    }

    #[test]
    fn test_url_untouched() {
        assert_eq!(min("a { background: url( a b.png ) }"), "a{background:url( a b.png )}");
        assert_eq!(min("a { background: URL(x) }"), "a{background:URL(x)}");
    }

    #[test]
    fn test_escapes_untouched() {
        assert_eq!(min(".a\\ b { x: y }"), ".a\\ b{x:y}");
        assert_eq!(min(".a\\:b{}"), ".a\\:b{}");
    }

    #[test]
    fn test_unterminated_string() {
        let result = minify("a { content: \"open\n}", &MinifyConfig::default());
        assert_eq!(result.output, "a{content:\"open\n}");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].kind, ErrorKind::UnterminatedLiteral);
    }

    #[test]
    fn test_unterminated_comment() {
        let result = minify("a { } /* open", &MinifyConfig::default());
        assert_eq!(result.output, "a{}/* open");
        assert_eq!(result.diagnostics[0].kind, ErrorKind::UnterminatedComment);
    }

    // =========================================================================
    // Options
    // =========================================================================

    #[test]
    fn test_keep_comments() {
        let config = MinifyConfig::default().with_remove_comments(false);
        assert_eq!(min_with("a { /* c */ color: red }", config), "a{/* c */ color:red}");
    }

    #[test]
    fn test_comment_between_words() {
        assert_eq!(min("a/**/b{}"), "a b{}");
        assert_eq!(min("a{color:/**/red}"), "a{color:red}");
        assert_eq!(min("1px/**/2px"), "1px 2px");
    }

    #[test]
    fn test_comment_inside_compound_selector() {
        assert_eq!(min("a/**/.b{color:red}"), "a.b{color:red}");
        assert_eq!(min("a/**/:hover{x:y}"), "a:hover{x:y}");
        assert_eq!(min("#id/**/.c{}"), "#id.c{}");
        assert_eq!(min("a /**/ .b{}"), "a .b{}");
        assert_eq!(min("a{margin:1/**/.5em}"), "a{margin:1 .5em}");
    }

    #[test]
    fn test_no_collapse() {
        let config = MinifyConfig::default().with_collapse_whitespace(false);
        assert_eq!(min_with("a { color: red; }", config), "a { color: red; }");
    }

    #[test]
    fn test_preserve_line_breaks() {
        let config = MinifyConfig::default().with_preserve_line_breaks(true);
        assert_eq!(min_with("a{}\n\nb{}", config), "a{}\nb{}");
    }

    #[test]
    fn test_bom_and_edges() {
        assert_eq!(min("\u{FEFF}\n a{} \n"), "\u{FEFF}a{}");
        assert_eq!(min(""), "");
        assert_eq!(min("   "), "");
    }
}
