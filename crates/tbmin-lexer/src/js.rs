//! Streaming JavaScript tokenizer.
//!
//! Produces tokens lazily through [`Iterator`], including whitespace and
//! comments, so a consumer can decide what to keep. The scanner carries just
//! enough state to lex JavaScript correctly without parsing it:
//!
//! - the previous significant token, to decide whether `/` opens a regex
//!   literal or is the division operator;
//! - a stack of brace depths, so that the `}` closing a template
//!   interpolation resumes the template instead of closing a block;
//! - which parentheses hold an `if`/`for`/`while`/`with` head, since a `/`
//!   after their `)` starts a statement and therefore a regex;
//! - enough context to tell contextual keywords (`of`, `await`, `yield`)
//!   from plain identifiers of the same name.

use crate::stream::{CharStream, Checkpoint};
use crate::token::{
    is_identifier_part, is_identifier_start, is_js_whitespace, is_keyword, is_line_terminator,
    Token, TokenKind, CONTEXTUAL_KEYWORDS, VALUE_KEYWORDS,
};
use crate::{ErrorKind, LexerError};

/// Multi-character punctuators, longest first.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "**", "<<", ">>",
];

/// JavaScript scanner.
///
/// Never fails: unterminated strings, templates, regexes and comments come
/// out as [`TokenKind::RawText`] and are recorded in
/// [`JsScanner::diagnostics`].
pub struct JsScanner<'a> {
    stream: CharStream<'a>,
    /// Whether a `/` at this point starts a regex literal.
    regex_allowed: bool,
    /// Previous significant token was `.` or `?.` (keywords become names).
    after_member_access: bool,
    /// Previous significant token, if it was `if`, `for`, `while` or `with`.
    after_control_keyword: Option<&'a str>,
    /// For each open `(`, the control keyword whose head it opens.
    paren_stack: Vec<Option<&'a str>>,
    brace_depth: usize,
    /// Brace depth at each open `${`.
    template_stack: Vec<usize>,
    diagnostics: Vec<LexerError>,
}

impl<'a> JsScanner<'a> {
    /// Create a new scanner for the given source.
    pub fn new(source: &'a str) -> Self {
        Self {
            stream: CharStream::new(source),
            regex_allowed: true,
            after_member_access: false,
            after_control_keyword: None,
            paren_stack: Vec::new(),
            brace_depth: 0,
            template_stack: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Diagnostics for constructs passed through verbatim so far.
    pub fn diagnostics(&self) -> &[LexerError] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<LexerError> {
        self.diagnostics
    }

    /// Tokenize the whole source, dropping whitespace and comments.
    pub fn significant_tokens(source: &str) -> Vec<Token<'_>> {
        JsScanner::new(source)
            .filter(|t| !t.kind.is_trivia())
            .collect()
    }

    fn scan_token(&mut self) -> Option<Token<'a>> {
        if self.stream.is_at_end() {
            return None;
        }

        let start = self.stream.checkpoint();
        let c = self.stream.peek(0);
        let next = self.stream.peek(1);

        let kind = match c {
            c if is_js_whitespace(c) => {
                self.stream.skip_while(is_js_whitespace);
                TokenKind::Whitespace
            }
            '/' if next == '/' => self.scan_line_comment(),
            '/' if next == '*' => self.scan_block_comment(start),
            '#' if next == '!' && self.stream.position() == 0 => self.scan_line_comment(),
            '/' if self.regex_allowed => self.scan_regex(start),
            '\'' | '"' => self.scan_string(start),
            '`' => {
                self.stream.advance();
                self.scan_template_chunk(start)
            }
            '}' if self.template_stack.last() == Some(&self.brace_depth) => {
                self.template_stack.pop();
                self.stream.advance();
                self.scan_template_chunk(start)
            }
            '0'..='9' => self.scan_number(),
            '.' if next.is_ascii_digit() => self.scan_number(),
            '#' if is_identifier_start(next) => {
                self.stream.advance();
                self.scan_identifier();
                TokenKind::Identifier
            }
            c if is_identifier_start(c) => {
                let word = self.scan_identifier();
                if self.after_member_access {
                    TokenKind::Identifier
                } else if is_keyword(word) || self.is_contextual_keyword(word) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Identifier
                }
            }
            _ => self.scan_punctuator(),
        };

        let span = self.stream.span_from(start);
        let token = Token::new(kind, span, self.stream.slice_from(span.start));
        self.update_context(&token);
        Some(token)
    }

    /// Track regex/division context and brace depth after a token.
    fn update_context(&mut self, token: &Token<'a>) {
        if token.kind.is_trivia() {
            return;
        }

        self.after_member_access = false;
        let control_head = std::mem::take(&mut self.after_control_keyword);
        self.regex_allowed = match token.kind {
            TokenKind::String | TokenKind::Number | TokenKind::Regex | TokenKind::Identifier => {
                false
            }
            TokenKind::Template => token.text.ends_with("${"),
            TokenKind::Keyword => {
                if matches!(token.text, "if" | "for" | "while" | "with") {
                    self.after_control_keyword = Some(token.text);
                }
                !VALUE_KEYWORDS.contains(&token.text)
            }
            TokenKind::Punctuator => match token.text {
                "(" => {
                    self.paren_stack.push(control_head);
                    true
                }
                ")" => self.paren_stack.pop().flatten().is_some(),
                "]" | "++" | "--" => false,
                "{" => {
                    self.brace_depth += 1;
                    true
                }
                "}" => {
                    self.brace_depth = self.brace_depth.saturating_sub(1);
                    true
                }
                "." | "?." => {
                    self.after_member_access = true;
                    true
                }
                _ => true,
            },
            _ => true,
        };
    }

    /// Decide whether a contextual keyword acts as a keyword here.
    ///
    /// `of` is a keyword only directly inside a `for (...)` head. `await`
    /// and `yield` are keywords unless the `/` after them cannot close as a
    /// regex on the same line, in which case they are names being divided.
    /// `let` and `static` never precede a `/`, so they stay identifiers.
    fn is_contextual_keyword(&self, word: &str) -> bool {
        if !CONTEXTUAL_KEYWORDS.contains(&word) {
            return false;
        }
        match word {
            "of" => self.paren_stack.last() == Some(&Some("for")),
            "await" | "yield" => {
                let rest = self.stream.rest().trim_start_matches([' ', '\t']);
                match rest.strip_prefix('/') {
                    Some(body) if !body.starts_with(['/', '*']) => regex_closes_on_line(body),
                    _ => true,
                }
            }
            _ => false,
        }
    }

    // --- Scanners ---

    /// Scan `// ...` (or a `#!` hashbang) up to, not including, the line end.
    fn scan_line_comment(&mut self) -> TokenKind {
        self.stream.advance_n(2);
        self.stream.skip_while(|c| !is_line_terminator(c));
        TokenKind::LineComment
    }

    fn scan_block_comment(&mut self, start: Checkpoint) -> TokenKind {
        self.stream.advance_n(2);
        if self.stream.skip_until("*/") {
            self.stream.advance_n(2);
            TokenKind::BlockComment
        } else {
            self.unterminated(ErrorKind::UnterminatedComment, start)
        }
    }

    /// Scan a `'...'` or `"..."` literal. A raw line break ends the literal
    /// as unterminated; escaped line breaks are continuations.
    fn scan_string(&mut self, start: Checkpoint) -> TokenKind {
        let quote = self.stream.advance();

        loop {
            if self.stream.is_at_end() {
                return self.unterminated(ErrorKind::UnterminatedLiteral, start);
            }
            match self.stream.peek(0) {
                c if c == quote => {
                    self.stream.advance();
                    return TokenKind::String;
                }
                '\\' => self.scan_escape(),
                '\n' | '\r' => return self.unterminated(ErrorKind::UnterminatedLiteral, start),
                _ => {
                    self.stream.advance();
                }
            }
        }
    }

    /// Scan template text after the opening backtick or closing `}` of an
    /// interpolation, up to the closing backtick or the next `${`.
    fn scan_template_chunk(&mut self, start: Checkpoint) -> TokenKind {
        loop {
            if self.stream.is_at_end() {
                return self.unterminated(ErrorKind::UnterminatedLiteral, start);
            }
            match self.stream.peek(0) {
                '`' => {
                    self.stream.advance();
                    return TokenKind::Template;
                }
                '\\' => self.scan_escape(),
                '$' if self.stream.peek(1) == '{' => {
                    self.stream.advance_n(2);
                    self.template_stack.push(self.brace_depth);
                    return TokenKind::Template;
                }
                _ => {
                    self.stream.advance();
                }
            }
        }
    }

    /// Scan a regex literal body, class brackets and flags.
    fn scan_regex(&mut self, start: Checkpoint) -> TokenKind {
        self.stream.advance(); // opening `/`
        let mut in_class = false;

        loop {
            if self.stream.is_at_end() || is_line_terminator(self.stream.peek(0)) {
                return self.unterminated(ErrorKind::UnterminatedLiteral, start);
            }
            match self.stream.advance() {
                '\\' => {
                    if !self.stream.is_at_end() && !is_line_terminator(self.stream.peek(0)) {
                        self.stream.advance();
                    }
                }
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => break,
                _ => {}
            }
        }

        self.stream.skip_while(is_identifier_part);
        TokenKind::Regex
    }

    /// Scan decimal, hex/octal/binary, exponent and BigInt literals.
    fn scan_number(&mut self) -> TokenKind {
        let radix_prefix = self.stream.peek(0) == '0'
            && matches!(self.stream.peek(1), 'x' | 'X' | 'o' | 'O' | 'b' | 'B');

        if radix_prefix {
            self.stream.advance_n(2);
            self.stream.skip_while(|c| c.is_ascii_hexdigit() || c == '_');
        } else {
            self.stream.skip_while(|c| c.is_ascii_digit() || c == '_');
            if self.stream.peek(0) == '.' {
                self.stream.advance();
                self.stream.skip_while(|c| c.is_ascii_digit() || c == '_');
            }
            if matches!(self.stream.peek(0), 'e' | 'E') {
                let sign = matches!(self.stream.peek(1), '+' | '-');
                let digit_at = if sign { 2 } else { 1 };
                if self.stream.peek(digit_at).is_ascii_digit() {
                    self.stream.advance_n(digit_at);
                    self.stream.skip_while(|c| c.is_ascii_digit() || c == '_');
                }
            }
        }

        if self.stream.peek(0) == 'n' {
            self.stream.advance();
        }
        TokenKind::Number
    }

    /// Scan an identifier, including `\uXXXX` and `\u{...}` escapes.
    fn scan_identifier(&mut self) -> &'a str {
        let start = self.stream.position();
        while !self.stream.is_at_end() && is_identifier_part(self.stream.peek(0)) {
            if self.stream.advance() == '\\' && self.stream.peek(0) == 'u' {
                self.stream.advance();
                if self.stream.peek(0) == '{' {
                    self.stream.skip_while(|c| c != '}');
                    self.stream.advance();
                }
            }
        }
        self.stream.slice_from(start)
    }

    fn scan_punctuator(&mut self) -> TokenKind {
        let matched = PUNCTUATORS.iter().find(|p| {
            self.stream.starts_with(p) && !(**p == "?." && self.stream.peek(2).is_ascii_digit())
        });
        match matched {
            Some(p) => self.stream.advance_n(p.len()),
            None => {
                self.stream.advance();
            }
        }
        TokenKind::Punctuator
    }

    /// Consume a backslash and the character it escapes. `\` + CRLF is one
    /// line continuation.
    fn scan_escape(&mut self) {
        self.stream.advance();
        if self.stream.advance() == '\r' && self.stream.peek(0) == '\n' {
            self.stream.advance();
        }
    }

    fn unterminated(&mut self, kind: ErrorKind, start: Checkpoint) -> TokenKind {
        let span = self.stream.span_from(start);
        self.diagnostics.push(LexerError::at(kind, span));
        TokenKind::RawText
    }
}

/// Whether a regex body starting at `body` (just past the opening `/`)
/// reaches its closing `/` before the line ends.
fn regex_closes_on_line(body: &str) -> bool {
    let mut chars = body.chars();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if chars.next().map_or(true, is_line_terminator) {
                    return false;
                }
            }
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => return true,
            c if is_line_terminator(c) => return false,
            _ => {}
        }
    }
    false
}

impl<'a> Iterator for JsScanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.scan_token()
    }
}
