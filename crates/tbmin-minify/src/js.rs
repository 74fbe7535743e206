//! JavaScript minification.
//!
//! Works on the token stream alone: trivia is dropped and every gap between
//! two significant tokens is re-emitted as nothing, a space, or a newline.
//! The significant tokens themselves are copied byte for byte.

use tbmin_lexer::{split_bom, token, JsScanner, Token, TokenKind};

use crate::{Minified, MinifyConfig};

/// What separated the previous emitted token from the next one in the
/// source, after removed trivia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Gap {
    None,
    Space,
    Newline,
}

pub fn minify(source: &str, config: &MinifyConfig) -> Minified {
    let (bom, body) = split_bom(source);
    let mut writer = JsWriter::new(config, source.len());
    writer.out.push_str(bom);

    let mut scanner = JsScanner::new(body);
    for token in scanner.by_ref() {
        writer.push(token);
    }

    Minified {
        output: writer.out,
        diagnostics: scanner.into_diagnostics(),
    }
}

struct JsWriter<'a, 'c> {
    config: &'c MinifyConfig,
    out: String,
    /// Last significant token written, `None` at the start or right after
    /// a kept comment.
    prev: Option<Token<'a>>,
    gap: Gap,
    /// Something has been written (not counting a BOM).
    started: bool,
    /// A kept line comment must be followed by a line break.
    after_line_comment: bool,
}

impl<'a, 'c> JsWriter<'a, 'c> {
    fn new(config: &'c MinifyConfig, capacity: usize) -> Self {
        Self {
            config,
            out: String::with_capacity(capacity),
            prev: None,
            gap: Gap::None,
            started: false,
            after_line_comment: false,
        }
    }

    fn push(&mut self, token: Token<'a>) {
        match token.kind {
            TokenKind::Whitespace if !self.config.collapse_whitespace => {
                self.out.push_str(token.text);
                self.gap = Gap::None;
                self.prev = None;
                self.after_line_comment = false;
            }
            TokenKind::Whitespace => self.note_gap(token.has_line_break()),
            TokenKind::LineComment | TokenKind::BlockComment if self.config.remove_comments => {
                // A hashbang is a directive, not a comment.
                if token.span.start == 0 && token.text.starts_with("#!") {
                    self.write_comment(token);
                } else {
                    self.note_gap(token.has_line_break());
                }
            }
            TokenKind::LineComment | TokenKind::BlockComment => self.write_comment(token),
            _ => {
                self.write_separator(&token);
                self.out.push_str(token.text);
                self.prev = Some(token);
                self.started = true;
            }
        }
    }

    fn note_gap(&mut self, line_break: bool) {
        let gap = if line_break { Gap::Newline } else { Gap::Space };
        self.gap = self.gap.max(gap);
    }

    fn write_comment(&mut self, token: Token<'a>) {
        if self.started {
            match self.gap {
                _ if self.after_line_comment => self.out.push('\n'),
                Gap::Newline => self.out.push('\n'),
                Gap::Space => self.out.push(' '),
                Gap::None => {}
            }
        }
        self.out.push_str(token.text);
        self.gap = Gap::None;
        self.prev = None;
        self.started = true;
        self.after_line_comment = token.kind == TokenKind::LineComment;
    }

    fn write_separator(&mut self, next: &Token<'a>) {
        let gap = std::mem::replace(&mut self.gap, Gap::None);
        if std::mem::take(&mut self.after_line_comment) {
            self.out.push('\n');
            return;
        }
        if !self.started || gap == Gap::None {
            return;
        }

        let Some(prev) = self.prev else {
            // right after a kept block comment
            self.out.push(if gap == Gap::Newline { '\n' } else { ' ' });
            return;
        };

        if gap == Gap::Newline
            && (self.config.preserve_line_breaks || asi_hazard(&prev, next))
        {
            self.out.push('\n');
        } else if needs_space(&prev, next) {
            self.out.push(' ');
        }
    }
}

/// Dropping a line break between these tokens could change where automatic
/// semicolon insertion applies.
fn asi_hazard(prev: &Token<'_>, next: &Token<'_>) -> bool {
    can_end_statement(prev) && can_start_statement(next)
}

fn can_end_statement(token: &Token<'_>) -> bool {
    match token.kind {
        TokenKind::Identifier
        | TokenKind::Keyword
        | TokenKind::Number
        | TokenKind::String
        | TokenKind::Regex
        | TokenKind::RawText => true,
        TokenKind::Template => token.text.ends_with('`'),
        TokenKind::Punctuator => matches!(token.text, ")" | "]" | "}" | "++" | "--"),
        _ => false,
    }
}

fn can_start_statement(token: &Token<'_>) -> bool {
    match token.kind {
        TokenKind::Identifier
        | TokenKind::Keyword
        | TokenKind::Number
        | TokenKind::String
        | TokenKind::Regex
        | TokenKind::RawText => true,
        TokenKind::Template => token.text.starts_with('`'),
        TokenKind::Punctuator => matches!(
            token.text,
            "(" | "[" | "{" | "+" | "-" | "++" | "--" | "!" | "~" | "@" | "..."
        ),
        _ => false,
    }
}

/// Joining these tokens without a space would make them scan differently.
fn needs_space(prev: &Token<'_>, next: &Token<'_>) -> bool {
    let a = prev.last_char();
    let b = next.first_char();

    if token::is_identifier_part(a) && token::is_identifier_part(b) {
        return true;
    }
    // `1 .toString()`: the dot would join the number
    if prev.kind == TokenKind::Number && b == '.' {
        return true;
    }
    // `/re/ in o`: a following word would read as regex flags
    if prev.kind == TokenKind::Regex && token::is_identifier_part(b) {
        return true;
    }
    matches!(
        (a, b),
        ('+', '+') | ('-', '-') | ('/', '/') | ('/', '*') | ('<', '!') | ('-', '>')
    )
}
