use crate::token::Span;

/// Sentinel returned by [`CharStream::peek`] past the end of input.
///
/// A literal NUL in the source also reads as `EOF`; loops that must
/// terminate check [`CharStream::is_at_end`] instead.
pub const EOF: char = '\0';

/// Saved cursor state, used to rewind after a speculative scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pos: usize,
    line: usize,
    column: usize,
}

impl Checkpoint {
    /// Byte offset of the saved position.
    pub fn offset(&self) -> usize {
        self.pos
    }
}

/// Cursor over source text with lookahead and line/column tracking.
///
/// Positions are byte offsets into the borrowed source, so any two
/// positions can be sliced back out without copying.
#[derive(Debug, Clone)]
pub struct CharStream<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> CharStream<'a> {
    /// Create a new stream positioned at the start of `source`.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Character `offset` positions ahead of the cursor, or [`EOF`].
    pub fn peek(&self, offset: usize) -> char {
        self.rest().chars().nth(offset).unwrap_or(EOF)
    }

    /// Consume one character. Returns [`EOF`] without moving at end of input.
    pub fn advance(&mut self) -> char {
        let Some(c) = self.rest().chars().next() else {
            return EOF;
        };
        self.pos += c.len_utf8();
        // `\r\n` counts as a single line break
        if c == '\n' || (c == '\r' && !self.rest().starts_with('\n')) {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    /// Consume `n` characters.
    pub fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    /// Byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Unconsumed input.
    pub fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    /// Text between `start` and the cursor.
    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.source[start..self.pos]
    }

    pub fn starts_with(&self, pattern: &str) -> bool {
        self.rest().starts_with(pattern)
    }

    /// ASCII case-insensitive prefix test, for tag names and `url(`.
    pub fn starts_with_ignore_case(&self, pattern: &str) -> bool {
        let rest = self.rest().as_bytes();
        rest.len() >= pattern.len() && rest[..pattern.len()].eq_ignore_ascii_case(pattern.as_bytes())
    }

    /// Consume `pattern` if the input starts with it.
    pub fn eat(&mut self, pattern: &str) -> bool {
        if self.starts_with(pattern) {
            self.advance_n(pattern.chars().count());
            true
        } else {
            false
        }
    }

    /// Consume characters while `pred` holds and return them.
    pub fn skip_while(&mut self, mut pred: impl FnMut(char) -> bool) -> &'a str {
        let start = self.pos;
        while !self.is_at_end() && pred(self.peek(0)) {
            self.advance();
        }
        self.slice_from(start)
    }

    /// Move the cursor to the start of the next occurrence of `pattern`,
    /// or to the end of input. Returns whether `pattern` was found.
    pub fn skip_until(&mut self, pattern: &str) -> bool {
        while !self.is_at_end() {
            if self.starts_with(pattern) {
                return true;
            }
            self.advance();
        }
        false
    }

    /// Consume everything that is left.
    pub fn skip_to_end(&mut self) -> &'a str {
        let start = self.pos;
        while !self.is_at_end() {
            self.advance();
        }
        self.slice_from(start)
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    /// Rewind (or fast-forward) to a saved checkpoint.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.line = checkpoint.line;
        self.column = checkpoint.column;
    }

    /// Span from a checkpoint to the cursor.
    pub fn span_from(&self, start: Checkpoint) -> Span {
        Span::new(start.pos, self.pos, start.line, start.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_peek_and_advance() {
        let mut s = CharStream::new("ab");
        assert_eq!(s.peek(0), 'a');
        assert_eq!(s.peek(1), 'b');
        assert_eq!(s.peek(2), EOF);
        assert_eq!(s.advance(), 'a');
        assert_eq!(s.advance(), 'b');
        assert_eq!(s.advance(), EOF);
        assert!(s.is_at_end());
    }

    #[test]
    fn test_positions_are_byte_offsets() {
        let mut s = CharStream::new("é=1");
        s.advance();
        assert_eq!(s.position(), 2);
        assert_eq!(s.slice_from(0), "é");
        assert_eq!(s.column(), 2);
    }

    #[test]
    fn test_line_tracking() {
        let mut s = CharStream::new("a\nb\r\nc");
        s.advance_n(5);
        assert_eq!(s.line(), 3);
        assert_eq!(s.column(), 1);
        assert_eq!(s.peek(0), 'c');
    }

    #[test]
    fn test_checkpoint_restore() {
        let mut s = CharStream::new("<div>");
        let cp = s.checkpoint();
        s.advance_n(4);
        assert_eq!(s.slice_from(0), "<div");
        s.restore(cp);
        assert_eq!(s.position(), 0);
        assert_eq!(s.peek(0), '<');
    }

    #[test]
    fn test_starts_with_ignore_case() {
        let s = CharStream::new("</SCRIPT>");
        assert!(s.starts_with_ignore_case("</script"));
        assert!(!s.starts_with_ignore_case("</style"));
        assert!(!CharStream::new("</sc").starts_with_ignore_case("</script"));
    }

    #[test]
    fn test_skip_helpers() {
        let mut s = CharStream::new("   x/* c */y");
        assert_eq!(s.skip_while(char::is_whitespace), "   ");
        assert!(s.eat("x"));
        assert!(s.skip_until("*/"));
        assert_eq!(s.position(), 9);
        assert_eq!(s.skip_to_end(), "*/y");
        assert!(!s.skip_until("*/"));
    }
}
