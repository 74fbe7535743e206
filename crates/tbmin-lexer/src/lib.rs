//! tbminifier Lexer
//!
//! Streaming tokenizers shared by the HTML, CSS and JavaScript minifiers.
//! Provides a byte-offset character cursor ([`CharStream`]), a lazy
//! JavaScript tokenizer that tells regex literals from division, and an
//! HTML segmenter that splits markup into tags, text, comments and the raw
//! bodies of `script`, `style`, `pre` and `textarea`.
//!
//! Nothing here ever fails outright. Malformed input is surfaced as
//! [`TokenKind::RawText`] / verbatim regions plus a [`LexerError`]
//! diagnostic that the caller may inspect.
//!
//! # Example
//!
//! ```
//! use tbmin_lexer::{JsScanner, TokenKind};
//!
//! let kinds: Vec<TokenKind> = JsScanner::new("a / b").map(|t| t.kind).collect();
//! assert_eq!(kinds[2], TokenKind::Punctuator);
//! ```

pub mod html;
pub mod js;
pub mod stream;
pub mod token;

pub use html::{Attribute, HtmlScanner, HtmlToken, Tag};
pub use js::JsScanner;
pub use stream::{CharStream, Checkpoint, EOF};
pub use token::{Region, RegionKind, Span, Token, TokenKind};

/// Recoverable failure classes. Each one means "the rest of this construct
/// was passed through verbatim".
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("unterminated literal")]
    UnterminatedLiteral,
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("unbalanced tag")]
    UnbalancedTag,
    #[error("unknown region")]
    UnknownRegion,
}

/// Lexer diagnostic with position information.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Lexer error at line {line}, column {column}: {kind}")]
pub struct LexerError {
    pub kind: ErrorKind,
    pub line: usize,
    pub column: usize,
}

impl LexerError {
    pub fn new(kind: ErrorKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }

    /// Build a diagnostic located at the start of `span`.
    pub fn at(kind: ErrorKind, span: Span) -> Self {
        Self::new(kind, span.line, span.column)
    }
}

/// UTF-8 byte order mark.
pub const BOM: char = '\u{FEFF}';

/// Split a leading byte order mark off `source`.
///
/// Minifiers re-emit the returned prefix untouched and work on the rest.
pub fn split_bom(source: &str) -> (&str, &str) {
    match source.strip_prefix(BOM) {
        Some(rest) => source.split_at(source.len() - rest.len()),
        None => ("", source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_bom_present() {
        let (bom, rest) = split_bom("\u{FEFF}body{}");
        assert_eq!(bom, "\u{FEFF}");
        assert_eq!(rest, "body{}");
    }

    #[test]
    fn test_split_bom_absent() {
        assert_eq!(split_bom("var a"), ("", "var a"));
    }

    #[test]
    fn test_error_display() {
        let err = LexerError::new(ErrorKind::UnterminatedComment, 3, 7);
        assert_eq!(
            err.to_string(),
            "Lexer error at line 3, column 7: unterminated comment"
        );
    }
}
