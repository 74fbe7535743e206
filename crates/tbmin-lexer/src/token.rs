/// A position in source text. `start`/`end` are byte offsets; `line` and
/// `column` locate `start` for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Token classification for JavaScript source.
///
/// Tokens borrow their text from the source, so the kind carries no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Whitespace,
    LineComment,
    BlockComment,

    // Literals
    String,
    /// One template chunk: `` `a` ``, `` `a${ ``, `}b${` or `` }c` ``.
    Template,
    Regex,
    Number,

    Identifier,
    Keyword,
    Punctuator,

    /// Input the scanner could not classify (unterminated literals).
    RawText,
}

impl TokenKind {
    /// Whitespace and comments.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }

    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment)
    }
}

/// A token produced by the JavaScript scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub span: Span,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, span: Span, text: &'a str) -> Self {
        Self { kind, span, text }
    }

    /// Whether a whitespace or comment token spans a line terminator.
    pub fn has_line_break(&self) -> bool {
        self.text.chars().any(is_line_terminator)
    }

    pub fn first_char(&self) -> char {
        self.text.chars().next().unwrap_or(crate::EOF)
    }

    pub fn last_char(&self) -> char {
        self.text.chars().next_back().unwrap_or(crate::EOF)
    }
}

/// Classification of a contiguous HTML span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    /// Tags, text and comments outside any raw-text element.
    PlainMarkup,
    ScriptBody,
    StyleBody,
    /// Bytes that must pass through unmodified.
    PreservedBlock,
}

/// A classified span of an HTML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region<'a> {
    pub kind: RegionKind,
    pub span: Span,
    pub text: &'a str,
}

/// ECMAScript line terminators.
pub fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// ECMAScript whitespace, including line terminators.
pub fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t' | '\u{000B}' | '\u{000C}' | '\u{00A0}' | '\u{FEFF}'
    ) || is_line_terminator(c)
        || (c > '\u{7F}' && c.is_whitespace())
}

pub fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$' || c == '\\'
}

pub fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '\\' || c == '\u{200C}' || c == '\u{200D}'
}

/// Reserved words that are followed by an expression, so a `/` after them
/// opens a regex literal.
pub const EXPRESSION_KEYWORDS: &[&str] = &[
    "case",
    "delete",
    "do",
    "else",
    "export",
    "extends",
    "in",
    "instanceof",
    "new",
    "return",
    "throw",
    "typeof",
    "void",
];

/// Keywords that evaluate to a value; a `/` after them is division.
pub const VALUE_KEYWORDS: &[&str] = &["false", "null", "super", "this", "true"];

/// Remaining reserved words. Classified as keywords, behave like
/// statement starters.
pub const STATEMENT_KEYWORDS: &[&str] = &[
    "break", "catch", "class", "const", "continue", "debugger", "default", "enum", "finally",
    "for", "function", "if", "import", "switch", "try", "var", "while", "with",
];

/// Words that are keywords only in some positions and plain identifiers
/// everywhere else (`var of = 4; of / 2`). The JS lexer decides from context.
pub const CONTEXTUAL_KEYWORDS: &[&str] = &["await", "let", "of", "static", "yield"];

/// Check whether an identifier is a reserved keyword. Contextual keywords
/// are not included.
pub fn is_keyword(ident: &str) -> bool {
    EXPRESSION_KEYWORDS.contains(&ident)
        || VALUE_KEYWORDS.contains(&ident)
        || STATEMENT_KEYWORDS.contains(&ident)
}

/// Elements around which whitespace never renders. Anything not listed is
/// treated as inline, where a single space is significant.
pub const BLOCK_LEVEL_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "caption", "center", "col", "colgroup",
    "dd", "details", "dialog", "dir", "div", "dl", "dt", "fieldset", "figcaption", "figure",
    "footer", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header",
    "hgroup", "hr", "html", "legend", "li", "main", "menu", "nav", "ol", "optgroup", "option",
    "p", "pre", "section", "summary", "table", "tbody", "td", "tfoot", "th", "thead", "title",
    "tr", "ul",
];

/// Elements that render no box of their own. They do not separate the
/// text around them, so they take the boundary of whatever precedes them.
pub const INVISIBLE_ELEMENTS: &[&str] = &[
    "base", "link", "meta", "noscript", "script", "source", "style", "template", "track",
];

/// Check if a tag name is block-level (case-insensitive).
pub fn is_block_level(tag: &str) -> bool {
    BLOCK_LEVEL_ELEMENTS
        .iter()
        .any(|name| name.eq_ignore_ascii_case(tag))
}

/// Check if a tag name renders nothing in flow (case-insensitive).
pub fn is_invisible(tag: &str) -> bool {
    INVISIBLE_ELEMENTS
        .iter()
        .any(|name| name.eq_ignore_ascii_case(tag))
}
