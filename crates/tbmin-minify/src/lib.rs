//! tbminifier
//!
//! Minifies HTML, CSS and JavaScript by removing whitespace and comments
//! that do not change how the text is parsed, executed or rendered. HTML
//! minification hands embedded `<script>` and `<style>` bodies to the other
//! two minifiers according to an [`EmbeddedPolicy`].
//!
//! ```text
//! source ─ tbmin-lexer tokens ─ js::minify / css::minify / html::minify ─ Minified
//! ```
//!
//! Every public entry point is total: a minifier that cannot make sense of
//! its input passes the rest through verbatim, and a panic inside a minifier
//! is caught and answered with the original input.
//!
//! ```
//! use tbmin_minify::{minify_css, minify_js};
//!
//! assert_eq!(minify_js("a = b / c"), "a=b/c");
//! assert_eq!(minify_css("a { color : red }"), "a{color:red}");
//! ```

pub mod css;
pub mod hooks;
pub mod html;
pub mod js;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tbmin_lexer::LexerError;

pub use hooks::{Hook, MinifierModule};

/// Options recognized by every minifier. No global state: each call is
/// configured explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MinifyConfig {
    pub remove_comments: bool,
    pub collapse_whitespace: bool,
    /// Emit a line break instead of a space where a removed whitespace run
    /// contained one.
    pub preserve_line_breaks: bool,
    pub minify_embedded_js: bool,
    pub minify_embedded_css: bool,
    /// CSS only: drop the `;` before `}`.
    pub strip_trailing_semicolons: bool,
}

impl Default for MinifyConfig {
    fn default() -> Self {
        Self {
            remove_comments: true,
            collapse_whitespace: true,
            preserve_line_breaks: false,
            minify_embedded_js: true,
            minify_embedded_css: true,
            strip_trailing_semicolons: false,
        }
    }
}

impl MinifyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remove_comments(mut self, on: bool) -> Self {
        self.remove_comments = on;
        self
    }

    pub fn with_collapse_whitespace(mut self, on: bool) -> Self {
        self.collapse_whitespace = on;
        self
    }

    pub fn with_preserve_line_breaks(mut self, on: bool) -> Self {
        self.preserve_line_breaks = on;
        self
    }

    pub fn with_minify_embedded_js(mut self, on: bool) -> Self {
        self.minify_embedded_js = on;
        self
    }

    pub fn with_minify_embedded_css(mut self, on: bool) -> Self {
        self.minify_embedded_css = on;
        self
    }

    pub fn with_strip_trailing_semicolons(mut self, on: bool) -> Self {
        self.strip_trailing_semicolons = on;
        self
    }
}

/// A minifier that HTML minification may delegate embedded code to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    CssMinifier,
    JsMinifier,
}

/// The set of embedded minifiers HTML minification may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmbeddedPolicy {
    css: bool,
    js: bool,
}

impl EmbeddedPolicy {
    pub const NONE: Self = Self {
        css: false,
        js: false,
    };
    pub const ALL: Self = Self { css: true, js: true };

    pub fn with(mut self, capability: Capability) -> Self {
        match capability {
            Capability::CssMinifier => self.css = true,
            Capability::JsMinifier => self.js = true,
        }
        self
    }

    pub fn contains(&self, capability: Capability) -> bool {
        match capability {
            Capability::CssMinifier => self.css,
            Capability::JsMinifier => self.js,
        }
    }
}

impl FromIterator<Capability> for EmbeddedPolicy {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, Self::with)
    }
}

/// Source language of a minification call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Html,
    Css,
    Js,
}

impl Language {
    /// Guess the language from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" | "xhtml" | "tpl" => Some(Language::Html),
            "css" => Some(Language::Css),
            "js" | "mjs" | "cjs" => Some(Language::Js),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Language::Html => "HTML",
            Language::Css => "CSS",
            Language::Js => "Javascript",
        })
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(Language::Html),
            "css" => Ok(Language::Css),
            "js" | "javascript" => Ok(Language::Js),
            other => Err(format!("unknown language: '{other}'")),
        }
    }
}

/// Result of a minification call: the output plus every construct that was
/// passed through verbatim because it could not be minified safely.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Minified {
    pub output: String,
    pub diagnostics: Vec<LexerError>,
}

impl Minified {
    /// No construct needed verbatim fallback.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// The one unrecoverable failure: a minifier bug surfaced as a panic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MinifyError {
    #[error("{language} minifier panicked: {message}")]
    Panicked { language: Language, message: String },
}

// =========================================================================
// Facade
// =========================================================================

/// Minify HTML with the default config. Never fails.
pub fn minify_html(input: &str, policy: EmbeddedPolicy) -> String {
    minify_html_with(input, policy, &MinifyConfig::default())
}

pub fn minify_html_with(input: &str, policy: EmbeddedPolicy, config: &MinifyConfig) -> String {
    output_or_original(input, try_minify_html(input, policy, config))
}

pub fn try_minify_html(
    input: &str,
    policy: EmbeddedPolicy,
    config: &MinifyConfig,
) -> Result<Minified, MinifyError> {
    guard(Language::Html, input, || html::minify(input, policy, config))
}

/// Minify JavaScript with the default config. Never fails.
pub fn minify_js(input: &str) -> String {
    minify_js_with(input, &MinifyConfig::default())
}

pub fn minify_js_with(input: &str, config: &MinifyConfig) -> String {
    output_or_original(input, try_minify_js(input, config))
}

pub fn try_minify_js(input: &str, config: &MinifyConfig) -> Result<Minified, MinifyError> {
    guard(Language::Js, input, || js::minify(input, config))
}

/// Minify CSS with the default config. Never fails.
pub fn minify_css(input: &str) -> String {
    minify_css_with(input, &MinifyConfig::default())
}

pub fn minify_css_with(input: &str, config: &MinifyConfig) -> String {
    output_or_original(input, try_minify_css(input, config))
}

pub fn try_minify_css(input: &str, config: &MinifyConfig) -> Result<Minified, MinifyError> {
    guard(Language::Css, input, || css::minify(input, config))
}

/// Dispatch on language. `policy` only applies to HTML.
pub fn try_minify(
    language: Language,
    input: &str,
    policy: EmbeddedPolicy,
    config: &MinifyConfig,
) -> Result<Minified, MinifyError> {
    match language {
        Language::Html => try_minify_html(input, policy, config),
        Language::Css => try_minify_css(input, config),
        Language::Js => try_minify_js(input, config),
    }
}

fn output_or_original(input: &str, result: Result<Minified, MinifyError>) -> String {
    result
        .map(|m| m.output)
        .unwrap_or_else(|_| input.to_string())
}

/// Run a minifier, converting a panic into [`MinifyError`] and never
/// returning output longer than the input.
fn guard(
    language: Language,
    input: &str,
    run: impl FnOnce() -> Minified,
) -> Result<Minified, MinifyError> {
    let mut minified = panic::catch_unwind(AssertUnwindSafe(run)).map_err(|payload| {
        MinifyError::Panicked {
            language,
            message: panic_message(payload.as_ref()),
        }
    })?;

    if minified.output.len() > input.len() {
        minified.output = input.to_string();
    }
    Ok(minified)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tbmin_lexer::JsScanner;

    // =========================================================================
    // Config and policy
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = MinifyConfig::default();
        assert!(config.remove_comments);
        assert!(config.collapse_whitespace);
        assert!(!config.preserve_line_breaks);
        assert!(config.minify_embedded_js);
        assert!(config.minify_embedded_css);
        assert!(!config.strip_trailing_semicolons);
    }

    #[test]
    fn test_config_builders() {
        let config = MinifyConfig::new()
            .with_remove_comments(false)
            .with_preserve_line_breaks(true);
        assert!(!config.remove_comments);
        assert!(config.preserve_line_breaks);
        assert!(config.collapse_whitespace);
    }

    #[test]
    fn test_policy_from_capabilities() {
        let policy: EmbeddedPolicy = [Capability::CssMinifier].into_iter().collect();
        assert!(policy.contains(Capability::CssMinifier));
        assert!(!policy.contains(Capability::JsMinifier));
        assert_eq!(
            EmbeddedPolicy::NONE
                .with(Capability::JsMinifier)
                .with(Capability::CssMinifier),
            EmbeddedPolicy::ALL
        );
    }

    #[test]
    fn test_language_parsing() {
        assert_eq!("JS".parse::<Language>(), Ok(Language::Js));
        assert_eq!(Language::from_extension("htm"), Some(Language::Html));
        assert_eq!(Language::from_extension("png"), None);
        assert!("php".parse::<Language>().is_err());
    }

    // =========================================================================
    // Fatal fallback
    // =========================================================================

    #[test]
    fn test_guard_catches_panic() {
        let result = guard(Language::Css, "a{}", || panic!("boom"));
        assert_eq!(
            result,
            Err(MinifyError::Panicked {
                language: Language::Css,
                message: "boom".into()
            })
        );
    }

    #[test]
    fn test_guard_rejects_growth() {
        let result = guard(Language::Js, "ab", || Minified {
            output: "abc".into(),
            diagnostics: Vec::new(),
        });
        assert_eq!(result.unwrap().output, "ab");
    }

    #[test]
    fn test_error_display() {
        let err = MinifyError::Panicked {
            language: Language::Html,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "HTML minifier panicked: boom");
    }

    // =========================================================================
    // Scenarios
    // =========================================================================

    #[test]
    fn test_scenario_js_function() {
        assert_eq!(
            minify_js("function f() {\n  return 1 + 2; // sum\n}"),
            "function f(){return 1+2;}"
        );
    }

    #[test]
    fn test_scenario_css_rule() {
        assert_eq!(
            minify_css("body {\n  color: red;   /* red */\n}"),
            "body{color:red;}"
        );
    }

    #[test]
    fn test_scenario_html_inline_space() {
        assert_eq!(
            minify_html(
                "<div>  <span>a</span> <span>b</span>  </div>",
                EmbeddedPolicy::ALL
            ),
            "<div><span>a</span> <span>b</span></div>"
        );
    }

    #[test]
    fn test_scenario_division() {
        assert_eq!(minify_js("a = b / c"), "a=b/c");
    }

    #[test]
    fn test_scenario_return_regex_newline() {
        assert_eq!(
            minify_js("return\n/regex/.test(x)"),
            "return\n/regex/.test(x)"
        );
    }

    // =========================================================================
    // Properties
    // =========================================================================

    const JS_SAMPLES: &[&str] = &[
        "function f() {\n  return 1 + 2; // sum\n}",
        "var s = 'a  b', t = \"c // d\", r = /[/ ]+/g;\nx = a\n++b\n",
        "const t = `x ${ y + `z ${ w }` } v`;\nlet q = a / b / c;",
        "if (a) {\n  b()\n}\n(function () { return /x/ })()",
        "a = b\n/hi/g.exec(c)",
        "x = 1 .toString() + - -y + + +z;\nlabel:\nfor (;;) { break label }",
        "x = /re/ instanceof RegExp;\nif (/a/ in o) {}\nvar of = 4; y = of / 2 / 1;",
        "for (const m of /a/g.exec(s)) { yield / 2 }",
    ];

    const CSS_SAMPLES: &[&str] = &[
        "body {\n  color: red;   /* red */\n}",
        "@media screen and (max-width : 600px) {\n  a :hover , b > c { margin : 0 auto !important ; }\n}",
        "a { background: url( \"a b.png\" ) ; content: \"  x  \" }",
        ".a\\ b { width: calc(1px + 2px) }",
        ".card { color: red; span :hover { color: blue } }\na/**/.b, #id/**/.c { x: y }",
    ];

    const HTML_SAMPLES: &[&str] = &[
        "<div>  <span>a</span> <span>b</span>  </div>",
        "<!DOCTYPE html>\n<html>\n <head>\n  <title> T </title>\n  <style> a { color : red } </style>\n </head>\n <body>\n  <p>Hello   <b>world</b> !</p>\n  <pre>  keep\n   this </pre>\n  <!-- gone -->\n  <script>\n    var a = 1 ; // c\n  </script>\n </body>\n</html>",
        "<p>a <!-- c --> b</p><!--[if IE]> <p> x </p> <![endif]-->",
        "<textarea>  a\n  b </textarea> <input type=\"text\"  value=\"  v  \" />",
        "<p>a <script>x()</script> b <link rel=x> c</p>\n<div>\n  <meta name=m>\n</div>",
    ];

    fn significant(source: &str) -> Vec<(tbmin_lexer::TokenKind, String)> {
        JsScanner::significant_tokens(source)
            .into_iter()
            .map(|t| (t.kind, t.text.to_string()))
            .collect()
    }

    #[test]
    fn test_idempotence() {
        for s in JS_SAMPLES {
            let once = minify_js(s);
            assert_eq!(minify_js(&once), once, "js: {s}");
        }
        for s in CSS_SAMPLES {
            let once = minify_css(s);
            assert_eq!(minify_css(&once), once, "css: {s}");
        }
        for s in HTML_SAMPLES {
            let once = minify_html(s, EmbeddedPolicy::ALL);
            assert_eq!(minify_html(&once, EmbeddedPolicy::ALL), once, "html: {s}");
        }
    }

    #[test]
    fn test_js_token_stream_equality() {
        for s in JS_SAMPLES {
            assert_eq!(significant(&minify_js(s)), significant(s), "js: {s}");
        }
    }

    #[test]
    fn test_size_non_increase() {
        for s in JS_SAMPLES {
            assert!(minify_js(s).len() <= s.len(), "js: {s}");
        }
        for s in CSS_SAMPLES {
            assert!(minify_css(s).len() <= s.len(), "css: {s}");
        }
        for s in HTML_SAMPLES {
            assert!(minify_html(s, EmbeddedPolicy::ALL).len() <= s.len(), "html: {s}");
        }
    }

    #[test]
    fn test_literal_preservation() {
        let js = minify_js(JS_SAMPLES[1]);
        assert!(js.contains("'a  b'"));
        assert!(js.contains("\"c // d\""));
        assert!(js.contains("/[/ ]+/g"));

        let css = minify_css(CSS_SAMPLES[2]);
        assert!(css.contains("url( \"a b.png\" )"));
        assert!(css.contains("\"  x  \""));
    }

    #[test]
    fn test_preserved_blocks_byte_identical() {
        let html = minify_html(HTML_SAMPLES[1], EmbeddedPolicy::ALL);
        assert!(html.contains("<pre>  keep\n   this </pre>"));
        let html = minify_html(HTML_SAMPLES[3], EmbeddedPolicy::ALL);
        assert!(html.contains("<textarea>  a\n  b </textarea>"));
        assert!(html.contains("value=\"  v  \""));
    }

    #[test]
    fn test_bom_passes_through() {
        assert_eq!(minify_js("\u{FEFF} var a = 1;"), "\u{FEFF}var a=1;");
        assert_eq!(minify_css("\u{FEFF} a { }"), "\u{FEFF}a{}");
    }

    #[test]
    fn test_try_reports_diagnostics() {
        let result = try_minify_js("var s = 'open", &MinifyConfig::default()).unwrap();
        assert_eq!(result.output, "var s='open");
        assert!(!result.is_clean());
    }

    #[test]
    fn test_try_minify_dispatch() {
        let out = try_minify(
            Language::Css,
            "a { }",
            EmbeddedPolicy::NONE,
            &MinifyConfig::default(),
        )
        .unwrap();
        assert_eq!(out.output, "a{}");
    }
}
