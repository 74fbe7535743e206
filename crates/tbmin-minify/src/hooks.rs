//! Host integration.
//!
//! The host CMS fires named action hooks with a parameter map and replaces
//! its buffer with whatever the handler returns. `None` tells the host to
//! keep the buffer it already has.

use std::collections::HashMap;

use crate::{EmbeddedPolicy, Language, MinifyConfig};

/// Action hooks the minifier module registers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    ActionMinifyHtml,
    ActionMinifyCss,
    ActionMinifyJs,
}

impl Hook {
    pub const ALL: [Hook; 3] = [
        Hook::ActionMinifyHtml,
        Hook::ActionMinifyCss,
        Hook::ActionMinifyJs,
    ];

    /// Name the host registers and fires the hook under.
    pub fn name(self) -> &'static str {
        match self {
            Hook::ActionMinifyHtml => "actionMinifyHtml",
            Hook::ActionMinifyCss => "actionMinifyCss",
            Hook::ActionMinifyJs => "actionMinifyJs",
        }
    }

    /// Key of the parameter that carries the text.
    pub fn param(self) -> &'static str {
        match self {
            Hook::ActionMinifyHtml => "html",
            Hook::ActionMinifyCss => "css",
            Hook::ActionMinifyJs => "js",
        }
    }

    pub fn language(self) -> Language {
        match self {
            Hook::ActionMinifyHtml => Language::Html,
            Hook::ActionMinifyCss => Language::Css,
            Hook::ActionMinifyJs => Language::Js,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|hook| hook.name() == name)
    }
}

/// The minifier as a host module: a config plus the embedded policy used
/// for HTML.
#[derive(Debug, Clone)]
pub struct MinifierModule {
    config: MinifyConfig,
    policy: EmbeddedPolicy,
}

impl Default for MinifierModule {
    fn default() -> Self {
        Self::new(MinifyConfig::default())
    }
}

impl MinifierModule {
    /// Module with every embedded minifier enabled.
    pub fn new(config: MinifyConfig) -> Self {
        Self {
            config,
            policy: EmbeddedPolicy::ALL,
        }
    }

    pub fn with_policy(mut self, policy: EmbeddedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &MinifyConfig {
        &self.config
    }

    pub fn registered_hooks(&self) -> &'static [Hook] {
        &Hook::ALL
    }

    /// Handle a fired hook. A missing parameter minifies the empty string.
    pub fn dispatch(&self, hook: Hook, params: &HashMap<String, String>) -> Option<String> {
        let input = params.get(hook.param()).map(String::as_str).unwrap_or("");
        self.run(hook, input)
    }

    pub fn action_minify_html(&self, html: &str) -> Option<String> {
        self.run(Hook::ActionMinifyHtml, html)
    }

    pub fn action_minify_css(&self, css: &str) -> Option<String> {
        self.run(Hook::ActionMinifyCss, css)
    }

    pub fn action_minify_js(&self, js: &str) -> Option<String> {
        self.run(Hook::ActionMinifyJs, js)
    }

    fn run(&self, hook: Hook, input: &str) -> Option<String> {
        let language = hook.language();
        match crate::try_minify(language, input, self.policy, &self.config) {
            Ok(minified) => {
                for diagnostic in &minified.diagnostics {
                    tracing::debug!(hook = hook.name(), "{diagnostic}; passed through verbatim");
                }
                Some(minified.output)
            }
            Err(e) => {
                tracing::error!(hook = hook.name(), "{language} minification failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(key: &str, value: &str) -> HashMap<String, String> {
        HashMap::from([(key.to_string(), value.to_string())])
    }

    #[test]
    fn test_hook_names() {
        let names: Vec<&str> = Hook::ALL.iter().map(|h| h.name()).collect();
        assert_eq!(
            names,
            vec!["actionMinifyHtml", "actionMinifyCss", "actionMinifyJs"]
        );
        assert_eq!(Hook::from_name("actionMinifyCss"), Some(Hook::ActionMinifyCss));
        assert_eq!(Hook::from_name("actionMinifyPhp"), None);
    }

    #[test]
    fn test_registered_hooks() {
        let module = MinifierModule::default();
        assert_eq!(module.registered_hooks().len(), 3);
        assert!(module.registered_hooks().contains(&Hook::ActionMinifyJs));
    }

    #[test]
    fn test_dispatch_each_hook() {
        let module = MinifierModule::new(MinifyConfig::default());
        assert_eq!(
            module.dispatch(Hook::ActionMinifyHtml, &params("html", "<p> a </p>")),
            Some("<p>a</p>".to_string())
        );
        assert_eq!(
            module.dispatch(Hook::ActionMinifyCss, &params("css", "a { b : c }")),
            Some("a{b:c}".to_string())
        );
        assert_eq!(
            module.dispatch(Hook::ActionMinifyJs, &params("js", "f ( 1 )")),
            Some("f(1)".to_string())
        );
    }

    #[test]
    fn test_dispatch_missing_param() {
        let module = MinifierModule::new(MinifyConfig::default());
        assert_eq!(
            module.dispatch(Hook::ActionMinifyJs, &params("css", "a{}")),
            Some(String::new())
        );
    }

    #[test]
    fn test_policy_applies_to_html() {
        let module =
            MinifierModule::new(MinifyConfig::default()).with_policy(EmbeddedPolicy::NONE);
        assert_eq!(
            module.action_minify_html("<style> a { } </style>"),
            Some("<style> a { } </style>".to_string())
        );
    }

    #[test]
    fn test_recovered_input_still_minified() {
        let module = MinifierModule::new(MinifyConfig::default());
        assert_eq!(
            module.action_minify_css("a { } /* open"),
            Some("a{}/* open".to_string())
        );
    }
}
