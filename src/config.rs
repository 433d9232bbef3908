//! Configuration for the rich-edit bundle
//!
//! This module defines the `Config` struct that holds all embedder-facing
//! options, with serde support for JSON persistence by the host
//! application. Vellum itself never touches the filesystem; the host
//! round-trips the JSON wherever it keeps its settings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─────────────────────────────────────────────────────────────────────────────
// Extension Toggles
// ─────────────────────────────────────────────────────────────────────────────

/// Which grammar extensions the composed parser carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ExtensionToggles {
    pub frontmatter: bool,
    pub comments: bool,
    pub footnotes: bool,
    pub hashtags: bool,
    pub wiki_links: bool,
    pub highlights: bool,
    pub tasks: bool,
    pub tex: bool,
    pub callouts: bool,
}

impl Default for ExtensionToggles {
    fn default() -> Self {
        Self {
            frontmatter: true,
            comments: true,
            footnotes: true,
            hashtags: true,
            wiki_links: true,
            highlights: true,
            tasks: true,
            tex: true,
            callouts: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Quote Indentation
// ─────────────────────────────────────────────────────────────────────────────

/// Pixel metrics for the per-nesting-level quote indentation styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteIndent {
    /// Width reserved for the marker area on the first level
    pub base_px: u32,
    /// Additional indent per nesting level
    pub per_level_px: u32,
}

impl Default for QuoteIndent {
    fn default() -> Self {
        Self {
            base_px: 29,
            per_level_px: 36,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

/// All embedder-facing options for one rich-edit bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Grammar extensions to activate
    pub extensions: ExtensionToggles,
    /// Base rules to remove from the composed parser
    pub removed_rules: Vec<String>,
    /// Render callout bodies through the external Markdown renderer
    /// instead of the plain-text card
    pub rendered_callouts: bool,
    /// Quote indentation metrics
    pub quote_indent: QuoteIndent,
    /// syntect theme for code-block highlighting
    pub code_theme: String,
    /// Fenced-code language aliases (e.g. `rs` → `rust`)
    pub code_languages: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions: ExtensionToggles::default(),
            // A stricter heading pass supersedes Setext underlines.
            removed_rules: vec!["SetextHeading".to_string()],
            rendered_callouts: false,
            quote_indent: QuoteIndent::default(),
            code_theme: crate::widgets::SyntaxHighlighter::default_theme().to_string(),
            code_languages: HashMap::new(),
        }
    }
}

impl Config {
    /// Serialize to pretty JSON for the host's settings store.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from the host's settings store.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_all_extensions() {
        let config = Config::default();
        assert!(config.extensions.callouts);
        assert!(config.extensions.wiki_links);
        assert_eq!(config.removed_rules, vec!["SetextHeading"]);
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = Config::default();
        config.extensions.hashtags = false;
        config.rendered_callouts = true;
        config
            .code_languages
            .insert("rs".to_string(), "rust".to_string());

        let json = config.to_json().unwrap();
        let restored = Config::from_json(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = Config::from_json(r#"{"rendered_callouts": true}"#).unwrap();
        assert!(config.rendered_callouts);
        assert!(config.extensions.tex);
        assert_eq!(config.quote_indent.base_px, 29);
    }
}
