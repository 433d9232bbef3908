//! Code block chrome and syntax highlighting
//!
//! This module integrates syntect for code block syntax highlighting in
//! the rendered mode.
//!
//! # Features
//! - Loads and caches syntect SyntaxSet and ThemeSet
//! - Provides theme-aware highlighting (dark/light)
//! - Highlights code by fenced-code language identifier
//! - Emits CSS-colored segments the embedding view can mount directly
//!
//! The `CodeFlairWidget` is the visible chrome: it replaces the opening
//! fence line with the language label and a copy button carrying the code
//! payload, while the highlighted body stays in place as styled lines.

use log::{debug, warn};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use super::fragment::Fragment;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Default dark theme name from syntect's built-in themes
pub const DEFAULT_DARK_THEME: &str = "base16-ocean.dark";

/// Default light theme name from syntect's built-in themes
pub const DEFAULT_LIGHT_THEME: &str = "InspiredGitHub";

// ─────────────────────────────────────────────────────────────────────────────
// Highlighted Segments
// ─────────────────────────────────────────────────────────────────────────────

/// A run of code with one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightedSegment {
    /// The text content of this segment
    pub text: String,
    /// CSS color (`#rrggbb`) for this segment
    pub color: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl HighlightedSegment {
    fn from_style(text: &str, style: Style) -> Self {
        use syntect::highlighting::FontStyle;
        Self {
            text: text.to_string(),
            color: format!(
                "#{:02x}{:02x}{:02x}",
                style.foreground.r, style.foreground.g, style.foreground.b
            ),
            bold: style.font_style.contains(FontStyle::BOLD),
            italic: style.font_style.contains(FontStyle::ITALIC),
            underline: style.font_style.contains(FontStyle::UNDERLINE),
        }
    }
}

/// One highlighted line of a code block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HighlightedLine {
    pub segments: Vec<HighlightedSegment>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Syntax Highlighter
// ─────────────────────────────────────────────────────────────────────────────

/// Cached syntect state. Construct once and share; loading the syntax
/// definitions is the expensive part.
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl SyntaxHighlighter {
    /// The theme used when the configuration names none.
    pub fn default_theme() -> &'static str {
        DEFAULT_DARK_THEME
    }

    /// Load the built-in syntax and theme sets.
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    /// Highlight `code` as `language`, falling back to plain text for
    /// unknown languages and to the dark default for unknown themes.
    pub fn highlight(&self, code: &str, language: &str, theme_name: &str) -> Vec<HighlightedLine> {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(language)
            .unwrap_or_else(|| {
                debug!("no syntax for '{}', using plain text", language);
                self.syntax_set.find_syntax_plain_text()
            });
        let theme = self.theme_set.themes.get(theme_name).unwrap_or_else(|| {
            warn!("unknown theme '{}', using {}", theme_name, DEFAULT_DARK_THEME);
            &self.theme_set.themes[DEFAULT_DARK_THEME]
        });

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut lines = Vec::new();
        for line in LinesWithEndings::from(code) {
            let segments = match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(regions) => regions
                    .into_iter()
                    .map(|(style, text)| {
                        HighlightedSegment::from_style(text.trim_end_matches('\n'), style)
                    })
                    .filter(|s| !s.text.is_empty())
                    .collect(),
                Err(err) => {
                    warn!("highlighting failed: {}", err);
                    Vec::new()
                }
            };
            lines.push(HighlightedLine { segments });
        }
        lines
    }
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Code Flair Widget
// ─────────────────────────────────────────────────────────────────────────────

/// First-line chrome of an inactive fenced code block: the language flair
/// and a copy button holding the block's code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFlairWidget {
    /// Resolved language tag (after alias mapping), possibly empty
    pub language: String,
    /// The pure code content, without the fence lines
    pub code: String,
}

impl CodeFlairWidget {
    pub fn new(language: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            code: code.into(),
        }
    }

    pub(super) fn render(&self) -> Fragment {
        Fragment::root("cm-codeblock-flair-container").child(
            Fragment::new("button")
                .class("cm-codeblock-copy-button")
                .attr("data-copy", self.code.clone())
                .text(self.language.clone()),
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
