//! Callout and rendered-block widgets
//!
//! Two callout variants share one card shape: `CalloutWidget` lays its
//! body out from the quote-stripped content lines, while
//! `RenderedCalloutWidget` hands the body to the external Markdown
//! renderer (comrak) and injects the produced HTML. Tables use the same
//! comrak-backed path through `RenderedBlockWidget`.

use comrak::{markdown_to_html, Options};
use regex::Regex;
use std::sync::OnceLock;

use super::fragment::Fragment;

/// Callout definition line: type inside `[!...]`, optional fold
/// indicator, optional title.
fn callout_head() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*>\s*\[!(?P<type>[^\]]+)\](?P<fold>[+-])?(?P<title>.*)$")
            .expect("callout head pattern")
    })
}

/// Render a Markdown slice through comrak with the GFM-style options the
/// rest of the crate assumes.
fn render_markdown(source: &str) -> String {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    markdown_to_html(source, &options)
}

/// Fold state carried on the widget root, per the fold indicator:
/// `+` starts closed, `-` starts open.
fn fold_state(fold: Option<char>) -> Option<&'static str> {
    match fold {
        Some('+') => Some("closed"),
        Some('-') => Some("open"),
        _ => None,
    }
}

fn title_row(callout_type: &str, title: &str) -> Fragment {
    let display_title = if title.is_empty() {
        let mut chars = callout_type.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    } else {
        title.to_string()
    };
    Fragment::new("div")
        .class("callout-title")
        .child(Fragment::new("div").class("callout-icon"))
        .child(
            Fragment::new("div")
                .class("callout-title-inner")
                .text(display_title),
        )
}

fn editing_utils(foldable: bool) -> Fragment {
    let mut utils = Fragment::new("div")
        .class("editing-utils-container")
        .child(
            Fragment::new("div")
                .class("edit-block-button")
                .attr("aria-label", "Edit this block"),
        );
    if foldable {
        utils = utils.child(
            Fragment::new("div")
                .class("callout-title-foldable")
                .attr("aria-label", "Toggle fold"),
        );
    }
    utils
}

// ─────────────────────────────────────────────────────────────────────────────
// Callout Widget
// ─────────────────────────────────────────────────────────────────────────────

/// Callout card built from the parsed node pieces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalloutWidget {
    /// Lowercased callout type (`note`, `warning`, ...)
    pub callout_type: String,
    /// Explicit title, empty when the type stands in for it
    pub title: String,
    /// Fold indicator character, if present
    pub fold: Option<char>,
    /// Quote-stripped body lines joined with newlines
    pub body: String,
    /// Start offset of the replaced range, for the edit button's cursor
    pub source_from: usize,
}

impl CalloutWidget {
    pub(super) fn render(&self) -> Fragment {
        let mut root = Fragment::root("cm-callout-widget")
            .class(format!("callout-{}", self.callout_type))
            .attr("data-callout", self.callout_type.clone());
        if let Some(state) = fold_state(self.fold) {
            root = root.attr("data-callout-fold", state);
        }

        root.child(title_row(&self.callout_type, &self.title))
            .child(
                Fragment::new("div")
                    .class("callout-content")
                    .child(Fragment::new("p").text(self.body.clone())),
            )
            .child(editing_utils(self.fold.is_some()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendered Callout Widget
// ─────────────────────────────────────────────────────────────────────────────

/// Callout card whose body is produced by the external Markdown renderer
/// from the raw source slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCalloutWidget {
    pub callout_type: String,
    pub title: String,
    pub fold: Option<char>,
    /// The raw `[from, to)` source slice of the callout
    pub source: String,
    pub source_from: usize,
}

impl RenderedCalloutWidget {
    /// Build from the raw source slice, extracting the metadata from the
    /// definition line.
    pub fn from_source(source: &str, source_from: usize) -> Self {
        let mut callout_type = "note".to_string();
        let mut title = String::new();
        let mut fold = None;
        if let Some(first_line) = source.lines().next() {
            if let Some(caps) = callout_head().captures(first_line) {
                callout_type = caps["type"].trim().to_lowercase();
                title = caps["title"].trim().to_string();
                fold = caps.name("fold").and_then(|m| m.as_str().chars().next());
            }
        }
        Self {
            callout_type,
            title,
            fold,
            source: source.to_string(),
            source_from,
        }
    }

    /// The body markdown: everything after the definition line, stripped
    /// of one quote level.
    fn body_markdown(&self) -> String {
        self.source
            .lines()
            .skip(1)
            .map(|line| {
                let trimmed = line.trim_start();
                let stripped = trimmed.strip_prefix("> ").or_else(|| trimmed.strip_prefix('>'));
                stripped.unwrap_or(line)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub(super) fn render(&self) -> Fragment {
        let mut root = Fragment::root("cm-callout-widget")
            .class(format!("callout-{}", self.callout_type))
            .attr("data-callout", self.callout_type.clone());
        if let Some(state) = fold_state(self.fold) {
            root = root.attr("data-callout-fold", state);
        }
        root.child(title_row(&self.callout_type, &self.title))
            .child(
                Fragment::new("div")
                    .class("callout-content")
                    .raw_html(render_markdown(&self.body_markdown())),
            )
            .child(editing_utils(self.fold.is_some()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendered Block Widget
// ─────────────────────────────────────────────────────────────────────────────

/// Generic rendered block for constructs whose inactive form is simply
/// the rendered Markdown (tables).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBlockWidget {
    /// The raw source slice of the block
    pub source: String,
    pub source_from: usize,
}

impl RenderedBlockWidget {
    pub fn new(source: impl Into<String>, source_from: usize) -> Self {
        Self {
            source: source.into(),
            source_from,
        }
    }

    pub(super) fn render(&self) -> Fragment {
        Fragment::root("cm-markdoc-renderBlock")
            .raw_html(render_markdown(&self.source))
            .child(editing_utils(false))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
