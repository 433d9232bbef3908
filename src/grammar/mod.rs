//! Grammar: base Markdown rules plus the custom extension set
//!
//! Parsing is split into two phases, mirroring the block/inline split of
//! the extensible grammar this crate grew out of:
//!
//! - **Block rules** look at the current line of a region and either claim
//!   it (consuming follow-up lines for multi-line constructs and emitting
//!   nodes with exact offsets) or report "no match" so the next candidate
//!   runs. Containers (blockquotes, callouts, lists) strip their per-line
//!   prefixes and parse the inner region recursively.
//! - **Inline rules** scan a paragraph-like region left to right. Simple
//!   constructs emit a complete node immediately; paired constructs
//!   register open/close delimiter candidates that a second pass resolves
//!   nearest-first, the same discipline as emphasis.
//!
//! Rules declare ordering relative to competitors (`before`/`after`), and
//! the composed parser merges everything into one deterministic rule
//! list.

mod block;
pub(crate) mod compose;
mod inline;

mod callout;
mod comment;
mod footnote;
mod frontmatter;
mod hashtag;
mod highlight;
mod task;
mod tex;
mod wiki_link;

pub use block::{BlockContext, LineSlice};
pub use compose::{Parser, ParserBuilder};
pub use frontmatter::frontmatter_metadata;
pub use inline::{DelimKind, InlineContext, InlineElement};

pub(crate) use block::base_block_rules;
pub(crate) use inline::base_inline_rules;

use crate::tree::NodeKind;

// ─────────────────────────────────────────────────────────────────────────────
// Ordering Directives
// ─────────────────────────────────────────────────────────────────────────────

/// Where a rule slots in relative to an already-registered rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Append in registration order.
    Default,
    /// Run before the named rule.
    Before(&'static str),
    /// Run after the named rule.
    After(&'static str),
}

// ─────────────────────────────────────────────────────────────────────────────
// Rule Traits
// ─────────────────────────────────────────────────────────────────────────────

/// A block-level grammar rule.
pub trait BlockRule {
    /// Unique rule name; two rules with the same name never coexist.
    fn name(&self) -> &'static str;

    /// Ordering directive relative to competing block rules.
    fn order(&self) -> Order {
        Order::Default
    }

    /// Attempt to parse a block starting at the context's current line.
    ///
    /// On match: consume the construct's lines, emit its nodes, return
    /// `true`. On no match: leave the context untouched, return `false`.
    fn try_parse(&self, cx: &mut BlockContext<'_, '_>) -> bool;
}

/// An inline-level grammar rule.
pub trait InlineRule {
    /// Unique rule name; two rules with the same name never coexist.
    fn name(&self) -> &'static str;

    /// Ordering directive relative to competing inline rules.
    fn order(&self) -> Order {
        Order::Default
    }

    /// Attempt to parse a construct starting at byte `pos` of the inline
    /// buffer, where `next` is the byte at `pos`. Returns the next scan
    /// position on match (after adding an element or delimiter), `None`
    /// otherwise.
    fn try_parse(&self, cx: &mut InlineContext<'_>, next: u8, pos: usize) -> Option<usize>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Extension Bundles
// ─────────────────────────────────────────────────────────────────────────────

/// One grammar extension: the block and/or inline rules for a single
/// custom construct.
pub struct Extension {
    pub name: &'static str,
    pub block_rules: Vec<Box<dyn BlockRule>>,
    pub inline_rules: Vec<Box<dyn InlineRule>>,
}

impl Extension {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            block_rules: Vec::new(),
            inline_rules: Vec::new(),
        }
    }

    fn with_block(mut self, rule: impl BlockRule + 'static) -> Self {
        self.block_rules.push(Box::new(rule));
        self
    }

    fn with_inline(mut self, rule: impl InlineRule + 'static) -> Self {
        self.inline_rules.push(Box::new(rule));
        self
    }
}

/// YAML frontmatter at offset 0.
pub fn frontmatter() -> Extension {
    Extension::new("YAMLFrontMatter").with_block(frontmatter::FrontMatterRule)
}

/// `%%comment%%`, block and inline variants.
pub fn comments() -> Extension {
    Extension::new("Comment")
        .with_block(comment::CommentBlockRule)
        .with_inline(comment::CommentInlineRule)
}

/// `[^id]` references and `[^id]: text` definitions.
pub fn footnotes() -> Extension {
    Extension::new("Footnote")
        .with_block(footnote::FootnoteDefRule)
        .with_inline(footnote::FootnoteRefRule)
}

/// `#tag` hashtags.
pub fn hashtags() -> Extension {
    Extension::new("Hashtag").with_inline(hashtag::HashtagRule)
}

/// `[[path#subpath|display]]` wiki-links and `![[..]]` embeds.
pub fn wiki_links() -> Extension {
    Extension::new("InternalLink")
        .with_inline(wiki_link::InternalLinkRule)
        .with_inline(wiki_link::EmbedRule)
}

/// `==highlight==` marks.
pub fn highlights() -> Extension {
    Extension::new("Highlight").with_inline(highlight::HighlightRule)
}

/// `- [ ]` task markers on list-item leaves.
pub fn tasks() -> Extension {
    Extension::new("Task").with_block(task::TaskRule)
}

/// `$inline$` and `$$block$$` TeX math.
pub fn tex() -> Extension {
    Extension::new("Tex")
        .with_block(tex::TexBlockRule)
        .with_inline(tex::TexInlineRule)
}

/// `> [!type]` callout blocks, nesting-aware.
pub fn callouts() -> Extension {
    Extension::new("Callout").with_block(callout::CalloutRule)
}

/// The marker child kinds that belong to a construct's raw syntax rather
/// than its content. The decoration builder treats these as toggleable.
pub const MARK_KINDS: &[NodeKind] = &[
    NodeKind::HeaderMark,
    NodeKind::QuoteMark,
    NodeKind::EmphasisMark,
    NodeKind::StrikethroughMark,
    NodeKind::CodeMark,
    NodeKind::LinkMark,
    NodeKind::InternalMark,
    NodeKind::EmbedMark,
    NodeKind::HighlightMark,
    NodeKind::CommentMarker,
    NodeKind::TexMarker,
    NodeKind::FootnoteMark,
];
