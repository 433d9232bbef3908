//! Vellum - a live-preview Markdown editing core
//!
//! Vellum overlays a plain-text Markdown buffer with live-rendered
//! widgets (headings, callouts, task checkboxes, wiki-links, math, code
//! blocks) while the underlying text stays the single source of truth.
//! The crate is the engine only: an embedding view layer supplies the
//! buffer, input events, and DOM, and consumes the decoration sets this
//! crate produces.
//!
//! # Features
//! - Extensible Markdown grammar: base CommonMark/GFM blocks and inlines
//!   plus callouts, wiki-links, embeds, hashtags, highlights, footnotes,
//!   comments, TeX math, YAML frontmatter, and task markers
//! - Incremental re-parsing of only the edited region
//! - Cursor-aware decoration building: constructs "open up" into raw
//!   source exactly while they are being edited
//! - Widget set with value equality and per-kind event ownership
//! - Callout Enter-continuation and deferred click-to-reveal overlays
//!
//! # Example
//! ```ignore
//! use vellum::{Config, Document, RichEdit, Selection, Transaction};
//!
//! let bundle = RichEdit::new(Config::default());
//! let mut state = bundle.state(Document::new("# Hello\n\n- [ ] task"));
//!
//! // An edit comes in from the host...
//! state.apply(&bundle, &Transaction::edit(vellum::Edit::insert(7, "!")));
//!
//! // ...and the fresh decorations are ready for the view.
//! for deco in state.decorations().iter() {
//!     // mount marks, widgets, line classes
//! }
//! ```

mod config;
mod decorations;
mod document;
mod error;
mod grammar;
mod interact;
mod style;
mod tree;
mod widgets;

pub use config::{Config, ExtensionToggles, QuoteIndent};
pub use decorations::{
    is_range_active, Decoration, DecorationBuilder, DecorationKind, DecorationSet, Viewport,
};
pub use document::{ChangeSet, Document, Edit, Line, Selection, Transaction};
pub use error::{Error, Result, ResultExt};
pub use grammar::{
    callouts, comments, footnotes, frontmatter, frontmatter_metadata, hashtags, highlights,
    tasks, tex, wiki_links, BlockContext, BlockRule, DelimKind, Extension, InlineContext,
    InlineElement, InlineRule, LineSlice, Order, Parser, ParserBuilder, MARK_KINDS,
};
pub use interact::{callout_enter, ClickReveal, GestureState};
pub use style::class_for;
pub use tree::{Node, NodeId, NodeKind, SyntaxTree, Walk};
pub use widgets::{
    CalloutWidget, CodeFlairWidget, EmbedCardWidget, EventKind, EventTarget, Fragment,
    HighlightedLine, HighlightedSegment, InputEvent, RenderedBlockWidget, RenderedCalloutWidget,
    SyntaxHighlighter, TaskCheckboxWidget, Widget,
};

use log::warn;

// ─────────────────────────────────────────────────────────────────────────────
// The Bundle
// ─────────────────────────────────────────────────────────────────────────────

/// The composable editor-extension bundle: the composed parser, the
/// style map, the decoration machinery, and the syntax highlighter, all
/// built from one [`Config`].
pub struct RichEdit {
    parser: Parser,
    config: Config,
    highlighter: SyntaxHighlighter,
}

impl RichEdit {
    /// Assemble the bundle for the given configuration.
    pub fn new(config: Config) -> Self {
        let toggles = config.extensions;
        let mut builder = ParserBuilder::new();
        if toggles.frontmatter {
            builder = builder.extension(grammar::frontmatter());
        }
        if toggles.comments {
            builder = builder.extension(grammar::comments());
        }
        if toggles.footnotes {
            builder = builder.extension(grammar::footnotes());
        }
        if toggles.hashtags {
            builder = builder.extension(grammar::hashtags());
        }
        if toggles.wiki_links {
            builder = builder.extension(grammar::wiki_links());
        }
        if toggles.highlights {
            builder = builder.extension(grammar::highlights());
        }
        if toggles.tasks {
            builder = builder.extension(grammar::tasks());
        }
        if toggles.tex {
            builder = builder.extension(grammar::tex());
        }
        if toggles.callouts {
            builder = builder.extension(grammar::callouts());
        }
        for name in &config.removed_rules {
            builder = builder.remove(name);
        }
        builder = builder.code_languages(config.code_languages.clone());

        Self {
            parser: builder.build(),
            config,
            highlighter: SyntaxHighlighter::new(),
        }
    }

    /// The composed parser.
    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// The configuration the bundle was built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The shared code-block highlighter.
    pub fn highlighter(&self) -> &SyntaxHighlighter {
        &self.highlighter
    }

    /// Initial state for a document: full parse plus a first decoration
    /// build over the whole document.
    pub fn state(&self, doc: Document) -> RichEditState {
        let selection = Selection::cursor(0);
        let viewport = Viewport::full(&doc);
        let tree = self.parser.parse(&doc);
        let decorations = DecorationBuilder::new(&self.parser, &self.config)
            .build(&doc, &tree, selection, viewport)
            .unwrap_or_warn_default(DecorationSet::empty(), "initial decoration build");
        RichEditState {
            doc,
            selection,
            viewport,
            tree,
            decorations,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// The Per-document State
// ─────────────────────────────────────────────────────────────────────────────

/// Live state for one document: the current snapshot, selection, syntax
/// tree, and decoration set. Every update runs synchronously and leaves
/// the state observing a fully-applied edit.
pub struct RichEditState {
    doc: Document,
    selection: Selection,
    viewport: Viewport,
    tree: SyntaxTree,
    decorations: DecorationSet,
}

impl RichEditState {
    /// The current document snapshot.
    pub fn doc(&self) -> &Document {
        &self.doc
    }

    /// The current main selection.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// The current syntax tree.
    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// The current decoration set, in canonical order.
    pub fn decorations(&self) -> &DecorationSet {
        &self.decorations
    }

    /// Apply a transaction: produce the next snapshot, incrementally
    /// re-parse, and rebuild decorations.
    ///
    /// A failed rebuild does not leave the view undecorated: the previous
    /// set is mapped through the edit and the fault is logged.
    pub fn apply(&mut self, bundle: &RichEdit, tx: &Transaction) {
        let (doc, selection) = tx.apply(&self.doc, self.selection);
        let tree = bundle.parser.reparse(&self.tree, &doc, &tx.changes);

        // Keep the viewport inside the new document; a whole-document
        // viewport tracks the new length.
        let viewport = if self.viewport.from == 0 && self.viewport.to >= self.doc.len() {
            Viewport::full(&doc)
        } else {
            Viewport {
                from: self.viewport.from.min(doc.len()),
                to: self.viewport.to.min(doc.len()),
            }
        };

        let decorations = match DecorationBuilder::new(&bundle.parser, &bundle.config)
            .build(&doc, &tree, selection, viewport)
        {
            Ok(set) => set,
            Err(err) => {
                warn!("decoration rebuild failed, mapping stale set: {}", err);
                self.decorations.map(&tx.changes)
            }
        };

        self.doc = doc;
        self.selection = selection;
        self.viewport = viewport;
        self.tree = tree;
        self.decorations = decorations;
    }

    /// Move the selection without changing text; rebuilds decorations.
    pub fn select(&mut self, bundle: &RichEdit, selection: Selection) {
        self.selection = selection;
        self.rebuild(bundle);
    }

    /// Change the visible range; rebuilds decorations for it.
    pub fn set_viewport(&mut self, bundle: &RichEdit, viewport: Viewport) {
        self.viewport = viewport;
        self.rebuild(bundle);
    }

    fn rebuild(&mut self, bundle: &RichEdit) {
        match DecorationBuilder::new(&bundle.parser, &bundle.config).build(
            &self.doc,
            &self.tree,
            self.selection,
            self.viewport,
        ) {
            Ok(set) => self.decorations = set,
            Err(err) => {
                warn!("decoration rebuild failed, keeping stale set: {}", err);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn checkbox_in(set: &DecorationSet) -> Option<TaskCheckboxWidget> {
        set.iter().find_map(|d| match &d.kind {
            DecorationKind::Replace {
                widget: Some(Widget::TaskCheckbox(t)),
                ..
            } => Some(t.clone()),
            _ => None,
        })
    }

    #[test]
    fn test_bundle_initializes_state() {
        let bundle = RichEdit::new(Config::default());
        let state = bundle.state(Document::new("# Hello\n\n- [ ] task"));
        assert!(!state.decorations().is_empty());
        assert_eq!(state.selection(), Selection::cursor(0));
    }

    #[test]
    fn test_typing_updates_tree_and_decorations() {
        let bundle = RichEdit::new(Config::default());
        let mut state = bundle.state(Document::new("plain"));

        state.apply(
            &bundle,
            &Transaction::edit(Edit::insert(0, "# "))
                .with_selection(Selection::cursor("# plain".len())),
        );
        assert_eq!(state.doc().text(), "# plain");
        let heading = state.tree().child_of_kind(state.tree().root(), NodeKind::Heading1);
        assert!(heading.is_some());
    }

    #[test]
    fn test_checkbox_click_flows_through_the_edit_channel() {
        let bundle = RichEdit::new(Config::default());
        let mut state = bundle.state(Document::new("- [ ] milk\n\nprose"));

        // Cursor far from the task, so the checkbox renders.
        state.select(&bundle, Selection::cursor(state.doc().len()));
        let checkbox = checkbox_in(state.decorations()).expect("checkbox");
        assert!(!checkbox.checked);

        // The click's edit goes through the same transaction channel.
        let edit = checkbox.toggle(state.doc()).unwrap();
        state.apply(&bundle, &Transaction::edit(edit));
        assert_eq!(state.doc().text(), "- [x] milk\n\nprose");

        let checkbox = checkbox_in(state.decorations()).expect("checkbox after toggle");
        assert!(checkbox.checked);
    }

    #[test]
    fn test_selection_change_reveals_construct() {
        let text = "a ==hl== b";
        let bundle = RichEdit::new(Config::default());
        let mut state = bundle.state(Document::new(text));

        // Cursor at 0: outside the highlight, marks hidden.
        let hidden = state
            .decorations()
            .iter()
            .filter(|d| matches!(d.kind, DecorationKind::Replace { widget: None, .. }))
            .count();
        assert_eq!(hidden, 2);

        // Move inside: the construct opens up.
        state.select(&bundle, Selection::cursor(4));
        let hidden = state
            .decorations()
            .iter()
            .filter(|d| matches!(d.kind, DecorationKind::Replace { widget: None, .. }))
            .count();
        assert_eq!(hidden, 0);
    }

    #[test]
    fn test_disabled_extension_stays_inert() {
        let config = Config {
            extensions: ExtensionToggles {
                hashtags: false,
                ..ExtensionToggles::default()
            },
            ..Config::default()
        };
        let bundle = RichEdit::new(config);
        let state = bundle.state(Document::new("a #tag b"));
        let mut hashtags = 0;
        state.tree().walk(0, usize::MAX, |_, node| {
            if node.kind == NodeKind::Hashtag {
                hashtags += 1;
            }
            Walk::Descend
        });
        assert_eq!(hashtags, 0);
    }

    #[test]
    fn test_frontmatter_metadata_through_bundle() {
        let bundle = RichEdit::new(Config::default());
        let state = bundle.state(Document::new("---\ntitle: T\n---\nbody"));
        let meta = frontmatter_metadata(state.doc(), state.tree())
            .unwrap()
            .unwrap();
        assert_eq!(meta["title"], serde_yaml::Value::from("T"));
    }
}
