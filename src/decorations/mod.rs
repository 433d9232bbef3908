//! Decorations
//!
//! A decoration is a display directive over a document range: attach a
//! class (`Mark`), substitute the rendered form (`Replace`, optionally
//! with a widget and optionally block-level), or attach classes/styles to
//! a whole line (`Line`). Decorations are plain values, produced fresh on
//! every rebuild, and totally ordered so the host can apply a set
//! deterministically: by start offset, then start side (point-like line
//! decorations sort before replacements, replacements before mark
//! starts), then end offset. Any instability in that order shows up as
//! flicker or invalid-overlap errors in the host view.

mod builder;

pub use builder::{is_range_active, DecorationBuilder, Viewport};

use crate::document::ChangeSet;
use crate::widgets::Widget;

// ─────────────────────────────────────────────────────────────────────────────
// Decoration
// ─────────────────────────────────────────────────────────────────────────────

/// What a decoration does to its range.
#[derive(Debug, Clone, PartialEq)]
pub enum DecorationKind {
    /// Attach classes (and an optional inline style) to the line starting
    /// at `from`. Point-like: `from == to`.
    Line {
        classes: Vec<String>,
        style: Option<String>,
    },
    /// Substitute the range's rendered form. `widget: None` hides the
    /// range entirely (toggleable marks); `block` claims its own line.
    Replace { widget: Option<Widget>, block: bool },
    /// Attach a CSS class without changing content.
    Mark { class: &'static str },
}

/// One display directive over `[from, to)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    pub from: usize,
    pub to: usize,
    pub kind: DecorationKind,
}

impl Decoration {
    /// A line-attribute decoration at the line starting at `at`.
    pub fn line(at: usize, classes: Vec<String>, style: Option<String>) -> Self {
        Self {
            from: at,
            to: at,
            kind: DecorationKind::Line { classes, style },
        }
    }

    /// Hide a range (replace with nothing).
    pub fn hide(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            kind: DecorationKind::Replace {
                widget: None,
                block: false,
            },
        }
    }

    /// Replace a range with a widget.
    pub fn replace(from: usize, to: usize, widget: Widget, block: bool) -> Self {
        Self {
            from,
            to,
            kind: DecorationKind::Replace {
                widget: Some(widget),
                block,
            },
        }
    }

    /// Mark a range with a class.
    pub fn mark(from: usize, to: usize, class: &'static str) -> Self {
        Self {
            from,
            to,
            kind: DecorationKind::Mark { class },
        }
    }

    /// The stable start-side tag: points before replacements before marks.
    fn start_side(&self) -> i8 {
        match self.kind {
            DecorationKind::Line { .. } => -2,
            DecorationKind::Replace { .. } => -1,
            DecorationKind::Mark { .. } => 0,
        }
    }

    /// The canonical ordering key.
    pub fn sort_key(&self) -> (usize, i8, usize) {
        (self.from, self.start_side(), self.to)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoration Sets
// ─────────────────────────────────────────────────────────────────────────────

/// A canonically ordered set of decorations for one rebuild.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecorationSet {
    items: Vec<Decoration>,
}

impl DecorationSet {
    /// Sort into canonical order (stable, so equal keys keep insertion
    /// order and rebuilds stay deterministic).
    pub fn from_unsorted(mut items: Vec<Decoration>) -> Self {
        items.sort_by_key(Decoration::sort_key);
        Self { items }
    }

    /// An empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decoration> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Carry a stale set through an edit by mapping every range. Used as
    /// the degraded fallback when a rebuild fails: better an approximately
    /// placed decoration than an undecorated view.
    pub fn map(&self, changes: &ChangeSet) -> DecorationSet {
        let items = self
            .items
            .iter()
            .map(|d| Decoration {
                from: changes.map_pos(d.from),
                to: changes.map_pos(d.to).max(changes.map_pos(d.from)),
                kind: d.kind.clone(),
            })
            .collect();
        DecorationSet { items }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
