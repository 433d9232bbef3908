//! Interaction overlays
//!
//! Two small behaviors that have to cooperate with the decoration state
//! instead of fighting it: Enter-key continuation inside callouts, and
//! the deferred click gesture that keeps a cross-line click from
//! revealing source until the pointer actually commits to it.

use regex::Regex;
use std::sync::OnceLock;

use crate::document::{Document, Edit, Selection, Transaction};
use crate::tree::{NodeKind, SyntaxTree};

// ─────────────────────────────────────────────────────────────────────────────
// Callout Enter-continuation
// ─────────────────────────────────────────────────────────────────────────────

/// Handle Enter inside a callout body: continue the quote prefix at the
/// same nesting depth so the callout stays syntactically one block.
///
/// Returns `None` when the default newline should apply: the cursor is
/// not inside a callout, or it sits on the definition line.
pub fn callout_enter(
    doc: &Document,
    tree: &SyntaxTree,
    selection: Selection,
) -> Option<Transaction> {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    let prefix_re =
        PREFIX.get_or_init(|| Regex::new(r"^(\s*)((?:> ?)+)").expect("quote prefix pattern"));

    if !selection.is_empty() {
        return None;
    }
    let pos = selection.head;
    let callout = tree.innermost_at(pos, NodeKind::Callout)?;
    let node = tree.node(callout);

    let line = doc.line_at(pos);
    let first_line = doc.line_at(node.from);
    if line.number == first_line.number {
        // The definition line keeps the default Enter behavior.
        return None;
    }

    // An empty `>`-only line means the user wants out of the callout.
    if line.text.trim() == ">" {
        let tx = Transaction::edit(Edit::insert(pos, "\n\n"))
            .with_selection(Selection::cursor(pos + 2));
        return Some(tx);
    }

    let caps = prefix_re.captures(line.text)?;
    let indent = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let depth = caps
        .get(2)
        .map(|m| m.as_str().matches('>').count())
        .unwrap_or(1);

    let insert = format!("\n{}{}", indent, "> ".repeat(depth));
    let cursor = pos + insert.len();
    Some(Transaction::edit(Edit::insert(pos, insert)).with_selection(Selection::cursor(cursor)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Deferred Click-to-reveal
// ─────────────────────────────────────────────────────────────────────────────

/// The gesture machine's state. Nothing survives outside one gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// A cross-line pointer-down happened; the selection change waits for
    /// the matching pointer-up.
    PendingCommit(usize),
}

/// Defers a cross-line click's selection change until pointer-up lands
/// inside the editable surface. A click-drag that leaves the surface
/// therefore never reveals source, and a same-line click keeps the
/// host's default behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClickReveal {
    state: GestureState,
}

impl ClickReveal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current machine state.
    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Pointer-down at document offset `pos`. Returns `true` when the
    /// default selection change must be suppressed (the machine took
    /// ownership of the gesture).
    pub fn on_pointer_down(&mut self, doc: &Document, selection: Selection, pos: usize) -> bool {
        let clicked_line = doc.line_at(pos);
        let cursor_on_clicked_line = selection.is_empty()
            && selection.head >= clicked_line.from
            && selection.head <= clicked_line.to;

        if cursor_on_clicked_line {
            // Same line: normal in-line interactions apply.
            self.state = GestureState::Idle;
            return false;
        }
        self.state = GestureState::PendingCommit(pos);
        true
    }

    /// Pointer-up. Returns the selection to commit, if the gesture ends
    /// inside the editable surface.
    pub fn on_pointer_up(&mut self, inside_surface: bool) -> Option<Selection> {
        let state = std::mem::take(&mut self.state);
        match state {
            GestureState::PendingCommit(pos) if inside_surface => Some(Selection::cursor(pos)),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
