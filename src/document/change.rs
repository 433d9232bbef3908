//! Edits, change sets, and transactions
//!
//! An [`Edit`] replaces one byte range with new text. A [`ChangeSet`] is a
//! sorted, non-overlapping batch of edits against a single revision; it can
//! apply itself to produce the next snapshot and can map byte offsets from
//! the old revision into the new one. Offset mapping is what lets a stale
//! decoration set survive an edit while a rebuild is pending.

use super::{Document, Selection};

// ─────────────────────────────────────────────────────────────────────────────
// Edit
// ─────────────────────────────────────────────────────────────────────────────

/// A single range replacement: delete `from..to`, insert `insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Start of the replaced range (inclusive)
    pub from: usize,
    /// End of the replaced range (exclusive)
    pub to: usize,
    /// Replacement text (may be empty for a pure deletion)
    pub insert: String,
}

impl Edit {
    /// A pure insertion at `pos`.
    pub fn insert(pos: usize, text: impl Into<String>) -> Self {
        Self {
            from: pos,
            to: pos,
            insert: text.into(),
        }
    }

    /// A replacement of `from..to` with `text`.
    pub fn replace(from: usize, to: usize, text: impl Into<String>) -> Self {
        Self {
            from,
            to,
            insert: text.into(),
        }
    }

    /// A pure deletion of `from..to`.
    pub fn delete(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            insert: String::new(),
        }
    }

    /// Net change in document length caused by this edit.
    fn len_delta(&self) -> isize {
        self.insert.len() as isize - (self.to - self.from) as isize
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ChangeSet
// ─────────────────────────────────────────────────────────────────────────────

/// A batch of edits against one revision, kept sorted by start offset.
///
/// Edits must not overlap; `push` keeps the batch ordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    edits: Vec<Edit>,
}

impl ChangeSet {
    /// An empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A change set holding a single edit.
    pub fn single(edit: Edit) -> Self {
        Self { edits: vec![edit] }
    }

    /// Add an edit, keeping the set sorted by `from`.
    pub fn push(&mut self, edit: Edit) {
        let idx = self
            .edits
            .partition_point(|e| (e.from, e.to) <= (edit.from, edit.to));
        self.edits.insert(idx, edit);
    }

    /// Whether the set contains no edits.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// The edits, in ascending order.
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// Apply the edits to `doc`, producing the next snapshot.
    ///
    /// Edits are applied back-to-front so earlier offsets stay valid.
    pub fn apply(&self, doc: &Document) -> Document {
        let mut text = doc.text().to_string();
        for edit in self.edits.iter().rev() {
            let from = edit.from.min(text.len());
            let to = edit.to.clamp(from, text.len());
            text.replace_range(from..to, &edit.insert);
        }
        Document::new(text)
    }

    /// Map a byte offset in the old revision to the new revision.
    ///
    /// Positions inside a replaced range collapse to the start of the
    /// replacement.
    pub fn map_pos(&self, pos: usize) -> usize {
        let mut delta: isize = 0;
        for edit in &self.edits {
            if pos <= edit.from {
                break;
            }
            if pos < edit.to {
                return (edit.from as isize + delta) as usize;
            }
            delta += edit.len_delta();
        }
        (pos as isize + delta).max(0) as usize
    }

    /// The smallest range in the *old* revision touched by any edit.
    pub fn touched_range(&self) -> Option<(usize, usize)> {
        let first = self.edits.first()?;
        let last = self.edits.last()?;
        Some((first.from, last.to))
    }

    /// Net change in document length across all edits.
    pub fn len_delta(&self) -> isize {
        self.edits.iter().map(Edit::len_delta).sum()
    }
}

impl From<Edit> for ChangeSet {
    fn from(edit: Edit) -> Self {
        ChangeSet::single(edit)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transaction
// ─────────────────────────────────────────────────────────────────────────────

/// A change set plus an optional explicit selection for the new revision.
///
/// This is the one channel through which anything in the crate mutates
/// text: typed input, the checkbox widget's toggle, and the callout
/// Enter-continuation all produce transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    /// The edits to apply
    pub changes: ChangeSet,
    /// Selection after the edits, or `None` to map the old one through
    pub selection: Option<Selection>,
}

impl Transaction {
    /// A transaction carrying a single edit.
    pub fn edit(edit: Edit) -> Self {
        Self {
            changes: ChangeSet::single(edit),
            selection: None,
        }
    }

    /// A transaction that only moves the selection.
    pub fn select(selection: Selection) -> Self {
        Self {
            changes: ChangeSet::new(),
            selection: Some(selection),
        }
    }

    /// Attach an explicit post-edit selection.
    #[must_use]
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Apply to a document + selection pair, producing the next pair.
    pub fn apply(&self, doc: &Document, selection: Selection) -> (Document, Selection) {
        let new_doc = self.changes.apply(doc);
        let new_selection = self.selection.unwrap_or(Selection {
            anchor: self.changes.map_pos(selection.anchor),
            head: self.changes.map_pos(selection.head),
        });
        (new_doc, new_selection)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
