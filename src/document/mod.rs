//! Document model
//!
//! This module provides the text substrate the parser and decoration
//! builder operate on: an immutable per-revision snapshot with line/offset
//! indexing, selection ranges, and the edit/transaction types used to
//! produce the next revision.
//!
//! The snapshot is the single source of truth; nothing in the crate ever
//! mutates it. Widgets and keymaps that want to change text produce an
//! [`Edit`] and route it through a [`Transaction`] like any typed input.

mod change;
mod selection;
mod text;

pub use change::{ChangeSet, Edit, Transaction};
pub use selection::Selection;
pub use text::{Document, Line};
