//! Highlight marks: `==text==`
//!
//! Highlights are delimiter-paired like emphasis. The rule is ordered
//! after the emphasis rule so that when both compete over the same span
//! (`*==a==*`), the resolver pairs the inner `==` first and the highlight
//! nests inside the emphasis instead of tearing it apart.

use super::inline::{DelimKind, InlineContext};
use super::{InlineRule, Order};

pub(super) struct HighlightRule;

impl InlineRule for HighlightRule {
    fn name(&self) -> &'static str {
        "Highlight"
    }

    fn order(&self) -> Order {
        Order::After("Emphasis")
    }

    fn try_parse(&self, cx: &mut InlineContext<'_>, next: u8, pos: usize) -> Option<usize> {
        if next != b'=' || cx.byte(pos + 1) != Some(b'=') {
            return None;
        }
        Some(cx.add_delimiter(DelimKind::Highlight, b'=', pos, pos + 2, true, true))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
