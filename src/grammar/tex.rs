//! TeX math: `$inline$` and `$$block$$`
//!
//! Inline math uses single-dollar delimiters with flanking rules: the
//! opener needs a non-space, non-`$` character after it, the closer a
//! non-space character before it, so `$ 5 $` stays literal. Block math
//! opens on a line starting with `$$` and runs to the next unescaped
//! `$$`, or to the document end when unterminated.

use regex::Regex;
use std::sync::OnceLock;

use super::block::BlockContext;
use super::inline::{DelimKind, InlineContext};
use super::{BlockRule, InlineRule, Order};
use crate::tree::NodeKind;

fn tex_closer() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(^|[^\\])\$\$").expect("tex closer pattern"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Math
// ─────────────────────────────────────────────────────────────────────────────

pub(super) struct TexBlockRule;

impl BlockRule for TexBlockRule {
    fn name(&self) -> &'static str {
        "TexBlock"
    }

    fn order(&self) -> Order {
        Order::Before("FencedCode")
    }

    fn try_parse(&self, cx: &mut BlockContext<'_, '_>) -> bool {
        let text = cx.line_text();
        let indent = text.len() - text.trim_start().len();
        if !text[indent..].starts_with("$$") {
            return false;
        }
        let line = cx.line();
        let start = line.from + indent;

        let node = cx.add_node(NodeKind::TexBlock, start, line.to);
        cx.add_child(node, NodeKind::TexMarker, start, start + 2);

        let mut end = line.to;
        let mut closed = false;
        if let Some(m) = tex_closer().find(&text[indent + 2..]) {
            end = start + 2 + m.end();
            closed = true;
        }
        cx.advance();

        while !closed {
            if cx.at_end() {
                break;
            }
            let text = cx.line_text();
            let line = cx.line();
            end = line.to;
            if let Some(m) = tex_closer().find(text) {
                end = line.from + m.end();
                closed = true;
            }
            cx.advance();
        }

        if closed {
            cx.add_child(node, NodeKind::TexMarker, end - 2, end);
        }
        cx.set_range(node, start, end);
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inline Math
// ─────────────────────────────────────────────────────────────────────────────

pub(super) struct TexInlineRule;

impl InlineRule for TexInlineRule {
    fn name(&self) -> &'static str {
        "TexInline"
    }

    fn order(&self) -> Order {
        Order::Before("Emphasis")
    }

    fn try_parse(&self, cx: &mut InlineContext<'_>, next: u8, pos: usize) -> Option<usize> {
        if next != b'$' {
            return None;
        }
        // A double dollar mid-paragraph belongs to nothing; consume it so
        // the second `$` cannot fake a flank.
        if cx.byte(pos + 1) == Some(b'$') {
            return Some(pos + 2);
        }

        let after = cx.byte(pos + 1);
        let before = cx.prev_byte(pos);
        let can_open = matches!(after, Some(b) if !b.is_ascii_whitespace() && b != b'$');
        let can_close = matches!(before, Some(b) if !b.is_ascii_whitespace() && b != b'$');
        if !can_open && !can_close {
            return None;
        }
        Some(cx.add_delimiter(DelimKind::TexInline, b'$', pos, pos + 1, can_open, can_close))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::document::Document;
    use crate::grammar::ParserBuilder;
    use crate::tree::{NodeKind, SyntaxTree, Walk};

    fn parse(text: &str) -> (Document, SyntaxTree) {
        let doc = Document::new(text);
        let tree = ParserBuilder::markdown().build().parse(&doc);
        tree.check().unwrap();
        (doc, tree)
    }

    fn ranges(tree: &SyntaxTree, kind: NodeKind) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        tree.walk(0, usize::MAX, |_, node| {
            if node.kind == kind {
                out.push((node.from, node.to));
            }
            Walk::Descend
        });
        out
    }

    #[test]
    fn test_inline_math() {
        let (_, tree) = parse("sum $a+b$ done");
        assert_eq!(ranges(&tree, NodeKind::TexInline), vec![(4, 9)]);
        assert_eq!(ranges(&tree, NodeKind::TexMarker).len(), 2);
    }

    #[test]
    fn test_spaced_dollars_stay_literal() {
        let (_, tree) = parse("costs $ 5 $ total");
        assert!(ranges(&tree, NodeKind::TexInline).is_empty());
    }

    #[test]
    fn test_block_math_single_line() {
        let (doc, tree) = parse("$$x^2$$");
        assert_eq!(ranges(&tree, NodeKind::TexBlock), vec![(0, doc.len())]);
    }

    #[test]
    fn test_block_math_multi_line() {
        let (doc, tree) = parse("$$\nx = y\n$$\nafter");
        assert_eq!(ranges(&tree, NodeKind::TexBlock), vec![(0, doc.line(3).to)]);
    }

    #[test]
    fn test_unterminated_block_extends_to_document_end() {
        let (doc, tree) = parse("$$\nx = y\nno closer");
        assert_eq!(ranges(&tree, NodeKind::TexBlock), vec![(0, doc.len())]);
        // Exactly one marker: the opener.
        assert_eq!(ranges(&tree, NodeKind::TexMarker).len(), 1);
    }
}
