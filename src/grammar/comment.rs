//! Comments: `%%text%%`
//!
//! The block variant claims a line opening with `%%` and runs until the
//! next unescaped `%%`, spanning lines if it has to; with no closer it
//! degrades to spanning everything to the document end. The inline
//! variant is delimiter-paired; a `%%` can only act as a closer when the
//! most recent `%%` since the last newline is still open, which keeps a
//! same-line opener/closer pair honest.

use regex::Regex;
use std::sync::OnceLock;

use super::block::BlockContext;
use super::inline::{DelimKind, InlineContext};
use super::{BlockRule, InlineRule, Order};
use crate::tree::NodeKind;

fn comment_closer() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(^|[^\\])%%").expect("comment closer pattern"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Comments
// ─────────────────────────────────────────────────────────────────────────────

pub(super) struct CommentBlockRule;

impl BlockRule for CommentBlockRule {
    fn name(&self) -> &'static str {
        "CommentBlock"
    }

    fn order(&self) -> Order {
        Order::Before("Paragraph")
    }

    fn try_parse(&self, cx: &mut BlockContext<'_, '_>) -> bool {
        let text = cx.line_text();
        let indent = text.len() - text.trim_start().len();
        if !text[indent..].starts_with("%%") {
            return false;
        }
        let line = cx.line();
        let start = line.from + indent;

        let node = cx.add_node(NodeKind::Comment, start, line.to);
        cx.add_child(node, NodeKind::CommentMarker, start, start + 2);

        // Look for the closer on the opening line first, then line by line.
        let mut end = line.to;
        let mut closed = false;
        if let Some(m) = comment_closer().find(&text[indent + 2..]) {
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
            if let Some(m) = comment_closer().find(text) {
                end = line.from + m.end();
                closed = true;
            }
            cx.advance();
        }

        if closed {
            cx.add_child(node, NodeKind::CommentMarker, end - 2, end);
        } else {
            // Unterminated: extend to the end of the consumed region.
        }
        cx.set_range(node, start, end);
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inline Comments
// ─────────────────────────────────────────────────────────────────────────────

pub(super) struct CommentInlineRule;

impl InlineRule for CommentInlineRule {
    fn name(&self) -> &'static str {
        "CommentInline"
    }

    fn order(&self) -> Order {
        Order::Before("Emphasis")
    }

    fn try_parse(&self, cx: &mut InlineContext<'_>, next: u8, pos: usize) -> Option<usize> {
        if next != b'%' || cx.byte(pos + 1) != Some(b'%') {
            return None;
        }
        // Closer eligibility: only when an (unclosed) `%%` was seen more
        // recently than the last newline.
        let before = cx.slice(0, pos);
        let last_newline = before.rfind('\n').map(|i| i as isize).unwrap_or(-1);
        let last_marker = before.rfind("%%").map(|i| i as isize).unwrap_or(-1);
        let can_close = last_marker > last_newline;

        Some(cx.add_delimiter(DelimKind::Comment, b'%', pos, pos + 2, true, can_close))
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

    fn comments(tree: &SyntaxTree) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        tree.walk(0, usize::MAX, |_, node| {
            if node.kind == NodeKind::Comment {
                out.push((node.from, node.to));
            }
            Walk::Descend
        });
        out
    }

    #[test]
    fn test_inline_comment_same_line() {
        let (_, tree) = parse("keep %%hidden%% keep");
        assert_eq!(comments(&tree), vec![(5, 15)]);
    }

    #[test]
    fn test_block_comment_single_line() {
        let (doc, tree) = parse("%%all hidden%%");
        assert_eq!(comments(&tree), vec![(0, doc.len())]);
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let (doc, tree) = parse("%%first\nsecond\nthird%%\nafter");
        assert_eq!(comments(&tree), vec![(0, doc.line(3).to)]);
    }

    #[test]
    fn test_unterminated_comment_extends_to_document_end() {
        let (doc, tree) = parse("Some %%note with no closer\nmore text");
        let found = comments(&tree);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, 5);
        assert_eq!(found[0].1, doc.len());
    }

    #[test]
    fn test_unterminated_block_comment_extends_to_document_end() {
        let (doc, tree) = parse("%%open\nnever closed");
        assert_eq!(comments(&tree), vec![(0, doc.len())]);
    }
}
