//! Footnotes: inline `[^id]` references and `[^id]: text` definitions
//!
//! Reference labels must be non-empty and free of whitespace and
//! brackets. A definition claims its own line and keeps consuming
//! follow-up lines while they are blank or indented relative to it.

use regex::Regex;
use std::sync::OnceLock;

use super::block::{BlockContext, starts_block};
use super::inline::InlineContext;
use super::{BlockRule, InlineRule, Order};
use crate::tree::NodeKind;

fn footnote_ref() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[\^[^\s\[\]]+\]").expect("footnote reference pattern"))
}

fn footnote_def() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ {0,3}\[\^[^\s\[\]]+\]:").expect("footnote definition pattern"))
}

/// Whether a line opens a footnote definition.
pub(crate) fn is_footnote_def(text: &str) -> bool {
    footnote_def().is_match(text)
}

// ─────────────────────────────────────────────────────────────────────────────
// Inline Reference
// ─────────────────────────────────────────────────────────────────────────────

pub(super) struct FootnoteRefRule;

impl InlineRule for FootnoteRefRule {
    fn name(&self) -> &'static str {
        "Footnote"
    }

    fn order(&self) -> Order {
        Order::Before("Link")
    }

    fn try_parse(&self, cx: &mut InlineContext<'_>, next: u8, pos: usize) -> Option<usize> {
        if next != b'[' || cx.byte(pos + 1) != Some(b'^') {
            return None;
        }
        let m = footnote_ref().find(cx.slice(pos, cx.len()))?;
        let end = pos + m.end();
        let children = vec![
            cx.elt(NodeKind::FootnoteMark, pos, pos + 2),
            cx.elt(NodeKind::FootnoteLabel, pos + 2, end - 1),
            cx.elt(NodeKind::FootnoteMark, end - 1, end),
        ];
        let footnote = cx.elt_with(NodeKind::Footnote, pos, end, children);
        Some(cx.add_element(footnote))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Definition
// ─────────────────────────────────────────────────────────────────────────────

pub(super) struct FootnoteDefRule;

impl BlockRule for FootnoteDefRule {
    fn name(&self) -> &'static str {
        "FootnoteReference"
    }

    fn order(&self) -> Order {
        Order::Before("Paragraph")
    }

    fn try_parse(&self, cx: &mut BlockContext<'_, '_>) -> bool {
        let text = cx.line_text();
        let Some(m) = footnote_def().find(text) else {
            return false;
        };
        let line = cx.line();
        let indent = text.len() - text.trim_start().len();
        let label_from = line.from + indent + 2; // past "[^"
        let label_to = line.from + m.end() - 2; // before "]:"

        let node = cx.add_node(NodeKind::FootnoteReference, line.from + indent, line.to);
        cx.add_child(node, NodeKind::FootnoteMark, line.from + indent, label_from);
        cx.add_child(node, NodeKind::FootnoteLabel, label_from, label_to);
        cx.add_child(node, NodeKind::FootnoteMark, label_to, label_to + 2);

        let mut ranges = vec![(line.from + m.end(), line.to)];
        let mut end = line.to;
        cx.advance();

        // Multi-line definitions: blank-or-indented lines continue, but a
        // blank run only survives if an indented line follows it.
        let parser = cx.parser();
        while !cx.at_end() {
            let text = cx.line_text();
            if text.trim().is_empty() {
                match cx.peek_text(1) {
                    Some(next)
                        if !next.trim().is_empty()
                            && next.starts_with(' ')
                            && !is_footnote_def(next) =>
                    {
                        cx.advance();
                        continue;
                    }
                    _ => break,
                }
            }
            if !text.starts_with(' ') || is_footnote_def(text) || starts_block(parser, text) {
                break;
            }
            let line = cx.line();
            ranges.push((line.from, line.to));
            end = line.to;
            cx.advance();
        }

        cx.parse_inline_into(node, &ranges);
        cx.set_range(node, line.from + indent, end);
        cx.sort_children(node);
        true
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

    fn collect(tree: &SyntaxTree, kind: NodeKind) -> Vec<(usize, usize)> {
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
    fn test_inline_reference() {
        let (doc, tree) = parse("claim[^1] made");
        let refs = collect(&tree, NodeKind::Footnote);
        assert_eq!(refs, vec![(5, 9)]);
        let labels = collect(&tree, NodeKind::FootnoteLabel);
        assert_eq!(doc.slice(labels[0].0, labels[0].1), "1");
    }

    #[test]
    fn test_reference_label_must_be_clean() {
        let (_, tree) = parse("bad[^a b] and[^] too");
        assert!(collect(&tree, NodeKind::Footnote).is_empty());
    }

    #[test]
    fn test_definition_block() {
        let (doc, tree) = parse("[^note]: the footnote text");
        let defs = collect(&tree, NodeKind::FootnoteReference);
        assert_eq!(defs, vec![(0, doc.len())]);
    }

    #[test]
    fn test_multiline_definition_by_indent() {
        let (doc, tree) = parse("[^a]: first\n  continued\nnot part");
        let defs = collect(&tree, NodeKind::FootnoteReference);
        assert_eq!(defs[0].1, doc.line(2).to);
    }

    #[test]
    fn test_two_definitions_do_not_merge() {
        let (doc, tree) = parse("[^a]: one\n[^b]: two");
        let defs = collect(&tree, NodeKind::FootnoteReference);
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].1, doc.line(1).to);
    }
}
