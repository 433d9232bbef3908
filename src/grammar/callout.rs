//! Callout blocks: `> [!type]fold title`
//!
//! A callout is syntactically a blockquote whose first line carries a
//! `[!type]` marker, so the rule must run before the generic blockquote
//! rule. The content lines are stripped of one quote level and parsed
//! recursively, which is what makes nested callouts (`> > [!warning]`)
//! come out as child Callout nodes: a callout ends exactly where the
//! quote nesting depth drops below its own.

use regex::Regex;
use std::sync::OnceLock;

use super::block::{quote_marker, BlockContext, LineSlice};
use super::{BlockRule, Order};
use crate::tree::NodeKind;

/// Captures the callout definition after the quote marker:
/// type inside `[!...]`, optional `+`/`-` fold indicator, optional title.
fn callout_definition() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*\[!(?P<type>[^\]]+)\](?P<fold>[+-])?(?P<title>.*)$")
            .expect("callout definition pattern")
    })
}

pub(super) struct CalloutRule;

impl BlockRule for CalloutRule {
    fn name(&self) -> &'static str {
        "Callout"
    }

    fn order(&self) -> Order {
        Order::Before("Blockquote")
    }

    fn try_parse(&self, cx: &mut BlockContext<'_, '_>) -> bool {
        let text = cx.line_text();
        let Some((mark, content)) = quote_marker(text) else {
            return false;
        };
        let rest = &text[content..];
        let Some(caps) = callout_definition().captures(rest) else {
            return false;
        };

        let first = cx.line();
        // Offsets inside `rest` are relative to the content column.
        let abs = |rel: usize| first.from + content + rel;

        let node = cx.add_node(NodeKind::Callout, first.from + mark, first.to);
        cx.add_child(
            node,
            NodeKind::QuoteMark,
            first.from + mark,
            first.from + mark + 1,
        );

        let type_m = caps.name("type").expect("type group");
        cx.add_child(
            node,
            NodeKind::CalloutMark,
            abs(type_m.start() - 2),
            abs(type_m.start()),
        );
        cx.add_child(
            node,
            NodeKind::CalloutTypeString,
            abs(type_m.start()),
            abs(type_m.end()),
        );
        cx.add_child(
            node,
            NodeKind::CalloutMark,
            abs(type_m.end()),
            abs(type_m.end() + 1),
        );

        if let Some(fold_m) = caps.name("fold") {
            cx.add_child(
                node,
                NodeKind::CalloutFoldIndicator,
                abs(fold_m.start()),
                abs(fold_m.end()),
            );
        }

        if let Some(title_m) = caps.name("title") {
            let title = title_m.as_str().trim();
            if !title.is_empty() {
                let lead = title_m.as_str().len() - title_m.as_str().trim_start().len();
                cx.add_child(
                    node,
                    NodeKind::CalloutTitleString,
                    abs(title_m.start() + lead),
                    abs(title_m.start() + lead + title.len()),
                );
            }
        }

        let mut end = first.to;
        cx.advance();

        // Content lines: every following line that keeps at least this
        // callout's quote depth. Deeper-quoted lines stay in the region and
        // become nested blockquotes/callouts through the recursive parse.
        let mut inner: Vec<LineSlice> = Vec::new();
        while !cx.at_end() {
            let text = cx.line_text();
            let Some((mark, content)) = quote_marker(text) else {
                break;
            };
            let line = cx.line();
            cx.add_child(node, NodeKind::QuoteMark, line.from + mark, line.from + mark + 1);
            inner.push(LineSlice {
                from: line.from + content,
                to: line.to,
            });
            end = line.to;
            cx.advance();
        }

        let depth = cx.quote_depth() + 1;
        cx.parse_region(inner, node, depth);
        cx.set_range(node, first.from + mark, end);
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
    fn test_basic_callout_definition() {
        let (doc, tree) = parse("> [!note] My Title\n> body text");
        let callouts = collect(&tree, NodeKind::Callout);
        assert_eq!(callouts, vec![(0, doc.len())]);

        let types = collect(&tree, NodeKind::CalloutTypeString);
        assert_eq!(types.len(), 1);
        assert_eq!(doc.slice(types[0].0, types[0].1), "note");

        let titles = collect(&tree, NodeKind::CalloutTitleString);
        assert_eq!(doc.slice(titles[0].0, titles[0].1), "My Title");
    }

    #[test]
    fn test_fold_indicator() {
        let (doc, tree) = parse("> [!tip]+ folded");
        let folds = collect(&tree, NodeKind::CalloutFoldIndicator);
        assert_eq!(folds.len(), 1);
        assert_eq!(doc.slice(folds[0].0, folds[0].1), "+");
    }

    #[test]
    fn test_callout_without_title() {
        let (_, tree) = parse("> [!warning]\n> content");
        assert_eq!(collect(&tree, NodeKind::Callout).len(), 1);
        assert!(collect(&tree, NodeKind::CalloutTitleString).is_empty());
    }

    #[test]
    fn test_plain_blockquote_is_not_a_callout() {
        let (_, tree) = parse("> just a quote");
        assert!(collect(&tree, NodeKind::Callout).is_empty());
        assert_eq!(collect(&tree, NodeKind::Blockquote).len(), 1);
    }

    #[test]
    fn test_nested_callout_depths() {
        let text = "> [!note]\n> line1\n> > [!warning]\n> > nested\n> line3";
        let (doc, tree) = parse(text);

        let callouts = collect(&tree, NodeKind::Callout);
        assert_eq!(callouts.len(), 2);

        // Outer spans all five lines; inner spans lines 3-4 only.
        assert_eq!(callouts[0], (0, doc.len()));
        let line3_from = doc.line(3).from + 2; // after the outer "> "
        let line4_to = doc.line(4).to;
        assert_eq!(callouts[1], (line3_from, line4_to));

        let outer = tree.innermost_at(1, NodeKind::Callout).unwrap();
        let inner = tree
            .innermost_at(doc.line(4).from + 5, NodeKind::Callout)
            .unwrap();
        assert_eq!(tree.quote_depth(outer), 1);
        assert_eq!(tree.quote_depth(inner), 2);

        // line3 still belongs to the outer callout.
        let line5 = doc.line(5);
        assert!(tree.node(outer).to >= line5.to);
    }

    #[test]
    fn test_callout_ends_when_quote_depth_drops() {
        let (doc, tree) = parse("> [!note]\n> inside\nplain");
        let callouts = collect(&tree, NodeKind::Callout);
        assert_eq!(callouts[0].1, doc.line(2).to);
        // "plain" became a paragraph outside the callout.
        let paras = collect(&tree, NodeKind::Paragraph);
        assert!(paras.iter().any(|&(f, _)| f == doc.line(3).from));
    }
}
