//! Wiki-links `[[path#subpath|display]]` and embeds `![[..]]`
//!
//! A wiki-link only exists once its `]]` closer is found on the same
//! scan; a nested `[[` before the closer invalidates the whole candidate
//! and everything stays literal text. The embed rule wraps a valid
//! wiki-link parsed immediately after a `!`, with the embed mark covering
//! only the `!` itself.

use super::inline::{InlineContext, InlineElement};
use super::{InlineRule, Order};
use crate::tree::NodeKind;

pub(super) struct InternalLinkRule;

impl InlineRule for InternalLinkRule {
    fn name(&self) -> &'static str {
        "InternalLink"
    }

    fn order(&self) -> Order {
        Order::Before("Link")
    }

    fn try_parse(&self, cx: &mut InlineContext<'_>, next: u8, pos: usize) -> Option<usize> {
        if next != b'[' {
            return None;
        }
        let element = parse_internal_link(cx, pos)?;
        Some(cx.add_element(element))
    }
}

pub(super) struct EmbedRule;

impl InlineRule for EmbedRule {
    fn name(&self) -> &'static str {
        "Embed"
    }

    fn order(&self) -> Order {
        Order::Before("Image")
    }

    fn try_parse(&self, cx: &mut InlineContext<'_>, next: u8, pos: usize) -> Option<usize> {
        if next != b'!' {
            return None;
        }
        let link = parse_internal_link(cx, pos + 1)?;
        let to = link.to;
        let mark = cx.elt(NodeKind::EmbedMark, pos, pos + 1);
        let embed = cx.elt_with(NodeKind::Embed, pos, to, vec![mark, link]);
        Some(cx.add_element(embed))
    }
}

/// Parse `[[..]]` starting at `pos`, or return `None` and leave the text
/// literal.
fn parse_internal_link(cx: &InlineContext<'_>, pos: usize) -> Option<InlineElement> {
    if cx.byte(pos) != Some(b'[') || cx.byte(pos + 1) != Some(b'[') {
        return None;
    }

    // Find the `]]` closer; bail on empty links and nested `[[`.
    let mut closer = None;
    let mut i = pos + 2;
    while i < cx.len() {
        match (cx.byte(i), cx.byte(i + 1)) {
            (Some(b']'), Some(b']')) => {
                if i == pos + 2 {
                    return None;
                }
                closer = Some(i);
                break;
            }
            (Some(b'['), Some(b'[')) => return None,
            (Some(_), _) => i += 1,
            (None, _) => break,
        }
    }
    let closer = closer?;

    let mut children = vec![InlineElement {
        kind: NodeKind::InternalMark,
        from: pos,
        to: pos + 2,
        children: Vec::new(),
    }];

    let inner = cx.slice(pos + 2, closer);
    let pipe = inner.find('|');
    let path_part = &inner[..pipe.unwrap_or(inner.len())];
    let path_text = path_part.trim();

    if !path_text.is_empty() {
        let lead = path_part.len() - path_part.trim_start().len();
        let base = pos + 2 + lead;
        match path_text.find('#') {
            Some(hash) => {
                if hash > 0 {
                    children.push(InlineElement {
                        kind: NodeKind::InternalPath,
                        from: base,
                        to: base + hash,
                        children: Vec::new(),
                    });
                }
                children.push(InlineElement {
                    kind: NodeKind::InternalSubpath,
                    from: base + hash,
                    to: base + path_text.len(),
                    children: Vec::new(),
                });
            }
            None => {
                children.push(InlineElement {
                    kind: NodeKind::InternalPath,
                    from: base,
                    to: base + path_text.len(),
                    children: Vec::new(),
                });
            }
        }
    }

    if let Some(pipe) = pipe {
        let pipe_abs = pos + 2 + pipe;
        children.push(InlineElement {
            kind: NodeKind::InternalMark,
            from: pipe_abs,
            to: pipe_abs + 1,
            children: Vec::new(),
        });
        let display_part = &inner[pipe + 1..];
        let display = display_part.trim();
        if !display.is_empty() {
            let lead = display_part.len() - display_part.trim_start().len();
            let from = pipe_abs + 1 + lead;
            children.push(InlineElement {
                kind: NodeKind::InternalDisplay,
                from,
                to: from + display.len(),
                children: Vec::new(),
            });
        }
    } else if path_text.is_empty() {
        // Nothing usable between the markers.
        return None;
    }

    children.push(InlineElement {
        kind: NodeKind::InternalMark,
        from: closer,
        to: closer + 2,
        children: Vec::new(),
    });

    // Open and close markers alone do not make a link.
    if children.len() <= 2 {
        return None;
    }

    Some(InlineElement {
        kind: NodeKind::InternalLink,
        from: pos,
        to: closer + 2,
        children,
    })
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

    fn texts_of(doc: &Document, tree: &SyntaxTree, kind: NodeKind) -> Vec<String> {
        let mut out = Vec::new();
        tree.walk(0, usize::MAX, |_, node| {
            if node.kind == kind {
                out.push(doc.slice(node.from, node.to).to_string());
            }
            Walk::Descend
        });
        out
    }

    fn count(tree: &SyntaxTree, kind: NodeKind) -> usize {
        let mut n = 0;
        tree.walk(0, usize::MAX, |_, node| {
            if node.kind == kind {
                n += 1;
            }
            Walk::Descend
        });
        n
    }

    #[test]
    fn test_empty_link_is_invalid() {
        let (_, tree) = parse("[[]]");
        assert_eq!(count(&tree, NodeKind::InternalLink), 0);
    }

    #[test]
    fn test_plain_path() {
        let (doc, tree) = parse("see [[A]] now");
        assert_eq!(count(&tree, NodeKind::InternalLink), 1);
        assert_eq!(texts_of(&doc, &tree, NodeKind::InternalPath), vec!["A"]);
        assert_eq!(count(&tree, NodeKind::InternalDisplay), 0);
    }

    #[test]
    fn test_path_with_alias() {
        let (doc, tree) = parse("[[A|B]]");
        assert_eq!(texts_of(&doc, &tree, NodeKind::InternalPath), vec!["A"]);
        assert_eq!(texts_of(&doc, &tree, NodeKind::InternalDisplay), vec!["B"]);
        // Marks: "[[", "|", "]]"
        assert_eq!(count(&tree, NodeKind::InternalMark), 3);
    }

    #[test]
    fn test_path_subpath_alias() {
        let (doc, tree) = parse("[[A#h|B]]");
        assert_eq!(texts_of(&doc, &tree, NodeKind::InternalPath), vec!["A"]);
        assert_eq!(texts_of(&doc, &tree, NodeKind::InternalSubpath), vec!["#h"]);
        assert_eq!(texts_of(&doc, &tree, NodeKind::InternalDisplay), vec!["B"]);
    }

    #[test]
    fn test_unterminated_link_is_literal() {
        let (_, tree) = parse("[[A");
        assert_eq!(count(&tree, NodeKind::InternalLink), 0);
    }

    #[test]
    fn test_nested_open_invalidates() {
        let (_, tree) = parse("[[a [[b]] c]]");
        // The outer candidate dies on the nested `[[`; the inner one parses.
        assert_eq!(count(&tree, NodeKind::InternalLink), 1);
    }

    #[test]
    fn test_embed_wraps_link_and_marks_bang() {
        let (doc, tree) = parse("![[img.png]]");
        assert_eq!(count(&tree, NodeKind::Embed), 1);
        assert_eq!(count(&tree, NodeKind::InternalLink), 1);
        assert_eq!(texts_of(&doc, &tree, NodeKind::EmbedMark), vec!["!"]);
    }

    #[test]
    fn test_bang_without_link_is_not_embed() {
        let (_, tree) = parse("! not an embed");
        assert_eq!(count(&tree, NodeKind::Embed), 0);
    }
}
