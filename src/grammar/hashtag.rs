//! Hashtags: `#tag`
//!
//! A hashtag is a `#` followed by a run of tag characters (alphanumerics,
//! `-`, `_`, `.`, `/`) whose first character is a letter or underscore.
//! A `#` at the start of a line followed by a space is a heading marker
//! and never a hashtag.

use super::inline::InlineContext;
use super::InlineRule;
use crate::tree::NodeKind;

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '/')
}

fn is_tag_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

pub(super) struct HashtagRule;

impl InlineRule for HashtagRule {
    fn name(&self) -> &'static str {
        "Hashtag"
    }

    fn try_parse(&self, cx: &mut InlineContext<'_>, next: u8, pos: usize) -> Option<usize> {
        if next != b'#' {
            return None;
        }
        // Heading markers: `#` at line start followed by a space or more
        // hashes belongs to the heading grammar.
        if pos == cx.line_start(pos)
            && matches!(cx.byte(pos + 1), Some(b' ') | Some(b'#') | None)
        {
            return None;
        }

        let rest = cx.slice(pos + 1, cx.len());
        let mut chars = rest.chars();
        let first = chars.next()?;
        if !is_tag_start(first) {
            return None;
        }

        let mut end = pos + 1 + first.len_utf8();
        for c in chars {
            if !is_tag_char(c) {
                break;
            }
            end += c.len_utf8();
        }

        let mark = cx.elt(NodeKind::HashtagMark, pos, pos + 1);
        let label = cx.elt(NodeKind::HashtagLabel, pos + 1, end);
        let tag = cx.elt_with(NodeKind::Hashtag, pos, end, vec![mark, label]);
        Some(cx.add_element(tag))
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
        (doc, tree)
    }

    fn labels(doc: &Document, tree: &SyntaxTree) -> Vec<String> {
        let mut out = Vec::new();
        tree.walk(0, usize::MAX, |_, node| {
            if node.kind == NodeKind::HashtagLabel {
                out.push(doc.slice(node.from, node.to).to_string());
            }
            Walk::Descend
        });
        out
    }

    #[test]
    fn test_basic_hashtag() {
        let (doc, tree) = parse("tagged #rust here");
        assert_eq!(labels(&doc, &tree), vec!["rust"]);
    }

    #[test]
    fn test_tag_charset() {
        let (doc, tree) = parse("a #proj/sub-item.v2 b");
        assert_eq!(labels(&doc, &tree), vec!["proj/sub-item.v2"]);
    }

    #[test]
    fn test_digit_start_rejected() {
        let (doc, tree) = parse("see #123 nope");
        assert!(labels(&doc, &tree).is_empty());
    }

    #[test]
    fn test_heading_marker_is_not_a_hashtag() {
        let (doc, tree) = parse("# Heading");
        assert!(labels(&doc, &tree).is_empty());
        let mut headings = 0;
        tree.walk(0, usize::MAX, |_, node| {
            if node.kind == NodeKind::Heading1 {
                headings += 1;
            }
            Walk::Descend
        });
        assert_eq!(headings, 1);
    }

    #[test]
    fn test_bare_hash_is_literal() {
        let (doc, tree) = parse("a # b ## c");
        assert!(labels(&doc, &tree).is_empty());
    }
}
