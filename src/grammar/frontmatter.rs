//! YAML frontmatter
//!
//! Recognized exactly once, only when the document's very first line is
//! `---`. The block runs to a line that is exactly `---` or `...`; with
//! no closer the content extends to the document end. The content is
//! additionally exposed as parsed YAML metadata for the embedder.

use super::block::BlockContext;
use super::{BlockRule, Order};
use crate::document::Document;
use crate::error::Result;
use crate::tree::{NodeKind, SyntaxTree};

pub(super) struct FrontMatterRule;

impl BlockRule for FrontMatterRule {
    fn name(&self) -> &'static str {
        "YAMLFrontMatter"
    }

    fn order(&self) -> Order {
        Order::Before("FencedCode")
    }

    fn try_parse(&self, cx: &mut BlockContext<'_, '_>) -> bool {
        if !cx.at_document_start() || cx.line_text() != "---" {
            return false;
        }
        let first = cx.line();
        let node = cx.add_node(NodeKind::FrontMatter, first.from, first.to);
        cx.add_child(node, NodeKind::FrontMatterMarker, first.from, first.to);
        cx.advance();

        let mut content: Option<(usize, usize)> = None;
        let mut end = first.to;
        while !cx.at_end() {
            let text = cx.line_text();
            let line = cx.line();
            if text == "---" || text == "..." {
                cx.add_child(node, NodeKind::FrontMatterMarker, line.from, line.to);
                end = line.to;
                cx.advance();
                break;
            }
            // Unterminated frontmatter simply accumulates to the end.
            match &mut content {
                None => content = Some((line.from, line.to)),
                Some((_, to)) => *to = line.to,
            }
            end = line.to;
            cx.advance();
        }

        if let Some((from, to)) = content {
            cx.add_child(node, NodeKind::FrontMatterContent, from, to);
        }
        cx.set_range(node, first.from, end);
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Metadata Extraction
// ─────────────────────────────────────────────────────────────────────────────

/// Parse the document's frontmatter content as YAML, if present.
///
/// Returns `Ok(None)` when the document has no frontmatter, and an error
/// when content exists but is not valid YAML.
pub fn frontmatter_metadata(doc: &Document, tree: &SyntaxTree) -> Result<Option<serde_yaml::Value>> {
    let root = tree.root();
    let Some(fm) = tree.child_of_kind(root, NodeKind::FrontMatter) else {
        return Ok(None);
    };
    let Some(content) = tree.child_of_kind(fm, NodeKind::FrontMatterContent) else {
        return Ok(None);
    };
    let node = tree.node(content);
    let value: serde_yaml::Value = serde_yaml::from_str(doc.slice(node.from, node.to))?;
    Ok(Some(value))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ParserBuilder;
    use crate::tree::Walk;

    fn parse(text: &str) -> (Document, SyntaxTree) {
        let doc = Document::new(text);
        let tree = ParserBuilder::markdown().build().parse(&doc);
        tree.check().unwrap();
        (doc, tree)
    }

    fn frontmatter_range(tree: &SyntaxTree) -> Option<(usize, usize)> {
        let mut out = None;
        tree.walk(0, usize::MAX, |_, node| {
            if node.kind == NodeKind::FrontMatter {
                out = Some((node.from, node.to));
            }
            Walk::Descend
        });
        out
    }

    #[test]
    fn test_basic_frontmatter() {
        let (doc, tree) = parse("---\ntitle: Test\n---\nbody");
        assert_eq!(frontmatter_range(&tree), Some((0, doc.line(3).to)));
    }

    #[test]
    fn test_dots_close_frontmatter() {
        let (doc, tree) = parse("---\nkey: v\n...\nbody");
        assert_eq!(frontmatter_range(&tree), Some((0, doc.line(3).to)));
    }

    #[test]
    fn test_only_at_offset_zero() {
        let (_, tree) = parse("intro\n---\nkey: v\n---");
        assert_eq!(frontmatter_range(&tree), None);
    }

    #[test]
    fn test_unterminated_runs_to_document_end() {
        let (doc, tree) = parse("---\nkey: value\nmore: data");
        assert_eq!(frontmatter_range(&tree), Some((0, doc.len())));
    }

    #[test]
    fn test_metadata_parses_yaml() {
        let (doc, tree) = parse("---\ntitle: Notes\ntags:\n  - a\n  - b\n---\n");
        let meta = frontmatter_metadata(&doc, &tree).unwrap().unwrap();
        assert_eq!(meta["title"], serde_yaml::Value::from("Notes"));
        assert_eq!(meta["tags"][1], serde_yaml::Value::from("b"));
    }

    #[test]
    fn test_no_frontmatter_is_none() {
        let (doc, tree) = parse("just a paragraph");
        assert!(frontmatter_metadata(&doc, &tree).unwrap().is_none());
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let (doc, tree) = parse("---\nkey: [unclosed\n---\n");
        assert!(frontmatter_metadata(&doc, &tree).is_err());
    }
}
