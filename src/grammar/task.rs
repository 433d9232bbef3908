//! Task markers: `[ ]` / `[x]` / `[X]` on list-item leaves
//!
//! A task marker only counts when it opens the first content block of a
//! list item; a `[x]` anywhere else is literal text. The rule claims the
//! marker line, emits the `TaskMarker` node over the three bracket bytes,
//! and parses the remaining text of the line inline.

use regex::Regex;
use std::sync::OnceLock;

use super::block::BlockContext;
use super::{BlockRule, Order};
use crate::tree::NodeKind;

fn task_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[[ xX]\]( |$)").expect("task marker pattern"))
}

pub(super) struct TaskRule;

impl BlockRule for TaskRule {
    fn name(&self) -> &'static str {
        "Task"
    }

    fn order(&self) -> Order {
        Order::Before("Paragraph")
    }

    fn try_parse(&self, cx: &mut BlockContext<'_, '_>) -> bool {
        if cx.parent_kind() != NodeKind::ListItem || !cx.parent_is_empty() {
            return false;
        }
        let text = cx.line_text();
        if !task_marker().is_match(text) {
            return false;
        }

        let line = cx.line();
        let node = cx.add_node(NodeKind::Task, line.from, line.to);
        cx.add_child(node, NodeKind::TaskMarker, line.from, line.from + 3);
        cx.advance();

        let content_from = (line.from + 4).min(line.to);
        cx.parse_inline_into(node, &[(content_from, line.to)]);
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

    fn markers(doc: &Document, tree: &SyntaxTree) -> Vec<String> {
        let mut out = Vec::new();
        tree.walk(0, usize::MAX, |_, node| {
            if node.kind == NodeKind::TaskMarker {
                out.push(doc.slice(node.from, node.to).to_string());
            }
            Walk::Descend
        });
        out
    }

    #[test]
    fn test_unchecked_and_checked_tasks() {
        let (doc, tree) = parse("- [ ] buy milk\n- [x] done\n- [X] also done");
        assert_eq!(markers(&doc, &tree), vec!["[ ]", "[x]", "[X]"]);
    }

    #[test]
    fn test_task_is_inside_list_item() {
        let (_, tree) = parse("- [ ] buy milk");
        let task = tree.innermost_at(7, NodeKind::Task).unwrap();
        assert!(tree.ancestor_of_kind(task, NodeKind::ListItem).is_some());
        assert!(tree.ancestor_of_kind(task, NodeKind::BulletList).is_some());
    }

    #[test]
    fn test_marker_outside_list_is_literal() {
        let (doc, tree) = parse("[x] not a task");
        assert!(markers(&doc, &tree).is_empty());
    }

    #[test]
    fn test_marker_must_lead_the_item() {
        let (doc, tree) = parse("- text then [x] later");
        assert!(markers(&doc, &tree).is_empty());
    }

    #[test]
    fn test_task_content_is_parsed_inline() {
        let (_, tree) = parse("- [ ] has *emphasis*");
        let mut found = false;
        tree.walk(0, usize::MAX, |_, node| {
            if node.kind == NodeKind::Emphasis {
                found = true;
            }
            Walk::Descend
        });
        assert!(found);
    }
}
