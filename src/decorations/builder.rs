//! The decoration builder
//!
//! One pure function from `(document, tree, selection, viewport)` to an
//! ordered decoration set, re-run on every document, selection, or
//! viewport change. The policy per visited node:
//!
//! - always-hidden tokens are replaced with nothing unconditionally;
//! - toggleable marks are hidden unless their enclosing construct is
//!   *active*: the cursor sits inside its inclusive range, or a range
//!   selection overlaps it. This predicate is what makes the surface feel
//!   WYSIWYG, since only the construct being edited opens up into raw
//!   source;
//! - rich blocks (fenced code, tables, callouts, embeds, horizontal
//!   rules) are replaced by widgets while inactive and left raw while
//!   active;
//! - line-level classes (heading sizes, quote indents, code block
//!   begin/content/end) are cursor-independent;
//! - list items hide their markers and grow an interactive checkbox when
//!   inactive.
//!
//! Only nodes intersecting the viewport are visited; the builder never
//! walks the whole document on large files.

use regex::Regex;
use std::sync::OnceLock;

use super::{Decoration, DecorationSet};
use crate::config::Config;
use crate::document::{Document, Selection};
use crate::error::Result;
use crate::grammar::{Parser, MARK_KINDS};
use crate::tree::{Node, NodeId, NodeKind, SyntaxTree, Walk};
use crate::widgets::{
    CalloutWidget, CodeFlairWidget, EmbedCardWidget, RenderedBlockWidget, RenderedCalloutWidget,
    TaskCheckboxWidget, Widget,
};

// ─────────────────────────────────────────────────────────────────────────────
// Activation
// ─────────────────────────────────────────────────────────────────────────────

/// Whether a construct spanning `[from, to]` is active under `selection`:
/// a lone cursor anywhere inside the inclusive range, or a range
/// selection overlapping it.
pub fn is_range_active(selection: Selection, from: usize, to: usize) -> bool {
    if selection.is_empty() {
        selection.head >= from && selection.head <= to
    } else {
        from.max(selection.min()) < to.min(selection.max())
    }
}

/// The visible byte range the builder limits itself to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub from: usize,
    pub to: usize,
}

impl Viewport {
    /// The whole document (small documents, tests).
    pub fn full(doc: &Document) -> Self {
        Self {
            from: 0,
            to: doc.len(),
        }
    }
}

fn task_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*[-*+]\s+)(\[[xX ]\])(.*)$").expect("task line pattern"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builds the decoration set for one `(document, selection)` pair.
pub struct DecorationBuilder<'a> {
    parser: &'a Parser,
    config: &'a Config,
}

impl<'a> DecorationBuilder<'a> {
    pub fn new(parser: &'a Parser, config: &'a Config) -> Self {
        Self { parser, config }
    }

    /// Walk the tree region intersecting `viewport` and produce the
    /// canonical decoration set.
    pub fn build(
        &self,
        doc: &Document,
        tree: &SyntaxTree,
        selection: Selection,
        viewport: Viewport,
    ) -> Result<DecorationSet> {
        tree.check()?;

        let mut decorations = Vec::new();
        tree.walk(viewport.from, viewport.to, |id, node| {
            self.visit(doc, tree, id, node, selection, &mut decorations)
        });
        Ok(DecorationSet::from_unsorted(decorations))
    }

    fn visit(
        &self,
        doc: &Document,
        tree: &SyntaxTree,
        id: NodeId,
        node: &Node,
        selection: Selection,
        out: &mut Vec<Decoration>,
    ) -> Walk {
        if node.kind.heading_level().is_some() {
            self.heading(doc, node, out);
            return Walk::Descend;
        }
        if MARK_KINDS.contains(&node.kind) {
            self.toggleable_mark(doc, tree, node, selection, out);
            return Walk::Skip;
        }
        match node.kind {
            NodeKind::FencedCode => {
                self.fenced_code(doc, tree, id, node, selection, out);
                Walk::Skip
            }
            NodeKind::Callout => self.callout(doc, tree, id, node, selection, out),
            NodeKind::Blockquote => {
                self.quote_lines(doc, tree, id, node, false, out);
                Walk::Descend
            }
            NodeKind::Table => {
                if is_range_active(selection, node.from, node.to) {
                    Walk::Descend
                } else {
                    out.push(Decoration::replace(
                        node.from,
                        node.to,
                        Widget::RenderedBlock(RenderedBlockWidget::new(
                            doc.slice(node.from, node.to),
                            node.from,
                        )),
                        true,
                    ));
                    Walk::Skip
                }
            }
            NodeKind::HorizontalRule => {
                if !is_range_active(selection, node.from, node.to) {
                    out.push(Decoration::replace(
                        node.from,
                        node.to,
                        Widget::HorizontalRule,
                        true,
                    ));
                }
                Walk::Skip
            }
            NodeKind::Embed => self.embed(doc, tree, id, node, selection, out),
            NodeKind::InternalLink => {
                self.internal_link(tree, id, node, selection, out);
                Walk::Descend
            }
            NodeKind::ListItem => {
                self.list_item(doc, tree, id, node, selection, out);
                Walk::Descend
            }
            NodeKind::CodeInfo => {
                // Always hidden, cursor state notwithstanding.
                out.push(Decoration::hide(node.from, node.to));
                Walk::Skip
            }
            _ => Walk::Descend,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Toggleable Marks
    // ─────────────────────────────────────────────────────────────────────────

    fn toggleable_mark(
        &self,
        doc: &Document,
        tree: &SyntaxTree,
        node: &Node,
        selection: Selection,
        out: &mut Vec<Decoration>,
    ) {
        let Some(parent) = node.parent else {
            return;
        };
        let enclosing = tree.node(parent);
        if is_range_active(selection, enclosing.from, enclosing.to) {
            // Active: the mark stays visible, styled by the highlight map.
            return;
        }
        let mut to = node.to;
        // A heading's hash run swallows its following space so the text
        // does not shift when the mark hides.
        if node.kind == NodeKind::HeaderMark && doc.slice(node.to, node.to + 1) == " " {
            to += 1;
        }
        out.push(Decoration::hide(node.from, to));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Headings
    // ─────────────────────────────────────────────────────────────────────────

    fn heading(&self, doc: &Document, node: &Node, out: &mut Vec<Decoration>) {
        let level = node.kind.heading_level().unwrap_or(6);
        let line = doc.line_at(node.from);
        out.push(Decoration::line(
            line.from,
            vec![
                "prose-cm-line-heading".to_string(),
                format!("prose-cm-line-heading{}", level),
                format!("prose-cm-h{}", level),
            ],
            None,
        ));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Quotes and Callouts
    // ─────────────────────────────────────────────────────────────────────────

    fn quote_lines(
        &self,
        doc: &Document,
        tree: &SyntaxTree,
        id: NodeId,
        node: &Node,
        is_callout: bool,
        out: &mut Vec<Decoration>,
    ) {
        let depth = tree.quote_depth(id);
        let indent = &self.config.quote_indent;
        let total = indent.base_px + indent.per_level_px * depth.saturating_sub(1) as u32;
        let style = format!(
            "text-indent:-{}px;padding-inline-start:{}px",
            total, total
        );

        let first = doc.line_at(node.from).number;
        let last = doc.line_at(node.to).number;
        for number in first..=last {
            let line = doc.line(number);
            let mut classes = vec![
                "HyperMD-quote".to_string(),
                format!("HyperMD-quote-{}", depth),
            ];
            if is_callout && number == first {
                classes.push("HyperMD-callout".to_string());
            }
            out.push(Decoration::line(line.from, classes, Some(style.clone())));
        }
    }

    fn callout(
        &self,
        doc: &Document,
        tree: &SyntaxTree,
        id: NodeId,
        node: &Node,
        selection: Selection,
        out: &mut Vec<Decoration>,
    ) -> Walk {
        if is_range_active(selection, node.from, node.to) {
            // Active: raw source with quote styling; the marks inside stay
            // subject to the ordinary toggleable rules.
            self.quote_lines(doc, tree, id, node, true, out);
            return Walk::Descend;
        }

        let widget = if self.config.rendered_callouts {
            Widget::RenderedCallout(RenderedCalloutWidget::from_source(
                doc.slice(node.from, node.to),
                node.from,
            ))
        } else {
            Widget::Callout(self.callout_widget(doc, tree, id, node))
        };
        out.push(Decoration::replace(node.from, node.to, widget, true));
        Walk::Skip
    }

    fn callout_widget(
        &self,
        doc: &Document,
        tree: &SyntaxTree,
        id: NodeId,
        node: &Node,
    ) -> CalloutWidget {
        let slice_of = |kind| {
            tree.child_of_kind(id, kind).map(|c| {
                let n = tree.node(c);
                doc.slice(n.from, n.to).to_string()
            })
        };
        let callout_type = slice_of(NodeKind::CalloutTypeString)
            .map(|t| t.trim().to_lowercase())
            .unwrap_or_else(|| "note".to_string());
        let title = slice_of(NodeKind::CalloutTitleString).unwrap_or_default();
        let fold = slice_of(NodeKind::CalloutFoldIndicator).and_then(|f| f.chars().next());

        // Body: the content lines with one quote level stripped.
        let first = doc.line_at(node.from).number;
        let last = doc.line_at(node.to).number;
        let mut body_lines = Vec::new();
        for number in first + 1..=last {
            let text = doc.line(number).text;
            let trimmed = text.trim_start();
            let stripped = trimmed
                .strip_prefix("> ")
                .or_else(|| trimmed.strip_prefix('>'))
                .unwrap_or(text);
            body_lines.push(stripped);
        }

        CalloutWidget {
            callout_type,
            title,
            fold,
            body: body_lines.join("\n").trim().to_string(),
            source_from: node.from,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Fenced Code
    // ─────────────────────────────────────────────────────────────────────────

    fn fenced_code(
        &self,
        doc: &Document,
        tree: &SyntaxTree,
        id: NodeId,
        node: &Node,
        selection: Selection,
        out: &mut Vec<Decoration>,
    ) {
        let info = tree
            .child_of_kind(id, NodeKind::CodeInfo)
            .map(|c| {
                let n = tree.node(c);
                doc.slice(n.from, n.to)
            })
            .unwrap_or("");
        let language = self.parser.code_language(info).to_string();
        let code = tree
            .child_of_kind(id, NodeKind::CodeText)
            .map(|c| {
                let n = tree.node(c);
                doc.slice(n.from, n.to)
            })
            .unwrap_or("");
        let closed = tree.children_of_kind(id, NodeKind::CodeMark).len() >= 2;

        let first = doc.line_at(node.from).number;
        let last = doc.line_at(node.to).number;
        for number in first..=last {
            let line = doc.line(number);
            let line_active = is_range_active(selection, line.from, line.to);
            let mut classes = vec!["prose-cm-codeblock".to_string()];

            if number == first {
                classes.push("cm-line-codeblock-begin".to_string());
                if !line_active {
                    out.push(Decoration::replace(
                        line.from,
                        line.to,
                        Widget::CodeFlair(CodeFlairWidget::new(language.clone(), code)),
                        false,
                    ));
                }
            } else if number == last && closed {
                classes.push("cm-line-codeblock-end".to_string());
                if !line_active {
                    out.push(Decoration::replace(
                        line.from,
                        line.to,
                        Widget::CodeFenceEnd,
                        false,
                    ));
                }
            } else {
                classes.push("cm-line-codeblock-content".to_string());
            }
            out.push(Decoration::line(line.from, classes, None));
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Wiki-links and Embeds
    // ─────────────────────────────────────────────────────────────────────────

    fn embed(
        &self,
        doc: &Document,
        tree: &SyntaxTree,
        id: NodeId,
        node: &Node,
        selection: Selection,
        out: &mut Vec<Decoration>,
    ) -> Walk {
        if is_range_active(selection, node.from, node.to) {
            return Walk::Descend;
        }
        let slice_of = |link: NodeId, kind| {
            tree.child_of_kind(link, kind).map(|c| {
                let n = tree.node(c);
                doc.slice(n.from, n.to).to_string()
            })
        };
        let (path, subpath, display) = match tree.child_of_kind(id, NodeKind::InternalLink) {
            Some(link) => (
                slice_of(link, NodeKind::InternalPath).unwrap_or_default(),
                slice_of(link, NodeKind::InternalSubpath),
                slice_of(link, NodeKind::InternalDisplay),
            ),
            None => (String::new(), None, None),
        };
        out.push(Decoration::replace(
            node.from,
            node.to,
            Widget::EmbedCard(EmbedCardWidget {
                path,
                subpath,
                display,
            }),
            false,
        ));
        Walk::Skip
    }

    fn internal_link(
        &self,
        tree: &SyntaxTree,
        id: NodeId,
        node: &Node,
        selection: Selection,
        out: &mut Vec<Decoration>,
    ) {
        // An embed-wrapped link activates with the embed's full range.
        let (from, to) = match node.parent.map(|p| tree.node(p)) {
            Some(parent) if parent.kind == NodeKind::Embed => (parent.from, parent.to),
            _ => (node.from, node.to),
        };
        if is_range_active(selection, from, to) {
            return;
        }
        // With an alias present, only the alias shows: path and subpath
        // collapse along with the marks.
        if tree.child_of_kind(id, NodeKind::InternalDisplay).is_some() {
            for kind in [NodeKind::InternalPath, NodeKind::InternalSubpath] {
                if let Some(child) = tree.child_of_kind(id, kind) {
                    let n = tree.node(child);
                    out.push(Decoration::hide(n.from, n.to));
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // List Items
    // ─────────────────────────────────────────────────────────────────────────

    fn list_item(
        &self,
        doc: &Document,
        tree: &SyntaxTree,
        id: NodeId,
        node: &Node,
        selection: Selection,
        out: &mut Vec<Decoration>,
    ) {
        let first_line = doc.line_at(node.from);
        if is_range_active(selection, first_line.from, first_line.to) {
            return;
        }

        let ordered = node
            .parent
            .map(|p| tree.node(p).kind == NodeKind::OrderedList)
            .unwrap_or(false);
        let mark = tree.child_of_kind(id, NodeKind::ListMark);

        // Task items: re-match the literal marker text to capture the
        // exact checkbox offsets from the current revision.
        let is_task = tree.child_of_kind(id, NodeKind::Task).is_some();
        if is_task {
            if let Some(caps) = task_line().captures(first_line.text) {
                let checkbox = caps.get(2).expect("checkbox group");
                let from = first_line.from + checkbox.start();
                let checked = matches!(&first_line.text[checkbox.start() + 1..checkbox.start() + 2], "x" | "X");
                if let Some(mark) = mark {
                    let n = tree.node(mark);
                    out.push(Decoration::hide(n.from, n.to));
                }
                out.push(Decoration::replace(
                    from,
                    from + 3,
                    Widget::TaskCheckbox(TaskCheckboxWidget::new(checked, from + 1)),
                    false,
                ));
                return;
            }
        }

        if let Some(mark) = mark {
            let n = tree.node(mark);
            let class = if ordered {
                "cm-list-number"
            } else {
                "cm-list-bullet"
            };
            out.push(Decoration::mark(n.from, n.to, class));
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorations::DecorationKind;
    use crate::grammar::ParserBuilder;

    fn build(text: &str, selection: Selection) -> (Document, DecorationSet) {
        let doc = Document::new(text);
        let parser = ParserBuilder::markdown().build();
        let config = Config::default();
        let tree = parser.parse(&doc);
        let set = DecorationBuilder::new(&parser, &config)
            .build(&doc, &tree, selection, Viewport::full(&doc))
            .unwrap();
        (doc, set)
    }

    fn hides(set: &DecorationSet) -> Vec<(usize, usize)> {
        set.iter()
            .filter(|d| matches!(d.kind, DecorationKind::Replace { widget: None, .. }))
            .map(|d| (d.from, d.to))
            .collect()
    }

    fn widgets(set: &DecorationSet) -> Vec<&Widget> {
        set.iter()
            .filter_map(|d| match &d.kind {
                DecorationKind::Replace {
                    widget: Some(w), ..
                } => Some(w),
                _ => None,
            })
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Activation Predicate Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_cursor_activation_is_inclusive() {
        assert!(is_range_active(Selection::cursor(2), 2, 5));
        assert!(is_range_active(Selection::cursor(5), 2, 5));
        assert!(!is_range_active(Selection::cursor(1), 2, 5));
        assert!(!is_range_active(Selection::cursor(6), 2, 5));
    }

    #[test]
    fn test_range_activation_needs_overlap() {
        assert!(is_range_active(Selection::range(0, 3), 2, 5));
        assert!(!is_range_active(Selection::range(0, 2), 2, 5));
        assert!(!is_range_active(Selection::range(5, 9), 2, 5));
        assert!(is_range_active(Selection::range(9, 4), 2, 5));
    }

    #[test]
    fn test_activation_sweep_over_emphasis() {
        // "a *b* c": Emphasis spans [2, 5]; marks at 2..3 and 4..5.
        let text = "a *b* c";
        for p in 0..=text.len() {
            let (_, set) = build(text, Selection::cursor(p));
            let hidden = hides(&set);
            let marks_hidden = hidden.contains(&(2, 3)) && hidden.contains(&(4, 5));
            let inside = (2..=5).contains(&p);
            assert_eq!(
                marks_hidden, !inside,
                "cursor at {} should {} the marks",
                p,
                if inside { "reveal" } else { "hide" }
            );
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Idempotence and Round-trip
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_rebuild_is_idempotent() {
        let text = "# H\n\n*em* ==hl== #tag [[A|B]]\n\n> [!note] t\n> body\n\n- [ ] task\n\n```rust\nfn x() {}\n```\n";
        let (_, first) = build(text, Selection::cursor(7));
        let (_, second) = build(text, Selection::cursor(7));
        assert_eq!(first, second);
    }

    #[test]
    fn test_build_never_mutates_the_document() {
        let text = "# H\n\n- [ ] task\n";
        let doc = Document::new(text);
        let (_, _set) = build(text, Selection::cursor(0));
        assert_eq!(doc.text(), text);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Heading Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_heading_mark_swallows_trailing_space() {
        let (_, set) = build("# Title\n\nbody", Selection::cursor(12));
        // "# " hides as one range: mark 0..1 plus the space.
        assert!(hides(&set).contains(&(0, 2)));
    }

    #[test]
    fn test_heading_line_class_is_cursor_independent() {
        for pos in [0, 3, 9] {
            let (_, set) = build("# Title\n\nbody", Selection::cursor(pos));
            let has_line = set.iter().any(|d| {
                matches!(&d.kind, DecorationKind::Line { classes, .. }
                    if classes.iter().any(|c| c == "prose-cm-h1"))
            });
            assert!(has_line, "heading line class missing at cursor {}", pos);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Callout Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_inactive_callout_becomes_widget() {
        let text = "> [!note] T\n> body\n\nelsewhere";
        let (doc, set) = build(text, Selection::cursor(doc_end(text)));
        let ws = widgets(&set);
        assert_eq!(ws.len(), 1);
        match ws[0] {
            Widget::Callout(w) => {
                assert_eq!(w.callout_type, "note");
                assert_eq!(w.title, "T");
                assert_eq!(w.body, "body");
            }
            other => panic!("expected callout widget, got {:?}", other),
        }
        let _ = doc;
    }

    #[test]
    fn test_active_callout_shows_source_with_line_classes() {
        let text = "> [!note] T\n> body\n\nelsewhere";
        let (_, set) = build(text, Selection::cursor(3));
        assert!(widgets(&set).is_empty());
        let quote_lines = set
            .iter()
            .filter(|d| {
                matches!(&d.kind, DecorationKind::Line { classes, .. }
                    if classes.iter().any(|c| c == "HyperMD-quote-1"))
            })
            .count();
        assert_eq!(quote_lines, 2);
        let first_line_is_callout = set.iter().any(|d| {
            matches!(&d.kind, DecorationKind::Line { classes, .. }
                if classes.iter().any(|c| c == "HyperMD-callout"))
        });
        assert!(first_line_is_callout);
    }

    #[test]
    fn test_rendered_callout_variant() {
        let text = "> [!note] T\n> body\n\nelsewhere";
        let doc = Document::new(text);
        let parser = ParserBuilder::markdown().build();
        let config = Config {
            rendered_callouts: true,
            ..Config::default()
        };
        let tree = parser.parse(&doc);
        let set = DecorationBuilder::new(&parser, &config)
            .build(&doc, &tree, Selection::cursor(doc.len()), Viewport::full(&doc))
            .unwrap();
        assert!(matches!(widgets(&set)[0], Widget::RenderedCallout(_)));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Task Item Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_inactive_task_gets_checkbox_widget() {
        let text = "- [ ] buy milk\n\nprose";
        let (doc, set) = build(text, Selection::cursor(doc_end(text)));
        let checkbox = widgets(&set)
            .into_iter()
            .find_map(|w| match w {
                Widget::TaskCheckbox(t) => Some(t),
                _ => None,
            })
            .expect("checkbox widget");
        assert!(!checkbox.checked);
        assert_eq!(checkbox.checkbox_offset, 3);
        // The bullet marker hides.
        assert!(hides(&set).contains(&(0, 1)));
        let _ = doc;
    }

    #[test]
    fn test_checkbox_click_round_trip() {
        let text = "- [ ] buy milk\n\nprose";
        let doc = Document::new(text);
        let (_, set) = build(text, Selection::cursor(doc.len()));
        let checkbox = widgets(&set)
            .into_iter()
            .find_map(|w| match w {
                Widget::TaskCheckbox(t) => Some(t.clone()),
                _ => None,
            })
            .unwrap();

        let edit = checkbox.toggle(&doc).unwrap();
        let next = crate::document::ChangeSet::single(edit).apply(&doc);
        assert_eq!(next.text(), "- [x] buy milk\n\nprose");
    }

    #[test]
    fn test_active_task_line_shows_raw_marker() {
        let text = "- [ ] buy milk";
        let (_, set) = build(text, Selection::cursor(4));
        assert!(widgets(&set).is_empty());
        assert!(hides(&set).is_empty());
    }

    #[test]
    fn test_plain_bullet_gets_mark_class() {
        let text = "- plain item\n\nprose";
        let (_, set) = build(text, Selection::cursor(doc_end(text)));
        let has_bullet = set
            .iter()
            .any(|d| matches!(d.kind, DecorationKind::Mark { class } if class == "cm-list-bullet"));
        assert!(has_bullet);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Code Block Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_code_block_chrome_when_inactive() {
        let text = "```rust\nfn x() {}\n```\n\nprose";
        let (_, set) = build(text, Selection::cursor(doc_end(text)));
        let flair = widgets(&set)
            .into_iter()
            .find_map(|w| match w {
                Widget::CodeFlair(f) => Some(f),
                _ => None,
            })
            .expect("flair widget");
        assert_eq!(flair.language, "rust");
        assert_eq!(flair.code, "fn x() {}");
        assert!(widgets(&set)
            .iter()
            .any(|w| matches!(w, Widget::CodeFenceEnd)));
    }

    #[test]
    fn test_code_block_first_line_opens_under_cursor() {
        let text = "```rust\nfn x() {}\n```";
        let (_, set) = build(text, Selection::cursor(3));
        assert!(!widgets(&set)
            .iter()
            .any(|w| matches!(w, Widget::CodeFlair(_))));
        // The closing fence stays rendered; the cursor is not on its line.
        assert!(widgets(&set)
            .iter()
            .any(|w| matches!(w, Widget::CodeFenceEnd)));
    }

    #[test]
    fn test_code_block_line_classes() {
        let text = "```rust\nfn x() {}\n```";
        let (_, set) = build(text, Selection::cursor(0));
        let classes: Vec<String> = set
            .iter()
            .filter_map(|d| match &d.kind {
                DecorationKind::Line { classes, .. } => Some(classes.join(" ")),
                _ => None,
            })
            .collect();
        assert!(classes[0].contains("cm-line-codeblock-begin"));
        assert!(classes[1].contains("cm-line-codeblock-content"));
        assert!(classes[2].contains("cm-line-codeblock-end"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Wiki-link and Embed Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_aliased_link_hides_path_and_subpath() {
        let text = "see [[A#h|B]] now";
        let (_, set) = build(text, Selection::cursor(0));
        let hidden = hides(&set);
        // path "A" at 6..7, subpath "#h" at 7..9 collapse.
        assert!(hidden.contains(&(6, 7)));
        assert!(hidden.contains(&(7, 9)));
    }

    #[test]
    fn test_inactive_embed_becomes_card() {
        let text = "![[img.png]]\n\nprose";
        let (_, set) = build(text, Selection::cursor(doc_end(text)));
        let card = widgets(&set)
            .into_iter()
            .find_map(|w| match w {
                Widget::EmbedCard(c) => Some(c),
                _ => None,
            })
            .expect("embed card");
        assert_eq!(card.path, "img.png");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Horizontal Rule and Viewport Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_hr_widget_unless_active() {
        let text = "before\n\n---\n\nafter";
        let (_, set) = build(text, Selection::cursor(0));
        assert!(widgets(&set)
            .iter()
            .any(|w| matches!(w, Widget::HorizontalRule)));

        let (_, set) = build(text, Selection::cursor(9)); // on the rule
        assert!(!widgets(&set)
            .iter()
            .any(|w| matches!(w, Widget::HorizontalRule)));
    }

    #[test]
    fn test_viewport_limits_the_walk() {
        let text = "# One\n\ntext\n\n---\n\nmore text here";
        let doc = Document::new(text);
        let parser = ParserBuilder::markdown().build();
        let config = Config::default();
        let tree = parser.parse(&doc);

        // Viewport covering only the heading line.
        let set = DecorationBuilder::new(&parser, &config)
            .build(
                &doc,
                &tree,
                Selection::cursor(doc.len()),
                Viewport { from: 0, to: 5 },
            )
            .unwrap();
        assert!(!widgets(&set)
            .iter()
            .any(|w| matches!(w, Widget::HorizontalRule)));
    }

    fn doc_end(text: &str) -> usize {
        text.len()
    }
}
