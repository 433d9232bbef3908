//! Block-level parsing
//!
//! Blocks are parsed line by line over a *region*: the content slices of a
//! run of lines after any container prefixes have been stripped. The top
//! level region is the whole document; containers (blockquotes, callouts,
//! list items) strip their per-line prefix and parse the inner region
//! recursively, which is also how nesting depth falls out.
//!
//! Every rule sees the context positioned at the first unclaimed line and
//! either consumes one or more lines (emitting nodes with exact document
//! offsets) or reports no match so the next rule runs. The paragraph rule
//! is the unconditional fallback and is always ordered last.

use regex::Regex;
use std::sync::OnceLock;

use super::compose::Parser;
use super::inline::{scan_region, InlineContext, InlineElement};
use super::BlockRule;
use crate::document::Document;
use crate::tree::{NodeId, NodeKind, SyntaxTree};

// ─────────────────────────────────────────────────────────────────────────────
// Regions
// ─────────────────────────────────────────────────────────────────────────────

/// One line of a region: the absolute byte range of its content after
/// container prefixes were stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSlice {
    pub from: usize,
    pub to: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Context
// ─────────────────────────────────────────────────────────────────────────────

/// Parsing state threaded through the block rules.
pub struct BlockContext<'a, 'd> {
    parser: &'a Parser,
    doc: &'d Document,
    tree: &'a mut SyntaxTree,
    lines: Vec<LineSlice>,
    pos: usize,
    parent: NodeId,
    depth: usize,
}

impl<'a, 'd> BlockContext<'a, 'd> {
    pub(crate) fn new(
        parser: &'a Parser,
        doc: &'d Document,
        tree: &'a mut SyntaxTree,
        lines: Vec<LineSlice>,
        parent: NodeId,
    ) -> Self {
        Self {
            parser,
            doc,
            tree,
            lines,
            pos: 0,
            parent,
            depth: 0,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Cursor
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether every line of the region has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.lines.len()
    }

    /// The current line's content slice.
    pub fn line(&self) -> LineSlice {
        self.lines[self.pos]
    }

    /// The current line's content text.
    pub fn line_text(&self) -> &'d str {
        let line = self.line();
        self.doc.slice(line.from, line.to)
    }

    /// The line `n` past the current one, if any.
    pub fn peek(&self, n: usize) -> Option<LineSlice> {
        self.lines.get(self.pos + n).copied()
    }

    /// Text of the line `n` past the current one.
    pub fn peek_text(&self, n: usize) -> Option<&'d str> {
        self.peek(n).map(|l| self.doc.slice(l.from, l.to))
    }

    /// Consume the current line.
    pub fn advance(&mut self) {
        self.pos += 1;
    }

    /// The document being parsed.
    pub fn doc(&self) -> &'d Document {
        self.doc
    }

    /// The composed parser driving this parse (for rule-presence checks).
    pub fn parser(&self) -> &'a Parser {
        self.parser
    }

    /// Whether the current line is the very start of the document.
    pub fn at_document_start(&self) -> bool {
        self.pos == 0 && !self.lines.is_empty() && self.lines[0].from == 0 && self.depth == 0
    }

    /// Quote nesting depth of the region being parsed.
    pub fn quote_depth(&self) -> usize {
        self.depth
    }

    /// Kind of the node new blocks attach to.
    pub fn parent_kind(&self) -> NodeKind {
        self.tree.node(self.parent).kind
    }

    /// Whether the parent has no content blocks yet (marker children do
    /// not count). Used by leaf rules that must sit first in a list item.
    pub fn parent_is_empty(&self) -> bool {
        self.tree
            .node(self.parent)
            .children
            .iter()
            .all(|&c| matches!(self.tree.node(c).kind, NodeKind::ListMark | NodeKind::QuoteMark))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Emission
    // ─────────────────────────────────────────────────────────────────────────

    /// Add a node under the region's parent.
    pub fn add_node(&mut self, kind: NodeKind, from: usize, to: usize) -> NodeId {
        let id = self.tree.add(kind, from, to);
        self.tree.attach(self.parent, id);
        id
    }

    /// Add a node under an explicit parent.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        from: usize,
        to: usize,
    ) -> NodeId {
        let id = self.tree.add(kind, from, to);
        self.tree.attach(parent, id);
        id
    }

    /// Adjust a node's range once its true extent is known.
    pub fn set_range(&mut self, id: NodeId, from: usize, to: usize) {
        self.tree.set_range(id, from, to);
    }

    /// Normalize a container's children into document order.
    pub fn sort_children(&mut self, id: NodeId) {
        self.tree.sort_children(id);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Recursion and Inline Parsing
    // ─────────────────────────────────────────────────────────────────────────

    /// Parse a stripped inner region with `parent` as the attach point.
    pub fn parse_region(&mut self, lines: Vec<LineSlice>, parent: NodeId, depth: usize) {
        let saved_lines = std::mem::replace(&mut self.lines, lines);
        let saved_pos = std::mem::replace(&mut self.pos, 0);
        let saved_parent = std::mem::replace(&mut self.parent, parent);
        let saved_depth = std::mem::replace(&mut self.depth, depth);
        self.run();
        self.lines = saved_lines;
        self.pos = saved_pos;
        self.parent = saved_parent;
        self.depth = saved_depth;
    }

    /// Run the inline rules over the given content ranges and attach the
    /// produced nodes under `parent`.
    pub fn parse_inline_into(&mut self, parent: NodeId, ranges: &[(usize, usize)]) {
        if ranges.iter().all(|&(f, t)| f >= t) {
            return;
        }
        let parser = self.parser;
        let mut icx = InlineContext::new(self.doc, ranges);
        let elements = scan_region(parser.inline_rules(), &mut icx);
        for element in &elements {
            self.emit_inline(parent, element, &icx);
        }
    }

    fn emit_inline(&mut self, parent: NodeId, element: &InlineElement, icx: &InlineContext<'_>) {
        let id = self.tree.add(
            element.kind,
            icx.to_doc(element.from),
            icx.to_doc(element.to),
        );
        self.tree.attach(parent, id);
        for child in &element.children {
            self.emit_inline(id, child, icx);
        }
    }

    /// Parse a single block after skipping blank lines. Returns `false`
    /// once the region is exhausted.
    pub(crate) fn run_step(&mut self) -> bool {
        let parser = self.parser;
        while !self.at_end() && self.line_text().trim().is_empty() {
            self.advance();
        }
        if self.at_end() {
            return false;
        }
        let before = self.pos;
        for rule in parser.block_rules() {
            if rule.try_parse(self) {
                break;
            }
        }
        // The paragraph fallback always claims a non-blank line; a rule
        // that "matched" without consuming anything would loop forever.
        if self.pos == before {
            self.advance();
        }
        true
    }

    /// The main block loop for the current region.
    pub(crate) fn run(&mut self) {
        while self.run_step() {}
    }

    /// Start offset of the next unconsumed line, if any.
    pub(crate) fn next_line_start(&self) -> Option<usize> {
        self.lines.get(self.pos).map(|l| l.from)
    }

    /// Consume blank lines without parsing anything.
    pub(crate) fn skip_blank_lines(&mut self) {
        while !self.at_end() && self.line_text().trim().is_empty() {
            self.advance();
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared Line Classifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Detect `>` quote prefix: up to three leading spaces, the marker, and an
/// optional following space. Returns (marker offset, content offset),
/// relative to the line start.
pub(crate) fn quote_marker(text: &str) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() && i < 3 && bytes[i] == b' ' {
        i += 1;
    }
    if bytes.get(i) != Some(&b'>') {
        return None;
    }
    let content = if bytes.get(i + 1) == Some(&b' ') {
        i + 2
    } else {
        i + 1
    };
    Some((i, content))
}

/// A matched list marker on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ListMarker {
    /// Leading indent width in bytes
    pub indent: usize,
    /// Offset just past the marker text (`-` or `1.`), relative to line
    pub marker_end: usize,
    /// Offset of the item's content, relative to line
    pub content: usize,
    pub ordered: bool,
}

/// Detect a bullet or ordered list marker.
pub(crate) fn list_marker(text: &str) -> Option<ListMarker> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^( {0,3})([-*+]|\d{1,9}[.)])( +|$)").expect("list marker pattern")
    });
    let caps = re.captures(text)?;
    let indent = caps.get(1).map(|m| m.len()).unwrap_or(0);
    let marker = caps.get(2).expect("marker group");
    let spaces = caps.get(3).map(|m| m.len()).unwrap_or(0);
    Some(ListMarker {
        indent,
        marker_end: marker.end(),
        content: marker.end() + spaces,
        ordered: text.as_bytes()[indent].is_ascii_digit(),
    })
}

fn atx_marker(text: &str) -> Option<(usize, u8)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^( {0,3})(#{1,6})([ \t]|$)").expect("atx pattern"));
    let caps = re.captures(text)?;
    let indent = caps.get(1).map(|m| m.len()).unwrap_or(0);
    let level = caps.get(2).map(|m| m.len()).unwrap_or(1) as u8;
    Some((indent, level))
}

fn fence_marker(text: &str) -> Option<(usize, usize, u8)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^( {0,3})(`{3,}|~{3,})").expect("fence pattern"));
    let caps = re.captures(text)?;
    let indent = caps.get(1).map(|m| m.len()).unwrap_or(0);
    let fence = caps.get(2).expect("fence group");
    Some((indent, fence.len(), text.as_bytes()[indent]))
}

fn hr_line(text: &str) -> bool {
    let trimmed = text.trim_start_matches(' ');
    if text.len() - trimmed.len() > 3 {
        return false;
    }
    let marker = match trimmed.chars().next() {
        Some(c @ ('-' | '*' | '_')) => c,
        _ => return false,
    };
    let mut count = 0;
    for c in trimmed.chars() {
        if c == marker {
            count += 1;
        } else if c != ' ' && c != '\t' {
            return false;
        }
    }
    count >= 3
}

fn table_delimiter_line(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^ *\|? *:?-+:? *(\| *:?-+:? *)*\|? *$").expect("table delimiter pattern")
    });
    text.contains('-') && re.is_match(text)
}

/// Whether a line would start a new block, interrupting a paragraph.
/// Extension starters only count when their rule is registered.
pub(crate) fn starts_block(parser: &Parser, text: &str) -> bool {
    if quote_marker(text).is_some()
        || atx_marker(text).is_some()
        || fence_marker(text).is_some()
        || hr_line(text)
        || list_marker(text).is_some()
    {
        return true;
    }
    let trimmed = text.trim_start();
    if parser.has_block_rule("TexBlock") && trimmed.starts_with("$$") {
        return true;
    }
    if parser.has_block_rule("CommentBlock") && trimmed.starts_with("%%") {
        return true;
    }
    if parser.has_block_rule("FootnoteReference") && super::footnote::is_footnote_def(text) {
        return true;
    }
    false
}

// ─────────────────────────────────────────────────────────────────────────────
// Base Block Rules
// ─────────────────────────────────────────────────────────────────────────────

/// ``` fenced code blocks.
struct FencedCodeRule;

impl BlockRule for FencedCodeRule {
    fn name(&self) -> &'static str {
        "FencedCode"
    }

    fn try_parse(&self, cx: &mut BlockContext<'_, '_>) -> bool {
        let text = cx.line_text();
        let Some((indent, run, fence_char)) = fence_marker(text) else {
            return false;
        };
        let line = cx.line();
        let fence_from = line.from + indent;
        let fence_to = fence_from + run;

        let node = cx.add_node(NodeKind::FencedCode, fence_from, line.to);
        cx.add_child(node, NodeKind::CodeMark, fence_from, fence_to);

        let info = text[indent + run..].trim();
        if !info.is_empty() {
            let info_rel = text[indent + run..]
                .find(|c: char| !c.is_whitespace())
                .unwrap_or(0);
            let info_from = fence_to + info_rel;
            cx.add_child(node, NodeKind::CodeInfo, info_from, info_from + info.len());
        }
        cx.advance();

        let mut content_from = None;
        let mut content_to = None;
        let mut end = line.to;
        while !cx.at_end() {
            let text = cx.line_text();
            let line = cx.line();
            if let Some((i, r, c)) = fence_marker(text) {
                if c == fence_char && r >= run && text[i + r..].trim().is_empty() {
                    cx.add_child(node, NodeKind::CodeMark, line.from + i, line.from + i + r);
                    end = line.to;
                    cx.advance();
                    break;
                }
            }
            content_from.get_or_insert(line.from);
            content_to = Some(line.to);
            end = line.to;
            cx.advance();
        }

        if let (Some(from), Some(to)) = (content_from, content_to) {
            cx.add_child(node, NodeKind::CodeText, from, to);
        }
        cx.set_range(node, fence_from, end);
        cx.sort_children(node);
        true
    }
}

/// `>` blockquote container.
struct BlockquoteRule;

impl BlockRule for BlockquoteRule {
    fn name(&self) -> &'static str {
        "Blockquote"
    }

    fn try_parse(&self, cx: &mut BlockContext<'_, '_>) -> bool {
        let Some((mark, _)) = quote_marker(cx.line_text()) else {
            return false;
        };
        let first = cx.line();
        let node = cx.add_node(NodeKind::Blockquote, first.from + mark, first.to);

        let mut inner = Vec::new();
        let mut end = first.to;
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

/// `#` ATX headings.
struct AtxHeadingRule;

impl BlockRule for AtxHeadingRule {
    fn name(&self) -> &'static str {
        "ATXHeading"
    }

    fn try_parse(&self, cx: &mut BlockContext<'_, '_>) -> bool {
        let text = cx.line_text();
        let Some((indent, level)) = atx_marker(text) else {
            return false;
        };
        let line = cx.line();
        let mark_from = line.from + indent;
        let mark_to = mark_from + level as usize;

        let node = cx.add_node(NodeKind::heading(level), mark_from, line.to);
        cx.add_child(node, NodeKind::HeaderMark, mark_from, mark_to);

        let rest = &text[indent + level as usize..];
        let content_rel = rest.len() - rest.trim_start().len();
        let content_from = mark_to + content_rel;
        cx.advance();
        cx.parse_inline_into(node, &[(content_from, line.to)]);
        cx.sort_children(node);
        true
    }
}

/// Setext (underlined) headings. Removed in the default configuration but
/// kept available so `remove("SetextHeading")` has something to remove.
struct SetextHeadingRule;

impl BlockRule for SetextHeadingRule {
    fn name(&self) -> &'static str {
        "SetextHeading"
    }

    fn try_parse(&self, cx: &mut BlockContext<'_, '_>) -> bool {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"^ {0,3}(=+|-+)\s*$").expect("setext pattern"));

        let text = cx.line_text();
        if starts_block(cx.parser, text) {
            return false;
        }
        let Some(under) = cx.peek_text(1) else {
            return false;
        };
        let Some(caps) = re.captures(under) else {
            return false;
        };
        let level = if caps.get(1).map(|m| m.as_str().starts_with('=')).unwrap_or(false) {
            1
        } else {
            2
        };

        let first = cx.line();
        let under_line = cx.peek(1).expect("checked above");
        let node = cx.add_node(NodeKind::heading(level), first.from, under_line.to);
        cx.add_child(node, NodeKind::HeaderMark, under_line.from, under_line.to);
        cx.advance();
        cx.advance();
        cx.parse_inline_into(node, &[(first.from, first.to)]);
        cx.sort_children(node);
        true
    }
}

/// `---` thematic breaks.
struct HorizontalRuleRule;

impl BlockRule for HorizontalRuleRule {
    fn name(&self) -> &'static str {
        "HorizontalRule"
    }

    fn try_parse(&self, cx: &mut BlockContext<'_, '_>) -> bool {
        if !hr_line(cx.line_text()) {
            return false;
        }
        let line = cx.line();
        cx.add_node(NodeKind::HorizontalRule, line.from, line.to);
        cx.advance();
        true
    }
}

/// Bullet and ordered list containers.
struct ListRule;

impl BlockRule for ListRule {
    fn name(&self) -> &'static str {
        "List"
    }

    fn try_parse(&self, cx: &mut BlockContext<'_, '_>) -> bool {
        let Some(first) = list_marker(cx.line_text()) else {
            return false;
        };
        let kind = if first.ordered {
            NodeKind::OrderedList
        } else {
            NodeKind::BulletList
        };
        let list_from = cx.line().from + first.indent;
        let list = cx.add_node(kind, list_from, cx.line().to);
        let depth = cx.quote_depth();

        let mut end = cx.line().to;
        while !cx.at_end() {
            let text = cx.line_text();
            let Some(marker) = list_marker(text) else {
                break;
            };
            if marker.ordered != first.ordered || marker.indent != first.indent {
                break;
            }
            let item_line = cx.line();
            let item = cx.add_child(list, NodeKind::ListItem, item_line.from + marker.indent, item_line.to);
            cx.add_child(
                item,
                NodeKind::ListMark,
                item_line.from + marker.indent,
                item_line.from + marker.marker_end,
            );

            // The item's content: the rest of the marker line plus any
            // continuation lines indented to the content column.
            let content_col = marker.content;
            let mut inner = vec![LineSlice {
                from: item_line.from + content_col.min(text.len()),
                to: item_line.to,
            }];
            let mut item_end = item_line.to;
            cx.advance();

            loop {
                if cx.at_end() {
                    break;
                }
                let text = cx.line_text();
                if text.trim().is_empty() {
                    // A blank line stays inside the item only when the next
                    // line continues it.
                    match cx.peek_text(1) {
                        Some(next)
                            if continues_item(next, content_col)
                                || same_list_marker(next, &first) =>
                        {
                            if continues_item(next, content_col) {
                                inner.push(LineSlice {
                                    from: cx.line().from,
                                    to: cx.line().to,
                                });
                                cx.advance();
                                continue;
                            }
                            // Next line is a sibling marker: the blank just
                            // separates items.
                            cx.advance();
                            break;
                        }
                        _ => break,
                    }
                }
                if !continues_item(text, content_col) {
                    break;
                }
                let line = cx.line();
                inner.push(LineSlice {
                    from: line.from + content_col.min(text.len()),
                    to: line.to,
                });
                item_end = line.to;
                cx.advance();
            }

            cx.parse_region(inner, item, depth);
            cx.set_range(item, item_line.from + marker.indent, item_end);
            cx.sort_children(item);
            end = item_end;

            if cx.at_end() || list_marker(cx.line_text()).is_none() {
                break;
            }
        }

        cx.set_range(list, list_from, end);
        true
    }
}

fn continues_item(text: &str, content_col: usize) -> bool {
    !text.trim().is_empty() && text.len() > content_col
        && text[..content_col.min(text.len())].chars().all(|c| c == ' ')
}

fn same_list_marker(text: &str, first: &ListMarker) -> bool {
    list_marker(text)
        .map(|m| m.ordered == first.ordered && m.indent == first.indent)
        .unwrap_or(false)
}

/// GFM pipe tables: a header row, a delimiter row, then data rows.
struct TableRule;

impl BlockRule for TableRule {
    fn name(&self) -> &'static str {
        "Table"
    }

    fn try_parse(&self, cx: &mut BlockContext<'_, '_>) -> bool {
        let header = cx.line_text();
        if !header.contains('|') {
            return false;
        }
        let Some(delim) = cx.peek_text(1) else {
            return false;
        };
        if !delim.contains('|') || !table_delimiter_line(delim) {
            return false;
        }

        let first = cx.line();
        let node = cx.add_node(NodeKind::Table, first.from, first.to);
        self.add_row(cx, node, true);
        let delim_line = cx.line();
        cx.add_child(node, NodeKind::TableDelimiter, delim_line.from, delim_line.to);
        let mut end = delim_line.to;
        cx.advance();

        while !cx.at_end() {
            let text = cx.line_text();
            if text.trim().is_empty() || !text.contains('|') {
                break;
            }
            end = cx.line().to;
            self.add_row(cx, node, false);
        }
        cx.set_range(node, first.from, end);
        true
    }
}

impl TableRule {
    fn add_row(&self, cx: &mut BlockContext<'_, '_>, table: NodeId, _header: bool) {
        let line = cx.line();
        let text = cx.line_text();
        let row = cx.add_child(table, NodeKind::TableRow, line.from, line.to);

        let mut cell_start = 0usize;
        let bytes = text.as_bytes();
        let mut i = 0;
        while i <= bytes.len() {
            let at_pipe = i < bytes.len() && bytes[i] == b'|' && (i == 0 || bytes[i - 1] != b'\\');
            if at_pipe || i == bytes.len() {
                let cell = text[cell_start..i].trim();
                if !cell.is_empty() {
                    let lead = text[cell_start..i].len() - text[cell_start..i].trim_start().len();
                    let from = line.from + cell_start + lead;
                    cx.add_child(row, NodeKind::TableCell, from, from + cell.len());
                }
                cell_start = i + 1;
            }
            i += 1;
        }
        cx.advance();
    }
}

/// The unconditional paragraph fallback.
struct ParagraphRule;

impl BlockRule for ParagraphRule {
    fn name(&self) -> &'static str {
        "Paragraph"
    }

    fn try_parse(&self, cx: &mut BlockContext<'_, '_>) -> bool {
        let parser = cx.parser;
        let first = cx.line();
        let mut ranges: Vec<(usize, usize)> = Vec::new();
        let mut end = first.to;

        while !cx.at_end() {
            let text = cx.line_text();
            if text.trim().is_empty() {
                break;
            }
            if !ranges.is_empty() && starts_block(parser, text) {
                break;
            }
            let line = cx.line();
            ranges.push((line.from, line.to));
            end = line.to;
            cx.advance();
        }

        let node = cx.add_node(NodeKind::Paragraph, first.from, end);
        cx.parse_inline_into(node, &ranges);
        true
    }
}

/// The base block rules in their canonical order. `Order` directives from
/// extensions splice around these names; `Paragraph` stays last.
pub(crate) fn base_block_rules() -> Vec<Box<dyn BlockRule>> {
    vec![
        Box::new(FencedCodeRule),
        Box::new(BlockquoteRule),
        Box::new(AtxHeadingRule),
        Box::new(SetextHeadingRule),
        Box::new(HorizontalRuleRule),
        Box::new(ListRule),
        Box::new(TableRule),
        Box::new(ParagraphRule),
    ]
}
