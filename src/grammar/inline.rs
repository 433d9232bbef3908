//! Inline scanning and delimiter resolution
//!
//! Inline parsing runs over a paragraph-like region: the content slices of
//! its lines are joined into one logical buffer (newline-separated, with a
//! segment map translating buffer offsets back to document offsets, so
//! container prefixes like `> ` never confuse the scan).
//!
//! Pass 1 walks the buffer left to right, letting each inline rule look at
//! the next byte. Simple constructs add a finished element; paired
//! constructs add open/close delimiter candidates. Pass 2 resolves
//! candidates nearest-first: a closer pairs with the closest unmatched
//! opener of its own kind, everything strictly between becomes children,
//! and delimiter candidates trapped inside a resolved pair are discarded.
//! That discipline is what makes `*==a==*` come out as Highlight nested
//! inside Emphasis rather than the reverse.

use super::InlineRule;
use crate::document::Document;
use crate::tree::NodeKind;

// ─────────────────────────────────────────────────────────────────────────────
// Elements and Delimiters
// ─────────────────────────────────────────────────────────────────────────────

/// A finished inline node in buffer coordinates; converted to tree nodes
/// (and document offsets) once the region is fully resolved.
#[derive(Debug, Clone)]
pub struct InlineElement {
    pub kind: NodeKind,
    pub from: usize,
    pub to: usize,
    pub children: Vec<InlineElement>,
}

/// The paired-construct families the delimiter resolver knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimKind {
    Emphasis,
    Strikethrough,
    Highlight,
    Comment,
    TexInline,
}

impl DelimKind {
    /// Node kinds for the resolved construct and its markers.
    fn node_kinds(self, strong: bool) -> (NodeKind, NodeKind) {
        match self {
            DelimKind::Emphasis if strong => (NodeKind::StrongEmphasis, NodeKind::EmphasisMark),
            DelimKind::Emphasis => (NodeKind::Emphasis, NodeKind::EmphasisMark),
            DelimKind::Strikethrough => (NodeKind::Strikethrough, NodeKind::StrikethroughMark),
            DelimKind::Highlight => (NodeKind::Highlight, NodeKind::HighlightMark),
            DelimKind::Comment => (NodeKind::Comment, NodeKind::CommentMarker),
            DelimKind::TexInline => (NodeKind::TexInline, NodeKind::TexMarker),
        }
    }
}

#[derive(Debug, Clone)]
struct Delimiter {
    kind: DelimKind,
    ch: u8,
    from: usize,
    /// Right edge of the still-unconsumed run (emphasis shrinks this as it
    /// pairs partial runs).
    right: usize,
    can_open: bool,
    can_close: bool,
}

impl Delimiter {
    fn remaining(&self) -> usize {
        self.right - self.from
    }
}

#[derive(Debug, Clone)]
enum InlineItem {
    Element(InlineElement),
    Delimiter(Delimiter),
}

// ─────────────────────────────────────────────────────────────────────────────
// Inline Context
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Segment {
    buf_start: usize,
    doc_start: usize,
    len: usize,
}

/// Scanning state for one inline region.
pub struct InlineContext<'d> {
    #[allow(dead_code)]
    doc: &'d Document,
    buf: String,
    segments: Vec<Segment>,
    items: Vec<InlineItem>,
}

impl<'d> InlineContext<'d> {
    /// Build a context from the content slices of a region's lines.
    /// Consecutive slices are joined with a `\n` mapped to the document's
    /// real newline offset.
    pub(crate) fn new(doc: &'d Document, ranges: &[(usize, usize)]) -> Self {
        let mut buf = String::new();
        let mut segments = Vec::new();
        for (i, &(from, to)) in ranges.iter().enumerate() {
            if i > 0 {
                let prev_to = ranges[i - 1].1;
                segments.push(Segment {
                    buf_start: buf.len(),
                    doc_start: prev_to,
                    len: 1,
                });
                buf.push('\n');
            }
            segments.push(Segment {
                buf_start: buf.len(),
                doc_start: from,
                len: to - from,
            });
            buf.push_str(doc.slice(from, to));
        }
        Self {
            doc,
            buf,
            segments,
            items: Vec::new(),
        }
    }

    /// Translate a buffer offset to a document offset.
    pub fn to_doc(&self, pos: usize) -> usize {
        if self.segments.is_empty() {
            return 0;
        }
        let idx = self
            .segments
            .partition_point(|s| s.buf_start <= pos)
            .saturating_sub(1);
        let seg = self.segments[idx];
        seg.doc_start + (pos - seg.buf_start).min(seg.len)
    }

    /// The full buffer text.
    pub fn text(&self) -> &str {
        &self.buf
    }

    /// Buffer length in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// The byte at `pos`, if in bounds.
    pub fn byte(&self, pos: usize) -> Option<u8> {
        self.buf.as_bytes().get(pos).copied()
    }

    /// The byte just before `pos`.
    pub fn prev_byte(&self, pos: usize) -> Option<u8> {
        pos.checked_sub(1).and_then(|p| self.byte(p))
    }

    /// Slice of the buffer (byte offsets must be boundaries; rules only
    /// slice at ASCII marker positions).
    pub fn slice(&self, from: usize, to: usize) -> &str {
        &self.buf[from.min(self.buf.len())..to.min(self.buf.len())]
    }

    /// Offset just past the last `\n` at or before `pos`.
    pub fn line_start(&self, pos: usize) -> usize {
        self.buf[..pos.min(self.buf.len())]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    /// Make an element with no children.
    pub fn elt(&self, kind: NodeKind, from: usize, to: usize) -> InlineElement {
        InlineElement {
            kind,
            from,
            to,
            children: Vec::new(),
        }
    }

    /// Make an element wrapping children.
    pub fn elt_with(
        &self,
        kind: NodeKind,
        from: usize,
        to: usize,
        children: Vec<InlineElement>,
    ) -> InlineElement {
        InlineElement {
            kind,
            from,
            to,
            children,
        }
    }

    /// Add a finished element; returns its end offset as the next scan
    /// position.
    pub fn add_element(&mut self, element: InlineElement) -> usize {
        let to = element.to;
        self.items.push(InlineItem::Element(element));
        to
    }

    /// Register an open/close delimiter candidate; returns its end offset.
    pub fn add_delimiter(
        &mut self,
        kind: DelimKind,
        ch: u8,
        from: usize,
        to: usize,
        can_open: bool,
        can_close: bool,
    ) -> usize {
        self.items.push(InlineItem::Delimiter(Delimiter {
            kind,
            ch,
            from,
            right: to,
            can_open,
            can_close,
        }));
        to
    }

    fn char_len_at(&self, pos: usize) -> usize {
        self.buf[pos..].chars().next().map(char::len_utf8).unwrap_or(1)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scan and Resolve
// ─────────────────────────────────────────────────────────────────────────────

/// Run the rules over the buffer, then resolve delimiters. Returns the
/// region's top-level elements in buffer coordinates, sorted by start.
pub(crate) fn scan_region(
    rules: &[Box<dyn InlineRule>],
    cx: &mut InlineContext<'_>,
) -> Vec<InlineElement> {
    let mut pos = 0;
    while pos < cx.len() {
        let next = cx.byte(pos).unwrap_or(0);
        let mut advanced = None;
        for rule in rules {
            if let Some(new_pos) = rule.try_parse(cx, next, pos) {
                advanced = Some(new_pos.max(pos + 1));
                break;
            }
        }
        pos = advanced.unwrap_or_else(|| pos + cx.char_len_at(pos));
    }
    let buf_len = cx.len();
    resolve(std::mem::take(&mut cx.items), buf_len)
}

/// Pass 2: nearest-first pairing with in-pair candidate discard.
fn resolve(items: Vec<InlineItem>, region_end: usize) -> Vec<InlineElement> {
    let mut stack: Vec<InlineItem> = Vec::new();

    for item in items {
        let delim = match item {
            InlineItem::Element(el) => {
                stack.push(InlineItem::Element(el));
                continue;
            }
            InlineItem::Delimiter(d) => d,
        };

        if delim.can_close {
            if delim.kind == DelimKind::Emphasis {
                if close_emphasis(&mut stack, &delim) {
                    continue;
                }
            } else if close_fixed(&mut stack, &delim) {
                continue;
            }
        }
        if delim.can_open {
            stack.push(InlineItem::Delimiter(delim));
        }
        // Neither opened nor closed: the candidate is plain text.
    }

    // An unclosed comment opener does not fall back to literal text: the
    // comment extends to the end of the region (and thus, for a trailing
    // paragraph, to the document end).
    if let Some(idx) = stack.iter().position(|item| {
        matches!(item, InlineItem::Delimiter(d) if d.kind == DelimKind::Comment && d.can_open)
    }) {
        let opener = match &stack[idx] {
            InlineItem::Delimiter(d) => d.clone(),
            InlineItem::Element(_) => unreachable!("position matched a delimiter"),
        };
        let mut children = vec![InlineElement {
            kind: NodeKind::CommentMarker,
            from: opener.from,
            to: opener.right,
            children: Vec::new(),
        }];
        children.extend(drain_elements(&mut stack, idx + 1));
        stack.truncate(idx);
        stack.push(InlineItem::Element(InlineElement {
            kind: NodeKind::Comment,
            from: opener.from,
            to: region_end,
            children,
        }));
    }

    let mut elements: Vec<InlineElement> = stack
        .into_iter()
        .filter_map(|item| match item {
            InlineItem::Element(el) => Some(el),
            InlineItem::Delimiter(_) => None,
        })
        .collect();
    elements.sort_by_key(|el| el.from);
    elements
}

/// Find the nearest unmatched opener for `closer` and build the element.
/// Fixed-width kinds (strikethrough, highlight, comment, inline TeX)
/// consume their whole marker in one step.
fn close_fixed(stack: &mut Vec<InlineItem>, closer: &Delimiter) -> bool {
    let Some(open_idx) = find_opener(stack, closer) else {
        return false;
    };
    let opener = match &stack[open_idx] {
        InlineItem::Delimiter(d) => d.clone(),
        InlineItem::Element(_) => unreachable!("find_opener returns delimiters"),
    };

    let (node_kind, mark_kind) = closer.kind.node_kinds(false);
    let mut children = vec![InlineElement {
        kind: mark_kind,
        from: opener.from,
        to: opener.right,
        children: Vec::new(),
    }];
    children.extend(drain_elements(stack, open_idx + 1));
    children.push(InlineElement {
        kind: mark_kind,
        from: closer.from,
        to: closer.right,
        children: Vec::new(),
    });

    stack.truncate(open_idx);
    stack.push(InlineItem::Element(InlineElement {
        kind: node_kind,
        from: opener.from,
        to: closer.right,
        children,
    }));
    true
}

/// Emphasis pairing with partial-run consumption: `***a***` pairs a strong
/// pass and an emphasis pass against the same runs.
fn close_emphasis(stack: &mut Vec<InlineItem>, closer: &Delimiter) -> bool {
    let mut close_from = closer.from;
    let mut close_rem = closer.remaining();
    let mut matched = false;

    while close_rem > 0 {
        let Some(open_idx) = find_opener(stack, closer) else {
            break;
        };
        let (open_rem, open_right) = match &stack[open_idx] {
            InlineItem::Delimiter(d) => (d.remaining(), d.right),
            InlineItem::Element(_) => unreachable!("find_opener returns delimiters"),
        };

        let take = if open_rem >= 2 && close_rem >= 2 { 2 } else { 1 };
        let (node_kind, mark_kind) = DelimKind::Emphasis.node_kinds(take == 2);

        let mut children = vec![InlineElement {
            kind: mark_kind,
            from: open_right - take,
            to: open_right,
            children: Vec::new(),
        }];
        children.extend(drain_elements(stack, open_idx + 1));
        children.push(InlineElement {
            kind: mark_kind,
            from: close_from,
            to: close_from + take,
            children: Vec::new(),
        });

        let element = InlineElement {
            kind: node_kind,
            from: open_right - take,
            to: close_from + take,
            children,
        };

        if open_rem > take {
            if let InlineItem::Delimiter(d) = &mut stack[open_idx] {
                d.right -= take;
            }
            stack.truncate(open_idx + 1);
        } else {
            stack.truncate(open_idx);
        }
        stack.push(InlineItem::Element(element));

        close_from += take;
        close_rem -= take;
        matched = true;
    }
    matched
}

fn find_opener(stack: &[InlineItem], closer: &Delimiter) -> Option<usize> {
    stack.iter().rposition(|item| match item {
        InlineItem::Delimiter(d) => {
            d.kind == closer.kind && d.ch == closer.ch && d.can_open && d.remaining() > 0
        }
        InlineItem::Element(_) => false,
    })
}

/// Remove everything from `start` on, keeping only finished elements (in
/// order). Delimiter candidates trapped inside the pair are deactivated.
fn drain_elements(stack: &mut Vec<InlineItem>, start: usize) -> Vec<InlineElement> {
    stack
        .split_off(start.min(stack.len()))
        .into_iter()
        .filter_map(|item| match item {
            InlineItem::Element(el) => Some(el),
            InlineItem::Delimiter(_) => None,
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Base Inline Rules
// ─────────────────────────────────────────────────────────────────────────────

/// Backslash escapes: `\*` never opens emphasis.
struct EscapeRule;

impl InlineRule for EscapeRule {
    fn name(&self) -> &'static str {
        "Escape"
    }

    fn try_parse(&self, cx: &mut InlineContext<'_>, next: u8, pos: usize) -> Option<usize> {
        if next != b'\\' {
            return None;
        }
        match cx.byte(pos + 1) {
            Some(b) if b.is_ascii_punctuation() => Some(pos + 2),
            _ => None,
        }
    }
}

/// Backtick code spans.
struct InlineCodeRule;

impl InlineRule for InlineCodeRule {
    fn name(&self) -> &'static str {
        "InlineCode"
    }

    fn try_parse(&self, cx: &mut InlineContext<'_>, next: u8, pos: usize) -> Option<usize> {
        if next != b'`' {
            return None;
        }
        let mut open_end = pos;
        while cx.byte(open_end) == Some(b'`') {
            open_end += 1;
        }
        let run = open_end - pos;

        // Find a closing run of exactly the same length.
        let mut i = open_end;
        while i < cx.len() {
            if cx.byte(i) == Some(b'`') {
                let mut j = i;
                while cx.byte(j) == Some(b'`') {
                    j += 1;
                }
                if j - i == run {
                    let mut element = cx.elt(NodeKind::InlineCode, pos, j);
                    element.children.push(cx.elt(NodeKind::CodeMark, pos, open_end));
                    element.children.push(cx.elt(NodeKind::CodeMark, i, j));
                    return Some(cx.add_element(element));
                }
                i = j;
            } else {
                i += 1;
            }
        }
        // No closer: the opening run is literal text; consume it so the
        // backticks cannot re-trigger shorter spans inside themselves.
        Some(open_end)
    }
}

/// Angle-bracket autolinks plus bare `http(s)://` runs.
struct AutolinkRule;

impl InlineRule for AutolinkRule {
    fn name(&self) -> &'static str {
        "Autolink"
    }

    fn try_parse(&self, cx: &mut InlineContext<'_>, next: u8, pos: usize) -> Option<usize> {
        if next == b'<' {
            let rest = cx.slice(pos + 1, cx.len());
            let close = rest.find('>')?;
            let inner = &rest[..close];
            if inner.contains(char::is_whitespace) || !inner.contains("://") {
                return None;
            }
            let end = pos + 1 + close + 1;
            let mut element = cx.elt(NodeKind::Link, pos, end);
            element.children.push(cx.elt(NodeKind::LinkMark, pos, pos + 1));
            element.children.push(cx.elt(NodeKind::LinkUrl, pos + 1, end - 1));
            element.children.push(cx.elt(NodeKind::LinkMark, end - 1, end));
            return Some(cx.add_element(element));
        }

        if next == b'h' {
            let rest = cx.slice(pos, cx.len());
            if !rest.starts_with("http://") && !rest.starts_with("https://") {
                return None;
            }
            let mut end = pos;
            while let Some(b) = cx.byte(end) {
                if b.is_ascii_whitespace() || b == b'<' || b == b'>' {
                    break;
                }
                end += 1;
            }
            // Trailing punctuation is prose, not URL.
            while end > pos {
                match cx.byte(end - 1) {
                    Some(b'.') | Some(b',') | Some(b';') | Some(b':') | Some(b'!')
                    | Some(b'?') | Some(b')') => end -= 1,
                    _ => break,
                }
            }
            if cx.slice(pos, end).len() <= "https://".len() {
                return None;
            }
            let element = cx.elt(NodeKind::LinkUrl, pos, end);
            return Some(cx.add_element(element));
        }
        None
    }
}

/// `![alt](url)` images.
struct ImageRule;

impl InlineRule for ImageRule {
    fn name(&self) -> &'static str {
        "Image"
    }

    fn try_parse(&self, cx: &mut InlineContext<'_>, next: u8, pos: usize) -> Option<usize> {
        if next != b'!' || cx.byte(pos + 1) != Some(b'[') {
            return None;
        }
        let (close_bracket, url_end) = scan_link_tail(cx, pos + 1)?;
        let mut element = cx.elt(NodeKind::Image, pos, url_end);
        element.children.push(cx.elt(NodeKind::LinkMark, pos, pos + 2));
        element
            .children
            .push(cx.elt(NodeKind::LinkMark, close_bracket, close_bracket + 2));
        element
            .children
            .push(cx.elt(NodeKind::LinkUrl, close_bracket + 2, url_end - 1));
        element.children.push(cx.elt(NodeKind::LinkMark, url_end - 1, url_end));
        Some(cx.add_element(element))
    }
}

/// `[text](url)` links.
struct LinkRule;

impl InlineRule for LinkRule {
    fn name(&self) -> &'static str {
        "Link"
    }

    fn try_parse(&self, cx: &mut InlineContext<'_>, next: u8, pos: usize) -> Option<usize> {
        if next != b'[' {
            return None;
        }
        let (close_bracket, url_end) = scan_link_tail(cx, pos)?;
        let mut element = cx.elt(NodeKind::Link, pos, url_end);
        element.children.push(cx.elt(NodeKind::LinkMark, pos, pos + 1));
        element
            .children
            .push(cx.elt(NodeKind::LinkMark, close_bracket, close_bracket + 2));
        element
            .children
            .push(cx.elt(NodeKind::LinkUrl, close_bracket + 2, url_end - 1));
        element.children.push(cx.elt(NodeKind::LinkMark, url_end - 1, url_end));
        Some(cx.add_element(element))
    }
}

/// From an opening `[` at `open`, find `](url)` on the same logical scan.
/// Returns (offset of `]`, offset just past `)`).
fn scan_link_tail(cx: &InlineContext<'_>, open: usize) -> Option<(usize, usize)> {
    debug_assert_eq!(cx.byte(open), Some(b'['));
    let mut i = open + 1;
    while i < cx.len() {
        match cx.byte(i) {
            Some(b'\\') => i += 2,
            Some(b'[') => return None, // no nested brackets in link text
            Some(b']') => break,
            _ => i += 1,
        }
    }
    if cx.byte(i) != Some(b']') || cx.byte(i + 1) != Some(b'(') {
        return None;
    }
    let close_bracket = i;
    let mut j = close_bracket + 2;
    while j < cx.len() {
        match cx.byte(j) {
            Some(b'\\') => j += 2,
            Some(b')') => return Some((close_bracket, j + 1)),
            Some(b'\n') => return None,
            _ => j += 1,
        }
    }
    None
}

/// `*`/`_` emphasis delimiter runs with simplified flanking.
struct EmphasisRule;

impl InlineRule for EmphasisRule {
    fn name(&self) -> &'static str {
        "Emphasis"
    }

    fn try_parse(&self, cx: &mut InlineContext<'_>, next: u8, pos: usize) -> Option<usize> {
        if next != b'*' && next != b'_' {
            return None;
        }
        let mut end = pos;
        while cx.byte(end) == Some(next) {
            end += 1;
        }
        let after = cx.byte(end);
        let before = cx.prev_byte(pos);
        let can_open = matches!(after, Some(b) if !b.is_ascii_whitespace());
        let can_close = matches!(before, Some(b) if !b.is_ascii_whitespace());
        if !can_open && !can_close {
            return None;
        }
        Some(cx.add_delimiter(DelimKind::Emphasis, next, pos, end, can_open, can_close))
    }
}

/// `~~` strikethrough delimiters.
struct StrikethroughRule;

impl InlineRule for StrikethroughRule {
    fn name(&self) -> &'static str {
        "Strikethrough"
    }

    fn try_parse(&self, cx: &mut InlineContext<'_>, next: u8, pos: usize) -> Option<usize> {
        if next != b'~' || cx.byte(pos + 1) != Some(b'~') || cx.byte(pos + 2) == Some(b'~') {
            return None;
        }
        let after = cx.byte(pos + 2);
        let before = cx.prev_byte(pos);
        let can_open = matches!(after, Some(b) if !b.is_ascii_whitespace());
        let can_close = matches!(before, Some(b) if !b.is_ascii_whitespace());
        if !can_open && !can_close {
            return None;
        }
        Some(cx.add_delimiter(DelimKind::Strikethrough, b'~', pos, pos + 2, can_open, can_close))
    }
}

/// The base inline rules in their canonical order. `Order` directives from
/// extensions splice around these names.
pub(crate) fn base_inline_rules() -> Vec<Box<dyn InlineRule>> {
    vec![
        Box::new(EscapeRule),
        Box::new(InlineCodeRule),
        Box::new(AutolinkRule),
        Box::new(ImageRule),
        Box::new(LinkRule),
        Box::new(EmphasisRule),
        Box::new(StrikethroughRule),
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
