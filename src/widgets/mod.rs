//! Widget set
//!
//! Widgets are the renderable substitutes for inactive rich blocks: value
//! objects holding exactly the data needed to render one replaced region.
//! They form a closed tagged union with three dispatch surfaces per kind:
//! `render` (produce a detached [`Fragment`]), equality (`PartialEq`, so
//! the host can skip re-rendering when nothing visible changed), and
//! `ignores_event` (which input events the widget handles itself versus
//! letting the host's click-to-place-cursor behavior through).
//!
//! A click on any non-interactive widget surface must fall through to the
//! host: placing the cursor inside the replaced range flips the construct
//! active, and the next rebuild reveals the raw source. That fall-through
//! is the whole "click to edit" mechanism; no widget may swallow it.

mod callout;
mod code;
mod fragment;

pub use callout::{CalloutWidget, RenderedBlockWidget, RenderedCalloutWidget};
pub use code::{CodeFlairWidget, HighlightedLine, HighlightedSegment, SyntaxHighlighter};
pub use fragment::Fragment;

use crate::document::{Document, Edit};
use log::debug;
use regex::Regex;
use std::sync::OnceLock;

// ─────────────────────────────────────────────────────────────────────────────
// Input Events
// ─────────────────────────────────────────────────────────────────────────────

/// The input event kinds widgets can claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    PointerDown,
    PointerUp,
    Click,
}

/// Where inside a widget's rendered form an event landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    Checkbox,
    FoldToggle,
    EditButton,
    CopyButton,
    Body,
}

/// An input event forwarded by the host view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub kind: EventKind,
    pub target: EventTarget,
}

// ─────────────────────────────────────────────────────────────────────────────
// The Widget Union
// ─────────────────────────────────────────────────────────────────────────────

/// A renderable substitute for one inactive document range.
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    /// Callout card built from parsed pieces.
    Callout(CalloutWidget),
    /// Callout card whose body comes from the external Markdown renderer.
    RenderedCallout(RenderedCalloutWidget),
    /// Generic rendered block (tables).
    RenderedBlock(RenderedBlockWidget),
    /// Interactive task checkbox.
    TaskCheckbox(TaskCheckboxWidget),
    /// First-line chrome of a fenced code block.
    CodeFlair(CodeFlairWidget),
    /// Hidden stand-in for the closing fence line.
    CodeFenceEnd,
    /// Card for `![[..]]` embeds.
    EmbedCard(EmbedCardWidget),
    /// `<hr>` stand-in for a thematic break.
    HorizontalRule,
}

impl Widget {
    /// Render the widget's detached view fragment.
    pub fn render(&self) -> Fragment {
        match self {
            Widget::Callout(w) => w.render(),
            Widget::RenderedCallout(w) => w.render(),
            Widget::RenderedBlock(w) => w.render(),
            Widget::TaskCheckbox(w) => w.render(),
            Widget::CodeFlair(w) => w.render(),
            Widget::CodeFenceEnd => Fragment::root("cm-codeblock-end-fence").class("hidden"),
            Widget::EmbedCard(w) => w.render(),
            Widget::HorizontalRule => {
                Fragment::root("prose-cm-hr-widget").child(Fragment::new("hr"))
            }
        }
    }

    /// Whether the widget handles this event itself. Returning `false`
    /// lets the host place the cursor, activating the construct.
    pub fn ignores_event(&self, event: &InputEvent) -> bool {
        let is_pointer = matches!(event.kind, EventKind::Click | EventKind::PointerDown);
        match self {
            Widget::TaskCheckbox(_) => {
                event.kind == EventKind::Click && event.target == EventTarget::Checkbox
            }
            Widget::Callout(_) | Widget::RenderedCallout(_) => {
                is_pointer
                    && matches!(
                        event.target,
                        EventTarget::EditButton | EventTarget::FoldToggle
                    )
            }
            Widget::RenderedBlock(_) => is_pointer && event.target == EventTarget::EditButton,
            Widget::CodeFlair(_) => is_pointer && event.target == EventTarget::CopyButton,
            Widget::CodeFenceEnd => true,
            Widget::EmbedCard(_) | Widget::HorizontalRule => false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Task Checkbox
// ─────────────────────────────────────────────────────────────────────────────

/// The one widget with a write side effect: clicking it toggles the
/// checkbox character through the normal edit channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCheckboxWidget {
    pub checked: bool,
    /// Byte offset of the character inside the brackets, captured from the
    /// current tree at build time.
    pub checkbox_offset: usize,
}

impl TaskCheckboxWidget {
    pub fn new(checked: bool, checkbox_offset: usize) -> Self {
        Self {
            checked,
            checkbox_offset,
        }
    }

    fn render(&self) -> Fragment {
        let checkbox = Fragment::new("input")
            .class("task-list-item-checkbox")
            .attr("type", "checkbox")
            .attr("data-task", if self.checked { "x" } else { " " });
        let checkbox = if self.checked {
            checkbox.attr("checked", "")
        } else {
            checkbox
        };
        Fragment::new("label")
            .class("task-list-label")
            .attr("contenteditable", "false")
            .child(checkbox)
    }

    /// Produce the single-character toggle edit, re-validating the marker
    /// against the live text first. If the document no longer matches
    /// (another edit raced the click), this no-ops rather than touching
    /// unrelated text.
    pub fn toggle(&self, doc: &Document) -> Option<Edit> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(r"^(\s*[-*+]\s+)(\[[xX ]\])(.*)$").expect("task line pattern")
        });

        let line = doc.line_at(self.checkbox_offset);
        let caps = re.captures(line.text).or_else(|| {
            debug!("task toggle: line no longer matches, ignoring click");
            None
        })?;
        let marker = caps.get(2).expect("checkbox group");
        let inside = line.from + marker.start() + 1;
        if inside != self.checkbox_offset {
            debug!("task toggle: checkbox moved, ignoring click");
            return None;
        }
        let current = doc.slice(inside, inside + 1);
        let replacement = if current == " " { "x" } else { " " };
        Some(Edit::replace(inside, inside + 1, replacement))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Embed Card
// ─────────────────────────────────────────────────────────────────────────────

/// Inline card shown for an inactive `![[..]]` embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedCardWidget {
    pub path: String,
    pub subpath: Option<String>,
    pub display: Option<String>,
}

impl EmbedCardWidget {
    fn render(&self) -> Fragment {
        let label = self
            .display
            .clone()
            .unwrap_or_else(|| match &self.subpath {
                Some(sub) => format!("{}{}", self.path, sub),
                None => self.path.clone(),
            });
        Fragment::new("span")
            .class("cm-embed-card")
            .attr("contenteditable", "false")
            .attr("data-path", self.path.clone())
            .child(Fragment::new("span").class("cm-embed-title").text(label))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
