//! Syntax tree
//!
//! The tree produced by parsing: an arena of typed nodes addressed by
//! index, each carrying a half-open byte range into the document, ordered
//! children, and a non-owning parent back-reference. The arena form keeps
//! upward walks cheap without reference cycles; a tree is rebuilt (whole
//! or per top-level block) on every document mutation and never mutated
//! in place afterwards.

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Node Kinds
// ─────────────────────────────────────────────────────────────────────────────

/// The construct a node represents.
///
/// This is a closed catalog: the base Markdown grammar plus every custom
/// construct the extension set can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    HeaderMark,
    Blockquote,
    QuoteMark,
    BulletList,
    OrderedList,
    ListItem,
    ListMark,
    Task,
    TaskMarker,
    FencedCode,
    CodeMark,
    CodeInfo,
    CodeText,
    InlineCode,
    Emphasis,
    StrongEmphasis,
    EmphasisMark,
    Strikethrough,
    StrikethroughMark,
    Link,
    LinkMark,
    LinkUrl,
    Image,
    HorizontalRule,
    Table,
    TableRow,
    TableCell,
    TableDelimiter,
    // Custom constructs
    Callout,
    CalloutMark,
    CalloutTypeString,
    CalloutFoldIndicator,
    CalloutTitleString,
    InternalLink,
    InternalMark,
    InternalPath,
    InternalSubpath,
    InternalDisplay,
    Embed,
    EmbedMark,
    Hashtag,
    HashtagMark,
    HashtagLabel,
    Highlight,
    HighlightMark,
    Footnote,
    FootnoteLabel,
    FootnoteMark,
    FootnoteReference,
    Comment,
    CommentMarker,
    TexBlock,
    TexInline,
    TexMarker,
    FrontMatter,
    FrontMatterMarker,
    FrontMatterContent,
}

impl NodeKind {
    /// The stable tag string identifying this kind.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Document => "Document",
            NodeKind::Paragraph => "Paragraph",
            NodeKind::Heading1 => "Heading1",
            NodeKind::Heading2 => "Heading2",
            NodeKind::Heading3 => "Heading3",
            NodeKind::Heading4 => "Heading4",
            NodeKind::Heading5 => "Heading5",
            NodeKind::Heading6 => "Heading6",
            NodeKind::HeaderMark => "HeaderMark",
            NodeKind::Blockquote => "Blockquote",
            NodeKind::QuoteMark => "QuoteMark",
            NodeKind::BulletList => "BulletList",
            NodeKind::OrderedList => "OrderedList",
            NodeKind::ListItem => "ListItem",
            NodeKind::ListMark => "ListMark",
            NodeKind::Task => "Task",
            NodeKind::TaskMarker => "TaskMarker",
            NodeKind::FencedCode => "FencedCode",
            NodeKind::CodeMark => "CodeMark",
            NodeKind::CodeInfo => "CodeInfo",
            NodeKind::CodeText => "CodeText",
            NodeKind::InlineCode => "InlineCode",
            NodeKind::Emphasis => "Emphasis",
            NodeKind::StrongEmphasis => "StrongEmphasis",
            NodeKind::EmphasisMark => "EmphasisMark",
            NodeKind::Strikethrough => "Strikethrough",
            NodeKind::StrikethroughMark => "StrikethroughMark",
            NodeKind::Link => "Link",
            NodeKind::LinkMark => "LinkMark",
            NodeKind::LinkUrl => "LinkUrl",
            NodeKind::Image => "Image",
            NodeKind::HorizontalRule => "HorizontalRule",
            NodeKind::Table => "Table",
            NodeKind::TableRow => "TableRow",
            NodeKind::TableCell => "TableCell",
            NodeKind::TableDelimiter => "TableDelimiter",
            NodeKind::Callout => "Callout",
            NodeKind::CalloutMark => "CalloutMark",
            NodeKind::CalloutTypeString => "CalloutTypeString",
            NodeKind::CalloutFoldIndicator => "CalloutFoldIndicator",
            NodeKind::CalloutTitleString => "CalloutTitleString",
            NodeKind::InternalLink => "InternalLink",
            NodeKind::InternalMark => "InternalMark",
            NodeKind::InternalPath => "InternalPath",
            NodeKind::InternalSubpath => "InternalSubpath",
            NodeKind::InternalDisplay => "InternalDisplay",
            NodeKind::Embed => "Embed",
            NodeKind::EmbedMark => "EmbedMark",
            NodeKind::Hashtag => "Hashtag",
            NodeKind::HashtagMark => "HashtagMark",
            NodeKind::HashtagLabel => "HashtagLabel",
            NodeKind::Highlight => "Highlight",
            NodeKind::HighlightMark => "HighlightMark",
            NodeKind::Footnote => "Footnote",
            NodeKind::FootnoteLabel => "FootnoteLabel",
            NodeKind::FootnoteMark => "FootnoteMark",
            NodeKind::FootnoteReference => "FootnoteReference",
            NodeKind::Comment => "Comment",
            NodeKind::CommentMarker => "CommentMarker",
            NodeKind::TexBlock => "TexBlock",
            NodeKind::TexInline => "TexInline",
            NodeKind::TexMarker => "TexMarker",
            NodeKind::FrontMatter => "FrontMatter",
            NodeKind::FrontMatterMarker => "FrontMatterMarker",
            NodeKind::FrontMatterContent => "FrontMatterContent",
        }
    }

    /// Heading level for the heading kinds, `None` otherwise.
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            NodeKind::Heading1 => Some(1),
            NodeKind::Heading2 => Some(2),
            NodeKind::Heading3 => Some(3),
            NodeKind::Heading4 => Some(4),
            NodeKind::Heading5 => Some(5),
            NodeKind::Heading6 => Some(6),
            _ => None,
        }
    }

    /// The heading kind for a level 1-6.
    pub fn heading(level: u8) -> NodeKind {
        match level {
            1 => NodeKind::Heading1,
            2 => NodeKind::Heading2,
            3 => NodeKind::Heading3,
            4 => NodeKind::Heading4,
            5 => NodeKind::Heading5,
            _ => NodeKind::Heading6,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Nodes and Arena
// ─────────────────────────────────────────────────────────────────────────────

/// Index of a node within its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// One node: kind, half-open byte range, parent back-reference, children.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub from: usize,
    pub to: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Whether a range-filtered walk should descend into a node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Descend,
    Skip,
}

/// The syntax tree for one document revision.
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
}

impl SyntaxTree {
    /// An empty tree with a zero-length `Document` root.
    pub fn new() -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.add(NodeKind::Document, 0, 0);
        tree
    }

    /// The root node id.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds only the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    /// Add a detached node to the arena.
    pub(crate) fn add(&mut self, kind: NodeKind, from: usize, to: usize) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            from,
            to,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Attach `child` as the next child of `parent`.
    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0 as usize].parent = Some(parent);
        self.nodes[parent.0 as usize].children.push(child);
    }

    /// Widen a node's range (used while a container consumes lines).
    pub(crate) fn set_range(&mut self, id: NodeId, from: usize, to: usize) {
        let node = &mut self.nodes[id.0 as usize];
        node.from = from;
        node.to = to;
    }

    /// Sort a node's children by start offset, keeping insertion order for
    /// ties. Marker children are emitted interleaved with content, so
    /// containers normalize once when they close.
    pub(crate) fn sort_children(&mut self, id: NodeId) {
        let mut children = std::mem::take(&mut self.nodes[id.0 as usize].children);
        children.sort_by_key(|c| {
            let n = &self.nodes[c.0 as usize];
            (n.from, n.to)
        });
        self.nodes[id.0 as usize].children = children;
    }

    /// Copy the subtree rooted at `src_id` in `src` into this tree,
    /// shifting every offset by `shift`. Returns the new root of the copy.
    pub(crate) fn copy_subtree(
        &mut self,
        src: &SyntaxTree,
        src_id: NodeId,
        shift: isize,
    ) -> NodeId {
        let src_node = src.node(src_id);
        let id = self.add(
            src_node.kind,
            (src_node.from as isize + shift) as usize,
            (src_node.to as isize + shift) as usize,
        );
        for &child in &src_node.children {
            let copied = self.copy_subtree(src, child, shift);
            self.attach(id, copied);
        }
        id
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Walk the tree depth-first, visiting nodes whose range intersects
    /// `[from, to]`, calling `visit` on entry. Returning [`Walk::Skip`]
    /// prunes the node's children.
    pub fn walk(&self, from: usize, to: usize, mut visit: impl FnMut(NodeId, &Node) -> Walk) {
        self.walk_from(self.root(), from, to, &mut visit);
    }

    fn walk_from(
        &self,
        id: NodeId,
        from: usize,
        to: usize,
        visit: &mut impl FnMut(NodeId, &Node) -> Walk,
    ) {
        let node = self.node(id);
        if node.from > to || node.to < from {
            return;
        }
        if visit(id, node) == Walk::Skip {
            return;
        }
        for &child in &node.children {
            self.walk_from(child, from, to, visit);
        }
    }

    /// The first direct child of `id` with the given kind.
    pub fn child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.node(id)
            .children
            .iter()
            .copied()
            .find(|&c| self.node(c).kind == kind)
    }

    /// All direct children of `id` with the given kind.
    pub fn children_of_kind(&self, id: NodeId, kind: NodeKind) -> Vec<NodeId> {
        self.node(id)
            .children
            .iter()
            .copied()
            .filter(|&c| self.node(c).kind == kind)
            .collect()
    }

    /// Walk the parent chain upward from `id` (exclusive) looking for a
    /// node of `kind`.
    pub fn ancestor_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        let mut current = self.node(id).parent;
        while let Some(p) = current {
            if self.node(p).kind == kind {
                return Some(p);
            }
            current = self.node(p).parent;
        }
        None
    }

    /// The innermost node of `kind` whose inclusive range contains `pos`.
    pub fn innermost_at(&self, pos: usize, kind: NodeKind) -> Option<NodeId> {
        let mut found = None;
        self.walk(pos, pos, |id, node| {
            if node.from <= pos && pos <= node.to {
                if node.kind == kind {
                    found = Some(id);
                }
                Walk::Descend
            } else {
                Walk::Skip
            }
        });
        found
    }

    /// Quote nesting depth of a node: the number of `Blockquote`/`Callout`
    /// nodes on its parent chain, itself included.
    pub fn quote_depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = Some(id);
        while let Some(n) = current {
            let node = self.node(n);
            if matches!(node.kind, NodeKind::Blockquote | NodeKind::Callout) {
                depth += 1;
            }
            current = node.parent;
        }
        depth
    }

    /// Verify the structural invariants: ordered ranges, containment, and
    /// parent/child agreement.
    pub fn check(&self) -> Result<()> {
        for (i, node) in self.nodes.iter().enumerate() {
            if node.from > node.to {
                return Err(Error::TreeInconsistency {
                    message: format!("{} has reversed range {}..{}", node.kind.name(), node.from, node.to),
                });
            }
            for &child in &node.children {
                let c = self.node(child);
                if c.parent != Some(NodeId(i as u32)) {
                    return Err(Error::TreeInconsistency {
                        message: format!("{} child lacks back-reference", node.kind.name()),
                    });
                }
                if c.from < node.from || c.to > node.to {
                    return Err(Error::TreeInconsistency {
                        message: format!(
                            "{} {}..{} escapes parent {} {}..{}",
                            c.kind.name(),
                            c.from,
                            c.to,
                            node.kind.name(),
                            node.from,
                            node.to
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
