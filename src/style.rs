//! Highlight style map
//!
//! The node-kind → CSS class mapping the embedding view uses to style the
//! raw source while a construct is active. Hidden ranges never reach the
//! styling layer; everything visible gets its class from here.

use crate::tree::NodeKind;

/// The CSS class(es) for a node kind, or `None` for structural kinds the
/// view never styles directly.
pub fn class_for(kind: NodeKind) -> Option<&'static str> {
    let class = match kind {
        NodeKind::Heading1 => "prose-cm-h1",
        NodeKind::Heading2 => "prose-cm-h2",
        NodeKind::Heading3 => "prose-cm-h3",
        NodeKind::Heading4 => "prose-cm-h4",
        NodeKind::Heading5 => "prose-cm-h5",
        NodeKind::Heading6 => "prose-cm-h6",
        NodeKind::HeaderMark => "prose-cm-header-mark prose-cm-meta",
        NodeKind::Link | NodeKind::LinkUrl => "prose-cm-link",
        NodeKind::LinkMark => "prose-cm-link-mark prose-cm-meta",
        NodeKind::Emphasis => "prose-cm-emphasis",
        NodeKind::StrongEmphasis => "prose-cm-strong",
        NodeKind::EmphasisMark => "prose-cm-emphasis-mark prose-cm-meta",
        NodeKind::InlineCode | NodeKind::CodeText => "prose-cm-monospace",
        NodeKind::CodeMark | NodeKind::CodeInfo => "prose-cm-meta",
        NodeKind::Strikethrough => "prose-cm-strikethrough",
        NodeKind::StrikethroughMark => "prose-cm-strikethrough-mark prose-cm-meta",
        NodeKind::HorizontalRule => "prose-cm-horizontalrule",
        NodeKind::Hashtag => "prose-cm-hashtag",
        NodeKind::HashtagMark => "prose-cm-hashtag-mark prose-cm-meta",
        NodeKind::HashtagLabel => "prose-cm-hashtag-label",
        NodeKind::InternalLink => "prose-cm-internal-link",
        NodeKind::InternalMark => "prose-cm-internal-mark prose-cm-meta",
        NodeKind::InternalPath => "prose-cm-internal-path",
        NodeKind::InternalSubpath => "prose-cm-internal-subpath prose-cm-hashtag-label",
        NodeKind::InternalDisplay => "prose-cm-internal-display",
        NodeKind::Embed => "prose-cm-embed",
        NodeKind::EmbedMark => "prose-cm-embed-mark prose-cm-meta",
        NodeKind::Highlight => "prose-cm-highlight",
        NodeKind::HighlightMark => "prose-cm-highlight-marker prose-cm-meta",
        NodeKind::Task => "prose-cm-task",
        NodeKind::TaskMarker => "prose-cm-task-marker prose-cm-meta",
        NodeKind::Footnote => "prose-cm-footnote",
        NodeKind::FootnoteLabel => "prose-cm-footnote-label prose-cm-link",
        NodeKind::FootnoteMark => "prose-cm-footnote-mark prose-cm-meta",
        NodeKind::FootnoteReference => "prose-cm-footnote-reference",
        NodeKind::Comment => "prose-cm-comment",
        NodeKind::CommentMarker => "prose-cm-comment-marker prose-cm-meta",
        NodeKind::TexBlock => "prose-cm-tex-block prose-cm-monospace",
        NodeKind::TexInline => "prose-cm-tex-inline prose-cm-monospace",
        NodeKind::TexMarker => "prose-cm-tex-marker prose-cm-meta",
        NodeKind::FrontMatter => "prose-cm-yaml-frontmatter prose-cm-meta",
        NodeKind::FrontMatterMarker => "prose-cm-yaml-marker prose-cm-meta",
        NodeKind::FrontMatterContent => "prose-cm-yaml-content prose-cm-meta",
        NodeKind::QuoteMark => "prose-cm-quote-mark prose-cm-meta",
        NodeKind::Callout => "prose-cm-callout",
        NodeKind::CalloutMark => "prose-cm-callout-mark prose-cm-meta",
        NodeKind::CalloutTypeString => "prose-cm-callout-type",
        NodeKind::CalloutFoldIndicator => "prose-cm-callout-fold prose-cm-meta",
        NodeKind::CalloutTitleString => "prose-cm-callout-title",
        _ => return None,
    };
    Some(class)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_constructs_have_classes() {
        for kind in [
            NodeKind::Hashtag,
            NodeKind::InternalLink,
            NodeKind::Highlight,
            NodeKind::Callout,
            NodeKind::TexInline,
            NodeKind::Comment,
            NodeKind::Footnote,
        ] {
            assert!(class_for(kind).is_some(), "{} unmapped", kind.name());
        }
    }

    #[test]
    fn test_structural_kinds_are_unmapped() {
        assert!(class_for(NodeKind::Document).is_none());
        assert!(class_for(NodeKind::Paragraph).is_none());
        assert!(class_for(NodeKind::ListItem).is_none());
    }

    #[test]
    fn test_marker_kinds_carry_meta() {
        for kind in [
            NodeKind::HeaderMark,
            NodeKind::InternalMark,
            NodeKind::CommentMarker,
            NodeKind::TexMarker,
        ] {
            assert!(class_for(kind).unwrap().contains("prose-cm-meta"));
        }
    }
}
