//! The composed parser
//!
//! `ParserBuilder` merges the base grammar, the custom extension set, and
//! ordering/removal directives into one deterministic rule list. Rules
//! slot in by their `before`/`after` declarations with registration order
//! as the stable tie-break; registering a rule whose name already exists
//! replaces the earlier one, so two alternative recognizers for the same
//! construct can never both be active.
//!
//! The built `Parser` exposes `parse` (full) and `reparse` (incremental).
//! Reparse reuses every top-level block outside the edited span, keeping
//! one block of lookbehind since typing a continuation line can extend
//! the block above the edit, and re-parses forward until the emerging
//! block boundaries realign with the old tree, at which point the
//! remaining old blocks are copied across with shifted offsets.

use log::debug;
use std::collections::HashMap;

use super::block::{base_block_rules, BlockContext, LineSlice};
use super::inline::base_inline_rules;
use super::{BlockRule, Extension, InlineRule, Order};
use crate::document::{ChangeSet, Document};
use crate::tree::SyntaxTree;

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Configures and builds a [`Parser`].
pub struct ParserBuilder {
    block_rules: Vec<Box<dyn BlockRule>>,
    inline_rules: Vec<Box<dyn InlineRule>>,
    code_languages: HashMap<String, String>,
}

impl ParserBuilder {
    /// The base grammar only: CommonMark-style blocks and inlines plus
    /// GFM tables, strikethrough, and autolinks.
    pub fn new() -> Self {
        Self {
            block_rules: base_block_rules(),
            inline_rules: base_inline_rules(),
            code_languages: HashMap::new(),
        }
    }

    /// The full rich-Markdown configuration: every custom extension, with
    /// Setext headings removed (a stricter heading pass supersedes them).
    pub fn markdown() -> Self {
        Self::new()
            .extension(super::frontmatter())
            .extension(super::comments())
            .extension(super::footnotes())
            .extension(super::hashtags())
            .extension(super::wiki_links())
            .extension(super::highlights())
            .extension(super::tasks())
            .extension(super::tex())
            .extension(super::callouts())
            .remove("SetextHeading")
    }

    /// Splice in one extension's rules.
    #[must_use]
    pub fn extension(mut self, extension: Extension) -> Self {
        for rule in extension.block_rules {
            insert_rule(&mut self.block_rules, rule, |r| r.name(), |r| r.order());
        }
        for rule in extension.inline_rules {
            insert_rule(&mut self.inline_rules, rule, |r| r.name(), |r| r.order());
        }
        self
    }

    /// Remove a rule (base or extension) by name.
    #[must_use]
    pub fn remove(mut self, name: &str) -> Self {
        self.block_rules.retain(|r| r.name() != name);
        self.inline_rules.retain(|r| r.name() != name);
        self
    }

    /// Language-info aliases passed through to the code-block widgets
    /// (e.g. `rs` → `rust`).
    #[must_use]
    pub fn code_languages(mut self, languages: HashMap<String, String>) -> Self {
        self.code_languages = languages;
        self
    }

    /// Finish configuration.
    pub fn build(self) -> Parser {
        debug!(
            "composed parser: {} block rules, {} inline rules",
            self.block_rules.len(),
            self.inline_rules.len()
        );
        Parser {
            block_rules: self.block_rules,
            inline_rules: self.inline_rules,
            code_languages: self.code_languages,
        }
    }
}

impl Default for ParserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn insert_rule<R: ?Sized>(
    rules: &mut Vec<Box<R>>,
    rule: Box<R>,
    name: impl Fn(&R) -> &'static str,
    order: impl Fn(&R) -> Order,
) {
    let rule_name = name(&rule);
    if let Some(i) = rules.iter().position(|r| name(r) == rule_name) {
        // Later registration replaces the earlier rule of the same name.
        rules[i] = rule;
        return;
    }
    let idx = match order(&rule) {
        Order::Default => rules.len(),
        Order::Before(target) => rules
            .iter()
            .position(|r| name(r) == target)
            .unwrap_or(rules.len()),
        Order::After(target) => rules
            .iter()
            .position(|r| name(r) == target)
            .map(|i| i + 1)
            .unwrap_or(rules.len()),
    };
    rules.insert(idx, rule);
}

// ─────────────────────────────────────────────────────────────────────────────
// Parser
// ─────────────────────────────────────────────────────────────────────────────

/// A composed, immutable parser configuration.
pub struct Parser {
    block_rules: Vec<Box<dyn BlockRule>>,
    inline_rules: Vec<Box<dyn InlineRule>>,
    code_languages: HashMap<String, String>,
}

impl Parser {
    pub(crate) fn block_rules(&self) -> &[Box<dyn BlockRule>] {
        &self.block_rules
    }

    pub(crate) fn inline_rules(&self) -> &[Box<dyn InlineRule>] {
        &self.inline_rules
    }

    /// Whether a block rule with the given name is active.
    pub(crate) fn has_block_rule(&self, name: &str) -> bool {
        self.block_rules.iter().any(|r| r.name() == name)
    }

    /// Resolve a fenced-code info string through the configured aliases.
    pub fn code_language<'i>(&'i self, info: &'i str) -> &'i str {
        self.code_languages
            .get(info)
            .map(String::as_str)
            .unwrap_or(info)
    }

    /// Parse a whole document.
    pub fn parse(&self, doc: &Document) -> SyntaxTree {
        let mut tree = SyntaxTree::new();
        let root = tree.root();
        tree.set_range(root, 0, doc.len());
        let lines = document_lines(doc, 1);
        BlockContext::new(self, doc, &mut tree, lines, root).run();
        tree
    }

    /// Incrementally re-parse after an edit.
    ///
    /// `old` is the tree for the pre-edit revision, `new_doc` the post-edit
    /// snapshot, and `changes` the edits that separate them (in pre-edit
    /// coordinates). The result is equal to `parse(new_doc)`.
    pub fn reparse(&self, old: &SyntaxTree, new_doc: &Document, changes: &ChangeSet) -> SyntaxTree {
        if changes.is_empty() {
            return old.clone();
        }
        let Some((damage_from, damage_to)) = changes.touched_range() else {
            return self.parse(new_doc);
        };
        let shift = changes.len_delta();

        let top = old.node(old.root()).children.clone();

        // Keep the top-level blocks that end strictly before the damage,
        // minus one block of lookbehind: an edit on the line after a
        // multi-line construct can extend it (e.g. typing a `> `
        // continuation under a callout).
        let keep = top
            .partition_point(|&b| old.node(b).to < damage_from)
            .saturating_sub(1);

        let mut tree = SyntaxTree::new();
        let root = tree.root();
        tree.set_range(root, 0, new_doc.len());
        for &block in &top[..keep] {
            let copied = tree.copy_subtree(old, block, 0);
            tree.attach(root, copied);
        }

        // Re-parse from the start line of the first non-reused block. Its
        // offsets are unchanged by the edit (everything kept ends earlier).
        let resume_at = top.get(keep).map(|&b| old.node(b).from).unwrap_or(0);
        let resume_line = new_doc.line_at(resume_at.min(new_doc.len())).number;
        let lines = document_lines(new_doc, resume_line);

        // Old blocks strictly after the damage are splice candidates once
        // the new parse realigns with their (shifted) start offsets.
        let suffix: Vec<(usize, usize)> = top
            .iter()
            .enumerate()
            .filter(|&(_, &b)| old.node(b).from > damage_to)
            .map(|(i, &b)| (old.node(b).from, i))
            .collect();

        let mut spliced = None;
        {
            let mut cx = BlockContext::new(self, new_doc, &mut tree, lines, root);
            loop {
                cx.skip_blank_lines();
                if let Some(next_new) = cx.next_line_start() {
                    let old_off = next_new as isize - shift;
                    if let Some(&(_, idx)) =
                        suffix.iter().find(|&&(from, _)| from as isize == old_off)
                    {
                        spliced = Some(idx);
                        break;
                    }
                }
                if !cx.run_step() {
                    break;
                }
            }
        }

        if let Some(idx) = spliced {
            debug!(
                "incremental reparse: reused {} prefix and {} suffix blocks",
                keep,
                top.len() - idx
            );
            for &block in &top[idx..] {
                let copied = tree.copy_subtree(old, block, shift);
                tree.attach(root, copied);
            }
        }
        tree
    }
}

fn document_lines(doc: &Document, from_line: usize) -> Vec<LineSlice> {
    (from_line..=doc.line_count())
        .map(|n| {
            let line = doc.line(n);
            LineSlice {
                from: line.from,
                to: line.to,
            }
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ChangeSet, Edit};
    use crate::grammar::{InlineContext, InlineRule};
    use crate::tree::{NodeKind, Walk};

    /// Canonical serialization for tree comparison: (name, from, to) in
    /// document order.
    fn flatten(tree: &SyntaxTree) -> Vec<(&'static str, usize, usize)> {
        let mut out = Vec::new();
        tree.walk(0, usize::MAX, |_, node| {
            out.push((node.kind.name(), node.from, node.to));
            Walk::Descend
        });
        out
    }

    fn assert_reparse_matches(text: &str, edit: Edit) {
        let old_doc = Document::new(text);
        let parser = ParserBuilder::markdown().build();
        let old_tree = parser.parse(&old_doc);

        let changes = ChangeSet::single(edit);
        let new_doc = changes.apply(&old_doc);

        let incremental = parser.reparse(&old_tree, &new_doc, &changes);
        let full = parser.parse(&new_doc);
        incremental.check().unwrap();
        assert_eq!(flatten(&incremental), flatten(&full));
    }

    const SAMPLE: &str = "# Title\n\nfirst paragraph with *em*\n\n> [!note] Callout\n> body line\n\n- [ ] task one\n- [x] task two\n\n```rust\nfn main() {}\n```\n\nlast paragraph";

    // ─────────────────────────────────────────────────────────────────────────
    // Determinism and Ordering
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_is_deterministic() {
        let doc = Document::new(SAMPLE);
        let parser = ParserBuilder::markdown().build();
        assert_eq!(flatten(&parser.parse(&doc)), flatten(&parser.parse(&doc)));
    }

    #[test]
    fn test_duplicate_rule_names_never_coexist() {
        struct AltHashtag;
        impl InlineRule for AltHashtag {
            fn name(&self) -> &'static str {
                "Hashtag"
            }
            fn try_parse(
                &self,
                _cx: &mut InlineContext<'_>,
                _next: u8,
                _pos: usize,
            ) -> Option<usize> {
                None
            }
        }

        let parser = ParserBuilder::markdown()
            .extension(crate::grammar::Extension {
                name: "AltHashtag",
                block_rules: vec![],
                inline_rules: vec![Box::new(AltHashtag)],
            })
            .build();

        // The replacement recognizer matches nothing, so no hashtag nodes.
        let doc = Document::new("a #tag b");
        let tree = parser.parse(&doc);
        let mut tags = 0;
        tree.walk(0, usize::MAX, |_, node| {
            if node.kind == NodeKind::Hashtag {
                tags += 1;
            }
            Walk::Descend
        });
        assert_eq!(tags, 0);
    }

    #[test]
    fn test_remove_setext_heading() {
        let doc = Document::new("Title\n=====\n");
        let with = ParserBuilder::new().build().parse(&doc);
        let without = ParserBuilder::markdown().build().parse(&doc);

        let heading = |tree: &SyntaxTree| {
            let mut found = false;
            tree.walk(0, usize::MAX, |_, node| {
                if node.kind == NodeKind::Heading1 {
                    found = true;
                }
                Walk::Descend
            });
            found
        };
        assert!(heading(&with));
        assert!(!heading(&without));
    }

    #[test]
    fn test_code_language_aliases() {
        let mut aliases = HashMap::new();
        aliases.insert("rs".to_string(), "rust".to_string());
        let parser = ParserBuilder::markdown().code_languages(aliases).build();
        assert_eq!(parser.code_language("rs"), "rust");
        assert_eq!(parser.code_language("python"), "python");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Base Grammar Coverage
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_sample_document_structure() {
        let doc = Document::new(SAMPLE);
        let tree = ParserBuilder::markdown().build().parse(&doc);
        tree.check().unwrap();

        let mut kinds = Vec::new();
        for &child in &tree.node(tree.root()).children {
            kinds.push(tree.node(child).kind);
        }
        assert_eq!(
            kinds,
            vec![
                NodeKind::Heading1,
                NodeKind::Paragraph,
                NodeKind::Callout,
                NodeKind::BulletList,
                NodeKind::FencedCode,
                NodeKind::Paragraph,
            ]
        );
    }

    #[test]
    fn test_fenced_code_children() {
        let doc = Document::new("```rust\nlet x = 1;\n```");
        let tree = ParserBuilder::markdown().build().parse(&doc);
        let code = tree
            .child_of_kind(tree.root(), NodeKind::FencedCode)
            .unwrap();
        let info = tree.child_of_kind(code, NodeKind::CodeInfo).unwrap();
        assert_eq!(doc.slice(tree.node(info).from, tree.node(info).to), "rust");
        let text = tree.child_of_kind(code, NodeKind::CodeText).unwrap();
        assert_eq!(
            doc.slice(tree.node(text).from, tree.node(text).to),
            "let x = 1;"
        );
        assert_eq!(tree.children_of_kind(code, NodeKind::CodeMark).len(), 2);
    }

    #[test]
    fn test_table_structure() {
        let doc = Document::new("| a | b |\n|---|---|\n| 1 | 2 |");
        let tree = ParserBuilder::markdown().build().parse(&doc);
        let table = tree.child_of_kind(tree.root(), NodeKind::Table).unwrap();
        assert_eq!(tree.children_of_kind(table, NodeKind::TableRow).len(), 2);
        assert_eq!(
            tree.children_of_kind(table, NodeKind::TableDelimiter).len(),
            1
        );
        let row = tree.child_of_kind(table, NodeKind::TableRow).unwrap();
        assert_eq!(tree.children_of_kind(row, NodeKind::TableCell).len(), 2);
    }

    #[test]
    fn test_nested_blockquote_depth() {
        let doc = Document::new("> outer\n> > inner");
        let tree = ParserBuilder::markdown().build().parse(&doc);
        let outer = tree.child_of_kind(tree.root(), NodeKind::Blockquote).unwrap();
        let inner = tree.child_of_kind(outer, NodeKind::Blockquote).unwrap();
        assert_eq!(tree.quote_depth(outer), 1);
        assert_eq!(tree.quote_depth(inner), 2);
    }

    #[test]
    fn test_ordered_list() {
        let doc = Document::new("1. first\n2. second");
        let tree = ParserBuilder::markdown().build().parse(&doc);
        let list = tree.child_of_kind(tree.root(), NodeKind::OrderedList).unwrap();
        assert_eq!(tree.children_of_kind(list, NodeKind::ListItem).len(), 2);
    }

    #[test]
    fn test_nested_list() {
        let doc = Document::new("- outer\n  - inner");
        let tree = ParserBuilder::markdown().build().parse(&doc);
        let list = tree.child_of_kind(tree.root(), NodeKind::BulletList).unwrap();
        let item = tree.child_of_kind(list, NodeKind::ListItem).unwrap();
        assert!(tree.child_of_kind(item, NodeKind::BulletList).is_some());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Incremental Reparse
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_reparse_edit_inside_paragraph() {
        assert_reparse_matches(SAMPLE, Edit::insert(20, "xyz"));
    }

    #[test]
    fn test_reparse_edit_at_document_start() {
        assert_reparse_matches(SAMPLE, Edit::insert(0, "## New heading\n\n"));
    }

    #[test]
    fn test_reparse_edit_at_document_end() {
        assert_reparse_matches(SAMPLE, Edit::insert(SAMPLE.len(), " and more"));
    }

    #[test]
    fn test_reparse_callout_continuation_line() {
        // Typing "> more" right after the callout body must extend the
        // callout, which is exactly what the one-block lookbehind covers.
        let pos = SAMPLE.find("\n\n- [ ]").unwrap();
        assert_reparse_matches(SAMPLE, Edit::insert(pos, "\n> more"));
    }

    #[test]
    fn test_reparse_deletion_merging_blocks() {
        let from = SAMPLE.find("\n\n> [!note]").unwrap();
        let to = from + "\n\n> [!note] Callout".len();
        assert_reparse_matches(SAMPLE, Edit::delete(from, to));
    }

    #[test]
    fn test_reparse_unterminating_a_fence() {
        // Deleting the closing fence makes the code block swallow the rest.
        let pos = SAMPLE.rfind("\n```").unwrap();
        assert_reparse_matches(SAMPLE, Edit::delete(pos, pos + 4));
    }

    #[test]
    fn test_reparse_checkbox_toggle() {
        let pos = SAMPLE.find("[ ]").unwrap() + 1;
        assert_reparse_matches(SAMPLE, Edit::replace(pos, pos + 1, "x"));
    }

    #[test]
    fn test_reparse_reuses_unaffected_blocks() {
        let doc = Document::new(SAMPLE);
        let parser = ParserBuilder::markdown().build();
        let tree = parser.parse(&doc);

        let pos = SAMPLE.find("first paragraph").unwrap();
        let changes = ChangeSet::single(Edit::insert(pos, "X"));
        let new_doc = changes.apply(&doc);
        let reparsed = parser.reparse(&tree, &new_doc, &changes);

        // Same structure as a full parse, including the untouched blocks.
        assert_eq!(flatten(&reparsed), flatten(&parser.parse(&new_doc)));
    }
}
