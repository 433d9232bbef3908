//! Immutable document snapshot
//!
//! A `Document` owns one revision of the buffer text plus a precomputed
//! table of line starts, so line/offset queries are O(log lines) and byte
//! slicing is UTF-8-boundary safe even when handed arbitrary positions
//! (cursor offsets can land mid-character when the embedder works in
//! different units).

// ─────────────────────────────────────────────────────────────────────────────
// Line
// ─────────────────────────────────────────────────────────────────────────────

/// One line of a document, without its trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-indexed line number
    pub number: usize,
    /// Byte offset of the first character of the line
    pub from: usize,
    /// Byte offset just past the last character, excluding the newline
    pub to: usize,
    /// The line's text, excluding the newline
    pub text: &'a str,
}

impl<'a> Line<'a> {
    /// Whether the line is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Length of the line in bytes, excluding the newline.
    pub fn len(&self) -> usize {
        self.to - self.from
    }

    /// Whether the line has no characters at all.
    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Document
// ─────────────────────────────────────────────────────────────────────────────

/// An immutable snapshot of the buffer text for one revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
    /// Byte offset of the start of each line. Always non-empty; the first
    /// entry is 0.
    line_starts: Vec<usize>,
}

impl Document {
    /// Create a snapshot from the given text.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { text, line_starts }
    }

    /// The full text of this revision.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the document in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the document is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Number of lines. An empty document has one (empty) line.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// The line containing the given byte offset.
    ///
    /// Offsets past the end of the document resolve to the last line.
    pub fn line_at(&self, pos: usize) -> Line<'_> {
        let number = match self.line_starts.binary_search(&pos.min(self.len())) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        };
        self.line(number)
    }

    /// The line with the given 1-indexed number.
    ///
    /// Numbers out of range are clamped to the last line.
    pub fn line(&self, number: usize) -> Line<'_> {
        let number = number.clamp(1, self.line_count());
        let from = self.line_starts[number - 1];
        let to = if number < self.line_count() {
            self.line_starts[number] - 1
        } else {
            self.len()
        };
        Line {
            number,
            from,
            to,
            text: &self.text[from..to],
        }
    }

    /// Slice the document by byte range, clamping both endpoints to valid
    /// UTF-8 character boundaries (start floors, end floors too, so a range
    /// that ends mid-character never grows past what the caller asked for).
    pub fn slice(&self, from: usize, to: usize) -> &str {
        let from = self.floor_boundary(from);
        let to = self.floor_boundary(to);
        if from >= to {
            return "";
        }
        &self.text[from..to]
    }

    /// The byte at `pos`, if in bounds.
    pub fn byte_at(&self, pos: usize) -> Option<u8> {
        self.text.as_bytes().get(pos).copied()
    }

    /// The character starting at `pos`, if `pos` is a valid boundary.
    pub fn char_at(&self, pos: usize) -> Option<char> {
        self.text.get(pos..).and_then(|s| s.chars().next())
    }

    /// Largest valid char boundary `<= pos` (clamped to the document).
    pub fn floor_boundary(&self, pos: usize) -> usize {
        let mut pos = pos.min(self.len());
        while pos > 0 && !self.text.is_char_boundary(pos) {
            pos -= 1;
        }
        pos
    }

    /// Smallest valid char boundary `>= pos` (clamped to the document).
    pub fn ceil_boundary(&self, pos: usize) -> usize {
        let mut pos = pos.min(self.len());
        while pos < self.len() && !self.text.is_char_boundary(pos) {
            pos += 1;
        }
        pos
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(String::new())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────────────────
    // Line Index Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_document() {
        let doc = Document::new("");
        assert_eq!(doc.len(), 0);
        assert_eq!(doc.line_count(), 1);
        let line = doc.line(1);
        assert_eq!(line.from, 0);
        assert_eq!(line.to, 0);
        assert!(line.is_blank());
    }

    #[test]
    fn test_line_offsets() {
        let doc = Document::new("one\ntwo\n\nfour");
        assert_eq!(doc.line_count(), 4);

        let l1 = doc.line(1);
        assert_eq!((l1.from, l1.to, l1.text), (0, 3, "one"));

        let l2 = doc.line(2);
        assert_eq!((l2.from, l2.to, l2.text), (4, 7, "two"));

        let l3 = doc.line(3);
        assert_eq!((l3.from, l3.to, l3.text), (8, 8, ""));
        assert!(l3.is_blank());

        let l4 = doc.line(4);
        assert_eq!((l4.from, l4.to, l4.text), (9, 13, "four"));
    }

    #[test]
    fn test_line_at_positions() {
        let doc = Document::new("one\ntwo\nthree");
        assert_eq!(doc.line_at(0).number, 1);
        assert_eq!(doc.line_at(3).number, 1); // at the newline
        assert_eq!(doc.line_at(4).number, 2);
        assert_eq!(doc.line_at(7).number, 2);
        assert_eq!(doc.line_at(8).number, 3);
        assert_eq!(doc.line_at(100).number, 3); // past end clamps
    }

    #[test]
    fn test_trailing_newline_makes_empty_last_line() {
        let doc = Document::new("one\n");
        assert_eq!(doc.line_count(), 2);
        let last = doc.line(2);
        assert_eq!((last.from, last.to), (4, 4));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Slicing Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_slice_ascii() {
        let doc = Document::new("Hello World");
        assert_eq!(doc.slice(0, 5), "Hello");
        assert_eq!(doc.slice(6, 11), "World");
        assert_eq!(doc.slice(0, 100), "Hello World");
    }

    #[test]
    fn test_slice_clamps_to_char_boundaries() {
        let doc = Document::new("på ski"); // 'å' spans bytes 1..3
        assert_eq!(doc.slice(0, 2), "p"); // end mid-'å' floors to 1
        assert_eq!(doc.slice(2, 4), ""); // start mid-'å' floors into 'å'
        assert_eq!(doc.slice(1, 3), "å");
    }

    #[test]
    fn test_slice_reversed_range() {
        let doc = Document::new("Hello");
        assert_eq!(doc.slice(3, 2), "");
    }

    #[test]
    fn test_boundary_helpers() {
        let doc = Document::new("中文"); // each char is 3 bytes
        assert_eq!(doc.floor_boundary(1), 0);
        assert_eq!(doc.floor_boundary(3), 3);
        assert_eq!(doc.ceil_boundary(1), 3);
        assert_eq!(doc.ceil_boundary(7), 6); // past end clamps
    }

    #[test]
    fn test_char_and_byte_at() {
        let doc = Document::new("a中");
        assert_eq!(doc.byte_at(0), Some(b'a'));
        assert_eq!(doc.char_at(1), Some('中'));
        assert_eq!(doc.char_at(4), None);
    }
}
