//! Unified-diff chunk-header parsing.
//!
//! Only the `@@ -a[,b] +c[,d] @@` headers are consulted: the declared counts
//! are trusted, and `+`/`-` content lines are never read. This matches the
//! diff flags the tool runs git with (zero context, tightest hunks), where
//! the headers alone describe every touched line.

use std::sync::LazyLock;

use regex::Regex;

static CHUNK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").unwrap());

/// A parsed `@@ -a[,b] +c[,d] @@` chunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub removed_start: u32,
    pub removed_count: u32,
    pub added_start: u32,
    pub added_count: u32,
}

impl ChunkHeader {
    /// Parse one line of diff text. Returns `None` for anything that is not
    /// a chunk header (file headers, content lines, malformed headers).
    pub fn parse(line: &str) -> Option<Self> {
        let caps = CHUNK_RE.captures(line)?;
        let start = |idx: usize| caps.get(idx).and_then(|m| m.as_str().parse::<u32>().ok());
        // An omitted count field means a single-line side, not an empty one.
        let count = |idx: usize| match caps.get(idx) {
            Some(m) => m.as_str().parse::<u32>().ok(),
            None => Some(1),
        };
        Some(ChunkHeader {
            removed_start: start(1)?,
            removed_count: count(2)?,
            added_start: start(3)?,
            added_count: count(4)?,
        })
    }

    /// Absolute line numbers this chunk removes from the base revision.
    /// Empty when the count is zero (a pure insertion).
    pub fn removed_lines(&self) -> impl Iterator<Item = u32> {
        let start = self.removed_start;
        (0..self.removed_count).map(move |i| start.saturating_add(i))
    }

    /// Absolute line numbers this chunk adds in the head revision.
    /// Empty when the count is zero (a pure deletion).
    pub fn added_lines(&self) -> impl Iterator<Item = u32> {
        let start = self.added_start;
        (0..self.added_count).map(move |i| start.saturating_add(i))
    }
}

/// Line numbers a single-file patch touches on each side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchLines {
    /// Lines added in the head revision, in chunk order.
    pub added: Vec<u32>,
    /// Lines removed from the base revision, in chunk order.
    pub removed: Vec<u32>,
}

/// Extract the added and removed line numbers from one file's unified diff.
///
/// Lines that don't match the chunk-header grammar are skipped silently;
/// the headers are the sole source of truth for chunk boundaries. Empty
/// input yields empty sets.
pub fn parse_patch(patch_text: &str) -> PatchLines {
    let mut lines = PatchLines::default();
    for line in patch_text.lines() {
        if let Some(header) = ChunkHeader::parse(line) {
            lines.removed.extend(header.removed_lines());
            lines.added.extend(header.added_lines());
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_with_counts() {
        let h = ChunkHeader::parse("@@ -10,5 +20,8 @@").unwrap();
        assert_eq!(
            h,
            ChunkHeader {
                removed_start: 10,
                removed_count: 5,
                added_start: 20,
                added_count: 8,
            }
        );
    }

    #[test]
    fn test_parse_header_omitted_count_defaults_to_one() {
        let h = ChunkHeader::parse("@@ -27 +198,0 @@").unwrap();
        assert_eq!(h.removed_start, 27);
        assert_eq!(h.removed_count, 1);
        assert_eq!(h.added_start, 198);
        assert_eq!(h.added_count, 0);

        let h = ChunkHeader::parse("@@ -5 +5 @@").unwrap();
        assert_eq!(h.removed_count, 1);
        assert_eq!(h.added_count, 1);
    }

    #[test]
    fn test_parse_header_with_section_heading() {
        let h = ChunkHeader::parse("@@ -3,2 +3,4 @@ fn main() {").unwrap();
        assert_eq!(h.removed_start, 3);
        assert_eq!(h.added_count, 4);
    }

    #[test]
    fn test_parse_header_rejects_non_headers() {
        assert!(ChunkHeader::parse("+++ b/src/lib.rs").is_none());
        assert!(ChunkHeader::parse("+let x = 1;").is_none());
        assert!(ChunkHeader::parse("-let x = 1;").is_none());
        assert!(ChunkHeader::parse("@@ garbage @@").is_none());
        // The header must start the line; indented ones are content.
        assert!(ChunkHeader::parse(" @@ -1 +1 @@").is_none());
    }

    #[test]
    fn test_parse_patch_single_line_sides() {
        let lines = parse_patch("@@ -27 +198,0 @@");
        assert_eq!(lines.removed, vec![27]);
        assert!(lines.added.is_empty());
    }

    #[test]
    fn test_parse_patch_multi_line_ranges() {
        let lines = parse_patch("@@ -27,7 +198,6 @@");
        assert_eq!(lines.removed, (27..=33).collect::<Vec<u32>>());
        assert_eq!(lines.added, (198..=203).collect::<Vec<u32>>());
    }

    #[test]
    fn test_parse_patch_zero_count_emits_nothing() {
        let lines = parse_patch("@@ -5,0 +10,2 @@\n+a\n+b");
        assert!(lines.removed.is_empty());
        assert_eq!(lines.added, vec![10, 11]);
    }

    #[test]
    fn test_parse_patch_empty_input() {
        assert_eq!(parse_patch(""), PatchLines::default());
    }

    #[test]
    fn test_parse_patch_multiple_chunks() {
        let text = "@@ -1,2 +1,0 @@\n-a\n-b\n@@ -10 +9,3 @@\n+x\n+y\n+z\n";
        let lines = parse_patch(text);
        assert_eq!(lines.removed, vec![1, 2, 10]);
        assert_eq!(lines.added, vec![9, 10, 11]);
    }

    #[test]
    fn test_parse_patch_skips_malformed_headers() {
        let text = "@@ -x,1 +1,1 @@\nnot a diff line\n@@ -4,1 +5,1 @@\n";
        let lines = parse_patch(text);
        assert_eq!(lines.removed, vec![4]);
        assert_eq!(lines.added, vec![5]);
    }

    #[test]
    fn test_parse_patch_content_lines_never_consulted() {
        // The header claims two added lines; the body disagrees. The header
        // wins because content lines are never parsed.
        let lines = parse_patch("@@ -1,0 +8,2 @@\n+only one line\n");
        assert_eq!(lines.added, vec![8, 9]);
    }
}
