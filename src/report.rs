//! Output formatting for gap reports.

use std::fmt::Write;

use crate::classify::{FileGaps, GapReport};

/// Trait for formatting gap reports.
pub trait ReportFormatter {
    /// Format the report to a string.
    fn format(&self, report: &GapReport) -> String;
}

/// Plain text formatter.
pub struct TextFormatter;

impl ReportFormatter for TextFormatter {
    fn format(&self, report: &GapReport) -> String {
        let mut out = String::new();

        if report.files.is_empty() {
            out.push_str("All added lines are covered.\n");
            return out;
        }

        let files = report.files.len();
        let lines = report.untested_line_count();
        writeln!(
            out,
            "Coverage gaps in {files} files ({lines} untested added lines):"
        )
        .unwrap();

        for entry in &report.files {
            let path = &entry.path;
            if !entry.has_tests {
                writeln!(out, "  {path}  file has no coverage").unwrap();
                continue;
            }
            let ranges = format_line_ranges(&entry.all);
            writeln!(out, "  {path}  lines {ranges} lack coverage").unwrap();
            for (label, lines) in entry.category_lines() {
                writeln!(out, "      {label}: {}", format_line_ranges(&lines)).unwrap();
            }
        }

        out
    }
}

/// Markdown formatter, suitable for PR comments.
pub struct MarkdownFormatter;

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, report: &GapReport) -> String {
        let mut md = String::new();

        if report.files.is_empty() {
            md.push_str("### Coverage Gaps: none\n\nAll added lines are covered! 🎉\n");
            push_footer(&mut md);
            return md;
        }

        let total = report.untested_line_count();
        let files = report.files.len();
        writeln!(
            md,
            "### Coverage Gaps: {total} untested added lines in {files} files\n"
        )
        .unwrap();

        if let Some(ref sha) = report.sha {
            let short_sha = if sha.len() > 7 { &sha[..7] } else { sha };
            writeln!(md, "Checked against coverage for `{short_sha}`.\n").unwrap();
        }

        md.push_str("| File | Untested | Categories |\n");
        md.push_str("|:-----|---------:|:-----------|\n");
        for entry in &report.files {
            let path = &entry.path;
            if entry.has_tests {
                let count = entry.all.len();
                let cats = entry.categories().join(", ");
                writeln!(md, "| `{path}` | {count} | {cats} |").unwrap();
            } else {
                writeln!(md, "| `{path}` | — | no coverage |").unwrap();
            }
        }

        let with_lines: Vec<&FileGaps> =
            report.files.iter().filter(|f| !f.all.is_empty()).collect();
        if !with_lines.is_empty() {
            md.push_str("\n<details>\n<summary>Untested lines</summary>\n\n");
            for entry in with_lines {
                writeln!(md, "**`{}`**: {}\n", entry.path, format_line_ranges(&entry.all))
                    .unwrap();
            }
            md.push_str("</details>\n");
        }

        push_footer(&mut md);
        md
    }
}

fn push_footer(md: &mut String) {
    md.push_str("\n<sub>[covgap](https://github.com/covgap/covgap)</sub>\n");
}

/// Coalesce sorted line numbers into `(start, end)` runs of consecutive
/// lines. The input must be sorted ascending and deduplicated.
#[must_use]
pub fn coalesce_ranges(lines: &[u32]) -> Vec<(u32, u32)> {
    let mut ranges: Vec<(u32, u32)> = Vec::new();
    for &line in lines {
        match ranges.last_mut() {
            Some((_, end)) if line == *end + 1 => *end = line,
            _ => ranges.push((line, line)),
        }
    }
    ranges
}

/// Format line numbers into compact range notation, e.g. "1, 3-5, 8".
///
/// The input slice must be sorted in ascending order.
#[must_use]
pub fn format_line_ranges(lines: &[u32]) -> String {
    coalesce_ranges(lines)
        .iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{start}-{end}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
