//! Command handlers for the covgap CLI.
//!
//! The pipeline entry points return plain values (a [`GapReport`] or a
//! `String`), making them easy to test without capturing stdout.

use std::fmt::Write;
use std::path::Path;

use anyhow::Result;
use clap::ValueEnum;

use crate::classify::{classify, GapReport};
use crate::coverage::CoverageReport;
use crate::diff::split_diff;
use crate::filter::PathFilter;
use crate::patch::parse_patch;
use crate::report::{format_line_ranges, MarkdownFormatter, ReportFormatter, TextFormatter};

/// Output style for the `check` command.
#[derive(Clone, ValueEnum)]
pub enum Style {
    Text,
    Markdown,
    Json,
}

/// Run the whole correlation pipeline over a multi-file diff.
///
/// Entries come out in diff order. The filter sees paths as they appear in
/// the diff; the coverage lookup joins them onto `root` first, since
/// Istanbul reports key by absolute path.
pub fn run_check(
    diff_text: &str,
    coverage: &CoverageReport,
    filter: &PathFilter,
    root: Option<&Path>,
) -> crate::error::Result<GapReport> {
    let mut report = GapReport::default();

    for (path, patch) in split_diff(diff_text) {
        if !filter.matches(&path) {
            continue;
        }
        let lines = parse_patch(&patch);
        let lookup_path = match root {
            Some(root) => root.join(&path).display().to_string(),
            None => path.clone(),
        };
        let record = coverage.lookup(&lookup_path);
        if let Some(entry) = classify(&path, &lines.added, record)? {
            report.files.push(entry);
        }
    }

    Ok(report)
}

/// Render a gap report in the requested style.
pub fn render(report: &GapReport, style: &Style) -> Result<String> {
    Ok(match style {
        Style::Text => TextFormatter.format(report),
        Style::Markdown => MarkdownFormatter.format(report),
        Style::Json => {
            let mut out = serde_json::to_string_pretty(report)?;
            out.push('\n');
            out
        }
    })
}

/// Print the line numbers a diff adds and removes per file (debugging aid
/// for checking what the chunk headers actually declare).
pub fn cmd_parse_diff(diff_text: &str) -> String {
    let files = split_diff(diff_text);
    if files.is_empty() {
        return "No files in diff.\n".to_string();
    }

    let ranges = |lines: &[u32]| {
        if lines.is_empty() {
            "(none)".to_string()
        } else {
            format_line_ranges(lines)
        }
    };

    let mut out = String::new();
    for (path, patch) in files {
        let mut lines = parse_patch(&patch);
        lines.added.sort_unstable();
        lines.added.dedup();
        lines.removed.sort_unstable();
        lines.removed.dedup();
        writeln!(out, "{path}").unwrap();
        writeln!(out, "  added:   {}", ranges(&lines.added)).unwrap();
        writeln!(out, "  removed: {}", ranges(&lines.removed)).unwrap();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const COVERAGE: &str = r#"{
        "/repo/src/app.js": {
            "statementMap": {
                "0": { "start": { "line": 1, "column": 0 }, "end": { "line": 1, "column": 20 } },
                "1": { "start": { "line": 5, "column": 2 }, "end": { "line": 6, "column": 3 } }
            },
            "s": { "0": 2, "1": 0 },
            "fnMap": {}, "f": {}, "branchMap": {}, "b": {}
        }
    }"#;

    const DIFF: &str = "\
diff --git a/src/app.js b/src/app.js
--- a/src/app.js
+++ b/src/app.js
@@ -4,0 +5,2 @@
+if (x) {
+}
diff --git a/src/new.js b/src/new.js
--- /dev/null
+++ b/src/new.js
@@ -0,0 +1,2 @@
+export default 1;
+// new module
";

    fn coverage() -> CoverageReport {
        CoverageReport::from_json_str(COVERAGE).unwrap()
    }

    fn no_filter() -> PathFilter {
        PathFilter::new(&[], &[]).unwrap()
    }

    #[test]
    fn test_run_check_reports_in_diff_order() {
        let report = run_check(DIFF, &coverage(), &no_filter(), Some(Path::new("/repo"))).unwrap();
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files[0].path, "src/app.js");
        assert_eq!(report.files[0].all, vec![5, 6]);
        assert!(report.files[0].has_tests);
        assert_eq!(report.files[1].path, "src/new.js");
        assert!(!report.files[1].has_tests);
    }

    #[test]
    fn test_run_check_applies_filter_to_diff_paths() {
        let filter = PathFilter::new(&[], &[r"new\.js$".to_string()]).unwrap();
        let report = run_check(DIFF, &coverage(), &filter, Some(Path::new("/repo"))).unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].path, "src/app.js");
    }

    #[test]
    fn test_run_check_without_root_uses_diff_paths() {
        // Report keyed by relative path; no root joined on.
        let coverage = CoverageReport::from_json_str(
            r#"{
                "src/app.js": {
                    "statementMap": { "0": { "start": { "line": 5, "column": 0 }, "end": { "line": 5, "column": 5 } } },
                    "s": { "0": 0 },
                    "fnMap": {}, "f": {}, "branchMap": {}, "b": {}
                }
            }"#,
        )
        .unwrap();
        let diff = "+++ b/src/app.js\n@@ -4,0 +5 @@\n+x\n";
        let report = run_check(diff, &coverage, &no_filter(), None).unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].all, vec![5]);
    }

    #[test]
    fn test_run_check_empty_diff() {
        let report = run_check("", &coverage(), &no_filter(), Some(Path::new("/repo"))).unwrap();
        assert!(!report.has_gaps());
    }

    #[test]
    fn test_render_json_uses_camel_case_fields() {
        let report = run_check(DIFF, &coverage(), &no_filter(), Some(Path::new("/repo"))).unwrap();
        let json = render(&report, &Style::Json).unwrap();
        assert!(json.contains("\"hasTests\": true"));
        assert!(json.contains("\"hasTests\": false"));
        assert!(json.contains("\"statements\""));
    }

    #[test]
    fn test_render_text_and_markdown() {
        let report = run_check(DIFF, &coverage(), &no_filter(), Some(Path::new("/repo"))).unwrap();
        let text = render(&report, &Style::Text).unwrap();
        assert!(text.contains("lines 5-6 lack coverage"));
        let md = render(&report, &Style::Markdown).unwrap();
        assert!(md.contains("### Coverage Gaps:"));
    }

    #[test]
    fn test_cmd_parse_diff() {
        let out = cmd_parse_diff(DIFF);
        assert!(out.contains("src/app.js"));
        assert!(out.contains("added:   5-6"));
        assert!(out.contains("removed: (none)"));
        assert!(out.contains("src/new.js"));
        assert!(out.contains("added:   1-2"));
    }

    #[test]
    fn test_cmd_parse_diff_empty() {
        assert_eq!(cmd_parse_diff(""), "No files in diff.\n");
    }
}
