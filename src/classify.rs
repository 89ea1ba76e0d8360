//! The gap classifier: cross-references one file's added lines against its
//! coverage record.
//!
//! Three passes over the record (uncovered statements, uncovered function
//! bodies, uncovered branch arms) each produce their own category list; the
//! `all` set is the union, merged once at the end. A line inside a branch
//! range whose arm counts are both zero lands in `ifs` AND `elses`: the two
//! arms are independent conditions, and consumers rely on seeing each missed
//! arm separately. It still appears exactly once in `all`.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::coverage::FileCoverage;
use crate::error::{CovgapError, Result};

/// Added lines lacking coverage in one file, by gap category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileGaps {
    pub path: String,
    /// False only when the file has no coverage record at all.
    pub has_tests: bool,
    /// Ascending, deduplicated union of every category below.
    pub all: Vec<u32>,
    /// Added lines inside statements that never executed.
    pub statements: Vec<u32>,
    /// Added lines inside function bodies that were never called.
    pub functions: Vec<u32>,
    /// Added lines inside branch groups whose if-arm never ran.
    pub ifs: Vec<u32>,
    /// Added lines inside branch groups whose else-arm never ran.
    pub elses: Vec<u32>,
}

impl FileGaps {
    fn untested(path: &str) -> Self {
        FileGaps {
            path: path.to_string(),
            has_tests: false,
            all: Vec::new(),
            statements: Vec::new(),
            functions: Vec::new(),
            ifs: Vec::new(),
            elses: Vec::new(),
        }
    }

    /// Non-empty category lists, sorted and deduplicated for display.
    #[must_use]
    pub fn category_lines(&self) -> Vec<(&'static str, Vec<u32>)> {
        [
            ("statements", &self.statements),
            ("functions", &self.functions),
            ("if arms", &self.ifs),
            ("else arms", &self.elses),
        ]
        .into_iter()
        .filter(|(_, lines)| !lines.is_empty())
        .map(|(label, lines)| {
            let mut sorted = lines.clone();
            sorted.sort_unstable();
            sorted.dedup();
            (label, sorted)
        })
        .collect()
    }

    /// Names of the non-empty gap categories.
    #[must_use]
    pub fn categories(&self) -> Vec<&'static str> {
        self.category_lines()
            .into_iter()
            .map(|(label, _)| label)
            .collect()
    }
}

/// Ordered per-file gap entries for one run. Order matches the diff.
#[derive(Debug, Default, Serialize)]
pub struct GapReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    pub files: Vec<FileGaps>,
}

impl GapReport {
    /// Any entry at all means the change has a coverage problem.
    #[must_use]
    pub fn has_gaps(&self) -> bool {
        !self.files.is_empty()
    }

    /// Total count of distinct untested added lines across all files.
    #[must_use]
    pub fn untested_line_count(&self) -> usize {
        self.files.iter().map(|f| f.all.len()).sum()
    }
}

/// Classify one file's added lines against its coverage record.
///
/// Returns `None` when there is nothing to report: the record exists and no
/// added line intersects an uncovered range. A file with no record at all is
/// always reported (`has_tests: false`), whether or not it added lines —
/// "never ran under the tests" dominates every other consideration.
///
/// Errs only on a record whose count keys have no matching range entry,
/// which callers loading through [`crate::coverage::CoverageReport`] have
/// already ruled out.
pub fn classify(
    path: &str,
    added_lines: &[u32],
    record: Option<&FileCoverage>,
) -> Result<Option<FileGaps>> {
    let Some(record) = record else {
        return Ok(Some(FileGaps::untested(path)));
    };

    let added: BTreeSet<u32> = added_lines.iter().copied().collect();

    let statements = uncovered_statement_lines(path, record, &added)?;
    let functions = uncovered_function_lines(path, record, &added)?;
    let (ifs, elses) = uncovered_branch_lines(path, record, &added)?;

    // One merge at the end keeps each pass a pure function of its category.
    let mut all = BTreeSet::new();
    all.extend(statements.iter().copied());
    all.extend(functions.iter().copied());
    all.extend(ifs.iter().copied());
    all.extend(elses.iter().copied());

    if all.is_empty() {
        return Ok(None);
    }

    Ok(Some(FileGaps {
        path: path.to_string(),
        has_tests: true,
        all: all.into_iter().collect(),
        statements,
        functions,
        ifs,
        elses,
    }))
}

fn uncovered_statement_lines(
    path: &str,
    record: &FileCoverage,
    added: &BTreeSet<u32>,
) -> Result<Vec<u32>> {
    let mut lines = Vec::new();
    for (key, &count) in &record.s {
        if count != 0 {
            continue;
        }
        let range = record
            .statement_map
            .get(key)
            .ok_or_else(|| missing_entry(path, "statementMap", key))?;
        lines.extend(added.iter().copied().filter(|&line| range.contains(line)));
    }
    Ok(lines)
}

fn uncovered_function_lines(
    path: &str,
    record: &FileCoverage,
    added: &BTreeSet<u32>,
) -> Result<Vec<u32>> {
    let mut lines = Vec::new();
    for (key, &count) in &record.f {
        if count != 0 {
            continue;
        }
        let info = record
            .fn_map
            .get(key)
            .ok_or_else(|| missing_entry(path, "fnMap", key))?;
        lines.extend(added.iter().copied().filter(|&line| info.loc.contains(line)));
    }
    Ok(lines)
}

fn uncovered_branch_lines(
    path: &str,
    record: &FileCoverage,
    added: &BTreeSet<u32>,
) -> Result<(Vec<u32>, Vec<u32>)> {
    let mut ifs = Vec::new();
    let mut elses = Vec::new();
    for (key, counts) in &record.b {
        let info = record
            .branch_map
            .get(key)
            .ok_or_else(|| missing_entry(path, "branchMap", key))?;
        // Arm 0 is the if-arm, arm 1 the else-arm. Extra arms (switch-style
        // groups) are not classified, and a missing arm counts as covered.
        let if_missed = counts.first() == Some(&0);
        let else_missed = counts.get(1) == Some(&0);
        if !if_missed && !else_missed {
            continue;
        }
        for &line in added.iter().filter(|&&line| info.loc.contains(line)) {
            if if_missed {
                ifs.push(line);
            }
            if else_missed {
                elses.push(line);
            }
        }
    }
    Ok((ifs, elses))
}

fn missing_entry(path: &str, map: &str, key: &str) -> CovgapError {
    CovgapError::MalformedCoverage {
        path: path.to_string(),
        detail: format!("count key '{key}' has no {map} entry"),
    }
}
