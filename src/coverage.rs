//! Typed model of Istanbul / NYC `coverage-final.json` reports.
//!
//! Reference: https://github.com/istanbuljs/istanbuljs
//!
//! The format is a JSON object keyed by absolute file path. Each value holds
//! three parallel map pairs sharing a key space:
//!   - `statementMap` / `s`: statement line ranges and execution counts
//!   - `fnMap` / `f`: function body ranges (under `loc`) and call counts
//!   - `branchMap` / `b`: branch group ranges (under `loc`) and per-arm
//!     hit counts (`[if, else]` for binary branches)
//!
//! Everything deserializes into concrete nested types, so a count key with
//! no matching range entry is caught here at the boundary instead of deep
//! inside classification.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{CovgapError, Result};

/// A source position; only the line matters for gap classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Position {
    pub line: u32,
}

/// An inclusive 1-based line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LineRange {
    pub start: Position,
    pub end: Position,
}

impl LineRange {
    #[must_use]
    pub fn contains(&self, line: u32) -> bool {
        self.start.line <= line && line <= self.end.line
    }
}

/// `fnMap` entry. The function body range is nested under `loc`.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionInfo {
    #[serde(default)]
    pub name: Option<String>,
    pub loc: LineRange,
}

/// `branchMap` entry. The whole branch group's range is nested under `loc`.
#[derive(Debug, Clone, Deserialize)]
pub struct BranchInfo {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub loc: LineRange,
}

/// Coverage record for one instrumented source file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCoverage {
    #[serde(default)]
    pub statement_map: BTreeMap<String, LineRange>,
    /// Execution count per statement, same keys as `statement_map`.
    #[serde(default)]
    pub s: BTreeMap<String, u64>,
    #[serde(default)]
    pub fn_map: BTreeMap<String, FunctionInfo>,
    /// Call count per function, same keys as `fn_map`.
    #[serde(default)]
    pub f: BTreeMap<String, u64>,
    #[serde(default)]
    pub branch_map: BTreeMap<String, BranchInfo>,
    /// Hit counts per branch arm, same keys as `branch_map`.
    #[serde(default)]
    pub b: BTreeMap<String, Vec<u64>>,
}

impl FileCoverage {
    /// The coverage producer guarantees `s`/`f`/`b` share key spaces with
    /// their map counterparts; a count without a range entry fails the
    /// whole load.
    fn validate(&self, path: &str) -> Result<()> {
        for key in self.s.keys() {
            if !self.statement_map.contains_key(key) {
                return Err(malformed(path, "statementMap", key));
            }
        }
        for key in self.f.keys() {
            if !self.fn_map.contains_key(key) {
                return Err(malformed(path, "fnMap", key));
            }
        }
        for key in self.b.keys() {
            if !self.branch_map.contains_key(key) {
                return Err(malformed(path, "branchMap", key));
            }
        }
        Ok(())
    }
}

fn malformed(path: &str, map: &str, key: &str) -> CovgapError {
    CovgapError::MalformedCoverage {
        path: path.to_string(),
        detail: format!("count key '{key}' has no {map} entry"),
    }
}

/// A full coverage report: per-file records keyed by absolute path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct CoverageReport {
    files: BTreeMap<String, FileCoverage>,
}

impl CoverageReport {
    pub fn from_json_str(input: &str) -> Result<Self> {
        let report: Self = serde_json::from_str(input)?;
        report.validate()?;
        Ok(report)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let report: Self = serde_json::from_reader(reader)?;
        report.validate()?;
        Ok(report)
    }

    /// Exact-path lookup. `None` means the file was never instrumented,
    /// which is a normal outcome and not an error.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&FileCoverage> {
        self.files.get(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn validate(&self) -> Result<()> {
        for (path, file) in &self.files {
            file.validate(path)?;
        }
        Ok(())
    }
}

/// Where the report comes from: a local file or a prior build's artifact URL.
#[derive(Debug, Clone)]
pub enum CoverageSource {
    File(PathBuf),
    Url(String),
}

impl CoverageSource {
    #[must_use]
    pub fn from_arg(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            CoverageSource::Url(arg.to_string())
        } else {
            CoverageSource::File(PathBuf::from(arg))
        }
    }

    /// Read and validate the report.
    pub fn load(&self) -> Result<CoverageReport> {
        match self {
            CoverageSource::File(path) => {
                let text = std::fs::read_to_string(path)?;
                CoverageReport::from_json_str(&text)
            }
            CoverageSource::Url(url) => {
                eprintln!("Fetching coverage report from {url} ...");
                let resp = ureq::get(url).call().map_err(|e| CovgapError::Http {
                    url: url.clone(),
                    detail: e.to_string(),
                })?;
                CoverageReport::from_reader(resp.into_reader())
            }
        }
    }
}
