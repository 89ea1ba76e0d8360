//! Obtaining and splitting unified diffs.
//!
//! A [`DiffSource`] abstracts over where the diff text comes from (stdin, a
//! local `git diff`, the GitHub API). [`split_diff`] partitions a multi-file
//! diff into per-file patch text for the chunk-header parser.

use std::process::Command;

use anyhow::{Context, Result};

use crate::github;

// ---------------------------------------------------------------------------
// Diff sources
// ---------------------------------------------------------------------------

/// A source for obtaining a unified diff.
pub trait DiffSource {
    /// Fetch the diff text.
    fn fetch_diff(&self) -> Result<String>;

    /// Get the commit SHA, if available.
    fn sha(&self) -> Option<&str> {
        None
    }
}

/// Diff from stdin.
pub struct StdinDiff;

impl DiffSource for StdinDiff {
    fn fetch_diff(&self) -> Result<String> {
        std::io::read_to_string(std::io::stdin()).context("Failed to read diff from stdin")
    }
}

/// Diff flags the chunk-header parser is calibrated for: zero context lines,
/// the tightest hunks git will produce, added and modified files only,
/// whitespace-insensitive comparison, no inter-hunk merging.
const GIT_DIFF_FLAGS: &[&str] = &[
    "--unified=0",
    "--minimal",
    "--diff-filter=AM",
    "-w",
    "--inter-hunk-context=0",
];

/// Diff from a git command (e.g., `git diff main...HEAD`).
pub struct GitDiff {
    /// Ref arguments to pass to `git diff`.
    pub args: String,
}

impl DiffSource for GitDiff {
    fn fetch_diff(&self) -> Result<String> {
        let ref_args: Vec<&str> = self.args.split_whitespace().collect();
        let output = Command::new("git")
            .arg("diff")
            .args(GIT_DIFF_FLAGS)
            .args(&ref_args)
            .output()
            .context("Failed to run git diff")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("git diff failed: {stderr}");
        }

        String::from_utf8(output.stdout).context("git diff output not valid UTF-8")
    }
}

/// Diff from a GitHub pull request.
pub struct GitHubDiff {
    /// The resolved GitHub context.
    pub context: github::Context,
}

impl GitHubDiff {
    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        let context = github::Context::from_env()?;
        Ok(Self { context })
    }
}

impl DiffSource for GitHubDiff {
    fn fetch_diff(&self) -> Result<String> {
        self.context.fetch_diff()
    }

    fn sha(&self) -> Option<&str> {
        self.context.sha.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Per-file splitting
// ---------------------------------------------------------------------------

/// Split a multi-file unified diff into `(path, patch text)` pairs in order
/// of first appearance.
///
/// Deleted files (`+++ /dev/null`) are skipped; `a/` and `b/` prefixes are
/// stripped (and `--no-prefix` diffs pass through unchanged). Lines before
/// the first `+++` header, and `---` headers belonging to the next file,
/// end up attached to whatever file is current — harmless, since only chunk
/// headers are consulted downstream.
pub fn split_diff(diff_text: &str) -> Vec<(String, String)> {
    let mut files: Vec<(String, String)> = Vec::new();
    let mut current: Option<usize> = None;

    for line in diff_text.lines() {
        if let Some(rest) = line.strip_prefix("+++ ") {
            if rest == "/dev/null" {
                current = None; // File was deleted
            } else {
                let path = rest
                    .strip_prefix("b/")
                    .or_else(|| rest.strip_prefix("a/"))
                    .unwrap_or(rest);
                files.push((path.to_string(), String::new()));
                current = Some(files.len() - 1);
            }
        } else if let Some(idx) = current {
            files[idx].1.push_str(line);
            files[idx].1.push('\n');
        }
    }

    files
}
