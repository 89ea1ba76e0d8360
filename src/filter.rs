//! Include/ignore path filtering.

use regex::Regex;

use crate::error::{CovgapError, Result};

/// Regex allow-list filter applied to diff paths before classification.
#[derive(Debug, Default)]
pub struct PathFilter {
    include: Vec<Regex>,
    ignore: Vec<Regex>,
}

impl PathFilter {
    /// Compile both pattern lists up front so a bad pattern surfaces before
    /// any diff is processed.
    pub fn new(include: &[String], ignore: &[String]) -> Result<Self> {
        Ok(Self {
            include: compile(include)?,
            ignore: compile(ignore)?,
        })
    }

    /// A path passes when the include list is empty or any include pattern
    /// matches, and no ignore pattern matches.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|re| re.is_match(path));
        included && !self.ignore.iter().any(|re| re.is_match(path))
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| CovgapError::Pattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}
