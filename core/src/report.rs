use crate::corpus::CorpusStats;
use crate::{FlexwerError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const FLEXWER_TAG: &str = "FLEXWER";

/// One scored corpus, as printed on a single report line:
///
/// `%FLEXWER 20.00 [ 1 / 5, 0 ins, 0 del, 1 sub ] hyp.txt`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub tag: String,
    pub rate: f64,
    pub errors: usize,
    pub total: usize,
    pub insertions: usize,
    pub deletions: usize,
    pub substitutions: usize,
    pub path: String,
}

impl Report {
    /// Build a report from finished corpus counts. An empty corpus has no defined rate.
    pub fn from_stats(tag: &str, stats: &CorpusStats, path: impl Into<String>) -> Result<Self> {
        let rate = stats.error_rate().ok_or(FlexwerError::EmptyCorpus)?;
        Ok(Self {
            tag: tag.to_string(),
            rate,
            errors: stats.errors(),
            total: stats.total_positions,
            insertions: stats.insertions,
            deletions: stats.deletions,
            substitutions: stats.substitutions,
            path: path.into(),
        })
    }

    /// The bracketed counts block, e.g. `[ 1 / 5, 0 ins, 0 del, 1 sub ]`.
    pub fn counts(&self) -> String {
        format!(
            "[ {} / {}, {} ins, {} del, {} sub ]",
            self.errors, self.total, self.insertions, self.deletions, self.substitutions
        )
    }

    /// Same report under a different tag and path, as written to a sweep's best file.
    pub fn retagged(&self, tag: &str, path: impl Into<String>) -> Self {
        Self {
            tag: tag.to_string(),
            path: path.into(),
            ..self.clone()
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{} {:.2} {} {}", self.tag, self.rate, self.counts(), self.path)
    }
}

/// Parses report lines back into [`Report`] values.
pub struct ReportParser {
    re: Regex,
}

impl ReportParser {
    pub fn new() -> Self {
        Self {
            re: Regex::new(
                r"^%(\w+) (\d+(?:\.\d+)?) \[ (\d+) / (\d+), (\d+) ins, (\d+) del, (\d+) sub \] ?(.*)$",
            )
            .expect("Invalid regex"),
        }
    }

    /// Parse the first non-empty line of `text`.
    pub fn parse(&self, text: &str) -> Result<Report> {
        let line = text
            .lines()
            .map(str::trim_end)
            .find(|l| !l.is_empty())
            .ok_or_else(|| FlexwerError::MalformedReport("empty report".to_string()))?;
        let caps = self
            .re
            .captures(line)
            .ok_or_else(|| FlexwerError::MalformedReport(line.to_string()))?;

        let number = |idx: usize| -> Result<usize> {
            caps[idx]
                .parse()
                .map_err(|_| FlexwerError::MalformedReport(line.to_string()))
        };
        let rate = caps[2]
            .parse()
            .map_err(|_| FlexwerError::MalformedReport(line.to_string()))?;

        Ok(Report {
            tag: caps[1].to_string(),
            rate,
            errors: number(3)?,
            total: number(4)?,
            insertions: number(5)?,
            deletions: number(6)?,
            substitutions: number(7)?,
            path: caps[8].to_string(),
        })
    }
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::new()
    }
}
