//! Counting and reporting the results of a batch run.

use std::fmt;

/// Aggregated results of a single batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files that were transformed.
    pub success_count: usize,
    /// Files that were looked at but deliberately left alone.
    pub skipped_count: usize,
    /// Files (or whole runs) that failed.
    pub failed_count: usize,
}

impl RunSummary {
    /// The summary reported when the root path is not a usable directory.
    pub const fn invalid_directory() -> Self {
        Self {
            success_count: 0,
            skipped_count: 0,
            failed_count: 1,
        }
    }

    /// Account for the outcome of a single file.
    ///
    /// [`Outcome::Ignored`] does not touch any counter.
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Success => self.success_count += 1,
            Outcome::Skipped(_) => self.skipped_count += 1,
            Outcome::Ignored => {}
        }
    }

    /// Account for a single failure.
    pub fn record_failure(&mut self) {
        self.failed_count += 1;
    }

    /// Total number of files that were counted in any way.
    pub const fn total(&self) -> usize {
        self.success_count + self.skipped_count + self.failed_count
    }

    /// Render this summary with the labels of one utility.
    pub fn report<'a>(&'a self, titles: &'a SummaryTitles) -> Report<'a> {
        Report {
            summary: self,
            titles,
        }
    }
}

/// Result of processing a single file that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The file was transformed.
    Success,
    /// The file was considered, but left alone for the given reason.
    Skipped(String),
    /// The file is outside of what this utility cares about and is not counted.
    Ignored,
}

/// The three labels printed in front of the counters of a [`RunSummary`].
#[derive(Debug, Clone, Copy)]
pub struct SummaryTitles {
    /// Label for [`RunSummary::success_count`].
    pub success: &'static str,
    /// Label for [`RunSummary::skipped_count`].
    pub warning: &'static str,
    /// Label for [`RunSummary::failed_count`].
    pub failed: &'static str,
}

/// Width of the separator lines framing the counters.
const RULE_WIDTH: usize = 40;

/// Display adapter created by [`RunSummary::report`].
pub struct Report<'a> {
    /// The counters to print.
    summary: &'a RunSummary,
    /// The labels to print them with.
    titles: &'a SummaryTitles,
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { summary, titles } = self;
        let rule = "-".repeat(RULE_WIDTH);

        writeln!(f)?;
        writeln!(f, "Processing complete. 🥳")?;
        writeln!(f)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "✅ {} {}", titles.success, summary.success_count)?;
        writeln!(f, "⚠️ {} {}", titles.warning, summary.skipped_count)?;
        writeln!(f, "🛑 {} {}", titles.failed, summary.failed_count)?;
        writeln!(f, "{rule}")
    }
}
