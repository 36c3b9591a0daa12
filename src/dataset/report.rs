//! Per-batch outcome accounting for a dataset build.
//!
//! Source archives for unpublished periods legitimately go missing, so a
//! finished dataset is only auditable together with a record of which batches
//! actually contributed rows and which were skipped, and why.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one fetch-and-parse unit of work: a year, or a year-month for
/// sources delivered monthly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId {
    pub year: i32,
    pub month: Option<u32>,
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(month) => write!(f, "{}-{:02}", self.year, month),
            None => write!(f, "{}", self.year),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchOutcome {
    /// Fetched, parsed and normalized; contributed `rows` rows.
    Loaded { rows: usize },
    /// The remote resource does not exist (HTTP 404).
    NotFound,
    /// Fetch or parse failed; the batch was skipped.
    Failed { reason: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    entries: Vec<(BatchId, BatchOutcome)>,
}

impl BatchReport {
    pub fn record(&mut self, id: BatchId, outcome: BatchOutcome) {
        self.entries.push((id, outcome));
    }

    /// All recorded outcomes, in fetch order.
    pub fn entries(&self) -> &[(BatchId, BatchOutcome)] {
        &self.entries
    }

    pub fn loaded_batches(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, o)| matches!(o, BatchOutcome::Loaded { .. }))
            .count()
    }

    pub fn missing_batches(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, o)| matches!(o, BatchOutcome::NotFound))
            .count()
    }

    pub fn failed_batches(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, o)| matches!(o, BatchOutcome::Failed { .. }))
            .count()
    }

    /// Total rows contributed by loaded batches.
    pub fn total_rows(&self) -> usize {
        self.entries
            .iter()
            .filter_map(|(_, o)| match o {
                BatchOutcome::Loaded { rows } => Some(rows),
                _ => None,
            })
            .sum()
    }

    /// JSON rendering for post-hoc auditing of an incomplete dataset.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
