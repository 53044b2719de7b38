//! Run-level report across all drained forms

use super::types::{DrainResult, TerminationReason};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Aggregated results of one orchestration run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Per-form results in discovery order
    pub results: Vec<DrainResult>,
    /// Forms listed with a zero advisory count and never drained
    pub skipped: Vec<String>,
    pub dry_run: bool,
}

impl RunSummary {
    pub fn start(dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            results: Vec::new(),
            skipped: Vec::new(),
            dry_run,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn total_deleted(&self) -> u64 {
        self.results.iter().map(|r| r.entries_deleted).sum()
    }

    pub fn total_failed(&self) -> u64 {
        self.results.iter().map(|r| r.entries_failed).sum()
    }

    pub fn total_simulated(&self) -> u64 {
        self.results.iter().map(|r| r.entries_simulated).sum()
    }

    /// Whether any form stopped early or any entry failed
    ///
    /// A dry run cannot shrink the listing, so a stalled form is expected there.
    pub fn has_problems(&self) -> bool {
        self.results.iter().any(|r| {
            let expected_stall = self.dry_run && r.termination_reason == TerminationReason::Stalled;
            !(r.is_clean() || (expected_stall && r.entries_failed == 0))
        })
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.dry_run { " (dry run)" } else { "" };
        write!(f, "Run {}{mode}", self.run_id)?;
        if let Some(finished) = self.finished_at {
            let secs = (finished - self.started_at).num_seconds();
            write!(f, " finished in {secs}s")?;
        }
        writeln!(f)?;

        if self.results.is_empty() {
            return writeln!(f, "No forms with entries were processed.");
        }

        let name_width = self
            .results
            .iter()
            .map(|r| r.internal_name.len())
            .max()
            .unwrap_or(0)
            .max("FORM".len());

        writeln!(
            f,
            "{:<name_width$}  {:>7}  {:>6}  {:>9}  {:>6}  REASON",
            "FORM", "DELETED", "FAILED", "SIMULATED", "PASSES"
        )?;
        for r in &self.results {
            writeln!(
                f,
                "{:<name_width$}  {:>7}  {:>6}  {:>9}  {:>6}  {}",
                r.internal_name,
                r.entries_deleted,
                r.entries_failed,
                r.entries_simulated,
                r.passes,
                r.termination_reason
            )?;
        }
        writeln!(
            f,
            "{:<name_width$}  {:>7}  {:>6}  {:>9}",
            "TOTAL",
            self.total_deleted(),
            self.total_failed(),
            self.total_simulated()
        )?;

        if !self.skipped.is_empty() {
            writeln!(f, "Skipped (no entries): {}", self.skipped.join(", "))?;
        }
        Ok(())
    }
}
