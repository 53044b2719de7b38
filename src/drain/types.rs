//! Data model shared by the drain engine and its collaborators

use serde::{Deserialize, Serialize};
use std::fmt;

/// Page size observed on the rendered entries grid
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Iteration cap applied to a single form
pub const DEFAULT_MAX_PASSES: usize = 200;

/// A form discovered on the listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSummary {
    /// DOM-derived internal name, unique per site
    pub internal_name: String,
    /// Advisory entry count, may be stale by the time draining starts
    pub entry_count: u64,
}

impl FormSummary {
    pub fn new(internal_name: impl Into<String>, entry_count: u64) -> Self {
        Self {
            internal_name: internal_name.into(),
            entry_count,
        }
    }
}

/// Mapping from an internal name to the API-facing form id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormIdentity {
    pub internal_name: String,
    /// `None` when the API has no counterpart for this form
    pub form_id: Option<String>,
}

/// Entry identifiers visible in one extraction
pub type EntryBatch = Vec<String>;

/// What a missing deletion target counts as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MissingEntryPolicy {
    /// Already-absent entries are reported as failures
    #[default]
    Failure,
    /// Already-absent entries count as deleted
    TreatAsDeleted,
}

/// Knobs for the drain loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainSettings {
    pub page_size: usize,
    pub max_passes: usize,
    pub dry_run: bool,
    pub missing_entries: MissingEntryPolicy,
}

impl Default for DrainSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_passes: DEFAULT_MAX_PASSES,
            dry_run: false,
            missing_entries: MissingEntryPolicy::default(),
        }
    }
}

/// Why draining a form stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// Extraction returned no entries
    EmptyBatch,
    /// Extraction returned fewer entries than a full page
    PartialBatch,
    /// The API-facing form id could not be resolved
    UnresolvedFormId,
    /// The entries page failed to load or render
    ExtractionError,
    /// The per-form iteration cap was reached
    PassLimit,
    /// A full batch repeated the previous pass unchanged
    Stalled,
}

impl TerminationReason {
    /// Whether the form is considered fully drained
    pub fn is_drained(&self) -> bool {
        matches!(self, Self::EmptyBatch | Self::PartialBatch)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::EmptyBatch => "empty batch",
            Self::PartialBatch => "partial batch",
            Self::UnresolvedFormId => "unresolved form id",
            Self::ExtractionError => "extraction error",
            Self::PassLimit => "pass limit",
            Self::Stalled => "stalled",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of draining one form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainResult {
    pub internal_name: String,
    pub entries_deleted: u64,
    pub entries_failed: u64,
    /// Deletions skipped because of dry-run mode
    pub entries_simulated: u64,
    /// Extraction passes performed
    pub passes: usize,
    pub termination_reason: TerminationReason,
}

impl DrainResult {
    pub(crate) fn new(internal_name: &str) -> Self {
        Self {
            internal_name: internal_name.to_string(),
            entries_deleted: 0,
            entries_failed: 0,
            entries_simulated: 0,
            passes: 0,
            termination_reason: TerminationReason::EmptyBatch,
        }
    }

    pub(crate) fn finish(mut self, reason: TerminationReason) -> Self {
        self.termination_reason = reason;
        self
    }

    /// Drained to completion with no failed deletions
    pub fn is_clean(&self) -> bool {
        self.termination_reason.is_drained() && self.entries_failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = DrainSettings::default();
        assert_eq!(settings.page_size, 25);
        assert_eq!(settings.max_passes, DEFAULT_MAX_PASSES);
        assert!(!settings.dry_run);
        assert_eq!(settings.missing_entries, MissingEntryPolicy::Failure);
    }

    #[test]
    fn test_drained_reasons() {
        assert!(TerminationReason::EmptyBatch.is_drained());
        assert!(TerminationReason::PartialBatch.is_drained());
        assert!(!TerminationReason::UnresolvedFormId.is_drained());
        assert!(!TerminationReason::ExtractionError.is_drained());
        assert!(!TerminationReason::PassLimit.is_drained());
        assert!(!TerminationReason::Stalled.is_drained());
    }

    #[test]
    fn test_clean_result_requires_no_failures() {
        let mut result = DrainResult::new("contact").finish(TerminationReason::PartialBatch);
        assert!(result.is_clean());

        result.entries_failed = 1;
        assert!(!result.is_clean());
    }

    #[test]
    fn test_missing_policy_serialization() {
        let json = serde_json::to_string(&MissingEntryPolicy::TreatAsDeleted).unwrap();
        assert_eq!(json, "\"treat-as-deleted\"");

        let parsed: MissingEntryPolicy = serde_json::from_str("\"failure\"").unwrap();
        assert_eq!(parsed, MissingEntryPolicy::Failure);
    }
}
