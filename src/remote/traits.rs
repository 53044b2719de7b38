//! Trait abstraction for the drain collaborators to enable mocking in tests

use crate::drain::{EntryBatch, FormSummary};
use crate::error::{DeleteError, ExtractionError, LookupError};
use async_trait::async_trait;

/// Result of a deletion call that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The entry was removed remotely
    Deleted,
    /// Dry-run: nothing was sent
    Simulated,
}

/// Reads entry identifiers off a form's rendered entries page
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntryExtractor: Send + Sync {
    /// Entry ids currently visible for the form, in listing order
    async fn extract(&self, internal_name: &str) -> Result<EntryBatch, ExtractionError>;
}

/// Knows which forms exist and how they are addressed by the API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FormDirectory: Send + Sync {
    /// Forms whose advisory entry count is positive
    async fn list_forms_with_entries(&self) -> Result<Vec<FormSummary>, ExtractionError>;

    /// API-facing form id, or `None` when the API does not know the form
    async fn resolve_form_id(&self, internal_name: &str) -> Result<Option<String>, LookupError>;
}

/// Deletes entries through the forms API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeletionClient: Send + Sync {
    /// Delete one entry; with `dry_run` set nothing leaves the process
    async fn delete_entry(
        &self,
        form_id: &str,
        entry_id: &str,
        dry_run: bool,
    ) -> Result<DeleteOutcome, DeleteError>;
}
