//! Per-form drain loop
//!
//! A form is drained by repeatedly reading the first page of its entries
//! and deleting everything on it. Deleted entries drop out of the listing,
//! so the next read shows whatever remains. A full page means more may
//! remain; a short page means the form is empty.

use super::types::{
    DrainResult, DrainSettings, EntryBatch, FormIdentity, MissingEntryPolicy, TerminationReason,
};
use crate::remote::{DeleteOutcome, DeletionClient, EntryExtractor, FormDirectory};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Drives single forms from "has entries" to "confirmed empty"
pub struct DrainEngine<'a> {
    extractor: &'a dyn EntryExtractor,
    directory: &'a dyn FormDirectory,
    deleter: &'a dyn DeletionClient,
    settings: DrainSettings,
    /// Resolved identities, kept for the whole run
    identities: HashMap<String, FormIdentity>,
}

impl<'a> DrainEngine<'a> {
    pub fn new(
        extractor: &'a dyn EntryExtractor,
        directory: &'a dyn FormDirectory,
        deleter: &'a dyn DeletionClient,
        settings: DrainSettings,
    ) -> Self {
        Self {
            extractor,
            directory,
            deleter,
            settings,
            identities: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &DrainSettings {
        &self.settings
    }

    /// Cached identity for a form, if it was looked up this run
    #[cfg(test)]
    pub fn identity(&self, internal_name: &str) -> Option<&FormIdentity> {
        self.identities.get(internal_name)
    }

    /// Run extract-then-delete passes until the form is drained or a pass fails
    #[tracing::instrument(skip_all, fields(form = %internal_name))]
    pub async fn drain(&mut self, internal_name: &str) -> DrainResult {
        let mut result = DrainResult::new(internal_name);
        let mut previous: Option<HashSet<String>> = None;

        loop {
            if result.passes >= self.settings.max_passes {
                warn!(
                    passes = result.passes,
                    "Pass limit reached before the form was drained"
                );
                return result.finish(TerminationReason::PassLimit);
            }
            result.passes += 1;

            let batch = match self.extractor.extract(internal_name).await {
                Ok(batch) => batch,
                Err(e) => {
                    warn!("Could not read entries: {e}");
                    return result.finish(TerminationReason::ExtractionError);
                }
            };

            if batch.is_empty() {
                info!("No entries to delete");
                return result.finish(TerminationReason::EmptyBatch);
            }

            // Deleted entries must vanish from the listing; a repeat means they did not
            if previous.as_ref().is_some_and(|prev| same_entries(prev, &batch)) {
                if self.settings.dry_run {
                    info!("Dry run: listing unchanged, not re-reading it");
                } else {
                    warn!("Listing unchanged after deleting a full page, stopping");
                }
                return result.finish(TerminationReason::Stalled);
            }

            let Some(form_id) = self.resolve(internal_name).await else {
                warn!(
                    "Could not retrieve form id, {} entries will not be deleted",
                    batch.len()
                );
                return result.finish(TerminationReason::UnresolvedFormId);
            };

            self.delete_batch(&form_id, &batch, &mut result).await;

            if batch.len() < self.settings.page_size {
                info!(
                    deleted = result.entries_deleted,
                    failed = result.entries_failed,
                    "Short page, form drained"
                );
                return result.finish(TerminationReason::PartialBatch);
            }

            debug!("Full page of {} entries, checking for more", batch.len());
            previous = Some(batch.into_iter().collect());
        }
    }

    /// Form id for `internal_name`, looked up at most once per run
    async fn resolve(&mut self, internal_name: &str) -> Option<String> {
        if let Some(identity) = self.identities.get(internal_name) {
            debug!("Using cached identity for '{}'", identity.internal_name);
            return identity.form_id.clone();
        }

        match self.directory.resolve_form_id(internal_name).await {
            Ok(form_id) => {
                if let Some(id) = &form_id {
                    debug!("Resolved form id {id}");
                }
                self.identities.insert(
                    internal_name.to_string(),
                    FormIdentity {
                        internal_name: internal_name.to_string(),
                        form_id: form_id.clone(),
                    },
                );
                form_id
            }
            // Not cached: a later drain of the same form may retry the lookup
            Err(e) => {
                warn!("Form id lookup failed: {e}");
                None
            }
        }
    }

    async fn delete_batch(&self, form_id: &str, batch: &[String], result: &mut DrainResult) {
        for entry_id in batch {
            match self
                .deleter
                .delete_entry(form_id, entry_id, self.settings.dry_run)
                .await
            {
                Ok(DeleteOutcome::Deleted) => result.entries_deleted += 1,
                Ok(DeleteOutcome::Simulated) => result.entries_simulated += 1,
                Err(e)
                    if e.is_missing_target()
                        && self.settings.missing_entries == MissingEntryPolicy::TreatAsDeleted =>
                {
                    debug!(entry = %entry_id, "Entry already gone, counting as deleted");
                    result.entries_deleted += 1;
                }
                Err(e) => {
                    warn!(entry = %entry_id, "Failed to delete entry: {e}");
                    result.entries_failed += 1;
                }
            }
        }
    }
}

/// Same ids regardless of listing order
fn same_entries(previous: &HashSet<String>, batch: &[String]) -> bool {
    batch.len() == previous.len() && batch.iter().all(|id| previous.contains(id))
}
