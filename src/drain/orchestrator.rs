//! Runs the drain engine over every form that has entries

use super::engine::DrainEngine;
use super::summary::RunSummary;
use crate::error::ExtractionError;
use crate::remote::FormDirectory;
use tracing::{debug, info, info_span, Instrument};

/// Sequences draining across forms, one form at a time
pub struct Orchestrator<'a> {
    directory: &'a dyn FormDirectory,
    engine: DrainEngine<'a>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(directory: &'a dyn FormDirectory, engine: DrainEngine<'a>) -> Self {
        Self { directory, engine }
    }

    /// Discover forms and drain each in discovery order
    ///
    /// Only a failure to read the forms listing aborts the run; per-form
    /// problems end up in the summary.
    pub async fn run(&mut self) -> Result<RunSummary, ExtractionError> {
        let mut summary = RunSummary::start(self.engine.settings().dry_run);
        let span = info_span!("run", run_id = %summary.run_id);
        self.drain_all(&mut summary).instrument(span).await?;
        summary.finish();
        Ok(summary)
    }

    async fn drain_all(&mut self, summary: &mut RunSummary) -> Result<(), ExtractionError> {
        if summary.dry_run {
            info!("Dry run: no entries will be deleted");
        }

        let forms = self.directory.list_forms_with_entries().await?;
        info!("Found {} forms with entries", forms.len());

        for form in forms {
            if form.entry_count == 0 {
                debug!("Skipping form '{}' with no entries", form.internal_name);
                summary.skipped.push(form.internal_name);
                continue;
            }

            info!(
                "Processing form '{}' ({} entries listed)",
                form.internal_name, form.entry_count
            );
            let result = self.engine.drain(&form.internal_name).await;
            info!(
                deleted = result.entries_deleted,
                failed = result.entries_failed,
                "Finished form '{}': {}",
                result.internal_name,
                result.termination_reason
            );
            summary.results.push(result);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drain::{DrainSettings, FormSummary, TerminationReason};
    use crate::remote::{DeleteOutcome, MockDeletionClient, MockEntryExtractor, MockFormDirectory};
    use pretty_assertions::assert_eq;

    fn page(prefix: &str, len: usize) -> Vec<String> {
        (0..len).map(|i| format!("{prefix}-{i}")).collect()
    }

    #[tokio::test]
    async fn test_zero_count_forms_are_never_drained() {
        let mut directory = MockFormDirectory::new();
        directory.expect_list_forms_with_entries().times(1).returning(|| {
            Ok(vec![
                FormSummary::new("Empty", 0),
                FormSummary::new("Contact", 3),
            ])
        });
        directory
            .expect_resolve_form_id()
            .times(1)
            .returning(|name| Ok(Some(format!("id-{name}"))));

        let mut extractor = MockEntryExtractor::new();
        extractor.expect_extract().times(1).returning(|name| {
            assert_eq!(name, "Contact");
            Ok(page(name, 3))
        });
        let mut deleter = MockDeletionClient::new();
        deleter
            .expect_delete_entry()
            .times(3)
            .returning(|_, _, _| Ok(DeleteOutcome::Deleted));

        let engine = DrainEngine::new(&extractor, &directory, &deleter, DrainSettings::default());
        let mut orchestrator = Orchestrator::new(&directory, engine);
        let summary = orchestrator.run().await.unwrap();

        assert_eq!(summary.skipped, vec!["Empty".to_string()]);
        assert_eq!(summary.results.len(), 1);
        assert_eq!(summary.results[0].internal_name, "Contact");
        assert_eq!(summary.total_deleted(), 3);
        assert!(summary.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_one_bad_form_does_not_stop_the_run() {
        let mut directory = MockFormDirectory::new();
        directory.expect_list_forms_with_entries().returning(|| {
            Ok(vec![
                FormSummary::new("Ghost", 4),
                FormSummary::new("Contact", 2),
            ])
        });
        directory.expect_resolve_form_id().returning(|name| {
            Ok(if name == "Contact" {
                Some("7".to_string())
            } else {
                None
            })
        });

        let mut extractor = MockEntryExtractor::new();
        extractor
            .expect_extract()
            .times(2)
            .returning(|name| Ok(page(name, if name == "Ghost" { 4 } else { 2 })));
        let mut deleter = MockDeletionClient::new();
        deleter
            .expect_delete_entry()
            .times(2)
            .returning(|form_id, _, _| {
                assert_eq!(form_id, "7");
                Ok(DeleteOutcome::Deleted)
            });

        let engine = DrainEngine::new(&extractor, &directory, &deleter, DrainSettings::default());
        let mut orchestrator = Orchestrator::new(&directory, engine);
        let summary = orchestrator.run().await.unwrap();

        let reasons: Vec<_> = summary
            .results
            .iter()
            .map(|r| (r.internal_name.as_str(), r.termination_reason))
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("Ghost", TerminationReason::UnresolvedFormId),
                ("Contact", TerminationReason::PartialBatch),
            ]
        );
        assert!(summary.has_problems());
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_run() {
        let mut directory = MockFormDirectory::new();
        directory.expect_list_forms_with_entries().returning(|| {
            Err(ExtractionError::Navigation {
                url: "https://example.test/acme/".into(),
                message: "net::ERR_NAME_NOT_RESOLVED".into(),
            })
        });
        let extractor = MockEntryExtractor::new();
        let deleter = MockDeletionClient::new();

        let engine = DrainEngine::new(&extractor, &directory, &deleter, DrainSettings::default());
        let mut orchestrator = Orchestrator::new(&directory, engine);

        let err = orchestrator.run().await.unwrap_err();
        assert!(matches!(err, ExtractionError::Navigation { .. }));
    }

    #[tokio::test]
    async fn test_no_forms_is_an_empty_clean_run() {
        let mut directory = MockFormDirectory::new();
        directory
            .expect_list_forms_with_entries()
            .returning(|| Ok(Vec::new()));
        let extractor = MockEntryExtractor::new();
        let deleter = MockDeletionClient::new();

        let engine = DrainEngine::new(&extractor, &directory, &deleter, DrainSettings::default());
        let summary = Orchestrator::new(&directory, engine).run().await.unwrap();

        assert!(summary.results.is_empty());
        assert!(!summary.has_problems());
    }
}
