//! Form directory backed by the rendered listing and the forms API

use super::api::FormsApi;
use super::browser::BrowserSession;
use super::traits::FormDirectory;
use crate::drain::FormSummary;
use crate::error::{ExtractionError, LookupError};
use async_trait::async_trait;

/// Lists forms through the browser and resolves their ids through the API
pub struct SiteDirectory<'a> {
    browser: &'a BrowserSession,
    api: &'a FormsApi,
}

impl<'a> SiteDirectory<'a> {
    pub fn new(browser: &'a BrowserSession, api: &'a FormsApi) -> Self {
        Self { browser, api }
    }
}

#[async_trait]
impl FormDirectory for SiteDirectory<'_> {
    async fn list_forms_with_entries(&self) -> Result<Vec<FormSummary>, ExtractionError> {
        self.browser.list_forms().await
    }

    async fn resolve_form_id(&self, internal_name: &str) -> Result<Option<String>, LookupError> {
        self.api.form_id(internal_name).await
    }
}
