//! REST client for the forms API
//!
//! Lists forms to map internal names onto API ids and deletes single
//! entries. Authentication is a bearer key fixed when the client is built.

use super::traits::{DeleteOutcome, DeletionClient};
use crate::error::{DeleteError, LookupError, SessionError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default API root
pub const DEFAULT_API_URL: &str = "https://www.cognitoforms.com/api";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// A form as returned by `GET /forms`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiForm {
    #[serde(default)]
    pub internal_name: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
}

impl ApiForm {
    /// The id as an opaque string, whether the API sent a number or a string
    pub fn id_string(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Case-insensitive lookup of a form id by internal name
pub fn find_form_id(forms: &[ApiForm], internal_name: &str) -> Option<String> {
    let wanted = internal_name.to_lowercase();
    forms
        .iter()
        .filter(|form| {
            form.internal_name
                .as_deref()
                .is_some_and(|name| name.to_lowercase() == wanted)
        })
        .find_map(ApiForm::id_string)
}

/// Client for the forms REST API
pub struct FormsApi {
    http: reqwest::Client,
    base_url: Url,
}

impl FormsApi {
    /// Build a client carrying the bearer key on every request
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, SessionError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| SessionError::Config(format!("invalid API URL {base_url:?}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(SessionError::Config(format!(
                "API URL {parsed} cannot hold a path"
            )));
        }

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| SessionError::InvalidCredential)?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    /// API root plus `segments`, each percent-encoded as a single path segment
    fn url_with(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn forms_url(&self) -> Url {
        self.url_with(&["forms"])
    }

    fn entry_url(&self, form_id: &str, entry_id: &str) -> Url {
        self.url_with(&["forms", form_id, "entries", entry_id])
    }

    /// Fetch every form the API key can see
    pub async fn list_forms(&self) -> Result<Vec<ApiForm>, LookupError> {
        let response = self
            .http
            .get(self.forms_url())
            .send()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Vec<ApiForm>>()
            .await
            .map_err(|e| LookupError::Decode(e.to_string()))
    }

    /// Resolve an internal name against the API's form list
    pub async fn form_id(&self, internal_name: &str) -> Result<Option<String>, LookupError> {
        let forms = self.list_forms().await?;
        let id = find_form_id(&forms, internal_name);
        if id.is_none() {
            warn!("Form with internal name '{internal_name}' not found via API");
        }
        Ok(id)
    }
}

#[async_trait]
impl DeletionClient for FormsApi {
    async fn delete_entry(
        &self,
        form_id: &str,
        entry_id: &str,
        dry_run: bool,
    ) -> Result<DeleteOutcome, DeleteError> {
        if dry_run {
            info!("[dry run] would delete entry {entry_id} from form {form_id}");
            return Ok(DeleteOutcome::Simulated);
        }

        let response = self
            .http
            .delete(self.entry_url(form_id, entry_id))
            .send()
            .await
            .map_err(|e| DeleteError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            debug!("Deleted entry {entry_id} from form {form_id}");
            return Ok(DeleteOutcome::Deleted);
        }

        let body = response.text().await.unwrap_or_default();
        Err(DeleteError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
