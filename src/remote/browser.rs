//! WebDriver session for the rendered forms pages
//!
//! The entries of a form are only reachable through the rendered entries
//! grid, so extraction drives a real browser that reuses the operator's
//! signed-in Chrome profile.

use super::markup::PageMarkup;
use super::traits::EntryExtractor;
use crate::drain::{EntryBatch, FormSummary};
use crate::error::{ExtractionError, SessionError};
use async_trait::async_trait;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default site origin
pub const DEFAULT_SITE_URL: &str = "https://www.cognitoforms.com";
/// Default chromedriver endpoint
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// URLs of the rendered pages under one organisation base path
#[derive(Debug, Clone)]
pub struct SiteUrls {
    origin: Url,
    base_path: String,
}

impl SiteUrls {
    pub fn new(origin: &str, base_path: &str) -> Result<Self, SessionError> {
        let origin = Url::parse(origin)
            .map_err(|e| SessionError::Config(format!("invalid site URL {origin:?}: {e}")))?;
        if origin.cannot_be_a_base() {
            return Err(SessionError::Config(format!(
                "site URL {origin} cannot hold a path"
            )));
        }
        let base_path = base_path.trim_matches('/').to_string();
        if base_path.is_empty() {
            return Err(SessionError::Config("base path is empty".into()));
        }
        Ok(Self { origin, base_path })
    }

    fn with_segments(&self, extra: &[&str]) -> String {
        let mut url = self.origin.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.clear();
            segments.extend(self.base_path.split('/'));
            segments.extend(extra);
        }
        url.to_string()
    }

    /// Listing page for every form under the base path
    pub fn home(&self) -> String {
        self.with_segments(&[""])
    }

    /// First page of all entries of one form
    pub fn entries(&self, internal_name: &str) -> String {
        self.with_segments(&[internal_name, "entries", "1-all-entries"])
    }
}

/// Timeouts and settle delays for page loads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTiming {
    pub page_load: Duration,
    pub element_wait: Duration,
    /// Pause after the listing badge appears, before reading the page
    pub listing_settle: Duration,
    /// Pause after the entries grid appears, before reading the page
    pub entries_settle: Duration,
}

impl Default for PageTiming {
    fn default() -> Self {
        Self {
            page_load: Duration::from_secs(60),
            element_wait: Duration::from_secs(60),
            listing_settle: Duration::from_secs(5),
            entries_settle: Duration::from_secs(3),
        }
    }
}

/// How to start Chrome
#[derive(Debug, Clone)]
pub struct ChromeProfile {
    pub user_data_dir: PathBuf,
    pub profile_directory: String,
    pub headless: bool,
}

impl ChromeProfile {
    /// Command-line switches passed through `goog:chromeOptions`
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--user-data-dir={}", self.user_data_dir.display()),
            format!("--profile-directory={}", self.profile_directory),
            "--disable-gpu".to_string(),
            "--window-size=1920,1080".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--log-level=3".to_string(),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args
    }

    fn capabilities(&self) -> Map<String, Value> {
        let mut caps = Map::new();
        caps.insert("browserName".into(), json!("chrome"));
        caps.insert("goog:chromeOptions".into(), json!({ "args": self.args() }));
        caps
    }
}

/// An open browser bound to one site
pub struct BrowserSession {
    client: Client,
    site: SiteUrls,
    timing: PageTiming,
    markup: PageMarkup,
}

impl BrowserSession {
    /// Start a WebDriver session; failure here is fatal for the run
    pub async fn connect(
        webdriver_url: &str,
        profile: &ChromeProfile,
        site: SiteUrls,
        timing: PageTiming,
        markup: PageMarkup,
    ) -> Result<Self, SessionError> {
        let client = ClientBuilder::native()
            .capabilities(profile.capabilities())
            .connect(webdriver_url)
            .await
            .map_err(|e| SessionError::WebDriver {
                url: webdriver_url.to_string(),
                message: e.to_string(),
            })?;

        client
            .update_timeouts(TimeoutConfiguration::new(None, Some(timing.page_load), None))
            .await
            .map_err(|e| SessionError::WebDriver {
                url: webdriver_url.to_string(),
                message: e.to_string(),
            })?;

        info!("WebDriver session started at {webdriver_url}");
        Ok(Self {
            client,
            site,
            timing,
            markup,
        })
    }

    /// Navigate to the forms home page, where the operator signs in
    pub async fn open_home(&self) -> Result<(), ExtractionError> {
        let url = self.site.home();
        info!("Opening {url}");
        self.goto(&url).await
    }

    async fn goto(&self, url: &str) -> Result<(), ExtractionError> {
        self.client
            .goto(url)
            .await
            .map_err(|e| ExtractionError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    /// Load a page, wait for `ready`, let it settle and return its source
    async fn load(
        &self,
        url: &str,
        ready: &str,
        settle: Duration,
    ) -> Result<String, ExtractionError> {
        self.goto(url).await?;

        self.client
            .wait()
            .at_most(self.timing.element_wait)
            .for_element(Locator::Css(ready))
            .await
            .map_err(|e| {
                debug!("Wait for {ready} on {url} failed: {e}");
                ExtractionError::Timeout {
                    url: url.to_string(),
                    selector: ready.to_string(),
                    waited: self.timing.element_wait,
                }
            })?;

        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }

        self.source().await
    }

    async fn source(&self) -> Result<String, ExtractionError> {
        self.client
            .source()
            .await
            .map_err(|e| ExtractionError::Markup(e.to_string()))
    }

    /// Forms with entries according to the rendered listing
    pub async fn list_forms(&self) -> Result<Vec<FormSummary>, ExtractionError> {
        let url = self.site.home();
        let html = self
            .load(&url, self.markup.listing_ready(), self.timing.listing_settle)
            .await?;
        let forms = self.markup.parse_form_listing(&html);
        if forms.is_empty() {
            warn!("No forms with entries found at {url}");
        }
        Ok(forms)
    }

    /// Close the browser window and end the WebDriver session
    pub async fn close(self) {
        if let Err(e) = self.client.close().await {
            warn!("Failed to close WebDriver session: {e}");
        } else {
            info!("WebDriver session closed");
        }
    }
}

#[async_trait]
impl EntryExtractor for BrowserSession {
    async fn extract(&self, internal_name: &str) -> Result<EntryBatch, ExtractionError> {
        let url = self.site.entries(internal_name);
        debug!("Navigating to entries page {url}");
        let html = match self
            .load(&url, self.markup.entries_ready(), self.timing.entries_settle)
            .await
        {
            Ok(html) => html,
            Err(err @ ExtractionError::Timeout { .. }) => {
                // No id cell ever appeared; only a rendered grid without rows means drained
                let html = self.source().await?;
                if self.markup.shows_empty_grid(&html) {
                    info!("No entries left for form '{internal_name}'");
                    return Ok(EntryBatch::new());
                }
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        let batch = self.markup.parse_entry_ids(&html);
        info!("Found {} entries for form '{internal_name}'", batch.len());
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn site() -> SiteUrls {
        SiteUrls::new(DEFAULT_SITE_URL, "/acme/").unwrap()
    }

    mod urls {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_home_has_trailing_slash() {
            assert_eq!(site().home(), "https://www.cognitoforms.com/acme/");
        }

        #[test]
        fn test_entries_url() {
            assert_eq!(
                site().entries("ContactUs"),
                "https://www.cognitoforms.com/acme/ContactUs/entries/1-all-entries"
            );
        }

        #[test]
        fn test_internal_name_is_escaped() {
            let url = site().entries("a b");
            assert!(url.contains("/acme/a%20b/entries/"), "{url}");
        }

        #[test]
        fn test_nested_base_path() {
            let site = SiteUrls::new("https://forms.example.test", "org/team").unwrap();
            assert_eq!(site.home(), "https://forms.example.test/org/team/");
        }

        #[test]
        fn test_empty_base_path_rejected() {
            assert!(matches!(
                SiteUrls::new(DEFAULT_SITE_URL, "//"),
                Err(SessionError::Config(_))
            ));
        }

        #[test]
        fn test_bad_origin_rejected() {
            assert!(SiteUrls::new("not a url", "acme").is_err());
            assert!(SiteUrls::new("mailto:ops@example.test", "acme").is_err());
        }
    }

    #[test]
    fn test_chrome_args_reuse_profile() {
        let profile = ChromeProfile {
            user_data_dir: PathBuf::from("/home/ops/.config/google-chrome"),
            profile_directory: "Profile 2".into(),
            headless: false,
        };
        let args = profile.args();
        assert_eq!(args[0], "--user-data-dir=/home/ops/.config/google-chrome");
        assert_eq!(args[1], "--profile-directory=Profile 2");
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
    }

    #[test]
    fn test_headless_adds_switch() {
        let profile = ChromeProfile {
            user_data_dir: PathBuf::from("/tmp/chrome"),
            profile_directory: "Default".into(),
            headless: true,
        };
        let caps = profile.capabilities();
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless=new"));
        assert_eq!(caps["browserName"], "chrome");
    }
}
