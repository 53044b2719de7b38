//! Configuration handling for the drain tool

use crate::drain::{DrainSettings, MissingEntryPolicy, DEFAULT_MAX_PASSES, DEFAULT_PAGE_SIZE};
use crate::error::SessionError;
use crate::remote::{
    MarkupSelectors, PageTiming, DEFAULT_API_URL, DEFAULT_SITE_URL, DEFAULT_WEBDRIVER_URL,
};
use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Persisted configuration; every field is optional
///
/// The API key is never written here.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DrainConfig {
    /// Origin hosting the rendered forms pages
    pub site_url: Option<String>,
    /// Root of the forms REST API
    pub api_url: Option<String>,
    /// Organisation path under the site origin
    pub base_path: Option<String>,
    /// chromedriver endpoint
    pub webdriver_url: Option<String>,
    /// Chrome user-data directory holding the signed-in profile
    pub chrome_user_data_dir: Option<PathBuf>,
    /// Profile directory inside the user-data directory
    pub chrome_profile: Option<String>,
    pub headless: Option<bool>,
    pub page_size: Option<usize>,
    pub max_passes: Option<usize>,
    pub page_load_timeout_secs: Option<u64>,
    pub element_timeout_secs: Option<u64>,
    pub listing_settle_millis: Option<u64>,
    pub entries_settle_millis: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub missing_entries: Option<MissingEntryPolicy>,
    pub count_selector: Option<String>,
    pub entry_id_selector: Option<String>,
    /// Entries grid body, used to tell an empty grid from one still loading
    pub grid_selector: Option<String>,
    pub row_selector: Option<String>,
}

impl DrainConfig {
    /// Default config file path
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "form-drain", "form-drain")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from `path`, falling back to defaults when absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<Option<PathBuf>> {
        let Some(path) = Self::config_path() else {
            return Ok(None);
        };
        self.save_to(&path)?;
        Ok(Some(path))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }
}

/// Chrome's user-data directory for the current user on this platform
pub fn default_chrome_user_data_dir() -> Option<PathBuf> {
    let dirs = BaseDirs::new()?;
    let path = if cfg!(target_os = "windows") {
        dirs.data_local_dir().join("Google").join("Chrome").join("User Data")
    } else if cfg!(target_os = "macos") {
        dirs.data_dir().join("Google").join("Chrome")
    } else {
        dirs.config_dir().join("google-chrome")
    };
    Some(path)
}

/// Fully merged options for one run
///
/// Values the operator may still be prompted for stay optional.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub site_url: String,
    pub api_url: String,
    pub webdriver_url: String,
    pub base_path: Option<String>,
    pub api_key: Option<String>,
    pub chrome_user_data_dir: Option<PathBuf>,
    pub chrome_profile: Option<String>,
    pub headless: bool,
    pub skip_login_gate: bool,
    pub drain: DrainSettings,
    pub timing: PageTiming,
    pub request_timeout: Duration,
    pub selectors: MarkupSelectors,
}

impl RunOptions {
    /// Fill every unset value from the config file, then from built-in defaults
    pub fn from_config(config: &DrainConfig) -> Self {
        let defaults = PageTiming::default();
        let secs = |v: Option<u64>, d: Duration| v.map(Duration::from_secs).unwrap_or(d);
        let millis = |v: Option<u64>, d: Duration| v.map(Duration::from_millis).unwrap_or(d);
        let selectors = MarkupSelectors::default();
        let selector = |v: &Option<String>, d: String| v.clone().unwrap_or(d);

        Self {
            site_url: config
                .site_url
                .clone()
                .unwrap_or_else(|| DEFAULT_SITE_URL.to_string()),
            api_url: config
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            webdriver_url: config
                .webdriver_url
                .clone()
                .unwrap_or_else(|| DEFAULT_WEBDRIVER_URL.to_string()),
            base_path: config.base_path.clone(),
            api_key: None,
            chrome_user_data_dir: config.chrome_user_data_dir.clone(),
            chrome_profile: config.chrome_profile.clone(),
            headless: config.headless.unwrap_or(false),
            skip_login_gate: false,
            drain: DrainSettings {
                page_size: config.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
                max_passes: config.max_passes.unwrap_or(DEFAULT_MAX_PASSES),
                dry_run: false,
                missing_entries: config.missing_entries.unwrap_or_default(),
            },
            timing: PageTiming {
                page_load: secs(config.page_load_timeout_secs, defaults.page_load),
                element_wait: secs(config.element_timeout_secs, defaults.element_wait),
                listing_settle: millis(config.listing_settle_millis, defaults.listing_settle),
                entries_settle: millis(config.entries_settle_millis, defaults.entries_settle),
            },
            request_timeout: secs(config.request_timeout_secs, Duration::from_secs(30)),
            selectors: MarkupSelectors {
                count: selector(&config.count_selector, selectors.count),
                entry_id: selector(&config.entry_id_selector, selectors.entry_id),
                grid: selector(&config.grid_selector, selectors.grid),
                row: selector(&config.row_selector, selectors.row),
            },
        }
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.drain.page_size == 0 {
            return Err(SessionError::Config("page size must be at least 1".into()));
        }
        if self.drain.max_passes == 0 {
            return Err(SessionError::Config("max passes must be at least 1".into()));
        }
        Ok(())
    }

    /// Non-secret options in their persisted form
    pub fn to_config(&self) -> DrainConfig {
        DrainConfig {
            site_url: Some(self.site_url.clone()),
            api_url: Some(self.api_url.clone()),
            base_path: self.base_path.clone(),
            webdriver_url: Some(self.webdriver_url.clone()),
            chrome_user_data_dir: self.chrome_user_data_dir.clone(),
            chrome_profile: self.chrome_profile.clone(),
            headless: Some(self.headless),
            page_size: Some(self.drain.page_size),
            max_passes: Some(self.drain.max_passes),
            page_load_timeout_secs: Some(self.timing.page_load.as_secs()),
            element_timeout_secs: Some(self.timing.element_wait.as_secs()),
            listing_settle_millis: Some(self.timing.listing_settle.as_millis() as u64),
            entries_settle_millis: Some(self.timing.entries_settle.as_millis() as u64),
            request_timeout_secs: Some(self.request_timeout.as_secs()),
            missing_entries: Some(self.drain.missing_entries),
            count_selector: Some(self.selectors.count.clone()),
            entry_id_selector: Some(self.selectors.entry_id.clone()),
            grid_selector: Some(self.selectors.grid.clone()),
            row_selector: Some(self.selectors.row.clone()),
        }
    }
}
