//! Command-line flags

use crate::config::{DrainConfig, RunOptions};
use crate::drain::MissingEntryPolicy;
use clap::Parser;
use std::path::PathBuf;

/// Delete every submitted entry from the forms under one organisation
#[derive(Debug, Default, Parser)]
#[command(name = "form-drain", version, about)]
pub struct Cli {
    /// Log what would be deleted without deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Organisation path under the site, e.g. `acme`
    #[arg(long, env = "FORM_DRAIN_BASE_PATH")]
    pub base_path: Option<String>,

    /// Bearer key for the forms API
    #[arg(long, env = "FORM_DRAIN_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Chrome profile directory, e.g. `Default`
    #[arg(long)]
    pub profile: Option<String>,

    /// Chrome user-data directory holding the profile
    #[arg(long)]
    pub user_data_dir: Option<PathBuf>,

    /// chromedriver endpoint
    #[arg(long, env = "FORM_DRAIN_WEBDRIVER_URL")]
    pub webdriver_url: Option<String>,

    /// Origin hosting the forms pages
    #[arg(long)]
    pub site_url: Option<String>,

    /// Root of the forms REST API
    #[arg(long)]
    pub api_url: Option<String>,

    /// Entries shown per rendered page
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Upper bound on extract-then-delete passes per form
    #[arg(long)]
    pub max_passes: Option<usize>,

    /// How entries the API reports as already gone are counted
    #[arg(long, value_enum)]
    pub missing_entries: Option<MissingEntryPolicy>,

    /// Run Chrome without a window
    #[arg(long)]
    pub headless: bool,

    /// Skip the manual sign-in confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Persist the effective non-secret options to the config file
    #[arg(long)]
    pub save_config: bool,

    /// Read options from this file instead of the default config path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Layer flags over the config file values
    pub fn resolve(&self, config: &DrainConfig) -> RunOptions {
        let mut options = RunOptions::from_config(config);

        if let Some(v) = &self.site_url {
            options.site_url = v.clone();
        }
        if let Some(v) = &self.api_url {
            options.api_url = v.clone();
        }
        if let Some(v) = &self.webdriver_url {
            options.webdriver_url = v.clone();
        }
        if let Some(v) = &self.base_path {
            options.base_path = Some(v.clone());
        }
        if let Some(v) = &self.user_data_dir {
            options.chrome_user_data_dir = Some(v.clone());
        }
        if let Some(v) = &self.profile {
            options.chrome_profile = Some(v.clone());
        }
        if let Some(v) = self.page_size {
            options.drain.page_size = v;
        }
        if let Some(v) = self.max_passes {
            options.drain.max_passes = v;
        }
        if let Some(v) = self.missing_entries {
            options.drain.missing_entries = v;
        }
        options.api_key = self.api_key.clone().filter(|k| !k.trim().is_empty());
        options.headless |= self.headless;
        options.drain.dry_run = self.dry_run;
        options.skip_login_gate = self.yes;
        options
    }
}
