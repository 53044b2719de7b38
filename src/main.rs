//! form-drain - removes every submitted entry from a site's hosted forms
//!
//! Forms and their entry ids are read from the rendered pages through a
//! signed-in browser; deletions go through the forms REST API.

mod cli;
mod config;
mod drain;
mod error;
mod prompt;
mod remote;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::Cli;
use config::{default_chrome_user_data_dir, DrainConfig, RunOptions};
use drain::{DrainEngine, Orchestrator, RunSummary};
use remote::{BrowserSession, ChromeProfile, FormsApi, PageMarkup, SiteDirectory, SiteUrls};
use std::io;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "form_drain=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => DrainConfig::load_from(path)?,
        None => DrainConfig::load()?,
    };

    let mut options = cli.resolve(&config);
    collect_missing(&mut options)?;
    options.validate()?;

    if cli.save_config {
        save_options(&cli, &options)?;
    }

    let summary = match run(&options).await {
        Ok(summary) => summary,
        Err(err) => {
            eprintln!("Error: {err:?}");
            std::process::exit(1);
        }
    };

    print!("{summary}");
    if summary.has_problems() {
        std::process::exit(2);
    }
    Ok(())
}

/// Prompt for anything neither the flags nor the config file supplied
fn collect_missing(options: &mut RunOptions) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    if options.api_key.is_none() {
        options.api_key = prompt::ask_required(&mut input, &mut output, "Forms API key", None)?;
        if options.api_key.is_none() {
            bail!("an API key is required");
        }
    }

    if options.base_path.is_none() {
        options.base_path =
            prompt::ask_required(&mut input, &mut output, "Base path for the forms site", None)?;
        if options.base_path.is_none() {
            bail!("a base path is required");
        }
    }

    if options.chrome_user_data_dir.is_none() {
        let detected = default_chrome_user_data_dir().map(|p| p.display().to_string());
        let answer = prompt::ask_required(
            &mut input,
            &mut output,
            "Chrome user-data directory",
            detected.as_deref(),
        )?
        .context("a Chrome user-data directory is required")?;
        options.chrome_user_data_dir = Some(answer.into());
    }

    if options.chrome_profile.is_none() {
        options.chrome_profile = prompt::ask_required(
            &mut input,
            &mut output,
            "Chrome profile directory (e.g. 'Default')",
            None,
        )?;
        if options.chrome_profile.is_none() {
            bail!("a Chrome profile directory is required");
        }
    }

    Ok(())
}

fn save_options(cli: &Cli, options: &RunOptions) -> Result<()> {
    let persisted = options.to_config();
    let saved = match &cli.config {
        Some(path) => {
            persisted.save_to(path)?;
            Some(path.clone())
        }
        None => persisted.save()?,
    };
    match saved {
        Some(path) => info!("Saved configuration to {}", path.display()),
        None => info!("No config directory available, configuration not saved"),
    }
    Ok(())
}

/// Set up both sessions, drain every form and always close the browser
async fn run(options: &RunOptions) -> Result<RunSummary> {
    let base_path = options.base_path.as_deref().context("base path missing")?;
    let api_key = options.api_key.as_deref().context("API key missing")?;
    let user_data_dir = options
        .chrome_user_data_dir
        .clone()
        .context("Chrome user-data directory missing")?;
    let profile_directory = options
        .chrome_profile
        .clone()
        .context("Chrome profile missing")?;

    let site = SiteUrls::new(&options.site_url, base_path)?;
    let markup = PageMarkup::new(&options.selectors)?;
    let api = FormsApi::new(&options.api_url, api_key, options.request_timeout)?;
    let profile = ChromeProfile {
        user_data_dir,
        profile_directory,
        headless: options.headless,
    };

    let browser = BrowserSession::connect(
        &options.webdriver_url,
        &profile,
        site,
        options.timing.clone(),
        markup,
    )
    .await
    .context("starting the browser session")?;

    let outcome = drain_site(&browser, &api, options).await;
    browser.close().await;
    outcome
}

async fn drain_site(
    browser: &BrowserSession,
    api: &FormsApi,
    options: &RunOptions,
) -> Result<RunSummary> {
    browser
        .open_home()
        .await
        .context("opening the forms home page")?;

    if !options.skip_login_gate {
        let confirmed = tokio::task::spawn_blocking(|| {
            let stdin = io::stdin();
            prompt::await_login_confirmation(&mut stdin.lock(), &mut io::stdout())
        })
        .await??;
        if !confirmed {
            bail!("sign-in was not confirmed");
        }
        info!("Sign-in confirmed, starting");
    }

    let directory = SiteDirectory::new(browser, api);
    let engine = DrainEngine::new(browser, &directory, api, options.drain.clone());
    let mut orchestrator = Orchestrator::new(&directory, engine);

    orchestrator
        .run()
        .await
        .context("reading the forms listing")
}
