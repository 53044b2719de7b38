//! Remote collaborators: the browser session, the forms API and their seams

mod api;
mod browser;
mod directory;
mod markup;
mod traits;

pub use api::{FormsApi, DEFAULT_API_URL};
pub use browser::{
    BrowserSession, ChromeProfile, PageTiming, SiteUrls, DEFAULT_SITE_URL, DEFAULT_WEBDRIVER_URL,
};
pub use directory::SiteDirectory;
pub use markup::{MarkupSelectors, PageMarkup};
pub use traits::{DeleteOutcome, DeletionClient, EntryExtractor, FormDirectory};

#[cfg(test)]
pub use traits::{MockDeletionClient, MockEntryExtractor, MockFormDirectory};
