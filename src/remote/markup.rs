//! HTML parsing for the rendered forms listing and entries pages

use crate::drain::{EntryBatch, FormSummary};
use crate::error::ExtractionError;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Default selector for the entry-count badge inside a form link
pub const DEFAULT_COUNT_SELECTOR: &str = "span.total-entries";
/// Default selector for entry-id cells on the entries grid
pub const DEFAULT_ENTRY_ID_SELECTOR: &str = "div.slick-cell.l1.r1.c-id";
/// Default selector for the entries grid body, present with or without rows
pub const DEFAULT_GRID_SELECTOR: &str = "div.slick-viewport";
/// Default selector for one rendered grid row
pub const DEFAULT_ROW_SELECTOR: &str = "div.slick-row";

/// CSS selectors used to read both pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupSelectors {
    pub count: String,
    pub entry_id: String,
    pub grid: String,
    pub row: String,
}

impl Default for MarkupSelectors {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT_SELECTOR.to_string(),
            entry_id: DEFAULT_ENTRY_ID_SELECTOR.to_string(),
            grid: DEFAULT_GRID_SELECTOR.to_string(),
            row: DEFAULT_ROW_SELECTOR.to_string(),
        }
    }
}

/// Compiled selectors for both pages
#[derive(Debug, Clone)]
pub struct PageMarkup {
    link: Selector,
    count: Selector,
    entry_id: Selector,
    grid: Selector,
    row: Selector,
    listing_ready: String,
    entries_ready: String,
}

impl PageMarkup {
    pub fn new(selectors: &MarkupSelectors) -> Result<Self, ExtractionError> {
        Ok(Self {
            link: parse_selector("a[href]")?,
            count: parse_selector(&selectors.count)?,
            entry_id: parse_selector(&selectors.entry_id)?,
            grid: parse_selector(&selectors.grid)?,
            row: parse_selector(&selectors.row)?,
            listing_ready: format!("a[href] {}", selectors.count),
            entries_ready: selectors.entry_id.clone(),
        })
    }

    /// Selector whose presence marks the listing as rendered
    pub fn listing_ready(&self) -> &str {
        &self.listing_ready
    }

    /// Selector whose presence marks the entries grid as holding rows
    ///
    /// An empty grid never matches; see [`PageMarkup::shows_empty_grid`].
    pub fn entries_ready(&self) -> &str {
        &self.entries_ready
    }

    /// Forms with a positive entry count, in page order, without duplicates
    pub fn parse_form_listing(&self, html: &str) -> Vec<FormSummary> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut forms = Vec::new();

        for link in document.select(&self.link) {
            let Some(badge) = link.select(&self.count).next() else {
                continue;
            };
            let text = element_text(badge);
            let entry_count: u64 = match text.parse() {
                Ok(count) => count,
                Err(_) => {
                    warn!("Unable to parse entry count {text:?} for a form, skipping");
                    continue;
                }
            };
            if entry_count == 0 {
                continue;
            }

            let href = link.value().attr("href").unwrap_or_default();
            let Some(internal_name) = internal_name_from_href(href) else {
                debug!("Form link {href:?} has no internal name segment");
                continue;
            };
            if !seen.insert(internal_name.to_string()) {
                continue;
            }

            debug!("Found form {internal_name} with {entry_count} entries");
            forms.push(FormSummary::new(internal_name, entry_count));
        }

        forms
    }

    /// Entry ids in grid order, empty cells dropped
    pub fn parse_entry_ids(&self, html: &str) -> EntryBatch {
        let document = Html::parse_document(html);
        document
            .select(&self.entry_id)
            .map(element_text)
            .filter(|id| !id.is_empty())
            .collect()
    }

    /// True only when the grid itself rendered and holds no rows at all
    ///
    /// A page that has not rendered its grid yet is not empty.
    pub fn shows_empty_grid(&self, html: &str) -> bool {
        let document = Html::parse_document(html);
        let mut grids = document.select(&self.grid).peekable();
        grids.peek().is_some() && grids.all(|grid| grid.select(&self.row).next().is_none())
    }
}

fn parse_selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::Markup(format!("bad selector `{css}`: {e:?}")))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Second path segment of a `/<org>/<InternalName>` link
fn internal_name_from_href(href: &str) -> Option<&str> {
    let mut parts = href.trim_matches('/').split('/');
    parts.next()?;
    parts.next().filter(|name| !name.is_empty())
}
