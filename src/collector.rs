use crate::error::{CollectError, ScrapeError};
use crate::extractor::extract_offers;
use crate::fetcher::{fetch_body, PageFetcher};
use crate::filter::filter;
use crate::models::{ResultSet, SearchQuery};
use crate::query::build_url;
use crate::structured_data::extract_json_ld;
use crate::tui::ScraperTUI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_PAGES: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    /// Upper bound on pages fetched in one run.
    pub max_pages: u32,
    /// Apply the name/price filter to each page before merging.
    pub filter_by_name: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            filter_by_name: false,
        }
    }
}

/// Accumulated result of a collection run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionState {
    pub offers: ResultSet,
    pub pages_fetched: u32,
    /// Last page number that was fetched, 0 before the first page.
    pub last_page: u32,
}

/// Merges one page into the state. First occurrence of a url wins.
pub fn accumulate(mut state: CollectionState, page: u32, page_offers: ResultSet) -> CollectionState {
    state.offers.merge(page_offers);
    state.pages_fetched += 1;
    state.last_page = page;
    state
}

/// Continue while the last merge grew the set and the page budget is not spent.
pub fn should_continue(previous_len: usize, state: &CollectionState, max_pages: u32) -> bool {
    if state.offers.len() == previous_len {
        return false;
    }
    state.pages_fetched < max_pages.max(1)
}

pub struct Collector<F: PageFetcher> {
    fetcher: F,
    cancel: Option<Arc<AtomicBool>>,
}

impl<F: PageFetcher> Collector<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher, cancel: None }
    }

    /// The run stops before the next page once `flag` is set.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetches and extracts the single page `query.page`.
    pub fn fetch_page_offers(&self, query: &SearchQuery) -> Result<ResultSet, ScrapeError> {
        let url = build_url(query);
        let body = fetch_body(&self.fetcher, &url)?;
        let data = extract_json_ld(&body)?;
        extract_offers(&data, query.page)
    }

    /// Collects offers page by page, returning them sorted by price.
    pub fn collect(
        &self,
        query: &SearchQuery,
        options: &CollectOptions,
        tui: Option<&mut ScraperTUI>,
    ) -> Result<ResultSet, CollectError> {
        self.run(query, options, tui).map(|state| state.offers)
    }

    pub fn run(
        &self,
        query: &SearchQuery,
        options: &CollectOptions,
        mut tui: Option<&mut ScraperTUI>,
    ) -> Result<CollectionState, CollectError> {
        let label = query.label();
        info!("Collecting offers for {} (max {} pages)", label, options.max_pages);

        if let Some(tui) = tui.as_mut() {
            if let Err(e) = tui.start_collection(&label, options.max_pages) {
                debug!("Progress output failed: {}", e);
            }
        }

        let mut state = CollectionState::default();
        let mut page = query.page.max(1);

        loop {
            // Cancellation is only honoured between pages
            if self.is_cancelled() {
                info!("Collection for {} cancelled before page {}", label, page);
                return Err(abort(state, page, ScrapeError::Cancelled));
            }

            let page_offers = match self.fetch_page_offers(&query.with_page(page)) {
                Ok(offers) => offers,
                Err(source) => {
                    warn!("Page {} of {} failed: {}", page, label, source);
                    if let Some(tui) = tui.as_mut() {
                        if let Err(e) = tui.report_failure(page, &source.to_string()) {
                            debug!("Progress output failed: {}", e);
                        }
                    }
                    return Err(abort(state, page, source));
                }
            };

            // Filter before merging so stagnation is judged on matching offers
            let found = page_offers.len();
            let page_offers = if options.filter_by_name {
                filter(&page_offers, &query.model, query.max_price)
            } else {
                page_offers
            };

            let previous_len = state.offers.len();
            state = accumulate(state, page, page_offers);
            let added = state.offers.len() - previous_len;

            debug!(
                "Page {}: {} offers, {} new, {} total",
                page,
                found,
                added,
                state.offers.len()
            );
            if let Some(tui) = tui.as_mut() {
                if let Err(e) = tui.update_page_progress(page, found, added, state.offers.len()) {
                    debug!("Progress output failed: {}", e);
                }
            }

            // Stop on a page without new offers or once the page budget is spent
            if !should_continue(previous_len, &state, options.max_pages) {
                if added == 0 {
                    debug!("No new offers on page {}, stopping", page);
                } else {
                    debug!("Reached maximum of {} pages, stopping", options.max_pages);
                }
                break;
            }

            page = match page.checked_add(1) {
                Some(next) => next,
                None => {
                    debug!("Page {} is the last addressable page, stopping", page);
                    break;
                }
            };
        }

        state.offers.sort_by_price();
        info!(
            "Collected {} offers for {} from {} pages",
            state.offers.len(),
            label,
            state.pages_fetched
        );

        if let Some(tui) = tui.as_mut() {
            if let Err(e) = tui.finish_collection(state.offers.len()) {
                debug!("Progress output failed: {}", e);
            }
        }

        Ok(state)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

fn abort(state: CollectionState, page: u32, source: ScrapeError) -> CollectError {
    CollectError {
        page,
        source,
        partial: state.offers.sorted_by_price(),
    }
}
