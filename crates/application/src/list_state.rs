use std::time::Duration;

use fieldforce_core::{AppError, AppResult};
use fieldforce_domain::{CollectionPage, CollectionQuery, SortSpec};
use tokio::time::Instant;
use tracing::debug;

use crate::debounce::Debouncer;


/// Default quiet period for free-text search.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// A fetch the driver must perform, tagged with its request generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    /// Generation the result must match to be applied.
    pub generation: u64,
    /// Query to send.
    pub query: CollectionQuery,
}

/// What happened to a fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The result belonged to the live query and was rendered.
    Applied,
    /// A newer query superseded it; the result was dropped.
    Discarded,
}

/// Renderable state of one async list section.
#[derive(Debug, PartialEq)]
pub enum SectionState<'a, T> {
    /// Nothing loaded yet.
    Loading,
    /// The last fetch failed. Previously rendered data stays visible.
    Failed {
        /// Human-readable message for the banner.
        message: String,
        /// Data rendered before the failure.
        stale: Option<&'a CollectionPage<T>>,
    },
    /// Data for the live query, possibly an empty page.
    Ready(&'a CollectionPage<T>),
}

/// Data and error currently on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedList<T> {
    /// Last successfully fetched page.
    pub page: Option<CollectionPage<T>>,
    /// Error of the last fetch for the live query.
    pub error: Option<AppError>,
}

impl<T> Default for RenderedList<T> {
    fn default() -> Self {
        Self {
            page: None,
            error: None,
        }
    }
}

impl<T> RenderedList<T> {
    /// Classifies what the section should render.
    #[must_use]
    pub fn section(&self) -> SectionState<'_, T> {
        match (&self.error, &self.page) {
            (Some(error), stale) => SectionState::Failed {
                message: error.user_message(),
                stale: stale.as_ref(),
            },
            (None, Some(page)) => SectionState::Ready(page),
            (None, None) => SectionState::Loading,
        }
    }
}

/// Query state of one list view.
///
/// Every change bumps the request generation; only the result of the
/// current generation is applied, whatever order responses arrive in.
#[derive(Debug)]
pub struct ListState<T> {
    query: CollectionQuery,
    generation: u64,
    in_flight: Option<u64>,
    search_debounce: Debouncer,
    rendered: RenderedList<T>,
}

impl<T> ListState<T> {
    /// Creates the state for a freshly mounted view.
    #[must_use]
    pub fn new(initial_query: CollectionQuery, search_debounce: Duration) -> Self {
        Self {
            query: initial_query,
            generation: 0,
            in_flight: None,
            search_debounce: Debouncer::new(search_debounce),
            rendered: RenderedList::default(),
        }
    }

    /// Returns the live query.
    #[must_use]
    pub fn query(&self) -> &CollectionQuery {
        &self.query
    }

    /// Returns the live request generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns what is on screen.
    #[must_use]
    pub fn rendered(&self) -> &RenderedList<T> {
        &self.rendered
    }

    /// Returns whether a fetch for the live query is pending or in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight == Some(self.generation) || self.search_debounce.is_pending()
    }

    /// Returns when the pending search fetch is due.
    #[must_use]
    pub fn search_deadline(&self) -> Option<Instant> {
        self.search_debounce.deadline()
    }

    /// Issues the initial fetch.
    pub fn start(&mut self) -> FetchTicket {
        self.supersede();
        self.issue()
    }

    /// Records a keystroke in the search box.
    ///
    /// Resets to the first page and restarts the quiet period. The fetch is
    /// released by [`ListState::poll_debounce`].
    pub fn set_search_term(&mut self, term: impl Into<String>, now: Instant) {
        let term = term.into();
        if term == self.query.search_term() {
            return;
        }

        self.query.set_search_term(term);
        self.query.set_page(0);
        self.supersede();
        self.search_debounce.schedule(now);
    }

    /// Releases the debounced search fetch once its quiet period elapsed.
    pub fn poll_debounce(&mut self, now: Instant) -> Option<FetchTicket> {
        self.search_debounce
            .fire_if_due(now)
            .then(|| self.issue())
    }

    /// Changes the page size, resetting to the first page.
    pub fn set_page_size(&mut self, page_size: u32) -> AppResult<Option<FetchTicket>> {
        if page_size == self.query.page_size() {
            return Ok(None);
        }

        self.query.set_page_size(page_size)?;
        Ok(Some(self.reset_and_issue()))
    }

    /// Changes the sort, resetting to the first page.
    pub fn set_sort(&mut self, sort: Option<SortSpec>) -> Option<FetchTicket> {
        if sort.as_ref() == self.query.sort() {
            return None;
        }

        self.query.set_sort(sort);
        Some(self.reset_and_issue())
    }

    /// Changes the status filter, resetting to the first page.
    pub fn set_status_filter(&mut self, status: Option<String>) -> Option<FetchTicket> {
        let previous = self.query.status_filter().map(str::to_owned);
        self.query.set_status_filter(status);
        if self.query.status_filter() == previous.as_deref() {
            return None;
        }

        Some(self.reset_and_issue())
    }

    /// Moves to another page, keeping every other field.
    pub fn set_page(&mut self, page: u32) -> Option<FetchTicket> {
        if page == self.query.page() {
            return None;
        }

        self.query.set_page(page);
        self.search_debounce.cancel();
        self.supersede();
        Some(self.issue())
    }

    /// Re-issues the live query after a failure.
    pub fn retry(&mut self) -> FetchTicket {
        self.search_debounce.cancel();
        self.supersede();
        self.issue()
    }

    /// Re-issues the live query after a mutation changed the data.
    pub fn refresh(&mut self) -> FetchTicket {
        self.retry()
    }

    /// Applies a fetch result if it belongs to the live generation.
    pub fn complete(
        &mut self,
        generation: u64,
        result: AppResult<CollectionPage<T>>,
    ) -> Completion {
        if generation != self.generation {
            debug!(
                generation,
                live_generation = self.generation,
                "discarding superseded list response"
            );
            return Completion::Discarded;
        }

        self.in_flight = None;
        match result {
            Ok(page) => {
                self.rendered.page = Some(page);
                self.rendered.error = None;
            }
            Err(error) => {
                self.rendered.error = Some(error);
            }
        }

        Completion::Applied
    }

    fn reset_and_issue(&mut self) -> FetchTicket {
        self.query.set_page(0);
        self.search_debounce.cancel();
        self.supersede();
        self.issue()
    }

    fn supersede(&mut self) {
        self.generation = self.generation.saturating_add(1);
    }

    fn issue(&mut self) -> FetchTicket {
        self.in_flight = Some(self.generation);
        self.rendered.error = None;
        FetchTicket {
            generation: self.generation,
            query: self.query.clone(),
        }
    }
}
