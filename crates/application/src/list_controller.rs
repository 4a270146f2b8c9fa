use std::sync::Arc;
use std::time::Duration;

use fieldforce_core::AppResult;
use fieldforce_domain::{CollectionQuery, SortSpec};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

use crate::dashboard_ports::CollectionSource;
use crate::list_state::{Completion, FetchTicket, ListState, RenderedList};

/// Owned copy of a list view for rendering outside the lock.
#[derive(Debug, Clone)]
pub struct ListSnapshot<T> {
    /// Live query.
    pub query: CollectionQuery,
    /// Whether a fetch for the live query is pending.
    pub loading: bool,
    /// What is on screen.
    pub rendered: RenderedList<T>,
}

/// Async driver of a [`ListState`] over a remote collection.
///
/// The lock is never held across a network call, so overlapping changes
/// each issue their own request and the generation check picks the winner.
pub struct ListController<T> {
    source: Arc<dyn CollectionSource<T>>,
    state: Mutex<ListState<T>>,
}

impl<T> ListController<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a controller; call [`ListController::load`] to fetch.
    #[must_use]
    pub fn new(
        source: Arc<dyn CollectionSource<T>>,
        initial_query: CollectionQuery,
        search_debounce: Duration,
    ) -> Self {
        Self {
            source,
            state: Mutex::new(ListState::new(initial_query, search_debounce)),
        }
    }

    /// Fetches the initial page.
    pub async fn load(&self) -> Completion {
        let ticket = self.state.lock().await.start();
        self.execute(ticket).await
    }

    /// Changes the status filter and fetches immediately.
    pub async fn set_status_filter(&self, status: Option<String>) -> Option<Completion> {
        let ticket = self.state.lock().await.set_status_filter(status);
        self.execute_optional(ticket).await
    }

    /// Changes the page size and fetches immediately.
    pub async fn set_page_size(&self, page_size: u32) -> AppResult<Option<Completion>> {
        let ticket = self.state.lock().await.set_page_size(page_size)?;
        Ok(self.execute_optional(ticket).await)
    }

    /// Changes the sort and fetches immediately.
    pub async fn set_sort(&self, sort: Option<SortSpec>) -> Option<Completion> {
        let ticket = self.state.lock().await.set_sort(sort);
        self.execute_optional(ticket).await
    }

    /// Moves to another page and fetches immediately.
    pub async fn set_page(&self, page: u32) -> Option<Completion> {
        let ticket = self.state.lock().await.set_page(page);
        self.execute_optional(ticket).await
    }

    /// Records a search keystroke. The fetch waits for [`ListController::flush_debounced`].
    pub async fn set_search_term(&self, term: impl Into<String>) {
        self.state
            .lock()
            .await
            .set_search_term(term, Instant::now());
    }

    /// Waits out the search quiet period, then fetches.
    ///
    /// Keystrokes arriving while waiting push the deadline back. Returns
    /// `None` when no search fetch was pending.
    pub async fn flush_debounced(&self) -> Option<Completion> {
        loop {
            let deadline = self.state.lock().await.search_deadline()?;
            tokio::time::sleep_until(deadline).await;

            let ticket = self.state.lock().await.poll_debounce(Instant::now());
            if let Some(ticket) = ticket {
                return Some(self.execute(ticket).await);
            }
        }
    }

    /// Re-issues the live query after a failure.
    pub async fn retry(&self) -> Completion {
        let ticket = self.state.lock().await.retry();
        self.execute(ticket).await
    }

    /// Re-fetches the live query after a mutation.
    pub async fn refresh(&self) -> Completion {
        let ticket = self.state.lock().await.refresh();
        self.execute(ticket).await
    }

    /// Copies the current view state.
    pub async fn snapshot(&self) -> ListSnapshot<T> {
        let state = self.state.lock().await;
        ListSnapshot {
            query: state.query().clone(),
            loading: state.is_loading(),
            rendered: state.rendered().clone(),
        }
    }

    async fn execute_optional(&self, ticket: Option<FetchTicket>) -> Option<Completion> {
        match ticket {
            Some(ticket) => Some(self.execute(ticket).await),
            None => None,
        }
    }

    async fn execute(&self, ticket: FetchTicket) -> Completion {
        let result = self.source.fetch_page(&ticket.query).await;
        if let Err(error) = &result {
            warn!(
                generation = ticket.generation,
                page = ticket.query.page(),
                error = %error,
                "list fetch failed"
            );
        }

        self.state.lock().await.complete(ticket.generation, result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use fieldforce_core::{AppError, AppResult};
    use fieldforce_domain::{CollectionPage, CollectionQuery, paginate};
    use tokio::sync::Mutex;

    use super::ListController;
    use crate::dashboard_ports::CollectionSource;
    use crate::list_state::{Completion, SectionState};

    #[derive(Default)]
    struct RecordingSource {
        queries: Mutex<Vec<CollectionQuery>>,
        fail_next: Mutex<bool>,
    }

    #[async_trait]
    impl CollectionSource<String> for RecordingSource {
        async fn fetch_page(&self, query: &CollectionQuery) -> AppResult<CollectionPage<String>> {
            self.queries.lock().await.push(query.clone());

            // Slower answers for the pending tab let later requests overtake it.
            let delay = match query.status_filter() {
                Some("PENDING") => 500,
                _ => 50,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;

            if std::mem::take(&mut *self.fail_next.lock().await) {
                return Err(AppError::http(503, "maintenance"));
            }

            let status = query.status_filter().unwrap_or("ALL");
            let items: Vec<String> = (0..25).map(|index| format!("{status}-{index}")).collect();
            Ok(paginate(&items, query.page(), query.page_size()))
        }
    }

    fn controller(source: Arc<RecordingSource>) -> ListController<String> {
        ListController::new(
            source,
            CollectionQuery::default().with_status_filter(Some("PENDING".to_owned())),
            Duration::from_millis(300),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn first_pending_page_has_ten_items_and_three_pages() {
        let source = Arc::new(RecordingSource::default());
        let controller = controller(source);

        assert_eq!(controller.load().await, Completion::Applied);

        let snapshot = controller.snapshot().await;
        match snapshot.rendered.section() {
            SectionState::Ready(page) => {
                assert_eq!(page.items.len(), 10);
                assert_eq!(page.total_pages, 3);
            }
            other => panic!("expected ready section, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_typing_issues_a_single_fetch() {
        let source = Arc::new(RecordingSource::default());
        let controller = controller(source.clone());

        for term in ["a", "an", "ani", "anit", "anita"] {
            controller.set_search_term(term).await;
            tokio::time::advance(Duration::from_millis(100)).await;
        }

        assert_eq!(controller.flush_debounced().await, Some(Completion::Applied));
        assert_eq!(controller.flush_debounced().await, None);

        let queries = source.queries.lock().await;
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].search_term(), "anita");
    }

    #[tokio::test(start_paused = true)]
    async fn overtaken_tab_request_is_discarded() {
        let source = Arc::new(RecordingSource::default());
        let controller = controller(source);

        let (pending, approved) = tokio::join!(
            controller.load(),
            controller.set_status_filter(Some("APPROVED".to_owned()))
        );

        assert_eq!(approved, Some(Completion::Applied));
        assert_eq!(pending, Completion::Discarded);

        let snapshot = controller.snapshot().await;
        let page = snapshot.rendered.page.unwrap_or_else(|| unreachable!());
        assert!(page.items.iter().all(|item| item.starts_with("APPROVED")));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_rendered_page_until_retry() {
        let source = Arc::new(RecordingSource::default());
        let controller = controller(source.clone());
        let _ = controller.load().await;

        *source.fail_next.lock().await = true;
        let _ = controller.refresh().await;

        let snapshot = controller.snapshot().await;
        assert!(snapshot.rendered.page.is_some());
        assert!(matches!(
            snapshot.rendered.error,
            Some(AppError::Http { status: 503, .. })
        ));

        assert_eq!(controller.retry().await, Completion::Applied);
        assert!(controller.snapshot().await.rendered.error.is_none());
    }
}
