use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use fieldforce_core::{AppError, AppResult, NonEmptyString};
use fieldforce_domain::{
    AggregateCounts, ApprovalStatus, AttendanceRequest, CollectionQuery, Role, ViewAccess,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::aggregate_counter::{CategoryCounter, counter_for_role};
use crate::dashboard_ports::{ApprovalGateway, CollectionSource, FullCollectionSource};
use crate::list_controller::{ListController, ListSnapshot};
use crate::list_state::Completion;
use crate::role_resolver::RoleResolver;


/// Attendance approvals page: status tabs with badges over one paged list.
pub struct ApprovalsBoard {
    scope: Role,
    list: ListController<AttendanceRequest>,
    counter: Arc<dyn CategoryCounter>,
    approvals: Arc<dyn ApprovalGateway>,
    count_requests: AtomicU64,
    badges: Mutex<Badges>,
}

/// Last applied counts and the refresh that produced them.
struct Badges {
    generation: u64,
    counts: AggregateCounts,
}

impl ApprovalsBoard {
    /// Resolves the caller's scope and builds the board on the pending tab.
    ///
    /// Fails with a permission error when no role may open approvals.
    pub async fn open<S>(
        resolver: &RoleResolver,
        source: Arc<S>,
        approvals: Arc<dyn ApprovalGateway>,
        initial_query: CollectionQuery,
        search_debounce: Duration,
    ) -> AppResult<Self>
    where
        S: CollectionSource<AttendanceRequest> + FullCollectionSource<AttendanceRequest> + 'static,
    {
        let scope = resolver.scope_for(ViewAccess::APPROVALS).await?;
        let counter = counter_for_role::<AttendanceRequest, S>(scope, source.clone());
        let initial_query = match initial_query.status_filter() {
            Some(_) => initial_query,
            None => initial_query
                .with_status_filter(Some(ApprovalStatus::Pending.as_str().to_owned())),
        };

        info!(scope = scope.as_str(), "opened approvals board");
        Ok(Self {
            scope,
            list: ListController::new(source, initial_query, search_debounce),
            counter,
            approvals,
            count_requests: AtomicU64::new(0),
            badges: Mutex::new(Badges {
                generation: 0,
                counts: AggregateCounts::zeroed(&ApprovalStatus::categories()),
            }),
        })
    }

    /// Returns the role the board was scoped with.
    #[must_use]
    pub fn scope(&self) -> Role {
        self.scope
    }

    /// Returns the list driver for search, paging and sorting.
    #[must_use]
    pub fn list(&self) -> &ListController<AttendanceRequest> {
        &self.list
    }

    /// Loads the first page and the tab badges concurrently.
    pub async fn load(&self) -> Completion {
        let (completion, _) = tokio::join!(self.list.load(), self.refresh_counts());
        completion
    }

    /// Switches to another status tab.
    pub async fn select_tab(&self, status: ApprovalStatus) -> Option<Completion> {
        self.list
            .set_status_filter(Some(status.as_str().to_owned()))
            .await
    }

    /// Re-counts every status and returns the badges now shown.
    ///
    /// Previous counts stay when the counter fails. A refresh that finishes
    /// after a later one started never overwrites the later result.
    pub async fn refresh_counts(&self) -> AggregateCounts {
        let generation = self.count_requests.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.counter.count(&ApprovalStatus::categories()).await;

        let mut badges = self.badges.lock().await;
        match result {
            Ok(counts) if generation > badges.generation => {
                badges.generation = generation;
                badges.counts = counts;
            }
            Ok(_) => debug!(
                generation,
                applied_generation = badges.generation,
                "discarding superseded approval counts"
            ),
            Err(error) => warn!(error = %error, "approval counts refresh failed"),
        }
        badges.counts.clone()
    }

    /// Returns the last known tab badges.
    pub async fn counts(&self) -> AggregateCounts {
        self.badges.lock().await.counts.clone()
    }

    /// Copies the list view.
    pub async fn snapshot(&self) -> ListSnapshot<AttendanceRequest> {
        self.list.snapshot().await
    }

    /// Approves one request, then refreshes the list and badges.
    ///
    /// On failure nothing is refreshed and the error is returned.
    pub async fn approve(&self, request_id: &str) -> AppResult<()> {
        self.approvals.approve(request_id).await?;
        info!(request_id, "attendance request approved");
        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Rejects one request with a reason, then refreshes the list and badges.
    pub async fn reject(&self, request_id: &str, reason: &str) -> AppResult<()> {
        let reason = NonEmptyString::new(reason.trim()).map_err(|_| {
            AppError::Validation("a reason is required to reject a request".to_owned())
        })?;

        self.approvals.reject(request_id, &reason).await?;
        info!(request_id, "attendance request rejected");
        self.refresh_after_mutation().await;
        Ok(())
    }

    async fn refresh_after_mutation(&self) {
        let _ = tokio::join!(self.list.refresh(), self.refresh_counts());
    }
}
