//! Per-category totals for status tabs and badges.
//!
//! Two strategies answer the same question. Privileged roles can afford one
//! cheap request per category; everyone else fetches their visible records
//! once and tallies them locally.

use std::sync::Arc;

use async_trait::async_trait;
use fieldforce_core::AppResult;
use fieldforce_domain::{AggregateCounts, CollectionItem, CollectionQuery, Role};
use futures::future::join_all;
use tracing::warn;

use crate::dashboard_ports::{CollectionSource, FullCollectionSource};

/// Counts records per category.
#[async_trait]
pub trait CategoryCounter: Send + Sync {
    /// Returns one count per category, in any order.
    ///
    /// Categories whose count could not be obtained read as zero and are
    /// listed in [`AggregateCounts::failed`].
    async fn count(&self, categories: &[String]) -> AppResult<AggregateCounts>;
}

/// Asks the server for each category's total with a page-size-1 query.
pub struct ServerCategoryCounter<T> {
    source: Arc<dyn CollectionSource<T>>,
}

impl<T> ServerCategoryCounter<T> {
    /// Creates a counter over a paginated source.
    #[must_use]
    pub fn new(source: Arc<dyn CollectionSource<T>>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<T> CategoryCounter for ServerCategoryCounter<T>
where
    T: Send + Sync + 'static,
{
    async fn count(&self, categories: &[String]) -> AppResult<AggregateCounts> {
        let probes = categories.iter().map(|category| async move {
            let query = CollectionQuery::count_probe(category.clone());
            (category, self.source.fetch_page(&query).await)
        });

        let mut counts = AggregateCounts::zeroed(categories);
        for (category, result) in join_all(probes).await {
            match result {
                Ok(page) => counts.set(category.clone(), page.total_items),
                Err(error) => {
                    warn!(category = %category, error = %error, "category count failed");
                    counts.mark_failed(category.clone());
                }
            }
        }

        Ok(counts)
    }
}

/// Fetches every visible record once and tallies categories locally.
pub struct ClientTallyCounter<T> {
    source: Arc<dyn FullCollectionSource<T>>,
}

impl<T> ClientTallyCounter<T> {
    /// Creates a counter over a full-fetch source.
    #[must_use]
    pub fn new(source: Arc<dyn FullCollectionSource<T>>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<T> CategoryCounter for ClientTallyCounter<T>
where
    T: CollectionItem,
{
    async fn count(&self, categories: &[String]) -> AppResult<AggregateCounts> {
        let mut counts = AggregateCounts::zeroed(categories);

        match self.source.fetch_all().await {
            Ok(items) => {
                for category in items.iter().filter_map(|item| item.category()) {
                    counts.increment(category);
                }
            }
            Err(error) => {
                warn!(error = %error, "full fetch for category tally failed");
                for category in categories {
                    counts.mark_failed(category.clone());
                }
            }
        }

        Ok(counts)
    }
}

/// Picks the counting strategy for a resolved role.
///
/// Admins and managers query the server per category; narrower roles tally
/// the records they can see.
pub fn counter_for_role<T, S>(role: Role, source: Arc<S>) -> Arc<dyn CategoryCounter>
where
    T: CollectionItem,
    S: CollectionSource<T> + FullCollectionSource<T> + 'static,
{
    match role {
        Role::Admin | Role::Manager => Arc::new(ServerCategoryCounter::<T>::new(source)),
        Role::Coordinator | Role::FieldOfficer | Role::Unassigned => {
            Arc::new(ClientTallyCounter::<T>::new(source))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use fieldforce_core::{AppError, AppResult};
    use fieldforce_domain::{
        ApprovalStatus, AttendanceRequest, CollectionPage, CollectionQuery, Role, paginate,
    };
    use tokio::sync::Mutex;

    use super::{CategoryCounter, counter_for_role};
    use crate::dashboard_ports::{CollectionSource, FullCollectionSource};

    fn request(id: &str, status: ApprovalStatus) -> AttendanceRequest {
        AttendanceRequest {
            id: id.to_owned(),
            employee_id: "e1".to_owned(),
            employee_name: "Anita Rao".to_owned(),
            request_type: Some("LEAVE".to_owned()),
            start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, 3).unwrap_or_default(),
            reason: None,
            status,
        }
    }

    struct FakeAttendanceSource {
        records: Vec<AttendanceRequest>,
        failing_status: Option<&'static str>,
        fail_full_fetch: bool,
        page_queries: Mutex<Vec<CollectionQuery>>,
        full_fetches: Mutex<u32>,
    }

    impl FakeAttendanceSource {
        fn new(records: Vec<AttendanceRequest>) -> Self {
            Self {
                records,
                failing_status: None,
                fail_full_fetch: false,
                page_queries: Mutex::new(Vec::new()),
                full_fetches: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl CollectionSource<AttendanceRequest> for FakeAttendanceSource {
        async fn fetch_page(
            &self,
            query: &CollectionQuery,
        ) -> AppResult<CollectionPage<AttendanceRequest>> {
            self.page_queries.lock().await.push(query.clone());
            if query.status_filter().is_some() && query.status_filter() == self.failing_status {
                return Err(AppError::Network("reset by peer".to_owned()));
            }

            let matching: Vec<AttendanceRequest> = self
                .records
                .iter()
                .filter(|record| Some(record.status.as_str()) == query.status_filter())
                .cloned()
                .collect();
            Ok(paginate(&matching, query.page(), query.page_size()))
        }
    }

    #[async_trait]
    impl FullCollectionSource<AttendanceRequest> for FakeAttendanceSource {
        async fn fetch_all(&self) -> AppResult<Vec<AttendanceRequest>> {
            *self.full_fetches.lock().await += 1;
            if self.fail_full_fetch {
                return Err(AppError::http(502, "bad gateway"));
            }
            Ok(self.records.clone())
        }
    }

    fn records() -> Vec<AttendanceRequest> {
        vec![
            request("1", ApprovalStatus::Pending),
            request("2", ApprovalStatus::Pending),
            request("3", ApprovalStatus::Approved),
            request("4", ApprovalStatus::Rejected),
            request("5", ApprovalStatus::Pending),
        ]
    }

    #[tokio::test]
    async fn admin_counts_with_one_probe_per_category() {
        let source = Arc::new(FakeAttendanceSource::new(records()));
        let counter = counter_for_role::<AttendanceRequest, _>(Role::Admin, source.clone());

        let counts = counter.count(&ApprovalStatus::categories()).await;
        let counts = counts.unwrap_or_else(|_| unreachable!());

        assert_eq!(counts.get("PENDING"), 3);
        assert_eq!(counts.get("APPROVED"), 1);
        assert_eq!(counts.get("REJECTED"), 1);

        let queries = source.page_queries.lock().await;
        assert_eq!(queries.len(), 3);
        assert!(queries.iter().all(|query| query.page_size() == 1));
        assert_eq!(*source.full_fetches.lock().await, 0);
    }

    #[tokio::test]
    async fn one_failing_category_does_not_hide_the_others() {
        let mut source = FakeAttendanceSource::new(records());
        source.failing_status = Some("APPROVED");
        let counter = counter_for_role::<AttendanceRequest, _>(Role::Manager, Arc::new(source));

        let counts = counter
            .count(&ApprovalStatus::categories())
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(counts.get("PENDING"), 3);
        assert_eq!(counts.get("APPROVED"), 0);
        assert_eq!(counts.failed(), ["APPROVED".to_owned()]);
    }

    #[tokio::test]
    async fn coordinator_tallies_a_single_full_fetch() {
        let source = Arc::new(FakeAttendanceSource::new(records()));
        let counter =
            counter_for_role::<AttendanceRequest, _>(Role::Coordinator, source.clone());

        let counts = counter
            .count(&ApprovalStatus::categories())
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(counts.get("PENDING"), 3);
        assert_eq!(counts.total(), 5);
        assert_eq!(*source.full_fetches.lock().await, 1);
        assert!(source.page_queries.lock().await.is_empty());
    }

    #[tokio::test]
    async fn failed_full_fetch_reads_as_zero_everywhere() {
        let mut source = FakeAttendanceSource::new(records());
        source.fail_full_fetch = true;
        let counter =
            counter_for_role::<AttendanceRequest, _>(Role::FieldOfficer, Arc::new(source));

        let counts = counter
            .count(&ApprovalStatus::categories())
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(counts.total(), 0);
        assert_eq!(counts.failed().len(), 3);
    }
}
