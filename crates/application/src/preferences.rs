use std::sync::Arc;

use fieldforce_domain::{ViewMode, ViewState};
use serde_json::Value;
use tracing::warn;

use crate::dashboard_ports::PreferenceStore;

const FILTER_PREFIX: &str = "filter:";
const SHOWN_PREFIX: &str = "shown:";
const BREADCRUMBS_PREFIX: &str = "breadcrumbs:";

/// UX continuity on top of a key/value store.
///
/// Nothing here is authoritative. Store failures are logged and read as
/// absent values.
pub struct UxPreferences {
    store: Arc<dyn PreferenceStore>,
}

impl UxPreferences {
    /// Wraps a store.
    #[must_use]
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Returns the filter last chosen for an entity list.
    pub async fn last_filter(&self, entity: &str) -> Option<String> {
        match self.load(&format!("{FILTER_PREFIX}{entity}")).await? {
            Value::String(filter) if !filter.trim().is_empty() => Some(filter),
            _ => None,
        }
    }

    /// Remembers the filter chosen for an entity list. `None` forgets it.
    pub async fn remember_filter(&self, entity: &str, filter: Option<&str>) {
        let key = format!("{FILTER_PREFIX}{entity}");
        match filter.map(str::trim).filter(|filter| !filter.is_empty()) {
            Some(filter) => self.save(&key, Value::String(filter.to_owned())).await,
            None => self.remove(&key).await,
        }
    }

    /// Returns `true` the first time a notice is shown, `false` afterwards.
    pub async fn mark_shown_once(&self, notice: &str) -> bool {
        let key = format!("{SHOWN_PREFIX}{notice}");
        if matches!(self.load(&key).await, Some(Value::Bool(true))) {
            return false;
        }

        self.save(&key, Value::Bool(true)).await;
        true
    }

    /// Loads the parent states saved for a page, outermost first.
    ///
    /// Entries that no longer decode to the state they were saved from,
    /// such as a view mode that was since removed, are dropped.
    pub async fn breadcrumbs<M: ViewMode>(&self, page: &str) -> Vec<ViewState<M>> {
        let Some(Value::Array(entries)) = self.load(&format!("{BREADCRUMBS_PREFIX}{page}")).await
        else {
            return Vec::new();
        };

        entries
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|entry| {
                let state = ViewState::<M>::from_query(entry);
                (state.to_query() == entry).then_some(state)
            })
            .collect()
    }

    /// Saves the parent states of a page.
    pub async fn save_breadcrumbs<M: ViewMode>(&self, page: &str, breadcrumbs: &[ViewState<M>]) {
        let key = format!("{BREADCRUMBS_PREFIX}{page}");
        if breadcrumbs.is_empty() {
            self.remove(&key).await;
            return;
        }

        let entries = breadcrumbs
            .iter()
            .map(|state| Value::String(state.to_query()))
            .collect();
        self.save(&key, Value::Array(entries)).await;
    }

    async fn load(&self, key: &str) -> Option<Value> {
        match self.store.load(key).await {
            Ok(value) => value,
            Err(error) => {
                warn!(key, error = %error, "preference read failed");
                None
            }
        }
    }

    async fn save(&self, key: &str, value: Value) {
        if let Err(error) = self.store.save(key, value).await {
            warn!(key, error = %error, "preference write failed");
        }
    }

    async fn remove(&self, key: &str) {
        if let Err(error) = self.store.remove(key).await {
            warn!(key, error = %error, "preference removal failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use fieldforce_core::{AppError, AppResult};
    use fieldforce_domain::{DashboardView, ViewState};
    use serde_json::Value;
    use tokio::sync::Mutex;

    use super::UxPreferences;
    use crate::dashboard_ports::PreferenceStore;

    #[derive(Default)]
    struct FakePreferenceStore {
        values: Mutex<HashMap<String, Value>>,
        broken: bool,
    }

    #[async_trait]
    impl PreferenceStore for FakePreferenceStore {
        async fn load(&self, key: &str) -> AppResult<Option<Value>> {
            if self.broken {
                return Err(AppError::Internal("disk unavailable".to_owned()));
            }
            Ok(self.values.lock().await.get(key).cloned())
        }

        async fn save(&self, key: &str, value: Value) -> AppResult<()> {
            if self.broken {
                return Err(AppError::Internal("disk unavailable".to_owned()));
            }
            self.values.lock().await.insert(key.to_owned(), value);
            Ok(())
        }

        async fn remove(&self, key: &str) -> AppResult<()> {
            self.values.lock().await.remove(key);
            Ok(())
        }
    }

    #[tokio::test]
    async fn filter_round_trips_and_clears() {
        let preferences = UxPreferences::new(Arc::new(FakePreferenceStore::default()));

        preferences.remember_filter("attendance", Some("APPROVED")).await;
        assert_eq!(
            preferences.last_filter("attendance").await,
            Some("APPROVED".to_owned())
        );

        preferences.remember_filter("attendance", Some("  ")).await;
        assert_eq!(preferences.last_filter("attendance").await, None);
    }

    #[tokio::test]
    async fn notice_is_shown_once() {
        let preferences = UxPreferences::new(Arc::new(FakePreferenceStore::default()));

        assert!(preferences.mark_shown_once("bulk-commit-help").await);
        assert!(!preferences.mark_shown_once("bulk-commit-help").await);
    }

    #[tokio::test]
    async fn breadcrumbs_survive_a_reload() {
        let store = Arc::new(FakePreferenceStore::default());
        let saved = vec![
            ViewState::root(),
            ViewState::new(DashboardView::StatusList, Some("absent".to_owned()))
                .unwrap_or_else(|_| unreachable!()),
        ];

        UxPreferences::new(store.clone())
            .save_breadcrumbs("dashboard", &saved)
            .await;
        let loaded = UxPreferences::new(store)
            .breadcrumbs::<DashboardView>("dashboard")
            .await;

        assert_eq!(loaded, saved);
    }

    #[tokio::test]
    async fn breadcrumbs_that_no_longer_decode_are_dropped() {
        let store = Arc::new(FakePreferenceStore::default());
        store.values.lock().await.insert(
            "breadcrumbs:dashboard".to_owned(),
            serde_json::json!(["", "view=retired", "view=employee", "view=employee&id=7"]),
        );

        let loaded = UxPreferences::new(store)
            .breadcrumbs::<DashboardView>("dashboard")
            .await;

        assert_eq!(
            loaded,
            vec![
                ViewState::root(),
                ViewState::new(DashboardView::EmployeeDetail, Some("7".to_owned()))
                    .unwrap_or_else(|_| unreachable!()),
            ]
        );
    }

    #[tokio::test]
    async fn broken_store_reads_as_absent() {
        let preferences = UxPreferences::new(Arc::new(FakePreferenceStore {
            broken: true,
            ..FakePreferenceStore::default()
        }));

        preferences.remember_filter("expenses", Some("PENDING")).await;
        assert_eq!(preferences.last_filter("expenses").await, None);
        assert!(preferences.mark_shown_once("welcome").await);
        assert!(
            preferences
                .breadcrumbs::<DashboardView>("dashboard")
                .await
                .is_empty()
        );
    }
}
