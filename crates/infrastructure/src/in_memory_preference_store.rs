use std::collections::HashMap;

use async_trait::async_trait;
use fieldforce_application::PreferenceStore;
use fieldforce_core::AppResult;
use serde_json::Value;
use tokio::sync::RwLock;

/// Preference store that lives as long as the process.
#[derive(Default)]
pub struct InMemoryPreferenceStore {
    values: RwLock<HashMap<String, Value>>,
}

impl InMemoryPreferenceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn load(&self, key: &str) -> AppResult<Option<Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: Value) -> AppResult<()> {
        self.values.write().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}
