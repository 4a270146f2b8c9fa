use async_trait::async_trait;
use fieldforce_core::AppResult;
use serde_json::Value;

/// Key/value storage for UX continuity. Never authoritative.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Loads one value.
    async fn load(&self, key: &str) -> AppResult<Option<Value>>;

    /// Stores one value, replacing any previous one.
    async fn save(&self, key: &str, value: Value) -> AppResult<()>;

    /// Removes one value.
    async fn remove(&self, key: &str) -> AppResult<()>;
}
