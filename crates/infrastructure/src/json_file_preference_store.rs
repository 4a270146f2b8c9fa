use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fieldforce_application::PreferenceStore;
use fieldforce_core::{AppError, AppResult};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

type Preferences = BTreeMap<String, Value>;

/// Preference store persisted as one JSON object on disk.
///
/// Writes go to a sibling temporary file first and are renamed into place,
/// so a crash never leaves a half-written file behind.
pub struct JsonFilePreferenceStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFilePreferenceStore {
    /// Creates a store backed by `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> AppResult<Preferences> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Preferences::new()),
            Err(error) => {
                return Err(AppError::Internal(format!(
                    "failed to read preferences '{}': {error}",
                    self.path.display()
                )));
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(preferences) => Ok(preferences),
            Err(error) => {
                warn!(
                    path = %self.path.display(),
                    error = %error,
                    "preferences file is corrupt, starting over"
                );
                Ok(Preferences::new())
            }
        }
    }

    async fn write_all(&self, preferences: &Preferences) -> AppResult<()> {
        let bytes = serde_json::to_vec_pretty(preferences)
            .map_err(|error| AppError::Internal(format!("failed to encode preferences: {error}")))?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| self.io_error("create directory for", &error))?;
        }

        let temporary = self.path.with_extension("json.tmp");
        tokio::fs::write(&temporary, bytes)
            .await
            .map_err(|error| self.io_error("write", &error))?;
        tokio::fs::rename(&temporary, &self.path)
            .await
            .map_err(|error| self.io_error("replace", &error))?;

        debug!(path = %self.path.display(), entries = preferences.len(), "preferences saved");
        Ok(())
    }

    fn io_error(&self, action: &str, error: &std::io::Error) -> AppError {
        AppError::Internal(format!(
            "failed to {action} preferences '{}': {error}",
            self.path.display()
        ))
    }
}

#[async_trait]
impl PreferenceStore for JsonFilePreferenceStore {
    async fn load(&self, key: &str) -> AppResult<Option<Value>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn save(&self, key: &str, value: Value) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut preferences = self.read_all().await?;
        preferences.insert(key.to_owned(), value);
        self.write_all(&preferences).await
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut preferences = self.read_all().await?;
        if preferences.remove(key).is_some() {
            self.write_all(&preferences).await?;
        }
        Ok(())
    }
}
