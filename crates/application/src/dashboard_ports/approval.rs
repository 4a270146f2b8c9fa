use async_trait::async_trait;
use fieldforce_core::{AppResult, NonEmptyString};

/// Port for attendance request status transitions.
#[async_trait]
pub trait ApprovalGateway: Send + Sync {
    /// Approves one attendance request.
    async fn approve(&self, request_id: &str) -> AppResult<()>;

    /// Rejects one attendance request with a reason.
    async fn reject(&self, request_id: &str, reason: &NonEmptyString) -> AppResult<()>;
}
