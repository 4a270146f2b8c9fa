use async_trait::async_trait;
use fieldforce_core::{AppResult, Identity};

/// Port returning the signed-in user.
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Fetches the identity bound to the current bearer token.
    async fn current_identity(&self) -> AppResult<Identity>;
}

/// Process-wide source of the bearer token.
///
/// Read on every request. Only the authentication flow writes it.
pub trait TokenProvider: Send + Sync {
    /// Returns the current token, `None` when signed out.
    fn bearer_token(&self) -> Option<String>;
}
