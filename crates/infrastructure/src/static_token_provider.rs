use std::sync::RwLock;

use fieldforce_application::TokenProvider;
use tracing::info;

/// Process-wide bearer token held in memory.
///
/// Only the authentication flow calls [`StaticTokenProvider::set_token`] and
/// [`StaticTokenProvider::clear`]; requests read it.
#[derive(Debug, Default)]
pub struct StaticTokenProvider {
    token: RwLock<Option<String>>,
}

impl StaticTokenProvider {
    /// Creates a provider holding `token`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    /// Creates a signed-out provider.
    #[must_use]
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Replaces the token after a sign-in or refresh.
    pub fn set_token(&self, token: impl Into<String>) {
        if let Ok(mut current) = self.token.write() {
            *current = Some(token.into());
            info!("bearer token updated");
        }
    }

    /// Forgets the token on sign-out.
    pub fn clear(&self) {
        if let Ok(mut current) = self.token.write() {
            *current = None;
        }
    }
}

impl TokenProvider for StaticTokenProvider {
    fn bearer_token(&self) -> Option<String> {
        self.token
            .read()
            .ok()
            .and_then(|token| token.clone())
            .filter(|token| !token.trim().is_empty())
    }
}
