use serde::{Deserialize, Serialize};

/// The signed-in user as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    id: String,
    display_name: String,
    authorities: Vec<String>,
}

impl Identity {
    /// Creates an identity from the backend's user payload.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        authorities: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            authorities,
        }
    }

    /// Returns the backend user identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns granted authorities in the order the backend listed them.
    #[must_use]
    pub fn authorities(&self) -> &[String] {
        &self.authorities
    }

    /// Returns the first granted authority, which drives the primary role.
    #[must_use]
    pub fn primary_authority(&self) -> Option<&str> {
        self.authorities.first().map(String::as_str)
    }
}
