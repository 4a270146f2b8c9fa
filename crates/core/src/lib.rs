//! Shared primitives for all Rust crates in Fieldforce.

#![forbid(unsafe_code)]

/// Authentication primitives shared across crates.
pub mod auth;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::Identity;

/// Result type used across Fieldforce crates.
pub type AppResult<T> = Result<T, AppError>;

/// Maximum number of response body characters kept on HTTP errors.
pub const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Client-side error categories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Transport failure: DNS, refused connection, timeout.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("request failed with status {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Leading part of the response body for diagnosis.
        body: String,
    },

    /// The response body did not have the expected shape or content type.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Client-side role check failed. The server stays authoritative.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Input rejected before any request was sent.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist locally.
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds an HTTP error keeping only a short prefix of the body.
    #[must_use]
    pub fn http(status: u16, body: &str) -> Self {
        Self::Http {
            status,
            body: truncate_chars(body, ERROR_BODY_PREVIEW_CHARS),
        }
    }

    /// Returns whether a user may meaningfully retry the failed operation.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Http { .. } | Self::Decode(_))
    }

    /// Returns a message suitable for an inline error banner.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "Could not reach the server. Check your connection and retry.".to_owned()
            }
            Self::Http { status: 401, .. } => "Your session has expired. Sign in again.".to_owned(),
            Self::Http { status: 403, .. } => {
                "You do not have access to this information.".to_owned()
            }
            Self::Http { status, .. } => format!("The server returned an error ({status})."),
            Self::Decode(_) => "The server sent an unexpected response.".to_owned(),
            Self::Permission(message) | Self::Validation(message) | Self::NotFound(message) => {
                message.clone()
            }
            Self::Internal(_) => "Something went wrong.".to_owned(),
        }
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((index, _)) => value[..index].to_owned(),
        None => value.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, ERROR_BODY_PREVIEW_CHARS, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn http_error_keeps_first_two_hundred_characters() {
        let body = "é".repeat(500);
        let error = AppError::http(500, body.as_str());

        let AppError::Http { status, body } = error else {
            unreachable!();
        };
        assert_eq!(status, 500);
        assert_eq!(body.chars().count(), ERROR_BODY_PREVIEW_CHARS);
    }

    #[test]
    fn transport_errors_are_retryable_but_validation_is_not() {
        assert!(AppError::Network("refused".to_owned()).is_retryable());
        assert!(AppError::http(502, "bad gateway").is_retryable());
        assert!(AppError::Decode("html".to_owned()).is_retryable());
        assert!(!AppError::Validation("end before start".to_owned()).is_retryable());
        assert!(!AppError::Permission("admins only".to_owned()).is_retryable());
    }

    #[test]
    fn expired_session_has_a_dedicated_message() {
        let message = AppError::http(401, "").user_message();
        assert!(message.contains("session"));
    }
}
