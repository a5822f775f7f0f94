//! Authentication error types.

use thiserror::Error;

use crate::api::{ApiError, DEFAULT_ERROR_MESSAGE};
use crate::storage::StorageError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] heirloom_core::EmailError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// An operation needs a signed-in user and there is none.
    #[error("not signed in")]
    NotSignedIn,

    /// The backend answered with `success: false`.
    #[error("rejected: {0}")]
    Rejected(String),

    /// A successful response was missing the token or user.
    #[error("incomplete auth response: missing {0}")]
    Incomplete(&'static str),

    /// Backend request failed.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Token could not be persisted.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Text safe to show the user.
    ///
    /// Local validation messages and backend rejection messages pass through;
    /// everything else collapses to the generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Invalid email address".to_string(),
            Self::WeakPassword(msg) | Self::Rejected(msg) => msg.clone(),
            Self::NotSignedIn => "Please log in".to_string(),
            Self::Api(err) => err.server_message().to_string(),
            Self::Incomplete(_) | Self::Storage(_) => DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }
}
