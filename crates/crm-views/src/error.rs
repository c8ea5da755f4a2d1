//! Error types for view-model operations.

use paveos_api::ApiError;
use session_store::StoreError;
use thiserror::Error;

/// Errors that can occur while driving a view.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The backend call failed.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Reading or writing the persisted session failed.
    #[error("session store error: {0}")]
    Store(#[from] StoreError),

    /// Input was rejected before any request was sent.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The view does not hold the requested record.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

impl ViewError {
    /// Whether the user must sign in again.
    pub fn is_auth_required(&self) -> bool {
        matches!(self, ViewError::Api(e) if e.is_auth_required())
    }

    /// Message suitable for a notification.
    pub fn user_message(&self) -> String {
        match self {
            ViewError::Api(e) => e.user_message(),
            ViewError::Store(_) => "Could not access the saved session".to_string(),
            ViewError::Validation(msg) => msg.clone(),
            ViewError::NotFound { entity, .. } => format!("{entity} not found"),
        }
    }
}

/// Result type for view operations.
pub type Result<T> = std::result::Result<T, ViewError>;
