//! Error types for paveos-api.

use thiserror::Error;

/// Errors that can occur when talking to the PaveOS backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed (connection refused, timeout, TLS...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend rejected our credentials (HTTP 401/403).
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    /// The requested record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-success HTTP status from the backend.
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// The backend answered 2xx but flagged the envelope as unsuccessful.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// A successful envelope carried no `data` field.
    #[error("Response for {0} carried no data")]
    MissingData(String),

    /// Input failed client-side validation; no request was sent.
    #[error("Invalid input: {0}")]
    Validation(String),
}

impl ApiError {
    /// Whether this failure should send the user back to the login state.
    pub fn is_auth_required(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// Message suitable for a user-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http(_) | ApiError::Json(_) | ApiError::MissingData(_) => {
                "Network error, please try again".to_string()
            }
            ApiError::Unauthorized(_) => "Please sign in again".to_string(),
            ApiError::NotFound(msg)
            | ApiError::Rejected(msg)
            | ApiError::Validation(msg)
            | ApiError::Server { message: msg, .. } => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_required_only_for_unauthorized() {
        assert!(ApiError::Unauthorized("expired".into()).is_auth_required());
        assert!(!ApiError::NotFound("lead".into()).is_auth_required());
        assert!(!ApiError::Server {
            status: 500,
            message: "boom".into()
        }
        .is_auth_required());
    }

    #[test]
    fn test_user_message_passes_server_text_through() {
        let err = ApiError::Server {
            status: 422,
            message: "Lead name is required".into(),
        };
        assert_eq!(err.user_message(), "Lead name is required");
        assert_eq!(
            ApiError::MissingData("/leads".into()).user_message(),
            "Network error, please try again"
        );
    }
}
