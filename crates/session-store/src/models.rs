//! Stored session model.

use paveos_api::{AuthResponse, User};

/// Storage key for the access token.
pub const AUTH_TOKEN_KEY: &str = "auth_token";
/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Storage key for the JSON-encoded user.
pub const USER_KEY: &str = "user";

/// The persisted sign-in state.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: User,
}

impl From<AuthResponse> for StoredSession {
    fn from(auth: AuthResponse) -> Self {
        Self {
            access_token: auth.access_token,
            refresh_token: Some(auth.refresh_token),
            user: auth.user,
        }
    }
}
