//! Authentication payloads.

use serde::{Deserialize, Serialize};

/// The signed-in PaveOS user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_plan: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whop_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Tokens and profile issued by every sign-in endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Identity supplied by the Whop embedding host, exchanged for PaveOS
/// tokens via `POST /auth/whop`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhopHandoff {
    pub whop_user_id: String,
    pub whop_company_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl WhopHandoff {
    /// Build a handoff. The display name falls back to the email when the
    /// host gives no username.
    pub fn new(
        whop_user_id: impl Into<String>,
        whop_company_id: impl Into<String>,
        email: Option<String>,
        username: Option<String>,
    ) -> Self {
        let name = username.or_else(|| email.clone());
        Self {
            whop_user_id: whop_user_id.into(),
            whop_company_id: whop_company_id.into(),
            email,
            name,
        }
    }
}

/// `POST /auth/refresh` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whop_handoff_name_falls_back_to_email() {
        let handoff = WhopHandoff::new("user_1", "biz_1", Some("a@b.co".into()), None);
        assert_eq!(handoff.name.as_deref(), Some("a@b.co"));

        let body = serde_json::to_value(&handoff).unwrap();
        assert_eq!(body["whopUserId"], "user_1");
        assert_eq!(body["whopCompanyId"], "biz_1");
    }

    #[test]
    fn test_auth_response_deserialize() {
        let auth: AuthResponse = serde_json::from_str(
            r#"{"user": {"id": "u1", "email": "a@b.co", "name": "Ada", "subscriptionPlan": "Pro"},
                "accessToken": "at", "refreshToken": "rt"}"#,
        )
        .unwrap();
        assert_eq!(auth.user.subscription_plan.as_deref(), Some("Pro"));
        assert_eq!(auth.access_token, "at");
    }
}
