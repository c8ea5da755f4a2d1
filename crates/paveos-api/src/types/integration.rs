//! Discord and Whop integration status.

use serde::{Deserialize, Serialize};

/// State of the Discord bot integration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordStatus {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub bot_active: Option<bool>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub guild_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub connected_at: Option<String>,
    #[serde(default)]
    pub last_sync_at: Option<String>,
    #[serde(default)]
    pub synced_members_count: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Outcome of a member/customer import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub updated: u64,
    #[serde(default)]
    pub skipped: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub last_sync_at: Option<String>,
}

/// `GET /integrations/discord/oauth-url` payload.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OAuthUrl {
    pub url: String,
}

/// `POST /integrations/discord/callback` body.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct OAuthCallback<'a> {
    pub code: &'a str,
    pub state: &'a str,
}

/// State of the Whop integration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhopStatus {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub connected_at: Option<String>,
    #[serde(default)]
    pub last_sync_at: Option<String>,
    #[serde(default)]
    pub synced_customers_count: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /integrations/whop/connect` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhopConnection {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub company_id: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub message: String,
}
