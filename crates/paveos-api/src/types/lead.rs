//! Lead records and pipeline stages.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::common::{Pagination, SortOrder};
use super::message::Message;

/// Pipeline stage a lead occupies.
///
/// The six known stages are fixed and ordered. Anything else the backend
/// sends is kept verbatim in [`LeadStatus::Unrecognized`] so callers can
/// surface it instead of losing the lead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeadStatus {
    New,
    InConversation,
    Proposal,
    Negotiation,
    Won,
    Lost,
    Unrecognized(String),
}

impl LeadStatus {
    /// Every known stage, in board display order.
    pub const STAGES: [LeadStatus; 6] = [
        LeadStatus::New,
        LeadStatus::InConversation,
        LeadStatus::Proposal,
        LeadStatus::Negotiation,
        LeadStatus::Won,
        LeadStatus::Lost,
    ];

    /// Wire identifier (e.g. `in_conversation`).
    pub fn as_str(&self) -> &str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::InConversation => "in_conversation",
            LeadStatus::Proposal => "proposal",
            LeadStatus::Negotiation => "negotiation",
            LeadStatus::Won => "won",
            LeadStatus::Lost => "lost",
            LeadStatus::Unrecognized(raw) => raw,
        }
    }

    /// Human readable stage name.
    pub fn display_name(&self) -> &str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::InConversation => "In Conversation",
            LeadStatus::Proposal => "Proposal",
            LeadStatus::Negotiation => "Negotiation",
            LeadStatus::Won => "Won",
            LeadStatus::Lost => "Lost",
            LeadStatus::Unrecognized(raw) => raw,
        }
    }

    /// Won and lost leads have left the active pipeline.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::Won | LeadStatus::Lost)
    }

    /// Whether this is one of the fixed stages.
    pub fn is_known(&self) -> bool {
        !matches!(self, LeadStatus::Unrecognized(_))
    }

    /// Parse user input as a known stage, accepting either the wire id or
    /// the display name (case-insensitive).
    pub fn parse_stage(input: &str) -> Option<LeadStatus> {
        let needle = input.trim().to_lowercase().replace([' ', '-'], "_");
        LeadStatus::STAGES
            .into_iter()
            .find(|stage| stage.as_str() == needle)
    }
}

impl From<String> for LeadStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "new" => LeadStatus::New,
            "in_conversation" => LeadStatus::InConversation,
            "proposal" => LeadStatus::Proposal,
            "negotiation" => LeadStatus::Negotiation,
            "won" => LeadStatus::Won,
            "lost" => LeadStatus::Lost,
            _ => LeadStatus::Unrecognized(raw),
        }
    }
}

impl From<LeadStatus> for String {
    fn from(status: LeadStatus) -> Self {
        match status {
            LeadStatus::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a lead came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeadSource {
    Discord,
    Instagram,
    Tiktok,
    Whop,
    Manual,
    Referral,
    Other(String),
}

impl LeadSource {
    /// Every known source.
    pub const KNOWN: [LeadSource; 6] = [
        LeadSource::Discord,
        LeadSource::Instagram,
        LeadSource::Tiktok,
        LeadSource::Whop,
        LeadSource::Manual,
        LeadSource::Referral,
    ];

    /// Wire identifier.
    pub fn as_str(&self) -> &str {
        match self {
            LeadSource::Discord => "discord",
            LeadSource::Instagram => "instagram",
            LeadSource::Tiktok => "tiktok",
            LeadSource::Whop => "whop",
            LeadSource::Manual => "manual",
            LeadSource::Referral => "referral",
            LeadSource::Other(raw) => raw,
        }
    }
}

impl From<String> for LeadSource {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "discord" => LeadSource::Discord,
            "instagram" => LeadSource::Instagram,
            "tiktok" => LeadSource::Tiktok,
            "whop" => LeadSource::Whop,
            "manual" => LeadSource::Manual,
            "referral" => LeadSource::Referral,
            _ => LeadSource::Other(raw),
        }
    }
}

impl From<LeadSource> for String {
    fn from(source: LeadSource) -> Self {
        match source {
            LeadSource::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prospective deal tracked through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Linked Discord identity; present once the lead has chatted via the bot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord_user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord_username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram_username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiktok_username: Option<String>,

    pub source: LeadSource,

    pub status: LeadStatus,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_contact_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_follow_up_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub won_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Unread incoming messages, maintained by the backend.
    #[serde(default)]
    pub unread_count: u32,
}

impl Lead {
    /// Estimated value, zero when unknown.
    pub fn estimated_or_zero(&self) -> f64 {
        self.estimated_value.unwrap_or(0.0)
    }

    /// Realised value of a won lead, falling back to the estimate.
    pub fn realised_value(&self) -> f64 {
        self.actual_value.or(self.estimated_value).unwrap_or(0.0)
    }
}

/// A lead together with its message history (`GET /leads/:id`).
#[derive(Debug, Clone, Deserialize)]
pub struct LeadDetail {
    pub lead: Lead,

    #[serde(default)]
    pub messages: Vec<Message>,
}

/// One page of leads (`GET /leads`).
#[derive(Debug, Clone, Deserialize)]
pub struct LeadList {
    #[serde(default)]
    pub leads: Vec<Lead>,

    #[serde(default)]
    pub pagination: Pagination,
}

/// Filters for listing leads.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LeadStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<LeadSource>,
    /// Comma separated tag list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

/// Partial lead payload for create (`POST /leads`) and update
/// (`PATCH /leads/:id`). Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiktok_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<LeadSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LeadStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_follow_up_date: Option<DateTime<Utc>>,
}

impl LeadUpdate {
    /// An update that only moves the lead to another stage.
    pub fn status(status: LeadStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Minimal create payload.
    pub fn new_lead(name: impl Into<String>, source: LeadSource) -> Self {
        Self {
            name: Some(name.into()),
            source: Some(source),
            status: Some(LeadStatus::New),
            ..Default::default()
        }
    }
}

/// Raw `{_id, count}` bucket from `/leads/stats`.
#[derive(Debug, Clone, Deserialize)]
pub struct CountBucket {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub count: u64,
}

/// Raw `/leads/stats` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLeadStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub by_status: Vec<CountBucket>,
    #[serde(default)]
    pub by_source: Vec<CountBucket>,
}

/// Lead counts per stage and per source, with every known key present.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadStats {
    pub total: u64,
    pub by_status: IndexMap<LeadStatus, u64>,
    pub by_source: IndexMap<LeadSource, u64>,
}

impl From<RawLeadStats> for LeadStats {
    fn from(raw: RawLeadStats) -> Self {
        let mut by_status: IndexMap<LeadStatus, u64> =
            LeadStatus::STAGES.into_iter().map(|s| (s, 0)).collect();
        for bucket in raw.by_status {
            let status = LeadStatus::from(bucket.id);
            if let Some(count) = by_status.get_mut(&status) {
                *count = bucket.count;
            }
        }

        let mut by_source: IndexMap<LeadSource, u64> =
            LeadSource::KNOWN.into_iter().map(|s| (s, 0)).collect();
        for bucket in raw.by_source {
            let source = LeadSource::from(bucket.id);
            if let Some(count) = by_source.get_mut(&source) {
                *count = bucket.count;
            }
        }

        Self {
            total: raw.total,
            by_status,
            by_source,
        }
    }
}

impl LeadStats {
    /// Count for one stage.
    pub fn status_count(&self, status: &LeadStatus) -> u64 {
        self.by_status.get(status).copied().unwrap_or(0)
    }

    /// Count for one source.
    pub fn source_count(&self, source: &LeadSource) -> u64 {
        self.by_source.get(source).copied().unwrap_or(0)
    }
}
