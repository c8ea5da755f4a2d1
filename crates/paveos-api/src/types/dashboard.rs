//! Dashboard widgets.

use serde::{Deserialize, Serialize};

/// Headline numbers on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub total_revenue: f64,
    #[serde(default)]
    pub close_rate: f64,
    #[serde(default)]
    pub active_contacts: u64,
    #[serde(default)]
    pub deals_in_progress: u64,
    #[serde(default)]
    pub monthly_revenue: f64,
    #[serde(default)]
    pub weekly_revenue: f64,
    #[serde(default)]
    pub pending_payments: u64,
    #[serde(default)]
    pub overdue_payments: u64,
}

/// An entry in the recent-activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub related_entity_type: Option<String>,
    #[serde(default)]
    pub related_entity_id: Option<String>,
}

/// A point on the revenue chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenuePoint {
    pub date: String,
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub deals: u64,
}
