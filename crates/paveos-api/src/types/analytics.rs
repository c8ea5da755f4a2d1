//! Analytics summary returned by `/dashboard/analytics`.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-source aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceBreakdown {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub won: u64,
    #[serde(default)]
    pub revenue: f64,
}

/// Per-stage aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageBreakdown {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub value: f64,
}

/// Revenue for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    pub month: String,
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub deals: u64,
}

/// Read-only analytics snapshot for one time range.
///
/// Breakdown maps keep the key order of the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    #[serde(default)]
    pub total_revenue: f64,
    /// Percentage, 0-100.
    #[serde(default)]
    pub win_rate: f64,
    #[serde(default)]
    pub active_deals: u64,
    #[serde(default)]
    pub avg_deal_size: f64,
    #[serde(default)]
    pub total_leads: u64,
    #[serde(default)]
    pub won_leads: u64,
    #[serde(default)]
    pub lost_leads: u64,
    #[serde(default)]
    pub source_breakdown: IndexMap<String, SourceBreakdown>,
    #[serde(default)]
    pub pipeline_breakdown: IndexMap<String, StageBreakdown>,
    #[serde(default)]
    pub monthly_revenue: Vec<MonthlyRevenue>,
}

/// Time window the analytics summary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeRange {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl TimeRange {
    /// Every selectable range.
    pub const ALL: [TimeRange; 4] = [
        TimeRange::Week,
        TimeRange::Month,
        TimeRange::Quarter,
        TimeRange::Year,
    ];

    /// Number of days covered.
    pub fn days(self) -> u32 {
        match self {
            TimeRange::Week => 7,
            TimeRange::Month => 30,
            TimeRange::Quarter => 90,
            TimeRange::Year => 365,
        }
    }

    /// Value of the `timeRange` query parameter.
    pub fn as_query(self) -> String {
        self.days().to_string()
    }

    /// Label shown next to the selector.
    pub fn label(self) -> &'static str {
        match self {
            TimeRange::Week => "Last 7 days",
            TimeRange::Month => "Last 30 days",
            TimeRange::Quarter => "Last 90 days",
            TimeRange::Year => "Last year",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let days = s.trim().trim_end_matches('d');
        TimeRange::ALL
            .into_iter()
            .find(|range| range.as_query() == days)
            .ok_or_else(|| format!("unsupported time range {s:?} (use 7, 30, 90 or 365)"))
    }
}

/// Period selector for the dashboard revenue chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RevenuePeriod {
    #[serde(rename = "7d")]
    SevenDays,
    #[default]
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "90d")]
    NinetyDays,
}
