//! Analytics summary shaped into chart series.

use std::sync::Arc;

use paveos_api::{AnalyticsSummary, LeadService, LeadStatus, StageBreakdown, TimeRange};
use tracing::{debug, warn};

use crate::error::Result;
use crate::notify::Notifier;

/// Number of chart palette slots.
pub const PALETTE_SIZE: u8 = 5;

/// A chart palette slot, 1 through [`PALETTE_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartColor(u8);

impl ChartColor {
    /// Stable colour for a source: fixed slots for known sources, a hash
    /// of the name for anything else.
    pub fn for_source(source: &str) -> Self {
        let slot = match source {
            "discord" => 1,
            "manual" => 2,
            "whop" => 3,
            "referral" => 4,
            "instagram" => 5,
            other => (fnv1a(other) % u64::from(PALETTE_SIZE)) as u8 + 1,
        };
        ChartColor(slot)
    }

    pub fn slot(self) -> u8 {
        self.0
    }

    /// CSS colour referencing the themed chart variable.
    pub fn css(self) -> String {
        format!("hsl(var(--chart-{}))", self.0)
    }
}

fn fnv1a(input: &str) -> u64 {
    input.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// One bar of the pipeline chart.
#[derive(Debug, Clone, PartialEq)]
pub struct StagePoint {
    pub stage: LeadStatus,
    pub label: String,
    pub count: u64,
    pub value: f64,
}

/// One slice of the source pie.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSlice {
    pub source: String,
    pub label: String,
    pub count: u64,
    pub won: u64,
    pub revenue: f64,
    pub color: ChartColor,
}

/// A headline stat card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlineStat {
    pub title: &'static str,
    pub value: String,
    pub description: String,
}

/// Every stage in display order; stages absent from the payload are zero.
pub fn pipeline_series(summary: &AnalyticsSummary) -> Vec<StagePoint> {
    LeadStatus::STAGES
        .into_iter()
        .map(|stage| {
            let StageBreakdown { count, value } = summary
                .pipeline_breakdown
                .get(stage.as_str())
                .cloned()
                .unwrap_or_default();
            StagePoint {
                label: stage.display_name().to_string(),
                stage,
                count,
                value,
            }
        })
        .collect()
}

/// Sources with at least one lead, in payload order.
pub fn source_series(summary: &AnalyticsSummary) -> Vec<SourceSlice> {
    summary
        .source_breakdown
        .iter()
        .filter(|(_, data)| data.count > 0)
        .map(|(source, data)| SourceSlice {
            source: source.clone(),
            label: capitalize(source),
            count: data.count,
            won: data.won,
            revenue: data.revenue,
            color: ChartColor::for_source(source),
        })
        .collect()
}

/// The four stat cards above the charts.
pub fn headline(summary: &AnalyticsSummary) -> Vec<HeadlineStat> {
    let closed = summary.won_leads + summary.lost_leads;
    vec![
        HeadlineStat {
            title: "Total Revenue",
            value: format_currency(summary.total_revenue),
            description: format!("{} won deals", summary.won_leads),
        },
        HeadlineStat {
            title: "Win Rate",
            value: format!("{}%", summary.win_rate),
            description: format!("{} of {} closed", summary.won_leads, closed),
        },
        HeadlineStat {
            title: "Active Deals",
            value: summary.active_deals.to_string(),
            description: "In pipeline".to_string(),
        },
        HeadlineStat {
            title: "Avg Deal Size",
            value: format_currency(summary.avg_deal_size),
            description: "Per deal".to_string(),
        },
    ]
}

/// Dollars with thousands separators, e.g. `$12,345` or `$1,234.5`.
///
/// Display only. Amounts are rounded to whole cents, so at most two
/// fraction digits are shown (trailing zeros dropped); averages and
/// sub-cent values are rounded here rather than by the caller.
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return "$0".to_string();
    }
    let cents = (amount.abs() * 100.0).round() as u64;
    let (whole, fraction) = (cents / 100, cents % 100);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    match fraction {
        0 => format!("{sign}${grouped}"),
        f if f % 10 == 0 => format!("{sign}${grouped}.{}", f / 10),
        f => format!("{sign}${grouped}.{f:02}"),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Analytics page state: the selected range and the last summary fetched
/// for it.
pub struct AnalyticsView {
    service: Arc<dyn LeadService>,
    notifier: Notifier,
    range: TimeRange,
    summary: Option<AnalyticsSummary>,
}

impl AnalyticsView {
    pub fn new(service: Arc<dyn LeadService>, notifier: Notifier) -> Self {
        Self {
            service,
            notifier,
            range: TimeRange::default(),
            summary: None,
        }
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn summary(&self) -> Option<&AnalyticsSummary> {
        self.summary.as_ref()
    }

    /// Select a range and fetch its summary, replacing the previous one.
    ///
    /// On failure both the range and the summary stay as they were.
    pub async fn select(&mut self, range: TimeRange) -> Result<&AnalyticsSummary> {
        match self.service.analytics(range).await {
            Ok(summary) => {
                debug!(range = %range, leads = summary.total_leads, "Loaded analytics");
                self.range = range;
                Ok(self.summary.insert(summary))
            }
            Err(e) => {
                warn!(range = %range, error = %e, "Failed to load analytics");
                self.notifier.error(e.user_message());
                Err(e.into())
            }
        }
    }

    /// Fetch the current range again.
    pub async fn refresh(&mut self) -> Result<&AnalyticsSummary> {
        self.select(self.range).await
    }

    pub fn pipeline_series(&self) -> Vec<StagePoint> {
        pipeline_series(self.summary.as_ref().unwrap_or(&AnalyticsSummary::default()))
    }

    pub fn source_series(&self) -> Vec<SourceSlice> {
        self.summary.as_ref().map(source_series).unwrap_or_default()
    }

    pub fn headline(&self) -> Vec<HeadlineStat> {
        headline(self.summary.as_ref().unwrap_or(&AnalyticsSummary::default()))
    }
}
