//! Data models for the year-end review.
//!
//! This module contains the shoot record parsed from the ledger, the
//! per-analyzer summaries and the merged result handed to the report.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single photography booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShootRecord {
    /// Day of the shoot.
    pub date: NaiveDate,
    /// Client display name.
    pub client: String,
    /// Shoot type, e.g. "Portrait" or "Wedding".
    pub category: String,
    pub start_time: NaiveTime,
    /// Always after `start_time`; overnight shoots are not modeled.
    pub end_time: NaiveTime,
    /// Amount charged, never negative.
    pub amount: f64,
    pub payment_method: String,
}

impl ShootRecord {
    /// Booked duration in (fractional) hours.
    pub fn duration_hours(&self) -> f64 {
        (self.end_time - self.start_time).num_seconds() as f64 / 3600.0
    }

    /// Full month name of the shoot date, e.g. "January".
    pub fn month_label(&self) -> String {
        self.date.format("%B").to_string()
    }

    pub fn quarter(&self) -> Quarter {
        Quarter::from_month(self.date.month())
    }

    /// Start time as shown on the ledger, e.g. "2:00 PM".
    pub fn start_label(&self) -> String {
        self.start_time.format("%-I:%M %p").to_string()
    }
}

/// Calendar quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    /// Quarter of a 1-indexed month: `Q⌈month/3⌉`.
    pub fn from_month(month: u32) -> Self {
        match month {
            1..=3 => Quarter::Q1,
            4..=6 => Quarter::Q2,
            7..=9 => Quarter::Q3,
            _ => Quarter::Q4,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quarter::Q1 => write!(f, "Q1"),
            Quarter::Q2 => write!(f, "Q2"),
            Quarter::Q3 => write!(f, "Q3"),
            Quarter::Q4 => write!(f, "Q4"),
        }
    }
}

/// Revenue accumulated for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub month: String,
    pub revenue: f64,
    pub shoot_count: usize,
}

/// Revenue accumulated for one payment method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentBucket {
    pub method: String,
    pub revenue: f64,
    pub shoot_count: usize,
}

/// Output of the revenue analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueSummary {
    pub total_revenue: f64,
    /// Months in order of first appearance in the ledger.
    pub monthly_breakdown: Vec<MonthlyBucket>,
    pub average_per_shoot: f64,
    /// Payment methods in order of first appearance in the ledger.
    pub payment_methods: Vec<PaymentBucket>,
}

/// Profitability of one shoot category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBucket {
    pub category: String,
    pub total_revenue: f64,
    pub shoot_count: usize,
    pub total_hours: f64,
    /// `total_revenue / total_hours`; `None` when no hours were booked.
    pub avg_hourly_rate: Option<f64>,
}

/// Output of the category profitability analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilitySummary {
    /// Categories in order of first appearance in the ledger.
    pub by_type: Vec<CategoryBucket>,
    /// Category with the highest computable hourly rate.
    pub most_profitable: Option<String>,
    pub total_hours: f64,
    pub overall_hourly_rate: Option<f64>,
}

/// Booking count for one quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterBucket {
    pub quarter: Quarter,
    pub shoots: usize,
}

/// Output of the trend analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub busiest_month: Option<String>,
    pub most_common_start_time: Option<String>,
    pub total_shoots: usize,
    /// Always four buckets, Q1 through Q4.
    pub quarterly_breakdown: Vec<QuarterBucket>,
}

/// The merged output of all three analyzers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub revenue: RevenueSummary,
    pub profitability: ProfitabilitySummary,
    pub trends: TrendSummary,
}

/// Narrative produced by the insight synthesizer, or why there is none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Insights {
    Available { text: String },
    Unavailable { reason: String },
}

impl Insights {
    pub fn is_available(&self) -> bool {
        matches!(self, Insights::Available { .. })
    }
}

/// Metadata about a review run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Year the review was requested for.
    pub year: i32,
    pub records_analyzed: usize,
    /// Records dropped by the year filter.
    pub records_filtered: usize,
    /// Name of the insight synthesizer model.
    pub model_used: String,
    /// Wall-clock duration of the run in seconds.
    pub duration_seconds: f64,
}

/// Terminal output of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewOutput {
    /// The formatted Markdown document.
    pub report: String,
    pub generated_at: DateTime<Utc>,
    pub metadata: RunMetadata,
    pub analysis: AnalysisResult,
    pub insights: Insights,
}
