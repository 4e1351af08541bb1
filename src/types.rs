use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUrlRequest {
    pub original_url: String,
}

/// A shortened link as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlRecord {
    pub id: i64,
    pub original_url: String,
    pub short_url: String,
    #[serde(default)]
    pub click_count: u64,
    #[serde(default)]
    pub created_date: Option<String>,
}

/// Clicks on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub click_date: String,
    pub count: u64,
}

#[derive(Tabled)]
pub struct UrlTableRow {
    #[tabled(rename = "short url")]
    pub short_url: String,
    #[tabled(rename = "original")]
    pub original_url: String,
    pub clicks: u64,
    pub created: String,
}

#[derive(Tabled)]
pub struct StatTableRow {
    pub label: String,
    pub value: String,
}

/// Totals shown above a click series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickSummary {
    pub total: u64,
    pub average: u64,
    pub days: usize,
    /// Largest single-day count, never below 1 so it can scale bars.
    pub max: u64,
}

/// Time window offered for per-link analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AnalyticsRange {
    #[value(name = "7d")]
    Week,
    #[default]
    #[value(name = "30d")]
    Month,
    #[value(name = "90d")]
    Quarter,
}

impl AnalyticsRange {
    pub fn days(self) -> i64 {
        match self {
            AnalyticsRange::Week => 7,
            AnalyticsRange::Month => 30,
            AnalyticsRange::Quarter => 90,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AnalyticsRange::Week => "7d",
            AnalyticsRange::Month => "30d",
            AnalyticsRange::Quarter => "90d",
        }
    }
}
