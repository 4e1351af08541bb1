use std::{collections::BTreeMap, time::Duration};

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

use crate::types::{ClickEvent, ClickSummary};

/// Wire format of analytics bounds (`yyyy-MM-ddTHH:mm:ss`).
pub const LOCAL_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Wire format of aggregate-click bounds (`yyyy-MM-dd`).
pub const LOCAL_DATE_FORMAT: &str = "%Y-%m-%d";

pub const DEFAULT_TRUNCATE_LEN: usize = 45;

pub fn format_local_date_time(value: &NaiveDateTime) -> String {
    value.format(LOCAL_DATE_TIME_FORMAT).to_string()
}

pub fn format_local_date(value: &NaiveDate) -> String {
    value.format(LOCAL_DATE_FORMAT).to_string()
}

pub fn parse_local_date_time(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, LOCAL_DATE_TIME_FORMAT).ok()
}

/// Reads the timestamps the backend emits: local date-times with optional
/// fractional seconds, RFC 3339, or a bare date.
pub fn parse_backend_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    NaiveDate::parse_from_str(value, LOCAL_DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `2024-07-15T10:00:00` becomes `Jul 15, 2024`; unparseable input is kept.
pub fn format_date(value: &str) -> String {
    match parse_backend_timestamp(value) {
        Some(dt) => dt.format("%b %-d, %Y").to_string(),
        None => value.to_string(),
    }
}

/// `2024-07-15` becomes `Jul 15`; unparseable input is kept.
pub fn format_date_short(value: &str) -> String {
    match parse_backend_timestamp(value) {
        Some(dt) => dt.format("%b %-d").to_string(),
        None => value.to_string(),
    }
}

/// Drops the scheme and cuts the URL to `max_len` characters plus `…`.
pub fn truncate_url(url: &str, max_len: usize) -> String {
    let clean = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);

    if clean.chars().count() > max_len {
        let cut: String = clean.chars().take(max_len).collect();
        format!("{}…", cut)
    } else {
        clean.to_string()
    }
}

/// Public link for a short code; visiting it redirects and counts a click.
pub fn redirect_url(base_url: &str, short_url: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), short_url)
}

/// `[now - days, now]` for per-link analytics.
pub fn analytics_window(now: NaiveDateTime, days: i64) -> (NaiveDateTime, NaiveDateTime) {
    (now - ChronoDuration::days(days), now)
}

/// `[today - days, today]` for the aggregate overview.
pub fn overview_window(today: NaiveDate, days: i64) -> (NaiveDate, NaiveDate) {
    (today - ChronoDuration::days(days), today)
}

/// Converts the aggregate-click map into a date-ordered series.
pub fn overview_series(totals: &BTreeMap<String, u64>) -> Vec<ClickEvent> {
    let mut series: Vec<ClickEvent> = totals
        .iter()
        .map(|(date, count)| ClickEvent {
            click_date: date.clone(),
            count: *count,
        })
        .collect();
    series.sort_by(|a, b| a.click_date.cmp(&b.click_date));
    series
}

pub fn summarize_clicks(events: &[ClickEvent]) -> ClickSummary {
    let total: u64 = events.iter().map(|e| e.count).sum();
    let days = events.len();
    let average = if days == 0 {
        0
    } else {
        (total as f64 / days as f64).round() as u64
    };
    let max = events.iter().map(|e| e.count).max().unwrap_or(0).max(1);

    ClickSummary {
        total,
        average,
        days,
        max,
    }
}

/// Horizontal bar proportional to `count / max`, at most `width` cells.
///
/// Non-zero counts always get at least one cell so they stay visible.
pub fn render_bar(count: u64, max: u64, width: usize) -> String {
    if count == 0 || max == 0 || width == 0 {
        return String::new();
    }
    let ratio = (count.min(max) as f64) / (max as f64);
    let cells = ((ratio * width as f64).round() as usize).clamp(1, width);
    "█".repeat(cells)
}

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One cell per day scaled to the busiest day; empty days keep the lowest level.
pub fn sparkline(events: &[ClickEvent]) -> String {
    let max = events.iter().map(|e| e.count).max().unwrap_or(0).max(1);
    events
        .iter()
        .map(|e| {
            let level = (e.count.min(max) as f64 / max as f64 * 7.0).round() as usize;
            SPARK_LEVELS[level.min(7)]
        })
        .collect()
}

pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}

/// Asks a yes/no question, defaulting to no. `assume_yes` answers it
/// without touching the terminal.
pub fn confirm(prompt: &str, assume_yes: bool) -> dialoguer::Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    Confirm::new().with_prompt(prompt).default(false).interact()
}

pub fn copy_to_clipboard(text: &str) -> Result<(), arboard::Error> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text)
}
