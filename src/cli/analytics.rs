use chrono::Local;
use colored::Colorize;

use crate::{config, error, info, shortener::urls, types::AnalyticsRange, utils, warning};

const BAR_WIDTH: usize = 40;

/// Shows per-day clicks of one link over `range`.
///
/// # Output Example
///
/// ```text
/// [o] http://localhost:8080/api/v1/abc123 (30d)
/// [o] Total: 12 | Avg/day: 4 | Days: 3
/// Jul 13  ██████████████████████████              8
/// Jul 14  ███                                     1
/// Jul 15  ██████████                              3
/// ```
pub async fn analytics(short_url: String, range: AnalyticsRange) {
    let client = super::connect().await;

    let (start, end) = utils::analytics_window(Local::now().naive_local(), range.days());

    let pb = utils::spinner("Fetching analytics...");
    let result = urls::analytics(&client, &short_url, &start, &end).await;
    pb.finish_and_clear();

    let events = match result {
        Ok(events) => events,
        Err(e) => error!("{}", e.user_message("Failed to load analytics")),
    };

    info!(
        "{} ({})",
        utils::redirect_url(&config::api_base_url(), &short_url),
        range.label()
    );

    let summary = utils::summarize_clicks(&events);
    info!(
        "Total: {} | Avg/day: {} | Days: {}",
        summary.total, summary.average, summary.days
    );

    if events.is_empty() {
        warning!("No click data for this period");
        return;
    }

    for event in &events {
        let bar = format!(
            "{:<width$}",
            utils::render_bar(event.count, summary.max, BAR_WIDTH),
            width = BAR_WIDTH
        );
        println!(
            "{:<7} {} {}",
            utils::format_date_short(&event.click_date),
            bar.blue(),
            event.count
        );
    }
}
