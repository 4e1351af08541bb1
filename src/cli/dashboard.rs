use chrono::Local;
use colored::Colorize;
use tabled::Table;
use tracing::debug;

use crate::{
    error, info,
    shortener::urls,
    types::{ClickEvent, StatTableRow},
    utils, warning,
};

const OVERVIEW_DAYS: i64 = 30;

/// Shows link and click totals plus the click overview of the last 30 days.
///
/// A failing overview request does not abort the command; its total falls
/// back to 0 and the chart is left out. A failing link list does.
pub async fn dashboard() {
    let client = super::connect().await;
    let (start, end) = utils::overview_window(Local::now().date_naive(), OVERVIEW_DAYS);

    let pb = utils::spinner("Loading dashboard...");
    let (links, totals) = tokio::join!(
        urls::my_urls(&client),
        urls::total_clicks(&client, &start, &end)
    );
    pb.finish_and_clear();

    let links = match links {
        Ok(links) => links,
        Err(e) => error!("{}", e.user_message("Failed to load URLs")),
    };

    let overview: Vec<ClickEvent> = match totals {
        Ok(totals) => utils::overview_series(&totals),
        Err(e) => {
            debug!("overview unavailable: {}", e);
            Vec::new()
        }
    };

    let total_clicks: u64 = links.iter().map(|l| l.click_count).sum();
    let last_30_days = utils::summarize_clicks(&overview).total;

    let stats = vec![
        StatTableRow {
            label: "Total Links".into(),
            value: links.len().to_string(),
        },
        StatTableRow {
            label: "Total Clicks".into(),
            value: total_clicks.to_string(),
        },
        StatTableRow {
            label: "Last 30 Days".into(),
            value: last_30_days.to_string(),
        },
    ];
    println!("{}", Table::new(stats));

    if overview.is_empty() {
        warning!("No click data yet");
        return;
    }

    info!("Click overview, all links, last 30 days");
    println!("{}", utils::sparkline(&overview).blue());
    if let (Some(first), Some(last)) = (overview.first(), overview.last()) {
        println!("{}  ..  {}", first.click_date, last.click_date);
    }
}
