use tabled::Table;
use tracing::debug;

use crate::{
    config, error, info,
    shortener::urls,
    success,
    types::UrlTableRow,
    utils::{self, DEFAULT_TRUNCATE_LEN},
    warning,
};

pub async fn shorten(original_url: String) {
    let client = super::connect().await;

    let pb = utils::spinner("Shortening...");
    let result = urls::create_short_url(&client, &original_url).await;
    pb.finish_and_clear();

    match result {
        Ok(record) => {
            success!("Short URL created!");
            info!(
                "{}",
                utils::redirect_url(&config::api_base_url(), &record.short_url)
            );
        }
        Err(e) => error!("{}", e.user_message("Failed to create short URL")),
    }
}

pub async fn list_urls(search: Option<String>) {
    let client = super::connect().await;

    let pb = utils::spinner("Fetching your URLs...");
    let result = urls::my_urls(&client).await;
    pb.finish_and_clear();

    let mut records = match result {
        Ok(records) => records,
        Err(e) => error!("{}", e.user_message("Failed to load URLs")),
    };

    if let Some(term) = search {
        let term = term.to_lowercase();
        records.retain(|r| {
            r.short_url.to_lowercase().contains(&term)
                || r.original_url.to_lowercase().contains(&term)
        });
    }

    if records.is_empty() {
        warning!("No URLs yet. Create your first one with sorturl shorten <URL>.");
        return;
    }

    let count = records.len();
    let table_rows: Vec<UrlTableRow> = records
        .into_iter()
        .map(|r| UrlTableRow {
            short_url: r.short_url,
            original_url: utils::truncate_url(&r.original_url, DEFAULT_TRUNCATE_LEN),
            clicks: r.click_count,
            created: r
                .created_date
                .as_deref()
                .map(utils::format_date)
                .unwrap_or_default(),
        })
        .collect();

    println!("{}", Table::new(table_rows));
    info!("{} total", count);
}

/// Copies the public link of `short_url` to the system clipboard.
pub fn copy_url(short_url: String) {
    let link = utils::redirect_url(&config::api_base_url(), &short_url);
    match utils::copy_to_clipboard(&link) {
        Ok(()) => {
            success!("Copied to clipboard!");
            info!("{}", link);
        }
        Err(e) => {
            debug!("clipboard unavailable: {}", e);
            error!("Failed to copy");
        }
    }
}

/// Deletes `short_url` after a confirmation prompt, skipped with `--yes`.
pub async fn delete_url(short_url: String, assume_yes: bool) {
    match utils::confirm(&format!("Delete {}?", short_url), assume_yes) {
        Ok(true) => {}
        Ok(false) => {
            info!("Cancelled");
            return;
        }
        Err(e) => error!("Cannot ask for confirmation, pass --yes to delete. Err: {}", e),
    }

    let client = super::connect().await;

    let pb = utils::spinner("Deleting...");
    let result = urls::delete_url(&client, &short_url).await;
    pb.finish_and_clear();

    match result {
        Ok(()) => success!("URL deleted"),
        Err(e) => error!("{}", e.user_message("Failed to delete URL")),
    }
}

pub fn open_url(short_url: String) {
    let link = utils::redirect_url(&config::api_base_url(), &short_url);
    if webbrowser::open(&link).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            link
        )
    }
}
