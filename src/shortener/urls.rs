use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::{
    shortener::{client::AuthClient, error::ApiError, transport::ApiRequest},
    types::{ClickEvent, CreateUrlRequest, UrlRecord},
    utils,
};

/// Shortens `original_url` (trimmed) and returns the new record.
///
/// # Errors
///
/// [`ApiError::Validation`] without any network traffic when the input is
/// blank.
pub async fn create_short_url(
    client: &AuthClient,
    original_url: &str,
) -> Result<UrlRecord, ApiError> {
    let original_url = original_url.trim();
    if original_url.is_empty() {
        return Err(ApiError::Validation("Please enter a URL".into()));
    }

    let body = CreateUrlRequest {
        original_url: original_url.to_string(),
    };
    let request = ApiRequest::post(["urls", "shorten"]).with_json(&body)?;
    client.execute(request).await?.json()
}

/// Lists the signed-in user's links.
pub async fn my_urls(client: &AuthClient) -> Result<Vec<UrlRecord>, ApiError> {
    client
        .execute(ApiRequest::get(["urls", "my-urls"]))
        .await?
        .json()
}

pub async fn delete_url(client: &AuthClient, short_url: &str) -> Result<(), ApiError> {
    client
        .execute(ApiRequest::delete(["urls", short_url]))
        .await?;
    Ok(())
}

/// Per-day clicks for one link between `start` and `end`.
///
/// Bounds go out as local date-times (`yyyy-MM-ddTHH:mm:ss`); the backend
/// rejects any other shape.
pub async fn analytics(
    client: &AuthClient,
    short_url: &str,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> Result<Vec<ClickEvent>, ApiError> {
    let request = ApiRequest::get(["urls", "analytics", short_url])
        .with_query("startDate", utils::format_local_date_time(start))
        .with_query("endDate", utils::format_local_date_time(end));

    let response = client.execute(request).await?;
    if response.body().is_empty() {
        return Ok(Vec::new());
    }
    let events: Option<Vec<ClickEvent>> = response.json()?;
    Ok(events.unwrap_or_default())
}

/// Clicks across all of the user's links, keyed by `yyyy-MM-dd`.
///
/// Bounds go out as dates only (`yyyy-MM-dd`).
pub async fn total_clicks(
    client: &AuthClient,
    start: &NaiveDate,
    end: &NaiveDate,
) -> Result<BTreeMap<String, u64>, ApiError> {
    let request = ApiRequest::get(["urls", "total-clicks"])
        .with_query("startDate", utils::format_local_date(start))
        .with_query("endDate", utils::format_local_date(end));

    let response = client.execute(request).await?;
    if response.body().is_empty() {
        return Ok(BTreeMap::new());
    }
    let totals: Option<BTreeMap<String, u64>> = response.json()?;
    Ok(totals.unwrap_or_default())
}
