//! Socrata SODA API fetcher.
//!
//! Requests one bounded page of the most recent records for a region,
//! using the `$limit`, `$order`, and `$where` query parameters.

use chrono::{DateTime, Duration, Utc};

use crate::{SourceError, retry};

/// Configuration for a Socrata fetch operation.
pub struct SocrataConfig<'a> {
    /// Dataset resource URL
    /// (e.g., `"https://data.cityofnewyork.us/resource/5uac-w243.json"`).
    pub api_url: &'a str,
    /// Date column for ordering and the time-window filter.
    pub date_column: &'a str,
    /// Optional `(column, value)` region filter.
    pub region: Option<(&'a str, &'a str)>,
    /// Days back from `now` to request.
    pub lookback_days: u32,
    /// Maximum number of records.
    pub limit: u64,
    /// Label for log messages.
    pub label: &'a str,
}

/// Builds the SODA `$where` clause selecting records in the region whose
/// date falls between the start of the lookback window and the end of
/// today.
#[must_use]
pub fn build_where_clause(config: &SocrataConfig<'_>, now: DateTime<Utc>) -> String {
    let start = now - Duration::days(i64::from(config.lookback_days));
    let start_str = start.format("%Y-%m-%d");
    let end_str = now.format("%Y-%m-%d");
    let date_column = config.date_column;

    let window = format!(
        "{date_column} >= '{start_str}T00:00:00.000' AND {date_column} <= '{end_str}T23:59:59.999'"
    );

    match config.region {
        Some((column, value)) => {
            let escaped = value.replace('\'', "''");
            format!("{column}='{escaped}' AND {window}")
        }
        None => window,
    }
}

/// Fetches the raw record array for the configured window.
///
/// # Errors
///
/// Returns [`SourceError`] if the HTTP request fails after retries or the
/// response is not a JSON array.
pub async fn fetch_socrata(
    client: &reqwest::Client,
    config: &SocrataConfig<'_>,
    now: DateTime<Utc>,
) -> Result<Vec<serde_json::Value>, SourceError> {
    let where_clause = build_where_clause(config, now);
    let limit = config.limit.to_string();
    let order = format!("{} DESC", config.date_column);

    log::info!(
        "Fetching {} incidents: limit={limit}, where={where_clause}",
        config.label
    );

    let body = retry::send_json(|| {
        client.get(config.api_url).query(&[
            ("$limit", limit.as_str()),
            ("$where", where_clause.as_str()),
            ("$order", order.as_str()),
        ])
    })
    .await?;

    match body {
        serde_json::Value::Array(records) => {
            log::info!("Received {} raw {} records", records.len(), config.label);
            Ok(records)
        }
        other => {
            let message = other
                .get("message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("response is not a JSON array")
                .to_string();
            Err(SourceError::Normalization { message })
        }
    }
}
