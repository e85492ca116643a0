//! Config-driven incident feed definition.
//!
//! [`FeedDefinition`] captures everything unique about an upstream incident
//! feed: where to fetch it, which region and time window to request, and
//! which raw fields hold the values [`IncidentRecord`] needs. A single
//! generic fetcher handles every definition.
//!
//! [`IncidentRecord`]: safepath_crime_models::IncidentRecord

use serde::Deserialize;

use crate::SourceError;

const fn default_lookback_days() -> u32 {
    18
}

const fn default_limit() -> u64 {
    2_000
}

/// A complete, config-driven incident feed definition.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedDefinition {
    /// Unique identifier (e.g., `"nyc_bronx"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// City the feed covers.
    pub city: String,
    /// Region value the feed is filtered to (e.g., `"BRONX"`). Records
    /// reporting another region are discarded during normalization.
    #[serde(default)]
    pub region: Option<String>,
    /// How many days back from "now" to request.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    /// Maximum number of records to request.
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Human-readable data portal page.
    #[serde(default)]
    pub portal_url: Option<String>,
    /// How to fetch raw data.
    pub fetcher: FetcherConfig,
    /// Raw field names for normalization.
    pub fields: FieldMapping,
}

/// How to fetch raw records from the upstream API.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FetcherConfig {
    /// Socrata SODA API (`$limit/$order/$where`).
    Socrata {
        /// Dataset resource URL.
        api_url: String,
        /// Date column for ordering and the time-window filter.
        date_column: String,
        /// Column compared against [`FeedDefinition::region`] in the
        /// server-side filter.
        #[serde(default)]
        region_column: Option<String>,
    },
}

/// Maps raw record fields to [`IncidentRecord`] fields.
///
/// [`IncidentRecord`]: safepath_crime_models::IncidentRecord
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMapping {
    /// Field holding the upstream incident ID.
    pub id: String,
    /// Field holding the occurrence date (or full datetime).
    pub occurred_date: String,
    /// Optional field holding the occurrence time-of-day (`HH:MM:SS`).
    #[serde(default)]
    pub occurred_time: Option<String>,
    /// Latitude field (string or number).
    pub latitude: String,
    /// Longitude field (string or number).
    pub longitude: String,
    /// Law-category code field.
    pub severity: String,
    /// Description fields, tried in order; the first non-empty one wins.
    #[serde(default)]
    pub description: Vec<String>,
    /// Region field checked against [`FeedDefinition::region`].
    #[serde(default)]
    pub region: Option<String>,
}

/// Parses a feed definition from TOML.
///
/// # Errors
///
/// Returns [`SourceError::Config`] if the TOML is malformed or missing
/// required fields.
pub fn parse_feed_toml(toml_str: &str) -> Result<FeedDefinition, SourceError> {
    Ok(toml::from_str(toml_str)?)
}
