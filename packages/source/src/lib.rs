#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident feed trait, fetching, and normalization.
//!
//! Each upstream provider implements [`IncidentFeed`] to fetch a bounded,
//! recent window of raw records and normalize them into
//! [`IncidentRecord`]s. [`IncidentStore`] wraps the result for the
//! lifetime of a session.

pub mod feed_def;
pub mod normalize;
pub mod parsing;
pub mod registry;
pub mod retry;
pub mod socrata;
pub mod store;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use safepath_crime_models::IncidentRecord;

use crate::feed_def::{FeedDefinition, FetcherConfig};
use crate::socrata::{SocrataConfig, fetch_socrata};

pub use crate::store::IncidentStore;

/// Per-request timeout for feed HTTP calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur during feed operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP status {status}")]
    Status {
        /// The returned status code.
        status: reqwest::StatusCode,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A feed definition could not be parsed.
    #[error("Feed config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Data normalization error.
    #[error("Normalization error: {message}")]
    Normalization {
        /// Description of what went wrong.
        message: String,
    },
}

/// Trait that all incident feeds must implement.
#[async_trait]
pub trait IncidentFeed: Send + Sync {
    /// Returns a unique identifier for this feed (e.g., `"nyc_bronx"`).
    fn id(&self) -> &str;

    /// Returns the human-readable name of this feed.
    fn name(&self) -> &str;

    /// Fetches the feed's lookback window ending at `now` and normalizes
    /// it into incident records.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the fetch or parse fails.
    async fn fetch(&self, now: DateTime<Utc>) -> Result<Vec<IncidentRecord>, SourceError>;
}

/// An [`IncidentFeed`] driven by a [`FeedDefinition`].
pub struct DefinedFeed {
    definition: FeedDefinition,
    client: reqwest::Client,
}

impl DefinedFeed {
    /// Creates a feed for the given definition.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(definition: FeedDefinition) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { definition, client })
    }

    /// The definition driving this feed.
    #[must_use]
    pub const fn definition(&self) -> &FeedDefinition {
        &self.definition
    }
}

#[async_trait]
impl IncidentFeed for DefinedFeed {
    fn id(&self) -> &str {
        &self.definition.id
    }

    fn name(&self) -> &str {
        &self.definition.name
    }

    async fn fetch(&self, now: DateTime<Utc>) -> Result<Vec<IncidentRecord>, SourceError> {
        let def = &self.definition;
        let records = match &def.fetcher {
            FetcherConfig::Socrata {
                api_url,
                date_column,
                region_column,
            } => {
                let region = region_column
                    .as_deref()
                    .zip(def.region.as_deref());
                fetch_socrata(
                    &self.client,
                    &SocrataConfig {
                        api_url,
                        date_column,
                        region,
                        lookback_days: def.lookback_days,
                        limit: def.limit,
                        label: &def.name,
                    },
                    now,
                )
                .await?
            }
        };

        Ok(normalize::normalize_records(def, &records, now))
    }
}
