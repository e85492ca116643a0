//! Tunable dedup, retention, and capacity limits for the report store.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Limits applied by the report store.
///
/// The dedup radius and window are tunables, not derived from any
/// location-accuracy model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ReportPolicy {
    /// Medium key the collection is stored under.
    pub storage_key: String,
    /// Maximum number of stored reports; the oldest are evicted first.
    pub max_reports: usize,
    /// Reports older than this many days are never returned.
    pub retention_days: u32,
    /// Same-category reports closer than this (and inside the dedup
    /// window) are duplicates.
    pub dedup_radius_meters: f64,
    /// Dedup time window in minutes.
    pub dedup_window_minutes: u32,
    /// Maximum comment length in characters.
    pub max_comment_chars: usize,
}

impl Default for ReportPolicy {
    fn default() -> Self {
        Self {
            storage_key: "safepath_community_reports".to_string(),
            max_reports: 1_000,
            retention_days: 30,
            dedup_radius_meters: 100.0,
            dedup_window_minutes: 60,
            max_comment_chars: 500,
        }
    }
}

impl ReportPolicy {
    /// Retention window as a duration.
    #[must_use]
    pub fn retention(&self) -> Duration {
        Duration::days(i64::from(self.retention_days))
    }

    /// Dedup time window as a duration.
    #[must_use]
    pub fn dedup_window(&self) -> Duration {
        Duration::minutes(i64::from(self.dedup_window_minutes))
    }
}
