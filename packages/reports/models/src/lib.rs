#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Community hazard report types.
//!
//! A [`CommunityReport`] is a user-submitted, unverified observation at a
//! point on the map. Reports are created from a [`NewReport`] by the
//! report store, which assigns the ID, timestamp, and initial vote.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use safepath_spatial::Coordinate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// What kind of hazard a report describes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ReportCategory {
    /// Dark or badly lit street.
    #[serde(alias = "dark")]
    #[strum(to_string = "poor-lighting", serialize = "dark")]
    PoorLighting,
    /// Generally feels unsafe.
    #[serde(alias = "unsafe")]
    #[strum(to_string = "general-unsafe", serialize = "unsafe")]
    GeneralUnsafe,
    /// People loitering or suspicious activity.
    Loitering,
    /// Verbal or physical harassment.
    Harassment,
    /// Anything else.
    Other,
}

impl ReportCategory {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::PoorLighting,
            Self::GeneralUnsafe,
            Self::Loitering,
            Self::Harassment,
            Self::Other,
        ]
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PoorLighting => "Poor lighting",
            Self::GeneralUnsafe => "General safety concern",
            Self::Loitering => "Suspicious activity",
            Self::Harassment => "Harassment",
            Self::Other => "Other",
        }
    }

    /// Marker icon for the map.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::PoorLighting => "\u{1f4a1}",
            Self::GeneralUnsafe => "\u{26a0}\u{fe0f}",
            Self::Loitering => "\u{1f465}",
            Self::Harassment => "\u{1f6ab}",
            Self::Other => "\u{2753}",
        }
    }
}

/// A user-submitted hazard report.
///
/// Only `verified` and `vote_count` ever change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityReport {
    /// Unique ID assigned at creation.
    pub id: String,
    /// Where the hazard was observed.
    pub location: Coordinate,
    /// Kind of hazard.
    pub category: ReportCategory,
    /// Optional free-text comment (may be empty).
    #[serde(default)]
    pub comment: String,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Whether the report has been verified.
    #[serde(default)]
    pub verified: bool,
    /// Net votes, never negative. Starts at 1 (the author's own vote).
    pub vote_count: u32,
}

impl CommunityReport {
    /// Age of the report at `now`.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }

    /// Short relative age for display: `"Just now"`, `"5h ago"`, `"3d ago"`.
    #[must_use]
    pub fn time_ago(&self, now: DateTime<Utc>) -> String {
        let age = self.age(now);
        let hours = age.num_hours();
        if hours < 1 {
            "Just now".to_string()
        } else if hours < 24 {
            format!("{hours}h ago")
        } else {
            format!("{}d ago", age.num_days())
        }
    }
}

/// A report as submitted by a user, before the store assigns identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    /// Where the hazard was observed.
    pub location: Coordinate,
    /// Kind of hazard.
    pub category: ReportCategory,
    /// Optional free-text comment.
    #[serde(default)]
    pub comment: Option<String>,
}

/// Aggregate view over the live (non-expired) reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStatistics {
    /// Number of live reports.
    pub total: usize,
    /// Live reports per category. Every category is present.
    pub by_category: BTreeMap<ReportCategory, usize>,
    /// Number of verified reports.
    pub verified: usize,
    /// Number of reports created in the last 24 hours.
    pub last_24h: usize,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone as _};

    use super::*;

    #[test]
    fn category_string_forms() {
        assert_eq!(ReportCategory::PoorLighting.to_string(), "poor-lighting");
        assert_eq!(ReportCategory::GeneralUnsafe.to_string(), "general-unsafe");
        assert_eq!(ReportCategory::Loitering.to_string(), "loitering");
        assert_eq!(
            "dark".parse::<ReportCategory>().unwrap(),
            ReportCategory::PoorLighting
        );
        assert_eq!(
            "general-unsafe".parse::<ReportCategory>().unwrap(),
            ReportCategory::GeneralUnsafe
        );
        assert!("flood".parse::<ReportCategory>().is_err());
    }

    #[test]
    fn category_serde_accepts_legacy_names() {
        let c: ReportCategory = serde_json::from_str("\"unsafe\"").unwrap();
        assert_eq!(c, ReportCategory::GeneralUnsafe);
        assert_eq!(
            serde_json::to_string(&ReportCategory::PoorLighting).unwrap(),
            "\"poor-lighting\""
        );
    }

    #[test]
    fn every_category_has_label_and_icon() {
        for category in ReportCategory::all() {
            assert!(!category.label().is_empty());
            assert!(!category.icon().is_empty());
        }
    }

    #[test]
    fn formats_time_ago() {
        let now = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
        let mut report = CommunityReport {
            id: "r".to_string(),
            location: Coordinate::new(40.84, -73.86),
            category: ReportCategory::Other,
            comment: String::new(),
            created_at: now - Duration::minutes(20),
            verified: false,
            vote_count: 1,
        };
        assert_eq!(report.time_ago(now), "Just now");

        report.created_at = now - Duration::hours(5);
        assert_eq!(report.time_ago(now), "5h ago");

        report.created_at = now - Duration::hours(75);
        assert_eq!(report.time_ago(now), "3d ago");
    }

    #[test]
    fn statistics_serialize_category_keys() {
        let stats = ReportStatistics {
            total: 1,
            by_category: BTreeMap::from([(ReportCategory::Harassment, 1)]),
            verified: 0,
            last_24h: 1,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["byCategory"]["harassment"], 1);
        assert_eq!(json["last24h"], 1);
    }
}
