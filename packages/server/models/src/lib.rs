#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the SafePath server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the store types to allow independent evolution of the API
//! contract.

use chrono::{DateTime, Utc};
use safepath_crime_models::{IncidentRecord, IncidentSeverity};
use safepath_reports_models::{CommunityReport, ReportCategory, ReportStatistics};
use safepath_route_models::RouteAlternative;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Always `true` when the server answers.
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Number of incidents loaded for this session.
    pub incidents_loaded: usize,
    /// Whether the last report write was dropped.
    pub reports_degraded: bool,
}

/// Error body returned with every non-success status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// User-facing message.
    pub error: String,
    /// ID of the existing report a submission duplicates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_id: Option<String>,
}

impl ApiError {
    /// An error with only a message.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            existing_id: None,
        }
    }
}

/// An incident as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIncident {
    /// Feed-assigned ID.
    pub id: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// When the incident occurred (ISO 8601).
    pub occurred_at: DateTime<Utc>,
    /// Severity level name.
    pub severity: IncidentSeverity,
    /// Severity numeric value (1-3).
    pub severity_value: u8,
    /// Offense description.
    pub description: Option<String>,
}

impl From<&IncidentRecord> for ApiIncident {
    fn from(record: &IncidentRecord) -> Self {
        Self {
            id: record.id.clone(),
            latitude: record.location.latitude,
            longitude: record.location.longitude,
            occurred_at: record.occurred_at,
            severity: record.severity,
            severity_value: record.severity.value(),
            description: record.description.clone(),
        }
    }
}

/// Query parameters for the incidents endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentQueryParams {
    /// Maximum number of results, newest first.
    pub limit: Option<usize>,
    /// Only incidents of this severity.
    pub severity: Option<IncidentSeverity>,
}

/// Body of a route planning request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    /// Starting address.
    pub origin: String,
    /// Destination address.
    pub destination: String,
}

/// Body of a request to rank caller-supplied alternatives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRoutesRequest {
    /// Starting address, for the maps link.
    #[serde(default)]
    pub origin: String,
    /// Destination address, for the maps link.
    #[serde(default)]
    pub destination: String,
    /// Alternatives to score.
    pub routes: Vec<RouteAlternative>,
}

/// Query parameters for the reports endpoint.
///
/// With `lat` and `lng` the result is limited to `radius` meters around
/// that point; with `category` to that category.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQueryParams {
    /// Center latitude.
    pub lat: Option<f64>,
    /// Center longitude.
    pub lng: Option<f64>,
    /// Radius in meters.
    pub radius: Option<f64>,
    /// Category name.
    pub category: Option<String>,
}

/// A community report with display helpers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReport {
    /// The report.
    #[serde(flatten)]
    pub report: CommunityReport,
    /// Category label.
    pub label: String,
    /// Category marker icon.
    pub icon: String,
    /// Relative age, e.g. `"3h ago"`.
    pub time_ago: String,
}

impl ApiReport {
    /// Decorates `report` as seen at `now`.
    #[must_use]
    pub fn new(report: CommunityReport, now: DateTime<Utc>) -> Self {
        Self {
            label: report.category.label().to_string(),
            icon: report.category.icon().to_string(),
            time_ago: report.time_ago(now),
            report,
        }
    }
}

/// Body of a vote request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    /// `true` for an upvote, `false` for a downvote.
    pub up: bool,
}

/// Report statistics response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReportStats {
    /// Aggregate counts.
    #[serde(flatten)]
    pub statistics: ReportStatistics,
    /// Whether the last report write was dropped.
    pub degraded: bool,
}

/// A report category as listed by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCategory {
    /// Category name as accepted by the API.
    pub name: ReportCategory,
    /// Human-readable label.
    pub label: String,
    /// Marker icon.
    pub icon: String,
}

impl From<ReportCategory> for ApiCategory {
    fn from(category: ReportCategory) -> Self {
        Self {
            name: category,
            label: category.label().to_string(),
            icon: category.icon().to_string(),
        }
    }
}
