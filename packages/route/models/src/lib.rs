#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Walking route types: alternatives as returned by a directions service,
//! their risk scores, and the ranked, tier-labeled result.

use safepath_crime_models::IncidentRecord;
use safepath_spatial::{Bounds, Coordinate};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Distance and duration of a route's single walking leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegSummary {
    /// Walking distance in meters.
    pub distance_meters: u64,
    /// Estimated walking time in seconds.
    pub duration_seconds: u64,
    /// Human-readable distance from the directions service, e.g. `"1.2 km"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_text: Option<String>,
    /// Human-readable duration from the directions service, e.g. `"15 mins"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_text: Option<String>,
}

impl LegSummary {
    /// A leg without display text.
    #[must_use]
    pub const fn new(distance_meters: u64, duration_seconds: u64) -> Self {
        Self {
            distance_meters,
            duration_seconds,
            distance_text: None,
            duration_text: None,
        }
    }
}

/// One candidate path between an origin and a destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAlternative {
    /// Short name for the route, usually the main street it follows.
    #[serde(default)]
    pub summary: String,
    /// Ordered path vertices.
    pub polyline: Vec<Coordinate>,
    /// Leg metadata.
    pub leg: LegSummary,
}

/// Scores derived from one route and the session's incident set.
///
/// `safety_score`, `efficiency_score`, and `composite_score` lie between
/// the configured floor and 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteScores {
    /// Sum of severity weights of incidents near the route.
    pub risk_score: u32,
    /// Number of distinct incidents near the route.
    pub nearby_incidents: u32,
    /// Safety score, higher is safer.
    pub safety_score: u32,
    /// Speed score, higher is quicker.
    pub efficiency_score: u32,
    /// Weighted blend of safety and efficiency used for ranking.
    pub composite_score: u32,
}

/// A route alternative together with its scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredRoute {
    /// The scored alternative.
    #[serde(flatten)]
    pub route: RouteAlternative,
    /// Its scores.
    #[serde(flatten)]
    pub scores: RouteScores,
}

/// Qualitative recommendation for a ranked route.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RouteTier {
    /// Highest composite score.
    Safest,
    /// Second place.
    Balanced,
    /// Third place.
    Fastest,
    /// Too dangerous to recommend. Not assigned by the ranking.
    Avoid,
}

impl RouteTier {
    /// The tier for a zero-based rank, or `None` past the third place.
    #[must_use]
    pub const fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            0 => Some(Self::Safest),
            1 => Some(Self::Balanced),
            2 => Some(Self::Fastest),
            _ => None,
        }
    }
}

/// A scored route in its final position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedRoute {
    /// Zero-based rank, best first.
    pub rank: usize,
    /// Recommendation tier.
    pub tier: RouteTier,
    /// The scored route.
    #[serde(flatten)]
    pub route: ScoredRoute,
}

/// The complete answer to a walking route request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlan {
    /// Origin as requested.
    pub origin: String,
    /// Destination as requested.
    pub destination: String,
    /// Ranked alternatives, best first.
    pub routes: Vec<RankedRoute>,
    /// Incidents close to any of the routes, for map markers.
    pub nearby_incidents: Vec<IncidentRecord>,
    /// Viewport covering every route.
    pub bounds: Option<Bounds>,
    /// Link opening the same walking request in Google Maps.
    pub maps_url: String,
}
