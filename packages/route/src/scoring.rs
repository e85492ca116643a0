//! Per-route risk scoring.
//!
//! A route's polyline is densified (each vertex plus the midpoint of every
//! consecutive pair) and each incident within the proximity radius of any
//! densified point counts once toward the route's risk, weighted by
//! severity. Scoring is a pure function of its inputs.

use std::collections::BTreeSet;

use safepath_crime_models::IncidentRecord;
use safepath_route_models::{RouteAlternative, RouteScores, ScoredRoute};
use safepath_spatial::{Coordinate, densify, is_near_any};

use crate::config::ScoringConfig;

/// Scores a polyline with the given walking duration against `incidents`.
#[must_use]
pub fn score_route(
    polyline: &[Coordinate],
    duration_seconds: u64,
    incidents: &[IncidentRecord],
    config: &ScoringConfig,
) -> RouteScores {
    let points = densify(polyline);

    let mut counted = BTreeSet::new();
    let mut risk_score: u32 = 0;
    for incident in incidents {
        if counted.contains(incident.id.as_str())
            || !is_near_any(incident.location, &points, config.proximity_radius_meters)
        {
            continue;
        }
        counted.insert(incident.id.as_str());
        risk_score = risk_score.saturating_add(config.weight(incident.severity));
    }

    let floor = i64::from(config.score_floor);
    let penalty = i64::from(risk_score) * i64::from(config.safety_penalty_per_risk);
    let safety = (100 - penalty).max(floor);

    let minutes = i64::try_from(duration_seconds / 60).unwrap_or(i64::MAX);
    let efficiency = 100_i64.saturating_sub(minutes).max(floor);

    RouteScores {
        risk_score,
        nearby_incidents: u32::try_from(counted.len()).unwrap_or(u32::MAX),
        safety_score: to_score(safety),
        efficiency_score: to_score(efficiency),
        composite_score: composite(safety, efficiency, config.safety_weight),
    }
}

/// Scores a route alternative.
#[must_use]
pub fn score_alternative(
    route: RouteAlternative,
    incidents: &[IncidentRecord],
    config: &ScoringConfig,
) -> ScoredRoute {
    let scores = score_route(
        &route.polyline,
        route.leg.duration_seconds,
        incidents,
        config,
    );
    log::debug!(
        "Route {:?}: risk {} from {} incidents, composite {}",
        route.summary,
        scores.risk_score,
        scores.nearby_incidents,
        scores.composite_score
    );
    ScoredRoute { route, scores }
}

/// Blends in thousandths so that halves round up exactly.
#[allow(clippy::cast_possible_truncation)]
fn composite(safety: i64, efficiency: i64, safety_weight: f64) -> u32 {
    let weight = (safety_weight.clamp(0.0, 1.0) * 1_000.0).round() as i64;
    let blended = safety * weight + efficiency * (1_000 - weight);
    to_score((blended + 500) / 1_000)
}

fn to_score(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
