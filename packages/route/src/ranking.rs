//! Ranking, tier labeling, and the near-route incident display set.

use std::collections::BTreeSet;

use safepath_crime_models::IncidentRecord;
use safepath_route_models::{RankedRoute, RouteTier, ScoredRoute};
use safepath_spatial::{densify, is_near_any};

use crate::config::ScoringConfig;

/// Orders routes by descending composite score and labels them.
///
/// Ties keep their input order. Only the first `max_alternatives` routes
/// are kept; at most three tiers exist, so anything ranked past third
/// place is dropped as well. [`RouteTier::Avoid`] is never assigned.
#[must_use]
pub fn rank_routes(mut routes: Vec<ScoredRoute>, config: &ScoringConfig) -> Vec<RankedRoute> {
    if routes.len() > config.max_alternatives {
        log::warn!(
            "Ranking {} of {} route alternatives",
            config.max_alternatives,
            routes.len()
        );
        routes.truncate(config.max_alternatives);
    }

    routes.sort_by(|a, b| b.scores.composite_score.cmp(&a.scores.composite_score));

    routes
        .into_iter()
        .enumerate()
        .map_while(|(rank, route)| {
            RouteTier::for_rank(rank).map(|tier| RankedRoute { rank, tier, route })
        })
        .collect()
}

/// Incidents within the display radius of any densified point of any
/// route, each listed once, in incident order.
#[must_use]
pub fn incidents_near_routes(
    routes: &[RankedRoute],
    incidents: &[IncidentRecord],
    config: &ScoringConfig,
) -> Vec<IncidentRecord> {
    let paths: Vec<_> = routes
        .iter()
        .map(|r| densify(&r.route.route.polyline))
        .collect();

    let mut seen = BTreeSet::new();
    incidents
        .iter()
        .filter(|incident| {
            paths
                .iter()
                .any(|path| is_near_any(incident.location, path, config.display_radius_meters))
        })
        .filter(|incident| seen.insert(incident.id.as_str()))
        .cloned()
        .collect()
}
