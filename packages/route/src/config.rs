//! Scoring tunables.

use safepath_crime_models::IncidentSeverity;
use serde::{Deserialize, Serialize};

/// Radii, weights, and floors used by route scoring and display.
///
/// The radii are tunables, not derived from any location-accuracy model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ScoringConfig {
    /// An incident this close to any densified route point counts against
    /// the route.
    pub proximity_radius_meters: f64,
    /// Incidents this close to any route are shown as markers.
    pub display_radius_meters: f64,
    /// Risk weight of a felony.
    pub felony_weight: u32,
    /// Risk weight of a misdemeanor.
    pub misdemeanor_weight: u32,
    /// Risk weight of a violation.
    pub violation_weight: u32,
    /// Safety points lost per risk point.
    pub safety_penalty_per_risk: u32,
    /// Lowest safety or efficiency score a route can get.
    pub score_floor: u32,
    /// Share of the safety score in the composite; efficiency gets the rest.
    pub safety_weight: f64,
    /// Most alternatives ranked per request.
    pub max_alternatives: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            proximity_radius_meters: 100.0,
            display_radius_meters: 200.0,
            felony_weight: 3,
            misdemeanor_weight: 2,
            violation_weight: 1,
            safety_penalty_per_risk: 2,
            score_floor: 20,
            safety_weight: 0.7,
            max_alternatives: 3,
        }
    }
}

impl ScoringConfig {
    /// Risk weight of an incident of the given severity.
    #[must_use]
    pub const fn weight(&self, severity: IncidentSeverity) -> u32 {
        match severity {
            IncidentSeverity::Felony => self.felony_weight,
            IncidentSeverity::Misdemeanor => self.misdemeanor_weight,
            IncidentSeverity::Violation => self.violation_weight,
        }
    }
}
