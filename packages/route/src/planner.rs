//! End-to-end route planning: fetch alternatives, score, rank, and collect
//! the incidents to show alongside them.

use std::sync::Arc;

use safepath_crime_models::IncidentRecord;
use safepath_route_models::{RouteAlternative, RoutePlan};
use safepath_spatial::{Coordinate, bounds};

use crate::config::ScoringConfig;
use crate::directions::{DirectionsProvider, RoutingError};
use crate::google::maps_url;
use crate::ranking::{incidents_near_routes, rank_routes};
use crate::scoring::score_alternative;

/// Plans walking routes through a [`DirectionsProvider`].
#[derive(Clone)]
pub struct RoutePlanner {
    provider: Arc<dyn DirectionsProvider>,
    config: ScoringConfig,
}

impl RoutePlanner {
    /// Creates a planner.
    #[must_use]
    pub fn new(provider: Arc<dyn DirectionsProvider>, config: ScoringConfig) -> Self {
        Self { provider, config }
    }

    /// The scoring configuration.
    #[must_use]
    pub const fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Requests walking alternatives between two addresses and ranks them
    /// against `incidents`.
    ///
    /// # Errors
    ///
    /// * [`RoutingError::InvalidRequest`] if either address is blank
    /// * any error from the provider, including [`RoutingError::NoRoutes`]
    pub async fn plan(
        &self,
        origin: &str,
        destination: &str,
        incidents: &[IncidentRecord],
    ) -> Result<RoutePlan, RoutingError> {
        let origin = origin.trim();
        let destination = destination.trim();
        if origin.is_empty() || destination.is_empty() {
            return Err(RoutingError::InvalidRequest(
                "origin and destination are required".to_string(),
            ));
        }

        let alternatives = self.provider.walking_routes(origin, destination).await?;
        if alternatives.is_empty() {
            return Err(RoutingError::NoRoutes);
        }

        log::info!(
            "Scoring {} alternatives from {origin:?} to {destination:?} against {} incidents",
            alternatives.len(),
            incidents.len()
        );
        Ok(build_plan(
            origin,
            destination,
            alternatives,
            incidents,
            &self.config,
        ))
    }
}

/// Scores and ranks already-computed alternatives into a plan.
#[must_use]
pub fn build_plan(
    origin: &str,
    destination: &str,
    alternatives: Vec<RouteAlternative>,
    incidents: &[IncidentRecord],
    config: &ScoringConfig,
) -> RoutePlan {
    let scored = alternatives
        .into_iter()
        .map(|route| score_alternative(route, incidents, config))
        .collect();
    let routes = rank_routes(scored, config);
    let nearby_incidents = incidents_near_routes(&routes, incidents, config);

    let all_points: Vec<Coordinate> = routes
        .iter()
        .flat_map(|r| r.route.route.polyline.iter().copied())
        .collect();

    RoutePlan {
        origin: origin.to_string(),
        destination: destination.to_string(),
        bounds: bounds(&all_points),
        maps_url: maps_url(origin, destination),
        routes,
        nearby_incidents,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{TimeZone as _, Utc};
    use safepath_crime_models::IncidentSeverity;
    use safepath_route_models::{LegSummary, RouteTier};

    use super::*;

    struct StaticDirections {
        routes: Vec<RouteAlternative>,
        requests: Mutex<Vec<(String, String)>>,
    }

    impl StaticDirections {
        fn new(routes: Vec<RouteAlternative>) -> Arc<Self> {
            Arc::new(Self {
                routes,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl DirectionsProvider for StaticDirections {
        async fn walking_routes(
            &self,
            origin: &str,
            destination: &str,
        ) -> Result<Vec<RouteAlternative>, RoutingError> {
            self.requests
                .lock()
                .unwrap()
                .push((origin.to_string(), destination.to_string()));
            if self.routes.is_empty() {
                return Err(RoutingError::NoRoutes);
            }
            Ok(self.routes.clone())
        }
    }

    fn route(summary: &str, longitude: f64, duration_seconds: u64) -> RouteAlternative {
        RouteAlternative {
            summary: summary.to_string(),
            polyline: vec![
                Coordinate::new(40.840, longitude),
                Coordinate::new(40.850, longitude),
            ],
            leg: LegSummary::new(1_100, duration_seconds),
        }
    }

    fn felony(id: &str, latitude: f64, longitude: f64) -> IncidentRecord {
        IncidentRecord {
            id: id.to_string(),
            occurred_at: Utc.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap(),
            location: Coordinate::new(latitude, longitude),
            severity: IncidentSeverity::Felony,
            description: Some("ROBBERY".to_string()),
        }
    }

    #[tokio::test]
    async fn ranks_safer_detour_first() {
        let provider = StaticDirections::new(vec![
            route("direct", -73.900, 900),
            route("detour", -73.890, 1_200),
        ]);
        let planner = RoutePlanner::new(provider.clone(), ScoringConfig::default());
        let incidents: Vec<IncidentRecord> = [40.840, 40.8405, 40.845, 40.8455, 40.850]
            .iter()
            .enumerate()
            .map(|(i, latitude)| felony(&format!("i{i}"), *latitude, -73.900))
            .collect();

        let plan = planner
            .plan("  Yankee Stadium ", "Fordham", &incidents)
            .await
            .unwrap();

        assert_eq!(plan.routes.len(), 2);
        assert_eq!(plan.routes[0].route.route.summary, "detour");
        assert_eq!(plan.routes[0].tier, RouteTier::Safest);
        assert_eq!(plan.routes[1].tier, RouteTier::Balanced);
        assert_eq!(plan.routes[1].route.scores.risk_score, 15);
        assert_eq!(plan.nearby_incidents.len(), 5);
        assert_eq!(plan.origin, "Yankee Stadium");

        let bounds = plan.bounds.unwrap();
        assert!((bounds.south_west.longitude - -73.900).abs() < 1e-9);
        assert!((bounds.north_east.longitude - -73.890).abs() < 1e-9);
        assert!(plan.maps_url.contains("travelmode=walking"));

        assert_eq!(
            *provider.requests.lock().unwrap(),
            vec![("Yankee Stadium".to_string(), "Fordham".to_string())]
        );
    }

    #[tokio::test]
    async fn empty_incidents_rank_by_duration() {
        let provider = StaticDirections::new(vec![
            route("slow", -73.900, 1_800),
            route("fast", -73.890, 600),
        ]);
        let planner = RoutePlanner::new(provider, ScoringConfig::default());

        let plan = planner.plan("A", "B", &[]).await.unwrap();
        assert_eq!(plan.routes[0].route.route.summary, "fast");
        assert!(plan.routes.iter().all(|r| r.route.scores.risk_score == 0));
        assert!(plan.nearby_incidents.is_empty());
    }

    #[tokio::test]
    async fn rejects_blank_addresses() {
        let provider = StaticDirections::new(vec![route("r", -73.9, 60)]);
        let planner = RoutePlanner::new(provider.clone(), ScoringConfig::default());

        assert!(matches!(
            planner.plan("   ", "B", &[]).await,
            Err(RoutingError::InvalidRequest(_))
        ));
        assert!(provider.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn propagates_no_routes() {
        let planner = RoutePlanner::new(StaticDirections::new(Vec::new()), ScoringConfig::default());
        let err = planner.plan("A", "B", &[]).await.unwrap_err();
        assert!(matches!(err, RoutingError::NoRoutes));
        assert_eq!(err.to_string(), "no route found");
    }

    #[test]
    fn builds_plan_without_provider() {
        let plan = build_plan(
            "A",
            "B",
            vec![route("only", -73.900, 0)],
            &[],
            &ScoringConfig::default(),
        );
        assert_eq!(plan.routes.len(), 1);
        assert_eq!(plan.routes[0].route.scores.composite_score, 100);
        assert!(plan.bounds.is_some());
    }
}
