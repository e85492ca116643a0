//! HTTP handler functions for the SafePath API.

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use safepath_reports::{NewReport, ReportCategory, ReportError, ReportStore};
use safepath_route::{RoutingError, build_plan};
use safepath_server_models::{
    ApiCategory, ApiError, ApiHealth, ApiIncident, ApiReport, ApiReportStats,
    IncidentQueryParams, ReportQueryParams, RouteRequest, ScoreRoutesRequest, VoteRequest,
};
use safepath_source::store::DEFAULT_MARKER_LIMIT;
use safepath_spatial::Coordinate;

use crate::AppState;

/// Search radius for `GET /api/reports` when `lat`/`lng` are given without
/// `radius`.
pub const DEFAULT_REPORT_RADIUS_METERS: f64 = 1_000.0;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        incidents_loaded: state.incidents.len(),
        reports_degraded: state.reports.is_degraded(),
    })
}

/// `GET /api/categories`
///
/// Returns the community report categories with their labels and icons.
pub async fn categories() -> HttpResponse {
    let categories: Vec<ApiCategory> = ReportCategory::all()
        .iter()
        .copied()
        .map(ApiCategory::from)
        .collect();

    HttpResponse::Ok().json(categories)
}

/// `GET /api/incidents`
///
/// Returns the session's incidents, newest first.
pub async fn incidents(
    state: web::Data<AppState>,
    params: web::Query<IncidentQueryParams>,
) -> HttpResponse {
    let limit = params.limit.unwrap_or(DEFAULT_MARKER_LIMIT);

    let incidents: Vec<ApiIncident> = state
        .incidents
        .recent(state.incidents.len())
        .into_iter()
        .filter(|i| params.severity.is_none_or(|s| i.severity == s))
        .take(limit)
        .map(ApiIncident::from)
        .collect();

    HttpResponse::Ok().json(incidents)
}

/// `POST /api/routes`
///
/// Plans walking routes between two addresses and ranks them by safety.
pub async fn plan_route(
    state: web::Data<AppState>,
    body: web::Json<RouteRequest>,
) -> HttpResponse {
    let Some(planner) = &state.planner else {
        return HttpResponse::ServiceUnavailable()
            .json(ApiError::new("route planning is not configured"));
    };

    match planner
        .plan(&body.origin, &body.destination, state.incidents.as_slice())
        .await
    {
        Ok(plan) => HttpResponse::Ok().json(plan),
        Err(RoutingError::InvalidRequest(message)) => {
            HttpResponse::BadRequest().json(ApiError::new(message))
        }
        Err(e @ (RoutingError::NoRoutes | RoutingError::Status { .. })) => {
            log::warn!(
                "No route from {:?} to {:?}: {e}",
                body.origin,
                body.destination
            );
            HttpResponse::NotFound().json(ApiError::new("no route found"))
        }
        Err(e) => {
            log::error!("Route planning failed: {e}");
            HttpResponse::BadGateway().json(ApiError::new("directions service unavailable"))
        }
    }
}

/// `POST /api/routes/score`
///
/// Scores and ranks caller-supplied route alternatives.
pub async fn score_routes(
    state: web::Data<AppState>,
    body: web::Json<ScoreRoutesRequest>,
) -> HttpResponse {
    let request = body.into_inner();
    if request.routes.is_empty() {
        return HttpResponse::BadRequest().json(ApiError::new("no routes to score"));
    }

    HttpResponse::Ok().json(build_plan(
        &request.origin,
        &request.destination,
        request.routes,
        state.incidents.as_slice(),
        &state.scoring,
    ))
}

/// `GET /api/reports`
///
/// Lists live community reports, optionally limited to an area and/or a
/// category.
pub async fn list_reports(
    state: web::Data<AppState>,
    params: web::Query<ReportQueryParams>,
) -> HttpResponse {
    let category = match params.category.as_deref().map(str::parse::<ReportCategory>) {
        None => None,
        Some(Ok(category)) => Some(category),
        Some(Err(_)) => {
            return HttpResponse::BadRequest().json(ApiError::new(format!(
                "unknown category {:?}",
                params.category.as_deref().unwrap_or_default()
            )));
        }
    };

    let center = match (params.lat, params.lng) {
        (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
        (None, None) => None,
        _ => {
            return HttpResponse::BadRequest()
                .json(ApiError::new("lat and lng must be given together"));
        }
    };
    let radius = params.radius.unwrap_or(DEFAULT_REPORT_RADIUS_METERS);

    let reports = match with_reports(&state, move |store| {
        let found = match (center, category) {
            (Some(center), _) => store.by_area(center, radius),
            (None, Some(category)) => store.by_type(category),
            (None, None) => store.list(),
        };
        found
            .into_iter()
            .filter(|r| category.is_none_or(|c| r.category == c))
            .collect::<Vec<_>>()
    })
    .await
    {
        Ok(reports) => reports,
        Err(response) => return response,
    };

    let now = state.clock.now();
    let reports: Vec<ApiReport> = reports
        .into_iter()
        .map(|r| ApiReport::new(r, now))
        .collect();
    HttpResponse::Ok().json(reports)
}

/// `POST /api/reports`
///
/// Submits a community report.
pub async fn create_report(
    state: web::Data<AppState>,
    body: web::Json<NewReport>,
) -> HttpResponse {
    let new = body.into_inner();
    let result = match with_reports(&state, move |store| store.add(new)).await {
        Ok(result) => result,
        Err(response) => return response,
    };

    match result {
        Ok(report) => HttpResponse::Created().json(ApiReport::new(report, state.clock.now())),
        Err(ReportError::Duplicate { existing_id }) => HttpResponse::Conflict().json(ApiError {
            error: "a similar report was already submitted nearby".to_string(),
            existing_id: Some(existing_id),
        }),
        Err(e @ (ReportError::InvalidLocation { .. } | ReportError::CommentTooLong { .. })) => {
            HttpResponse::BadRequest().json(ApiError::new(e.to_string()))
        }
        Err(e) => {
            log::error!("Failed to add report: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("failed to add report"))
        }
    }
}

/// `POST /api/reports/{id}/vote`
pub async fn vote_report(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<VoteRequest>,
) -> HttpResponse {
    let id = path.into_inner();
    let up = body.up;
    match with_reports(&state, move |store| store.vote(&id, up)).await {
        Ok(updated) => report_or_not_found(&state, updated),
        Err(response) => response,
    }
}

/// `POST /api/reports/{id}/verify`
pub async fn verify_report(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    match with_reports(&state, move |store| store.verify(&id)).await {
        Ok(updated) => report_or_not_found(&state, updated),
        Err(response) => response,
    }
}

/// `DELETE /api/reports/{id}`
pub async fn delete_report(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    match with_reports(&state, move |store| store.delete(&id)).await {
        Ok(true) => HttpResponse::NoContent().finish(),
        Ok(false) => HttpResponse::NotFound().json(ApiError::new("report not found")),
        Err(response) => response,
    }
}

/// `DELETE /api/reports`
///
/// Removes every report.
pub async fn clear_reports(state: web::Data<AppState>) -> HttpResponse {
    match with_reports(&state, ReportStore::clear).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(response) => response,
    }
}

/// `GET /api/reports/stats`
pub async fn report_stats(state: web::Data<AppState>) -> HttpResponse {
    match with_reports(&state, |store| (store.statistics(), store.is_degraded())).await {
        Ok((statistics, degraded)) => HttpResponse::Ok().json(ApiReportStats {
            statistics,
            degraded,
        }),
        Err(response) => response,
    }
}

/// `GET /api/reports/export`
///
/// Downloads the live reports as a pretty-printed JSON file.
pub async fn export_reports(state: web::Data<AppState>) -> HttpResponse {
    match with_reports(&state, ReportStore::export).await {
        Ok(Ok(json)) => HttpResponse::Ok()
            .content_type("application/json")
            .insert_header((
                "Content-Disposition",
                "attachment; filename=\"safepath-reports.json\"",
            ))
            .body(json),
        Ok(Err(e)) => {
            log::error!("Failed to export reports: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("failed to export reports"))
        }
        Err(response) => response,
    }
}

/// Runs `f` against the report store on the blocking thread pool.
async fn with_reports<T, F>(state: &web::Data<AppState>, f: F) -> Result<T, HttpResponse>
where
    F: FnOnce(&ReportStore) -> T + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.reports);
    web::block(move || f(&store)).await.map_err(|e| {
        log::error!("Report store task failed: {e}");
        HttpResponse::InternalServerError().json(ApiError::new("report store unavailable"))
    })
}

fn report_or_not_found(
    state: &AppState,
    report: Option<safepath_reports::CommunityReport>,
) -> HttpResponse {
    report.map_or_else(
        || HttpResponse::NotFound().json(ApiError::new("report not found")),
        |report| HttpResponse::Ok().json(ApiReport::new(report, state.clock.now())),
    )
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone as _, Utc};
    use safepath_crime_models::{IncidentRecord, IncidentSeverity};
    use safepath_reports::{FixedClock, MemoryMedium};
    use safepath_route::{DirectionsProvider, RoutePlanner, ScoringConfig};
    use safepath_route_models::{LegSummary, RouteAlternative};
    use safepath_source::IncidentStore;
    use serde_json::{Value, json};

    use super::*;
    use crate::configure;

    struct StaticDirections(Vec<RouteAlternative>);

    #[async_trait]
    impl DirectionsProvider for StaticDirections {
        async fn walking_routes(
            &self,
            _origin: &str,
            _destination: &str,
        ) -> Result<Vec<RouteAlternative>, RoutingError> {
            if self.0.is_empty() {
                Err(RoutingError::NoRoutes)
            } else {
                Ok(self.0.clone())
            }
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap()
    }

    fn incident(id: &str, hours_ago: i64, severity: IncidentSeverity) -> IncidentRecord {
        IncidentRecord {
            id: id.to_string(),
            occurred_at: now() - Duration::hours(hours_ago),
            location: Coordinate::new(40.845, -73.900),
            severity,
            description: Some("ASSAULT 3 & RELATED OFFENSES".to_string()),
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

    fn planner(routes: Vec<RouteAlternative>) -> Option<RoutePlanner> {
        Some(RoutePlanner::new(
            Arc::new(StaticDirections(routes)),
            ScoringConfig::default(),
        ))
    }

    fn state(planner: Option<RoutePlanner>) -> web::Data<AppState> {
        let clock = Arc::new(FixedClock::new(now()));
        let reports = ReportStore::new(Arc::new(MemoryMedium::new())).with_clock(clock.clone());
        web::Data::new(AppState {
            incidents: Arc::new(IncidentStore::new(vec![
                incident("old", 30, IncidentSeverity::Felony),
                incident("new", 1, IncidentSeverity::Violation),
                incident("mid", 10, IncidentSeverity::Misdemeanor),
            ])),
            reports: Arc::new(reports),
            planner,
            scoring: ScoringConfig::default(),
            clock,
        })
    }

    fn report_body(category: &str) -> Value {
        json!({
            "location": {"lat": 40.8448, "lng": -73.8648},
            "category": category,
            "comment": "broken streetlights on the whole block"
        })
    }

    #[actix_web::test]
    async fn health_reports_session_state() {
        let app = test::init_service(App::new().app_data(state(None)).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["incidentsLoaded"], 3);
        assert_eq!(body["reportsDegraded"], false);
    }

    #[actix_web::test]
    async fn lists_categories() {
        let app = test::init_service(App::new().app_data(state(None)).configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/categories").to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.len(), 5);
        assert_eq!(body[0]["name"], "poor-lighting");
        assert_eq!(body[0]["label"], "Poor lighting");
    }

    #[actix_web::test]
    async fn lists_incidents_newest_first() {
        let app = test::init_service(App::new().app_data(state(None)).configure(configure)).await;

        let req = test::TestRequest::get()
            .uri("/api/incidents?limit=2")
            .to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        let ids: Vec<&str> = body.iter().filter_map(|i| i["id"].as_str()).collect();
        assert_eq!(ids, vec!["new", "mid"]);

        let req = test::TestRequest::get()
            .uri("/api/incidents?severity=felony")
            .to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.len(), 1);
        assert_eq!(body[0]["id"], "old");
        assert_eq!(body[0]["severityValue"], 3);
    }

    #[actix_web::test]
    async fn plans_routes() {
        let app = test::init_service(
            App::new()
                .app_data(state(planner(vec![
                    route("direct", -73.900, 600),
                    route("detour", -73.890, 900),
                ])))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/routes")
            .set_json(json!({"origin": "Yankee Stadium", "destination": "Fordham"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["routes"][0]["summary"], "detour");
        assert_eq!(body["routes"][0]["tier"], "safest");
        assert_eq!(body["routes"][1]["tier"], "balanced");
        assert_eq!(body["routes"][1]["riskScore"], 6);
        assert_eq!(body["nearbyIncidents"].as_array().unwrap().len(), 3);
    }

    #[actix_web::test]
    async fn missing_route_is_not_found() {
        let app = test::init_service(
            App::new()
                .app_data(state(planner(Vec::new())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/routes")
            .set_json(json!({"origin": "A", "destination": "B"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "no route found"}));

        let req = test::TestRequest::post()
            .uri("/api/routes")
            .set_json(json!({"origin": " ", "destination": "B"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn route_planning_requires_configuration() {
        let app = test::init_service(App::new().app_data(state(None)).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/routes")
            .set_json(json!({"origin": "A", "destination": "B"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn scores_supplied_routes() {
        let app = test::init_service(App::new().app_data(state(None)).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/routes/score")
            .set_json(json!({
                "routes": [
                    {
                        "summary": "slow",
                        "polyline": [{"lat": 40.84, "lng": -73.89}, {"lat": 40.85, "lng": -73.89}],
                        "leg": {"distanceMeters": 1500, "durationSeconds": 1800}
                    },
                    {
                        "summary": "quick",
                        "polyline": [{"lat": 40.84, "lng": -73.88}, {"lat": 40.85, "lng": -73.88}],
                        "leg": {"distanceMeters": 1000, "durationSeconds": 0}
                    }
                ]
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["routes"][0]["summary"], "quick");
        assert_eq!(body["routes"][0]["compositeScore"], 100);
        assert_eq!(body["routes"][1]["efficiencyScore"], 70);

        let req = test::TestRequest::post()
            .uri("/api/routes/score")
            .set_json(json!({"routes": []}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn report_lifecycle() {
        let app = test::init_service(App::new().app_data(state(None)).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(report_body("dark"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["category"], "poor-lighting");
        assert_eq!(created["voteCount"], 1);
        assert_eq!(created["timeAgo"], "Just now");

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(report_body("poor-lighting"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["existingId"], id.as_str());

        let req = test::TestRequest::post()
            .uri(&format!("/api/reports/{id}/vote"))
            .set_json(json!({"up": true}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["voteCount"], 2);

        let req = test::TestRequest::post()
            .uri(&format!("/api/reports/{id}/verify"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["verified"], true);

        let req = test::TestRequest::get()
            .uri("/api/reports?lat=40.845&lng=-73.865&radius=200")
            .to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.len(), 1);

        let req = test::TestRequest::get()
            .uri("/api/reports?category=harassment")
            .to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert!(body.is_empty());

        let req = test::TestRequest::get()
            .uri("/api/reports/stats")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["verified"], 1);
        assert_eq!(body["byCategory"]["poor-lighting"], 1);
        assert_eq!(body["degraded"], false);

        let req = test::TestRequest::get()
            .uri("/api/reports/export")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("content-disposition"));
        let exported: Vec<Value> = test::read_body_json(resp).await;
        assert_eq!(exported.len(), 1);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/reports/{id}"))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NO_CONTENT
        );

        let req = test::TestRequest::delete()
            .uri(&format!("/api/reports/{id}"))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[actix_web::test]
    async fn vote_on_unknown_report_is_not_found() {
        let app = test::init_service(App::new().app_data(state(None)).configure(configure)).await;
        let req = test::TestRequest::post()
            .uri("/api/reports/missing/vote")
            .set_json(json!({"up": false}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn rejects_invalid_report_input() {
        let app = test::init_service(App::new().app_data(state(None)).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(report_body("flooding"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(json!({
                "location": {"lat": 123.0, "lng": -73.8648},
                "category": "other"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/reports?lat=40.84")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/reports?category=flooding")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn clears_reports() {
        let app = test::init_service(App::new().app_data(state(None)).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/reports")
            .set_json(report_body("loitering"))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CREATED
        );

        let req = test::TestRequest::delete().uri("/api/reports").to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NO_CONTENT
        );

        let req = test::TestRequest::get().uri("/api/reports").to_request();
        let body: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert!(body.is_empty());
    }
}
