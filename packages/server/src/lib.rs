#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the SafePath walking route advisor.
//!
//! Loads the configured incident feed once at startup, persists community
//! reports under the data directory, and plans routes through the Google
//! Directions API when an API key is configured.

pub mod config;
mod handlers;

use std::error::Error;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, error, middleware, web};
use safepath_reports::{Clock, FileMedium, ReportEvent, ReportStore, SystemClock};
use safepath_route::{GoogleDirections, RoutePlanner, ScoringConfig};
use safepath_server_models::ApiError;
use safepath_source::registry::find_feed;
use safepath_source::{DefinedFeed, IncidentStore};

use crate::config::ServerConfig;

/// Shared application state.
pub struct AppState {
    /// Incidents loaded for this session.
    pub incidents: Arc<IncidentStore>,
    /// Community reports.
    pub reports: Arc<ReportStore>,
    /// Route planner, absent when no directions API key is configured.
    pub planner: Option<RoutePlanner>,
    /// Scoring tunables for caller-supplied routes.
    pub scoring: ScoringConfig,
    /// Time source for report display.
    pub clock: Arc<dyn Clock>,
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json = web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ApiError::new(err.to_string()));
        error::InternalError::from_response(err, response).into()
    });

    cfg.app_data(json).service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/categories", web::get().to(handlers::categories))
            .route("/incidents", web::get().to(handlers::incidents))
            .route("/routes", web::post().to(handlers::plan_route))
            .route("/routes/score", web::post().to(handlers::score_routes))
            .route("/reports", web::get().to(handlers::list_reports))
            .route("/reports", web::post().to(handlers::create_report))
            .route("/reports", web::delete().to(handlers::clear_reports))
            .route("/reports/stats", web::get().to(handlers::report_stats))
            .route("/reports/export", web::get().to(handlers::export_reports))
            .route("/reports/{id}", web::delete().to(handlers::delete_report))
            .route("/reports/{id}/vote", web::post().to(handlers::vote_report))
            .route("/reports/{id}/verify", web::post().to(handlers::verify_report)),
    );
}

/// Builds the application state: loads the incident feed, opens the report
/// store, and sets up the route planner.
///
/// An incident fetch failure is not an error; the server starts with an
/// empty incident set.
///
/// # Errors
///
/// Returns an error if the configured feed does not exist or an HTTP
/// client cannot be built.
#[allow(clippy::future_not_send)]
pub async fn build_state(config: &ServerConfig) -> Result<AppState, Box<dyn Error>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let definition = find_feed(&config.feed_id)
        .ok_or_else(|| format!("unknown incident feed {:?}", config.feed_id))?;
    log::info!("Loading incidents from {}...", definition.name);
    let feed = DefinedFeed::new(definition)?;
    let incidents = IncidentStore::load(&feed, clock.now()).await;

    log::info!("Opening report store in {}", config.data_dir.display());
    let reports = ReportStore::new(Arc::new(FileMedium::new(&config.data_dir)))
        .with_policy(config.tuning.reports.clone())
        .with_clock(clock.clone());
    reports.subscribe(Arc::new(log_report_event));

    let planner = match &config.google_maps_api_key {
        Some(key) => Some(RoutePlanner::new(
            Arc::new(GoogleDirections::new(key.clone())?),
            config.tuning.scoring.clone(),
        )),
        None => {
            log::warn!("GOOGLE_MAPS_API_KEY is not set, route planning is disabled");
            None
        }
    };

    Ok(AppState {
        incidents: Arc::new(incidents),
        reports: Arc::new(reports),
        planner,
        scoring: config.tuning.scoring.clone(),
        clock,
    })
}

/// Starts the SafePath API server.
///
/// Reads configuration from the environment, builds the application state,
/// and runs the Actix-Web HTTP server. The caller provides the async
/// runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an error if configuration is invalid, the state cannot be
/// built, or the HTTP server fails to bind or run.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env()?;
    let state = web::Data::new(build_state(&config).await?);

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}

fn log_report_event(event: &ReportEvent) {
    match event {
        ReportEvent::Added(report) => {
            log::info!("Report {} added ({})", report.id, report.category);
        }
        ReportEvent::Voted { id, vote_count } => {
            log::debug!("Report {id} now has {vote_count} votes");
        }
        ReportEvent::Verified { id } => log::info!("Report {id} verified"),
        ReportEvent::Deleted { id } => log::info!("Report {id} deleted"),
        ReportEvent::Cleared => log::info!("All reports cleared"),
        ReportEvent::StorageDegraded => {
            log::error!("Report storage is degraded, recent changes were not saved");
        }
    }
}
