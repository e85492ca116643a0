//! Walking directions providers.

use async_trait::async_trait;
use safepath_route_models::RouteAlternative;

/// Errors from routing and route planning.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The directions service answered with an error status.
    #[error("directions service returned {status}{}", detail(.message.as_deref()))]
    Status {
        /// Status string reported by the service.
        status: String,
        /// Optional explanation from the service.
        message: Option<String>,
    },

    /// No route connects the origin and destination.
    #[error("no route found")]
    NoRoutes,

    /// An encoded polyline could not be decoded.
    #[error("malformed polyline at byte {position}")]
    Polyline {
        /// Byte offset where decoding failed.
        position: usize,
    },

    /// The request itself was unusable.
    #[error("invalid route request: {0}")]
    InvalidRequest(String),
}

fn detail(message: Option<&str>) -> String {
    message.map(|m| format!(": {m}")).unwrap_or_default()
}

/// A service that computes walking route alternatives between two
/// addresses.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// Returns up to three walking alternatives, avoiding highways.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError`] if the service fails or finds no route.
    async fn walking_routes(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<Vec<RouteAlternative>, RoutingError>;
}
