//! Google Directions API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use safepath_route_models::{LegSummary, RouteAlternative};
use safepath_spatial::Coordinate;
use serde::Deserialize;

use crate::directions::{DirectionsProvider, RoutingError};

/// Default Directions API endpoint.
pub const DIRECTIONS_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";

/// Per-request timeout for directions calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Most alternatives taken from one response.
const MAX_ALTERNATIVES: usize = 3;

/// [`DirectionsProvider`] backed by the Google Directions API.
pub struct GoogleDirections {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GoogleDirections {
    /// Creates a client using `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, RoutingError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: DIRECTIONS_URL.to_string(),
        })
    }

    /// Points the client at a different endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl DirectionsProvider for GoogleDirections {
    async fn walking_routes(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<Vec<RouteAlternative>, RoutingError> {
        log::debug!("Requesting walking directions {origin:?} -> {destination:?}");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("origin", origin),
                ("destination", destination),
                ("mode", "walking"),
                ("alternatives", "true"),
                ("avoid", "highways"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: DirectionsResponse = response.json().await?;
        parse_directions(body)
    }
}

/// Top level of a Directions API JSON response.
#[derive(Debug, Deserialize)]
pub struct DirectionsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<ApiRoute>,
}

#[derive(Debug, Deserialize)]
struct ApiRoute {
    #[serde(default)]
    summary: String,
    overview_polyline: ApiPolyline,
    #[serde(default)]
    legs: Vec<ApiLeg>,
}

#[derive(Debug, Deserialize)]
struct ApiPolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct ApiLeg {
    distance: ApiValue,
    duration: ApiValue,
}

#[derive(Debug, Deserialize)]
struct ApiValue {
    value: u64,
    #[serde(default)]
    text: Option<String>,
}

/// Converts a Directions API response into route alternatives.
///
/// # Errors
///
/// * [`RoutingError::NoRoutes`] for `ZERO_RESULTS`, `NOT_FOUND`, or an
///   `OK` response without routes
/// * [`RoutingError::Status`] for any other non-`OK` status
/// * [`RoutingError::Polyline`] if a route's polyline is malformed
pub fn parse_directions(body: DirectionsResponse) -> Result<Vec<RouteAlternative>, RoutingError> {
    if matches!(body.status.as_str(), "ZERO_RESULTS" | "NOT_FOUND") {
        return Err(RoutingError::NoRoutes);
    }
    if body.status != "OK" {
        return Err(RoutingError::Status {
            status: body.status,
            message: body.error_message,
        });
    }

    if body.routes.len() > MAX_ALTERNATIVES {
        log::debug!(
            "Directions returned {} alternatives, keeping {MAX_ALTERNATIVES}",
            body.routes.len()
        );
    }

    let routes = body
        .routes
        .into_iter()
        .take(MAX_ALTERNATIVES)
        .map(|route| {
            let polyline = decode_polyline(&route.overview_polyline.points)?;
            Ok(RouteAlternative {
                summary: route.summary,
                polyline,
                leg: summarize_legs(&route.legs),
            })
        })
        .collect::<Result<Vec<_>, RoutingError>>()?;

    if routes.is_empty() {
        return Err(RoutingError::NoRoutes);
    }
    Ok(routes)
}

/// Sums leg totals. Display text is kept only for a single-leg route.
fn summarize_legs(legs: &[ApiLeg]) -> LegSummary {
    let mut summary = LegSummary::new(
        legs.iter().map(|l| l.distance.value).sum(),
        legs.iter().map(|l| l.duration.value).sum(),
    );
    if let [leg] = legs {
        summary.distance_text.clone_from(&leg.distance.text);
        summary.duration_text.clone_from(&leg.duration.text);
    }
    summary
}

/// Decodes a polyline in Google's encoded polyline format (precision 5).
///
/// # Errors
///
/// Returns [`RoutingError::Polyline`] if the input is truncated or contains
/// characters outside the encoding alphabet.
pub fn decode_polyline(encoded: &str) -> Result<Vec<Coordinate>, RoutingError> {
    let bytes = encoded.as_bytes();
    let mut position = 0;
    let mut latitude: i64 = 0;
    let mut longitude: i64 = 0;
    let mut points = Vec::new();

    while position < bytes.len() {
        latitude += decode_value(bytes, &mut position)?;
        longitude += decode_value(bytes, &mut position)?;
        #[allow(clippy::cast_precision_loss)]
        points.push(Coordinate::new(latitude as f64 / 1e5, longitude as f64 / 1e5));
    }

    Ok(points)
}

fn decode_value(bytes: &[u8], position: &mut usize) -> Result<i64, RoutingError> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let Some(&byte) = bytes.get(*position) else {
            return Err(RoutingError::Polyline {
                position: *position,
            });
        };
        if !(63..=126).contains(&byte) || shift > 30 {
            return Err(RoutingError::Polyline {
                position: *position,
            });
        }
        *position += 1;

        let chunk = i64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 == 1 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

/// Link opening a walking route request in Google Maps.
#[must_use]
pub fn maps_url(origin: &str, destination: &str) -> String {
    Url::parse_with_params(
        "https://www.google.com/maps/dir/",
        &[
            ("api", "1"),
            ("origin", origin),
            ("destination", destination),
            ("travelmode", "walking"),
        ],
    )
    .map(String::from)
    .unwrap_or_default()
}
