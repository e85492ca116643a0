#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic primitives shared by the incident, report, and route crates.
//!
//! Distances use the haversine great-circle formula on a spherical earth.
//! At walking scale (tens of kilometers at most) the error against the
//! WGS84 ellipsoid is well under a percent, which is far below the
//! precision of the incident coordinates themselves.
//!
//! Proximity tests are brute force. Inputs are bounded (a few thousand
//! incidents against a few hundred route points), so no spatial index is
//! built.

use geo::{BoundingRect, LineString, Point};
use serde::{Deserialize, Serialize};

/// Mean earth radius used by [`distance_meters`].
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Latitude, -90 to 90.
    #[serde(alias = "lat")]
    pub latitude: f64,
    /// Longitude, -180 to 180.
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude and longitude.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` if both components are finite and inside the valid
    /// latitude/longitude ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to `other` in meters.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        distance_meters(*self, *other)
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(c: Coordinate) -> Self {
        Self::new(c.longitude, c.latitude)
    }
}

impl From<Point<f64>> for Coordinate {
    fn from(p: Point<f64>) -> Self {
        Self::new(p.y(), p.x())
    }
}

/// Axis-aligned bounds of a set of coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    /// South-west corner.
    pub south_west: Coordinate,
    /// North-east corner.
    pub north_east: Coordinate,
}

/// Computes the bounding box of a polyline, for viewport fitting.
///
/// Returns `None` for an empty polyline.
#[must_use]
pub fn bounds(polyline: &[Coordinate]) -> Option<Bounds> {
    let line: LineString<f64> = polyline
        .iter()
        .map(|c| (c.longitude, c.latitude))
        .collect::<Vec<_>>()
        .into();

    line.bounding_rect().map(|rect| Bounds {
        south_west: Coordinate::new(rect.min().y, rect.min().x),
        north_east: Coordinate::new(rect.max().y, rect.max().x),
    })
}

/// Haversine distance between two coordinates in meters.
///
/// Symmetric, never negative, and zero for identical inputs.
#[must_use]
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `h` a hair past 1.0 for antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Arithmetic midpoint of two coordinates.
///
/// Adequate for consecutive polyline vertices, which are at most a few
/// hundred meters apart.
#[must_use]
pub fn midpoint(a: Coordinate, b: Coordinate) -> Coordinate {
    Coordinate::new(
        (a.latitude + b.latitude) / 2.0,
        (a.longitude + b.longitude) / 2.0,
    )
}

/// Returns every vertex of `polyline` with the midpoint of each
/// consecutive pair inserted between them.
///
/// A polyline of `n` vertices yields `2n - 1` points (zero for an empty
/// input, one for a single vertex).
#[must_use]
pub fn densify(polyline: &[Coordinate]) -> Vec<Coordinate> {
    let mut out = Vec::with_capacity(polyline.len().saturating_mul(2));

    for (i, point) in polyline.iter().enumerate() {
        if i > 0 {
            out.push(midpoint(polyline[i - 1], *point));
        }
        out.push(*point);
    }

    out
}

/// Returns `true` if `a` and `b` are no more than `radius_meters` apart.
#[must_use]
pub fn is_within(a: Coordinate, b: Coordinate, radius_meters: f64) -> bool {
    distance_meters(a, b) <= radius_meters
}

/// Returns `true` if `point` lies within `radius_meters` of any of `path`.
#[must_use]
pub fn is_near_any(point: Coordinate, path: &[Coordinate], radius_meters: f64) -> bool {
    path.iter().any(|p| is_within(point, *p, radius_meters))
}
