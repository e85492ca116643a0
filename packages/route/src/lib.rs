#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Walking route risk scoring and ranking.
//!
//! Alternatives come from a [`DirectionsProvider`]. Each one is scored
//! against the session's incidents ([`scoring`]), the set is ranked and
//! labeled with recommendation tiers ([`ranking`]), and
//! [`RoutePlanner`] ties the steps together into a [`RoutePlan`].
//!
//! [`RoutePlan`]: safepath_route_models::RoutePlan

pub mod config;
pub mod directions;
pub mod google;
pub mod planner;
pub mod ranking;
pub mod scoring;

pub use config::ScoringConfig;
pub use directions::{DirectionsProvider, RoutingError};
pub use google::GoogleDirections;
pub use planner::{RoutePlanner, build_plan};
