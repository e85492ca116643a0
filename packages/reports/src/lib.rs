#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Community hazard reports: a deduplicated, self-expiring, bounded
//! collection persisted to a pluggable blob medium.

pub mod clock;
pub mod events;
pub mod medium;
pub mod policy;
mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use events::{ReportEvent, ReportListener};
pub use medium::{FileMedium, MediumError, MemoryMedium, ReportMedium};
pub use policy::ReportPolicy;
pub use safepath_reports_models::{CommunityReport, NewReport, ReportCategory, ReportStatistics};
pub use store::ReportStore;

use thiserror::Error;

/// Errors returned by [`ReportStore`] operations.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A report of the same category already exists close by and recently.
    #[error("duplicate of report {existing_id}")]
    Duplicate {
        /// ID of the report the submission duplicates.
        existing_id: String,
    },

    /// The submitted location is not a valid coordinate.
    #[error("invalid location ({latitude}, {longitude})")]
    InvalidLocation {
        /// Submitted latitude.
        latitude: f64,
        /// Submitted longitude.
        longitude: f64,
    },

    /// The comment is longer than the policy allows.
    #[error("comment is {len} characters, at most {max} allowed")]
    CommentTooLong {
        /// Submitted length in characters.
        len: usize,
        /// Allowed length.
        max: usize,
    },

    /// (De)serializing the report collection failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The storage medium failed.
    #[error(transparent)]
    Medium(#[from] MediumError),
}
