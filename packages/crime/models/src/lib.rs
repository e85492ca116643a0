#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident severity classification and the normalized incident record.
//!
//! Every incident feed normalizes its raw rows into [`IncidentRecord`]s.
//! Records only exist once their coordinates have been validated, so the
//! scoring code never has to re-check them.

use chrono::{DateTime, Utc};
use safepath_spatial::Coordinate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Legal classification of an incident, most serious first.
///
/// Ordering follows seriousness: `Felony > Misdemeanor > Violation`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum IncidentSeverity {
    /// Infractions and offenses that are neither felonies nor misdemeanors.
    Violation = 1,
    /// Lesser criminal offenses.
    Misdemeanor = 2,
    /// Serious criminal offenses.
    Felony = 3,
}

impl IncidentSeverity {
    /// Returns the numeric rank of this severity (1-3).
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Creates a severity from its numeric rank.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-3.
    pub const fn from_value(value: u8) -> Result<Self, InvalidSeverityError> {
        match value {
            1 => Ok(Self::Violation),
            2 => Ok(Self::Misdemeanor),
            3 => Ok(Self::Felony),
            _ => Err(InvalidSeverityError { value }),
        }
    }

    /// Maps a law-category code (`"FELONY"`, `"MISDEMEANOR"`, `"VIOLATION"`)
    /// to a severity. Unknown or missing codes count as violations.
    #[must_use]
    pub fn from_law_code(code: Option<&str>) -> Self {
        code.and_then(|c| c.trim().parse().ok())
            .unwrap_or(Self::Violation)
    }

    /// Returns all variants, most serious first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Felony, Self::Misdemeanor, Self::Violation]
    }
}

/// Error returned when attempting to create an [`IncidentSeverity`] from an
/// invalid numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSeverityError {
    /// The invalid severity value that was provided.
    pub value: u8,
}

impl std::fmt::Display for InvalidSeverityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid severity value {}: expected 1-3", self.value)
    }
}

impl std::error::Error for InvalidSeverityError {}

/// A past safety-relevant event at a known location.
///
/// Immutable once ingested. Held for the lifetime of a session and only
/// ever filtered, never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    /// Identifier assigned by the upstream feed.
    pub id: String,
    /// When the incident occurred.
    pub occurred_at: DateTime<Utc>,
    /// Where the incident occurred. Always valid and non-zero.
    pub location: Coordinate,
    /// Legal classification.
    pub severity: IncidentSeverity,
    /// Free-text offense description, for display only.
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_by_seriousness() {
        assert!(IncidentSeverity::Felony > IncidentSeverity::Misdemeanor);
        assert!(IncidentSeverity::Misdemeanor > IncidentSeverity::Violation);
    }

    #[test]
    fn severity_from_value_roundtrip() {
        for v in 1..=3u8 {
            let severity = IncidentSeverity::from_value(v).unwrap();
            assert_eq!(severity.value(), v);
        }
        assert!(IncidentSeverity::from_value(0).is_err());
        assert!(IncidentSeverity::from_value(4).is_err());
    }

    #[test]
    fn maps_law_codes() {
        assert_eq!(
            IncidentSeverity::from_law_code(Some("FELONY")),
            IncidentSeverity::Felony
        );
        assert_eq!(
            IncidentSeverity::from_law_code(Some(" misdemeanor ")),
            IncidentSeverity::Misdemeanor
        );
        assert_eq!(
            IncidentSeverity::from_law_code(Some("VIOLATION")),
            IncidentSeverity::Violation
        );
        assert_eq!(
            IncidentSeverity::from_law_code(Some("INFRACTION")),
            IncidentSeverity::Violation
        );
        assert_eq!(
            IncidentSeverity::from_law_code(None),
            IncidentSeverity::Violation
        );
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&IncidentSeverity::Felony).unwrap();
        assert_eq!(json, "\"felony\"");
        assert_eq!(IncidentSeverity::Misdemeanor.to_string(), "misdemeanor");
    }
}
