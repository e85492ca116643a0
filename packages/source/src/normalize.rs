//! Raw record normalization.
//!
//! Turns the loosely-typed JSON rows returned by a feed into
//! [`IncidentRecord`]s. Rows without an ID, without usable coordinates,
//! or reporting a different region are dropped here and never reach the
//! scoring code.

use chrono::{DateTime, Utc};
use safepath_crime_models::{IncidentRecord, IncidentSeverity};

use crate::feed_def::FeedDefinition;
use crate::parsing::{non_empty_str, parse_coordinate, parse_date_and_time};

/// Normalizes raw feed rows into incident records.
///
/// `now` is used as the occurrence time for rows whose date cannot be
/// parsed; their location is still meaningful for risk scoring.
#[must_use]
pub fn normalize_records(
    definition: &FeedDefinition,
    records: &[serde_json::Value],
    now: DateTime<Utc>,
) -> Vec<IncidentRecord> {
    let fields = &definition.fields;
    let mut incidents = Vec::with_capacity(records.len());
    let mut wrong_region = 0usize;
    let mut bad_location = 0usize;

    for record in records {
        let Some(id) = non_empty_str(record.get(&fields.id)) else {
            continue;
        };

        if let (Some(expected), Some(region_field)) = (&definition.region, &fields.region) {
            let matches = non_empty_str(record.get(region_field))
                .is_some_and(|r| r.eq_ignore_ascii_case(expected));
            if !matches {
                wrong_region += 1;
                continue;
            }
        }

        let Some(location) = parse_coordinate(
            record.get(&fields.latitude),
            record.get(&fields.longitude),
        ) else {
            bad_location += 1;
            continue;
        };

        let occurred_at = record
            .get(&fields.occurred_date)
            .and_then(serde_json::Value::as_str)
            .and_then(|d| {
                let time = fields
                    .occurred_time
                    .as_ref()
                    .and_then(|f| record.get(f))
                    .and_then(serde_json::Value::as_str);
                parse_date_and_time(d, time)
            })
            .unwrap_or_else(|| {
                log::debug!("Incident {id} has no parseable date, using fetch time");
                now
            });

        let severity =
            IncidentSeverity::from_law_code(non_empty_str(record.get(&fields.severity)).as_deref());

        let description = fields
            .description
            .iter()
            .find_map(|f| non_empty_str(record.get(f)));

        incidents.push(IncidentRecord {
            id,
            occurred_at,
            location,
            severity,
            description,
        });
    }

    log::info!(
        "Normalized {} incidents from {} raw records ({} bad location, {} wrong region)",
        incidents.len(),
        records.len(),
        bad_location,
        wrong_region,
    );

    incidents
}
