//! The per-session incident set.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use safepath_crime_models::{IncidentRecord, IncidentSeverity};

use crate::IncidentFeed;

/// Maximum number of incidents drawn on the crime layer at once.
pub const DEFAULT_MARKER_LIMIT: usize = 100;

/// Immutable, validated set of incidents for one session.
///
/// Built once per map load. A failed fetch yields an empty store so that
/// route calculation still works (every route scores as risk-free).
#[derive(Debug, Clone, Default)]
pub struct IncidentStore {
    incidents: Vec<IncidentRecord>,
    loaded_at: Option<DateTime<Utc>>,
}

impl IncidentStore {
    /// Builds a store from already-normalized records, keeping the first
    /// record for any repeated ID.
    #[must_use]
    pub fn new(records: impl IntoIterator<Item = IncidentRecord>) -> Self {
        let mut seen = BTreeSet::new();
        let incidents = records
            .into_iter()
            .filter(|r| seen.insert(r.id.clone()))
            .collect();

        Self {
            incidents,
            loaded_at: None,
        }
    }

    /// An empty store.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fetches the feed and builds the store.
    ///
    /// Any fetch or parse failure is logged and produces an empty store.
    pub async fn load(feed: &dyn IncidentFeed, now: DateTime<Utc>) -> Self {
        match feed.fetch(now).await {
            Ok(records) => {
                let mut store = Self::new(records);
                store.loaded_at = Some(now);
                log::info!(
                    "Loaded {} incidents from {}",
                    store.incidents.len(),
                    feed.name()
                );
                store
            }
            Err(e) => {
                log::error!(
                    "Incident fetch from {} failed, continuing without incidents: {e}",
                    feed.name()
                );
                Self {
                    incidents: Vec::new(),
                    loaded_at: Some(now),
                }
            }
        }
    }

    /// When the store was loaded, if it came from a feed.
    #[must_use]
    pub const fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// Number of incidents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    /// Whether the store holds no incidents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    /// All incidents, in feed order.
    #[must_use]
    pub fn as_slice(&self) -> &[IncidentRecord] {
        &self.incidents
    }

    /// Iterates over all incidents.
    pub fn iter(&self) -> impl Iterator<Item = &IncidentRecord> {
        self.incidents.iter()
    }

    /// The `limit` most recent incidents, newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<&IncidentRecord> {
        let mut sorted: Vec<&IncidentRecord> = self.incidents.iter().collect();
        sorted.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        sorted.truncate(limit);
        sorted
    }

    /// Incidents of the given severity.
    pub fn by_severity(
        &self,
        severity: IncidentSeverity,
    ) -> impl Iterator<Item = &IncidentRecord> {
        self.incidents.iter().filter(move |i| i.severity == severity)
    }
}
