//! The community report store.
//!
//! The whole collection lives in a single blob on a [`ReportMedium`].
//! Every operation reads the blob, works on the decoded collection, and
//! (for mutations) writes the result back while holding the store's
//! lock, so concurrent votes never overwrite each other.
//!
//! Expired reports are dropped on every read and the blob is rewritten
//! without them. Durable writes are best-effort: if a write fails the
//! store purges reports older than half the retention window, caps the
//! collection at half its capacity, and retries once; if that fails too
//! the write is dropped and the store is flagged as degraded.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use safepath_reports_models::{CommunityReport, NewReport, ReportCategory, ReportStatistics};
use safepath_spatial::{Coordinate, distance_meters};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::events::{ReportEvent, ReportListener};
use crate::medium::ReportMedium;
use crate::policy::ReportPolicy;
use crate::ReportError;

/// Deduplicated, self-expiring collection of community reports.
pub struct ReportStore {
    medium: Arc<dyn ReportMedium>,
    policy: ReportPolicy,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
    degraded: AtomicBool,
    listeners: RwLock<Vec<Arc<dyn ReportListener>>>,
}

impl ReportStore {
    /// Creates a store over `medium` with the default policy and the
    /// system clock.
    #[must_use]
    pub fn new(medium: Arc<dyn ReportMedium>) -> Self {
        Self {
            medium,
            policy: ReportPolicy::default(),
            clock: Arc::new(SystemClock),
            lock: Mutex::new(()),
            degraded: AtomicBool::new(false),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Replaces the policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ReportPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The active policy.
    #[must_use]
    pub const fn policy(&self) -> &ReportPolicy {
        &self.policy
    }

    /// Registers a listener for committed changes.
    pub fn subscribe(&self, listener: Arc<dyn ReportListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Whether the most recent durable write was dropped.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    /// All live reports, newest first.
    #[must_use]
    pub fn list(&self) -> Vec<CommunityReport> {
        let mut events = Vec::new();
        let reports = {
            let _guard = self.lock();
            self.load_live(self.clock.now(), &mut events)
        };
        self.notify(&events);
        reports
    }

    /// Creates a report from a user submission.
    ///
    /// # Errors
    ///
    /// * [`ReportError::InvalidLocation`] if the coordinate is out of range
    /// * [`ReportError::CommentTooLong`] if the comment exceeds the policy
    ///   limit
    /// * [`ReportError::Duplicate`] if a report of the same category exists
    ///   within the dedup radius and window; nothing is written
    pub fn add(&self, new: NewReport) -> Result<CommunityReport, ReportError> {
        let comment = self.validate(&new)?;

        let mut events = Vec::new();
        let result = {
            let _guard = self.lock();
            let now = self.clock.now();
            let existing = self.load_live(now, &mut events);

            if let Some(dup) = existing
                .iter()
                .find(|r| self.is_duplicate(r, new.category, new.location, now))
            {
                log::info!(
                    "Rejecting {} report near {:?}: duplicates {}",
                    new.category,
                    new.location,
                    dup.id
                );
                Err(ReportError::Duplicate {
                    existing_id: dup.id.clone(),
                })
            } else {
                let report = CommunityReport {
                    id: Uuid::new_v4().to_string(),
                    location: new.location,
                    category: new.category,
                    comment,
                    created_at: now,
                    verified: false,
                    vote_count: 1,
                };

                let mut updated = Vec::with_capacity(existing.len() + 1);
                updated.push(report.clone());
                updated.extend(existing);
                self.persist(updated, now, &mut events);

                log::debug!("Added {} report {}", report.category, report.id);
                events.push(ReportEvent::Added(report.clone()));
                Ok(report)
            }
        };
        self.notify(&events);
        result
    }

    /// Records an up- or down-vote. The count never drops below zero.
    ///
    /// Returns the updated report, or `None` (without writing anything) if
    /// no live report has the given ID.
    pub fn vote(&self, id: &str, is_upvote: bool) -> Option<CommunityReport> {
        self.update(id, |report| {
            report.vote_count = if is_upvote {
                report.vote_count.saturating_add(1)
            } else {
                report.vote_count.saturating_sub(1)
            };
            ReportEvent::Voted {
                id: report.id.clone(),
                vote_count: report.vote_count,
            }
        })
    }

    /// Marks a report as verified.
    ///
    /// Returns the updated report, or `None` if no live report has the
    /// given ID.
    pub fn verify(&self, id: &str) -> Option<CommunityReport> {
        self.update(id, |report| {
            report.verified = true;
            ReportEvent::Verified {
                id: report.id.clone(),
            }
        })
    }

    /// Removes a report. Returns `false` if no live report has the given ID.
    pub fn delete(&self, id: &str) -> bool {
        let mut events = Vec::new();
        let found = {
            let _guard = self.lock();
            let now = self.clock.now();
            let mut reports = self.load_live(now, &mut events);
            let before = reports.len();
            reports.retain(|r| r.id != id);
            let found = reports.len() != before;
            if found {
                self.persist(reports, now, &mut events);
                events.push(ReportEvent::Deleted { id: id.to_string() });
            }
            found
        };
        self.notify(&events);
        found
    }

    /// Empties the store. Failures of the underlying medium are logged and
    /// otherwise ignored.
    pub fn clear(&self) {
        {
            let _guard = self.lock();
            if let Err(e) = self.medium.delete(&self.policy.storage_key) {
                log::warn!("Failed to clear community reports: {e}");
            }
        }
        self.notify(&[ReportEvent::Cleared]);
    }

    /// Live reports within `radius_meters` of `center`.
    #[must_use]
    pub fn by_area(&self, center: Coordinate, radius_meters: f64) -> Vec<CommunityReport> {
        self.list()
            .into_iter()
            .filter(|r| distance_meters(center, r.location) <= radius_meters)
            .collect()
    }

    /// Live reports of the given category.
    #[must_use]
    pub fn by_type(&self, category: ReportCategory) -> Vec<CommunityReport> {
        self.list()
            .into_iter()
            .filter(|r| r.category == category)
            .collect()
    }

    /// Aggregate counts over the live reports.
    #[must_use]
    pub fn statistics(&self) -> ReportStatistics {
        let reports = self.list();
        let day_ago = self.clock.now() - Duration::hours(24);

        let mut by_category: BTreeMap<ReportCategory, usize> =
            ReportCategory::all().iter().map(|c| (*c, 0)).collect();
        let mut verified = 0;
        let mut last_24h = 0;

        for report in &reports {
            *by_category.entry(report.category).or_default() += 1;
            if report.verified {
                verified += 1;
            }
            if report.created_at > day_ago {
                last_24h += 1;
            }
        }

        ReportStatistics {
            total: reports.len(),
            by_category,
            verified,
            last_24h,
        }
    }

    /// The live reports as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Json`] if serialization fails.
    pub fn export(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(&self.list())?)
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn validate(&self, new: &NewReport) -> Result<String, ReportError> {
        if !new.location.is_valid() {
            return Err(ReportError::InvalidLocation {
                latitude: new.location.latitude,
                longitude: new.location.longitude,
            });
        }

        let comment = new.comment.as_deref().unwrap_or_default().trim().to_string();
        let len = comment.chars().count();
        if len > self.policy.max_comment_chars {
            return Err(ReportError::CommentTooLong {
                len,
                max: self.policy.max_comment_chars,
            });
        }

        Ok(comment)
    }

    fn is_duplicate(
        &self,
        existing: &CommunityReport,
        category: ReportCategory,
        location: Coordinate,
        now: DateTime<Utc>,
    ) -> bool {
        existing.category == category
            && distance_meters(existing.location, location) < self.policy.dedup_radius_meters
            && (now - existing.created_at).abs() < self.policy.dedup_window()
    }

    fn update(
        &self,
        id: &str,
        apply: impl FnOnce(&mut CommunityReport) -> ReportEvent,
    ) -> Option<CommunityReport> {
        let mut events = Vec::new();
        let updated = {
            let _guard = self.lock();
            let now = self.clock.now();
            let mut reports = self.load_live(now, &mut events);
            let updated = reports.iter_mut().find(|r| r.id == id).map(|report| {
                let event = apply(report);
                (report.clone(), event)
            });
            updated.map(|(report, event)| {
                self.persist(reports, now, &mut events);
                events.push(event);
                report
            })
        };
        self.notify(&events);
        updated
    }

    /// Reads the stored collection and drops expired reports, rewriting
    /// the blob if anything was dropped. Must be called with the lock held.
    fn load_live(&self, now: DateTime<Utc>, events: &mut Vec<ReportEvent>) -> Vec<CommunityReport> {
        let stored = self.read_stored();
        let before = stored.len();
        let retention = self.policy.retention();

        let live: Vec<CommunityReport> = stored
            .into_iter()
            .filter(|r| r.age(now) <= retention)
            .collect();

        if live.len() != before {
            log::debug!("Purging {} expired reports", before - live.len());
            self.persist(live.clone(), now, events);
        }

        live
    }

    fn read_stored(&self) -> Vec<CommunityReport> {
        match self.medium.read(&self.policy.storage_key) {
            Ok(None) => Vec::new(),
            Ok(Some(blob)) => serde_json::from_slice(&blob).unwrap_or_else(|e| {
                log::warn!("Discarding unreadable community report collection: {e}");
                Vec::new()
            }),
            Err(e) => {
                log::warn!("Failed to read community reports: {e}");
                Vec::new()
            }
        }
    }

    /// Writes the collection newest-first, capped at `max_reports`, with
    /// one reduced retry on failure. Must be called with the lock held.
    fn persist(
        &self,
        mut reports: Vec<CommunityReport>,
        now: DateTime<Utc>,
        events: &mut Vec<ReportEvent>,
    ) -> bool {
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        reports.truncate(self.policy.max_reports);

        let Err(e) = self.write(&reports) else {
            self.degraded.store(false, Ordering::Relaxed);
            return true;
        };
        log::warn!("Community report write failed ({e}), purging older reports and retrying");

        let cutoff = self.policy.retention() / 2;
        reports.retain(|r| r.age(now) <= cutoff);
        reports.truncate(self.policy.max_reports / 2);

        match self.write(&reports) {
            Ok(()) => {
                self.degraded.store(false, Ordering::Relaxed);
                true
            }
            Err(e) => {
                log::error!("Community report write dropped after retry: {e}");
                self.degraded.store(true, Ordering::Relaxed);
                events.push(ReportEvent::StorageDegraded);
                false
            }
        }
    }

    fn write(&self, reports: &[CommunityReport]) -> Result<(), ReportError> {
        let blob = serde_json::to_vec(reports)?;
        self.medium.write(&self.policy.storage_key, &blob)?;
        Ok(())
    }

    fn notify(&self, events: &[ReportEvent]) {
        if events.is_empty() {
            return;
        }
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for event in events {
            for listener in &listeners {
                listener.on_event(event);
            }
        }
    }
}
