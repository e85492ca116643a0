//! Change notifications for report store subscribers.
//!
//! Presentation code registers a [`ReportListener`] with the store instead
//! of reaching into shared global state; it is told about every committed
//! change and re-reads the store as it sees fit.

use safepath_reports_models::CommunityReport;

/// A committed change to the report store.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    /// A report was created.
    Added(CommunityReport),
    /// A report's vote count changed.
    Voted {
        /// Report ID.
        id: String,
        /// Vote count after the change.
        vote_count: u32,
    },
    /// A report was marked verified.
    Verified {
        /// Report ID.
        id: String,
    },
    /// A report was removed.
    Deleted {
        /// Report ID.
        id: String,
    },
    /// The store was emptied.
    Cleared,
    /// A durable write was dropped after the recovery attempt failed.
    StorageDegraded,
}

/// Receives [`ReportEvent`]s.
///
/// Called after the store has released its lock, so listeners may call
/// back into the store.
pub trait ReportListener: Send + Sync {
    /// Handles one event.
    fn on_event(&self, event: &ReportEvent);
}

impl<F> ReportListener for F
where
    F: Fn(&ReportEvent) + Send + Sync,
{
    fn on_event(&self, event: &ReportEvent) {
        self(event);
    }
}
