//! Built-in incident feeds, embedded from `feeds/*.toml`.
//!
//! Each `.toml` file in `packages/source/feeds/` is baked into the binary
//! at compile time via [`include_str!`]. Adding a new feed is as simple as
//! creating a new TOML file and adding it to the list below.

use crate::feed_def::{FeedDefinition, parse_feed_toml};

/// Feed used when none is configured.
pub const DEFAULT_FEED_ID: &str = "nyc_bronx";

/// TOML configs embedded at compile time.
const FEED_TOMLS: &[(&str, &str)] = &[
    ("nyc_bronx", include_str!("../feeds/nyc_bronx.toml")),
    ("nyc_brooklyn", include_str!("../feeds/nyc_brooklyn.toml")),
    ("nyc_manhattan", include_str!("../feeds/nyc_manhattan.toml")),
    ("nyc_queens", include_str!("../feeds/nyc_queens.toml")),
    (
        "nyc_staten_island",
        include_str!("../feeds/nyc_staten_island.toml"),
    ),
];

#[cfg(test)]
const EXPECTED_FEED_COUNT: usize = 5;

/// Returns all configured feed definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_feeds() -> Vec<FeedDefinition> {
    FEED_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_feed_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up a feed definition by its ID.
#[must_use]
pub fn find_feed(id: &str) -> Option<FeedDefinition> {
    all_feeds().into_iter().find(|f| f.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_feeds() {
        assert_eq!(all_feeds().len(), EXPECTED_FEED_COUNT);
    }

    #[test]
    fn feed_ids_are_unique_and_match_file_names() {
        let feeds = all_feeds();
        for ((name, _), feed) in FEED_TOMLS.iter().zip(&feeds) {
            assert_eq!(*name, feed.id);
        }
        let mut ids: Vec<&str> = feeds.iter().map(|f| f.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), EXPECTED_FEED_COUNT);
    }

    #[test]
    fn default_feed_is_the_bronx() {
        let feed = find_feed(DEFAULT_FEED_ID).unwrap();
        assert_eq!(feed.region.as_deref(), Some("BRONX"));
        assert_eq!(feed.lookback_days, 18);
        assert_eq!(feed.limit, 2_000);
    }

    #[test]
    fn all_feeds_have_required_fields() {
        for feed in &all_feeds() {
            assert!(!feed.name.is_empty(), "{}: name is empty", feed.id);
            assert!(!feed.fields.id.is_empty(), "{}: no id field", feed.id);
            assert!(
                !feed.fields.description.is_empty(),
                "{}: no description fields",
                feed.id
            );
            assert!(feed.region.is_some(), "{}: no region", feed.id);
        }
    }

    #[test]
    fn unknown_feed_is_none() {
        assert!(find_feed("atlantis").is_none());
    }
}
