//! Media-presence filter.
//!
//! Distinct from the collection-time media filter, which changes the
//! listing URL. This one drops already-collected reviews without
//! attachments.

use super::Filter;
use crate::amazon::ReviewRecord;

/// Filters to only include reviews carrying images or video.
pub struct MediaPresenceFilter;

impl MediaPresenceFilter {
    /// Creates a new media-presence filter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for MediaPresenceFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for MediaPresenceFilter {
    fn matches(&self, review: &ReviewRecord) -> bool {
        review.has_media()
    }

    fn description(&self) -> String {
        "With media only".to_string()
    }
}
