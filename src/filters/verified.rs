//! Verified-purchase-only filter.

use super::Filter;
use crate::amazon::ReviewRecord;

/// Filters to only include reviews from verified purchases.
pub struct VerifiedFilter;

impl VerifiedFilter {
    /// Creates a new verified filter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for VerifiedFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for VerifiedFilter {
    fn matches(&self, review: &ReviewRecord) -> bool {
        review.verified_purchase
    }

    fn description(&self) -> String {
        "Verified purchases only".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_review(verified: bool) -> ReviewRecord {
        ReviewRecord {
            review_id: "R1TESTTEST".to_string(),
            author: "Tester".to_string(),
            rating: 4,
            title: "Fine".to_string(),
            body: "Works.".to_string(),
            review_date: "June 1, 2024".to_string(),
            verified_purchase: verified,
            ..ReviewRecord::default()
        }
    }

    #[test]
    fn test_verified_filter() {
        let filter = VerifiedFilter::new();

        assert!(filter.matches(&make_review(true)));
        assert!(!filter.matches(&make_review(false)));
    }

    #[test]
    fn test_verified_filter_default() {
        let filter: VerifiedFilter = Default::default();
        assert!(filter.matches(&make_review(true)));
    }

    #[test]
    fn test_verified_filter_description() {
        let filter = VerifiedFilter::new();
        assert_eq!(filter.description(), "Verified purchases only");
    }
}
