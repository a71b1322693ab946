//! Minimum helpful votes filter.

use super::Filter;
use crate::amazon::ReviewRecord;

/// Filters reviews by minimum helpful-vote count.
pub struct VotesFilter {
    min_votes: u32,
}

impl VotesFilter {
    /// Creates a new votes filter with a minimum count.
    pub fn new(min_votes: u32) -> Self {
        Self { min_votes }
    }
}

impl Filter for VotesFilter {
    fn matches(&self, review: &ReviewRecord) -> bool {
        review.helpful_votes >= self.min_votes
    }

    fn description(&self) -> String {
        format!("Helpful votes: >= {}", self.min_votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_review(votes: u32) -> ReviewRecord {
        ReviewRecord {
            review_id: "R1TESTTEST".to_string(),
            author: "Tester".to_string(),
            rating: 4,
            title: "Fine".to_string(),
            body: "Works.".to_string(),
            review_date: "June 1, 2024".to_string(),
            verified_purchase: true,
            helpful_votes: votes,
            ..ReviewRecord::default()
        }
    }

    #[test]
    fn test_votes_filter() {
        let filter = VotesFilter::new(3);

        assert!(!filter.matches(&make_review(2)));
        assert!(filter.matches(&make_review(3)));
        assert!(filter.matches(&make_review(10)));
    }

    #[test]
    fn test_zero_minimum_passes_all() {
        let filter = VotesFilter::new(0);
        assert!(filter.matches(&make_review(0)));
        assert!(filter.matches(&make_review(100)));
    }

    #[test]
    fn test_description() {
        let filter = VotesFilter::new(5);
        assert_eq!(filter.description(), "Helpful votes: >= 5");
    }
}
