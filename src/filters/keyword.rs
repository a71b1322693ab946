//! Keyword-based review text filtering.

use super::Filter;
use crate::amazon::ReviewRecord;

/// Filters reviews by keywords in the title or body.
pub struct KeywordFilter {
    /// Keywords that must appear in the review text.
    required: Vec<String>,
    /// Keywords that must NOT appear in the review text.
    excluded: Vec<String>,
}

impl KeywordFilter {
    /// Creates a new keyword filter.
    pub fn new(required: Vec<String>, excluded: Vec<String>) -> Self {
        Self {
            required: required.into_iter().map(|k| k.to_lowercase()).collect(),
            excluded: excluded.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Creates a filter with only required keywords.
    pub fn required(keywords: Vec<String>) -> Self {
        Self::new(keywords, Vec::new())
    }

    /// Creates a filter with only excluded keywords.
    pub fn excluded(keywords: Vec<String>) -> Self {
        Self::new(Vec::new(), keywords)
    }
}

impl Filter for KeywordFilter {
    fn matches(&self, review: &ReviewRecord) -> bool {
        let text = format!("{} {}", review.title, review.body).to_lowercase();

        // Check required keywords (all must be present)
        for keyword in &self.required {
            if !text.contains(keyword) {
                return false;
            }
        }

        // Check excluded keywords (none must be present)
        for keyword in &self.excluded {
            if text.contains(keyword) {
                return false;
            }
        }

        true
    }

    fn description(&self) -> String {
        let mut parts = Vec::new();

        if !self.required.is_empty() {
            parts.push(format!("Must contain: {}", self.required.join(", ")));
        }

        if !self.excluded.is_empty() {
            parts.push(format!("Must not contain: {}", self.excluded.join(", ")));
        }

        if parts.is_empty() {
            "Keywords: any".to_string()
        } else {
            parts.join("; ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_review(title: &str, body: &str) -> ReviewRecord {
        ReviewRecord {
            review_id: "R1TESTTEST".to_string(),
            author: "Tester".to_string(),
            rating: 4,
            title: title.to_string(),
            body: body.to_string(),
            review_date: "June 1, 2024".to_string(),
            verified_purchase: true,
            helpful_votes: 0,
            ..ReviewRecord::default()
        }
    }

    #[test]
    fn test_required_keywords() {
        let filter = KeywordFilter::required(vec!["battery".to_string(), "charge".to_string()]);

        assert!(filter.matches(&make_review("Battery life", "Holds a charge for days.")));
        assert!(filter.matches(&make_review("BATTERY", "CHARGE"))); // Case insensitive
        assert!(!filter.matches(&make_review("Battery life", "Lasts for days.")));
        assert!(!filter.matches(&make_review("Nice color", "Looks great.")));
    }

    #[test]
    fn test_keyword_in_body_counts() {
        let filter = KeywordFilter::required(vec!["durable".to_string()]);
        assert!(filter.matches(&make_review("Good", "Very durable shell.")));
    }

    #[test]
    fn test_excluded_keywords() {
        let filter = KeywordFilter::excluded(vec!["broke".to_string(), "refund".to_string()]);

        assert!(filter.matches(&make_review("Happy", "Works fine.")));
        assert!(!filter.matches(&make_review("Disappointed", "It broke in a week.")));
        assert!(!filter.matches(&make_review("Refund requested", "Did not fit.")));
    }

    #[test]
    fn test_both_required_and_excluded() {
        let filter =
            KeywordFilter::new(vec!["battery".to_string()], vec!["refund".to_string()]);

        assert!(filter.matches(&make_review("Battery", "Lasts long.")));
        assert!(!filter.matches(&make_review("Shipping", "Arrived fast.")));
        assert!(!filter.matches(&make_review("Battery", "Want a refund.")));
    }

    #[test]
    fn test_empty_keywords() {
        let filter = KeywordFilter::new(Vec::new(), Vec::new());
        assert!(filter.matches(&make_review("Anything", "at all")));
    }

    #[test]
    fn test_partial_match() {
        let filter = KeywordFilter::required(vec!["charge".to_string()]);
        assert!(filter.matches(&make_review("Charger", "Supports fast charging.")));
    }

    #[test]
    fn test_description_required_only() {
        let filter = KeywordFilter::required(vec!["battery".to_string()]);
        let desc = filter.description();
        assert!(desc.contains("Must contain:"));
        assert!(desc.contains("battery"));
    }

    #[test]
    fn test_description_both() {
        let filter =
            KeywordFilter::new(vec!["battery".to_string()], vec!["refund".to_string()]);
        let desc = filter.description();
        assert!(desc.contains("Must contain:"));
        assert!(desc.contains("Must not contain:"));
    }

    #[test]
    fn test_description_empty() {
        let filter = KeywordFilter::new(Vec::new(), Vec::new());
        assert_eq!(filter.description(), "Keywords: any");
    }

    #[test]
    fn test_keywords_stored_lowercase() {
        let filter = KeywordFilter::new(vec!["LOUD".to_string()], vec!["QUIET".to_string()]);
        assert!(filter.matches(&make_review("loud fan", "noticeable hum")));
        assert!(!filter.matches(&make_review("loud fan", "but quiet at night")));
    }
}
