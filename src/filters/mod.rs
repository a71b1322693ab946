//! Review filtering system with composable filters.
//!
//! Filters run after collection, trimming the gathered set before it is
//! displayed, saved, or uploaded. Collection itself always gathers the
//! full set so the de-dup ledger and early-stop logic see every review.

pub mod keyword;
pub mod media;
pub mod verified;
pub mod votes;

use crate::amazon::ReviewRecord;

pub use keyword::KeywordFilter;
pub use media::MediaPresenceFilter;
pub use verified::VerifiedFilter;
pub use votes::VotesFilter;

/// Trait for filtering reviews.
pub trait Filter: Send + Sync {
    /// Returns true if the review passes the filter.
    fn matches(&self, review: &ReviewRecord) -> bool;

    /// Returns a description of this filter.
    fn description(&self) -> String;
}

/// A chain of filters that must all pass.
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    /// Creates an empty filter chain.
    pub fn new() -> Self {
        Self { filters: Vec::new() }
    }

    /// Adds a filter to the chain.
    pub fn add(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Checks if a review passes all filters.
    pub fn matches(&self, review: &ReviewRecord) -> bool {
        self.filters.iter().all(|f| f.matches(review))
    }

    /// Filters a collection of reviews.
    pub fn apply(&self, reviews: Vec<ReviewRecord>) -> Vec<ReviewRecord> {
        reviews.into_iter().filter(|r| self.matches(r)).collect()
    }

    /// Returns true if no filters are configured.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Returns the number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns descriptions of all filters.
    pub fn descriptions(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.description()).collect()
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing a FilterChain from configuration.
pub struct FilterChainBuilder {
    chain: FilterChain,
}

impl FilterChainBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self { chain: FilterChain::new() }
    }

    /// Adds a verified-purchase-only filter.
    pub fn verified_only(mut self, enabled: bool) -> Self {
        if enabled {
            self.chain.add(VerifiedFilter::new());
        }
        self
    }

    /// Adds a media-only filter (review must carry images or video).
    pub fn with_media_only(mut self, enabled: bool) -> Self {
        if enabled {
            self.chain.add(MediaPresenceFilter::new());
        }
        self
    }

    /// Adds a minimum helpful votes filter.
    pub fn min_votes(mut self, min: Option<u32>) -> Self {
        if let Some(min) = min {
            self.chain.add(VotesFilter::new(min));
        }
        self
    }

    /// Adds required keywords filter.
    pub fn keywords(mut self, keywords: Vec<String>) -> Self {
        if !keywords.is_empty() {
            self.chain.add(KeywordFilter::required(keywords));
        }
        self
    }

    /// Adds excluded keywords filter.
    pub fn exclude_keywords(mut self, keywords: Vec<String>) -> Self {
        if !keywords.is_empty() {
            self.chain.add(KeywordFilter::excluded(keywords));
        }
        self
    }

    /// Builds the filter chain.
    pub fn build(self) -> FilterChain {
        self.chain
    }
}

impl Default for FilterChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}
