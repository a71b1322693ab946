//! Data models for collected reviews and upload batches.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix reserved for synthesized review ids.
///
/// Real Amazon review ids begin with `R`, so ids in this namespace can
/// never collide with one scraped from the page.
pub const SYNTHETIC_ID_PREFIX: &str = "synthetic-";

/// One extracted product review.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Unique review identifier (DOM-derived, or synthesized)
    pub review_id: String,
    /// Reviewer display name, "Anonymous" when missing
    pub author: String,
    /// Star rating 1..=5; forced to the active star filter on collection
    pub rating: u8,
    /// Review headline
    pub title: String,
    /// Review text; never empty on emitted records
    pub body: String,
    /// Raw locale date text, e.g. "June 1, 2024"
    pub review_date: String,
    /// Verified-purchase badge present
    pub verified_purchase: bool,
    /// Helpful-votes count
    pub helpful_votes: u32,
    /// Review has attached images
    pub has_images: bool,
    /// Review has an attached video
    pub has_video: bool,
    /// Full-size image URLs, deduplicated
    pub image_urls: Option<Vec<String>>,
    /// Direct video URL when one could be resolved
    pub video_url: Option<String>,
}

impl ReviewRecord {
    /// Returns true if the review carries images or video.
    pub fn has_media(&self) -> bool {
        self.has_images || self.has_video
    }

    /// Returns true if the id was synthesized rather than read from the DOM.
    pub fn is_synthetic(&self) -> bool {
        self.review_id.starts_with(SYNTHETIC_ID_PREFIX)
    }
}

/// Product details scraped from the review-listing header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Product title
    pub title: Option<String>,
    /// Product image URL
    pub image_url: Option<String>,
    /// Average star rating (0.0 - 5.0)
    pub average_rating: Option<f64>,
    /// Product price, when the header variant shows one
    pub price: Option<f64>,
}

impl ProductSummary {
    /// Returns true if nothing could be scraped from the header.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.image_url.is_none()
            && self.average_rating.is_none()
            && self.price.is_none()
    }
}

/// Upload payload for one completed collection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewBatch {
    /// Amazon Standard Identification Number
    pub asin: String,
    /// Product title
    pub title: Option<String>,
    /// Product image URL
    pub image_url: Option<String>,
    /// Storefront code, e.g. "us"
    pub marketplace: String,
    /// Average star rating from the listing header
    pub average_rating: Option<f64>,
    /// Product price
    pub price: Option<f64>,
    /// Product bullet points (empty when not collected)
    pub bullet_points: Vec<String>,
    /// Collected reviews
    pub reviews: Vec<ReviewRecord>,
}

impl ReviewBatch {
    /// Assembles a batch from a run's product header and review list.
    pub fn new(
        asin: impl Into<String>,
        marketplace: impl Into<String>,
        product: Option<ProductSummary>,
        reviews: Vec<ReviewRecord>,
    ) -> Self {
        let product = product.unwrap_or_default();
        Self {
            asin: asin.into(),
            title: product.title,
            image_url: product.image_url,
            marketplace: marketplace.into(),
            average_rating: product.average_rating,
            price: product.price,
            bullet_points: Vec::new(),
            reviews,
        }
    }

    /// Returns number of reviews in the batch.
    pub fn count(&self) -> usize {
        self.reviews.len()
    }
}

/// Success body returned by the ingest endpoint.
///
/// Fields beyond the common ones vary by backend version, so unknown
/// keys are retained verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReceipt {
    /// Human-readable acknowledgement, if the backend sends one
    pub message: Option<String>,
    /// Identifier of the stored report, if the backend sends one
    pub report_id: Option<String>,
    /// Everything else in the body
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A 1..=5 star rating used to scope a review-listing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct StarFilter(u8);

impl StarFilter {
    /// Creates a star filter, rejecting values outside 1..=5.
    pub fn new(stars: u8) -> Result<Self, StarFilterParseError> {
        if (1..=5).contains(&stars) {
            Ok(Self(stars))
        } else {
            Err(StarFilterParseError(stars.to_string()))
        }
    }

    /// Returns the numeric star value.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Returns the listing query token, e.g. `five_star`.
    pub fn token(&self) -> &'static str {
        match self.0 {
            1 => "one_star",
            2 => "two_star",
            3 => "three_star",
            4 => "four_star",
            _ => "five_star",
        }
    }

    /// All five filters, lowest star first.
    pub fn all() -> Vec<StarFilter> {
        (1..=5).map(StarFilter).collect()
    }
}

impl TryFrom<u8> for StarFilter {
    type Error = StarFilterParseError;

    fn try_from(stars: u8) -> Result<Self, Self::Error> {
        StarFilter::new(stars)
    }
}

impl From<StarFilter> for u8 {
    fn from(star: StarFilter) -> u8 {
        star.0
    }
}

impl fmt::Display for StarFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StarFilter {
    type Err = StarFilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map_err(|_| StarFilterParseError(s.to_string()))
            .and_then(StarFilter::new)
    }
}

#[derive(Debug, Clone)]
pub struct StarFilterParseError(String);

impl fmt::Display for StarFilterParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid star filter '{}'. Expected 1-5", self.0)
    }
}

impl std::error::Error for StarFilterParseError {}

/// Which reviews the listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaFilter {
    /// All reviews regardless of attachments
    #[default]
    All,
    /// Only reviews with images or video
    MediaOnly,
}

impl MediaFilter {
    /// Returns the listing query token.
    pub fn token(&self) -> &'static str {
        match self {
            MediaFilter::All => "all_contents",
            MediaFilter::MediaOnly => "media_reviews_only",
        }
    }
}

impl fmt::Display for MediaFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaFilter::All => "all",
            MediaFilter::MediaOnly => "media-only",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for MediaFilter {
    type Err = MediaFilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" | "all_contents" => Ok(MediaFilter::All),
            "media-only" | "media_only" | "media" | "media_reviews_only" => {
                Ok(MediaFilter::MediaOnly)
            }
            _ => Err(MediaFilterParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaFilterParseError(String);

impl fmt::Display for MediaFilterParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown media filter '{}'. Valid filters: all, media-only",
            self.0
        )
    }
}

impl std::error::Error for MediaFilterParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_review() -> ReviewRecord {
        ReviewRecord {
            review_id: "R1ABCDEFGH".to_string(),
            author: "Pat".to_string(),
            rating: 5,
            title: "Great product".to_string(),
            body: "Works exactly as described.".to_string(),
            review_date: "June 1, 2024".to_string(),
            verified_purchase: true,
            helpful_votes: 17,
            has_images: true,
            has_video: false,
            image_urls: Some(vec!["https://m.media-amazon.com/img1._SL1600_.jpg".to_string()]),
            video_url: None,
        }
    }

    #[test]
    fn test_review_has_media() {
        let review = make_test_review();
        assert!(review.has_media());

        let mut review = make_test_review();
        review.has_images = false;
        review.image_urls = None;
        assert!(!review.has_media());

        review.has_video = true;
        assert!(review.has_media());
    }

    #[test]
    fn test_review_synthetic_id() {
        let mut review = make_test_review();
        assert!(!review.is_synthetic());

        review.review_id = format!("{}1718000000000-a3f9", SYNTHETIC_ID_PREFIX);
        assert!(review.is_synthetic());
    }

    #[test]
    fn test_review_serde_round_trip() {
        let review = make_test_review();
        let json = serde_json::to_string(&review).unwrap();
        assert!(json.contains("R1ABCDEFGH"));
        assert!(json.contains("verified_purchase"));

        let parsed: ReviewRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.review_id, review.review_id);
        assert_eq!(parsed.rating, 5);
        assert_eq!(parsed.helpful_votes, 17);
    }

    #[test]
    fn test_product_summary_is_empty() {
        assert!(ProductSummary::default().is_empty());

        let summary = ProductSummary {
            average_rating: Some(4.3),
            ..Default::default()
        };
        assert!(!summary.is_empty());
    }

    #[test]
    fn test_batch_from_product_summary() {
        let product = ProductSummary {
            title: Some("Widget".to_string()),
            image_url: Some("https://m.media-amazon.com/widget.jpg".to_string()),
            average_rating: Some(4.3),
            price: Some(19.99),
        };
        let batch = ReviewBatch::new("B0TEST1234", "us", Some(product), vec![make_test_review()]);

        assert_eq!(batch.asin, "B0TEST1234");
        assert_eq!(batch.marketplace, "us");
        assert_eq!(batch.title.as_deref(), Some("Widget"));
        assert_eq!(batch.average_rating, Some(4.3));
        assert_eq!(batch.count(), 1);
        assert!(batch.bullet_points.is_empty());
    }

    #[test]
    fn test_batch_without_product_summary() {
        let batch = ReviewBatch::new("B0TEST1234", "de", None, Vec::new());
        assert!(batch.title.is_none());
        assert!(batch.average_rating.is_none());
        assert_eq!(batch.count(), 0);
    }

    #[test]
    fn test_ingest_receipt_keeps_unknown_fields() {
        let receipt: IngestReceipt =
            serde_json::from_str(r#"{"message":"ok","queued":true,"count":10}"#).unwrap();
        assert_eq!(receipt.message.as_deref(), Some("ok"));
        assert!(receipt.report_id.is_none());
        assert_eq!(receipt.extra.get("queued"), Some(&serde_json::json!(true)));
    }

    #[test]
    fn test_star_filter_bounds() {
        assert!(StarFilter::new(0).is_err());
        assert!(StarFilter::new(6).is_err());
        for stars in 1..=5 {
            assert_eq!(StarFilter::new(stars).unwrap().value(), stars);
        }
    }

    #[test]
    fn test_star_filter_tokens() {
        assert_eq!(StarFilter::new(1).unwrap().token(), "one_star");
        assert_eq!(StarFilter::new(3).unwrap().token(), "three_star");
        assert_eq!(StarFilter::new(5).unwrap().token(), "five_star");
    }

    #[test]
    fn test_star_filter_parse_and_display() {
        let star: StarFilter = "4".parse().unwrap();
        assert_eq!(star.value(), 4);
        assert_eq!(star.to_string(), "4");
        assert!(" 5 ".parse::<StarFilter>().is_ok());
        assert!("0".parse::<StarFilter>().is_err());
        assert!("five".parse::<StarFilter>().is_err());
    }

    #[test]
    fn test_star_filter_all() {
        let all = StarFilter::all();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].value(), 1);
        assert_eq!(all[4].value(), 5);
    }

    #[test]
    fn test_star_filter_serde_rejects_out_of_range() {
        let star: StarFilter = serde_json::from_str("3").unwrap();
        assert_eq!(star.value(), 3);
        assert!(serde_json::from_str::<StarFilter>("9").is_err());
        assert_eq!(serde_json::to_string(&star).unwrap(), "3");
    }

    #[test]
    fn test_media_filter_tokens() {
        assert_eq!(MediaFilter::All.token(), "all_contents");
        assert_eq!(MediaFilter::MediaOnly.token(), "media_reviews_only");
    }

    #[test]
    fn test_media_filter_parse() {
        assert_eq!(MediaFilter::from_str("all").unwrap(), MediaFilter::All);
        assert_eq!(
            MediaFilter::from_str("media-only").unwrap(),
            MediaFilter::MediaOnly
        );
        assert_eq!(
            MediaFilter::from_str("MEDIA").unwrap(),
            MediaFilter::MediaOnly
        );
        assert!(MediaFilter::from_str("pictures").is_err());
    }
}
