//! HTML extractor for Amazon review-listing pages.

use crate::amazon::marketplace::Marketplace;
use crate::amazon::models::{ProductSummary, ReviewRecord, SYNTHETIC_ID_PREFIX};
use crate::amazon::scrub;
use crate::amazon::selectors::{errors, page, product, review};
use rand::RngExt;
use regex_lite::Regex;
use scraper::{ElementRef, Html, Node};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Review ids scraped from the DOM: "R" followed by at least six
/// alphanumerics.
static REVIEW_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^R[A-Z0-9]{6,}$").unwrap());

/// Review id embedded in a permalink path.
static PERMALINK_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/customer-reviews/(R[A-Z0-9]{6,})").unwrap());

/// Pure rating label, e.g. "5.0 out of 5 stars" and its common
/// storefront translations.
static RATING_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+([.,]\d+)?\s+(out of|von|sur|su|di|de|van de|van|av|z)\s+\d+").unwrap()
});

/// Direct video URL inside embedded player JSON.
static VIDEO_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""videoUrl"\s*:\s*"([^"]+)""#).unwrap());

/// Thumbnail size token in an image URL, e.g. `._SY88.`.
static THUMB_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\._[A-Z]{2,3}\d{2,4}_?\.").unwrap());

/// Errors that make a whole document unusable.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(
        "CAPTCHA detected. Amazon is blocking requests. \
         Try using a proxy or waiting before retrying."
    )]
    Captcha,
    #[error(
        "Amazon error page detected (503). \
         The service may be temporarily unavailable."
    )]
    ErrorPage,
}

/// State of the "next page" control on a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Enabled control with its target href.
    Available { href: String },
    /// Control rendered but disabled (final page).
    Disabled,
    /// No pagination control at all.
    Missing,
}

/// Extractor for review-listing pages.
pub struct ReviewExtractor {
    marketplace: Marketplace,
}

impl ReviewExtractor {
    /// Creates a new extractor for the given storefront.
    pub fn new(marketplace: Marketplace) -> Self {
        Self { marketplace }
    }

    /// Extracts all review records from a rendered listing page.
    ///
    /// Individual unusable nodes are skipped with a diagnostic; only an
    /// interstitial (CAPTCHA/error) page fails the whole document.
    pub fn extract_page(&self, html: &str) -> Result<Vec<ReviewRecord>, ExtractError> {
        let document = Html::parse_document(html);

        // Check for error pages first
        self.check_for_errors(&document)?;

        let nodes = review_nodes(&document);
        let mut records = Vec::with_capacity(nodes.len());

        for element in nodes {
            match self.parse_review_node(element) {
                Some(record) => {
                    trace!("Parsed review {}", record.review_id);
                    records.push(record);
                }
                None => {
                    debug!("Skipping review node without usable text or rating");
                }
            }
        }

        debug!("Extracted {} reviews from page", records.len());
        Ok(records)
    }

    /// Scrapes the product header above the review list, best-effort.
    pub fn product_summary(&self, html: &str) -> Option<ProductSummary> {
        let document = Html::parse_document(html);
        if self.check_for_errors(&document).is_err() {
            return None;
        }

        let title = document
            .select(&product::TITLE)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty());

        let image_url = document
            .select(&product::IMAGE)
            .next()
            .and_then(|e| e.value().attr("src"))
            .map(String::from);

        let average_rating = document
            .select(&product::AVERAGE_RATING)
            .next()
            .and_then(|e| self.parse_average_rating(&e.text().collect::<String>()));

        let price = document
            .select(&product::PRICE)
            .next()
            .and_then(|e| self.parse_price_value(&e.text().collect::<String>()));

        let summary = ProductSummary {
            title,
            image_url,
            average_rating,
            price,
        };
        if summary.is_empty() {
            None
        } else {
            Some(summary)
        }
    }

    /// Checks for CAPTCHA or Amazon's error page.
    fn check_for_errors(&self, document: &Html) -> Result<(), ExtractError> {
        if document.select(&errors::CAPTCHA).next().is_some() {
            return Err(ExtractError::Captcha);
        }
        if document.select(&errors::DOG_PAGE).next().is_some() {
            return Err(ExtractError::ErrorPage);
        }
        Ok(())
    }

    /// Parses a single review node into a record.
    ///
    /// Returns `None` when the node yields neither text nor a rating.
    fn parse_review_node(&self, element: ElementRef) -> Option<ReviewRecord> {
        let review_id = dom_review_id(element).unwrap_or_else(synthesize_review_id);

        let rating = element
            .select(&review::RATING)
            .next()
            .map(|e| parse_leading_int(&e.text().collect::<String>()))
            .unwrap_or(0);

        let title = self.parse_title(element).unwrap_or_default();

        let raw_body = element
            .select(&review::BODY)
            .next()
            .map(text_without_media_chrome)
            .unwrap_or_default();
        let body = scrub::clean_body(&raw_body);

        // Body must never be empty: fall back to the title, then a
        // placeholder derived from the rating, else drop the node.
        let body = if !body.is_empty() {
            body
        } else if !title.is_empty() {
            title.clone()
        } else if rating > 0 {
            format!("{} star rating", rating)
        } else {
            return None;
        };

        let author = element
            .select(&review::AUTHOR)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| "Anonymous".to_string());

        let review_date = element
            .select(&review::DATE)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .map(|raw| raw.strip_prefix("on ").map(str::to_string).unwrap_or(raw))
            .unwrap_or_default();

        let verified_purchase = element.select(&review::VERIFIED).next().is_some();

        let helpful_votes = element
            .select(&review::HELPFUL)
            .next()
            .map(|e| parse_helpful_votes(&e.text().collect::<String>()))
            .unwrap_or(0);

        let image_urls = self.parse_image_urls(element);
        let has_images = !image_urls.is_empty();

        let (has_video, video_url) = self.parse_video(element, &raw_body);

        Some(ReviewRecord {
            review_id,
            author,
            rating,
            title,
            body,
            review_date,
            verified_purchase,
            helpful_votes,
            has_images,
            has_video,
            image_urls: if has_images { Some(image_urls) } else { None },
            video_url,
        })
    }

    /// Takes the first text-bearing span in the title node that is not a
    /// bare rating label.
    fn parse_title(&self, element: ElementRef) -> Option<String> {
        let title_el = element.select(&review::TITLE).next()?;

        for span in title_el.select(&review::TITLE_SPAN) {
            let text = span.text().collect::<String>().trim().to_string();
            if !text.is_empty() && !RATING_LABEL_RE.is_match(&text) {
                return Some(text);
            }
        }

        // Legacy layouts put the title text directly in the anchor.
        let text = title_el.text().collect::<String>().trim().to_string();
        if !text.is_empty() && !RATING_LABEL_RE.is_match(&text) {
            return Some(text);
        }
        None
    }

    /// Collects attached image URLs, normalized to full size and deduped.
    fn parse_image_urls(&self, element: ElementRef) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        for img in element.select(&review::IMAGE_TILES) {
            let Some(src) = img.value().attr("src") else {
                continue;
            };
            let normalized = normalize_image_url(src);
            if !urls.contains(&normalized) {
                urls.push(normalized);
            }
        }
        urls
    }

    /// Detects an attached video.
    ///
    /// Priority: dedicated player container, then a URL inside embedded
    /// player JSON, then leftover player-config markers in the body text.
    fn parse_video(&self, element: ElementRef, raw_body: &str) -> (bool, Option<String>) {
        let node_html = element.html();

        if element.select(&review::VIDEO_CONTAINER).next().is_some() {
            let url = element
                .select(&review::VIDEO_URL_INPUT)
                .next()
                .and_then(|e| e.value().attr("value"))
                .map(String::from)
                .or_else(|| embedded_video_url(&node_html));
            return (true, url);
        }

        if let Some(url) = embedded_video_url(&node_html) {
            return (true, Some(url));
        }

        if scrub::looks_like_player_config(raw_body) {
            return (true, None);
        }

        (false, None)
    }

    /// Parses average-rating header text like "4.3 out of 5" or
    /// "4,3 von 5".
    fn parse_average_rating(&self, text: &str) -> Option<f64> {
        let first = text.split_whitespace().next()?;
        let normalized = if self.marketplace.uses_comma_decimal() {
            first.replace(',', ".")
        } else {
            first.to_string()
        };
        normalized.parse().ok().filter(|v| (0.0..=5.0).contains(v))
    }

    /// Parses a price value from header text, handling storefront decimal
    /// conventions.
    fn parse_price_value(&self, text: &str) -> Option<f64> {
        let cleaned: String = text
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
            .collect();
        if cleaned.is_empty() {
            return None;
        }

        let normalized = if self.marketplace.uses_comma_decimal() {
            // EU format: 1.234,56 -> 1234.56
            cleaned.replace('.', "").replace(',', ".")
        } else {
            // US format: 1,234.56 -> 1234.56
            cleaned.replace(',', "")
        };
        normalized.parse().ok()
    }
}

/// Returns the review nodes of a document, falling back through the
/// alternate selectors only when the primary matches nothing.
fn review_nodes(document: &Html) -> Vec<ElementRef<'_>> {
    let primary: Vec<_> = document.select(&review::NODE).collect();
    if !primary.is_empty() {
        return primary;
    }

    for selector in review::NODE_FALLBACKS.iter() {
        let found: Vec<_> = document.select(selector).collect();
        if !found.is_empty() {
            debug!("Primary review selector empty, using fallback markup");
            return found;
        }
    }
    Vec::new()
}

/// Resolves a review id from the DOM: node id, then the explicit data
/// attribute, then a permalink. `None` when nothing id-like is present.
fn dom_review_id(element: ElementRef) -> Option<String> {
    if let Some(node_id) = element.value().attr("id") {
        for prefix in review::NODE_ID_PREFIXES {
            if let Some(id) = node_id.strip_prefix(prefix) {
                if REVIEW_ID_RE.is_match(id) {
                    return Some(id.to_string());
                }
            }
        }
        if REVIEW_ID_RE.is_match(node_id) {
            return Some(node_id.to_string());
        }
    }

    if let Some(id) = element.value().attr(review::ID_ATTR) {
        if REVIEW_ID_RE.is_match(id) {
            return Some(id.to_string());
        }
    }

    for link in element.select(&review::PERMALINK) {
        if let Some(href) = link.value().attr("href") {
            if let Some(caps) = PERMALINK_ID_RE.captures(href) {
                return Some(caps[1].to_string());
            }
        }
    }

    None
}

/// Builds a namespaced id for nodes without any DOM-derived one.
fn synthesize_review_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix: u32 = rand::rng().random_range(0..=u32::MAX);
    format!("{}{}-{:08x}", SYNTHETIC_ID_PREFIX, millis, suffix)
}

/// The id of the first review in the document, used as the pagination
/// fingerprint. Synthesized ids are excluded so the fingerprint stays
/// stable across repeated reads of the same page.
pub fn first_review_id(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    review_nodes(&document)
        .into_iter()
        .find_map(dom_review_id)
}

/// Reads the state of the "next page" control.
pub fn next_page(html: &str) -> NextPage {
    let document = Html::parse_document(html);

    if let Some(link) = document.select(&page::NEXT_LINK).next() {
        if let Some(href) = link.value().attr("href") {
            return NextPage::Available {
                href: href.to_string(),
            };
        }
    }
    if document.select(&page::NEXT_DISABLED).next().is_some() {
        return NextPage::Disabled;
    }
    if document.select(&page::PAGINATION).next().is_some() {
        warn!("Pagination strip present but no next control found");
    }
    NextPage::Missing
}

/// Extracts the leading integer from text like "4.0 out of 5 stars".
fn parse_leading_int(text: &str) -> u8 {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Parses a helpful-votes statement like "17 people found this helpful".
fn parse_helpful_votes(text: &str) -> u32 {
    let trimmed = text.trim_start();
    // English singular spells the count out.
    if trimmed.starts_with("One person") || trimmed.starts_with("one person") {
        return 1;
    }
    let digits: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .filter(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Swaps a thumbnail size token for the full-size one.
fn normalize_image_url(url: &str) -> String {
    THUMB_TOKEN_RE.replace(url, "._SL1600_.").into_owned()
}

/// Finds a direct video URL inside embedded player JSON.
fn embedded_video_url(html: &str) -> Option<String> {
    VIDEO_URL_RE
        .captures(html)
        .map(|caps| caps[1].replace("\\/", "/"))
}

/// Inner text of a subtree, skipping script/style and video-player
/// chrome. The parsed document itself is never mutated.
fn text_without_media_chrome(element: ElementRef) -> String {
    let mut out = String::new();
    collect_visible_text(element, &mut out);
    out
}

fn collect_visible_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    if is_media_chrome(&child_el) {
                        continue;
                    }
                    collect_visible_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

fn is_media_chrome(element: &ElementRef) -> bool {
    let value = element.value();
    if matches!(value.name(), "script" | "style" | "video" | "input") {
        return true;
    }
    let class = value.attr("class").unwrap_or_default();
    class.contains("video-block")
        || class.contains("video-player")
        || class.contains("a-video")
        || value.attr("data-hook") == Some("video-block")
}
