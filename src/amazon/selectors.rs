//! CSS selectors for Amazon review-listing pages.
//!
//! This file contains all CSS selectors used for parsing review listings.
//! Update this file when Amazon changes their HTML structure.
//!
//! **Update process**: When parsing fails, capture HTML sample,
//! update selectors, and add test fixture.

use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for individual review nodes and their fields.
pub mod review {
    use super::*;

    /// Primary review node container.
    pub static NODE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div[data-hook='review']").unwrap());

    /// Fallback node selectors, tried in order only when the primary
    /// matches nothing. Markup varies by locale and layout experiment.
    pub static NODE_FALLBACKS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        vec![
            Selector::parse("div[id^='customer_review']").unwrap(),
            Selector::parse("div.review").unwrap(),
        ]
    });

    /// Attribute carrying an explicit review id on some layouts.
    pub static ID_ATTR: &str = "data-review-id";

    /// Node id prefixes that wrap the real review id.
    pub static NODE_ID_PREFIXES: &[&str] = &["customer_review_foreign-", "customer_review-"];

    /// Star-rating label, e.g. "4.0 out of 5 stars".
    pub static RATING: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "i[data-hook='review-star-rating'] span.a-icon-alt, \
             i[data-hook='cmps-review-star-rating'] span.a-icon-alt, \
             i.review-rating span.a-icon-alt, \
             span.a-icon-alt",
        )
        .unwrap()
    });

    /// Review title container (link on desktop, plain span on some layouts).
    pub static TITLE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "a[data-hook='review-title'], \
             span[data-hook='review-title']",
        )
        .unwrap()
    });

    /// Spans inside the title container; the rating label hides among them.
    pub static TITLE_SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());

    /// Review body text container.
    pub static BODY: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "span[data-hook='review-body'], \
             div.review-data span.review-text, \
             span.review-text-content",
        )
        .unwrap()
    });

    /// Reviewer display name.
    pub static AUTHOR: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.a-profile-name").unwrap());

    /// Review date line, e.g. "Reviewed in the United States on June 1, 2024".
    pub static DATE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span[data-hook='review-date']").unwrap());

    /// Verified-purchase badge.
    pub static VERIFIED: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "span[data-hook='avp-badge'], \
             span[data-hook='avp-badge-linkless']",
        )
        .unwrap()
    });

    /// Helpful-votes statement, e.g. "17 people found this helpful".
    pub static HELPFUL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span[data-hook='helpful-vote-statement']").unwrap());

    /// Image thumbnails attached to a review.
    pub static IMAGE_TILES: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "img[data-hook='review-image-tile'], \
             .review-image-tile-section img, \
             img.review-image-tile",
        )
        .unwrap()
    });

    /// Dedicated video player container inside a review.
    pub static VIDEO_CONTAINER: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "div[data-hook='video-block'], \
             .video-block, \
             div.a-video-container",
        )
        .unwrap()
    });

    /// Hidden input carrying the direct video URL on some layouts.
    pub static VIDEO_URL_INPUT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("input.video-url").unwrap());

    /// Permalink anchors that embed the review id in their href.
    pub static PERMALINK: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "a[data-hook='review-title'][href], \
             a[href*='customer-reviews']",
        )
        .unwrap()
    });
}

/// Selectors for pagination controls on the listing.
pub mod page {
    use super::*;

    /// Enabled "next page" link.
    pub static NEXT_LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("ul.a-pagination li.a-last a").unwrap());

    /// Disabled "next page" slot (present on the final page).
    pub static NEXT_DISABLED: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("ul.a-pagination li.a-last.a-disabled").unwrap());

    /// Pagination strip container.
    pub static PAGINATION: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("ul.a-pagination").unwrap());
}

/// Selectors for the product header shown above the review list.
pub mod product {
    use super::*;

    /// Product title link in the listing header.
    pub static TITLE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "a[data-hook='product-link'], \
             h1 a[data-hook='product-link'], \
             .product-title a",
        )
        .unwrap()
    });

    /// Product image in the listing header.
    pub static IMAGE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "img[data-hook='cr-product-image'], \
             .product-image img",
        )
        .unwrap()
    });

    /// Average rating text, e.g. "4.3 out of 5".
    pub static AVERAGE_RATING: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "span[data-hook='rating-out-of-text'], \
             div[data-hook='average-star-rating'] span.a-icon-alt",
        )
        .unwrap()
    });

    /// Product price, when the header variant carries one.
    pub static PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".a-price .a-offscreen").unwrap());
}

/// Selectors for detecting error/captcha pages.
pub mod errors {
    use super::*;

    /// CAPTCHA form.
    pub static CAPTCHA: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "form[action*='validateCaptcha'], \
             img[src*='captcha']",
        )
        .unwrap()
    });

    /// Dog page (Amazon's error page).
    pub static DOG_PAGE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "img[alt*='dog'], \
             .a-box-inner a[href='/ref=cs_503_link']",
        )
        .unwrap()
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_selectors_compile() {
        // Force evaluation of all lazy selectors to ensure they compile
        let _ = &*review::NODE;
        let _ = &*review::NODE_FALLBACKS;
        let _ = &*review::RATING;
        let _ = &*review::TITLE;
        let _ = &*review::BODY;
        let _ = &*review::IMAGE_TILES;
        let _ = &*review::VIDEO_CONTAINER;
        let _ = &*page::NEXT_LINK;
        let _ = &*page::NEXT_DISABLED;
        let _ = &*product::TITLE;
        let _ = &*product::AVERAGE_RATING;
        let _ = &*errors::CAPTCHA;
        let _ = &*errors::DOG_PAGE;
    }

    #[test]
    fn test_basic_review_node_matching() {
        let html = Html::parse_document(
            r#"<div id="customer_review-R1ABCDEFGH" data-hook="review">
                <span class="a-profile-name">Pat</span>
                <span data-hook="review-date">Reviewed on June 1, 2024</span>
            </div>"#,
        );

        let nodes: Vec<_> = html.select(&review::NODE).collect();
        assert_eq!(nodes.len(), 1);
        assert_eq!(
            nodes[0].value().attr("id"),
            Some("customer_review-R1ABCDEFGH")
        );
    }

    #[test]
    fn test_fallback_node_selector_matches_legacy_markup() {
        let html = Html::parse_document(
            r#"<div class="review"><span class="a-profile-name">Sam</span></div>"#,
        );

        assert_eq!(html.select(&review::NODE).count(), 0);
        let hits: usize = review::NODE_FALLBACKS
            .iter()
            .map(|sel| html.select(sel).count())
            .sum();
        assert!(hits > 0);
    }

    #[test]
    fn test_next_page_selectors_distinguish_disabled() {
        let enabled = Html::parse_document(
            r#"<ul class="a-pagination"><li class="a-last"><a href="/product-reviews/B0?pageNumber=2">Next</a></li></ul>"#,
        );
        assert_eq!(enabled.select(&page::NEXT_LINK).count(), 1);
        assert_eq!(enabled.select(&page::NEXT_DISABLED).count(), 0);

        let disabled = Html::parse_document(
            r#"<ul class="a-pagination"><li class="a-last a-disabled">Next</li></ul>"#,
        );
        assert_eq!(disabled.select(&page::NEXT_LINK).count(), 0);
        assert_eq!(disabled.select(&page::NEXT_DISABLED).count(), 1);
    }
}
