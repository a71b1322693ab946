//! Positions the collector tab on successive listing pages.
//!
//! Page 1 is reached by direct URL navigation. Later pages go through
//! the listing's own "next" control so the request pattern resembles a
//! person paging through reviews; raw URL pagination past page 1 is what
//! anti-automation defenses key on. Content change is detected by
//! polling a cheap fingerprint instead of sleeping a fixed interval.

use crate::amazon::extract;
use crate::amazon::models::{MediaFilter, StarFilter};
use crate::browser::tab::{BrowserTab, ClickOutcome};
use crate::browser::timing::{pause, TimingProfile};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, trace, warn};

/// How an attempt to show a page ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The tab shows fresh content for the requested page.
    Changed,
    /// Content did not verifiably change; extract whatever is rendered.
    Unchanged,
    /// The listing has no further pages for this star.
    NoMorePages,
}

/// Drives one tab through the pages of a star's review listing.
pub struct Pager {
    base_url: String,
    asin: String,
    media: MediaFilter,
    timing: TimingProfile,
}

impl Pager {
    pub fn new(
        base_url: impl Into<String>,
        asin: impl Into<String>,
        media: MediaFilter,
        timing: TimingProfile,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            asin: asin.into(),
            media,
            timing,
        }
    }

    /// Builds the listing URL for a star and page.
    pub fn listing_url(&self, star: StarFilter, page: u32) -> String {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        format!(
            "{}/product-reviews/{}?ie=UTF8&reviewerType=all_reviews&filterByStar={}&pageNumber={}&sortBy=recent&mediaType={}&_ts={}",
            self.base_url,
            self.asin,
            star.token(),
            page,
            self.media.token(),
            ts
        )
    }

    /// Brings the requested page into the tab.
    ///
    /// Failures never escape: navigation and scripting errors are logged
    /// and reported as [`Advance::Unchanged`] so the run keeps moving.
    pub async fn show_page(
        &self,
        tab: &mut dyn BrowserTab,
        star: StarFilter,
        page: u32,
    ) -> Advance {
        if page <= 1 {
            self.open_listing(tab, star).await
        } else {
            self.click_through(tab, star, page).await
        }
    }

    /// Page 1: direct navigation, settle, one lazy-load scroll.
    async fn open_listing(&self, tab: &mut dyn BrowserTab, star: StarFilter) -> Advance {
        let url = self.listing_url(star, 1);
        debug!("Opening {} star listing", star.value());

        if let Err(err) = tab.navigate(&url).await {
            warn!("First-page navigation failed: {}", err);
            return Advance::Unchanged;
        }
        pause(self.timing.first_page_wait).await;

        if let Err(err) = tab.scroll_to_bottom().await {
            trace!("Lazy-load scroll failed: {}", err);
        }
        pause(self.timing.scroll_wait).await;

        Advance::Changed
    }

    /// Pages beyond the first: scroll to the control, click it, then
    /// poll the first-review-id fingerprint until content changes or the
    /// bounded wait elapses.
    async fn click_through(&self, tab: &mut dyn BrowserTab, star: StarFilter, page: u32) -> Advance {
        let before = match tab.document().await {
            Ok(html) => extract::first_review_id(&html),
            Err(err) => {
                warn!("Could not read collector tab before paging: {}", err);
                return Advance::Unchanged;
            }
        };

        if let Err(err) = tab.scroll_to_bottom().await {
            trace!("Scroll toward pagination failed: {}", err);
        }
        pause(self.timing.scroll_wait).await;

        match tab.click_next().await {
            Ok(ClickOutcome::Clicked) => {}
            Ok(ClickOutcome::Disabled) => {
                debug!("Next control disabled; {} star listing ends before page {}", star.value(), page);
                return Advance::NoMorePages;
            }
            Ok(ClickOutcome::Missing) => {
                debug!("No pagination control; {} star listing has a single page", star.value());
                return Advance::NoMorePages;
            }
            Err(err) => {
                warn!("Could not activate next control: {}", err);
                return Advance::Unchanged;
            }
        }

        let deadline = Instant::now() + self.timing.next_page_wait;
        loop {
            match tab.document().await {
                Ok(html) => {
                    let current = extract::first_review_id(&html);
                    if current != before {
                        trace!("Content fingerprint changed for page {}", page);
                        pause(self.timing.settle_grace).await;
                        return Advance::Changed;
                    }
                }
                Err(err) => {
                    warn!("Could not read collector tab while paging: {}", err);
                    return Advance::Unchanged;
                }
            }

            if Instant::now() >= deadline {
                debug!("Content unchanged after next click on page {}; extracting anyway", page);
                return Advance::Unchanged;
            }
            pause(self.timing.poll_interval).await;
        }
    }
}
