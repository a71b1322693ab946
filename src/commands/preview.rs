//! Preview command implementation.
//!
//! Fetches a single listing page and shows what the extractor reads
//! from it, without starting a collection run.

use crate::amazon::{MediaFilter, ProductSummary, ReviewExtractor, ReviewRecord, StarFilter};
use crate::browser::{Browser, BrowserTab, HttpBrowser, TimingProfile};
use crate::collector::Pager;
use crate::config::Config;
use crate::format::Formatter;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Shows the extracted reviews of one listing page.
pub struct PreviewCommand {
    config: Config,
}

impl PreviewCommand {
    /// Creates a new preview command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Fetches and formats one page of the review listing.
    pub async fn execute(&self, asin: &str, star: u8, page: u32) -> Result<String> {
        let browser = HttpBrowser::new(
            self.config.marketplace,
            self.config.proxy.as_deref(),
            PAGE_LOAD_TIMEOUT,
        )
        .context("Failed to create browser client")?;

        self.execute_with_browser(&browser, asin, star, page).await
    }

    /// Executes the preview with a provided browser (for testing).
    pub async fn execute_with_browser(
        &self,
        browser: &dyn Browser,
        asin: &str,
        star: u8,
        page: u32,
    ) -> Result<String> {
        // Validate ASIN format (10 alphanumeric characters)
        let asin = asin.trim().to_uppercase();
        if asin.len() != 10 || !asin.chars().all(|c| c.is_ascii_alphanumeric()) {
            anyhow::bail!(
                "Invalid ASIN format: '{}'. ASIN should be 10 alphanumeric characters.",
                asin
            );
        }

        let star = StarFilter::new(star)?;
        let media = if self.config.media_only {
            MediaFilter::MediaOnly
        } else {
            MediaFilter::All
        };

        let pager = Pager::new(
            self.config.marketplace.base_url(),
            asin.as_str(),
            media,
            TimingProfile::none(),
        );
        let url = pager.listing_url(star, page.max(1));

        info!("Previewing {} star page {} for {}", star, page.max(1), asin);

        let mut tab = browser.open_tab().await.context("Failed to open tab")?;
        let result = self.fetch_and_extract(tab.as_mut(), &url).await;
        if let Err(err) = tab.close().await {
            warn!("Failed to close preview tab: {}", err);
        }
        let (records, product) = result?;

        let formatter = Formatter::new(self.config.format);
        let mut out = String::new();
        if let Some(product) = product {
            if let Some(title) = &product.title {
                out.push_str(&format!("Product: {}\n", title));
            }
            if let Some(rating) = product.average_rating {
                out.push_str(&format!("Average: {:.1}/5\n", rating));
            }
            if !out.is_empty() {
                out.push('\n');
            }
        }
        out.push_str(&formatter.format_reviews(&records));
        Ok(out)
    }

    async fn fetch_and_extract(
        &self,
        tab: &mut dyn BrowserTab,
        url: &str,
    ) -> Result<(Vec<ReviewRecord>, Option<ProductSummary>)> {
        tab.navigate(url).await.context("Navigation failed")?;
        let html = tab.document().await.context("Could not read page")?;

        let extractor = ReviewExtractor::new(self.config.marketplace);
        let records = extractor.extract_page(&html)?;
        let product = extractor.product_summary(&html);
        Ok((records, product))
    }
}
