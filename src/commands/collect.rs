//! Collect command implementation.

use crate::amazon::{MediaFilter, ReviewBatch, StarFilter};
use crate::browser::{Browser, HttpBrowser};
use crate::collector::{CollectPlan, CollectionEvent, StopPolicy, Supervisor};
use crate::config::Config;
use crate::filters::FilterChainBuilder;
use crate::format::{progress_line, Formatter};
use crate::upload::UploadClient;
use anyhow::{anyhow, bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs a full review collection for one product.
pub struct CollectCommand {
    config: Config,
}

impl CollectCommand {
    /// Creates a new collect command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Executes the collection and returns formatted output.
    pub async fn execute(
        &self,
        asin: &str,
        output: Option<&Path>,
        upload: bool,
    ) -> Result<String> {
        let browser = HttpBrowser::new(
            self.config.marketplace,
            self.config.proxy.as_deref(),
            PAGE_LOAD_TIMEOUT,
        )
        .context("Failed to create browser client")?;

        self.execute_with_browser(Arc::new(browser), asin, output, upload).await
    }

    /// Executes the collection with a provided browser (for testing).
    pub async fn execute_with_browser(
        &self,
        browser: Arc<dyn Browser>,
        asin: &str,
        output: Option<&Path>,
        upload: bool,
    ) -> Result<String> {
        // Validate ASIN format (10 alphanumeric characters)
        let asin = asin.trim().to_uppercase();
        if asin.len() != 10 || !asin.chars().all(|c| c.is_ascii_alphanumeric()) {
            bail!(
                "Invalid ASIN format: '{}'. ASIN should be 10 alphanumeric characters.",
                asin
            );
        }

        let plan = self.build_plan(&asin)?;
        let supervisor = Arc::new(Supervisor::new());

        let mut events = supervisor
            .start(plan, browser)
            .map_err(|e| anyhow!("Could not start collection: {}", e))?;

        // Ctrl-C requests a stop; the run winds down and reports Stopped.
        let stopper = supervisor.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stopper.stop();
            }
        });

        let mut harvest = None;
        while let Some(event) = events.recv().await {
            match event {
                CollectionEvent::Progress(update) => {
                    // Progress goes to stderr; stdout carries the result.
                    eprintln!("{}", progress_line(&update));
                }
                CollectionEvent::Completed { reviews, product, .. } => {
                    harvest = Some((reviews, product, false));
                }
                CollectionEvent::Stopped { review_count, reviews, product } => {
                    info!("Run stopped with {} reviews kept", review_count);
                    harvest = Some((reviews, product, true));
                }
                CollectionEvent::Failed { error } => {
                    bail!("Collection failed: {}", error);
                }
            }
        }

        let (reviews, product, stopped) =
            harvest.ok_or_else(|| anyhow!("Collection ended without a result"))?;

        // Post-collection filters. The media knob already narrowed the
        // listing via the URL token; the chain drops any strays.
        let filters = FilterChainBuilder::new()
            .verified_only(self.config.verified_only)
            .with_media_only(self.config.media_only)
            .min_votes(self.config.min_votes)
            .keywords(self.config.keywords.clone())
            .exclude_keywords(self.config.exclude_keywords.clone())
            .build();

        if !filters.is_empty() {
            debug!("Active filters: {}", filters.descriptions().join(", "));
        }

        let collected = reviews.len();
        let filtered = filters.apply(reviews);
        if filtered.len() < collected {
            info!("{} of {} reviews passed the filters", filtered.len(), collected);
        }

        let batch = ReviewBatch::new(
            &asin,
            self.config.marketplace.code(),
            product,
            filtered,
        );

        if let Some(path) = output {
            let json = serde_json::to_string_pretty(&batch)
                .context("Failed to encode batch")?;
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Saved {} reviews to {}", batch.count(), path.display());
        }

        if upload {
            let endpoint = self.config.endpoint.as_deref().ok_or_else(|| {
                anyhow!("No ingest endpoint configured. Set `endpoint` in config or AMZ_ENDPOINT.")
            })?;
            if batch.reviews.is_empty() {
                warn!("Nothing to upload; the batch is empty");
            } else {
                let client = UploadClient::new(endpoint, self.config.token.clone())
                    .context("Failed to create upload client")?;
                let receipt = client.upload(&batch).await.context("Upload failed")?;
                match receipt.report_id {
                    Some(id) => info!("Upload accepted (report {})", id),
                    None => info!("Upload accepted"),
                }
            }
        }

        let formatter = Formatter::new(self.config.format);
        let mut out = formatter.format_batch(&batch);
        if stopped {
            out.push_str("\n\n(Run stopped before completion.)");
        }
        Ok(out)
    }

    fn build_plan(&self, asin: &str) -> Result<CollectPlan> {
        let mut plan = CollectPlan::new(asin, self.config.marketplace);

        if !self.config.stars.is_empty() {
            let mut stars = Vec::new();
            for &value in &self.config.stars {
                stars.push(StarFilter::new(value)?);
            }
            plan.stars = stars;
        }

        plan.pages_per_star = self.config.pages_per_star.max(1);
        plan.media = if self.config.media_only {
            MediaFilter::MediaOnly
        } else {
            MediaFilter::All
        };
        plan.speed = self.config.speed;
        plan.timing = self.config.speed.profile();
        plan.stop_policy = if self.config.keep_partial {
            StopPolicy::Keep
        } else {
            StopPolicy::Discard
        };

        Ok(plan)
    }
}
