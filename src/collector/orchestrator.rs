//! The state machine driving one full collection run.
//!
//! Iterates star ratings and pages, invokes the pager and extractor,
//! filters duplicates through the ledger, applies the timing policy, and
//! reports progress. Page-level failures are absorbed; only a failure to
//! open the collector tab fails the run.

use crate::amazon::extract::ReviewExtractor;
use crate::amazon::models::{MediaFilter, ProductSummary, ReviewRecord, StarFilter};
use crate::amazon::Marketplace;
use crate::browser::tab::{Browser, BrowserTab};
use crate::browser::timing::{pause, SpeedMode, TimingProfile};
use crate::collector::ledger::SeenLedger;
use crate::collector::pager::{Advance, Pager};
use crate::collector::progress::{CollectionEvent, EventSink, ProgressUpdate};
use crate::collector::state::{RunStatus, StateCell};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Consecutive all-duplicate pages tolerated before concluding a star
/// has no further distinct content.
const DUPLICATE_PAGE_THRESHOLD: u32 = 3;

/// What happens to partially collected reviews when a run is stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopPolicy {
    /// Drop the partial set; a stopped run reports zero kept records.
    #[default]
    Discard,
    /// Keep the partial set for the caller to save or upload.
    Keep,
}

/// Everything one run needs, fixed at start.
#[derive(Debug, Clone)]
pub struct CollectPlan {
    pub asin: String,
    pub marketplace: Marketplace,
    /// Normally the marketplace base URL; overridable for tests.
    pub base_url: String,
    pub stars: Vec<StarFilter>,
    pub pages_per_star: u32,
    pub media: MediaFilter,
    pub speed: SpeedMode,
    pub timing: TimingProfile,
    pub stop_policy: StopPolicy,
}

impl CollectPlan {
    pub fn new(asin: impl Into<String>, marketplace: Marketplace) -> Self {
        let speed = SpeedMode::default();
        Self {
            asin: asin.into(),
            marketplace,
            base_url: marketplace.base_url(),
            stars: StarFilter::all(),
            pages_per_star: 10,
            media: MediaFilter::default(),
            speed,
            timing: speed.profile(),
            stop_policy: StopPolicy::default(),
        }
    }
}

/// What a finished run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub reviews: Vec<ReviewRecord>,
    pub product: Option<ProductSummary>,
    pub error: Option<String>,
}

/// What the page loops accumulated before the run wound down.
struct Harvest {
    reviews: Vec<ReviewRecord>,
    product: Option<ProductSummary>,
    stopped: bool,
}

/// One collection run over one dedicated tab.
pub struct Collector {
    plan: CollectPlan,
    state: StateCell,
    sink: EventSink,
    stop: Arc<AtomicBool>,
}

impl Collector {
    pub fn new(plan: CollectPlan, state: StateCell, sink: EventSink, stop: Arc<AtomicBool>) -> Self {
        Self {
            plan,
            state,
            sink,
            stop,
        }
    }

    /// Runs the collection to a terminal state.
    ///
    /// Never returns an error: every outcome is reported through the
    /// event sink, the state snapshot, and the returned [`RunOutcome`].
    /// The dedicated tab is closed on every exit path.
    pub async fn run(self, browser: &dyn Browser) -> RunOutcome {
        info!(
            "Starting review collection for {} ({} stars x {} pages)",
            self.plan.asin,
            self.plan.stars.len(),
            self.plan.pages_per_star
        );
        let plan = self.plan.clone();
        self.state.update(|state| {
            state.asin = plan.asin.clone();
            state.stars = plan.stars.clone();
            state.pages_per_star = plan.pages_per_star;
            state.media = plan.media;
            state.speed = plan.speed;
            state.status = RunStatus::Running;
            state.current_star = None;
            state.current_page = None;
            state.total_reviews = 0;
            state.percent = 0.0;
            state.collector_tab = None;
            state.error = None;
        });

        let mut tab = match browser.open_tab().await {
            Ok(tab) => tab,
            Err(err) => {
                let message = err.to_string();
                warn!("Could not open collector tab: {}", message);
                self.state.update(|state| {
                    state.status = RunStatus::Failed;
                    state.error = Some(message.clone());
                    state.collector_tab = None;
                });
                self.sink.emit(CollectionEvent::Failed {
                    error: message.clone(),
                });
                return RunOutcome {
                    status: RunStatus::Failed,
                    reviews: Vec::new(),
                    product: None,
                    error: Some(message),
                };
            }
        };

        let tab_id = tab.id();
        self.state.update(|state| state.collector_tab = Some(tab_id));

        let harvest = self.collect_pages(tab.as_mut()).await;

        // The tab is released on every path before the terminal event.
        if let Err(err) = tab.close().await {
            warn!("Failed to close collector tab {}: {}", tab_id, err);
        }
        self.state.update(|state| state.collector_tab = None);

        if harvest.stopped {
            let kept = match self.plan.stop_policy {
                StopPolicy::Keep => harvest.reviews,
                StopPolicy::Discard => {
                    debug!("Discarding {} partial reviews on stop", harvest.reviews.len());
                    Vec::new()
                }
            };
            info!("Collection stopped by request; keeping {} reviews", kept.len());
            self.state.update(|state| {
                state.status = RunStatus::Stopped;
                state.total_reviews = kept.len();
            });
            self.sink.emit(CollectionEvent::Stopped {
                review_count: kept.len(),
                reviews: kept.clone(),
                product: harvest.product.clone(),
            });
            RunOutcome {
                status: RunStatus::Stopped,
                reviews: kept,
                product: harvest.product,
                error: None,
            }
        } else {
            info!("Collection complete: {} reviews", harvest.reviews.len());
            self.state.update(|state| {
                state.status = RunStatus::Completed;
                state.total_reviews = harvest.reviews.len();
                state.percent = 100.0;
            });
            self.sink.emit(CollectionEvent::Completed {
                review_count: harvest.reviews.len(),
                reviews: harvest.reviews.clone(),
                product: harvest.product.clone(),
            });
            RunOutcome {
                status: RunStatus::Completed,
                reviews: harvest.reviews,
                product: harvest.product,
                error: None,
            }
        }
    }

    /// The star x page loops.
    async fn collect_pages(&self, tab: &mut dyn BrowserTab) -> Harvest {
        let extractor = ReviewExtractor::new(self.plan.marketplace);
        let pager = Pager::new(
            self.plan.base_url.clone(),
            self.plan.asin.clone(),
            self.plan.media,
            self.plan.timing.clone(),
        );
        let mut ledger = SeenLedger::new();
        let mut reviews: Vec<ReviewRecord> = Vec::new();
        let mut product: Option<ProductSummary> = None;
        let total_stars = self.plan.stars.len();

        for (star_index, &star) in self.plan.stars.iter().enumerate() {
            if self.stop_requested() {
                return Harvest {
                    reviews,
                    product,
                    stopped: true,
                };
            }

            info!(
                "Collecting {} star reviews ({}/{})",
                star.value(),
                star_index + 1,
                total_stars
            );
            self.state.update(|state| {
                state.current_star = Some(star.value());
                state.current_page = None;
            });

            let mut duplicate_streak: u32 = 0;
            let mut last_page: u32 = 0;

            'pages: for page in 1..=self.plan.pages_per_star {
                if self.stop_requested() {
                    return Harvest {
                        reviews,
                        product,
                        stopped: true,
                    };
                }
                self.state.update(|state| state.current_page = Some(page));

                let advance = pager.show_page(tab, star, page).await;
                if advance == Advance::NoMorePages {
                    debug!("No more pages for {} star", star.value());
                    break 'pages;
                }
                last_page = page;

                let html = match tab.document().await {
                    Ok(html) => html,
                    Err(err) => {
                        warn!("Could not read collector tab: {}", err);
                        String::new()
                    }
                };

                let extracted = match extractor.extract_page(&html) {
                    Ok(records) => records,
                    Err(err) => {
                        warn!("Extraction failed on {} star page {}: {}", star.value(), page, err);
                        Vec::new()
                    }
                };

                if product.is_none() {
                    product = extractor.product_summary(&html);
                }

                let page_total = extracted.len();
                let mut new_on_page = 0usize;
                for mut record in extracted {
                    // The star filter being collected is authoritative.
                    record.rating = star.value();
                    if ledger.record(&record.review_id) {
                        new_on_page += 1;
                        reviews.push(record);
                    }
                }
                debug!(
                    "{} star page {}: {} records, {} new, {} duplicate",
                    star.value(),
                    page,
                    page_total,
                    new_on_page,
                    page_total - new_on_page
                );

                let percent = page_percent(star_index, page, self.plan.pages_per_star, total_stars);
                self.report_progress(
                    star,
                    page,
                    reviews.len(),
                    percent,
                    format!(
                        "Collected {} reviews ({} star, page {})",
                        reviews.len(),
                        star.value(),
                        page
                    ),
                );

                // Early-stop: all-duplicate pages extend the streak, pages
                // with no records at all leave it untouched, any new record
                // resets it.
                if page_total > 0 && new_on_page == 0 {
                    duplicate_streak += 1;
                    if duplicate_streak >= DUPLICATE_PAGE_THRESHOLD {
                        info!(
                            "{} consecutive all-duplicate pages for {} star; no further distinct content",
                            duplicate_streak,
                            star.value()
                        );
                        break 'pages;
                    }
                } else if new_on_page > 0 {
                    duplicate_streak = 0;
                }

                if page < self.plan.pages_per_star {
                    pause(self.plan.timing.page_pause()).await;
                }
            }

            // The summary names the last page actually processed; a star
            // that ran out of pages early never claims the full count.
            let percent = star_percent(star_index, total_stars);
            self.report_progress(
                star,
                last_page.max(1),
                reviews.len(),
                percent,
                format!(
                    "Finished {} star reviews ({} total so far)",
                    star.value(),
                    reviews.len()
                ),
            );

            if self.stop_requested() {
                return Harvest {
                    reviews,
                    product,
                    stopped: true,
                };
            }
            if star_index + 1 < total_stars {
                pause(self.plan.timing.star_pause()).await;
            }
        }

        Harvest {
            reviews,
            product,
            stopped: false,
        }
    }

    fn report_progress(
        &self,
        star: StarFilter,
        page: u32,
        total_reviews: usize,
        percent: f64,
        message: String,
    ) {
        self.state.update(|state| {
            state.total_reviews = total_reviews;
            state.percent = percent;
        });
        self.sink.emit(CollectionEvent::Progress(ProgressUpdate {
            star: star.value(),
            page,
            pages_per_star: self.plan.pages_per_star,
            total_reviews,
            progress: percent,
            message,
        }));
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

/// Percent complete after processing a page. Capped below 100 so only
/// the terminal event can claim completion.
fn page_percent(star_index: usize, page: u32, pages_per_star: u32, total_stars: usize) -> f64 {
    if total_stars == 0 || pages_per_star == 0 {
        return 0.0;
    }
    let within_star = f64::from(page) / f64::from(pages_per_star);
    let overall = (star_index as f64 + within_star) / total_stars as f64 * 100.0;
    overall.min(99.0)
}

/// Percent complete after finishing a star outright.
fn star_percent(star_index: usize, total_stars: usize) -> f64 {
    if total_stars == 0 {
        return 0.0;
    }
    ((star_index as f64 + 1.0) / total_stars as f64 * 100.0).min(99.0)
}
