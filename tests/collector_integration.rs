//! End-to-end collection runs driven against a scripted browser.
//!
//! The scripted tab serves canned listing pages keyed by star filter and
//! page number, advancing through its script on next-page clicks exactly
//! the way a real tab moves through a listing.

use amz_reviews::amazon::models::StarFilter;
use amz_reviews::amazon::Marketplace;
use amz_reviews::browser::tab::{Browser, BrowserTab, ClickOutcome, TabError, TabId};
use amz_reviews::browser::TimingProfile;
use amz_reviews::collector::{
    CollectPlan, CollectionEvent, Collector, EventSink, RunStatus, StateCell, StopPolicy,
    Supervisor,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Pages served by the scripted browser, keyed by (star, page).
type PageScript = HashMap<(u8, u32), String>;

struct ScriptedBrowser {
    pages: Arc<PageScript>,
    closed: Arc<AtomicUsize>,
    clicks: Arc<AtomicUsize>,
    /// When set, navigating to this star's listing raises the flag.
    stop_on_star: Option<(u8, Arc<AtomicBool>)>,
}

impl ScriptedBrowser {
    fn new(pages: PageScript) -> Self {
        Self {
            pages: Arc::new(pages),
            closed: Arc::new(AtomicUsize::new(0)),
            clicks: Arc::new(AtomicUsize::new(0)),
            stop_on_star: None,
        }
    }

    fn stop_on_star(mut self, star: u8, flag: Arc<AtomicBool>) -> Self {
        self.stop_on_star = Some((star, flag));
        self
    }
}

#[async_trait]
impl Browser for ScriptedBrowser {
    async fn open_tab(&self) -> Result<Box<dyn BrowserTab>, TabError> {
        Ok(Box::new(ScriptedTab {
            pages: self.pages.clone(),
            position: None,
            closed: self.closed.clone(),
            clicks: self.clicks.clone(),
            stop_on_star: self.stop_on_star.clone(),
        }))
    }
}

struct ScriptedTab {
    pages: Arc<PageScript>,
    position: Option<(u8, u32)>,
    closed: Arc<AtomicUsize>,
    clicks: Arc<AtomicUsize>,
    stop_on_star: Option<(u8, Arc<AtomicBool>)>,
}

#[async_trait]
impl BrowserTab for ScriptedTab {
    fn id(&self) -> TabId {
        42
    }

    async fn navigate(&mut self, url: &str) -> Result<(), TabError> {
        let star = query_param(url, "filterByStar")
            .map(|token| star_from_token(&token))
            .unwrap_or(0);
        let page = query_param(url, "pageNumber")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(1);
        if let Some((trip_star, flag)) = &self.stop_on_star {
            if star == *trip_star {
                flag.store(true, Ordering::SeqCst);
            }
        }
        self.position = Some((star, page));
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), TabError> {
        Ok(())
    }

    async fn click_next(&mut self) -> Result<ClickOutcome, TabError> {
        self.clicks.fetch_add(1, Ordering::SeqCst);
        let Some((star, page)) = self.position else {
            return Ok(ClickOutcome::Missing);
        };
        if self.pages.contains_key(&(star, page + 1)) {
            self.position = Some((star, page + 1));
            Ok(ClickOutcome::Clicked)
        } else {
            Ok(ClickOutcome::Disabled)
        }
    }

    async fn document(&self) -> Result<String, TabError> {
        let html = self
            .position
            .and_then(|position| self.pages.get(&position).cloned())
            .unwrap_or_else(|| "<html><body></body></html>".to_string());
        Ok(html)
    }

    async fn close(&mut self) -> Result<(), TabError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn query_param(url: &str, key: &str) -> Option<String> {
    url.split(['?', '&'])
        .find_map(|pair| pair.strip_prefix(&format!("{key}=")).map(String::from))
}

fn star_from_token(token: &str) -> u8 {
    match token {
        "one_star" => 1,
        "two_star" => 2,
        "three_star" => 3,
        "four_star" => 4,
        "five_star" => 5,
        _ => 0,
    }
}

/// A listing page holding one review node per id.
fn listing(ids: &[&str]) -> String {
    let nodes: Vec<String> = ids
        .iter()
        .map(|id| {
            format!(
                r#"<div data-hook="review" id="customer_review-{id}">
                    <span class="a-profile-name">Reviewer {id}</span>
                    <span data-hook="review-body"><span>Thoughts from {id}.</span></span>
                </div>"#
            )
        })
        .collect();
    format!(
        r#"<html><body><div id="cm_cr-review_list">{}</div></body></html>"#,
        nodes.join("\n")
    )
}

/// A listing page with a product header in front of the review nodes.
fn listing_with_product(ids: &[&str]) -> String {
    let reviews = listing(ids);
    reviews.replace(
        "<div id=\"cm_cr-review_list\">",
        r#"<div class="product-title"><a data-hook="product-link" href="/dp/B0TEST1234">Trail Camera 4K</a></div>
           <div id="cm_cr-review_list">"#,
    )
}

fn empty_listing() -> String {
    r#"<html><body><div id="cm_cr-review_list"></div></body></html>"#.to_string()
}

fn plan(stars: &[u8], pages_per_star: u32) -> CollectPlan {
    let mut plan = CollectPlan::new("B0TEST1234", Marketplace::Us);
    plan.stars = stars
        .iter()
        .map(|&star| StarFilter::new(star).unwrap())
        .collect();
    plan.pages_per_star = pages_per_star;
    plan.timing = TimingProfile::none();
    plan
}

async fn drain(mut events: UnboundedReceiver<CollectionEvent>) -> Vec<CollectionEvent> {
    let mut seen = Vec::new();
    while let Some(event) = events.recv().await {
        seen.push(event);
    }
    seen
}

#[tokio::test]
async fn test_collects_unique_reviews_across_pages() {
    let mut pages = PageScript::new();
    pages.insert((5, 1), listing_with_product(&["R1ALPHA01", "R2BRAVO02"]));
    // Page 2 re-serves one review from page 1.
    pages.insert((5, 2), listing(&["R2BRAVO02", "R3CHARLIE3"]));
    pages.insert((5, 3), listing(&["R4DELTA04"]));

    let browser = ScriptedBrowser::new(pages);
    let closed = browser.closed.clone();

    let supervisor = Supervisor::new();
    let events = supervisor.start(plan(&[5], 3), Arc::new(browser)).unwrap();
    let seen = drain(events).await;

    match seen.last() {
        Some(CollectionEvent::Completed {
            review_count,
            reviews,
            product,
        }) => {
            assert_eq!(*review_count, 4);
            let ids: Vec<&str> = reviews.iter().map(|r| r.review_id.as_str()).collect();
            assert_eq!(ids, ["R1ALPHA01", "R2BRAVO02", "R3CHARLIE3", "R4DELTA04"]);
            assert!(reviews.iter().all(|r| r.rating == 5));
            assert_eq!(
                product.as_ref().and_then(|p| p.title.as_deref()),
                Some("Trail Camera 4K")
            );
        }
        other => panic!("expected a completed run, got {:?}", other),
    }

    // The dedicated tab was released exactly once.
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rating_follows_the_star_filter_being_collected() {
    let mut pages = PageScript::new();
    // The same review id shows up under both star filters.
    pages.insert((5, 1), listing(&["RXSHARED01", "RYFIVE0001"]));
    pages.insert((2, 1), listing(&["RXSHARED01", "RZTWO00001"]));

    let browser = ScriptedBrowser::new(pages);
    let supervisor = Supervisor::new();
    let events = supervisor
        .start(plan(&[5, 2], 1), Arc::new(browser))
        .unwrap();
    let seen = drain(events).await;

    match seen.last() {
        Some(CollectionEvent::Completed { reviews, .. }) => {
            assert_eq!(reviews.len(), 3);
            // First sighting wins; the repeat under the 2 star filter is dropped.
            assert_eq!(reviews[0].review_id, "RXSHARED01");
            assert_eq!(reviews[0].rating, 5);
            assert_eq!(reviews[1].rating, 5);
            assert_eq!(reviews[2].review_id, "RZTWO00001");
            assert_eq!(reviews[2].rating, 2);
        }
        other => panic!("expected a completed run, got {:?}", other),
    }
}

#[tokio::test]
async fn test_early_stop_after_consecutive_duplicate_pages() {
    let third = listing(&["R5ECHO0005", "R6FOXTROT6"]);
    let mut pages = PageScript::new();
    pages.insert((5, 1), listing(&["R1ALPHA01", "R2BRAVO02"]));
    pages.insert((5, 2), listing(&["R3CHARLIE3", "R4DELTA04"]));
    pages.insert((5, 3), third.clone());
    // From page 4 on the listing only re-serves page 3's content.
    for page in 4..=10 {
        pages.insert((5, page), third.clone());
    }

    let browser = ScriptedBrowser::new(pages);
    let clicks = browser.clicks.clone();

    let supervisor = Supervisor::new();
    let events = supervisor.start(plan(&[5], 10), Arc::new(browser)).unwrap();
    let seen = drain(events).await;

    match seen.last() {
        Some(CollectionEvent::Completed { review_count, .. }) => {
            assert_eq!(*review_count, 6);
        }
        other => panic!("expected a completed run, got {:?}", other),
    }

    // Pages 4, 5 and 6 were all duplicates; the star ended after page 6
    // instead of grinding through the remaining four pages.
    assert_eq!(clicks.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_round_trip_duplicates_collapse_to_one_set() {
    let ids: Vec<String> = (1..=10).map(|i| format!("RQ{:08}", i)).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let first = listing(&id_refs);

    let mut pages = PageScript::new();
    for page in 1..=5 {
        // Every page after the first re-serves the same ten reviews.
        pages.insert((5, page), first.clone());
    }

    let browser = ScriptedBrowser::new(pages);
    let clicks = browser.clicks.clone();

    let supervisor = Supervisor::new();
    let events = supervisor.start(plan(&[5], 5), Arc::new(browser)).unwrap();
    let seen = drain(events).await;

    match seen.last() {
        Some(CollectionEvent::Completed {
            review_count,
            reviews,
            ..
        }) => {
            assert_eq!(*review_count, 10);
            assert!(reviews.iter().all(|r| r.rating == 5));
        }
        other => panic!("expected a completed run, got {:?}", other),
    }

    // The duplicate threshold ended the star after page 4; page 5 was
    // never requested.
    assert_eq!(clicks.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_empty_pages_leave_the_duplicate_streak_untouched() {
    let first = listing(&["R1ALPHA01", "R2BRAVO02"]);
    let mut pages = PageScript::new();
    pages.insert((5, 1), first.clone());
    pages.insert((5, 2), first.clone());
    pages.insert((5, 3), empty_listing());
    pages.insert((5, 4), first.clone());
    pages.insert((5, 5), first.clone());
    // Only reachable if the empty page wrongly reset the streak.
    pages.insert((5, 6), listing(&["R6FOXTROT6"]));

    let browser = ScriptedBrowser::new(pages);
    let clicks = browser.clicks.clone();

    let supervisor = Supervisor::new();
    let events = supervisor.start(plan(&[5], 10), Arc::new(browser)).unwrap();
    let seen = drain(events).await;

    match seen.last() {
        Some(CollectionEvent::Completed {
            review_count,
            reviews,
            ..
        }) => {
            assert_eq!(*review_count, 2);
            assert!(reviews.iter().all(|r| r.review_id != "R6FOXTROT6"));
        }
        other => panic!("expected a completed run, got {:?}", other),
    }

    // Duplicate pages 2, 4 and 5 ended the star; the empty page 3 neither
    // extended nor reset the streak.
    assert_eq!(clicks.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_progress_is_monotonic_and_capped_below_hundred() {
    let mut pages = PageScript::new();
    pages.insert((5, 1), listing(&["R1ALPHA01"]));
    pages.insert((5, 2), listing(&["R2BRAVO02"]));
    pages.insert((4, 1), listing(&["R3CHARLIE3"]));
    pages.insert((4, 2), listing(&["R4DELTA04"]));

    let browser = ScriptedBrowser::new(pages);
    let supervisor = Supervisor::new();
    let events = supervisor
        .start(plan(&[5, 4], 2), Arc::new(browser))
        .unwrap();
    let seen = drain(events).await;

    let progress: Vec<f64> = seen
        .iter()
        .filter_map(|event| match event {
            CollectionEvent::Progress(update) => Some(update.progress),
            _ => None,
        })
        .collect();

    // One report per page plus one per finished star.
    assert_eq!(progress.len(), 6);
    for pair in progress.windows(2) {
        assert!(pair[1] >= pair[0], "{} fell below {}", pair[1], pair[0]);
    }
    assert!(progress.iter().all(|&percent| percent < 100.0));

    assert!(matches!(
        seen.last(),
        Some(CollectionEvent::Completed { review_count: 4, .. })
    ));

    // Only the finished run claims the full hundred, and the dedicated
    // tab id is cleared from the snapshot.
    let state = supervisor.state();
    assert_eq!(state.status, RunStatus::Completed);
    assert_eq!(state.percent, 100.0);
    assert_eq!(state.total_reviews, 4);
    assert!(state.collector_tab.is_none());
}

#[tokio::test]
async fn test_star_summary_reports_last_page_processed() {
    // The listing runs out after page 2 of a planned 10.
    let mut pages = PageScript::new();
    pages.insert((5, 1), listing(&["R1ALPHA01"]));
    pages.insert((5, 2), listing(&["R2BRAVO02"]));

    let browser = ScriptedBrowser::new(pages);
    let supervisor = Supervisor::new();
    let events = supervisor.start(plan(&[5], 10), Arc::new(browser)).unwrap();
    let seen = drain(events).await;

    let updates: Vec<_> = seen
        .iter()
        .filter_map(|event| match event {
            CollectionEvent::Progress(update) => Some(update),
            _ => None,
        })
        .collect();

    // Two page reports plus the star summary.
    assert_eq!(updates.len(), 3);
    let summary = updates.last().unwrap();
    assert!(summary.message.contains("Finished 5 star"));
    // The summary names page 2, where the star actually ended, not the
    // planned ten pages.
    assert_eq!(summary.page, 2);
}

#[tokio::test]
async fn test_stop_with_keep_policy_retains_partial_reviews() {
    let mut pages = PageScript::new();
    pages.insert((5, 1), listing(&["R1ALPHA01"]));
    pages.insert((4, 1), listing(&["R2BRAVO02"]));

    let flag = Arc::new(AtomicBool::new(false));
    let browser = ScriptedBrowser::new(pages).stop_on_star(4, flag.clone());
    let closed = browser.closed.clone();

    let mut plan = plan(&[5, 4], 1);
    plan.stop_policy = StopPolicy::Keep;

    let (sink, mut events) = EventSink::channel();
    let collector = Collector::new(plan, StateCell::default(), sink, flag);
    let outcome = collector.run(&browser).await;

    assert_eq!(outcome.status, RunStatus::Stopped);
    assert_eq!(outcome.reviews.len(), 2);
    assert_eq!(outcome.reviews[0].rating, 5);
    assert_eq!(outcome.reviews[1].rating, 4);
    assert_eq!(closed.load(Ordering::SeqCst), 1);

    let mut terminal = None;
    while let Ok(event) = events.try_recv() {
        terminal = Some(event);
    }
    assert!(matches!(
        terminal,
        Some(CollectionEvent::Stopped { review_count: 2, .. })
    ));
}

#[tokio::test]
async fn test_stop_with_discard_policy_drops_partial_reviews() {
    let mut pages = PageScript::new();
    pages.insert((5, 1), listing(&["R1ALPHA01"]));
    pages.insert((4, 1), listing(&["R2BRAVO02"]));

    let flag = Arc::new(AtomicBool::new(false));
    let browser = ScriptedBrowser::new(pages).stop_on_star(4, flag.clone());
    let closed = browser.closed.clone();

    let mut plan = plan(&[5, 4], 1);
    plan.stop_policy = StopPolicy::Discard;

    let (sink, mut events) = EventSink::channel();
    let collector = Collector::new(plan, StateCell::default(), sink, flag);
    let outcome = collector.run(&browser).await;

    assert_eq!(outcome.status, RunStatus::Stopped);
    assert!(outcome.reviews.is_empty());
    assert_eq!(closed.load(Ordering::SeqCst), 1);

    let mut terminal = None;
    while let Ok(event) = events.try_recv() {
        terminal = Some(event);
    }
    assert!(matches!(
        terminal,
        Some(CollectionEvent::Stopped { review_count: 0, .. })
    ));
}
