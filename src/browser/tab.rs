//! The page-scripting boundary between the collector and a browser.
//!
//! The orchestrator never talks to HTTP or a real browser directly; it
//! drives one [`BrowserTab`] obtained from a [`Browser`]. Tests swap in
//! scripted tabs serving canned page sequences.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Identifier of a tab handed out by a [`Browser`].
pub type TabId = u64;

/// Errors surfaced by tab operations.
#[derive(Debug, Error)]
pub enum TabError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] wreq::Error),

    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: wreq::Error,
    },

    #[error("page load timed out after {0:?}")]
    Timeout(Duration),

    #[error("rate limited by Amazon (503). Try a slower speed mode or a proxy")]
    RateLimited,

    #[error("request failed with status {0}")]
    Status(u16),

    #[error("tab is closed")]
    Closed,

    #[error("{0}")]
    Script(String),
}

/// Outcome of activating the "next page" control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The control was activated and a new document requested.
    Clicked,
    /// The control is rendered but disabled; this was the final page.
    Disabled,
    /// No pagination control exists in the current document.
    Missing,
}

/// A source of dedicated collector tabs.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Opens a fresh tab for one collection run.
    async fn open_tab(&self) -> Result<Box<dyn BrowserTab>, TabError>;
}

/// One controlled tab: holds a current document and moves between pages.
#[async_trait]
pub trait BrowserTab: Send {
    /// Stable identifier for this tab.
    fn id(&self) -> TabId;

    /// Loads the given absolute URL into the tab.
    async fn navigate(&mut self, url: &str) -> Result<(), TabError>;

    /// Scrolls to the bottom of the page to trigger lazy-loaded content.
    async fn scroll_to_bottom(&mut self) -> Result<(), TabError>;

    /// Activates the "next page" control of the current document.
    async fn click_next(&mut self) -> Result<ClickOutcome, TabError>;

    /// Returns the currently rendered document.
    async fn document(&self) -> Result<String, TabError>;

    /// Releases the tab. Further calls fail with [`TabError::Closed`].
    async fn close(&mut self) -> Result<(), TabError>;
}
