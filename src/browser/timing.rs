//! Timing profiles that pace a run like a human reader.

use rand::RngExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

/// Named pacing selection, trading speed against detection risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedMode {
    /// Quicker pacing for attended runs.
    Fast,
    /// Conservative pacing, the default.
    #[default]
    Stable,
}

impl SpeedMode {
    /// The timing profile this mode selects.
    pub fn profile(&self) -> TimingProfile {
        match self {
            SpeedMode::Fast => TimingProfile::fast(),
            SpeedMode::Stable => TimingProfile::stable(),
        }
    }
}

impl fmt::Display for SpeedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeedMode::Fast => write!(f, "fast"),
            SpeedMode::Stable => write!(f, "stable"),
        }
    }
}

impl FromStr for SpeedMode {
    type Err = SpeedModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(SpeedMode::Fast),
            "stable" => Ok(SpeedMode::Stable),
            _ => Err(SpeedModeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpeedModeParseError(String);

impl fmt::Display for SpeedModeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown speed mode '{}'. Valid modes: fast, stable", self.0)
    }
}

impl std::error::Error for SpeedModeParseError {}

/// Delay constants for one collection run. Selected once at start and
/// immutable for the run's duration.
#[derive(Debug, Clone)]
pub struct TimingProfile {
    /// Wait after the first-page navigation before reading the document.
    pub first_page_wait: Duration,
    /// Wait after the lazy-load scroll.
    pub scroll_wait: Duration,
    /// Upper bound on waiting for content to change after a next click.
    pub next_page_wait: Duration,
    /// Interval between content-fingerprint polls.
    pub poll_interval: Duration,
    /// Extra settle time once the fingerprint has changed.
    pub settle_grace: Duration,
    /// Inter-page pause band, milliseconds.
    pub page_delay_ms: RangeInclusive<u64>,
    /// Inter-star pause band, milliseconds.
    pub star_delay_ms: RangeInclusive<u64>,
    /// Hard cap on a single page load.
    pub page_load_timeout: Duration,
}

impl TimingProfile {
    /// Conservative pacing. The default for unattended runs.
    pub fn stable() -> Self {
        Self {
            first_page_wait: Duration::from_millis(2000),
            scroll_wait: Duration::from_millis(800),
            next_page_wait: Duration::from_secs(8),
            poll_interval: Duration::from_millis(300),
            settle_grace: Duration::from_millis(600),
            page_delay_ms: 1500..=3500,
            star_delay_ms: 2500..=6000,
            page_load_timeout: Duration::from_secs(30),
        }
    }

    /// Quicker pacing for attended runs where a block is easy to notice.
    pub fn fast() -> Self {
        Self {
            first_page_wait: Duration::from_millis(800),
            scroll_wait: Duration::from_millis(300),
            next_page_wait: Duration::from_secs(5),
            poll_interval: Duration::from_millis(200),
            settle_grace: Duration::from_millis(250),
            page_delay_ms: 600..=1500,
            star_delay_ms: 1000..=2500,
            page_load_timeout: Duration::from_secs(20),
        }
    }

    /// Zero-valued profile so tests never sleep.
    pub fn none() -> Self {
        Self {
            first_page_wait: Duration::ZERO,
            scroll_wait: Duration::ZERO,
            next_page_wait: Duration::ZERO,
            poll_interval: Duration::ZERO,
            settle_grace: Duration::ZERO,
            page_delay_ms: 0..=0,
            star_delay_ms: 0..=0,
            page_load_timeout: Duration::from_secs(5),
        }
    }

    /// Draws a randomized pause from the inter-page band.
    pub fn page_pause(&self) -> Duration {
        draw(&self.page_delay_ms)
    }

    /// Draws a randomized pause from the inter-star band.
    pub fn star_pause(&self) -> Duration {
        draw(&self.star_delay_ms)
    }
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self::stable()
    }
}

fn draw(band: &RangeInclusive<u64>) -> Duration {
    if *band.end() == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(band.clone()))
}

/// Sleeps for the given duration, skipping zero waits entirely.
pub(crate) async fn pause(duration: Duration) {
    if duration.is_zero() {
        return;
    }
    tokio::time::sleep(duration).await;
}
