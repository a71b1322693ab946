//! Collection events and the best-effort sink that relays them.

use crate::amazon::models::{ProductSummary, ReviewRecord};
use serde::Serialize;
use tokio::sync::mpsc;

/// One progress report, fired at least once per page processed and once
/// per star completed.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressUpdate {
    pub star: u8,
    pub page: u32,
    pub pages_per_star: u32,
    pub total_reviews: usize,
    /// Percent complete, non-decreasing and below 100 until the run ends.
    pub progress: f64,
    pub message: String,
}

/// Events emitted by a collection run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CollectionEvent {
    Progress(ProgressUpdate),
    Completed {
        review_count: usize,
        reviews: Vec<ReviewRecord>,
        product: Option<ProductSummary>,
    },
    Stopped {
        review_count: usize,
        reviews: Vec<ReviewRecord>,
        product: Option<ProductSummary>,
    },
    Failed {
        error: String,
    },
}

impl CollectionEvent {
    /// Whether this event ends the run.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CollectionEvent::Progress(_))
    }
}

/// Best-effort relay of collection events to whoever asked for the run.
///
/// A listener that went away (dropped receiver, no receiver at all) is
/// expected and never affects the run.
#[derive(Clone)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<CollectionEvent>>,
}

impl EventSink {
    /// Sink wired to a listener.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CollectionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Sink that drops every event.
    pub fn disconnected() -> Self {
        Self { tx: None }
    }

    /// Emits an event, discarding any delivery failure.
    pub fn emit(&self, event: CollectionEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
