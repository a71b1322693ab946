//! Shared snapshot of the active collection run.

use crate::amazon::models::{MediaFilter, StarFilter};
use crate::browser::tab::TabId;
use crate::browser::timing::SpeedMode;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lifecycle of a collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Idle,
    Running,
    Completed,
    Stopped,
    Failed,
}

impl RunStatus {
    /// Whether a run currently owns the collector tab.
    pub fn is_collecting(&self) -> bool {
        matches!(self, RunStatus::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Stopped | RunStatus::Failed
        )
    }
}

/// Scalar snapshot of the run, cheap to copy out to any caller.
///
/// The accumulated reviews and the seen-id set live inside the running
/// orchestrator; they arrive via the terminal event, not through here.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionState {
    pub asin: String,
    pub stars: Vec<StarFilter>,
    pub pages_per_star: u32,
    pub media: MediaFilter,
    pub speed: SpeedMode,
    pub status: RunStatus,
    pub current_star: Option<u8>,
    pub current_page: Option<u32>,
    pub total_reviews: usize,
    pub percent: f64,
    pub collector_tab: Option<TabId>,
    pub error: Option<String>,
}

impl CollectionState {
    /// The state before any run has been accepted.
    pub fn idle() -> Self {
        Self {
            asin: String::new(),
            stars: Vec::new(),
            pages_per_star: 0,
            media: MediaFilter::default(),
            speed: SpeedMode::default(),
            status: RunStatus::Idle,
            current_star: None,
            current_page: None,
            total_reviews: 0,
            percent: 0.0,
            collector_tab: None,
            error: None,
        }
    }

    pub fn is_collecting(&self) -> bool {
        self.status.is_collecting()
    }
}

impl Default for CollectionState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Handle to the snapshot shared between the supervisor, the running
/// orchestrator, and state queries. The lock is held only long enough
/// to read or write the snapshot, never across an await.
#[derive(Clone, Default)]
pub struct StateCell {
    inner: Arc<Mutex<CollectionState>>,
}

impl StateCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current snapshot.
    pub fn snapshot(&self) -> CollectionState {
        self.lock().clone()
    }

    /// Applies a mutation to the snapshot.
    pub fn update(&self, mutate: impl FnOnce(&mut CollectionState)) {
        mutate(&mut self.lock());
    }

    fn lock(&self) -> MutexGuard<'_, CollectionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
