//! Single-run gate in front of the orchestrator.
//!
//! Owns the shared state snapshot and the stop flag of the active run.
//! A second start request while a run is active is rejected outright,
//! never queued: the dedicated tab and the run state admit one owner.

use crate::browser::tab::Browser;
use crate::collector::orchestrator::{CollectPlan, Collector};
use crate::collector::progress::{CollectionEvent, EventSink};
use crate::collector::state::{CollectionState, StateCell};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("a collection run is already active")]
    AlreadyRunning,
}

/// Accepts collection requests one at a time.
#[derive(Default)]
pub struct Supervisor {
    state: StateCell,
    /// Stop flag of the active run; `None` when idle.
    active: Arc<Mutex<Option<Arc<AtomicBool>>>>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a run if none is active and spawns it. Responds with the
    /// event stream immediately, not with completion.
    pub fn start(
        &self,
        plan: CollectPlan,
        browser: Arc<dyn Browser>,
    ) -> Result<UnboundedReceiver<CollectionEvent>, SupervisorError> {
        let stop = Arc::new(AtomicBool::new(false));
        {
            let mut active = lock(&self.active);
            if active.is_some() {
                return Err(SupervisorError::AlreadyRunning);
            }
            *active = Some(stop.clone());
        }

        info!("Accepted collection request for {}", plan.asin);
        let (sink, events) = EventSink::channel();
        let collector = Collector::new(plan, self.state.clone(), sink, stop);
        let slot = self.active.clone();
        tokio::spawn(async move {
            let outcome = collector.run(browser.as_ref()).await;
            debug!("Collection run ended: {:?}", outcome.status);
            *lock(&slot) = None;
        });

        Ok(events)
    }

    /// Requests cancellation of the active run. Returns whether a run
    /// was active to receive the request.
    pub fn stop(&self) -> bool {
        match &*lock(&self.active) {
            Some(flag) => {
                info!("Stop requested for active collection run");
                flag.store(true, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the current run state.
    pub fn state(&self) -> CollectionState {
        self.state.snapshot()
    }

    /// Whether a run is currently active.
    pub fn is_active(&self) -> bool {
        lock(&self.active).is_some()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
