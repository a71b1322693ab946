//! Collection run machinery: orchestrator, pager, ledger, progress,
//! shared state, and the single-run supervisor.

pub mod ledger;
pub mod orchestrator;
pub mod pager;
pub mod progress;
pub mod state;
pub mod supervisor;

pub use ledger::SeenLedger;
pub use orchestrator::{CollectPlan, Collector, RunOutcome, StopPolicy};
pub use pager::{Advance, Pager};
pub use progress::{CollectionEvent, EventSink, ProgressUpdate};
pub use state::{CollectionState, RunStatus, StateCell};
pub use supervisor::{Supervisor, SupervisorError};
