/*!
 * Batch synonym synchronization engine.
 *
 * - `models`: Items, outcomes, stats and run reports
 * - `merge`: Merge policies folding a translation into a synonym set
 * - `scheduler`: Rate-limited batch scheduling with cancellation
 * - `session`: Session ids and guarded stats commits
 * - `driver`: The run state machine and the `SyncEngine` entry point
 */

// Re-export main types for easier usage
pub use self::driver::{RunHandle, SyncEngine, SyncOptions};
pub use self::merge::{MergeEngine, MergeResult, merge};
pub use self::scheduler::{BatchScheduler, SchedulerConfig};
pub use self::session::SessionController;

// Re-export model types
pub use self::models::{
    Item, ItemFilter, ItemId, ItemReport, Outcome, Policy, RecordId, RecordRef, RunReport, RunState,
    SessionId, Stats,
};

// Submodules
pub mod driver;
pub mod merge;
pub mod models;
pub mod scheduler;
pub mod session;
