//! Batch orchestration: work items, their state machine, and the
//! sequential identify-then-enrich run over a batch.

pub mod item;
pub mod processor;
pub mod progress;
pub mod record;

pub use item::{ItemId, ItemStatus, TransitionError, WorkItem};
pub use processor::{BatchProcessor, BatchState, BatchSummary};
pub use progress::{BroadcastProgress, ItemEvent, NoopProgress, Progress, ProgressReporter};
pub use record::AnimeRecord;
