//! The comment-to-action pipeline.
//!
//! Takes the comments fetched each poll cycle through deduplication,
//! phrase extraction, action derivation, and rate-limited dispatch, under
//! the cycle lock. Everything here is built and consumed within a single
//! cycle; no state survives across cycles.

pub mod cycle;
pub mod dedup;
pub mod derive;
pub mod dispatch;
pub mod error;
pub mod lock;

pub use cycle::{CycleReport, CycleRunner};
pub use dedup::dedupe;
pub use derive::{ActionDeriver, CommentAction};
pub use dispatch::Dispatcher;
pub use error::CycleError;
pub use lock::{CycleLock, LockCode, ProcessLock};
