//! Redis Streams job queue.
//!
//! Provides job enqueueing, consumer-group based consumption with
//! retry/DLQ, and crash recovery via pending-entry claiming. Job status is
//! read directly from the Metadata Store rather than cached here.

pub mod error;
pub mod job;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::QueueJob;
pub use queue::{JobQueue, QueueConfig};
