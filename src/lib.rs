//! Resumable crawl-state durability.
//!
//! Point a [`JobConfig`] at a stable job directory and a crawl can be
//! stopped and resumed: the dedup filter remembers every fingerprint it has
//! processed, the job state snapshot survives restarts, and the scheduler
//! queues carry the pending request backlog across runs. Without a job
//! directory the same components run in-memory only.

pub mod config;
pub mod dedup;
pub mod job_state;
pub mod persist;
pub mod request;
pub mod squeue;
pub mod stats;

pub use config::JobConfig;
pub use dedup::{
    DedupFilter, FILTERED_COUNTER, RequestFingerprinter, SEEN_LOG_KEY, Xxh3Fingerprinter,
};
pub use job_state::{JobState, JobStateError, STATE_KEY, StateMap};
pub use persist::{DiskPersister, MemoryPersister, PersistError, PersistResult, Persister};
pub use request::CrawlRequest;
pub use squeue::{
    FifoDiskQueue, FifoMemoryQueue, LifoDiskQueue, LifoMemoryQueue, PersistentQueue, QueueError,
};
pub use stats::{MemoryStats, StatsSink};
