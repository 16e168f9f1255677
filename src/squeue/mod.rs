//! Serializing scheduler queues
//!
//! A resumable job needs more than its dedup log: the backlog of requests
//! that were discovered but not yet dispatched must also survive a restart.
//! The disk queues here persist that backlog in the job directory as
//! length-delimited JSON frames; the memory queues carry the same interface
//! for non-resumable jobs.
//!
//! Queue items are any `Serialize + DeserializeOwned` type; the built-in
//! consumer type is [`crate::request::CrawlRequest`].

// Sub-modules
pub mod disk;
pub mod errors;
pub mod memory;

// Re-exports for public API
pub use disk::{FifoDiskQueue, LifoDiskQueue};
pub use errors::QueueError;
pub use memory::{FifoMemoryQueue, LifoMemoryQueue};

/// Common interface over the FIFO/LIFO, disk/memory queue variants.
pub trait PersistentQueue<T> {
    /// Enqueues `item`. Disk variants serialize and write it durably before
    /// returning.
    fn push(&mut self, item: T) -> Result<(), QueueError>;

    /// Dequeues the next item in the variant's order, `None` when empty.
    fn pop(&mut self) -> Result<Option<T>, QueueError>;

    /// Number of items currently queued.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Releases the queue. Disk variants write a resume marker when items
    /// remain and delete their files when empty.
    fn close(&mut self) -> Result<(), QueueError>;
}
