//! Durable key-value persistence for resumable crawl jobs
//!
//! A [`Persister`] stores opaque byte values under string keys and survives
//! process restarts. The dedup filter appends its fingerprint log through
//! this interface and [`crate::job_state::JobState`] snapshots the crawl's
//! free-form state through it; arbitrary crawl-scoped state can use the same
//! store with its own keys.
//!
//! Two backends are built in: [`DiskPersister`] maps keys to files under a
//! job directory, [`MemoryPersister`] keeps everything in process memory and
//! doubles as the test backend. Additional backends implement the trait.

// Sub-modules
pub mod disk;
pub mod errors;
pub mod memory;

// Re-exports for public API
pub use disk::DiskPersister;
pub use errors::{PersistError, PersistResult};
pub use memory::MemoryPersister;

/// Durable key→bytes store used by the resumable-crawl components.
///
/// Keys are opaque string identifiers, unique within a job, optionally
/// hierarchical with `/` separators. Callers from one cooperative scheduling
/// context invoke all operations; implementations do no internal locking.
pub trait Persister {
    /// Returns the stored bytes for `key`, or `fallback` if nothing is
    /// stored. Never creates storage.
    fn get(&self, key: &str, fallback: &[u8]) -> PersistResult<Vec<u8>>;

    /// Overwrites the entire value for `key`, creating any needed storage
    /// location. Idempotent.
    fn set(&mut self, key: &str, value: &[u8]) -> PersistResult<()>;

    /// Pure existence check. Keys that cannot map to a storage location
    /// answer `false`.
    fn exists(&self, key: &str) -> bool;

    /// Writes `value` at the current end of the data stored for `key`.
    ///
    /// The first call opens a durable append target and caches it; later
    /// calls for the same key reuse the cached target until
    /// [`close`](Persister::close). Existing content is never reset, and
    /// repeated calls accumulate in call order.
    fn append(&mut self, key: &str, value: &[u8]) -> PersistResult<()>;

    /// Deletes the stored value for `key`.
    ///
    /// Fails with [`PersistError::Missing`] when nothing is stored. After
    /// the delete, an emptied enclosing location may be cleaned up on a
    /// best-effort basis; cleanup failures are swallowed.
    fn remove(&mut self, key: &str) -> PersistResult<()>;

    /// Flushes and releases the cached append handle for `key`, if one
    /// exists. Safe to call when no handle is open. Does not delete data.
    fn close(&mut self, key: &str) -> PersistResult<()>;
}
