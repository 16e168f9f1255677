//! Job configuration for resumable crawls
//!
//! One explicit struct decides whether a job is resumable: a configured job
//! directory turns on disk-backed dedup, state snapshots and queue
//! locations; without one every component degrades to in-memory-only
//! behavior, which is a valid (just non-resumable) configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::persist::{DiskPersister, PersistResult, Persister};

/// Directory under the job directory that holds the scheduler queue.
const QUEUE_DIR: &str = "requests.queue";

/// Configuration for one crawl job's durability layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobConfig {
    /// Stable directory the job persists into; `None` disables durability.
    jobdir: Option<PathBuf>,
    /// Log every suppressed duplicate instead of only the first.
    dedup_debug: bool,
}

impl JobConfig {
    /// A non-resumable configuration: no job directory, quiet dedup logs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Points the job at a stable directory, making it resumable.
    #[must_use]
    pub fn with_jobdir(mut self, jobdir: impl Into<PathBuf>) -> Self {
        self.jobdir = Some(jobdir.into());
        self
    }

    /// Controls duplicate-logging verbosity.
    #[must_use]
    pub fn with_dedup_debug(mut self, debug: bool) -> Self {
        self.dedup_debug = debug;
        self
    }

    #[must_use]
    pub fn jobdir(&self) -> Option<&Path> {
        self.jobdir.as_deref()
    }

    #[must_use]
    pub fn dedup_debug(&self) -> bool {
        self.dedup_debug
    }

    /// Where a scheduler should keep its persistent request queue.
    #[must_use]
    pub fn queue_dir(&self) -> Option<PathBuf> {
        self.jobdir.as_ref().map(|dir| dir.join(QUEUE_DIR))
    }

    /// Builds a persister over the configured job directory, or `None` when
    /// durability is disabled.
    ///
    /// Each consuming component builds its own instance over the shared
    /// directory; the durable keys they use are disjoint, and append-handle
    /// caches stay per-instance.
    pub fn build_persister(&self) -> PersistResult<Option<Box<dyn Persister>>> {
        match &self.jobdir {
            Some(jobdir) => Ok(Some(Box::new(DiskPersister::new(jobdir)?))),
            None => Ok(None),
        }
    }
}
