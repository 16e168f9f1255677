//! Crawl-scoped state that survives restarts
//!
//! [`JobState`] is a free-form string→value mapping a spider can stash
//! progress markers in (cursor positions, per-domain counters, anything
//! JSON-shaped). With a persister configured, `open` reloads the snapshot
//! from the previous run and `close` writes the current mapping back as one
//! blob. Only the value present at close time survives; mutations are never
//! persisted incrementally.

use std::collections::HashMap;

use log::debug;
use serde_json::Value;

use crate::config::JobConfig;
use crate::persist::{PersistError, Persister};

/// Durable key holding the serialized state snapshot.
pub const STATE_KEY: &str = "spider.state";

/// The state mapping: string keys to JSON-shaped values.
pub type StateMap = HashMap<String, Value>;

/// Error types for state snapshot handling
#[derive(Debug, thiserror::Error)]
pub enum JobStateError {
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// The in-memory mapping could not be serialized
    #[error("could not encode state snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    /// The stored snapshot could not be deserialized
    #[error("stored state snapshot is corrupt: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Store and load spider state across the runs of a resumable job.
pub struct JobState {
    state: StateMap,
    persister: Option<Box<dyn Persister>>,
}

impl JobState {
    /// A state object over `persister`; the mapping starts empty until
    /// [`open`](JobState::open) runs.
    #[must_use]
    pub fn new(persister: Option<Box<dyn Persister>>) -> Self {
        Self {
            state: StateMap::new(),
            persister,
        }
    }

    /// Builds state from job configuration; without a job directory the
    /// mapping is transient and the lifecycle hooks are no-ops.
    pub fn from_config(config: &JobConfig) -> Result<Self, JobStateError> {
        Ok(Self::new(config.build_persister()?))
    }

    /// Job-start hook: replaces the mapping with the stored snapshot when
    /// one exists, otherwise with an empty mapping.
    pub fn open(&mut self) -> Result<(), JobStateError> {
        self.state = match &self.persister {
            Some(persister) if persister.exists(STATE_KEY) => {
                let raw = persister.get(STATE_KEY, b"")?;
                let state: StateMap =
                    serde_json::from_slice(&raw).map_err(JobStateError::Decode)?;
                debug!("Restored {} state entries", state.len());
                state
            }
            _ => StateMap::new(),
        };
        Ok(())
    }

    /// Job-end hook: snapshots the current mapping, fully overwriting any
    /// prior stored value.
    pub fn close(&mut self) -> Result<(), JobStateError> {
        if let Some(persister) = self.persister.as_mut() {
            let blob = serde_json::to_vec(&self.state).map_err(JobStateError::Encode)?;
            persister.set(STATE_KEY, &blob)?;
            debug!("Snapshotted {} state entries", self.state.len());
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.state.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.state.remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.state.iter()
    }
}
