//! In-process persister over a byte map
//!
//! Satisfies the full [`Persister`] contract without touching disk. Useful
//! for jobs that want the dedup/state plumbing without durability, and as
//! the storage double in tests.

use std::collections::HashMap;

use super::Persister;
use super::errors::{PersistError, PersistResult};

/// Memory-backed [`Persister`]. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryPersister {
    values: HashMap<String, Vec<u8>>,
}

impl MemoryPersister {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persister for MemoryPersister {
    fn get(&self, key: &str, fallback: &[u8]) -> PersistResult<Vec<u8>> {
        Ok(self
            .values
            .get(key)
            .cloned()
            .unwrap_or_else(|| fallback.to_vec()))
    }

    fn set(&mut self, key: &str, value: &[u8]) -> PersistResult<()> {
        self.values.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn append(&mut self, key: &str, value: &[u8]) -> PersistResult<()> {
        self.values
            .entry(key.to_owned())
            .or_default()
            .extend_from_slice(value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> PersistResult<()> {
        match self.values.remove(key) {
            Some(_) => Ok(()),
            None => Err(PersistError::Missing {
                key: key.to_owned(),
            }),
        }
    }

    fn close(&mut self, _key: &str) -> PersistResult<()> {
        Ok(())
    }
}
