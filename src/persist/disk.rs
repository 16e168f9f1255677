//! File-backed persister rooted at a per-job directory
//!
//! Each key maps to one file under the job directory; hierarchical keys
//! (`queues/pending`) become nested subdirectories created on demand. The
//! append path caches one open handle per key so the per-request dedup-log
//! write is a single write syscall instead of an open+seek+write+close
//! cycle.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::debug;

use super::Persister;
use super::errors::{PersistError, PersistResult};

/// Disk-backed [`Persister`] owning a job directory.
///
/// One instance is the exclusive owner of its directory for the lifetime of
/// a job. The append-handle cache is per-instance state; sharing a directory
/// between instances requires coordinated closing and concurrent processes
/// are not supported.
pub struct DiskPersister {
    jobdir: PathBuf,
    handles: HashMap<String, File>,
}

fn io_error(key: &str) -> impl FnOnce(std::io::Error) -> PersistError + '_ {
    move |source| PersistError::Io {
        key: key.to_owned(),
        source,
    }
}

impl DiskPersister {
    /// Opens a persister over `jobdir`, creating the directory if needed.
    pub fn new(jobdir: impl Into<PathBuf>) -> PersistResult<Self> {
        let jobdir = jobdir.into();
        fs::create_dir_all(&jobdir).map_err(|source| PersistError::JobDir {
            path: jobdir.clone(),
            source,
        })?;
        debug!("Opened job directory {}", jobdir.display());
        Ok(Self {
            jobdir,
            handles: HashMap::new(),
        })
    }

    /// The backing job directory.
    #[must_use]
    pub fn jobdir(&self) -> &Path {
        &self.jobdir
    }

    /// Maps a key to its file path under the job directory.
    ///
    /// Keys must be relative: empty keys, empty segments, `.` and `..` are
    /// rejected so a key can never resolve outside the job directory.
    fn key_path(&self, key: &str) -> PersistResult<PathBuf> {
        if key.is_empty() {
            return Err(PersistError::InvalidKey {
                key: key.to_owned(),
                reason: "key is empty",
            });
        }
        let mut path = self.jobdir.clone();
        for segment in key.split('/') {
            match segment {
                "" => {
                    return Err(PersistError::InvalidKey {
                        key: key.to_owned(),
                        reason: "empty path segment",
                    });
                }
                "." | ".." => {
                    return Err(PersistError::InvalidKey {
                        key: key.to_owned(),
                        reason: "relative path segment",
                    });
                }
                _ => path.push(segment),
            }
        }
        Ok(path)
    }
}

impl Persister for DiskPersister {
    fn get(&self, key: &str, fallback: &[u8]) -> PersistResult<Vec<u8>> {
        let path = self.key_path(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(fallback.to_vec()),
            Err(source) => Err(io_error(key)(source)),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> PersistResult<()> {
        let path = self.key_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error(key))?;
        }
        fs::write(&path, value).map_err(io_error(key))
    }

    fn exists(&self, key: &str) -> bool {
        self.key_path(key).is_ok_and(|path| path.exists())
    }

    fn append(&mut self, key: &str, value: &[u8]) -> PersistResult<()> {
        let path = self.key_path(key)?;
        let file = match self.handles.entry(key.to_owned()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(io_error(key))?;
                }
                let file = OpenOptions::new()
                    .append(true)
                    .create(true)
                    .open(&path)
                    .map_err(io_error(key))?;
                entry.insert(file)
            }
        };
        file.write_all(value).map_err(io_error(key))
    }

    fn remove(&mut self, key: &str) -> PersistResult<()> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PersistError::Missing {
                    key: key.to_owned(),
                });
            }
            Err(source) => return Err(io_error(key)(source)),
        }
        // Hygiene only: drop the enclosing directory if the delete emptied
        // it. Any failure here is ignored.
        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir(parent);
        }
        Ok(())
    }

    fn close(&mut self, key: &str) -> PersistResult<()> {
        if let Some(file) = self.handles.remove(key) {
            file.sync_all().map_err(io_error(key))?;
            debug!("Closed append handle for key '{key}'");
        }
        Ok(())
    }
}
