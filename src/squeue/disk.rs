//! Disk-backed FIFO and LIFO queues
//!
//! Both variants keep one data file per queue directory. FIFO frames are
//! `[u32-LE length][JSON payload]` and pops advance a head offset without
//! rewriting the file (the log is never compacted). LIFO frames are
//! `[JSON payload][u32-LE length]` and pops truncate, so the file length is
//! always the top of the stack.
//!
//! A clean `close` with items remaining writes a resume marker
//! (`info.json`) holding the head offset and count; `open` consumes the
//! marker. A run that died without closing leaves no marker, so the next
//! open rebuilds the count by scanning frames and the FIFO variant replays
//! from the start of the log. Replay delivers at-least-once; the dedup
//! filter absorbs the already-processed prefix.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::PersistentQueue;
use super::errors::QueueError;

const DATA_FILE: &str = "queue.data";
const INFO_FILE: &str = "info.json";

/// Resume marker written at clean close of a non-empty queue.
///
/// The LIFO variant stores `head` as 0; its file length is authoritative
/// for the top of the stack.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct QueueInfo {
    head: u64,
    count: usize,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> QueueError + '_ {
    move |source| QueueError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn corrupt(path: &Path, reason: &'static str) -> QueueError {
    QueueError::Corrupt {
        path: path.to_path_buf(),
        reason,
    }
}

/// Opens (create if needed) the data file of the queue at `dir`.
fn open_data_file(dir: &Path) -> Result<File, QueueError> {
    fs::create_dir_all(dir).map_err(io_error(dir))?;
    let data_path = dir.join(DATA_FILE);
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(&data_path)
        .map_err(io_error(&data_path))
}

/// Loads and consumes the resume marker, if one exists.
fn take_info(dir: &Path) -> Result<Option<QueueInfo>, QueueError> {
    let info_path = dir.join(INFO_FILE);
    let raw = match fs::read(&info_path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(io_error(&info_path)(source)),
    };
    let info: QueueInfo = serde_json::from_slice(&raw).map_err(QueueError::Decode)?;
    fs::remove_file(&info_path).map_err(io_error(&info_path))?;
    Ok(Some(info))
}

/// Removes the queue files and, best-effort, the emptied directory.
fn cleanup(dir: &Path) {
    debug!("Removing empty queue at {}", dir.display());
    let _ = fs::remove_file(dir.join(DATA_FILE));
    let _ = fs::remove_file(dir.join(INFO_FILE));
    let _ = fs::remove_dir(dir);
}

fn encode_frame<T: Serialize>(item: &T) -> Result<(Vec<u8>, u32), QueueError> {
    let payload = serde_json::to_vec(item).map_err(QueueError::Encode)?;
    let len = u32::try_from(payload.len()).map_err(|_| QueueError::ItemTooLarge {
        size: payload.len(),
    })?;
    Ok((payload, len))
}

/// First-in-first-out disk queue.
#[derive(Debug)]
pub struct FifoDiskQueue<T> {
    dir: PathBuf,
    file: File,
    head: u64,
    count: usize,
    _item: PhantomData<T>,
}

impl<T> FifoDiskQueue<T> {
    /// Opens the queue at `dir`, creating the directory on demand and
    /// resuming from a marker left by a previous clean close.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, QueueError> {
        let dir = dir.into();
        let mut file = open_data_file(&dir)?;
        let (head, count) = match take_info(&dir)? {
            Some(info) => {
                let len = file.metadata().map_err(io_error(&dir))?.len();
                if info.head > len {
                    return Err(corrupt(&dir, "resume marker points past end of data"));
                }
                (info.head, info.count)
            }
            None => (0, Self::scan(&mut file, &dir)?),
        };
        debug!(
            "Opened FIFO queue at {} ({count} pending)",
            dir.display()
        );
        Ok(Self {
            dir,
            file,
            head,
            count,
            _item: PhantomData,
        })
    }

    /// Counts frames from offset zero; used when no resume marker exists.
    fn scan(file: &mut File, dir: &Path) -> Result<usize, QueueError> {
        let len = file.metadata().map_err(io_error(dir))?.len();
        let mut pos = 0u64;
        let mut count = 0;
        while pos < len {
            if len - pos < 4 {
                return Err(corrupt(dir, "truncated frame header"));
            }
            file.seek(SeekFrom::Start(pos)).map_err(io_error(dir))?;
            let mut header = [0u8; 4];
            file.read_exact(&mut header).map_err(io_error(dir))?;
            let frame_len = u64::from(u32::from_le_bytes(header));
            if pos + 4 + frame_len > len {
                return Err(corrupt(dir, "truncated frame payload"));
            }
            pos += 4 + frame_len;
            count += 1;
        }
        Ok(count)
    }
}

impl<T: Serialize + DeserializeOwned> PersistentQueue<T> for FifoDiskQueue<T> {
    fn push(&mut self, item: T) -> Result<(), QueueError> {
        let (payload, len) = encode_frame(&item)?;
        self.file
            .seek(SeekFrom::End(0))
            .map_err(io_error(&self.dir))?;
        self.file
            .write_all(&len.to_le_bytes())
            .map_err(io_error(&self.dir))?;
        self.file
            .write_all(&payload)
            .map_err(io_error(&self.dir))?;
        self.count += 1;
        Ok(())
    }

    fn pop(&mut self) -> Result<Option<T>, QueueError> {
        if self.count == 0 {
            return Ok(None);
        }
        self.file
            .seek(SeekFrom::Start(self.head))
            .map_err(io_error(&self.dir))?;
        let mut header = [0u8; 4];
        self.file
            .read_exact(&mut header)
            .map_err(io_error(&self.dir))?;
        let frame_len = u32::from_le_bytes(header) as usize;
        let mut payload = vec![0u8; frame_len];
        self.file
            .read_exact(&mut payload)
            .map_err(io_error(&self.dir))?;
        self.head += 4 + frame_len as u64;
        self.count -= 1;
        let item = serde_json::from_slice(&payload).map_err(QueueError::Decode)?;
        Ok(Some(item))
    }

    fn len(&self) -> usize {
        self.count
    }

    fn close(&mut self) -> Result<(), QueueError> {
        self.file.sync_all().map_err(io_error(&self.dir))?;
        if self.count == 0 {
            cleanup(&self.dir);
        } else {
            let info = QueueInfo {
                head: self.head,
                count: self.count,
            };
            let blob = serde_json::to_vec(&info).map_err(QueueError::Encode)?;
            let info_path = self.dir.join(INFO_FILE);
            fs::write(&info_path, blob).map_err(io_error(&info_path))?;
        }
        Ok(())
    }
}

/// Last-in-first-out disk queue.
#[derive(Debug)]
pub struct LifoDiskQueue<T> {
    dir: PathBuf,
    file: File,
    size: u64,
    count: usize,
    _item: PhantomData<T>,
}

impl<T> LifoDiskQueue<T> {
    /// Opens the stack at `dir`; see [`FifoDiskQueue::open`].
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, QueueError> {
        let dir = dir.into();
        let mut file = open_data_file(&dir)?;
        let size = file.metadata().map_err(io_error(&dir))?.len();
        let count = match take_info(&dir)? {
            Some(info) => info.count,
            None => Self::scan(&mut file, &dir, size)?,
        };
        debug!(
            "Opened LIFO queue at {} ({count} pending)",
            dir.display()
        );
        Ok(Self {
            dir,
            file,
            size,
            count,
            _item: PhantomData,
        })
    }

    /// Counts frames by walking length suffixes backwards from the end.
    fn scan(file: &mut File, dir: &Path, size: u64) -> Result<usize, QueueError> {
        let mut pos = size;
        let mut count = 0;
        while pos > 0 {
            if pos < 4 {
                return Err(corrupt(dir, "truncated frame trailer"));
            }
            file.seek(SeekFrom::Start(pos - 4)).map_err(io_error(dir))?;
            let mut trailer = [0u8; 4];
            file.read_exact(&mut trailer).map_err(io_error(dir))?;
            let frame_len = u64::from(u32::from_le_bytes(trailer));
            if frame_len + 4 > pos {
                return Err(corrupt(dir, "truncated frame payload"));
            }
            pos -= frame_len + 4;
            count += 1;
        }
        Ok(count)
    }
}

impl<T: Serialize + DeserializeOwned> PersistentQueue<T> for LifoDiskQueue<T> {
    fn push(&mut self, item: T) -> Result<(), QueueError> {
        let (payload, len) = encode_frame(&item)?;
        self.file
            .seek(SeekFrom::Start(self.size))
            .map_err(io_error(&self.dir))?;
        self.file
            .write_all(&payload)
            .map_err(io_error(&self.dir))?;
        self.file
            .write_all(&len.to_le_bytes())
            .map_err(io_error(&self.dir))?;
        self.size += payload.len() as u64 + 4;
        self.count += 1;
        Ok(())
    }

    fn pop(&mut self) -> Result<Option<T>, QueueError> {
        if self.count == 0 {
            return Ok(None);
        }
        if self.size < 4 {
            return Err(corrupt(&self.dir, "count and data length disagree"));
        }
        self.file
            .seek(SeekFrom::Start(self.size - 4))
            .map_err(io_error(&self.dir))?;
        let mut trailer = [0u8; 4];
        self.file
            .read_exact(&mut trailer)
            .map_err(io_error(&self.dir))?;
        let frame_len = u64::from(u32::from_le_bytes(trailer));
        if frame_len + 4 > self.size {
            return Err(corrupt(&self.dir, "frame trailer points past start"));
        }
        self.file
            .seek(SeekFrom::Start(self.size - 4 - frame_len))
            .map_err(io_error(&self.dir))?;
        let mut payload = vec![0u8; frame_len as usize];
        self.file
            .read_exact(&mut payload)
            .map_err(io_error(&self.dir))?;
        self.size -= frame_len + 4;
        self.file.set_len(self.size).map_err(io_error(&self.dir))?;
        self.count -= 1;
        let item = serde_json::from_slice(&payload).map_err(QueueError::Decode)?;
        Ok(Some(item))
    }

    fn len(&self) -> usize {
        self.count
    }

    fn close(&mut self) -> Result<(), QueueError> {
        self.file.sync_all().map_err(io_error(&self.dir))?;
        if self.count == 0 {
            cleanup(&self.dir);
        } else {
            let info = QueueInfo {
                head: 0,
                count: self.count,
            };
            let blob = serde_json::to_vec(&info).map_err(QueueError::Encode)?;
            let info_path = self.dir.join(INFO_FILE);
            fs::write(&info_path, blob).map_err(io_error(&info_path))?;
        }
        Ok(())
    }
}
