//! Durable blob media backing the report store.
//!
//! The store treats its medium as a small key-value blob store: it reads
//! and writes one opaque blob per key. [`MemoryMedium`] keeps blobs in
//! process (optionally with a byte quota, like browser session storage),
//! and [`FileMedium`] keeps one file per key in a directory.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);
const TEMP_PREFIX: &str = ".safepath.tmp.";

/// Errors from a [`ReportMedium`].
#[derive(Debug, Error)]
pub enum MediumError {
    /// Underlying I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The blob does not fit in the medium's quota.
    #[error("quota exceeded: {needed} bytes needed, {capacity} available")]
    QuotaExceeded {
        /// Size of the rejected blob.
        needed: usize,
        /// Configured capacity.
        capacity: usize,
    },

    /// The key cannot be mapped onto the medium.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),
}

/// A key-value blob store.
pub trait ReportMedium: Send + Sync {
    /// Reads the blob stored under `key`, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`MediumError`] if the medium cannot be read.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, MediumError>;

    /// Replaces the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`MediumError`] if the write fails or exceeds capacity.
    fn write(&self, key: &str, blob: &[u8]) -> Result<(), MediumError>;

    /// Removes the blob stored under `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`MediumError`] if the removal fails.
    fn delete(&self, key: &str) -> Result<(), MediumError>;
}

/// In-process medium, optionally limited to a byte quota per blob.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
    capacity: Option<usize>,
}

impl MemoryMedium {
    /// Unbounded in-memory medium.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// In-memory medium rejecting blobs larger than `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            blobs: Mutex::default(),
            capacity: Some(capacity),
        }
    }
}

impl ReportMedium for MemoryMedium {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, MediumError> {
        let blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(blobs.get(key).cloned())
    }

    fn write(&self, key: &str, blob: &[u8]) -> Result<(), MediumError> {
        if let Some(capacity) = self.capacity
            && blob.len() > capacity
        {
            return Err(MediumError::QuotaExceeded {
                needed: blob.len(),
                capacity,
            });
        }
        let mut blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        blobs.insert(key.to_string(), blob.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), MediumError> {
        let mut blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        blobs.remove(key);
        Ok(())
    }
}

/// Directory-backed medium storing each key as `<dir>/<key>.json`.
///
/// Writes go to a temporary file in the same directory which is then
/// renamed over the target, so readers never observe a partial blob.
#[derive(Debug, Clone)]
pub struct FileMedium {
    dir: PathBuf,
}

impl FileMedium {
    /// Creates a medium rooted at `dir`. The directory is created lazily
    /// on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the blobs.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, MediumError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(MediumError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl ReportMedium for FileMedium {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, MediumError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, blob: &[u8]) -> Result<(), MediumError> {
        let path = self.path_for(key)?;
        atomic_write(&self.dir, &path, blob)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), MediumError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn atomic_write(dir: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    fs::create_dir_all(dir)?;

    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("blob");
    let tmp_path = dir.join(format!(
        "{TEMP_PREFIX}{file_name}.{}.{counter}",
        std::process::id()
    ));

    let result = (|| -> io::Result<()> {
        let mut tmp: File = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&tmp_path)?;
        tmp.write_all(bytes)?;
        tmp.sync_all()?;
        drop(tmp);
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}
