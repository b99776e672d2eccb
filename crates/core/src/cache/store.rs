//! Persisted snapshot tier
//!
//! The whole key → entry map is serialized as one JSON object and replaced
//! atomically: the snapshot is written to a sibling temporary file, synced,
//! then renamed over the previous one.

use crate::entry::CacheEntry;
use crate::{Error, Result};
use fs4::fs_std::FileExt;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Map of lowercased word to entry, as stored on disk.
pub type Snapshot = BTreeMap<String, CacheEntry>;

#[derive(Debug, Default)]
struct StoreState {
    entries: Snapshot,
    dirty: bool,
}

/// Durable key → entry store with a dirty flag for deferred flushing.
#[derive(Debug)]
pub struct PersistedStore {
    path: PathBuf,
    state: Mutex<StoreState>,
    flush_lock: Mutex<()>,
}

impl PersistedStore {
    /// Open the store at `path`, loading any existing snapshot.
    ///
    /// A missing, unreadable or corrupt snapshot yields an empty store.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match read_snapshot(&path) {
            Ok(entries) => {
                debug!(path = %path.display(), entries = entries.len(), "Loaded definition cache");
                entries
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Starting with empty definition cache");
                Snapshot::new()
            }
        };

        Self {
            path,
            state: Mutex::new(StoreState {
                entries,
                dirty: false,
            }),
            flush_lock: Mutex::new(()),
        }
    }

    /// Location of the snapshot file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up an entry regardless of freshness
    #[must_use]
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.state.lock().entries.get(key).cloned()
    }

    /// Insert or replace an entry and mark the store dirty
    pub fn insert(&self, entry: CacheEntry) {
        let mut state = self.state.lock();
        state.entries.insert(entry.key.clone(), entry);
        state.dirty = true;
    }

    /// Whether there are changes not yet written to disk
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state.lock().dirty
    }

    /// Number of stored entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether the store holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Write the snapshot if anything changed since the last flush.
    ///
    /// Returns `Ok(true)` when a snapshot was written. On failure the store
    /// stays dirty so the next flush retries, and the previous snapshot on
    /// disk is left untouched.
    pub fn flush(&self) -> Result<bool> {
        let _flushing = self.flush_lock.lock();

        let bytes = {
            let mut state = self.state.lock();
            if !state.dirty {
                return Ok(false);
            }
            let bytes = serde_json::to_vec(&state.entries).map_err(|e| {
                Error::serialization(format!("Failed to serialize definition cache: {e}"))
            })?;
            state.dirty = false;
            bytes
        };

        if let Err(e) = write_private_atomic(&self.path, &bytes) {
            self.state.lock().dirty = true;
            warn!(path = %self.path.display(), error = %e, "Definition cache flush failed");
            return Err(e);
        }

        debug!(path = %self.path.display(), bytes = bytes.len(), "Flushed definition cache");
        Ok(true)
    }
}

/// Read a snapshot from disk, filling each entry's key from its map key.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let contents = fs::read(path).map_err(|e| Error::io(e, path, "read"))?;
    let mut entries: Snapshot = serde_json::from_slice(&contents)
        .map_err(|e| Error::serialization(format!("Failed to parse definition cache: {e}")))?;
    for (key, entry) in &mut entries {
        entry.key.clone_from(key);
    }
    Ok(entries)
}

/// Replace `path` with `data`, readable only by the owner.
///
/// The data lands in `<path>.tmp` first and is renamed into place, so readers
/// observe either the previous contents or the new ones. Writers to the same
/// path, in this process or another, are serialized on `<path>.lock`.
pub fn write_private_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(e, parent, "create_dir_all"))?;
    }

    // Held until the rename completes; released when dropped
    let lock_path = lock_path_for(path);
    let lock = private_options(false)
        .open(&lock_path)
        .map_err(|e| Error::io(e, &lock_path, "open"))?;
    FileExt::lock_exclusive(&lock).map_err(|e| Error::io(e, &lock_path, "lock_exclusive"))?;

    let tmp_path = temp_path_for(path);
    let mut file = private_options(true)
        .open(&tmp_path)
        .map_err(|e| Error::io(e, &tmp_path, "create"))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| Error::io(e, &tmp_path, "chmod"))?;
    }
    file.write_all(data)
        .map_err(|e| Error::io(e, &tmp_path, "write"))?;
    file.sync_all()
        .map_err(|e| Error::io(e, &tmp_path, "sync"))?;
    drop(file);

    fs::rename(&tmp_path, path).map_err(|e| Error::io(e, path, "rename"))?;
    drop(lock);
    Ok(())
}

fn private_options(truncate: bool) -> fs::OpenOptions {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(truncate);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}

/// Sibling temporary path used while writing `path`.
#[must_use]
pub fn temp_path_for(path: &Path) -> PathBuf {
    sibling_with_suffix(path, ".tmp")
}

/// Sibling lock file serializing writers of `path`.
#[must_use]
pub fn lock_path_for(path: &Path) -> PathBuf {
    sibling_with_suffix(path, ".lock")
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}
