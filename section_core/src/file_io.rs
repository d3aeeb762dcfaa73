//! # File I/O
//!
//! Reading and writing section documents (`.sect`, JSON) and result tables
//! (`.csv`):
//! - **Atomic writes**: write to a sibling `.tmp`, fsync, rename
//! - **File locking**: an OS lock plus a `<ext>.lock` file naming the holder
//! - **Version validation**: documents from an incompatible schema are rejected
//!
//! ## Example
//!
//! ```rust,no_run
//! use section_core::document::SectionDocument;
//! use section_core::file_io::{load_document, save_document, FileLock};
//! use std::path::Path;
//!
//! let path = Path::new("rhs.sect");
//! let lock = FileLock::acquire(path, "cli")?;
//! save_document(&SectionDocument::new("RHS"), path)?;
//! drop(lock);
//!
//! let doc = load_document(path)?;
//! # Ok::<(), section_core::errors::SectionError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::document::{SectionDocument, SCHEMA_VERSION};
use crate::errors::{CalcResult, SectionError};
use crate::report::ResultTable;

/// Locks older than this are taken over
const STALE_LOCK_HOURS: i64 = 24;

/// Contents of a `.lock` file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    /// Who took the lock (user name or tool name)
    pub holder: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    pub fn new(holder: impl Into<String>) -> Self {
        LockInfo {
            holder: holder.into(),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// True if the owning process is gone or the lock is too old
    pub fn is_stale(&self) -> bool {
        #[cfg(unix)]
        {
            if fs::metadata(format!("/proc/{}", self.pid)).is_err() && Path::new("/proc/self").exists() {
                return true;
            }
        }
        (Utc::now() - self.locked_at).num_hours() > STALE_LOCK_HOURS
    }
}

/// Exclusive lock on a file, released on drop.
pub struct FileLock {
    target: PathBuf,
    lock_path: PathBuf,
    _handle: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire the lock for `path`.
    ///
    /// Fails with [`SectionError::FileLocked`] if a live holder exists.
    pub fn acquire(path: &Path, holder: impl Into<String>) -> CalcResult<Self> {
        let lock_path = lock_path_for(path);

        if let Some(existing) = read_lock_info(&lock_path) {
            if !existing.is_stale() {
                return Err(locked(path, &existing));
            }
            warn!(
                "Taking over stale lock on {} held by {} since {}",
                path.display(),
                existing.holder,
                existing.locked_at.to_rfc3339()
            );
        }

        let mut handle = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| io_error("create lock", &lock_path, e))?;

        handle.try_lock_exclusive().map_err(|_| {
            SectionError::FileLocked {
                path: path.display().to_string(),
                holder: "another process".to_string(),
                since: "unknown".to_string(),
            }
        })?;

        let info = LockInfo::new(holder);
        let json = serde_json::to_string_pretty(&info)?;
        handle
            .write_all(json.as_bytes())
            .and_then(|_| handle.sync_all())
            .map_err(|e| io_error("write lock", &lock_path, e))?;

        debug!("Locked {}", path.display());
        Ok(FileLock {
            target: path.to_path_buf(),
            lock_path,
            _handle: handle,
            info,
        })
    }

    /// Current live holder of the lock on `path`, if any
    pub fn check(path: &Path) -> Option<LockInfo> {
        read_lock_info(&lock_path_for(path)).filter(|info| !info.is_stale())
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let extension = path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    path.with_extension(extension)
}

fn read_lock_info(lock_path: &Path) -> Option<LockInfo> {
    let text = fs::read_to_string(lock_path).ok()?;
    serde_json::from_str(&text).ok()
}

fn locked(path: &Path, info: &LockInfo) -> SectionError {
    SectionError::FileLocked {
        path: path.display().to_string(),
        holder: format!("{} (pid {})", info.holder, info.pid),
        since: info.locked_at.to_rfc3339(),
    }
}

fn io_error(operation: &str, path: &Path, e: std::io::Error) -> SectionError {
    SectionError::file_error(operation, path.display().to_string(), e.to_string())
}

/// Write `contents` to `path` through a synced temporary file and a rename.
pub fn write_atomic(path: &Path, contents: &[u8]) -> CalcResult<()> {
    let tmp_path = match path.extension() {
        Some(ext) => path.with_extension(format!("{}.tmp", ext.to_string_lossy())),
        None => path.with_extension("tmp"),
    };

    let result = File::create(&tmp_path)
        .and_then(|mut file| {
            file.write_all(contents)?;
            file.sync_all()
        })
        .map_err(|e| io_error("write temp file", &tmp_path, e))
        .and_then(|_| fs::rename(&tmp_path, path).map_err(|e| io_error("rename to final", path, e)));

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// Save a document with atomic write semantics.
pub fn save_document(doc: &SectionDocument, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(doc)?;
    write_atomic(path, json.as_bytes())?;
    debug!("Saved document '{}' to {}", doc.meta.name, path.display());
    Ok(())
}

/// Load a document and check its schema version.
pub fn load_document(path: &Path) -> CalcResult<SectionDocument> {
    let text = fs::read_to_string(path).map_err(|e| io_error("read", path, e))?;
    let doc: SectionDocument = serde_json::from_str(&text).map_err(|e| SectionError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })?;
    validate_version(&doc.meta.version)?;
    Ok(doc)
}

/// Write a result table as CSV.
pub fn export_csv(table: &ResultTable, path: &Path) -> CalcResult<()> {
    write_atomic(path, table.to_csv()?.as_bytes())
}

/// Read a result table from CSV.
pub fn import_csv(path: &Path) -> CalcResult<ResultTable> {
    let text = fs::read_to_string(path).map_err(|e| io_error("read", path, e))?;
    ResultTable::from_csv(&text)
}

/// Major versions must match; within 0.x a newer minor is also rejected.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || SectionError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };
    let parse = |v: &str| -> Option<(u32, u32)> {
        let mut parts = v.split('.').map(|p| p.parse::<u32>());
        let major = parts.next()?.ok()?;
        let minor = parts.next().unwrap_or(Ok(0)).ok()?;
        Some((major, minor))
    };

    let (file_major, file_minor) = parse(file_version).ok_or_else(mismatch)?;
    let (major, minor) = parse(SCHEMA_VERSION).ok_or_else(mismatch)?;

    if file_major != major || (major == 0 && file_minor > minor) {
        return Err(mismatch());
    }
    Ok(())
}
