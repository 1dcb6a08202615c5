//! Out-of-process snapshot sharing through a JSON file.
//!
//! The sampler rewrites the whole file after every tick via
//! write-to-temp-then-rename, so a reader sees either the previous or the
//! new snapshot and never a partially written one. The file is
//! `{ "<pid>": {"pid","name","status","user_avg","sys_avg"}, ... }`.

use cpuwatch_core::{
    sort_for_display, CpuWatchError, ProcessRecord, ProcessRegistry, ProcessSource, Result,
    SnapshotProvider, SnapshotSink,
};
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Sampler-side writer for the JSON snapshot file.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn write_err(&self, reason: impl ToString) -> CpuWatchError {
        CpuWatchError::StoreWrite {
            path:   self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

impl SnapshotSink for FileSnapshotStore {
    fn publish(&mut self, registry: &ProcessRegistry) -> Result<()> {
        let by_pid: BTreeMap<String, &ProcessRecord> = registry
            .records()
            .map(|r| (r.pid.to_string(), r))
            .collect();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.write_err(e))?;
        }

        let tmp_path = temporary_path(&self.path);
        {
            let file = fs::File::create(&tmp_path).map_err(|e| self.write_err(e))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, &by_pid).map_err(|e| self.write_err(e))?;
            writer.flush().map_err(|e| self.write_err(e))?;
        }
        fs::rename(&tmp_path, &self.path).map_err(|e| self.write_err(e))?;

        debug!(path = %self.path.display(), records = by_pid.len(), "snapshot written");
        Ok(())
    }
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Read the snapshot file as written by [`FileSnapshotStore`], unsorted.
///
/// A missing file means the sampler has not completed a tick yet and yields
/// an empty list.
///
/// # Errors
/// [`CpuWatchError::StoreRead`] if the file exists but cannot be read or
/// parsed.
pub fn read_snapshot(path: &Path) -> Result<Vec<ProcessRecord>> {
    let read_err = |reason: String| CpuWatchError::StoreRead {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(read_err(e.to_string())),
    };

    let by_pid: HashMap<String, ProcessRecord> =
        serde_json::from_slice(&bytes).map_err(|e| read_err(e.to_string()))?;
    Ok(by_pid.into_values().collect())
}

/// Query-side reader for the JSON snapshot file.
///
/// The file can be one tick stale, so every read is checked against a fresh
/// enumeration from `source`: records whose process has exited, turned
/// zombie or now runs a different program are dropped.
pub struct FileSnapshotProvider<S> {
    path:   PathBuf,
    source: Mutex<S>,
}

impl<S: ProcessSource> FileSnapshotProvider<S> {
    pub fn new(path: impl Into<PathBuf>, source: S) -> Self {
        Self {
            path:   path.into(),
            source: Mutex::new(source),
        }
    }

    /// pid → name of every live, non-zombie process.
    fn alive(&self) -> Result<HashMap<u32, String>> {
        let mut source = self.source.lock().unwrap_or_else(PoisonError::into_inner);
        let lookups = source.enumerate()?;
        Ok(lookups
            .into_iter()
            .filter_map(|lookup| lookup.ok())
            .filter(|s| !s.status.is_zombie())
            .map(|s| (s.pid, s.name))
            .collect())
    }
}

impl<S: ProcessSource> SnapshotProvider for FileSnapshotProvider<S> {
    fn current_processes(&self) -> Result<Vec<ProcessRecord>> {
        let stored = read_snapshot(&self.path)?;
        if stored.is_empty() {
            return Ok(stored);
        }

        let alive = self.alive()?;
        let mut records: Vec<ProcessRecord> = stored
            .into_iter()
            .filter(|r| alive.get(&r.pid) == Some(&r.name))
            .collect();
        sort_for_display(&mut records);
        Ok(records)
    }
}
