//! Resumable acquisition state and its JSON snapshot file.
//!
//! Every save is a full overwrite, written to a sibling temp file and renamed
//! into place so a crash mid-write never leaves a truncated snapshot. Loading
//! never fails: anything unusable is a cold start.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use carlist_core::{validate_bounds, ListingRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Snapshot format version. Files with any other version are ignored.
pub const CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize checkpoint: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// In-memory acquisition state: everything collected so far plus the page
/// keys already fetched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Checkpoint {
    pub records: Vec<ListingRecord>,
    pub visited: HashSet<String>,
    /// When this state was last written to (or read from) disk.
    pub saved_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    records: &'a [ListingRecord],
    visited: Vec<&'a str>,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

#[derive(Deserialize)]
struct Snapshot {
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    records: Vec<ListingRecord>,
    #[serde(default)]
    visited: Vec<String>,
}

/// Reads and writes the snapshot file at a fixed path.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CheckpointError + '_ {
        move |source| CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Writes `state` with the current time, replacing any previous snapshot.
    ///
    /// Returns the timestamp that was written.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError`] if the snapshot cannot be serialized or the
    /// file cannot be written or renamed into place.
    pub fn save(&self, state: &Checkpoint) -> Result<DateTime<Utc>, CheckpointError> {
        let saved_at = Utc::now();
        let mut visited: Vec<&str> = state.visited.iter().map(String::as_str).collect();
        visited.sort_unstable();
        let snapshot = SnapshotRef {
            version: CHECKPOINT_VERSION,
            saved_at,
            records: &state.records,
            visited,
        };
        let json = serde_json::to_vec(&snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(Self::io_error(parent))?;
        }
        let tmp = self.temp_path();
        std::fs::write(&tmp, json).map_err(Self::io_error(&tmp))?;
        std::fs::rename(&tmp, &self.path).map_err(Self::io_error(&self.path))?;

        tracing::info!(
            path = %self.path.display(),
            records = state.records.len(),
            visited = state.visited.len(),
            "checkpoint saved"
        );
        Ok(saved_at)
    }

    /// Saves `state`, logging instead of returning any failure. On success
    /// `state.saved_at` is updated.
    pub fn save_best_effort(&self, state: &mut Checkpoint) -> bool {
        match self.save(state) {
            Ok(saved_at) => {
                state.saved_at = Some(saved_at);
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "checkpoint save failed; continuing in memory");
                false
            }
        }
    }

    /// Restores the last snapshot, or an empty state when the file is
    /// missing, unreadable, malformed, or from another format version.
    /// Records outside the listing bounds are dropped.
    #[must_use]
    pub fn load(&self) -> Checkpoint {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no checkpoint; starting fresh");
                return Checkpoint::default();
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to read checkpoint; starting fresh"
                );
                return Checkpoint::default();
            }
        };

        match serde_json::from_slice::<VersionProbe>(&bytes) {
            Ok(probe) if probe.version == CHECKPOINT_VERSION => {}
            Ok(probe) => {
                tracing::warn!(
                    path = %self.path.display(),
                    found = probe.version,
                    expected = CHECKPOINT_VERSION,
                    "checkpoint version mismatch; starting fresh"
                );
                return Checkpoint::default();
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "checkpoint is not valid JSON; starting fresh"
                );
                return Checkpoint::default();
            }
        }

        match serde_json::from_slice::<Snapshot>(&bytes) {
            Ok(snapshot) => {
                let restored = snapshot.records.len();
                let records: Vec<ListingRecord> = snapshot
                    .records
                    .into_iter()
                    .filter(|r| {
                        validate_bounds(r.price, r.year, i64::from(r.mileage_km)).is_ok()
                    })
                    .collect();
                if records.len() < restored {
                    tracing::warn!(
                        path = %self.path.display(),
                        dropped = restored - records.len(),
                        "dropped out-of-range records from checkpoint"
                    );
                }
                let state = Checkpoint {
                    records,
                    visited: snapshot.visited.into_iter().collect(),
                    saved_at: snapshot.saved_at,
                };
                tracing::info!(
                    path = %self.path.display(),
                    records = state.records.len(),
                    visited = state.visited.len(),
                    "restored checkpoint"
                );
                state
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "checkpoint does not match the expected shape; starting fresh"
                );
                Checkpoint::default()
            }
        }
    }
}
