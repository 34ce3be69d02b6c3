//! Per-session directory layout: the temp recording store, the two
//! double-buffered playback stores, and the append-only take list.

use std::path::{Path, PathBuf};

use time::macros::format_description;
use time::OffsetDateTime;
use tracing::info;

use crate::error::{FileError, Result};

const TEMP_RECORDING_FILE: &str = "temp_recording_file.wav";
const TEMP_PLAYING_FILE_0: &str = "temp_playing_file0.wav";
const TEMP_PLAYING_FILE_1: &str = "temp_playing_file1.wav";

/// A single committed take's on-disk record.
#[derive(Debug, Clone)]
pub struct TakeRecord {
    pub index: usize,
    pub path: PathBuf,
}

/// Owns a session directory and the fixed filenames within it.
///
/// Takes are appended and never mutated or removed (spec lifecycle:
/// created on capture-flag fall, persisted, appended to the in-memory
/// list).
pub struct Session {
    directory: PathBuf,
    takes: Vec<TakeRecord>,
}

impl Session {
    /// Create a new session directory under `recording_root`, named by
    /// local timestamp `YYYY-MM-DD__HH-MM-SS`.
    pub fn create(recording_root: &Path) -> Result<Self> {
        let format = format_description!("[year]-[month]-[day]__[hour]-[minute]-[second]");
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let name = now
            .format(&format)
            .map_err(|e| FileError::SessionDirCreate(e.to_string()))?;

        let directory = recording_root.join(name);
        std::fs::create_dir_all(&directory)
            .map_err(|e| FileError::Io { path: directory.display().to_string(), source: e })?;

        info!(directory = %directory.display(), "created session directory");

        Ok(Self { directory, takes: Vec::new() })
    }

    /// The session directory path.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path to the temp capture backing store.
    pub fn temp_recording_path(&self) -> PathBuf {
        self.directory.join(TEMP_RECORDING_FILE)
    }

    /// Path to one of the two double-buffered playback backing stores.
    pub fn temp_playing_path(&self, side: usize) -> PathBuf {
        let name = if side == 0 { TEMP_PLAYING_FILE_0 } else { TEMP_PLAYING_FILE_1 };
        self.directory.join(name)
    }

    /// Committed takes so far, in commit order.
    pub fn takes(&self) -> &[TakeRecord] {
        &self.takes
    }

    /// The path a newly committed take should be written to:
    /// `loop_NNN.wav`, zero-padded 3 digits.
    pub fn next_take_path(&self) -> PathBuf {
        self.directory.join(format!("loop_{:03}.wav", self.takes.len()))
    }

    /// Record a take as committed. The file at `path` must already
    /// have been written; this only appends the in-memory record.
    pub fn record_take(&mut self, path: PathBuf) {
        let index = self.takes.len();
        self.takes.push(TakeRecord { index, path });
    }
}
