//! WAV file writer via `hound`, fixed to the looper's stereo f32 format.

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use hound::{SampleFormat, WavSpec, WavWriter};
use looper_core::frame::{Frame, NUM_CHANNELS, SAMPLE_RATE};

use crate::error::{FileError, Result};

const BIT_DEPTH: u16 = 32;

fn spec() -> WavSpec {
    WavSpec {
        channels: NUM_CHANNELS as u16,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: BIT_DEPTH,
        sample_format: SampleFormat::Float,
    }
}

fn io_error(path: &Path, source: std::io::Error) -> FileError {
    FileError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn hound_error(path: &Path, err: hound::Error) -> FileError {
    FileError::InvalidWavFile(format!("{}: {err}", path.display()))
}

/// An append-only WAV writer over a single file.
///
/// Used by the capture daemon, which truncates and recreates this
/// writer every time the capture flag rises, then pushes frames as
/// they arrive and finalizes on fall.
pub struct WavFileWriter {
    path: PathBuf,
    writer: Option<WavWriter<BufWriter<File>>>,
}

impl WavFileWriter {
    /// Create (or truncate) the file at `path` for writing.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let writer = WavWriter::create(&path, spec()).map_err(|e| hound_error(&path, e))?;
        Ok(Self {
            path,
            writer: Some(writer),
        })
    }

    /// Append frames to the file.
    pub fn write_frames(&mut self, frames: &[Frame]) -> Result<()> {
        let writer = self.writer.as_mut().expect("write after finalize");
        for frame in frames {
            writer.write_sample(frame[0]).map_err(|e| hound_error(&self.path, e))?;
            writer.write_sample(frame[1]).map_err(|e| hound_error(&self.path, e))?;
        }
        Ok(())
    }

    /// Flush and close the file.
    pub fn finalize(mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().map_err(|e| hound_error(&self.path, e))?;
        }
        Ok(())
    }
}

/// Write a complete frame buffer to `path` atomically: write to a
/// sibling temp file, then rename into place, so that a reader opening
/// `path` concurrently never observes a partially written file.
///
/// This is how the mix engine populates the inactive playback backing
/// store before the side flag flips (design note: "ensure atomic
/// full-file writes before the side-flag flip").
pub fn write_atomic(path: &Path, frames: &[Frame]) -> Result<()> {
    let tmp_path = path.with_extension("wav.tmp");
    {
        let writer = WavWriter::create(&tmp_path, spec()).map_err(|e| hound_error(&tmp_path, e))?;
        let mut writer = writer;
        for frame in frames {
            writer.write_sample(frame[0]).map_err(|e| hound_error(&tmp_path, e))?;
            writer.write_sample(frame[1]).map_err(|e| hound_error(&tmp_path, e))?;
        }
        writer.finalize().map_err(|e| hound_error(&tmp_path, e))?;
    }
    std::fs::rename(&tmp_path, path).map_err(|e| io_error(path, e))?;
    Ok(())
}
