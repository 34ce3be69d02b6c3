//! Runtime configuration for the looper engine.
//!
//! Deserialized from an optional JSON file (`serde`/`serde_json`) and
//! overridable by CLI flags in `looper_engine`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DspError, Result};

/// All tunable constants of a looper instance.
///
/// Every field has a sensible default so `LooperConfig::default()`
/// alone produces a runnable configuration; a JSON file only needs to
/// override what differs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LooperConfig {
    /// Starting tempo, clamped to `[40, 300]` on use.
    pub initial_bpm: u32,
    /// Fixed sample rate. The workspace hard-codes 44100 Hz downstream
    /// ([`looper_core::frame::SAMPLE_RATE`]); this field exists so a
    /// config file that names a different rate fails loudly rather
    /// than being silently ignored.
    pub sample_rate: u32,
    /// Round-trip capture latency, in seconds, compensated for in the
    /// mix engine's trim step.
    pub latency_seconds: f64,
    /// Fade-in/out duration applied at each take's loop seam.
    pub fade_time: f64,
    /// Sleep granularity for flag polling loops (capture daemon,
    /// playback producer, tempo-nudge hold-to-repeat).
    pub timing_precision: f64,
    /// Lead time the scheduler writes the next loop buffer ahead of
    /// the deadline, so the write is never late relative to the
    /// device callback's hunger for frames.
    pub play_blocking_delta: f64,
    /// Output callback block size, in frames.
    pub blocksize: usize,
    /// Depth of the playback producer's bounded block queue.
    pub buffersize: usize,
    /// Root directory new session directories are created under.
    pub recording_root: PathBuf,
    /// Path to the metronome click WAV file.
    pub click_path: PathBuf,
    /// BPM adjustment per hold-to-repeat tick while nudging tempo in
    /// `metronome`. A user-facing default, not a fixed invariant.
    pub tempo_nudge_step: i32,
    /// Lamp-on duration for the `pre_rec`/`pre_play` blink cadence, in
    /// seconds — the source's quarter note at 240 BPM, independent of
    /// the looper's own tempo.
    pub blink_on_time: f64,
}

impl Default for LooperConfig {
    fn default() -> Self {
        Self {
            initial_bpm: 100,
            sample_rate: 44_100,
            latency_seconds: 0.05,
            fade_time: 0.03,
            timing_precision: 1e-4,
            play_blocking_delta: 0.1,
            blocksize: 1024,
            buffersize: 20,
            recording_root: PathBuf::from("."),
            click_path: PathBuf::from("data/click.wav"),
            tempo_nudge_step: 2,
            blink_on_time: 60.0 / 240.0,
        }
    }
}

impl LooperConfig {
    /// Load from a JSON file if given, else fall back to the built-in
    /// defaults. Fields absent from the file keep their default value.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| DspError::InvalidConfig(format!("{}: {e}", path.display())))?;
                serde_json::from_str(&text).map_err(|e| DspError::InvalidConfig(format!("{}: {e}", path.display())))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.sample_rate != looper_core::frame::SAMPLE_RATE {
            return Err(DspError::InvalidConfig(format!(
                "configured sample_rate {} does not match the fixed {}",
                self.sample_rate,
                looper_core::frame::SAMPLE_RATE
            )));
        }
        if self.blocksize == 0 || self.buffersize == 0 {
            return Err(DspError::InvalidConfig("blocksize and buffersize must be nonzero".into()));
        }
        Ok(())
    }
}
