//! Metronome click-buffer generation.
//!
//! Builds the one-bar (4/4) click loop that plays while in
//! [`crate::clock`]'s owner state is `metronome` and no take has been
//! committed yet: beat 0 at unity gain, beats 1-3 at half gain.

use looper_core::frame::Frame;
use looper_file::WavFileReader;

use crate::error::{DspError, Result};

/// Loads a short click sample and expands it into one-bar loop buffers.
pub struct MetronomeGenerator {
    /// The click, normalized to its own peak, same sample rate as the
    /// rest of the workspace.
    click: Vec<Frame>,
}

impl MetronomeGenerator {
    /// Load a click sample from a WAV file and normalize it to unity
    /// peak (the source's `metronome_sound /= np.amax(metronome_sound)`,
    /// so S1's "beat 0 is 2x beat {1,2,3}" property holds regardless of
    /// the original file's recorded level).
    pub fn from_click_file(path: &std::path::Path) -> Result<Self> {
        let reader =
            WavFileReader::open(path).map_err(|e| DspError::ClickLoadFailed(format!("{}: {e}", path.display())))?;
        let mut click = reader.into_frames();
        if click.is_empty() {
            return Err(DspError::ClickLoadFailed(format!("{} is empty", path.display())));
        }

        let peak = click
            .iter()
            .flat_map(|frame| frame.iter())
            .fold(0.0_f32, |acc, &sample| acc.max(sample.abs()));
        if peak > 0.0 {
            for frame in &mut click {
                frame[0] /= peak;
                frame[1] /= peak;
            }
        }

        Ok(Self { click })
    }

    /// Build directly from an already-loaded (and ideally normalized)
    /// click buffer. Used by tests that don't want to touch the
    /// filesystem.
    pub fn from_click(click: Vec<Frame>) -> Self {
        Self { click }
    }

    /// One beat's worth of click, scaled by `gain`, zero-padded or
    /// truncated to exactly `samples_per_beat` frames.
    fn beat_buffer(&self, samples_per_beat: usize, gain: f32) -> Vec<Frame> {
        let mut beat = vec![[0.0, 0.0]; samples_per_beat];
        let take = self.click.len().min(samples_per_beat);
        for (dst, src) in beat[..take].iter_mut().zip(&self.click[..take]) {
            dst[0] = src[0] * gain;
            dst[1] = src[1] * gain;
        }
        beat
    }

    /// Build a one-bar (four-beat) click loop at the given tempo: beat
    /// 0 at unity gain, beats 1-3 at half gain.
    pub fn build_bar(&self, samples_per_beat: usize) -> Vec<Frame> {
        let mut bar = Vec::with_capacity(samples_per_beat * 4);
        bar.extend(self.beat_buffer(samples_per_beat, 1.0));
        for _ in 0..3 {
            bar.extend(self.beat_buffer(samples_per_beat, 0.5));
        }
        bar
    }
}
