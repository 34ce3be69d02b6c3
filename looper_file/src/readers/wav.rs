//! WAV file reader via `wavers`, fixed to the looper's stereo f32 format.

use std::path::Path;

use looper_core::frame::{Frame, NUM_CHANNELS, SAMPLE_RATE};
use wavers::Wav;

use crate::error::{FileError, Result};

/// Loads an entire WAV file into memory as a sequence of [`Frame`]s.
///
/// Takes and playback backing stores are short (a handful of bars),
/// so loading in full on open — rather than streaming — keeps the
/// reader simple.
pub struct WavFileReader {
    frames: Vec<Frame>,
}

impl WavFileReader {
    /// Open a stereo, 44100 Hz WAV file.
    ///
    /// Returns [`FileError::SampleRateMismatch`] if the file's sample
    /// rate differs, and [`FileError::InvalidWavFile`] if it is not
    /// stereo.
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader: Wav<f32> = Wav::from_path(path).map_err(|e| FileError::InvalidWavFile(e.to_string()))?;

        let sample_rate = reader.sample_rate() as u32;
        if sample_rate != SAMPLE_RATE {
            return Err(FileError::SampleRateMismatch {
                expected: SAMPLE_RATE,
                actual: sample_rate,
            });
        }

        let num_channels = reader.n_channels() as usize;
        if num_channels != NUM_CHANNELS {
            return Err(FileError::InvalidWavFile(format!(
                "expected {NUM_CHANNELS} channels, found {num_channels}"
            )));
        }

        let channels: Vec<Vec<f32>> = reader.channels().map(|c| c.iter().copied().collect()).collect();
        let num_frames = channels[0].len();
        let mut frames = Vec::with_capacity(num_frames);
        for i in 0..num_frames {
            frames.push([channels[0][i], channels[1][i]]);
        }

        Ok(Self { frames })
    }

    /// The loaded frames.
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    /// Borrow the loaded frames without consuming the reader.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use std::io::BufWriter;

    use hound::{SampleFormat, WavSpec, WavWriter};
    use tempfile::NamedTempFile;

    use super::*;

    fn write_test_wav(sample_rate: u32, num_channels: u16, left: &[f32], right: &[f32]) -> NamedTempFile {
        let temp_file = NamedTempFile::new().unwrap();
        let spec = WavSpec {
            channels: num_channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::new(BufWriter::new(temp_file.reopen().unwrap()), spec).unwrap();
        for i in 0..left.len() {
            writer.write_sample(left[i]).unwrap();
            if num_channels == 2 {
                writer.write_sample(right[i]).unwrap();
            }
        }
        writer.finalize().unwrap();
        temp_file
    }

    #[test]
    fn reads_stereo_frames_back() {
        let left = [0.1, 0.2, 0.3, -0.4, -0.5];
        let right = [-0.1, -0.2, -0.3, 0.4, 0.5];
        let temp_file = write_test_wav(44100, 2, &left, &right);

        let reader = WavFileReader::open(temp_file.path()).unwrap();
        assert_eq!(reader.frames().len(), left.len());
        for (i, frame) in reader.frames().iter().enumerate() {
            assert!((frame[0] - left[i]).abs() < 1e-6);
            assert!((frame[1] - right[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn rejects_wrong_sample_rate() {
        let temp_file = write_test_wav(48000, 2, &[0.0; 4], &[0.0; 4]);
        let result = WavFileReader::open(temp_file.path());
        assert!(matches!(result, Err(FileError::SampleRateMismatch { .. })));
    }

    #[test]
    fn rejects_mono_files() {
        let temp_file = write_test_wav(44100, 1, &[0.0; 4], &[0.0; 4]);
        let result = WavFileReader::open(temp_file.path());
        assert!(matches!(result, Err(FileError::InvalidWavFile(_))));
    }

    #[test]
    fn rejects_nonexistent_path() {
        let result = WavFileReader::open(Path::new("/nonexistent/path/audio.wav"));
        assert!(result.is_err());
    }
}
