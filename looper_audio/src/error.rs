//! Error type for the audio I/O adapter, capture/playback daemons, and
//! scheduler.

use thiserror::Error;

/// A specialized [`Result`] type for `looper_audio` operations.
pub type Result<T> = std::result::Result<T, AudioError>;

/// Errors surfaced by the audio I/O adapter and its daemons.
///
/// `DeviceRateMismatch` is fatal at construction;
/// `OutputUnderflow`/`InputOverflow` are logged at the detection site
/// and never propagated as `Err` — they exist here only so tests can
/// assert on the condition a daemon observed.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("device default sample rate {actual} does not match the required {expected}")]
    DeviceRateMismatch { expected: u32, actual: u32 },

    #[error("no audio output device available")]
    NoOutputDevice,

    #[error("no audio input device available")]
    NoInputDevice,

    #[error("failed to build {stream} stream: {source}")]
    StreamBuildFailed {
        stream: &'static str,
        #[source]
        source: cpal::BuildStreamError,
    },

    #[error("failed to start {stream} stream: {source}")]
    StreamPlayFailed {
        stream: &'static str,
        #[source]
        source: cpal::PlayStreamError,
    },

    #[error("output underflow: playback queue empty at callback time")]
    OutputUnderflow,

    #[error("input overflow: capture callback reported an overrun")]
    InputOverflow,

    #[error(transparent)]
    File(#[from] looper_file::FileError),
}
