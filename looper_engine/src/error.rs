//! Aggregate error type for the looper engine binary and its
//! orchestration layer.

use thiserror::Error;

use crate::state::IllegalTransition;

/// A specialized [`Result`] type for `looper_engine` operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Every failure mode the engine's construction and run loop can
/// surface, aggregated from the crates it orchestrates.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Audio(#[from] looper_audio::AudioError),

    #[error(transparent)]
    Dsp(#[from] looper_dsp::DspError),

    #[error(transparent)]
    File(#[from] looper_file::FileError),

    #[error(transparent)]
    Hardware(#[from] looper_hw::HwError),

    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),
}
