//! Low-level error type shared by the crates that have no richer
//! domain of their own (the ring buffer, the frame helpers).
//!
//! Higher-level crates (`looper_dsp`, `looper_file`, `looper_audio`)
//! define their own error enums and do not funnel through this one;
//! this type exists for the handful of fallible operations that live
//! in `looper_core` itself.

use std::fmt;

/// Error codes for looper_core operations.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LooperError {
    /// An invalid parameter value was provided.
    InvalidParameter,
    /// An invalid buffer size was specified.
    InvalidBufferSize,
}

impl fmt::Display for LooperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LooperError::InvalidParameter => write!(f, "invalid parameter"),
            LooperError::InvalidBufferSize => write!(f, "invalid buffer size"),
        }
    }
}

impl std::error::Error for LooperError {}

/// Result type alias for looper_core operations.
pub type Result<T> = std::result::Result<T, LooperError>;
