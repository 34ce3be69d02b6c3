//! Error type for the hardware control surface.

use std::fmt;

/// Error codes for `looper_hw` operations.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HwError {
    /// The requested button or lamp name is not one of the four
    /// recognised identifiers (`rec`, `play`, `back`, `forw`).
    UnknownControl,
}

impl fmt::Display for HwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HwError::UnknownControl => write!(f, "unknown button or lamp identifier"),
        }
    }
}

impl std::error::Error for HwError {}

/// Result type alias for `looper_hw` operations.
pub type Result<T> = std::result::Result<T, HwError>;
