//! # looper_core
//!
//! Foundational mechanisms shared across the looper workspace: the
//! lock-free SPSC ring buffer used for realtime thread handoff, the
//! atomic [`Flag`] used for level-triggered thread signaling, denormal
//! flushing, and the concrete stereo [`Frame`] type the rest of the
//! workspace builds on.

pub mod denormal;
pub mod error;
pub mod flag;
pub mod frame;
pub mod spsc;

pub use denormal::{flush_denormal_f32, flush_denormal_f64};
pub use error::{LooperError, Result};
pub use flag::Flag;
pub use frame::{Frame, SILENT_FRAME};
pub use spsc::{Consumer, Producer, SpscRingBuffer};
