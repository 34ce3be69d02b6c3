//! # looper_engine
//!
//! The control-state machine, the orchestration layer that wires the
//! DSP, file and audio crates together into one running looper
//! instance, and the CLI binary (`src/main.rs`) that boots it against
//! real hardware or the in-memory `looper_hw::sim` backend.

pub mod error;
pub mod looper;
pub mod state;

pub use error::{EngineError, Result};
pub use looper::Looper;
pub use state::{ControlState, Trigger};
