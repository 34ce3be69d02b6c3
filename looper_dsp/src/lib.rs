//! # looper_dsp
//!
//! The non-realtime-I/O half of the looper's signal path: the beat
//! clock, the metronome generator, per-take preprocessing (trim,
//! latency-compensate, fade), the aggregate loop mix engine, and the
//! JSON-deserializable runtime configuration.

pub mod clock;
pub mod config;
pub mod error;
pub mod metronome;
pub mod mix;
pub mod take;

pub use clock::BeatClock;
pub use config::LooperConfig;
pub use error::{DspError, Result};
pub use metronome::MetronomeGenerator;
pub use mix::LoopMixEngine;
pub use take::Take;
