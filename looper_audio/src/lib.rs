//! `cpal`-backed audio I/O, the capture and playback daemons, and the
//! wall-clock scheduler for the looper engine.
//!
//! The realtime audio callbacks never allocate or block: they hand
//! frames off across [`looper_core::spsc`] queues to the daemons in
//! this crate, which do all the filesystem and timing work on
//! ordinary threads.

pub mod capture;
pub mod device;
mod error;
pub mod playback;
pub mod scheduler;

pub use capture::CaptureDaemon;
pub use device::AudioIo;
pub use error::{AudioError, Result};
pub use playback::{PlaybackDaemon, SideFlag};
pub use scheduler::{Scheduler, TimerHandle};
