//! Beat clock: tempo and the wall-clock anchor for bar boundaries.
//!
//! A pure value type with derived quantities; it performs no I/O and
//! owns no thread. The scheduler and control state machine consult it
//! to compute absolute fire times and to decide whether a BPM edit is
//! still legal.

use std::time::{Duration, Instant};

use looper_core::frame::SAMPLE_RATE;

/// Lowest BPM the tempo-nudge clamp allows.
pub const MIN_BPM: u32 = 40;
/// Highest BPM the tempo-nudge clamp allows.
pub const MAX_BPM: u32 = 300;

/// Tempo and loop-boundary bookkeeping.
///
/// `bpm` is mutable only before the first take commits; callers are
/// responsible for enforcing that (`looper_engine::state` does, per
/// invariant 3).
#[derive(Debug, Clone)]
pub struct BeatClock {
    bpm: u32,
    anchor: Instant,
    loop_time_seconds: f64,
    time_at_end_of_current_loop: Instant,
}

impl BeatClock {
    /// Start a clock at `bpm`, anchored to `now` with a one-bar loop.
    pub fn new(bpm: u32, now: Instant) -> Self {
        let bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        let loop_time_seconds = Self::bar_seconds(bpm);
        Self {
            bpm,
            anchor: now,
            loop_time_seconds,
            time_at_end_of_current_loop: now + Duration::from_secs_f64(loop_time_seconds),
        }
    }

    fn bar_seconds(bpm: u32) -> f64 {
        4.0 * (60.0 / bpm as f64)
    }

    /// Current BPM.
    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// Set the BPM, clamped to `[MIN_BPM, MAX_BPM]`. Recomputes the
    /// bar duration but does not move the anchor; callers only do this
    /// in `ControlState::Metronome`, before any take is committed.
    pub fn set_bpm(&mut self, bpm: u32) {
        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        self.loop_time_seconds = Self::bar_seconds(self.bpm);
    }

    /// Nudge the BPM by `delta` (may be negative), clamped.
    pub fn nudge_bpm(&mut self, delta: i32) {
        let next = (self.bpm as i32 + delta).clamp(MIN_BPM as i32, MAX_BPM as i32);
        self.set_bpm(next as u32);
    }

    /// Seconds per beat at the current BPM.
    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm as f64
    }

    /// Samples per beat at the current BPM and the fixed sample rate.
    pub fn samples_per_beat(&self) -> usize {
        (SAMPLE_RATE as f64 * self.seconds_per_beat()).round() as usize
    }

    /// Samples in one bar (four beats).
    pub fn bar_samples(&self) -> usize {
        self.samples_per_beat() * 4
    }

    /// Seconds in one loop (currently always one bar).
    pub fn loop_time_seconds(&self) -> f64 {
        self.loop_time_seconds
    }

    /// The absolute instant the current loop is scheduled to end.
    pub fn time_at_end_of_current_loop(&self) -> Instant {
        self.time_at_end_of_current_loop
    }

    /// Time remaining until the next loop boundary, relative to `now`.
    /// Saturates at zero rather than going negative.
    pub fn time_to_next_loop_start(&self, now: Instant) -> Duration {
        self.time_at_end_of_current_loop.saturating_duration_since(now)
    }

    /// Advance the loop-end anchor by one loop duration.
    ///
    /// Always computed from the previous anchor, never by accumulating
    /// from "now" — this is what keeps the scheduler from drifting
    /// across reschedules, and is also how a `TimerMissed` recovery
    /// re-anchors (spec section on error handling).
    pub fn advance_by_loop(&mut self) {
        self.anchor = self.time_at_end_of_current_loop;
        self.time_at_end_of_current_loop = self.anchor + Duration::from_secs_f64(self.loop_time_seconds);
    }

    /// The instant halfway through the current loop (used to schedule
    /// the mid-bar half-commit).
    pub fn time_at_loop_midpoint(&self) -> Instant {
        self.anchor + Duration::from_secs_f64(self.loop_time_seconds / 2.0)
    }
}
