//! Per-take preprocessing and aggregate loop construction.
//!
//! This is the core overdub algorithm: each committed take is
//! quantised to a bar-aligned length, shifted to compensate for
//! round-trip latency, faded at both ends to kill the seam click, then
//! tiled and summed with every other committed take into one loop
//! buffer. Mirrors `Looper.trim`/`Looper.fade`/`Looper.update_loop` in
//! `examples/original_source/src/core.py`.

use looper_core::denormal::flush_denormal_f32;
use looper_core::frame::{Frame, SILENT_FRAME};

/// Trim/fade/aggregate takes into loop buffers.
///
/// A pure, stateless set of operations — no I/O, no thread. Owns no
/// state of its own; every method takes the parameters (samples per
/// beat, latency, fade length) it needs.
pub struct LoopMixEngine;

impl LoopMixEngine {
    /// Quantise a raw take to an integer number of beats and shift it
    /// left by `latency_samples` to align the acoustically captured
    /// note with the beat grid. Zero-pads if the source runs out.
    pub fn trim(raw: &[Frame], samples_per_beat: usize, latency_samples: usize) -> Vec<Frame> {
        let target_len = quantise_to_beats(raw.len().max(1), samples_per_beat);
        let mut trimmed = vec![SILENT_FRAME; target_len];

        let available = raw.len().saturating_sub(latency_samples);
        let copy_len = available.min(target_len);
        trimmed[..copy_len].copy_from_slice(&raw[latency_samples..latency_samples + copy_len]);

        trimmed
    }

    /// Apply a linear fade-in over the first `fade_samples` and a
    /// linear fade-out over the last `fade_samples`, in place.
    pub fn fade(take: &mut [Frame], fade_samples: usize) {
        let fade_samples = fade_samples.min(take.len());
        for (i, frame) in take[..fade_samples].iter_mut().enumerate() {
            let gain = i as f32 / fade_samples as f32;
            frame[0] *= gain;
            frame[1] *= gain;
        }

        let len = take.len();
        for (i, frame) in take[len - fade_samples..].iter_mut().enumerate() {
            let gain = i as f32 / fade_samples as f32;
            frame[0] *= gain;
            frame[1] *= gain;
        }
    }

    /// Trim then fade a raw take in one step — the engine's standard
    /// per-take preprocessing pipeline.
    pub fn preprocess(raw: &[Frame], samples_per_beat: usize, latency_samples: usize, fade_samples: usize) -> Vec<Frame> {
        let mut take = Self::trim(raw, samples_per_beat, latency_samples);
        Self::fade(&mut take, fade_samples);
        take
    }

    /// Tile `take` by whole-number repetition until it reaches (or
    /// exceeds, then is truncated to) `loop_len` frames.
    fn tile_to(take: &[Frame], loop_len: usize) -> Vec<Frame> {
        if take.is_empty() {
            return vec![SILENT_FRAME; loop_len];
        }
        let repetitions = (loop_len as f64 / take.len() as f64).round().max(1.0) as usize;
        let mut tiled = Vec::with_capacity(take.len() * repetitions);
        for _ in 0..repetitions {
            tiled.extend_from_slice(take);
        }
        tiled.resize(loop_len, SILENT_FRAME);
        tiled
    }

    /// Aggregate already-preprocessed takes into a fresh loop buffer:
    /// the longest take (rounded to a beat boundary) sets the loop
    /// length, every take is tiled to that length, and all are summed.
    ///
    /// `takes` must be non-empty; each entry is the output of
    /// [`Self::preprocess`].
    pub fn aggregate(takes: &[Vec<Frame>], samples_per_beat: usize) -> Vec<Frame> {
        let max_len = takes.iter().map(|t| t.len()).max().unwrap_or(0);
        let loop_len = quantise_to_beats(max_len.max(1), samples_per_beat);

        let mut loop_buffer = vec![SILENT_FRAME; loop_len];
        for take in takes {
            let tiled = Self::tile_to(take, loop_len);
            for (dst, src) in loop_buffer.iter_mut().zip(tiled.iter()) {
                dst[0] = flush_denormal_f32(dst[0] + src[0]);
                dst[1] = flush_denormal_f32(dst[1] + src[1]);
            }
        }
        loop_buffer
    }

    /// Build the transitional half-loop used for a mid-bar commit: the
    /// first half of `current_loop` (zeroed if this is the first take,
    /// dropping the metronome), summed with a trimmed/fade-in'd prefix
    /// of the in-progress take. Mirrors `half_end_recording` in
    /// `examples/original_source/src/core.py`.
    pub fn build_half_loop(
        current_loop: &[Frame],
        in_progress_take: &[Frame],
        is_first_take: bool,
        samples_per_beat: usize,
        latency_samples: usize,
        fade_samples: usize,
    ) -> Vec<Frame> {
        let half_len = current_loop.len() / 2;
        let mut half_loop = vec![SILENT_FRAME; half_len];
        if !is_first_take {
            half_loop.copy_from_slice(&current_loop[..half_len]);
        }

        let prefix_len = (half_len + latency_samples).min(in_progress_take.len());
        let raw_prefix = &in_progress_take[..prefix_len];
        let mut take = Self::trim(raw_prefix, samples_per_beat, latency_samples);
        let fade_in_samples = fade_samples.min(take.len());
        for (i, frame) in take[..fade_in_samples].iter_mut().enumerate() {
            let gain = i as f32 / fade_in_samples as f32;
            frame[0] *= gain;
            frame[1] *= gain;
        }

        let sum_len = half_len.min(take.len());
        for i in 0..sum_len {
            half_loop[i][0] = flush_denormal_f32(half_loop[i][0] + take[i][0]);
            half_loop[i][1] = flush_denormal_f32(half_loop[i][1] + take[i][1]);
        }

        half_loop
    }
}

fn quantise_to_beats(len: usize, samples_per_beat: usize) -> usize {
    if samples_per_beat == 0 {
        return len;
    }
    let beats = (len as f64 / samples_per_beat as f64).round().max(1.0) as usize;
    beats * samples_per_beat
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPB: usize = 100;

    fn tone(len: usize, amplitude: f32) -> Vec<Frame> {
        vec![[amplitude, amplitude]; len]
    }

    #[test]
    fn trim_quantises_to_nearest_beat_multiple() {
        let raw = tone(250, 1.0);
        let trimmed = LoopMixEngine::trim(&raw, SPB, 0);
        assert_eq!(trimmed.len() % SPB, 0);
        assert_eq!(trimmed.len(), 200);
    }

    #[test]
    fn trim_shifts_left_by_latency() {
        let mut raw = vec![SILENT_FRAME; 220];
        raw[50] = [1.0, 1.0];
        let trimmed = LoopMixEngine::trim(&raw, SPB, 50);
        // the impulse at index 50 should now sit at index 0
        assert_eq!(trimmed[0], [1.0, 1.0]);
    }

    #[test]
    fn trim_zero_pads_when_source_runs_out() {
        let raw = tone(120, 1.0);
        let trimmed = LoopMixEngine::trim(&raw, SPB, 50);
        assert_eq!(trimmed.len(), 100);
        // only 70 samples of real data after the latency shift
        assert_eq!(trimmed[69], [1.0, 1.0]);
        assert_eq!(trimmed[70], SILENT_FRAME);
    }

    #[test]
    fn fade_ramps_first_and_last_samples_to_zero() {
        let mut take = tone(100, 1.0);
        LoopMixEngine::fade(&mut take, 10);
        assert_eq!(take[0], SILENT_FRAME);
        assert_eq!(take[99], SILENT_FRAME);
        assert!(take[50][0] > 0.99);
    }

    #[test]
    fn aggregate_quantisation_uses_longest_take() {
        let t1 = LoopMixEngine::preprocess(&tone(200, 1.0), SPB, 0, 10);
        let t2 = LoopMixEngine::preprocess(&tone(450, 1.0), SPB, 0, 10);
        let loop_buffer = LoopMixEngine::aggregate(&[t1, t2], SPB);
        // max raw len 450 -> round(450/100)*100 = 500
        assert_eq!(loop_buffer.len(), 500);
    }

    #[test]
    fn aggregate_is_idempotent() {
        let t1 = LoopMixEngine::preprocess(&tone(300, 0.6), SPB, 10, 10);
        let t2 = LoopMixEngine::preprocess(&tone(300, 0.3), SPB, 10, 10);
        let first = LoopMixEngine::aggregate(&[t1.clone(), t2.clone()], SPB);
        let second = LoopMixEngine::aggregate(&[t1, t2], SPB);
        assert_eq!(first, second);
    }

    #[test]
    fn aggregate_sums_overdubbed_takes() {
        let t1 = LoopMixEngine::preprocess(&tone(400, 0.2), SPB, 0, 0);
        let t2 = LoopMixEngine::preprocess(&tone(400, 0.3), SPB, 0, 0);
        let loop_buffer = LoopMixEngine::aggregate(&[t1, t2], SPB);
        assert!((loop_buffer[200][0] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn half_loop_drops_metronome_on_first_take() {
        let current_loop = tone(400, 1.0); // pretend this is the metronome loop
        let in_progress = tone(300, 0.5);
        let half = LoopMixEngine::build_half_loop(&current_loop, &in_progress, true, SPB, 0, 10);
        assert_eq!(half.len(), 200);
        // no metronome contribution; only the (faded-in) take should show up
        assert!(half[199][0] > 0.0);
        assert!(half[199][0] <= 0.5);
    }

    #[test]
    fn half_loop_keeps_metronome_on_overdub() {
        let current_loop = tone(400, 0.4);
        let in_progress = tone(300, 0.0);
        let half = LoopMixEngine::build_half_loop(&current_loop, &in_progress, false, SPB, 0, 10);
        assert!((half[199][0] - 0.4).abs() < 1e-5);
    }
}
