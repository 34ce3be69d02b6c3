//! Integration tests for the per-take preprocessing and aggregation
//! pipeline, exercising the properties a committed take set must
//! satisfy regardless of how many takes are layered.

use looper_core::frame::Frame;
use looper_dsp::LoopMixEngine;

const SAMPLES_PER_BEAT: usize = 22_050; // 120 BPM at 44100 Hz

fn tone(len: usize, amplitude: f32) -> Vec<Frame> {
    vec![[amplitude, amplitude]; len]
}

fn impulse_take(total_len: usize, impulse_at: usize) -> Vec<Frame> {
    let mut take = vec![[0.0, 0.0]; total_len];
    take[impulse_at] = [1.0, 1.0];
    take
}

#[test]
fn quantisation_rounds_to_the_longest_takes_beat_multiple() {
    let raw_lengths = [30_000usize, 50_123, 88_200];
    let preprocessed: Vec<Vec<Frame>> =
        raw_lengths.iter().map(|&len| LoopMixEngine::preprocess(&tone(len, 0.5), SAMPLES_PER_BEAT, 0, 0)).collect();

    let loop_buffer = LoopMixEngine::aggregate(&preprocessed, SAMPLES_PER_BEAT);

    let expected_beats = (raw_lengths.iter().max().copied().unwrap() as f64 / SAMPLES_PER_BEAT as f64).round() as usize;
    assert_eq!(loop_buffer.len(), expected_beats * SAMPLES_PER_BEAT);
    assert_eq!(loop_buffer.len() % SAMPLES_PER_BEAT, 0);
}

#[test]
fn latency_compensation_shifts_an_impulse_back_by_latency_samples() {
    let latency_samples = 2_205; // 50 ms at 44100 Hz
    let impulse_at = latency_samples + 1_000;

    let raw = impulse_take(SAMPLES_PER_BEAT, impulse_at);
    let trimmed = LoopMixEngine::trim(&raw, SAMPLES_PER_BEAT, latency_samples);

    // The impulse recorded at `impulse_at` should now sit at
    // `impulse_at - latency_samples`, within one sample.
    let expected_index = impulse_at - latency_samples;
    let peak_index = trimmed.iter().position(|f| f[0] > 0.5).expect("impulse missing after trim");
    assert!(
        (peak_index as i64 - expected_index as i64).abs() <= 1,
        "expected impulse near {expected_index}, found at {peak_index}"
    );
}

#[test]
fn recomputing_the_same_takes_is_bit_identical() {
    let t1 = LoopMixEngine::preprocess(&tone(40_000, 0.3), SAMPLES_PER_BEAT, 2_205, 1_323);
    let t2 = LoopMixEngine::preprocess(&tone(88_200, 0.6), SAMPLES_PER_BEAT, 2_205, 1_323);

    let first = LoopMixEngine::aggregate(&[t1.clone(), t2.clone()], SAMPLES_PER_BEAT);
    let second = LoopMixEngine::aggregate(&[t1, t2], SAMPLES_PER_BEAT);

    assert_eq!(first, second, "aggregating the same committed takes twice must be bit-identical");
}

#[test]
fn fade_ramps_keep_the_loop_seam_within_epsilon() {
    let fade_samples = 1_323; // 30 ms at 44100 Hz
    let take = LoopMixEngine::preprocess(&tone(SAMPLES_PER_BEAT * 2, 1.0), SAMPLES_PER_BEAT, 0, fade_samples);
    let loop_buffer = LoopMixEngine::aggregate(&[take], SAMPLES_PER_BEAT);

    // Across the wrap (last sample -> first sample), the discontinuity
    // is bounded by the fade-out tail's last sample plus the fade-in
    // head's first sample, both of which are near-zero ramp endpoints.
    let last = loop_buffer.last().copied().unwrap();
    let first = loop_buffer.first().copied().unwrap();
    let epsilon = 2.0 / fade_samples as f32; // one ramp step on each side

    assert!((last[0] - first[0]).abs() <= epsilon, "seam discontinuity too large: {last:?} vs {first:?}");
    assert!(first[0] < epsilon, "fade-in should start near silence, got {first:?}");
    assert!(last[0] < epsilon, "fade-out should end near silence, got {last:?}");
}

#[test]
fn overdubbed_takes_sum_rather_than_replace() {
    let t1 = LoopMixEngine::preprocess(&tone(SAMPLES_PER_BEAT * 2, 0.2), SAMPLES_PER_BEAT, 0, 0);
    let t2 = LoopMixEngine::preprocess(&tone(SAMPLES_PER_BEAT * 2, 0.3), SAMPLES_PER_BEAT, 0, 0);

    let loop_buffer = LoopMixEngine::aggregate(&[t1, t2], SAMPLES_PER_BEAT);
    let midpoint = loop_buffer.len() / 2;

    assert!((loop_buffer[midpoint][0] - 0.5).abs() < 1e-5);
}
