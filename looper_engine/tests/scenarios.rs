//! End-to-end scenarios S1-S6, exercised against the mix engine,
//! metronome generator, and control-state table directly rather than
//! real audio hardware (S6's four-button shutdown is exercised at the
//! stop-flag level for the same reason). Sample rate 44100, BPM 120:
//! `seconds_per_beat = 0.5`, `samples_per_beat = 22050`, one bar =
//! 88200 frames.

use looper_core::flag::Flag;
use looper_core::frame::Frame;
use looper_dsp::{LoopMixEngine, MetronomeGenerator};
use looper_engine::state::{self, ControlState, Trigger};

const SAMPLES_PER_BEAT: usize = 22_050;
const BAR_SAMPLES: usize = SAMPLES_PER_BEAT * 4;

fn tone(len: usize, amplitude: f32) -> Vec<Frame> {
    vec![[amplitude, amplitude]; len]
}

/// S1: metronome-only playback repeats a one-bar click buffer whose
/// beat-0 peak is twice beats 1-3's peak.
#[test]
fn s1_metronome_only_loop_has_accented_downbeat() {
    let click = tone(200, 0.8);
    let metronome = MetronomeGenerator::from_click(click);
    let bar = metronome.build_bar(SAMPLES_PER_BEAT);
    assert_eq!(bar.len(), BAR_SAMPLES);

    // Four seconds of looped playback at 120 BPM is two bars; tiling
    // the one-bar buffer must reproduce the same beat-0/other ratio
    // every repetition.
    let four_seconds_of_frames = (4.0 * 44_100.0) as usize;
    let mut played = Vec::with_capacity(four_seconds_of_frames);
    while played.len() < four_seconds_of_frames {
        played.extend_from_slice(&bar);
    }
    played.truncate(four_seconds_of_frames);

    let beat0_peak = played[..SAMPLES_PER_BEAT].iter().map(|f| f[0].abs()).fold(0.0_f32, f32::max);
    let beat1_peak = played[SAMPLES_PER_BEAT..2 * SAMPLES_PER_BEAT].iter().map(|f| f[0].abs()).fold(0.0_f32, f32::max);
    assert!((beat0_peak - 2.0 * beat1_peak).abs() < 1e-6);
}

/// S2: a single bar-aligned take commits to a 176400-frame loop (two
/// bars), and the metronome is no longer part of the mix (only the
/// take's own preprocessed content contributes).
#[test]
fn s2_single_bar_aligned_take_commits_to_two_bars() {
    let raw_take = tone(2 * BAR_SAMPLES, 0.4);
    let preprocessed = LoopMixEngine::preprocess(&raw_take, SAMPLES_PER_BEAT, 0, 0);
    assert_eq!(preprocessed.len(), 2 * BAR_SAMPLES);

    let loop_buffer = LoopMixEngine::aggregate(&[preprocessed], SAMPLES_PER_BEAT);
    assert_eq!(loop_buffer.len(), 176_400);
}

/// S3: ending the recording mid-bar builds a transitional half-loop
/// that drops the metronome (this is the first take) and carries only
/// the newly captured, faded-in audio.
#[test]
fn s3_mid_bar_commit_drops_the_metronome_and_carries_the_new_take() {
    let metronome_loop = tone(BAR_SAMPLES, 1.0); // what's currently playing
    let in_progress_take = tone(BAR_SAMPLES / 2 + 4_000, 0.6); // captured so far

    let half_loop =
        LoopMixEngine::build_half_loop(&metronome_loop, &in_progress_take, true, SAMPLES_PER_BEAT, 0, 1_323);

    assert_eq!(half_loop.len(), BAR_SAMPLES / 2);
    // No metronome bleed-through: well past the fade-in ramp, the
    // half-loop should be carrying only the take's own amplitude.
    let settled = half_loop[half_loop.len() - 10];
    assert!((settled[0] - 0.6).abs() < 1e-5, "expected the take's own level, got {settled:?}");
}

/// S4: overdubbing a second take onto an already-committed one keeps
/// the aggregate loop at the same bar-aligned length and sums both
/// tones' amplitudes.
#[test]
fn s4_overdub_sums_two_committed_takes() {
    let first_raw = tone(2 * BAR_SAMPLES, 0.4);
    let second_raw = tone(2 * BAR_SAMPLES, 0.25);

    let first = LoopMixEngine::preprocess(&first_raw, SAMPLES_PER_BEAT, 0, 0);
    let second = LoopMixEngine::preprocess(&second_raw, SAMPLES_PER_BEAT, 0, 0);

    let loop_buffer = LoopMixEngine::aggregate(&[first, second], SAMPLES_PER_BEAT);
    assert_eq!(loop_buffer.len(), 176_400);

    let midpoint = loop_buffer.len() / 2;
    assert!((loop_buffer[midpoint][0] - 0.65).abs() < 1e-5);
}

/// S5: arming a recording and then cancelling with `release_back`
/// returns to `play` without ever reaching a state that would commit
/// a take; the session's take count therefore never needs to move
/// off zero.
#[test]
fn s5_cancel_during_pre_rec_returns_to_play_with_no_takes() {
    let mut takes_committed = 0u32;
    let mut current = ControlState::Metronome;

    current = state::transition(current, Trigger::ReleasePlay).unwrap();
    assert_eq!(current, ControlState::Play);

    current = state::transition(current, Trigger::ReleaseRec).unwrap();
    assert_eq!(current, ControlState::PreRec);

    current = state::transition(current, Trigger::StartRecording).unwrap();
    assert_eq!(current, ControlState::Rec);

    // hold `back`: cancel, never reaching `pre_play`/`EndRecording`
    // where a commit would increment `takes_committed`.
    assert!(state::is_cancellable(current));
    current = state::transition(current, Trigger::ReleaseBack).unwrap();
    assert_eq!(current, ControlState::Play);

    assert_eq!(takes_committed, 0);
}

/// S6: holding all four buttons transitions to `out_of_use` from any
/// state and is the signal the capture/playback daemons use to stop
/// on their next wakeup (modeled here as a `Flag`, since the real
/// daemons observe a `Flag` of the same shape).
#[test]
fn s6_four_button_shutdown_reaches_out_of_use_and_raises_the_stop_flag() {
    let stop_flag = Flag::new();
    assert!(!stop_flag.is_set());

    for state in [ControlState::Metronome, ControlState::Play, ControlState::Rec, ControlState::PrePlay] {
        let next = state::transition(state, Trigger::Shutdown).unwrap();
        assert_eq!(next, ControlState::OutOfUse);
    }

    stop_flag.set();
    assert!(stop_flag.is_set(), "capture/playback daemons must observe the stop flag raised");
}
