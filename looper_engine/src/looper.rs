//! The looper's orchestration context: owns the audio I/O, the two
//! daemons, the scheduler, and every piece of state the control-state
//! table's entry actions and the bar-boundary commit chain touch.
//!
//! Mirrors the `Looper` class in `examples/original_source/src/core.py`,
//! split along this workspace's crate boundaries: [`looper_dsp`] does
//! the signal math, [`looper_file`] does the WAV/session I/O,
//! [`looper_audio`] does the realtime plumbing and scheduling. This
//! module is the glue that calls them in the right order.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use looper_audio::{AudioIo, CaptureDaemon, PlaybackDaemon, Scheduler, SideFlag, TimerHandle};
use looper_core::flag::Flag;
use looper_core::frame::{seconds_to_frames, Frame};
use looper_dsp::{BeatClock, LooperConfig, LoopMixEngine, MetronomeGenerator, Take};
use looper_file::{write_atomic, Session, WavFileReader};
use looper_hw::{Button, ButtonEdge, ButtonId, EdgeDetector, Lamp, LampBank};
use tracing::{debug, info, warn};

/// In-memory mirror of the frames the capture daemon has appended to
/// the temp recording file for the take currently in progress. Reading
/// this instead of reopening the temp WAV mid-take avoids racing
/// `hound`, which only patches the file's header with a correct length
/// at `finalize()`.
type CapturedSoFar = Arc<Mutex<Vec<Frame>>>;

use crate::error::Result;
use crate::state::{self, ControlState, Trigger};

/// Sleep between hold-to-repeat BPM nudges — the source's
/// `time.sleep(0.06)` inside `press_forw_button`/`press_back_button`.
const TEMPO_HOLD_INTERVAL: Duration = Duration::from_millis(60);

/// Poll interval for the button-edge loop in [`Looper::run`].
const BUTTON_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Everything the control-state machine and the bar-boundary commit
/// chain need, behind one lock. Scheduler callbacks run on the
/// scheduler's own thread and reach this through a cloned `Arc`, so
/// every field that a callback touches lives here rather than on
/// [`Looper`] itself.
struct Shared<L: Lamp> {
    state: ControlState,
    clock: BeatClock,
    config: LooperConfig,
    session: Session,
    metronome: MetronomeGenerator,
    takes: Vec<Take>,
    loop_buffer: Vec<Frame>,
    capture_flag: Flag,
    side_flag: SideFlag,
    lamps: LampBank<L>,
    audio: AudioIo,
    /// Which playback backing store is *not* currently being read by
    /// the playback daemon — the one safe to overwrite.
    inactive_side: usize,
    scheduler: Scheduler,
    /// Handle to the next scheduled [`on_bar_boundary`] call, so
    /// shutdown can cancel the recurring chain.
    next_boundary_timer: Option<TimerHandle>,
    /// In-memory mirror of the in-progress take, kept current by the
    /// capture daemon.
    captured: CapturedSoFar,
    /// The transitional half-loop built by [`half_end_recording`] at
    /// the midpoint of the bar a take is committed in. `None` until
    /// that timer fires; `pre_play`'s bar-boundary arm falls back to
    /// building it on the spot if the take commits before the timer
    /// does (a take shorter than half a bar).
    half_loop: Option<Vec<Frame>>,
    /// Handle to the mid-bar [`half_end_recording`] timer, so
    /// `release_back` or shutdown during `rec` can cancel it.
    half_commit_timer: Option<TimerHandle>,
}

/// Owns one looper instance end to end: construction opens the audio
/// devices and the first session, runs the metronome, and starts the
/// bar-boundary chain: after that, [`Looper::run`] just polls buttons.
pub struct Looper<L: Lamp + 'static> {
    shared: Arc<Mutex<Shared<L>>>,
    capture: Option<CaptureDaemon>,
    playback: Option<PlaybackDaemon>,
    stop_flag: Flag,
}

impl<L: Lamp + 'static> Looper<L> {
    /// Open audio devices, create a session, seed both playback
    /// backing stores with a one-bar metronome click, and start the
    /// capture/playback daemons, the scheduler, and the recurring
    /// bar-boundary chain. Enters [`ControlState::Metronome`].
    pub fn new(config: LooperConfig, lamps: LampBank<L>) -> Result<Self> {
        let (mut audio, input_consumer) = AudioIo::open()?;
        let session = Session::create(&config.recording_root)?;
        let metronome = MetronomeGenerator::from_click_file(&config.click_path)?;

        let clock = BeatClock::new(config.initial_bpm, Instant::now());
        let loop_buffer = metronome.build_bar(clock.samples_per_beat());

        write_atomic(&session.temp_playing_path(0), &loop_buffer)?;
        write_atomic(&session.temp_playing_path(1), &loop_buffer)?;

        let capture_flag = Flag::new();
        let side_flag = SideFlag::new_with(false);
        let stop_flag = Flag::new();
        let captured: CapturedSoFar = Arc::new(Mutex::new(Vec::new()));

        let poll_interval = Duration::from_secs_f64(config.timing_precision);
        let capture = CaptureDaemon::spawn(
            input_consumer,
            capture_flag.clone(),
            stop_flag.clone(),
            session.temp_recording_path(),
            poll_interval,
            Arc::clone(&captured),
        );

        let block_timeout = Duration::from_secs_f64(
            config.blocksize as f64 / looper_core::frame::SAMPLE_RATE as f64,
        );
        let (playback, output_consumer) = PlaybackDaemon::spawn(
            side_flag.clone(),
            stop_flag.clone(),
            [session.temp_playing_path(0), session.temp_playing_path(1)],
            config.blocksize,
            config.buffersize,
            block_timeout,
        );
        audio.start_playback_callback(output_consumer)?;

        let scheduler = Scheduler::start();

        let shared = Arc::new(Mutex::new(Shared {
            state: ControlState::Metronome,
            clock,
            config,
            session,
            metronome,
            takes: Vec::new(),
            loop_buffer,
            capture_flag,
            side_flag,
            lamps,
            audio,
            inactive_side: 1,
            scheduler,
            next_boundary_timer: None,
            captured,
            half_loop: None,
            half_commit_timer: None,
        }));

        apply_entry_actions(&mut shared.lock().unwrap(), ControlState::Metronome);
        schedule_bar_boundary(&shared);

        Ok(Self { shared, capture: Some(capture), playback: Some(playback), stop_flag })
    }

    /// Current control state.
    pub fn state(&self) -> ControlState {
        self.shared.lock().unwrap().state
    }

    /// Apply a button-release trigger to the state machine, running
    /// whatever entry actions the resulting state transition implies.
    /// `release_back`'s cancellation (clearing the capture flag) is
    /// applied here rather than in [`state::transition`], which stays
    /// a pure function of the table alone.
    pub fn dispatch(&self, trigger: Trigger) -> Result<()> {
        let current = self.shared.lock().unwrap().state;
        let next = state::transition(current, trigger)?;

        if trigger == Trigger::ReleaseBack && state::is_cancellable(current) {
            let mut guard = self.shared.lock().unwrap();
            guard.capture_flag.clear();
            if let Some(timer) = guard.half_commit_timer.take() {
                timer.cancel();
            }
            guard.half_loop = None;
            drop(guard);
            info!(?current, "release_back cancelled the in-progress take");
        }

        if next != current {
            apply_entry_actions(&mut self.shared.lock().unwrap(), next);
        }

        if next == ControlState::OutOfUse {
            self.stop_flag.set();
        }

        Ok(())
    }

    /// Hold-to-repeat BPM nudging while `back`/`forw` is held in
    /// `metronome`. Mirrors `press_back_button`/`press_forw_button`:
    /// busy-loops at [`TEMPO_HOLD_INTERVAL`] while the button stays
    /// down and the state is still `metronome`.
    fn handle_tempo_hold(&self, delta: i32, mut is_active: impl FnMut() -> bool) {
        loop {
            {
                let mut guard = self.shared.lock().unwrap();
                if guard.state != ControlState::Metronome {
                    return;
                }
                guard.clock.nudge_bpm(delta);
                debug!(bpm = guard.clock.bpm(), "tempo nudged");
            }
            if !is_active() {
                return;
            }
            std::thread::sleep(TEMPO_HOLD_INTERVAL);
        }
    }

    /// Poll the four buttons at [`BUTTON_POLL_INTERVAL`] until a
    /// four-button shutdown is requested or the engine is otherwise
    /// stopped. `buttons` must be ordered `[rec, play, back, forw]`.
    pub fn run<B: Button>(&mut self, buttons: [B; 4]) {
        let [rec, play, back, forw] = buttons;
        let mut detectors =
            [EdgeDetector::new(rec), EdgeDetector::new(play), EdgeDetector::new(back), EdgeDetector::new(forw)];

        loop {
            if self.stop_flag.is_set() {
                break;
            }

            if detectors.iter().all(|d| d.is_active()) {
                info!("all four buttons held, requesting shutdown");
                let _ = self.dispatch(Trigger::Shutdown);
                break;
            }

            let edges: Vec<ButtonEdge> = detectors.iter_mut().filter_map(|d| d.poll()).collect();
            for edge in edges {
                match edge {
                    ButtonEdge::Release(ButtonId::Play) => {
                        let _ = self.dispatch(Trigger::ReleasePlay);
                    }
                    ButtonEdge::Release(ButtonId::Rec) => {
                        let _ = self.dispatch(Trigger::ReleaseRec);
                    }
                    ButtonEdge::Release(ButtonId::Back) => {
                        let _ = self.dispatch(Trigger::ReleaseBack);
                    }
                    ButtonEdge::Press(ButtonId::Forw) => {
                        let step = self.shared.lock().unwrap().config.tempo_nudge_step;
                        let button = detectors[3].button();
                        self.handle_tempo_hold(step, || button.is_active());
                    }
                    ButtonEdge::Press(ButtonId::Back) => {
                        let step = self.shared.lock().unwrap().config.tempo_nudge_step;
                        let button = detectors[2].button();
                        self.handle_tempo_hold(-step, || button.is_active());
                    }
                    ButtonEdge::Release(ButtonId::Forw) | ButtonEdge::Press(_) => {}
                }
            }

            std::thread::sleep(BUTTON_POLL_INTERVAL);
        }
    }

    /// Cancel the bar-boundary chain and join both daemons. Idempotent
    /// after the first call only in the sense that a second call joins
    /// `None` handles and does nothing.
    pub fn shutdown(&mut self) {
        self.stop_flag.set();
        apply_entry_actions(&mut self.shared.lock().unwrap(), ControlState::OutOfUse);
        if let Some(capture) = self.capture.take() {
            capture.join();
        }
        if let Some(playback) = self.playback.take() {
            playback.join();
        }
    }
}

/// Run every state's entry action: all lamps off, then the one
/// steady-on or blinking lamp the new state calls for, one match arm
/// per state. `OutOfUse` additionally cancels the bar-boundary chain
/// and stops the output stream.
fn apply_entry_actions<L: Lamp>(shared: &mut Shared<L>, next: ControlState) {
    shared.state = next;
    shared.lamps.all_off();

    match next {
        ControlState::Metronome => {
            shared.lamps.back.on();
            shared.lamps.forw.on();
        }
        ControlState::Play => {
            shared.lamps.play.on();
        }
        ControlState::Rec => {
            shared.lamps.rec.on();
        }
        ControlState::PreRec => {
            let on_time = blink_on_time(shared);
            shared.lamps.rec.blink(on_time, blink_off_time(shared, on_time));
        }
        ControlState::PrePlay => {
            let on_time = blink_on_time(shared);
            shared.lamps.play.blink(on_time, blink_off_time(shared, on_time));
        }
        ControlState::OutOfUse => {
            if let Some(timer) = shared.next_boundary_timer.take() {
                timer.cancel();
            }
            if let Some(timer) = shared.half_commit_timer.take() {
                timer.cancel();
            }
            shared.audio.stop_playback_callback();
            shared.scheduler.shutdown();
        }
    }

    debug!(?next, "entered control state");
}

fn blink_on_time<L: Lamp>(shared: &Shared<L>) -> Duration {
    Duration::from_secs_f64(shared.config.blink_on_time)
}

fn blink_off_time<L: Lamp>(shared: &Shared<L>, on_time: Duration) -> Duration {
    let beat = Duration::from_secs_f64(shared.clock.seconds_per_beat());
    beat.saturating_sub(on_time)
}

/// Arm the next [`on_bar_boundary`] fire at the clock's current loop
/// end, storing the handle so shutdown can cancel it.
fn schedule_bar_boundary<L: Lamp + 'static>(shared: &Arc<Mutex<Shared<L>>>) {
    let (fire_at, scheduler) = {
        let guard = shared.lock().unwrap();
        (guard.clock.time_at_end_of_current_loop(), guard.scheduler.clone())
    };

    let callback_shared = Arc::clone(shared);
    let handle = scheduler.schedule_at(fire_at, move || on_bar_boundary(callback_shared));

    shared.lock().unwrap().next_boundary_timer = Some(handle);
}

/// Arm the mid-bar [`half_end_recording`] fire, `timing_precision`
/// past the clock's current loop midpoint (`loop_time/2` after the
/// bar this is called in started). Mirrors the `threading.Timer`
/// `half_end_recording` is scheduled on in `on_enter_rec` of
/// `examples/original_source/src/core.py`'s `loop_player`.
fn schedule_half_commit<L: Lamp + 'static>(shared: &Arc<Mutex<Shared<L>>>) {
    let (fire_at, scheduler) = {
        let guard = shared.lock().unwrap();
        let timing_precision = Duration::from_secs_f64(guard.config.timing_precision);
        (guard.clock.time_at_loop_midpoint() + timing_precision, guard.scheduler.clone())
    };

    let callback_shared = Arc::clone(shared);
    let handle = scheduler.schedule_at(fire_at, move || half_end_recording(callback_shared));

    shared.lock().unwrap().half_commit_timer = Some(handle);
}

/// Mid-bar timer fired while a take is still being captured: snapshots
/// the frames captured so far and stores the resulting transitional
/// half-loop, so `pre_play`'s bar-boundary arm only has to splice it
/// onto the freshly committed aggregate rather than build it from
/// scratch at commit time (by which point the capture daemon may
/// already be mid-finalize). No-ops if the take was cancelled before
/// this fired.
fn half_end_recording<L: Lamp + 'static>(shared: Arc<Mutex<Shared<L>>>) {
    if shared.lock().unwrap().state != ControlState::Rec {
        return;
    }
    let half_loop = build_half_loop(&shared);
    shared.lock().unwrap().half_loop = Some(half_loop);
}

/// The recurring bar-boundary callback: `loop_player` in
/// `examples/original_source/src/core.py`, one tick per bar.
///
/// - `pre_rec`: the armed take starts now — raise the capture flag,
///   move to `rec`, and arm the mid-bar [`half_end_recording`] timer.
/// - `pre_play`: the armed take ends now — write a transitional
///   half-old/half-new buffer for this bar, commit the take so the
///   *next* bar plays the full recomputed loop, and move to `play`.
/// - anything else: just refresh the currently-inactive playback
///   backing store with this bar's (unchanged) loop content, since
///   each store only plays once before the daemon needs a fresh copy.
///
/// Always reschedules itself before returning, so a cancelled
/// transition (`release_back` during `pre_rec`/`rec`/`pre_play`) is
/// simply a state the next tick no longer recognises — there is no
/// separate per-transition timer to cancel.
fn on_bar_boundary<L: Lamp + 'static>(shared: Arc<Mutex<Shared<L>>>) {
    let state = shared.lock().unwrap().state;

    match state {
        ControlState::PreRec => {
            {
                let mut guard = shared.lock().unwrap();
                guard.capture_flag.set();
                guard.half_loop = None;
            }
            apply_entry_actions(&mut shared.lock().unwrap(), ControlState::Rec);
            write_current_loop(&shared);
            schedule_half_commit(&shared);
        }
        ControlState::PrePlay => {
            if let Some(timer) = shared.lock().unwrap().half_commit_timer.take() {
                timer.cancel();
            }
            // The half-loop bridges from the *old* aggregate (or
            // silence, for the very first take); the tail that
            // follows it must come from the *new* aggregate so the
            // bar after this one picks up exactly where the splice
            // left off. Prefer the snapshot `half_end_recording` took
            // at the bar's midpoint; a take shorter than half a bar
            // never reaches that timer, so build it fresh here instead.
            let half_loop = match shared.lock().unwrap().half_loop.take() {
                Some(half_loop) => half_loop,
                None => build_half_loop(&shared),
            };
            commit_take(&shared);
            let new_loop = shared.lock().unwrap().loop_buffer.clone();
            let transitional = splice_second_half(half_loop, &new_loop);
            write_buffer(&shared, &transitional);
            apply_entry_actions(&mut shared.lock().unwrap(), ControlState::Play);
        }
        _ => {
            write_current_loop(&shared);
        }
    }

    shared.lock().unwrap().clock.advance_by_loop();
    schedule_bar_boundary(&shared);
}

/// Write `shared.loop_buffer` to the inactive playback store, then
/// flip which side is considered inactive.
fn write_current_loop<L: Lamp + 'static>(shared: &Arc<Mutex<Shared<L>>>) {
    let buffer = shared.lock().unwrap().loop_buffer.clone();
    write_buffer(shared, &buffer);
}

fn write_buffer<L: Lamp + 'static>(shared: &Arc<Mutex<Shared<L>>>, buffer: &[Frame]) {
    let path = {
        let guard = shared.lock().unwrap();
        guard.session.temp_playing_path(guard.inactive_side)
    };

    if let Err(error) = write_atomic(&path, buffer) {
        warn!(%error, "failed to refresh playback backing store");
        return;
    }

    let mut guard = shared.lock().unwrap();
    guard.inactive_side = 1 - guard.inactive_side;
}

/// Build the first half of the mid-commit transitional buffer: the
/// first half of the *outgoing* (pre-commit) loop (dropped for the
/// very first take, per [`LoopMixEngine::build_half_loop`]'s
/// metronome-drop rule) summed with a trim/fade-in of the take
/// captured so far. Must run before [`commit_take`], since it reads
/// `shared.loop_buffer` before this take's contribution is folded in.
///
/// Reads `shared.captured`, the capture daemon's in-memory mirror of
/// the in-progress take, rather than reopening the temp recording
/// file: the file's header is only valid once the capture daemon
/// finalizes it, which hasn't happened yet while this take is still
/// being recorded.
fn build_half_loop<L: Lamp + 'static>(shared: &Arc<Mutex<Shared<L>>>) -> Vec<Frame> {
    let (current_loop, samples_per_beat, latency_samples, fade_samples, is_first_take, in_progress) = {
        let guard = shared.lock().unwrap();
        (
            guard.loop_buffer.clone(),
            guard.clock.samples_per_beat(),
            seconds_to_frames(guard.config.latency_seconds),
            seconds_to_frames(guard.config.fade_time),
            guard.takes.is_empty(),
            guard.captured.lock().unwrap().clone(),
        )
    };

    LoopMixEngine::build_half_loop(
        &current_loop,
        &in_progress,
        is_first_take,
        samples_per_beat,
        latency_samples,
        fade_samples,
    )
}

/// Concatenate `half_loop` with whatever of `current_loop` lies past
/// its length, so the returned buffer is exactly `current_loop.len()`
/// long regardless of rounding in [`LoopMixEngine::build_half_loop`].
fn splice_second_half(half_loop: Vec<Frame>, current_loop: &[Frame]) -> Vec<Frame> {
    let half_len = half_loop.len().min(current_loop.len());
    let mut transitional = half_loop;
    transitional.extend_from_slice(&current_loop[half_len..]);
    transitional
}

/// Close out the in-progress take: stop capture, archive the temp
/// recording to this session's next `loop_NNN.wav`, and recompute the
/// aggregate loop buffer from every committed take so far. Mirrors
/// `end_recording`/`add_recording_to_loops`/`update_loop` in
/// `examples/original_source/src/core.py`.
fn commit_take<L: Lamp + 'static>(shared: &Arc<Mutex<Shared<L>>>) {
    let (latency_seconds, poll_interval) = {
        let guard = shared.lock().unwrap();
        (guard.config.latency_seconds, Duration::from_secs_f64(guard.config.timing_precision))
    };

    // "Sleep before clearing the flag, to not miss any notes" — the
    // capture daemon keeps writing for a little longer than the bar
    // boundary so a note hit right at the deadline isn't truncated.
    std::thread::sleep(Duration::from_secs_f64(latency_seconds * 3.0));
    shared.lock().unwrap().capture_flag.clear();
    // Give the capture daemon a moment to observe the fall and
    // finalize its writer before we open the file for reading.
    std::thread::sleep(poll_interval * 4);

    let temp_path = shared.lock().unwrap().session.temp_recording_path();
    let raw = match WavFileReader::open(&temp_path) {
        Ok(reader) => reader.into_frames(),
        Err(error) => {
            warn!(%error, "failed to read completed take, dropping it");
            return;
        }
    };

    let archived_path = {
        let mut guard = shared.lock().unwrap();
        guard.session.next_take_path()
    };
    if let Err(error) = write_atomic(&archived_path, &raw) {
        warn!(%error, "failed to archive completed take");
        return;
    }

    let mut guard = shared.lock().unwrap();
    guard.session.record_take(archived_path);
    guard.takes.push(Take::new(raw, 0));

    let samples_per_beat = guard.clock.samples_per_beat();
    let latency_samples = seconds_to_frames(guard.config.latency_seconds);
    let fade_samples = seconds_to_frames(guard.config.fade_time);

    let preprocessed: Vec<Vec<Frame>> = guard
        .takes
        .iter()
        .map(|take| LoopMixEngine::preprocess(take.frames(), samples_per_beat, latency_samples, fade_samples))
        .collect();
    guard.loop_buffer = LoopMixEngine::aggregate(&preprocessed, samples_per_beat);

    info!(takes = guard.takes.len(), loop_len = guard.loop_buffer.len(), "take committed");
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPB: usize = 100;

    fn tone(len: usize, amplitude: f32) -> Vec<Frame> {
        vec![[amplitude, amplitude]; len]
    }

    #[test]
    fn splice_keeps_current_loop_length() {
        let current_loop = tone(400, 1.0);
        let half_loop = tone(200, 0.5);
        let spliced = splice_second_half(half_loop, &current_loop);
        assert_eq!(spliced.len(), current_loop.len());
        assert_eq!(&spliced[200..], &current_loop[200..]);
    }

    #[test]
    fn splice_truncates_an_oversized_half_loop() {
        let current_loop = tone(300, 1.0);
        let half_loop = tone(350, 0.5);
        let spliced = splice_second_half(half_loop, &current_loop);
        assert_eq!(spliced.len(), 350);
    }

    #[test]
    fn transitional_buffer_shape_matches_half_loop_plus_tail() {
        let current_loop = tone(400, 1.0);
        let in_progress = tone(300, 0.5);
        let half_loop = LoopMixEngine::build_half_loop(&current_loop, &in_progress, true, SPB, 0, 10);
        let spliced = splice_second_half(half_loop.clone(), &current_loop);
        assert_eq!(&spliced[..half_loop.len()], &half_loop[..]);
        assert_eq!(&spliced[half_loop.len()..], &current_loop[half_loop.len()..]);
    }
}
