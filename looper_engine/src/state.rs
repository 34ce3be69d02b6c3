//! Control state machine: a tagged state enum, the trigger alphabet,
//! and a pure transition function.
//!
//! No dynamic dispatch — one match arm per `(state, trigger)` pair
//! named in the control-state table. Entry actions (lamp policy,
//! capture-flag writes) live in `crate::looper::apply_entry_actions`,
//! one match arm per state, per the "one switch per state" design.

use std::fmt;

/// The six control states a looper instance can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlState {
    /// Booted, playing only the metronome loop; no take committed yet.
    /// BPM is still editable here.
    Metronome,
    /// Steady-state playback of the current aggregate loop.
    Play,
    /// Armed to start capturing on the next bar boundary.
    PreRec,
    /// Actively capturing a take.
    Rec,
    /// Armed to commit the in-progress take on the next bar boundary.
    PrePlay,
    /// Terminal state after an all-four-buttons shutdown request.
    OutOfUse,
}

/// Events that can move the state machine.
///
/// Button-release triggers carry no payload — the looper always knows
/// which button it is currently tracking. `StartRecording` and
/// `EndRecording` are raised internally by the scheduler at a bar
/// boundary, never directly by a button release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    ReleasePlay,
    ReleaseRec,
    ReleaseBack,
    ReleaseForw,
    StartRecording,
    EndRecording,
    /// All four buttons held at once.
    Shutdown,
}

/// The theoretically unreachable case.
///
/// [`transition`] is total over `ControlState x Trigger`: every pair
/// not named in the table is a no-op, returning the state unchanged.
/// This type exists only so a future state or trigger addition that
/// misses a match arm is a compile-visible `Result`, not a silent
/// panic or a state machine that quietly drops an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalTransition {
    pub from: ControlState,
    pub trigger: Trigger,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no transition defined from {:?} on {:?}", self.from, self.trigger)
    }
}

impl std::error::Error for IllegalTransition {}

/// Apply `trigger` to `state` and return the resulting state.
///
/// Total: any `(state, trigger)` pair absent from the table below
/// returns `Ok(state)` unchanged rather than an error, per the
/// totality requirement.
pub fn transition(state: ControlState, trigger: Trigger) -> Result<ControlState, IllegalTransition> {
    use ControlState::*;
    use Trigger::*;

    let next = match (state, trigger) {
        (Metronome, ReleasePlay) => Play,
        (Play, ReleaseRec) => PreRec,
        (PreRec, StartRecording) => Rec,
        (PreRec, ReleasePlay) => Play,
        (PreRec, ReleaseBack) => Play,
        (Rec, ReleasePlay) => PrePlay,
        (Rec, ReleaseRec) => PreRec,
        (Rec, ReleaseBack) => Play,
        (PrePlay, EndRecording) => Play,
        (PrePlay, ReleaseRec) => PreRec,
        (PrePlay, ReleaseBack) => Play,
        (_, Shutdown) => OutOfUse,
        (current, _) => current,
    };
    Ok(next)
}

/// Whether `state` is one of the "pre_*" armed states — `release_back`
/// cancels the in-progress take from any of these.
pub fn is_cancellable(state: ControlState) -> bool {
    matches!(state, ControlState::PreRec | ControlState::Rec | ControlState::PrePlay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_through_a_single_take() {
        let mut state = ControlState::Metronome;
        state = transition(state, Trigger::ReleasePlay).unwrap();
        assert_eq!(state, ControlState::Play);

        state = transition(state, Trigger::ReleaseRec).unwrap();
        assert_eq!(state, ControlState::PreRec);

        state = transition(state, Trigger::StartRecording).unwrap();
        assert_eq!(state, ControlState::Rec);

        state = transition(state, Trigger::ReleasePlay).unwrap();
        assert_eq!(state, ControlState::PrePlay);

        state = transition(state, Trigger::EndRecording).unwrap();
        assert_eq!(state, ControlState::Play);
    }

    #[test]
    fn release_back_cancels_from_every_pre_state() {
        for state in [ControlState::PreRec, ControlState::Rec, ControlState::PrePlay] {
            assert_eq!(transition(state, Trigger::ReleaseBack).unwrap(), ControlState::Play);
            assert!(is_cancellable(state));
        }
        assert!(!is_cancellable(ControlState::Play));
    }

    #[test]
    fn overdub_loop_returns_to_pre_rec() {
        assert_eq!(transition(ControlState::Rec, Trigger::ReleaseRec).unwrap(), ControlState::PreRec);
        assert_eq!(transition(ControlState::PrePlay, Trigger::ReleaseRec).unwrap(), ControlState::PreRec);
    }

    #[test]
    fn undefined_pairs_are_no_ops() {
        assert_eq!(transition(ControlState::Play, Trigger::ReleasePlay).unwrap(), ControlState::Play);
        assert_eq!(transition(ControlState::Metronome, Trigger::ReleaseRec).unwrap(), ControlState::Metronome);
        assert_eq!(transition(ControlState::Rec, Trigger::StartRecording).unwrap(), ControlState::Rec);
    }

    #[test]
    fn shutdown_is_reachable_from_every_state() {
        for state in [
            ControlState::Metronome,
            ControlState::Play,
            ControlState::PreRec,
            ControlState::Rec,
            ControlState::PrePlay,
        ] {
            assert_eq!(transition(state, Trigger::Shutdown).unwrap(), ControlState::OutOfUse);
        }
    }

    #[test]
    fn table_is_total_over_every_pair() {
        let states = [
            ControlState::Metronome,
            ControlState::Play,
            ControlState::PreRec,
            ControlState::Rec,
            ControlState::PrePlay,
            ControlState::OutOfUse,
        ];
        let triggers = [
            Trigger::ReleasePlay,
            Trigger::ReleaseRec,
            Trigger::ReleaseBack,
            Trigger::ReleaseForw,
            Trigger::StartRecording,
            Trigger::EndRecording,
            Trigger::Shutdown,
        ];
        for &state in &states {
            for &trigger in &triggers {
                assert!(transition(state, trigger).is_ok());
            }
        }
    }
}
