//! In-memory simulated button/lamp backend.
//!
//! Used by the engine's integration tests and by `looper_engine`'s
//! `--sim-hardware` CLI flag so the state machine can be driven
//! end-to-end without GPIO or audio hardware present.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::button::{Button, ButtonId};
use crate::lamp::{Lamp, LampId};

/// A simulated button whose active level a test can set directly.
#[derive(Clone)]
pub struct SimButton {
    id: ButtonId,
    active: Arc<AtomicBool>,
}

impl SimButton {
    pub fn new(id: ButtonId) -> Self {
        Self { id, active: Arc::new(AtomicBool::new(false)) }
    }

    /// Press (or release) the button from test/driver code.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    /// Press then release, as a single convenience call.
    pub fn tap(&self) {
        self.set_active(true);
        self.set_active(false);
    }
}

impl Button for SimButton {
    fn id(&self) -> ButtonId {
        self.id
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// A simulated lamp that records its last-set state, for assertions.
#[derive(Clone)]
pub struct SimLamp {
    id: LampId,
    state: Arc<std::sync::Mutex<SimLampState>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimLampState {
    Off,
    On,
    Blinking,
}

impl SimLamp {
    pub fn new(id: LampId) -> Self {
        Self { id, state: Arc::new(std::sync::Mutex::new(SimLampState::Off)) }
    }

    pub fn state(&self) -> SimLampState {
        *self.state.lock().unwrap()
    }
}

impl Lamp for SimLamp {
    fn id(&self) -> LampId {
        self.id
    }

    fn on(&mut self) {
        *self.state.lock().unwrap() = SimLampState::On;
    }

    fn off(&mut self) {
        *self.state.lock().unwrap() = SimLampState::Off;
    }

    fn blink(&mut self, _on_time: Duration, _off_time: Duration) {
        *self.state.lock().unwrap() = SimLampState::Blinking;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_button_reports_set_level() {
        let button = SimButton::new(ButtonId::Play);
        assert!(!button.is_active());
        button.set_active(true);
        assert!(button.is_active());
    }

    #[test]
    fn sim_lamp_tracks_last_call() {
        let mut lamp = SimLamp::new(LampId::Rec);
        assert_eq!(lamp.state(), SimLampState::Off);
        lamp.on();
        assert_eq!(lamp.state(), SimLampState::On);
        lamp.blink(Duration::from_millis(1), Duration::from_millis(1));
        assert_eq!(lamp.state(), SimLampState::Blinking);
    }
}
