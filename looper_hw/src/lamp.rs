//! Lamp trait: the abstract indicator API `looper_engine`'s control
//! state machine drives. Grounded on `bbx_daisy::led::UserLed`'s
//! on/off/toggle shape, extended with a blink cadence for the armed
//! `pre_rec`/`pre_play` states (the on/off primitives are carried
//! as-is; blink timing is new).

use std::time::Duration;

/// The four lamp identities on the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LampId {
    Rec,
    Play,
    Back,
    Forw,
}

/// A steady or blinking indicator lamp.
pub trait Lamp: Send {
    /// Which of the four lamps this is.
    fn id(&self) -> LampId;

    /// Turn the lamp on, steady.
    fn on(&mut self);

    /// Turn the lamp off.
    fn off(&mut self);

    /// Blink the lamp: `on_time` lit, then `off_time` dark, repeating
    /// until the next `on`/`off`/`blink` call.
    fn blink(&mut self, on_time: Duration, off_time: Duration);
}

/// A named set of the four lamps, so callers can address one lamp
/// without matching on [`LampId`] at every call site.
pub struct LampBank<L> {
    pub rec: L,
    pub play: L,
    pub back: L,
    pub forw: L,
}

impl<L: Lamp> LampBank<L> {
    pub fn new(rec: L, play: L, back: L, forw: L) -> Self {
        Self { rec, play, back, forw }
    }

    /// Turn all four lamps off. The entry action every control state
    /// transition starts with, per the "one switch per state" design.
    pub fn all_off(&mut self) {
        self.rec.off();
        self.play.off();
        self.back.off();
        self.forw.off();
    }

    /// A brief all-lamps self-test cycle: `led_square`/`led_circle` in
    /// `examples/original_source/src/core.py`, played once at startup
    /// and once before a supervisor restart.
    fn cycle(&mut self, order: [LampId; 4], step: Duration) {
        self.all_off();
        for id in order {
            self.set(id, true);
            std::thread::sleep(step);
            self.set(id, false);
        }
    }

    fn set(&mut self, id: LampId, on: bool) {
        let lamp: &mut L = match id {
            LampId::Rec => &mut self.rec,
            LampId::Play => &mut self.play,
            LampId::Back => &mut self.back,
            LampId::Forw => &mut self.forw,
        };
        if on {
            lamp.on();
        } else {
            lamp.off();
        }
    }

    /// Startup self-test pattern (`led_square`: rec, forw, play, back).
    pub fn startup_pattern(&mut self) {
        self.cycle([LampId::Rec, LampId::Forw, LampId::Play, LampId::Back], Duration::from_millis(100));
    }

    /// Restart self-test pattern (`led_circle`: rec, play, forw, back).
    pub fn restart_pattern(&mut self) {
        self.cycle([LampId::Rec, LampId::Play, LampId::Forw, LampId::Back], Duration::from_millis(100));
    }

    /// All lamps blinking in lockstep — the fatal-error indicator
    /// pattern. `DeviceRateMismatch` uses only
    /// `rec`+`forw`; other fatals use all three non-play lamps, per
    /// the source's `except` blocks (`rec_led`/`forw_led` for audio
    /// errors, plus `back_led` for everything else).
    pub fn error_pattern(&mut self, include_back: bool, on_time: Duration, off_time: Duration) {
        self.play.off();
        self.rec.blink(on_time, off_time);
        self.forw.blink(on_time, off_time);
        if include_back {
            self.back.blink(on_time, off_time);
        } else {
            self.back.off();
        }
    }
}
