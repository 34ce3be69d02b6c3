//! Button trait: polled active state plus press/release edge callbacks.
//!
//! Grounded on `bbx_midi::stream::MidiInputStream`'s
//! callback-registration shape, the closest "external input device
//! streams events to a handler" pattern in the reference pack — the
//! teacher workspace itself has no button abstraction, since
//! `bbx_daisy` targets knobs/CVs rather than momentary buttons.

/// The four button identities on the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    Rec,
    Play,
    Back,
    Forw,
}

/// A momentary push-button with a polled active state.
///
/// Implementors are expected to debounce in hardware or in their own
/// polling loop; this trait only exposes the debounced level.
pub trait Button: Send {
    /// Which of the four buttons this is.
    fn id(&self) -> ButtonId;

    /// Whether the button is currently held down.
    fn is_active(&self) -> bool;
}

/// Edge events derived from polling a [`Button`]'s `is_active` level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonEdge {
    Press(ButtonId),
    Release(ButtonId),
}

/// Watches a button's level and reports edges as they cross.
///
/// `looper_engine`'s poll loop owns one of these per button and calls
/// [`EdgeDetector::poll`] once per tick; it is not itself a thread.
pub struct EdgeDetector<B> {
    button: B,
    was_active: bool,
}

impl<B: Button> EdgeDetector<B> {
    pub fn new(button: B) -> Self {
        let was_active = button.is_active();
        Self { button, was_active }
    }

    /// Check the button's current level against the last observed
    /// level and return an edge if one occurred.
    pub fn poll(&mut self) -> Option<ButtonEdge> {
        let is_active = self.button.is_active();
        let edge = match (self.was_active, is_active) {
            (false, true) => Some(ButtonEdge::Press(self.button.id())),
            (true, false) => Some(ButtonEdge::Release(self.button.id())),
            _ => None,
        };
        self.was_active = is_active;
        edge
    }

    /// Current debounced level, without consuming an edge.
    pub fn is_active(&self) -> bool {
        self.was_active
    }

    pub fn button(&self) -> &B {
        &self.button
    }
}
