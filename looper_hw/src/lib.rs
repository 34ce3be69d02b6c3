//! # looper_hw
//!
//! The looper's hardware control surface, specified as two small
//! traits (`Button`, `Lamp`) rather than bound to any particular GPIO
//! driver — the concrete binding is explicitly out of scope here.
//! This crate ships only the traits and an in-memory simulated
//! backend ([`sim`]) for tests and hardware-free runs; a real GPIO
//! implementation lives outside this workspace.

pub mod button;
pub mod error;
pub mod lamp;
pub mod sim;

pub use button::{Button, ButtonEdge, ButtonId, EdgeDetector};
pub use error::{HwError, Result};
pub use lamp::{Lamp, LampBank, LampId};
