//! Platform abstraction layer
//!
//! Handles host-side concerns the simulation should not know about:
//! - Frame timing (clamped deltas, pause/resume baseline)
//! - Keyboard code mapping

pub mod clock;
pub mod keys;

pub use clock::FrameClock;
pub use keys::control_for_key;
