//! Device-independent input state
//!
//! Raw key/touch events are reduced to a flat record once per frame. Driving
//! controls are level-triggered; pause and camera switch fire once per press.

use serde::{Deserialize, Serialize};

/// Logical controls a device event can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Control {
    Forward,
    Backward,
    Left,
    Right,
    Brake,
    Nitro,
    Pause,
    CameraSwitch,
}

/// Input for a single simulation tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub brake: bool,
    pub nitro: bool,
    /// Pause toggle (one tick per press)
    pub pause: bool,
    /// Cycle camera mode (one tick per press)
    pub camera_switch: bool,
}

impl InputState {
    /// Lateral steer: right minus left, in {-1, 0, 1}
    #[inline]
    pub fn steer(&self) -> f32 {
        (self.right as i8 - self.left as i8) as f32
    }

    /// True when neither throttle nor reverse is held
    #[inline]
    pub fn is_coasting(&self) -> bool {
        !self.forward && !self.backward
    }
}

/// Accumulates device events between ticks
#[derive(Debug, Clone, Default)]
pub struct InputTracker {
    held: InputState,
    pause_down: bool,
    camera_down: bool,
    pause_pending: bool,
    camera_pending: bool,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, control: Control) {
        match control {
            Control::Forward => self.held.forward = true,
            Control::Backward => self.held.backward = true,
            Control::Left => self.held.left = true,
            Control::Right => self.held.right = true,
            Control::Brake => self.held.brake = true,
            Control::Nitro => self.held.nitro = true,
            // Auto-repeat sends repeated downs; only the first one counts
            Control::Pause => {
                if !self.pause_down {
                    self.pause_pending = true;
                }
                self.pause_down = true;
            }
            Control::CameraSwitch => {
                if !self.camera_down {
                    self.camera_pending = true;
                }
                self.camera_down = true;
            }
        }
    }

    pub fn key_up(&mut self, control: Control) {
        match control {
            Control::Forward => self.held.forward = false,
            Control::Backward => self.held.backward = false,
            Control::Left => self.held.left = false,
            Control::Right => self.held.right = false,
            Control::Brake => self.held.brake = false,
            Control::Nitro => self.held.nitro = false,
            Control::Pause => self.pause_down = false,
            Control::CameraSwitch => self.camera_down = false,
        }
    }

    /// Request a pause from outside the keyboard (tab hidden, window blur)
    pub fn request_pause(&mut self) {
        self.pause_pending = true;
    }

    /// Drop every held key (focus lost, keyups will never arrive)
    pub fn release_all(&mut self) {
        self.held = InputState::default();
        self.pause_down = false;
        self.camera_down = false;
    }

    /// Current record; pending edge signals are consumed
    pub fn snapshot(&mut self) -> InputState {
        let mut state = self.held;
        state.pause = std::mem::take(&mut self.pause_pending);
        state.camera_switch = std::mem::take(&mut self.camera_pending);
        state
    }
}
