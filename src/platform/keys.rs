//! Keyboard layout for the browser host

use crate::input::Control;

/// Map a `KeyboardEvent.code` to a control
pub fn control_for_key(code: &str) -> Option<Control> {
    match code {
        "KeyW" | "ArrowUp" => Some(Control::Forward),
        "KeyS" | "ArrowDown" => Some(Control::Backward),
        "KeyA" | "ArrowLeft" => Some(Control::Left),
        "KeyD" | "ArrowRight" => Some(Control::Right),
        "Space" => Some(Control::Brake),
        "ShiftLeft" | "ShiftRight" => Some(Control::Nitro),
        "KeyP" | "Escape" => Some(Control::Pause),
        "KeyC" => Some(Control::CameraSwitch),
        _ => None,
    }
}
