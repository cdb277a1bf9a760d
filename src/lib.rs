//! Street Racer - an endless city-road arcade racer
//!
//! Core modules:
//! - `sim`: Simulation core (vehicle physics, traffic, collisions, world recycling)
//! - `input`: Device-independent input state
//! - `platform`: Browser/native host helpers (frame clock, key mapping)
//! - `tuning`: Data-driven game balance

pub mod input;
pub mod platform;
pub mod sim;
pub mod tuning;

pub use input::{Control, InputState, InputTracker};
pub use tuning::{Tuning, TuningError};

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Largest frame delta fed to the simulation (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Nominal host frame delta (60 Hz)
    pub const NOMINAL_DT: f32 = 1.0 / 60.0;
    /// Damage at which the car is wrecked
    pub const MAX_DAMAGE: f32 = 100.0;
    /// Number of forward gears
    pub const GEAR_COUNT: usize = 6;
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp `v` to `[lo, hi]` (does not panic on inverted bounds, `lo` wins)
#[inline]
pub fn clamp(v: f32, lo: f32, hi: f32) -> f32 {
    v.min(hi).max(lo)
}

/// Map `v` from `[in_lo, in_hi]` to `[out_lo, out_hi]` (unclamped)
///
/// A zero-width input range maps everything to `out_lo`.
pub fn map_range(v: f32, in_lo: f32, in_hi: f32, out_lo: f32, out_hi: f32) -> f32 {
    let span = in_hi - in_lo;
    if span == 0.0 {
        return out_lo;
    }
    out_lo + (v - in_lo) / span * (out_hi - out_lo)
}

/// Hermite smoothstep; degenerates to a hard step when the edges coincide
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 == edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub fn distance(a: Vec3, b: Vec3) -> f32 {
    (a - b).length()
}

#[inline]
pub fn dot(a: Vec3, b: Vec3) -> f32 {
    a.dot(b)
}

/// Unit vector in the direction of `v`, or zero for a zero-length vector
#[inline]
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    v.normalize_or_zero()
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit forward vector for a Y-axis heading (heading 0 faces +z)
#[inline]
pub fn heading_to_forward(heading: f32) -> Vec3 {
    Vec3::new(heading.sin(), 0.0, heading.cos())
}
