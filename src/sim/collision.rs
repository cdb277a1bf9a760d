//! Collision and proximity queries between vehicles
//!
//! Everything here works on axis-aligned boxes. Impacts are resolved with a
//! minimum-translation push along one axis rather than a physical response.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collider::Collider;
use crate::{clamp, distance};

/// A contact between the player and another vehicle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collision {
    /// Centre of the intersection box
    pub point: Vec3,
    /// Impact severity proxy in [0, 1]
    pub intensity: f32,
    /// The box that was hit
    pub other: Collider,
    /// Index of `other` in the slice passed to [`check_collisions`]
    pub index: usize,
}

/// Find every box the player overlaps
///
/// Intensity is the shallowest per-axis penetration divided by the player's
/// longest side, so grazes score low and head-on hits score high.
pub fn check_collisions(player: &Collider, others: &[Collider]) -> Vec<Collision> {
    let largest = player.largest_dimension();

    others
        .iter()
        .enumerate()
        .filter(|(_, other)| player.overlaps(other))
        .map(|(index, other)| {
            let depth = player.overlap_depths(other).min_element();
            let intensity = if largest > 0.0 {
                clamp(depth / largest, 0.0, 1.0)
            } else {
                0.0
            };
            Collision {
                point: player.overlap_center(other),
                intensity,
                other: *other,
                index,
            }
        })
        .collect()
}

/// Closest centre distance at which two boxes are considered safely apart
#[inline]
pub fn min_safe_distance(a: &Collider, b: &Collider) -> f32 {
    (a.footprint() + b.footprint()) / 2.0
}

/// True when `other` sits in the close-but-clear band around `player`
pub fn is_near_miss(player: &Collider, other: &Collider, threshold: f32) -> bool {
    let dist = distance(player.position, other.position);
    let safe = min_safe_distance(player, other);
    dist < safe + threshold && dist > safe * 0.9
}

/// Indices of every box in the near-miss band
pub fn near_miss_indices<'a>(
    player: &'a Collider,
    others: &'a [Collider],
    threshold: f32,
) -> impl Iterator<Item = usize> + 'a {
    others
        .iter()
        .enumerate()
        .filter(move |(_, other)| is_near_miss(player, other, threshold))
        .map(|(i, _)| i)
}

/// Count boxes in the near-miss band; each one counts independently
pub fn check_near_misses(player: &Collider, others: &[Collider], threshold: f32) -> usize {
    near_miss_indices(player, others, threshold).count()
}

/// Minimum translation that pushes `a` out of `b`
///
/// Picks the axis with the shallowest penetration and returns a vector along
/// that axis only, pointing from `b` toward `a`. Boxes that do not overlap
/// yield zero.
pub fn separation_vector(a: &Collider, b: &Collider) -> Vec3 {
    let depths = a.overlap_depths(b);
    if depths.min_element() <= 0.0 {
        return Vec3::ZERO;
    }

    let delta = a.position - b.position;
    let axis = if depths.x <= depths.y && depths.x <= depths.z {
        0
    } else if depths.y <= depths.z {
        1
    } else {
        2
    };

    // Coincident centres push along the positive axis
    let sign = if delta[axis] < 0.0 { -1.0 } else { 1.0 };
    let mut out = Vec3::ZERO;
    out[axis] = depths[axis] * sign;
    out
}

/// Reflect `velocity` on every axis the separation acts along
///
/// Reflected components are scaled by `restitution`; the rest pass through.
pub fn apply_bounce(velocity: Vec3, separation: Vec3, restitution: f32) -> Vec3 {
    let mut out = velocity;
    for axis in 0..3 {
        if separation[axis] != 0.0 {
            out[axis] = -velocity[axis] * restitution;
        }
    }
    out
}
