//! Axis-aligned box shared by every vehicle
//!
//! Built fresh each frame from a vehicle's position and size; never stored.

use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    /// Box centre
    pub position: Vec3,
    /// Half the box size on each axis
    pub half_extents: Vec3,
}

impl Collider {
    pub fn new(position: Vec3, half_extents: Vec3) -> Self {
        Self {
            position,
            half_extents: half_extents.abs(),
        }
    }

    #[inline]
    pub fn min(&self) -> Vec3 {
        self.position - self.half_extents
    }

    #[inline]
    pub fn max(&self) -> Vec3 {
        self.position + self.half_extents
    }

    /// Full size of the box
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.half_extents * 2.0
    }

    /// Longest side of the box
    #[inline]
    pub fn largest_dimension(&self) -> f32 {
        self.size().max_element()
    }

    /// Strict overlap on all three axes (touching faces do not count)
    pub fn overlaps(&self, other: &Collider) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.cmplt(b_max).all() && a_max.cmpgt(b_min).all()
    }

    /// Penetration depth per axis; a component <= 0 means separated on that axis
    pub fn overlap_depths(&self, other: &Collider) -> Vec3 {
        self.half_extents + other.half_extents - (self.position - other.position).abs()
    }

    /// Centre of the intersection box (midpoint of each axis' overlap interval)
    pub fn overlap_center(&self, other: &Collider) -> Vec3 {
        let lo = self.min().max(other.min());
        let hi = self.max().min(other.max());
        (lo + hi) * 0.5
    }

    /// Half width plus half depth, the footprint used for proximity checks
    #[inline]
    pub fn footprint(&self) -> f32 {
        self.half_extents.x + self.half_extents.z
    }
}
