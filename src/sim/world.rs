//! Infinite road scenery
//!
//! A fixed number of chunks per row tile the travel axis. When a chunk drops
//! far enough behind the player it jumps forward by the whole tiled span and
//! becomes the new leading chunk, so the row never shows a gap and never
//! allocates. Backdrop elements have no extent along the road and simply
//! follow the player.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::normalize_or_zero;
use crate::tuning::{ChunkLayout, Tuning, WorldTuning};

/// What a chunk row holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkKind {
    RoadSegment,
    Building,
    Lamp,
}

/// One recycled piece of scenery
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldChunk {
    /// Trailing (lowest z) edge of the chunk
    pub z: f32,
    /// Lateral placement of the row
    pub x: f32,
    /// Visual height; only buildings vary it
    pub height: f32,
}

/// A row of chunks tiling the travel axis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRing {
    pub kind: ChunkKind,
    pub layout: ChunkLayout,
    pub chunks: Vec<WorldChunk>,
}

impl ChunkRing {
    /// Lay out `layout.count` chunks starting `margin` behind `origin_z`
    pub fn new(kind: ChunkKind, layout: ChunkLayout, x: f32, origin_z: f32) -> Self {
        let start = origin_z - layout.margin;
        let chunks = (0..layout.count)
            .map(|i| WorldChunk {
                z: start + i as f32 * layout.pitch,
                x,
                height: 0.0,
            })
            .collect();
        Self {
            kind,
            layout,
            chunks,
        }
    }

    /// Slide chunks that left the window around `player_z` by whole spans
    ///
    /// A chunk that fell several spans behind jumps in one step. Calls
    /// `on_recycle` once per chunk moved. Returns the number of spans moved.
    pub fn recycle(&mut self, player_z: f32, mut on_recycle: impl FnMut(&mut WorldChunk)) -> usize {
        let pitch = self.layout.pitch;
        let span = self.layout.span();
        let behind = player_z - self.layout.margin;
        let ahead = player_z + span - self.layout.margin;
        if span <= 0.0 {
            return 0;
        }

        let mut moved = 0;
        for chunk in &mut self.chunks {
            let steps = if chunk.z + pitch < behind {
                ((behind - pitch - chunk.z) / span).ceil().max(1.0)
            } else if chunk.z + pitch > ahead {
                // Player reversing
                -((chunk.z + pitch - ahead) / span).ceil().max(1.0)
            } else {
                continue;
            };
            if !steps.is_finite() {
                continue;
            }
            chunk.z += steps * span;
            on_recycle(chunk);
            moved += steps.abs() as usize;
        }
        moved
    }

    /// Covered interval `[min z, max z + pitch]`
    pub fn coverage(&self) -> (f32, f32) {
        let lo = self.chunks.iter().map(|c| c.z).fold(f32::INFINITY, f32::min);
        let hi = self.chunks.iter().map(|c| c.z).fold(f32::NEG_INFINITY, f32::max);
        (lo, hi + self.layout.pitch)
    }

    pub fn positions(&self) -> impl Iterator<Item = f32> + '_ {
        self.chunks.iter().map(|c| c.z)
    }
}

/// Elements re-centred on the player every tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Backdrop {
    pub sky_center: Vec3,
    pub sun_position: Vec3,
    /// Unit direction from the player toward the sun (zero if undefined)
    pub sun_direction: Vec3,
    pub haze_center: Vec3,
}

/// All recycled scenery around the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldRecycler {
    pub road: ChunkRing,
    pub buildings_left: ChunkRing,
    pub buildings_right: ChunkRing,
    pub lamps_left: ChunkRing,
    pub lamps_right: ChunkRing,
    pub backdrop: Backdrop,
    sun_offset: Vec3,
    height_range: (f32, f32),
}

impl WorldRecycler {
    pub fn new<R: Rng>(tuning: &Tuning, origin_z: f32, rng: &mut R) -> Self {
        let w: &WorldTuning = &tuning.world;
        let half_road = tuning.road.road_width / 2.0;
        let building_x = half_road + w.building_setback;
        let lamp_x = half_road + w.lamp_setback;

        let mut world = Self {
            road: ChunkRing::new(ChunkKind::RoadSegment, w.road, 0.0, origin_z),
            buildings_left: ChunkRing::new(ChunkKind::Building, w.buildings, -building_x, origin_z),
            buildings_right: ChunkRing::new(ChunkKind::Building, w.buildings, building_x, origin_z),
            lamps_left: ChunkRing::new(ChunkKind::Lamp, w.lamps, -lamp_x, origin_z),
            lamps_right: ChunkRing::new(ChunkKind::Lamp, w.lamps, lamp_x, origin_z),
            backdrop: Backdrop::default(),
            sun_offset: w.sun_offset,
            height_range: (w.building_min_height, w.building_max_height),
        };

        for ring in [&mut world.buildings_left, &mut world.buildings_right] {
            for chunk in &mut ring.chunks {
                chunk.height = roll_height(rng, world.height_range);
            }
        }
        world.recenter_backdrop(Vec3::new(0.0, 0.0, origin_z));
        world
    }

    /// Recycle every row against the player's position and move the backdrop
    ///
    /// Returns the number of chunk moves made this tick.
    pub fn update<R: Rng>(
        &mut self,
        _dt: f32,
        player_position: Vec3,
        _player_speed: f32,
        rng: &mut R,
    ) -> usize {
        let z = player_position.z;
        let heights = self.height_range;

        let mut moved = self.road.recycle(z, |_| {});
        moved += self.lamps_left.recycle(z, |_| {});
        moved += self.lamps_right.recycle(z, |_| {});
        for ring in [&mut self.buildings_left, &mut self.buildings_right] {
            moved += ring.recycle(z, |chunk| chunk.height = roll_height(rng, heights));
        }

        self.recenter_backdrop(player_position);
        moved
    }

    fn recenter_backdrop(&mut self, player_position: Vec3) {
        let ground = Vec3::new(player_position.x, 0.0, player_position.z);
        self.backdrop = Backdrop {
            sky_center: ground,
            sun_position: ground + self.sun_offset,
            sun_direction: normalize_or_zero(self.sun_offset),
            haze_center: ground,
        };
    }
}

fn roll_height<R: Rng>(rng: &mut R, (lo, hi): (f32, f32)) -> f32 {
    if hi > lo { rng.random_range(lo..=hi) } else { lo }
}
