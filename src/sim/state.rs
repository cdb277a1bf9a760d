//! Simulation state and per-frame report
//!
//! Everything the tick mutates lives in [`SimulationState`]; presentation
//! code only ever sees the [`FrameReport`] it publishes.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::player::PlayerVehicle;
use super::traffic::TrafficPool;
use super::world::{Backdrop, ChunkRing, WorldRecycler};
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active driving
    #[default]
    Playing,
    /// Ticks are suspended
    Paused,
    /// Damage reached the limit; run is over
    Wrecked,
}

/// Camera rig the renderer should use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CameraMode {
    #[default]
    Chase,
    Hood,
    Overhead,
}

impl CameraMode {
    pub fn next(self) -> Self {
        match self {
            CameraMode::Chase => CameraMode::Hood,
            CameraMode::Hood => CameraMode::Overhead,
            CameraMode::Overhead => CameraMode::Chase,
        }
    }
}

/// Player fields published each frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub position: Vec3,
    pub heading: f32,
    pub speed: f32,
    pub rpm: f32,
    pub gear: u8,
    pub nitro_amount: f32,
    pub damage: f32,
    pub is_drifting: bool,
    pub is_nitro_active: bool,
    pub is_braking: bool,
}

impl From<&PlayerVehicle> for PlayerSnapshot {
    fn from(p: &PlayerVehicle) -> Self {
        Self {
            position: p.position,
            heading: p.heading,
            speed: p.speed,
            rpm: p.rpm,
            gear: p.gear,
            nitro_amount: p.nitro_amount,
            damage: p.damage,
            is_drifting: p.is_drifting,
            is_nitro_active: p.is_nitro_active,
            is_braking: p.is_braking,
        }
    }
}

/// Traffic car fields published each frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: u32,
    pub position: Vec3,
    pub lane: usize,
    pub is_braking: bool,
}

/// Chunk placements published each frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub road: Vec<f32>,
    pub buildings_left: Vec<(f32, f32)>,
    pub buildings_right: Vec<(f32, f32)>,
    pub lamps_left: Vec<f32>,
    pub lamps_right: Vec<f32>,
    pub backdrop: Backdrop,
}

impl From<&WorldRecycler> for WorldSnapshot {
    fn from(w: &WorldRecycler) -> Self {
        let with_height = |ring: &ChunkRing| -> Vec<(f32, f32)> {
            ring.chunks.iter().map(|c| (c.z, c.height)).collect()
        };
        Self {
            road: w.road.positions().collect(),
            buildings_left: with_height(&w.buildings_left),
            buildings_right: with_height(&w.buildings_right),
            lamps_left: w.lamps_left.positions().collect(),
            lamps_right: w.lamps_right.positions().collect(),
            backdrop: w.backdrop,
        }
    }
}

/// A contact for sparks, camera shake and crunch audio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub point: Vec3,
    pub intensity: f32,
}

/// Everything presentation needs from one tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameReport {
    pub phase: GamePhase,
    pub camera: CameraMode,
    pub player: PlayerSnapshot,
    pub traffic: Vec<AgentSnapshot>,
    pub world: WorldSnapshot,
    pub collisions: Vec<CollisionEvent>,
    /// Near misses scored this tick
    pub near_misses: u32,
    pub score: u64,
}

/// Complete game state, owned by the host loop
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub tuning: Tuning,
    pub seed: u64,
    pub phase: GamePhase,
    pub camera: CameraMode,
    pub player: PlayerVehicle,
    pub traffic: TrafficPool,
    pub world: WorldRecycler,
    pub score: u64,
    /// Fractional survival points not yet added to `score`
    pub score_carry: f32,
    pub total_near_misses: u32,
    /// Forward distance driven (world units)
    pub distance: f32,
    /// Simulated seconds while playing
    pub elapsed: f32,
    pub rng: Pcg32,
    /// Report of the most recent tick
    pub report: FrameReport,
}

impl SimulationState {
    /// Start a new run with the given tuning and seed
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let player = PlayerVehicle::new(&tuning);
        let world = WorldRecycler::new(&tuning, player.position.z, &mut rng);
        let mut state = Self {
            seed,
            phase: GamePhase::Playing,
            camera: CameraMode::default(),
            player,
            traffic: TrafficPool::new(),
            world,
            score: 0,
            score_carry: 0.0,
            total_near_misses: 0,
            distance: 0.0,
            elapsed: 0.0,
            rng,
            report: FrameReport::default(),
            tuning,
        };
        state.populate();
        state
    }

    /// Reset for a new round, keeping tuning, camera choice and pool slots
    pub fn restart(&mut self) {
        self.player.reset();
        self.traffic.clear();
        self.world = WorldRecycler::new(&self.tuning, self.player.position.z, &mut self.rng);
        self.phase = GamePhase::Playing;
        self.score = 0;
        self.score_carry = 0.0;
        self.total_near_misses = 0;
        self.distance = 0.0;
        self.elapsed = 0.0;
        self.populate();
        log::info!("Round restarted");
    }

    /// Fill the road with traffic and publish an initial report
    fn populate(&mut self) {
        let position = self.player.position;
        // One pass can stop early when a spawn is blocked
        for _ in 0..self.tuning.traffic.count.max(1) {
            self.traffic.maintain(position, &self.tuning, &mut self.rng);
            if self.traffic.active_count() >= self.tuning.traffic.count {
                break;
            }
        }
        self.report = self.build_report(Vec::new(), 0);
    }

    pub fn build_report(&self, collisions: Vec<CollisionEvent>, near_misses: u32) -> FrameReport {
        FrameReport {
            phase: self.phase,
            camera: self.camera,
            player: PlayerSnapshot::from(&self.player),
            traffic: self
                .traffic
                .iter()
                .map(|a| AgentSnapshot {
                    id: a.id,
                    position: a.position,
                    lane: a.lane,
                    is_braking: a.is_braking,
                })
                .collect(),
            world: WorldSnapshot::from(&self.world),
            collisions,
            near_misses,
            score: self.score,
        }
    }
}
