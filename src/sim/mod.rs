//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied frame delta only (clamped by `tick`)
//! - Seeded RNG only
//! - Stable iteration order (pool slot order)
//! - No rendering or platform dependencies

pub mod collider;
pub mod collision;
pub mod player;
pub mod state;
pub mod tick;
pub mod traffic;
pub mod world;

pub use collider::Collider;
pub use collision::{
    Collision, apply_bounce, check_collisions, check_near_misses, is_near_miss,
    min_safe_distance, near_miss_indices, separation_vector,
};
pub use player::{PlayerVehicle, gear_and_rpm};
pub use state::{
    AgentSnapshot, CameraMode, CollisionEvent, FrameReport, GamePhase, PlayerSnapshot,
    SimulationState, WorldSnapshot,
};
pub use tick::tick;
pub use traffic::{TrafficAgent, TrafficPool};
pub use world::{Backdrop, ChunkKind, ChunkRing, WorldChunk, WorldRecycler};
