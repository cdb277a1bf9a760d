//! AI traffic
//!
//! Each car cruises at the speed it spawned with, drifts between adjacent
//! lanes at random and lights its brake lamps when the player closes in from
//! behind. Cars live in a slot pool so spawning does not allocate once the
//! pool has grown to the target count.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collider::Collider;
use crate::tuning::{RoadTuning, TrafficTuning, Tuning};
use crate::{dot, lerp, smoothstep};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficAgent {
    pub id: u32,
    pub lane: usize,
    /// Lane being moved into; equals `lane` when not changing
    pub target_lane: usize,
    /// 0..1 through the current lane change
    pub lane_change_progress: f32,
    /// Cruise speed in mph, fixed at spawn
    pub speed: f32,
    pub position: Vec3,
    pub is_braking: bool,
    pub half_extents: Vec3,
    /// Set once this car has scored a near miss; cleared when it leaves the band
    pub near_miss_scored: bool,
}

impl TrafficAgent {
    pub fn new(id: u32, lane: usize, z: f32, speed: f32, tuning: &Tuning) -> Self {
        let half_extents = tuning.traffic.half_extents;
        Self {
            id,
            lane,
            target_lane: lane,
            lane_change_progress: 0.0,
            speed,
            position: Vec3::new(tuning.road.lane_center(lane), half_extents.y, z),
            is_braking: false,
            half_extents,
            near_miss_scored: false,
        }
    }

    pub fn is_changing_lane(&self) -> bool {
        self.target_lane != self.lane
    }

    /// Start moving one lane over; rejected if the target is off the road
    pub fn begin_lane_change(&mut self, direction: i32, lane_count: usize) -> bool {
        let target = self.lane as i64 + direction as i64;
        if self.is_changing_lane() || target < 0 || target >= lane_count as i64 {
            return false;
        }
        self.target_lane = target as usize;
        self.lane_change_progress = 0.0;
        true
    }

    /// Advance one tick
    pub fn update<R: Rng>(
        &mut self,
        dt: f32,
        player_position: Vec3,
        player_speed: f32,
        tuning: &Tuning,
        rng: &mut R,
    ) {
        let traffic = &tuning.traffic;
        let road = &tuning.road;

        self.position.z += self.speed * tuning.vehicle.units_per_mph * dt;

        // Closing player in the same lane, inside the following window
        let ahead = dot(self.position - player_position, Vec3::Z);
        let same_lane = (self.position.x - player_position.x).abs() < road.lane_width / 2.0;
        self.is_braking = ahead > 0.0
            && ahead <= traffic.braking_distance
            && same_lane
            && player_speed > self.speed;

        if !self.is_changing_lane() {
            if rng.random::<f32>() < traffic.lane_change_probability {
                let direction = if rng.random_bool(0.5) { 1 } else { -1 };
                self.begin_lane_change(direction, road.lane_count);
            }
        } else {
            self.lane_change_progress += traffic.lane_change_rate * dt;
            if self.lane_change_progress >= 1.0 {
                self.lane = self.target_lane;
                self.lane_change_progress = 0.0;
            }
        }

        self.position.x = self.lateral_position(road);
    }

    /// Lateral position, eased between lanes during a change
    pub fn lateral_position(&self, road: &RoadTuning) -> f32 {
        let from = road.lane_center(self.lane);
        if !self.is_changing_lane() {
            return from;
        }
        let to = road.lane_center(self.target_lane);
        lerp(from, to, smoothstep(0.0, 1.0, self.lane_change_progress))
    }

    pub fn collider(&self) -> Collider {
        Collider::new(self.position, self.half_extents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrafficSlot {
    agent: TrafficAgent,
    active: bool,
}

/// Slot pool of traffic cars
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrafficPool {
    slots: Vec<TrafficSlot>,
    /// Indices of inactive slots, reused before the pool grows
    free: Vec<usize>,
    next_id: u32,
}

impl TrafficPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deactivate every car, keeping the slots for reuse
    pub fn clear(&mut self) {
        self.free.clear();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.active = false;
            self.free.push(i);
        }
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }

    /// Total slots allocated (active and free)
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrafficAgent> {
        self.slots.iter().filter(|s| s.active).map(|s| &s.agent)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TrafficAgent> {
        self.slots
            .iter_mut()
            .filter(|s| s.active)
            .map(|s| &mut s.agent)
    }

    /// Colliders of active cars, in [`TrafficPool::iter`] order
    pub fn colliders(&self) -> Vec<Collider> {
        self.iter().map(TrafficAgent::collider).collect()
    }

    /// Place a car in a free slot (or grow the pool)
    pub fn spawn(&mut self, lane: usize, z: f32, speed: f32, tuning: &Tuning) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        let agent = TrafficAgent::new(id, lane, z, speed, tuning);

        match self.free.pop() {
            Some(index) => {
                self.slots[index] = TrafficSlot {
                    agent,
                    active: true,
                };
            }
            None => {
                self.slots.push(TrafficSlot {
                    agent,
                    active: true,
                });
                log::debug!("Traffic pool grew to {} slots", self.capacity());
            }
        }
        id
    }

    pub fn despawn(&mut self, id: u32) -> bool {
        let found = self
            .slots
            .iter()
            .position(|s| s.active && s.agent.id == id);
        match found {
            Some(index) => {
                self.slots[index].active = false;
                self.free.push(index);
                true
            }
            None => false,
        }
    }

    /// Whether a new car at (`lane`, `z`) keeps clear of existing cars and the player
    pub fn is_clear(&self, lane: usize, z: f32, player_position: Vec3, tuning: &Tuning) -> bool {
        let gap = tuning.traffic.spawn_gap;
        let road = &tuning.road;
        let blocked_by_car = self.iter().any(|a| {
            let shares_lane = a.lane == lane || a.target_lane == lane;
            shares_lane && (a.position.z - z).abs() < gap
        });
        let blocked_by_player =
            road.lane_at(player_position.x) == lane && (player_position.z - z).abs() < gap;
        !blocked_by_car && !blocked_by_player
    }

    /// Update every car, then despawn stragglers and top the pool back up
    pub fn update<R: Rng>(
        &mut self,
        dt: f32,
        player_position: Vec3,
        player_speed: f32,
        tuning: &Tuning,
        rng: &mut R,
    ) {
        for agent in self.iter_mut() {
            agent.update(dt, player_position, player_speed, tuning, rng);
        }
        self.maintain(player_position, tuning, rng);
    }

    /// Despawn cars far behind the player and spawn until the target count is met
    pub fn maintain<R: Rng>(&mut self, player_position: Vec3, tuning: &Tuning, rng: &mut R) {
        let cfg: &TrafficTuning = &tuning.traffic;

        let behind: Vec<u32> = self
            .iter()
            .filter(|a| a.position.z < player_position.z - cfg.despawn_distance)
            .map(|a| a.id)
            .collect();
        for id in behind {
            self.despawn(id);
            log::debug!("Despawned traffic car {}", id);
        }

        let missing = cfg.count.saturating_sub(self.active_count());
        for _ in 0..missing {
            let mut placed = false;
            for _ in 0..cfg.spawn_attempts {
                let lane = rng.random_range(0..tuning.road.lane_count.max(1));
                let z = player_position.z
                    + sample(rng, cfg.spawn_ahead_min, cfg.spawn_ahead_max);
                if self.is_clear(lane, z, player_position, tuning) {
                    let speed = sample(rng, cfg.min_speed, cfg.max_speed);
                    self.spawn(lane, z, speed, tuning);
                    placed = true;
                    break;
                }
            }
            if !placed {
                // Try again next tick
                log::debug!("No clear spawn position for traffic car");
                break;
            }
        }
    }
}

/// Uniform sample from `[lo, hi]`, tolerating an empty range
fn sample<R: Rng>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.random_range(lo..=hi)
    } else {
        lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn calm_tuning() -> Tuning {
        let mut tuning = Tuning::default();
        tuning.traffic.lane_change_probability = 0.0;
        tuning
    }

    #[test]
    fn test_cruises_forward() {
        let tuning = calm_tuning();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut agent = TrafficAgent::new(0, 1, 100.0, 50.0, &tuning);
        agent.update(1.0, Vec3::ZERO, 0.0, &tuning, &mut rng);
        assert!((agent.position.z - (100.0 + 50.0 * 0.447)).abs() < 1e-3);
        assert_eq!(agent.position.x, tuning.road.lane_center(1));
    }

    #[test]
    fn test_brakes_for_closing_player() {
        let tuning = calm_tuning();
        let mut rng = Pcg32::seed_from_u64(1);
        let lane_x = tuning.road.lane_center(2);
        let player = Vec3::new(lane_x, 0.7, 0.0);

        let mut agent = TrafficAgent::new(0, 2, 20.0, 50.0, &tuning);
        agent.update(0.0, player, 80.0, &tuning, &mut rng);
        assert!(agent.is_braking);

        // Player not faster
        agent.update(0.0, player, 40.0, &tuning, &mut rng);
        assert!(!agent.is_braking);

        // Different lane
        let other_lane = Vec3::new(tuning.road.lane_center(0), 0.7, 0.0);
        agent.update(0.0, other_lane, 80.0, &tuning, &mut rng);
        assert!(!agent.is_braking);

        // Behind the player
        let ahead_player = Vec3::new(lane_x, 0.7, 40.0);
        agent.update(0.0, ahead_player, 80.0, &tuning, &mut rng);
        assert!(!agent.is_braking);
    }

    #[test]
    fn test_lane_change_completes() {
        let tuning = calm_tuning();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut agent = TrafficAgent::new(0, 1, 0.0, 50.0, &tuning);
        assert!(agent.begin_lane_change(1, tuning.road.lane_count));
        assert_eq!(agent.lane_change_progress, 0.0);

        agent.update(0.25, Vec3::ZERO, 0.0, &tuning, &mut rng);
        assert_eq!(agent.lane, 1);
        assert!((agent.lane_change_progress - 0.5).abs() < 1e-6);
        let mid = (tuning.road.lane_center(1) + tuning.road.lane_center(2)) / 2.0;
        assert!((agent.position.x - mid).abs() < 1e-4);

        agent.update(0.25, Vec3::ZERO, 0.0, &tuning, &mut rng);
        assert_eq!(agent.lane, 2);
        assert_eq!(agent.target_lane, 2);
        assert_eq!(agent.lane_change_progress, 0.0);
        assert_eq!(agent.position.x, tuning.road.lane_center(2));
    }

    #[test]
    fn test_lane_change_stays_on_road() {
        let tuning = calm_tuning();
        let mut left = TrafficAgent::new(0, 0, 0.0, 50.0, &tuning);
        assert!(!left.begin_lane_change(-1, 4));
        let mut right = TrafficAgent::new(1, 3, 0.0, 50.0, &tuning);
        assert!(!right.begin_lane_change(1, 4));
        assert!(right.begin_lane_change(-1, 4));
        // Already changing
        assert!(!right.begin_lane_change(-1, 4));
    }

    #[test]
    fn test_random_lane_changes_keep_lanes_valid() {
        let mut tuning = Tuning::default();
        tuning.traffic.lane_change_probability = 0.5;
        let mut rng = Pcg32::seed_from_u64(7);
        let mut agent = TrafficAgent::new(0, 0, 0.0, 40.0, &tuning);
        let mut changed = false;
        for _ in 0..500 {
            agent.update(1.0 / 60.0, Vec3::ZERO, 0.0, &tuning, &mut rng);
            assert!(agent.lane < 4 && agent.target_lane < 4);
            changed |= agent.lane != 0;
        }
        assert!(changed);
    }

    #[test]
    fn test_pool_fills_to_target() {
        let tuning = calm_tuning();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut pool = TrafficPool::new();
        for _ in 0..10 {
            pool.maintain(Vec3::ZERO, &tuning, &mut rng);
        }
        assert_eq!(pool.active_count(), tuning.traffic.count);
        for agent in pool.iter() {
            assert!(agent.position.z >= tuning.traffic.spawn_ahead_min);
            assert!(agent.lane < tuning.road.lane_count);
            assert!(agent.speed >= 30.0 && agent.speed <= 60.0);
        }
    }

    #[test]
    fn test_spawns_do_not_overlap() {
        let tuning = calm_tuning();
        let mut rng = Pcg32::seed_from_u64(11);
        let mut pool = TrafficPool::new();
        for _ in 0..10 {
            pool.maintain(Vec3::ZERO, &tuning, &mut rng);
        }
        let agents: Vec<&TrafficAgent> = pool.iter().collect();
        for (i, a) in agents.iter().enumerate() {
            for b in &agents[i + 1..] {
                if a.lane == b.lane {
                    assert!((a.position.z - b.position.z).abs() >= tuning.traffic.spawn_gap);
                }
            }
        }
    }

    #[test]
    fn test_despawn_behind_and_reuse_slot() {
        let mut tuning = calm_tuning();
        tuning.traffic.count = 1;
        let mut rng = Pcg32::seed_from_u64(5);
        let mut pool = TrafficPool::new();
        pool.maintain(Vec3::ZERO, &tuning, &mut rng);
        assert_eq!(pool.active_count(), 1);
        let first_id = pool.iter().next().unwrap().id;

        // Player far ahead; the car is left behind and replaced in the same slot
        pool.maintain(Vec3::new(0.0, 0.0, 5000.0), &tuning, &mut rng);
        assert_eq!(pool.active_count(), 1);
        assert_eq!(pool.capacity(), 1);
        let agent = pool.iter().next().unwrap();
        assert_ne!(agent.id, first_id);
        assert!(agent.position.z > 5000.0);
    }

    #[test]
    fn test_clear_keeps_slots() {
        let tuning = calm_tuning();
        let mut pool = TrafficPool::new();
        pool.spawn(0, 10.0, 40.0, &tuning);
        pool.spawn(1, 10.0, 40.0, &tuning);
        pool.clear();
        assert_eq!(pool.active_count(), 0);
        pool.spawn(2, 10.0, 40.0, &tuning);
        assert_eq!(pool.capacity(), 2);
        assert!(!pool.despawn(999));
    }
}
