//! Data-driven game balance
//!
//! Every constant the simulation reads lives here so a host can load
//! overrides from JSON. Missing fields fall back to the defaults below.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Player car handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleTuning {
    /// Forward acceleration (mph/s)
    pub acceleration: f32,
    /// Braking / reverse deceleration (mph/s)
    pub brake_force: f32,
    /// Base steering rate (rad/s)
    pub turn_speed: f32,
    /// Per-tick drift angle retention while drifting (< 1)
    pub drift_factor: f32,
    /// Drift angle build-up per unit of steer (rad/s)
    pub drift_rate: f32,
    /// Per-tick drift angle retention while not drifting (faster than `drift_factor`)
    pub drift_recovery: f32,
    /// Minimum speed for a drift to engage
    pub drift_min_speed: f32,
    /// Max speed multiplier while nitro burns
    pub nitro_boost: f32,
    /// Seconds to empty a full nitro tank
    pub nitro_duration: f32,
    /// Seconds to refill an empty nitro tank
    pub nitro_recharge: f32,
    /// Nitro only burns above this speed
    pub nitro_min_speed: f32,
    pub max_speed: f32,
    /// Fastest reverse speed (positive number)
    pub reverse_max_speed: f32,
    /// Per-tick speed retention when coasting
    pub friction: f32,
    /// Coasting speeds below this snap to zero
    pub idle_snap_speed: f32,
    /// Fraction of speed lost on impact
    pub collision_bounce: f32,
    /// Damage per mph of impact speed
    pub collision_damage: f32,
    /// Lower speed bound of each gear, plus the top of the last gear
    pub gear_thresholds: [f32; 7],
    pub idle_rpm: f32,
    pub redline_rpm: f32,
    pub half_extents: Vec3,
    /// World units travelled per second at 1 mph
    pub units_per_mph: f32,
    /// Speed at which steering reaches full authority
    pub full_steer_speed: f32,
    /// Floor on impact intensity when scaling collision damage
    pub min_impact_share: f32,
}

impl Default for VehicleTuning {
    fn default() -> Self {
        Self {
            acceleration: 40.0,
            brake_force: 60.0,
            turn_speed: 2.2,
            drift_factor: 0.95,
            drift_rate: 1.5,
            drift_recovery: 0.85,
            drift_min_speed: 30.0,
            nitro_boost: 1.5,
            nitro_duration: 3.0,
            nitro_recharge: 10.0,
            nitro_min_speed: 10.0,
            max_speed: 250.0,
            reverse_max_speed: 20.0,
            friction: 0.99,
            idle_snap_speed: 0.5,
            collision_bounce: 0.5,
            collision_damage: 0.2,
            gear_thresholds: [0.0, 25.0, 50.0, 85.0, 130.0, 180.0, 250.0],
            idle_rpm: 800.0,
            redline_rpm: 7000.0,
            half_extents: Vec3::new(1.0, 0.7, 2.2),
            units_per_mph: 0.447,
            full_steer_speed: 10.0,
            min_impact_share: 0.25,
        }
    }
}

/// AI traffic behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficTuning {
    /// Target number of active cars
    pub count: usize,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Chance per tick that an idle car starts a lane change
    pub lane_change_probability: f32,
    /// Lane change progress per second (2.0 = half a second per change)
    pub lane_change_rate: f32,
    /// How far ahead of the player a car lights its brake lamps
    pub braking_distance: f32,
    pub spawn_ahead_min: f32,
    pub spawn_ahead_max: f32,
    /// Minimum same-lane gap between a new car and existing ones
    pub spawn_gap: f32,
    /// Cars this far behind the player are despawned
    pub despawn_distance: f32,
    /// Candidate positions tried per missing car each tick
    pub spawn_attempts: u32,
    pub half_extents: Vec3,
}

impl Default for TrafficTuning {
    fn default() -> Self {
        Self {
            count: 15,
            min_speed: 30.0,
            max_speed: 60.0,
            lane_change_probability: 0.002,
            lane_change_rate: 2.0,
            braking_distance: 30.0,
            spawn_ahead_min: 60.0,
            spawn_ahead_max: 400.0,
            spawn_gap: 20.0,
            despawn_distance: 50.0,
            spawn_attempts: 8,
            half_extents: Vec3::new(1.0, 0.8, 2.3),
        }
    }
}

/// Road cross-section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadTuning {
    pub road_width: f32,
    pub lane_count: usize,
    pub lane_width: f32,
}

impl Default for RoadTuning {
    fn default() -> Self {
        Self {
            road_width: 20.0,
            lane_count: 4,
            lane_width: 5.0,
        }
    }
}

impl RoadTuning {
    /// Lateral centre of a lane (lane 0 is the leftmost, at -x)
    pub fn lane_center(&self, lane: usize) -> f32 {
        -self.road_width / 2.0 + self.lane_width * (lane as f32 + 0.5)
    }

    /// Nearest lane to a lateral position
    pub fn lane_at(&self, x: f32) -> usize {
        if self.lane_count == 0 || self.lane_width <= 0.0 {
            return 0;
        }
        let raw = ((x + self.road_width / 2.0) / self.lane_width).floor();
        (raw.max(0.0) as usize).min(self.lane_count - 1)
    }
}

/// Score rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTuning {
    /// Extra clearance beyond the minimum safe distance that still counts
    pub near_miss_distance: f32,
    pub near_miss_points: u64,
    /// Survival score per world unit driven forward
    pub points_per_unit: f32,
}

impl Default for ScoringTuning {
    fn default() -> Self {
        Self {
            near_miss_distance: 1.5,
            near_miss_points: 100,
            points_per_unit: 1.0,
        }
    }
}

/// Spacing of one recycled chunk row
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkLayout {
    /// Length of one chunk along the travel axis
    pub pitch: f32,
    pub count: usize,
    /// How far behind the player a chunk may trail before it is recycled
    pub margin: f32,
}

impl ChunkLayout {
    /// Length of the whole tiled row
    pub fn span(&self) -> f32 {
        self.pitch * self.count as f32
    }
}

/// Infinite-scroll scenery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    pub road: ChunkLayout,
    pub buildings: ChunkLayout,
    pub lamps: ChunkLayout,
    /// Distance from the road edge to the building row
    pub building_setback: f32,
    pub building_min_height: f32,
    pub building_max_height: f32,
    /// Distance from the road edge to the lamp row
    pub lamp_setback: f32,
    /// Sun position relative to the player
    pub sun_offset: Vec3,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            road: ChunkLayout {
                pitch: 50.0,
                count: 20,
                margin: 100.0,
            },
            buildings: ChunkLayout {
                pitch: 40.0,
                count: 25,
                margin: 80.0,
            },
            lamps: ChunkLayout {
                pitch: 30.0,
                count: 30,
                margin: 60.0,
            },
            building_setback: 12.0,
            building_min_height: 10.0,
            building_max_height: 60.0,
            lamp_setback: 1.0,
            sun_offset: Vec3::new(-200.0, 300.0, 600.0),
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub vehicle: VehicleTuning,
    pub traffic: TrafficTuning,
    pub road: RoadTuning,
    pub scoring: ScoringTuning,
    pub world: WorldTuning,
}

/// Reasons a tuning file is rejected
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid tuning: {0}")]
    Invalid(String),
}

fn invalid(reason: impl Into<String>) -> TuningError {
    TuningError::Invalid(reason.into())
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations the simulation cannot keep its invariants under
    pub fn validate(&self) -> Result<(), TuningError> {
        let v = &self.vehicle;
        if v.max_speed <= 0.0 || v.reverse_max_speed < 0.0 {
            return Err(invalid("vehicle speed limits must be positive"));
        }
        if v.nitro_duration <= 0.0 || v.nitro_recharge <= 0.0 || v.nitro_boost < 1.0 {
            return Err(invalid("nitro duration/recharge must be positive and boost >= 1"));
        }
        if !(0.0..=1.0).contains(&v.friction)
            || !(0.0..1.0).contains(&v.drift_factor)
            || !(0.0..1.0).contains(&v.drift_recovery)
        {
            return Err(invalid("per-tick retention factors must lie in [0, 1)"));
        }
        if !(0.0..=1.0).contains(&v.collision_bounce) {
            return Err(invalid("collision_bounce must lie in [0, 1]"));
        }
        if v.gear_thresholds.windows(2).any(|w| w[1] < w[0]) {
            return Err(invalid("gear_thresholds must be ascending"));
        }
        if v.full_steer_speed <= 0.0 || v.min_impact_share <= 0.0 {
            return Err(invalid("full_steer_speed and min_impact_share must be positive"));
        }
        if v.redline_rpm < v.idle_rpm {
            return Err(invalid("redline_rpm must not be below idle_rpm"));
        }

        let r = &self.road;
        if r.lane_count == 0 || r.lane_width <= 0.0 {
            return Err(invalid("road needs at least one lane of positive width"));
        }
        if r.lane_count as f32 * r.lane_width > r.road_width + f32::EPSILON {
            return Err(invalid(format!(
                "{} lanes of width {} do not fit a road of width {}",
                r.lane_count, r.lane_width, r.road_width
            )));
        }

        let t = &self.traffic;
        if t.min_speed > t.max_speed || t.min_speed < 0.0 {
            return Err(invalid("traffic speed range is inverted or negative"));
        }
        if t.spawn_ahead_min > t.spawn_ahead_max {
            return Err(invalid("traffic spawn window is inverted"));
        }
        if !(0.0..=1.0).contains(&t.lane_change_probability) || t.lane_change_rate <= 0.0 {
            return Err(invalid("lane change probability/rate out of range"));
        }

        let w = &self.world;
        for (name, layout) in [("road", w.road), ("buildings", w.buildings), ("lamps", w.lamps)] {
            if layout.pitch <= 0.0 || layout.count == 0 {
                return Err(invalid(format!("{name} chunks need a positive pitch and count")));
            }
            if layout.margin < 0.0 || layout.margin >= layout.span() {
                return Err(invalid(format!(
                    "{name} recycle margin must be within the tiled span"
                )));
            }
        }
        if w.building_min_height > w.building_max_height {
            return Err(invalid("building height range is inverted"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{ "vehicle": { "max_speed": 180.0 } }"#).unwrap();
        assert_eq!(tuning.vehicle.max_speed, 180.0);
        assert_eq!(tuning.vehicle.acceleration, VehicleTuning::default().acceleration);
        assert_eq!(tuning.road.lane_count, 4);
    }

    #[test]
    fn test_json_round_trip_keeps_values() {
        let mut tuning = Tuning::default();
        tuning.traffic.count = 3;
        let json = tuning.to_json().unwrap();
        let back = Tuning::from_json(&json).unwrap();
        assert_eq!(back.traffic.count, 3);
    }

    #[test]
    fn test_rejects_lanes_wider_than_road() {
        let err = Tuning::from_json(r#"{ "road": { "road_width": 8.0 } }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));
        assert!(err.to_string().contains("do not fit"));
    }

    #[test]
    fn test_rejects_bad_json() {
        let err = Tuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
    }

    #[test]
    fn test_rejects_margin_beyond_span() {
        let mut tuning = Tuning::default();
        tuning.world.lamps.margin = tuning.world.lamps.span();
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_rejects_descending_gears() {
        let mut tuning = Tuning::default();
        tuning.vehicle.gear_thresholds[3] = 10.0;
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_handling_overrides_load() {
        let tuning = Tuning::from_json(
            r#"{ "vehicle": { "full_steer_speed": 25.0, "min_impact_share": 0.5 } }"#,
        )
        .unwrap();
        assert_eq!(tuning.vehicle.full_steer_speed, 25.0);
        assert_eq!(tuning.vehicle.min_impact_share, 0.5);

        let err = Tuning::from_json(r#"{ "vehicle": { "full_steer_speed": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));
        let err = Tuning::from_json(r#"{ "vehicle": { "min_impact_share": -1.0 } }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));
    }

    #[test]
    fn test_parse_error_keeps_source() {
        use std::error::Error;

        let err = Tuning::from_json("[1, 2").unwrap_err();
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("failed to parse tuning"));
    }

    #[test]
    fn test_lane_geometry() {
        let road = RoadTuning::default();
        assert_eq!(road.lane_center(0), -7.5);
        assert_eq!(road.lane_center(3), 7.5);
        assert_eq!(road.lane_at(-7.5), 0);
        assert_eq!(road.lane_at(2.4), 2);
        assert_eq!(road.lane_at(100.0), 3);
        assert_eq!(road.lane_at(-100.0), 0);
    }
}
