//! Player car: arcade handling model
//!
//! Input drives speed and heading directly; there is no force integration.
//! Gear and RPM are derived from speed every tick for the HUD and engine
//! audio.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collider::Collider;
use super::collision::{Collision, apply_bounce};
use crate::consts::{GEAR_COUNT, MAX_DAMAGE};
use crate::input::InputState;
use crate::tuning::{Tuning, VehicleTuning};
use crate::{clamp, heading_to_forward, map_range, normalize_angle};

/// Drift angle magnitude below which it snaps to zero
const DRIFT_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerVehicle {
    pub position: Vec3,
    /// Y-axis rotation in radians; 0 faces +z
    pub heading: f32,
    /// Signed speed in mph
    pub speed: f32,
    pub rpm: f32,
    /// Current gear, 1..=6
    pub gear: u8,
    /// Nitro tank fill, 0..=1
    pub nitro_amount: f32,
    pub is_drifting: bool,
    pub is_nitro_active: bool,
    pub is_braking: bool,
    /// Accumulated lateral slip angle
    pub drift_angle: f32,
    /// 0..=100
    pub damage: f32,
    /// World-space velocity of the last tick (units/s)
    pub velocity: Vec3,
    tuning: VehicleTuning,
    /// Largest |x| the car centre may reach
    lateral_limit: f32,
}

impl PlayerVehicle {
    pub fn new(tuning: &Tuning) -> Self {
        let vehicle = tuning.vehicle.clone();
        let lateral_limit = (tuning.road.road_width / 2.0 - vehicle.half_extents.x).max(0.0);
        let mut player = Self {
            position: Vec3::ZERO,
            heading: 0.0,
            speed: 0.0,
            rpm: 0.0,
            gear: 1,
            nitro_amount: 1.0,
            is_drifting: false,
            is_nitro_active: false,
            is_braking: false,
            drift_angle: 0.0,
            damage: 0.0,
            velocity: Vec3::ZERO,
            tuning: vehicle,
            lateral_limit,
        };
        player.reset();
        player
    }

    /// Restore the start-of-round state
    pub fn reset(&mut self) {
        self.position = Vec3::new(0.0, self.tuning.half_extents.y, 0.0);
        self.heading = 0.0;
        self.speed = 0.0;
        self.gear = 1;
        self.rpm = self.tuning.idle_rpm;
        self.nitro_amount = 1.0;
        self.is_drifting = false;
        self.is_nitro_active = false;
        self.is_braking = false;
        self.drift_angle = 0.0;
        self.damage = 0.0;
        self.velocity = Vec3::ZERO;
    }

    /// Top speed for this tick, including the nitro boost
    pub fn effective_max_speed(&self) -> f32 {
        if self.is_nitro_active {
            self.tuning.max_speed * self.tuning.nitro_boost
        } else {
            self.tuning.max_speed
        }
    }

    /// Advance one tick
    pub fn update(&mut self, dt: f32, input: &InputState) {
        let t = &self.tuning;
        let steer = input.steer();

        // Acceleration; braking while rolling forward overrides everything
        let mut acceleration = 0.0;
        if input.forward {
            acceleration = t.acceleration;
        } else if input.backward {
            acceleration = -t.brake_force;
        }
        if input.brake && self.speed > 0.0 {
            acceleration = -t.brake_force * 1.5;
        }
        self.is_braking = (input.brake || input.backward) && self.speed > 0.0;

        // Nitro
        self.is_nitro_active =
            input.nitro && self.nitro_amount > 0.0 && self.speed > t.nitro_min_speed;
        if self.is_nitro_active {
            self.nitro_amount = (self.nitro_amount - dt / t.nitro_duration).max(0.0);
        } else {
            self.nitro_amount = (self.nitro_amount + dt / t.nitro_recharge).min(1.0);
        }
        let max_speed = self.effective_max_speed();

        // Speed; coasting friction is applied per tick, not per second
        self.speed += acceleration * dt;
        if input.is_coasting() {
            self.speed *= t.friction;
            if self.speed.abs() < t.idle_snap_speed {
                self.speed = 0.0;
            }
        }
        self.speed = clamp(self.speed, -t.reverse_max_speed, max_speed);

        // Steering loses authority as speed rises
        let speed_ratio = if t.max_speed > 0.0 {
            self.speed.abs() / t.max_speed
        } else {
            0.0
        };
        let steering_factor = (1.0 - 0.5 * speed_ratio).max(0.5);

        // Drift
        self.is_drifting = input.brake && steer != 0.0 && self.speed > t.drift_min_speed;
        if self.is_drifting {
            self.drift_angle += steer * t.drift_rate * dt;
            self.drift_angle *= t.drift_factor;
        } else {
            self.drift_angle *= t.drift_recovery;
            if self.drift_angle.abs() < DRIFT_EPSILON {
                self.drift_angle = 0.0;
            }
        }

        // Reversing flips the steering sense; a stationary car cannot turn
        let direction = if self.speed < 0.0 { -1.0 } else { 1.0 };
        let speed_factor = (self.speed.abs() / t.full_steer_speed).min(1.0);
        let turn = (steer * t.turn_speed * steering_factor + self.drift_angle) * dt;
        self.heading = normalize_angle(self.heading + turn * direction * speed_factor);

        // Position
        self.velocity = heading_to_forward(self.heading) * self.speed * t.units_per_mph;
        self.position += self.velocity * dt;
        self.position.x = clamp(self.position.x, -self.lateral_limit, self.lateral_limit);
        self.position.y = t.half_extents.y;

        let (gear, rpm) = gear_and_rpm(self.speed, t);
        self.gear = gear;
        self.rpm = rpm;
    }

    /// React to a contact reported by the collision detector
    ///
    /// `separation` is the push that moves the player clear of the other box.
    pub fn on_collision(&mut self, hit: &Collision, separation: Vec3) {
        let impact = self.speed.abs() * hit.intensity.max(self.tuning.min_impact_share);
        self.add_damage(impact * self.tuning.collision_damage);
        self.speed *= 1.0 - self.tuning.collision_bounce;
        self.position += separation;
        self.velocity = apply_bounce(self.velocity, separation, self.tuning.collision_bounce);
    }

    /// Add (or with a negative amount, repair) damage, clamped to [0, 100]
    pub fn add_damage(&mut self, amount: f32) {
        if amount.is_finite() {
            self.damage = clamp(self.damage + amount, 0.0, MAX_DAMAGE);
        }
    }

    pub fn is_wrecked(&self) -> bool {
        self.damage >= MAX_DAMAGE
    }

    pub fn collider(&self) -> Collider {
        Collider::new(self.position, self.tuning.half_extents)
    }
}

/// Gear and RPM for a speed
///
/// Gear is the highest one whose lower threshold the speed meets. RPM sweeps
/// from idle to redline across each gear's speed span.
pub fn gear_and_rpm(speed: f32, tuning: &VehicleTuning) -> (u8, f32) {
    let speed = speed.abs();
    let thresholds = &tuning.gear_thresholds;

    let gear = (1..GEAR_COUNT)
        .take_while(|&i| speed >= thresholds[i])
        .last()
        .map_or(1, |i| i + 1);

    // A zero-width span maps to idle
    let rpm = map_range(
        speed,
        thresholds[gear - 1],
        thresholds[gear],
        tuning.idle_rpm,
        tuning.redline_rpm,
    );

    (gear as u8, clamp(rpm, tuning.idle_rpm, tuning.redline_rpm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn player() -> PlayerVehicle {
        PlayerVehicle::new(&Tuning::default())
    }

    fn throttle() -> InputState {
        InputState {
            forward: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_accelerates_forward() {
        let mut p = player();
        for _ in 0..60 {
            p.update(DT, &throttle());
        }
        assert!((p.speed - 40.0).abs() < 0.01);
        assert!(p.position.z > 0.0);
        assert_eq!(p.position.x, 0.0);
    }

    #[test]
    fn test_coasting_decays_and_snaps_to_zero() {
        let mut p = player();
        p.speed = 5.0;
        for _ in 0..1000 {
            p.update(DT, &InputState::default());
        }
        assert_eq!(p.speed, 0.0);
    }

    #[test]
    fn test_brake_overrides_throttle() {
        let mut p = player();
        p.speed = 100.0;
        let input = InputState {
            forward: true,
            brake: true,
            ..Default::default()
        };
        p.update(0.1, &input);
        assert!((p.speed - 91.0).abs() < 1e-3);
        assert!(p.is_braking);
    }

    #[test]
    fn test_reverse_is_limited() {
        let mut p = player();
        let input = InputState {
            backward: true,
            ..Default::default()
        };
        for _ in 0..600 {
            p.update(DT, &input);
        }
        assert_eq!(p.speed, -20.0);
        assert!(p.position.z < 0.0);
        assert!(!p.is_braking);
    }

    #[test]
    fn test_top_speed_and_nitro_boost() {
        let mut p = player();
        p.speed = 250.0;
        p.update(DT, &throttle());
        assert_eq!(p.speed, 250.0);

        let boost = InputState {
            forward: true,
            nitro: true,
            ..Default::default()
        };
        p.update(DT, &boost);
        assert!(p.is_nitro_active);
        assert!(p.speed > 250.0);
        assert!(p.nitro_amount < 1.0);
    }

    #[test]
    fn test_nitro_drains_and_recharges() {
        let mut p = player();
        p.speed = 100.0;
        let boost = InputState {
            forward: true,
            nitro: true,
            ..Default::default()
        };
        // 3 seconds empties the tank
        let mut ticks = 0;
        while p.nitro_amount > 0.0 && ticks < 400 {
            p.update(DT, &boost);
            ticks += 1;
        }
        assert_eq!(p.nitro_amount, 0.0);
        assert!((179..=182).contains(&ticks));

        p.update(1.0, &throttle());
        assert!((p.nitro_amount - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_nitro_needs_speed() {
        let mut p = player();
        let boost = InputState {
            nitro: true,
            ..Default::default()
        };
        p.update(DT, &boost);
        assert!(!p.is_nitro_active);
        assert_eq!(p.nitro_amount, 1.0);
    }

    #[test]
    fn test_steering_right_moves_toward_positive_x() {
        let mut p = player();
        p.speed = 60.0;
        let input = InputState {
            forward: true,
            right: true,
            ..Default::default()
        };
        for _ in 0..30 {
            p.update(DT, &input);
        }
        assert!(p.heading > 0.0);
        assert!(p.position.x > 0.0);
    }

    #[test]
    fn test_reverse_inverts_steering() {
        let mut p = player();
        p.speed = -15.0;
        let input = InputState {
            backward: true,
            right: true,
            ..Default::default()
        };
        p.update(DT, &input);
        assert!(p.heading < 0.0);
    }

    #[test]
    fn test_stationary_car_does_not_turn() {
        let mut p = player();
        let input = InputState {
            left: true,
            ..Default::default()
        };
        p.update(DT, &input);
        assert_eq!(p.heading, 0.0);
    }

    #[test]
    fn test_high_speed_steers_slower() {
        let input = InputState {
            forward: true,
            right: true,
            ..Default::default()
        };
        let mut slow = player();
        slow.speed = 20.0;
        slow.update(DT, &input);
        let mut fast = player();
        fast.speed = 240.0;
        fast.update(DT, &input);
        assert!(fast.heading < slow.heading);
    }

    #[test]
    fn test_drift_engages_and_decays() {
        let mut p = player();
        p.speed = 120.0;
        let drift = InputState {
            forward: true,
            brake: true,
            left: true,
            ..Default::default()
        };
        p.update(DT, &drift);
        assert!(p.is_drifting);
        assert!(p.drift_angle < 0.0);

        for _ in 0..200 {
            p.update(DT, &throttle());
        }
        assert!(!p.is_drifting);
        assert_eq!(p.drift_angle, 0.0);
    }

    #[test]
    fn test_no_drift_below_threshold() {
        let mut p = player();
        p.speed = 20.0;
        let input = InputState {
            brake: true,
            right: true,
            ..Default::default()
        };
        p.update(DT, &input);
        assert!(!p.is_drifting);
    }

    #[test]
    fn test_stays_on_road() {
        let mut p = player();
        p.speed = 150.0;
        p.heading = 1.2;
        for _ in 0..600 {
            p.update(DT, &throttle());
        }
        assert!(p.position.x <= 9.0 + 1e-4);
    }

    #[test]
    fn test_gear_table() {
        let tuning = VehicleTuning::default();
        assert_eq!(gear_and_rpm(0.0, &tuning).0, 1);
        assert_eq!(gear_and_rpm(24.9, &tuning).0, 1);
        assert_eq!(gear_and_rpm(25.0, &tuning).0, 2);
        assert_eq!(gear_and_rpm(200.0, &tuning).0, 6);
        assert_eq!(gear_and_rpm(375.0, &tuning).0, 6);
        assert_eq!(gear_and_rpm(-15.0, &tuning).0, 1);
    }

    #[test]
    fn test_gear_at_200_mph() {
        let mut p = player();
        p.speed = 200.0;
        p.update(0.0, &throttle());
        assert_eq!(p.gear, 6);
        assert!(!p.is_nitro_active);
    }

    #[test]
    fn test_rpm_sweeps_within_gear() {
        let tuning = VehicleTuning::default();
        let (_, low) = gear_and_rpm(50.0, &tuning);
        let (_, high) = gear_and_rpm(84.0, &tuning);
        assert_eq!(low, tuning.idle_rpm);
        assert!(high > low && high <= tuning.redline_rpm);
        let (_, top) = gear_and_rpm(400.0, &tuning);
        assert_eq!(top, tuning.redline_rpm);
    }

    #[test]
    fn test_zero_width_gear_span() {
        let mut tuning = VehicleTuning::default();
        tuning.gear_thresholds = [0.0, 25.0, 50.0, 50.0, 130.0, 180.0, 250.0];
        // 50 lands in gear 4, whose span starts at 50 and ends at 130
        let (gear, rpm) = gear_and_rpm(50.0, &tuning);
        assert_eq!(gear, 4);
        assert!(rpm.is_finite());

        tuning.gear_thresholds = [0.0; 7];
        let (gear, rpm) = gear_and_rpm(10.0, &tuning);
        assert_eq!(gear, 6);
        assert_eq!(rpm, tuning.idle_rpm);
    }

    #[test]
    fn test_collision_response() {
        let mut p = player();
        p.speed = 100.0;
        p.velocity = Vec3::new(0.0, 0.0, 44.7);
        let other = Collider::new(Vec3::new(0.0, 0.7, 4.0), Vec3::new(1.0, 0.8, 2.3));
        let hit = Collision {
            point: Vec3::ZERO,
            intensity: 0.5,
            other,
            index: 0,
        };
        let separation = Vec3::new(0.0, 0.0, -0.5);
        p.on_collision(&hit, separation);
        assert!((p.damage - 10.0).abs() < 1e-4);
        assert_eq!(p.speed, 50.0);
        assert_eq!(p.position.z, -0.5);
        assert!(p.velocity.z < 0.0);
    }

    #[test]
    fn test_glancing_hit_uses_tuned_damage_floor() {
        let mut tuning = Tuning::default();
        tuning.vehicle.min_impact_share = 0.5;
        let mut p = PlayerVehicle::new(&tuning);
        p.speed = 100.0;
        let hit = Collision {
            point: Vec3::ZERO,
            intensity: 0.01,
            other: Collider::new(Vec3::new(1.9, 0.7, 0.0), Vec3::new(1.0, 0.8, 2.3)),
            index: 0,
        };
        p.on_collision(&hit, Vec3::new(-0.1, 0.0, 0.0));
        // 100 mph * 0.5 floor * 0.2 damage per mph
        assert!((p.damage - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_full_steer_speed_is_tunable() {
        let input = InputState {
            right: true,
            ..Default::default()
        };
        let mut tuning = Tuning::default();
        tuning.vehicle.full_steer_speed = 40.0;
        let mut sluggish = PlayerVehicle::new(&tuning);
        sluggish.speed = 20.0;
        sluggish.update(DT, &input);
        let mut nimble = player();
        nimble.speed = 20.0;
        nimble.update(DT, &input);
        assert!(sluggish.heading > 0.0);
        assert!(sluggish.heading < nimble.heading);
    }

    #[test]
    fn test_damage_clamps_and_wrecks() {
        let mut p = player();
        p.add_damage(60.0);
        p.add_damage(60.0);
        assert_eq!(p.damage, 100.0);
        assert!(p.is_wrecked());
        p.add_damage(-500.0);
        assert_eq!(p.damage, 0.0);
        p.add_damage(f32::NAN);
        assert_eq!(p.damage, 0.0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut p = player();
        p.speed = 123.0;
        p.damage = 40.0;
        p.heading = 0.3;
        p.nitro_amount = 0.2;
        p.reset();
        let once = format!("{:?}", p);
        p.reset();
        let twice = format!("{:?}", p);
        assert_eq!(once, twice);
        assert_eq!(p.speed, 0.0);
        assert_eq!(p.damage, 0.0);
    }

    fn arb_input() -> impl Strategy<Value = InputState> {
        (any::<[bool; 6]>()).prop_map(|b| InputState {
            forward: b[0],
            backward: b[1],
            left: b[2],
            right: b[3],
            brake: b[4],
            nitro: b[5],
            ..Default::default()
        })
    }

    proptest! {
        #[test]
        fn prop_speed_within_limits(
            inputs in prop::collection::vec(arb_input(), 1..200),
            dt in 0.0f32..0.1,
            start in -20.0f32..250.0,
        ) {
            let mut p = player();
            p.speed = start;
            for input in &inputs {
                p.update(dt, input);
                prop_assert!(p.speed >= -20.0);
                prop_assert!(p.speed <= p.effective_max_speed());
                prop_assert!((0.0..=1.0).contains(&p.nitro_amount));
                prop_assert!(p.position.is_finite());
                prop_assert!((1..=6).contains(&p.gear));
            }
        }

        #[test]
        fn prop_damage_stays_bounded(amounts in prop::collection::vec(-150.0f32..150.0, 0..50)) {
            let mut p = player();
            for amount in amounts {
                p.add_damage(amount);
                prop_assert!((0.0..=100.0).contains(&p.damage));
            }
        }
    }
}
