//! Per-frame simulation tick
//!
//! Sequences the player, traffic, collision and world updates and folds the
//! outcome into damage, score and game phase.

use super::collision::{check_collisions, near_miss_indices, separation_vector};
use super::state::{CollisionEvent, FrameReport, GamePhase, SimulationState};
use crate::consts::MAX_FRAME_DT;
use crate::input::InputState;

/// Advance the simulation by one host frame and publish its report
pub fn tick<'a>(state: &'a mut SimulationState, input: &InputState, dt: f32) -> &'a FrameReport {
    let dt = if dt.is_finite() {
        dt.clamp(0.0, MAX_FRAME_DT)
    } else {
        0.0
    };

    if input.camera_switch {
        state.camera = state.camera.next();
        log::debug!("Camera mode: {:?}", state.camera);
    }

    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                log::info!("Paused");
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Playing;
                log::info!("Resumed");
            }
            GamePhase::Wrecked => {}
        }
    }

    // Don't simulate while paused or wrecked
    if state.phase != GamePhase::Playing {
        state.report.phase = state.phase;
        state.report.camera = state.camera;
        state.report.collisions.clear();
        state.report.near_misses = 0;
        return &state.report;
    }

    state.elapsed += dt;
    let start_z = state.player.position.z;

    state.player.update(dt, input);
    let player_position = state.player.position;
    let player_speed = state.player.speed;

    state.traffic.update(
        dt,
        player_position,
        player_speed,
        &state.tuning,
        &mut state.rng,
    );

    // Contacts
    let colliders = state.traffic.colliders();
    let ids: Vec<u32> = state.traffic.iter().map(|a| a.id).collect();
    let player_box = state.player.collider();
    let hits = check_collisions(&player_box, &colliders);

    let mut events = Vec::with_capacity(hits.len());
    let mut hit_ids = Vec::with_capacity(hits.len());
    for hit in &hits {
        let separation = separation_vector(&state.player.collider(), &hit.other);
        state.player.on_collision(hit, separation);
        events.push(CollisionEvent {
            point: hit.point,
            intensity: hit.intensity,
        });
        hit_ids.push(ids[hit.index]);
    }
    if !hits.is_empty() {
        log::debug!(
            "{} collision(s), damage now {:.1}",
            hits.len(),
            state.player.damage
        );
    }

    // Near misses; a car scores once per pass and never in the tick it was hit
    let threshold = state.tuning.scoring.near_miss_distance;
    let in_band: Vec<u32> = near_miss_indices(&player_box, &colliders, threshold)
        .map(|i| ids[i])
        .collect();
    let mut near_misses = 0u32;
    for agent in state.traffic.iter_mut() {
        if hit_ids.contains(&agent.id) {
            agent.near_miss_scored = true;
        } else if in_band.contains(&agent.id) {
            if !agent.near_miss_scored {
                agent.near_miss_scored = true;
                near_misses += 1;
            }
        } else {
            agent.near_miss_scored = false;
        }
    }
    state.total_near_misses += near_misses;

    state.world.update(
        dt,
        state.player.position,
        state.player.speed,
        &mut state.rng,
    );

    // Score: near misses plus forward distance survived
    let scoring = &state.tuning.scoring;
    state.score += near_misses as u64 * scoring.near_miss_points;
    let forward = (state.player.position.z - start_z).max(0.0);
    state.distance += forward;
    state.score_carry += forward * scoring.points_per_unit;
    let whole = state.score_carry.floor();
    state.score += whole as u64;
    state.score_carry -= whole;

    if state.player.is_wrecked() {
        state.phase = GamePhase::Wrecked;
        log::info!(
            "Wrecked after {:.0} units, {} near misses, score {}",
            state.distance,
            state.total_near_misses,
            state.score
        );
    }

    state.report = state.build_report(events, near_misses);
    &state.report
}
