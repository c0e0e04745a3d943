//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use rand::Rng;

use super::collision::{vehicle_impulse, wall_impulse};
use super::state::{CrashCause, GameEvent, GamePhase, GameState};
use crate::tuning::ScoringMode;

/// Control state read once at the start of a tick
///
/// Input adapters write it as device events arrive (last write wins); the
/// platform clears the one-shot `restart` after each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlInput {
    pub throttle: bool,
    pub brake: bool,
    /// Normalized wheel position in [-1, 1] (wheel angle / max rotation)
    pub steering: f32,
    /// A drag or key hold is currently turning the wheel
    pub steering_active: bool,
    /// Start a new run (only honoured after game over)
    pub restart: bool,
}

impl ControlInput {
    pub fn set_throttle(&mut self, on: bool) {
        self.throttle = on;
    }

    pub fn set_brake(&mut self, on: bool) {
        self.brake = on;
    }

    /// Set the normalized wheel position (clamped to [-1, 1])
    pub fn set_steering(&mut self, normalized: f32) {
        self.steering = if normalized.is_finite() {
            normalized.clamp(-1.0, 1.0)
        } else {
            0.0
        };
    }

    pub fn set_steering_active(&mut self, active: bool) {
        self.steering_active = active;
    }

    pub fn request_restart(&mut self) {
        self.restart = true;
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &ControlInput) {
    if state.phase == GamePhase::GameOver {
        if input.restart {
            state.reset();
        } else {
            // Final frame stays up; only the wreck keeps sliding
            state.player.settle(&state.tuning);
        }
        return;
    }

    state.time_ticks += 1;

    update_camera(state);
    state
        .road
        .ensure_coverage(state.camera.y, state.tuning.arena.canvas_height);

    state.player.update(input, &state.tuning);

    let player_pos = Some(state.player.pos());
    state
        .traffic
        .spawn_tick(state.camera.y, player_pos, &state.tuning, &mut state.rng);
    let despawned =
        state
            .traffic
            .update_tick(state.camera.y, player_pos, &state.tuning, &mut state.rng);
    for id in despawned {
        state.passed.remove(&id);
    }

    check_player_traffic(state);
    if state.phase == GamePhase::Playing {
        check_player_wall(state);
    }
    if state.phase == GamePhase::Playing {
        update_score(state);
    }
}

/// Vertical follow is instant, horizontal is smoothed
fn update_camera(state: &mut GameState) {
    let arena = &state.tuning.arena;
    let target_x = state.player.pos().x - arena.canvas_width / 2.0;
    state.camera.x += (target_x - state.camera.x) * arena.camera_smoothing;
    state.camera.y = state.player.pos().y;
}

/// First overlapping agent (in id order) ends the run
fn check_player_traffic(state: &mut GameState) {
    let player_box = state.player.bounds();
    let player_speed = state.player.speed();
    let min_force = state.tuning.impact.min_vehicle_force;

    let hit = state.traffic.agents().iter().find_map(|agent| {
        vehicle_impulse(
            &player_box,
            player_speed,
            &agent.bounds(),
            agent.speed,
            min_force,
        )
        .map(|impulse| (agent.id, impulse))
    });

    let Some((agent_id, impulse)) = hit else {
        return;
    };
    let player_spin = state.rng.random::<f32>() - 0.5;
    let agent_spin = state.rng.random::<f32>() - 0.5;
    state
        .player
        .crash(impulse.impact, impulse.force, player_spin, &state.tuning);
    if let Some(agent) = state.traffic.get_mut(agent_id) {
        agent.apply_collision(-impulse.impact, impulse.force, agent_spin, &state.tuning);
    }
    log::debug!(
        "player hit agent {} (force {:.2})",
        agent_id,
        impulse.force
    );
    state.game_over(CrashCause::Traffic { agent_id });
}

fn check_player_wall(state: &mut GameState) {
    let arena = &state.tuning.arena;
    let Some(impulse) = wall_impulse(
        &state.player.bounds(),
        arena.road_left(),
        arena.road_right(),
        state.tuning.impact.wall_force,
    ) else {
        return;
    };
    let spin = state.rng.random::<f32>() - 0.5;
    state
        .player
        .crash(impulse.impact, impulse.force, spin, &state.tuning);
    state.game_over(CrashCause::Wall);
}

fn update_score(state: &mut GameState) {
    match state.tuning.scoring {
        ScoringMode::PassEvents => {
            let player_y = state.player.pos().y;
            let newly_passed: Vec<u32> = state
                .traffic
                .agents()
                .iter()
                .filter(|agent| agent.pos.y > player_y && !state.passed.contains(&agent.id))
                .map(|agent| agent.id)
                .collect();
            for agent_id in newly_passed {
                state.passed.insert(agent_id);
                state.score += 1;
                state.push_event(GameEvent::Passed { agent_id });
            }
        }
        ScoringMode::Distance => {
            state.score += state.player.speed().floor().max(0.0) as u64;
        }
    }
}
