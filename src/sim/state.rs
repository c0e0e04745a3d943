//! Game session state and core simulation types
//!
//! Everything a tick reads or writes lives here; the RNG is seeded once per
//! session so a seed plus an input sequence replays exactly.

use std::collections::BTreeSet;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::player::Player;
use super::road::RoadWindow;
use super::traffic::TrafficManager;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Run ended by a collision; waits for a restart
    GameOver,
}

/// What the player hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrashCause {
    Traffic { agent_id: u32 },
    Wall,
}

/// Notable things that happened during a tick, drained by the platform layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// An agent fell behind the player (pass scoring)
    Passed { agent_id: u32 },
    Crashed { cause: CrashCause, score: u64 },
    /// The run beat the stored best; persist it
    NewHighScore { score: u64 },
    Restarted,
}

/// World-space camera origin: x is the view's left edge, y tracks the player
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
}

/// Complete game session state
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    /// Session seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    /// Simulation tick counter (since the last reset)
    pub time_ticks: u64,
    pub phase: GamePhase,
    pub score: u64,
    /// Best score seen, including sessions loaded from storage
    pub high_score: u64,
    pub camera: Camera,
    pub road: RoadWindow,
    pub player: Player,
    pub traffic: TrafficManager,
    /// Agents already credited by pass scoring
    pub passed: BTreeSet<u32>,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new session with the given seed and stored high score
    pub fn new(seed: u64, tuning: Tuning, high_score: u64) -> Self {
        let player = Player::new(&tuning);
        let mut state = Self {
            road: RoadWindow::new(tuning.arena.segment_length),
            player,
            tuning,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            phase: GamePhase::Playing,
            score: 0,
            high_score,
            camera: Camera::default(),
            traffic: TrafficManager::new(),
            passed: BTreeSet::new(),
            events: Vec::new(),
        };
        state.center_camera();
        log::info!(
            "New session: seed={} lanes={} high_score={}",
            seed,
            state.tuning.arena.lane_count,
            high_score
        );
        state
    }

    /// Snap the camera onto the player and cover the road around it
    fn center_camera(&mut self) {
        let arena = &self.tuning.arena;
        self.camera = Camera {
            x: self.player.pos().x - arena.canvas_width / 2.0,
            y: self.player.pos().y,
        };
        self.road.ensure_coverage(self.camera.y, arena.canvas_height);
    }

    /// Discard traffic, road and score and start a fresh run.
    /// The RNG stream continues, so runs within a session differ.
    pub fn reset(&mut self) {
        self.time_ticks = 0;
        self.phase = GamePhase::Playing;
        self.score = 0;
        self.player = Player::new(&self.tuning);
        self.traffic.clear();
        self.road.clear();
        self.passed.clear();
        self.center_camera();
        self.events.push(GameEvent::Restarted);
        log::info!("Run restarted (high score {})", self.high_score);
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// End the run, recording a new high score if beaten
    pub(crate) fn game_over(&mut self, cause: CrashCause) {
        self.phase = GamePhase::GameOver;
        self.events.push(GameEvent::Crashed {
            cause,
            score: self.score,
        });
        log::info!("Game over ({:?}) with score {}", cause, self.score);

        if self.score > self.high_score {
            self.high_score = self.score;
            self.events.push(GameEvent::NewHighScore { score: self.score });
            log::info!("New high score: {}", self.score);
        }
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Events since the last drain, oldest first
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let state = GameState::new(12345, Tuning::default(), 7);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.score, 0);
        assert_eq!(state.high_score, 7);
        assert_eq!(state.camera, Camera { x: 0.0, y: 0.0 });
        assert!(!state.road.is_empty());
        assert!(state.traffic.is_empty());
    }

    #[test]
    fn test_game_over_records_high_score() {
        let mut state = GameState::new(1, Tuning::default(), 5);
        state.score = 9;
        state.game_over(CrashCause::Wall);
        assert!(state.is_game_over());
        assert_eq!(state.high_score, 9);
        assert_eq!(
            state.drain_events(),
            vec![
                GameEvent::Crashed {
                    cause: CrashCause::Wall,
                    score: 9
                },
                GameEvent::NewHighScore { score: 9 },
            ]
        );
        assert!(state.events().is_empty());
    }

    #[test]
    fn test_game_over_below_high_score_keeps_it() {
        let mut state = GameState::new(1, Tuning::default(), 50);
        state.score = 9;
        state.game_over(CrashCause::Traffic { agent_id: 3 });
        assert_eq!(state.high_score, 50);
        assert!(
            !state
                .events()
                .iter()
                .any(|e| matches!(e, GameEvent::NewHighScore { .. }))
        );
    }

    #[test]
    fn test_reset_clears_run() {
        let mut state = GameState::new(1, Tuning::default(), 0);
        state.score = 4;
        state.passed.insert(2);
        state.player.pose.pos.y = -5000.0;
        state.game_over(CrashCause::Wall);
        state.drain_events();

        state.reset();
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.score, 0);
        assert_eq!(state.high_score, 4);
        assert!(state.passed.is_empty());
        assert_eq!(state.player.pos().y, 0.0);
        assert_eq!(state.camera.y, 0.0);
        assert_eq!(state.drain_events(), vec![GameEvent::Restarted]);
    }
}
