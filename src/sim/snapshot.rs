//! Read-only view of a game state for the render layer
//!
//! Built once per frame and handed to the renderer; nothing in here feeds
//! back into the simulation.

use serde::Serialize;

use super::agent::{AgentKind, BehaviorTag, Direction};
use super::state::{Camera, GamePhase, GameState};

/// Fixed road geometry for drawing lanes and edges
#[derive(Debug, Clone, Serialize)]
pub struct RoadView {
    pub left: f32,
    pub width: f32,
    pub lane_count: u32,
    pub lane_width: f32,
    pub segment_length: f32,
    /// Segment y-coordinates, behind to ahead
    pub segments: Vec<f32>,
}

/// A vehicle's box and orientation
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VehicleView {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Rotation for drawing, radians
    pub tilt: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    #[serde(flatten)]
    pub body: VehicleView,
    pub speed: f32,
    pub crashed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentView {
    pub id: u32,
    pub kind: AgentKind,
    pub lane: u32,
    pub behavior: BehaviorTag,
    /// Lit turn signal this frame
    pub turn_signal: Option<Direction>,
    #[serde(flatten)]
    pub body: VehicleView,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub camera: Camera,
    pub road: RoadView,
    pub player: PlayerView,
    pub agents: Vec<AgentView>,
    pub score: u64,
    pub high_score: u64,
    pub game_over: bool,
}

impl GameState {
    pub fn snapshot(&self) -> Snapshot {
        let arena = &self.tuning.arena;
        let player = &self.player;

        Snapshot {
            canvas_width: arena.canvas_width,
            canvas_height: arena.canvas_height,
            camera: self.camera,
            road: RoadView {
                left: arena.road_left(),
                width: arena.road_width,
                lane_count: arena.lane_count,
                lane_width: arena.lane_width(),
                segment_length: arena.segment_length,
                segments: self.road.segments().collect(),
            },
            player: PlayerView {
                body: VehicleView {
                    x: player.pos().x,
                    y: player.pos().y,
                    width: player.size.x,
                    height: player.size.y,
                    tilt: player.tilt(self.tuning.steering.model),
                },
                speed: player.speed(),
                crashed: player.is_crashed(),
            },
            agents: self
                .traffic
                .agents()
                .iter()
                .map(|agent| AgentView {
                    id: agent.id,
                    kind: agent.kind,
                    lane: agent.lane,
                    behavior: agent.behavior.tag(),
                    turn_signal: agent.turn_signal(&self.tuning.traffic),
                    body: VehicleView {
                        x: agent.pos.x,
                        y: agent.pos.y,
                        width: agent.size.x,
                        height: agent.size.y,
                        tilt: agent.tilt(),
                    },
                })
                .collect(),
            score: self.score,
            high_score: self.high_score,
            game_over: self.phase == GamePhase::GameOver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::tick::{ControlInput, tick};
    use crate::tuning::Tuning;

    #[test]
    fn test_snapshot_mirrors_state() {
        let mut state = GameState::new(3, Tuning::default(), 12);
        let input = ControlInput {
            throttle: true,
            ..Default::default()
        };
        for _ in 0..30 {
            tick(&mut state, &input);
        }
        let snap = state.snapshot();
        assert_eq!(snap.agents.len(), state.traffic.len());
        assert_eq!(snap.road.segments.len(), state.road.len());
        assert_eq!(snap.high_score, 12);
        assert!(!snap.game_over);
        assert_eq!(snap.player.body.y, state.player.pos().y);
        assert_eq!(snap.road.left, 160.0);
    }

    #[test]
    fn test_snapshot_serializes_flat_json() {
        let state = GameState::new(3, Tuning::default(), 0);
        let json = serde_json::to_value(state.snapshot()).expect("serializable");
        assert_eq!(json["player"]["width"], 36.0);
        assert_eq!(json["player"]["crashed"], false);
        assert_eq!(json["road"]["lane_count"], 6);
        assert!(json["agents"].as_array().is_some_and(|a| a.is_empty()));
        assert_eq!(json["camera"]["y"], 0.0);
    }
}
