//! Traffic agent: one autonomous vehicle and its behavior state machine
//!
//! Normal lane change: `Cruising -> Signaling -> ChangingLane -> Cruising`.
//! Evasive: `Cruising -> EmergencySwerve -> ChangingLane -> Cruising`.
//! Any state can be knocked into `Colliding`, which overrides steering until
//! the tumble settles and the agent re-seeks the nearest lane.
//!
//! All timed transitions are tick countdowns stored in the state itself, so
//! leaving a state early simply drops its counter.
//!
//! Kinds with a weave period drift while cruising: every period they pick a
//! random side and bias and hold that steering until the next pick.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::kinematics::{SteeringState, Tumble};
use crate::ms_to_ticks;
use crate::tuning::{KindProfile, TrafficTuning, Tuning};

/// Agent variant; selects a `KindProfile` from the traffic tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentKind {
    Ordinary,
    /// Erratic: frequent, unsignaled, unchecked lane changes
    Drunk,
    /// Long, slow vehicle
    Bus,
}

impl AgentKind {
    pub const ALL: [AgentKind; 3] = [AgentKind::Ordinary, AgentKind::Drunk, AgentKind::Bus];

    pub fn profile(self, traffic: &TrafficTuning) -> &KindProfile {
        match self {
            AgentKind::Ordinary => &traffic.ordinary,
            AgentKind::Drunk => &traffic.drunk,
            AgentKind::Bus => &traffic.bus,
        }
    }
}

/// Lateral direction of a lane change or swerve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Neighbouring lane in this direction, if the road has one
    pub fn neighbor_lane(self, lane: u32, lane_count: u32) -> Option<u32> {
        match self {
            Direction::Left => lane.checked_sub(1),
            Direction::Right => (lane + 1 < lane_count).then_some(lane + 1),
        }
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        if rng.random_bool(0.5) {
            Direction::Left
        } else {
            Direction::Right
        }
    }
}

/// Behavior state. Fields only exist while their state is active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    Cruising,
    /// Turn signal on, waiting out the signal delay
    Signaling {
        target_lane: u32,
        direction: Direction,
        remaining_ticks: u32,
        elapsed_ticks: u32,
    },
    /// Steering toward the target lane centerline
    ChangingLane { target_lane: u32 },
    /// Fixed lateral bias for a fixed duration
    EmergencySwerve {
        direction: Direction,
        remaining_ticks: u32,
    },
    /// Free physics after an impact
    Colliding(Tumble),
}

/// Drift held while cruising, re-drawn when the countdown runs out
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weave {
    pub direction: Direction,
    pub intensity: f32,
    pub remaining_ticks: u32,
}

/// Render-facing behavior label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorTag {
    Cruising,
    Signaling,
    ChangingLane,
    EmergencySwerve,
    Colliding,
}

impl Behavior {
    pub fn tag(&self) -> BehaviorTag {
        match self {
            Behavior::Cruising => BehaviorTag::Cruising,
            Behavior::Signaling { .. } => BehaviorTag::Signaling,
            Behavior::ChangingLane { .. } => BehaviorTag::ChangingLane,
            Behavior::EmergencySwerve { .. } => BehaviorTag::EmergencySwerve,
            Behavior::Colliding(_) => BehaviorTag::Colliding,
        }
    }

    /// Lane the agent is heading for, while signaling or changing lanes
    pub fn target_lane(&self) -> Option<u32> {
        match *self {
            Behavior::Signaling { target_lane, .. } | Behavior::ChangingLane { target_lane } => {
                Some(target_lane)
            }
            _ => None,
        }
    }
}

/// Another vehicle as seen by a lane-change safety check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: u32,
    pub pos: Vec2,
}

/// What an agent can see when deciding on a lane change
#[derive(Debug, Clone, Copy)]
pub struct Surroundings<'a> {
    /// Every agent (the deciding agent itself is skipped by id)
    pub neighbors: &'a [Neighbor],
    /// Player position, if a player is on the road
    pub player: Option<Vec2>,
}

/// Result of a lane-change attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneChangeOutcome {
    /// Turn signal started toward `target_lane`
    Signaled { target_lane: u32 },
    /// Moved straight into `target_lane` (no signal)
    Instant { target_lane: u32 },
    /// Evasive swerve instead of a lane change
    Swerved(Direction),
    /// Already signaling, changing lanes, swerving or tumbling
    Busy,
    /// No lane exists in that direction
    NoLane,
}

/// One autonomous traffic vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: u32,
    pub kind: AgentKind,
    pub lane: u32,
    pub pos: Vec2,
    /// Fixed cruising speed (world units per tick)
    pub speed: f32,
    /// Hitbox width/height
    pub size: Vec2,
    pub steering: SteeringState,
    pub behavior: Behavior,
    /// Cruising drift, for kinds that weave
    pub weave: Option<Weave>,
}

/// Uniform draw from an `(min, max)` pair; never panics on a degenerate range
pub(crate) fn draw_between<R: Rng>(rng: &mut R, range: (f32, f32)) -> f32 {
    range.0 + (range.1 - range.0) * rng.random::<f32>()
}

impl Agent {
    /// New cruising agent centered in `lane`
    pub fn new(id: u32, kind: AgentKind, lane: u32, y: f32, speed: f32, tuning: &Tuning) -> Self {
        let profile = kind.profile(&tuning.traffic);
        Self {
            id,
            kind,
            lane,
            pos: Vec2::new(tuning.arena.lane_center(lane), y),
            speed,
            size: Vec2::new(profile.width, profile.height),
            steering: SteeringState::default(),
            behavior: Behavior::Cruising,
            // Expired countdown: the first cruising step draws a drift
            weave: (profile.weave_ms > 0.0).then_some(Weave {
                direction: Direction::Right,
                intensity: 0.0,
                remaining_ticks: 0,
            }),
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_size(self.pos, self.size)
    }

    /// Idle agents may start a new lane change
    pub fn is_idle(&self) -> bool {
        matches!(self.behavior, Behavior::Cruising)
    }

    pub fn is_colliding(&self) -> bool {
        matches!(self.behavior, Behavior::Colliding(_))
    }

    /// Scrolled out of the tracked window around the camera
    pub fn is_off_screen(&self, camera_y: f32, tuning: &Tuning) -> bool {
        let view = tuning.arena.canvas_height;
        self.pos.y > camera_y + view || self.pos.y < camera_y - tuning.traffic.spawn_radius - view
    }

    /// Lit turn-signal side this tick (blinks while signaling)
    pub fn turn_signal(&self, traffic: &TrafficTuning) -> Option<Direction> {
        match self.behavior {
            Behavior::Signaling {
                direction,
                elapsed_ticks,
                ..
            } => {
                let blink = ms_to_ticks(traffic.blink_ms);
                ((elapsed_ticks / blink) % 2 == 0).then_some(direction)
            }
            _ => None,
        }
    }

    /// Visual tilt: tumble rotation while colliding, else a share of steering
    pub fn tilt(&self) -> f32 {
        match self.behavior {
            Behavior::Colliding(tumble) => tumble.rotation,
            _ => self.steering.angle * 0.5,
        }
    }

    /// Whether another vehicle sits in `target_lane` inside the safety box
    fn target_lane_occupied(
        &self,
        target_lane: u32,
        surroundings: &Surroundings<'_>,
        tuning: &Tuning,
    ) -> bool {
        let safe = tuning.traffic.safe_distance;
        let in_zone = |pos: Vec2| {
            tuning.arena.lane_at(pos.x) == Some(target_lane)
                && (pos.x - self.pos.x).abs() < safe
                && (pos.y - self.pos.y).abs() < safe
        };

        surroundings.player.is_some_and(in_zone)
            || surroundings
                .neighbors
                .iter()
                .filter(|n| n.id != self.id)
                .any(|n| in_zone(n.pos))
    }

    /// Attempt a lane change toward `direction`
    ///
    /// Safety-checking kinds swerve away from a nearby player, and swerve the
    /// other way when the target lane is occupied. Other kinds move over
    /// unconditionally.
    pub fn try_lane_change<R: Rng>(
        &mut self,
        direction: Direction,
        surroundings: &Surroundings<'_>,
        tuning: &Tuning,
        rng: &mut R,
    ) -> LaneChangeOutcome {
        if !self.is_idle() {
            return LaneChangeOutcome::Busy;
        }
        let profile = self.kind.profile(&tuning.traffic);

        if profile.checks_safety {
            if let Some(player) = surroundings.player {
                if player.distance(self.pos) < tuning.traffic.avoidance_radius {
                    let away = if player.x < self.pos.x {
                        Direction::Right
                    } else {
                        Direction::Left
                    };
                    self.start_swerve(away, tuning);
                    log::debug!("agent {} swerving {:?} away from player", self.id, away);
                    return LaneChangeOutcome::Swerved(away);
                }
            }
        }

        let Some(target_lane) = direction.neighbor_lane(self.lane, tuning.arena.lane_count) else {
            return LaneChangeOutcome::NoLane;
        };

        if profile.checks_safety && self.target_lane_occupied(target_lane, surroundings, tuning) {
            let other_way = direction.opposite();
            self.start_swerve(other_way, tuning);
            log::debug!(
                "agent {} lane {} blocked, swerving {:?}",
                self.id,
                target_lane,
                other_way
            );
            return LaneChangeOutcome::Swerved(other_way);
        }

        if profile.instant_lane_change {
            self.pos.x = tuning.arena.lane_center(target_lane);
            self.lane = target_lane;
            self.steering.reset();
            log::debug!("agent {} jumped to lane {}", self.id, target_lane);
            return LaneChangeOutcome::Instant { target_lane };
        }

        let delay_ms = draw_between(rng, profile.signal_ms);
        self.behavior = Behavior::Signaling {
            target_lane,
            direction,
            remaining_ticks: ms_to_ticks(delay_ms),
            elapsed_ticks: 0,
        };
        log::debug!(
            "agent {} signaling {:?} toward lane {} ({:.0} ms)",
            self.id,
            direction,
            target_lane,
            delay_ms
        );
        LaneChangeOutcome::Signaled { target_lane }
    }

    /// Begin an emergency swerve, cancelling any lane change in progress
    pub fn start_swerve(&mut self, direction: Direction, tuning: &Tuning) {
        if self.is_colliding() || matches!(self.behavior, Behavior::EmergencySwerve { .. }) {
            return;
        }
        self.behavior = Behavior::EmergencySwerve {
            direction,
            remaining_ticks: ms_to_ticks(tuning.traffic.swerve_ms),
        };
    }

    /// Take an impulse. Cancels signaling/lane change/swerve; a tumble in
    /// progress accumulates.
    pub fn apply_collision(&mut self, impact: Vec2, force: f32, spin: f32, tuning: &Tuning) {
        let mut tumble = match self.behavior {
            Behavior::Colliding(tumble) => tumble,
            _ => Tumble::default(),
        };
        tumble.kick(impact, force, spin, &tuning.impact);
        self.behavior = Behavior::Colliding(tumble);
        self.steering.reset();
    }

    /// Advance one tick
    pub fn step<R: Rng>(&mut self, tuning: &Tuning, rng: &mut R) {
        let arena = &tuning.arena;
        let steer = &tuning.steering;
        let traffic = &tuning.traffic;

        match &mut self.behavior {
            Behavior::Colliding(tumble) => {
                // Physics fully overrides forward motion and steering
                if tumble.advance(&mut self.pos, &tuning.impact) {
                    let target_lane = arena.nearest_lane(self.pos.x);
                    log::debug!("agent {} settled, returning to lane {}", self.id, target_lane);
                    self.behavior = Behavior::ChangingLane { target_lane };
                }
                return;
            }
            Behavior::Cruising => match &mut self.weave {
                Some(weave) => {
                    if weave.remaining_ticks == 0 {
                        let profile = self.kind.profile(traffic);
                        weave.direction = Direction::random(rng);
                        weave.intensity = draw_between(rng, profile.weave_intensity);
                        weave.remaining_ticks = ms_to_ticks(profile.weave_ms);
                    }
                    weave.remaining_ticks -= 1;
                    self.steering.angle = weave.direction.sign() * weave.intensity;
                    self.steering.rate = 0.0;
                }
                None => self.steering.relax(steer.return_rate),
            },
            Behavior::Signaling {
                target_lane,
                remaining_ticks,
                elapsed_ticks,
                ..
            } => {
                let target_lane = *target_lane;
                *elapsed_ticks += 1;
                *remaining_ticks = remaining_ticks.saturating_sub(1);
                if *remaining_ticks == 0 {
                    self.behavior = Behavior::ChangingLane { target_lane };
                }
                self.steering.relax(steer.return_rate);
            }
            Behavior::ChangingLane { target_lane } => {
                let target_lane = *target_lane;
                let target_x = arena.lane_center(target_lane);
                let dx = target_x - self.pos.x;
                let target_steering = (dx * traffic.lane_seek_gain).clamp(-steer.max, steer.max);
                self.steering
                    .seek(target_steering, traffic.steering_accel, steer.friction, steer.max);

                if dx.abs() < 1.0 {
                    self.pos.x = target_x;
                    self.lane = target_lane;
                    self.steering.reset();
                    self.behavior = Behavior::Cruising;
                }
            }
            Behavior::EmergencySwerve {
                direction,
                remaining_ticks,
            } => {
                let intensity = self.kind.profile(traffic).swerve_intensity;
                self.steering.angle = direction.sign() * intensity;
                self.steering.rate = 0.0;
                *remaining_ticks = remaining_ticks.saturating_sub(1);
                if *remaining_ticks == 0 {
                    let target_lane = arena.nearest_lane(self.pos.x);
                    self.behavior = Behavior::ChangingLane { target_lane };
                }
            }
        }

        self.pos.y -= self.speed;
        self.pos.x += self.speed * self.steering.angle;
        if self.weave.is_some() && self.is_idle() {
            self.lane = arena.nearest_lane(self.pos.x);
        }
    }
}
