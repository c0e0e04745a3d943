//! The player-controlled vehicle

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::kinematics::{FORWARD_HEADING, Pose, SteeringState, Tumble, next_speed, tire_angle};
use super::tick::ControlInput;
use crate::tuning::{SteeringModel, Tuning};

/// Player hitbox, shared with ordinary traffic
pub const PLAYER_SIZE: Vec2 = Vec2::new(36.0, 60.0);

/// The player's car
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pose: Pose,
    /// Lateral scalar (lateral model) or tire angle in radians (bicycle model)
    pub steering: SteeringState,
    pub size: Vec2,
    /// Crash physics; once set, pedals and steering no longer apply
    pub tumble: Option<Tumble>,
}

impl Player {
    /// Stationary at the road centre, pointing ahead
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            pose: Pose::new(Vec2::new(tuning.arena.road_center(), 0.0), 0.0),
            steering: SteeringState::default(),
            size: PLAYER_SIZE,
            tumble: None,
        }
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.pose.pos
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.pose.speed
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_size(self.pose.pos, self.size)
    }

    pub fn is_crashed(&self) -> bool {
        self.tumble.is_some()
    }

    /// Steer, apply pedals, then move, per the configured steering model
    pub fn update(&mut self, input: &ControlInput, tuning: &Tuning) {
        if self.is_crashed() {
            self.settle(tuning);
            return;
        }

        let steer = &tuning.steering;
        let wheel = input.steering.clamp(-1.0, 1.0);

        match steer.model {
            SteeringModel::Lateral => {
                self.steering
                    .seek(wheel * steer.max, steer.accel, steer.friction, steer.max);
                // Centre only once the wheel itself is (nearly) centred
                let one_degree = 1.0 / steer.max_wheel_rotation_deg;
                if !input.steering_active && wheel.abs() < one_degree {
                    self.steering.relax(steer.return_rate);
                }
                self.pose.speed =
                    next_speed(self.pose.speed, input.throttle, input.brake, &tuning.drive);
                self.pose.advance_lateral(self.steering.angle);
            }
            SteeringModel::Bicycle => {
                let tire = tire_angle(wheel, steer.max_tire_angle());
                self.steering.rate = tire - self.steering.angle;
                self.steering.angle = tire;
                self.pose.speed =
                    next_speed(self.pose.speed, input.throttle, input.brake, &tuning.drive);
                self.pose.advance_bicycle(
                    tire,
                    input.steering_active,
                    steer.wheel_base,
                    steer.straighten_rate,
                );
            }
        }
    }

    /// Take an impulse; the car leaves driver control
    pub fn crash(&mut self, impact: Vec2, force: f32, spin: f32, tuning: &Tuning) {
        let tumble = self.tumble.get_or_insert_with(Tumble::default);
        tumble.kick(impact, force, spin, &tuning.impact);
        self.pose.speed = 0.0;
        self.steering.reset();
    }

    /// Advance crash physics; no-op once settled or when not crashed
    pub fn settle(&mut self, tuning: &Tuning) {
        if let Some(tumble) = self.tumble.as_mut() {
            if !tumble.is_settled(&tuning.impact) {
                tumble.advance(&mut self.pose.pos, &tuning.impact);
            }
        }
    }

    /// Visual tilt for rendering
    pub fn tilt(&self, model: SteeringModel) -> f32 {
        match (&self.tumble, model) {
            (Some(tumble), _) => tumble.rotation,
            (None, SteeringModel::Lateral) => self.steering.angle * 0.5,
            (None, SteeringModel::Bicycle) => self.pose.heading - FORWARD_HEADING,
        }
    }
}
