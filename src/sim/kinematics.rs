//! Vehicle motion: pedal speed control, spring steering, and the two
//! lateral models (direct lateral scalar and bicycle).
//!
//! Also home to `Tumble`, the free physics a vehicle follows after an impact.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::normalize_angle;
use crate::tuning::{DriveTuning, ImpactTuning};

/// Heading that points "ahead" (world y decreasing)
pub const FORWARD_HEADING: f32 = -std::f32::consts::FRAC_PI_2;

/// Tire angles below this are treated as straight (guards `1 / sin(θ)`)
pub const MIN_TIRE_ANGLE: f32 = 0.001;

/// Heading error below which auto-straightening snaps to forward
const HEADING_SNAP: f32 = 0.01;

/// Next speed from the pedal state. Brake takes priority over throttle.
pub fn next_speed(speed: f32, gas: bool, brake: bool, drive: &DriveTuning) -> f32 {
    let speed = if brake {
        (speed - drive.brake).max(drive.brake_floor)
    } else if gas {
        (speed + drive.accel).min(drive.max_speed)
    } else {
        // Coasting settles on a rolling floor rather than stopping
        (speed - drive.friction).max(drive.coast_floor())
    };
    speed.clamp(0.0, drive.max_speed)
}

/// Tire angle (radians) for a normalized wheel position in [-1, 1]
#[inline]
pub fn tire_angle(wheel: f32, max_tire_angle: f32) -> f32 {
    max_tire_angle * wheel.clamp(-1.0, 1.0)
}

/// Inertia-bearing steering: a rate spring-driven toward a target and damped
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SteeringState {
    /// Current steering value (lateral scalar or tire angle, model-dependent)
    pub angle: f32,
    /// Change in `angle` per tick
    pub rate: f32,
}

impl SteeringState {
    /// Accelerate toward `target`, damp, integrate, clamp to `±max`
    pub fn seek(&mut self, target: f32, accel: f32, friction: f32, max: f32) {
        self.rate += (target - self.angle) * accel;
        self.rate *= friction;
        self.angle = (self.angle + self.rate).clamp(-max, max);
    }

    /// Relax toward centre by `return_rate` of the current value
    pub fn relax(&mut self, return_rate: f32) {
        self.angle *= 1.0 - return_rate;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Position, heading and forward speed of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub pos: Vec2,
    /// Radians; `FORWARD_HEADING` is straight ahead
    pub heading: f32,
    pub speed: f32,
}

impl Pose {
    pub fn new(pos: Vec2, speed: f32) -> Self {
        Self {
            pos,
            heading: FORWARD_HEADING,
            speed,
        }
    }

    /// Lateral model: steering is a direct lateral-velocity scalar
    pub fn advance_lateral(&mut self, steering: f32) {
        self.pos.x += self.speed * steering;
        self.pos.y -= self.speed;
    }

    /// Bicycle model: turn radius from tire angle and wheel base
    ///
    /// Below `MIN_TIRE_ANGLE` the car drives straight; if the wheel isn't
    /// being held the heading also eases back toward forward.
    pub fn advance_bicycle(
        &mut self,
        tire_angle: f32,
        wheel_held: bool,
        wheel_base: f32,
        straighten_rate: f32,
    ) {
        if tire_angle.abs() > MIN_TIRE_ANGLE {
            let turn_radius = wheel_base / tire_angle.sin();
            self.heading = normalize_angle(self.heading + self.speed / turn_radius);
        } else if !wheel_held {
            let error = normalize_angle(FORWARD_HEADING - self.heading);
            self.heading = normalize_angle(self.heading + error * straighten_rate);
            if normalize_angle(self.heading - FORWARD_HEADING).abs() < HEADING_SNAP {
                self.heading = FORWARD_HEADING;
            }
        }
        self.pos.x += self.speed * self.heading.cos();
        self.pos.y += self.speed * self.heading.sin();
    }
}

/// Free physics after an impact: velocity, spin and accumulated rotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Tumble {
    pub vel: Vec2,
    pub angular_vel: f32,
    pub rotation: f32,
}

impl Tumble {
    /// Add an impulse. `spin` is a uniform draw in [-0.5, 0.5).
    pub fn kick(&mut self, impact: Vec2, force: f32, spin: f32, impact_tuning: &ImpactTuning) {
        self.vel += impact * force;
        self.angular_vel += spin * force * impact_tuning.spin_factor;
    }

    /// Integrate one tick and decay. Returns true once the motion has settled.
    pub fn advance(&mut self, pos: &mut Vec2, impact_tuning: &ImpactTuning) -> bool {
        *pos += self.vel;
        self.rotation += self.angular_vel;

        self.vel *= impact_tuning.friction;
        self.angular_vel *= impact_tuning.angular_friction;

        if self.is_settled(impact_tuning) {
            self.vel = Vec2::ZERO;
            self.angular_vel = 0.0;
            return true;
        }
        false
    }

    pub fn is_settled(&self, impact_tuning: &ImpactTuning) -> bool {
        self.vel.x.abs() < impact_tuning.settle_speed
            && self.vel.y.abs() < impact_tuning.settle_speed
            && self.angular_vel.abs() < impact_tuning.settle_spin
    }
}
