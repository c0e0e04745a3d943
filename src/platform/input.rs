//! Device input adapters
//!
//! Keyboard, pedal buttons and the on-screen steering wheel all write into
//! one [`ControlInput`]; the frame loop takes a copy per tick.

use glam::Vec2;

use crate::settings::Settings;
use crate::sim::ControlInput;
use crate::wrap_degrees;

/// Keys the game responds to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    SteerLeft,
    SteerRight,
    Gas,
    Brake,
    Restart,
}

impl Key {
    /// Map a DOM `KeyboardEvent` (`code`, `key`) pair
    pub fn from_event(code: &str, key: &str) -> Option<Self> {
        match (code, key) {
            ("ArrowLeft", _) => Some(Key::SteerLeft),
            ("ArrowRight", _) => Some(Key::SteerRight),
            ("ArrowUp", _) | (_, "w" | "W") => Some(Key::Gas),
            ("ArrowDown", _) | (_, "s" | "S") => Some(Key::Brake),
            ("Space", _) => Some(Key::Restart),
            _ => None,
        }
    }
}

/// Angle of a pointer about a centre point, degrees in (-180, 180]
pub fn pointer_angle_deg(pointer: Vec2, center: Vec2) -> f32 {
    let d = pointer - center;
    d.y.atan2(d.x).to_degrees()
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    start_pointer_deg: f32,
    start_angle_deg: f32,
}

/// The on-screen wheel, in degrees of rotation
#[derive(Debug, Clone)]
pub struct SteeringWheel {
    angle_deg: f32,
    max_deg: f32,
    drag: Option<Drag>,
    returning: bool,
}

impl SteeringWheel {
    pub fn new(max_deg: f32) -> Self {
        Self {
            angle_deg: 0.0,
            max_deg: max_deg.abs().max(1.0),
            drag: None,
            returning: false,
        }
    }

    #[inline]
    pub fn angle_deg(&self) -> f32 {
        self.angle_deg
    }

    /// Rotation as a fraction of full lock, in [-1, 1]
    #[inline]
    pub fn normalized(&self) -> f32 {
        self.angle_deg / self.max_deg
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_returning(&self) -> bool {
        self.returning
    }

    pub fn begin_drag(&mut self, pointer_deg: f32) {
        self.drag = Some(Drag {
            start_pointer_deg: pointer_deg,
            start_angle_deg: self.angle_deg,
        });
        self.returning = false;
    }

    /// Turn by the pointer's travel since the drag began; ignored when not dragging
    pub fn drag_to(&mut self, pointer_deg: f32, sensitivity: f32) {
        let Some(drag) = self.drag else {
            return;
        };
        let delta = wrap_degrees(pointer_deg - drag.start_pointer_deg) * sensitivity;
        self.angle_deg = (drag.start_angle_deg + delta).clamp(-self.max_deg, self.max_deg);
    }

    /// Let go; the wheel spins back to centre over the next frames
    pub fn end_drag(&mut self) {
        if self.drag.take().is_some() {
            self.returning = true;
        }
    }

    pub fn nudge(&mut self, step_deg: f32) {
        self.returning = false;
        self.angle_deg = (self.angle_deg + step_deg).clamp(-self.max_deg, self.max_deg);
    }

    pub fn recenter(&mut self) {
        self.returning = false;
        self.angle_deg = 0.0;
    }

    /// Once per display frame
    pub fn frame(&mut self, settings: &Settings) {
        if !self.returning || self.drag.is_some() {
            return;
        }
        self.angle_deg *= settings.wheel_return_factor;
        if self.angle_deg.abs() <= settings.wheel_snap_deg {
            self.angle_deg = 0.0;
            self.returning = false;
        }
    }
}

/// Collects device events into the control record the simulation reads
#[derive(Debug, Clone)]
pub struct InputAdapter {
    control: ControlInput,
    wheel: SteeringWheel,
    settings: Settings,
    steer_left_held: bool,
    steer_right_held: bool,
}

impl InputAdapter {
    pub fn new(settings: Settings, max_wheel_deg: f32) -> Self {
        Self {
            control: ControlInput::default(),
            wheel: SteeringWheel::new(max_wheel_deg),
            settings,
            steer_left_held: false,
            steer_right_held: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn wheel(&self) -> &SteeringWheel {
        &self.wheel
    }

    pub fn key_down(&mut self, key: Key, game_over: bool) {
        let step = self.settings.key_steer_step_deg;
        match key {
            Key::SteerLeft => {
                self.steer_left_held = true;
                self.wheel.nudge(-step);
            }
            Key::SteerRight => {
                self.steer_right_held = true;
                self.wheel.nudge(step);
            }
            Key::Gas => self.control.set_throttle(true),
            Key::Brake => self.control.set_brake(true),
            Key::Restart => {
                if game_over {
                    self.control.request_restart();
                }
            }
        }
    }

    pub fn key_up(&mut self, key: Key) {
        match key {
            Key::SteerLeft | Key::SteerRight => {
                self.steer_left_held = false;
                self.steer_right_held = false;
                self.wheel.recenter();
            }
            Key::Gas => self.control.set_throttle(false),
            Key::Brake => self.control.set_brake(false),
            Key::Restart => {}
        }
    }

    /// Gas pedal button pressed or released
    pub fn gas_pedal(&mut self, pressed: bool) {
        self.control.set_throttle(pressed);
    }

    pub fn brake_pedal(&mut self, pressed: bool) {
        self.control.set_brake(pressed);
    }

    pub fn wheel_pointer_down(&mut self, pointer: Vec2, wheel_center: Vec2) {
        self.wheel
            .begin_drag(pointer_angle_deg(pointer, wheel_center));
    }

    pub fn wheel_pointer_move(&mut self, pointer: Vec2, wheel_center: Vec2) {
        self.wheel.drag_to(
            pointer_angle_deg(pointer, wheel_center),
            self.settings.steering_sensitivity,
        );
    }

    pub fn wheel_pointer_up(&mut self) {
        self.wheel.end_drag();
    }

    /// Tap on the play field; restarts only after game over
    pub fn tap(&mut self, game_over: bool) {
        if game_over {
            self.control.request_restart();
        }
    }

    /// Once per display frame, before ticking
    pub fn frame(&mut self) {
        self.wheel.frame(&self.settings);
    }

    /// Control state for the next tick. One-shot fields are consumed.
    pub fn take_tick_input(&mut self) -> ControlInput {
        self.control.set_steering(self.wheel.normalized());
        self.control.set_steering_active(
            self.wheel.is_dragging() || self.steer_left_held || self.steer_right_held,
        );
        let input = self.control;
        self.control.restart = false;
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTER: Vec2 = Vec2::ZERO;

    fn adapter() -> InputAdapter {
        InputAdapter::new(Settings::default(), 540.0)
    }

    fn at_deg(deg: f32) -> Vec2 {
        let r = deg.to_radians();
        Vec2::new(r.cos(), r.sin()) * 50.0
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(Key::from_event("ArrowLeft", "ArrowLeft"), Some(Key::SteerLeft));
        assert_eq!(Key::from_event("ArrowRight", "ArrowRight"), Some(Key::SteerRight));
        assert_eq!(Key::from_event("ArrowUp", "ArrowUp"), Some(Key::Gas));
        assert_eq!(Key::from_event("KeyW", "W"), Some(Key::Gas));
        assert_eq!(Key::from_event("KeyS", "s"), Some(Key::Brake));
        assert_eq!(Key::from_event("Space", " "), Some(Key::Restart));
        assert_eq!(Key::from_event("KeyQ", "q"), None);
    }

    #[test]
    fn test_pointer_angle() {
        assert!((pointer_angle_deg(Vec2::new(10.0, 0.0), CENTER)).abs() < 1e-4);
        assert!((pointer_angle_deg(Vec2::new(0.0, 10.0), CENTER) - 90.0).abs() < 1e-4);
        assert!((pointer_angle_deg(Vec2::new(-10.0, 0.0), CENTER) - 180.0).abs() < 1e-4);
    }

    #[test]
    fn test_drag_applies_sensitivity() {
        let mut input = adapter();
        input.wheel_pointer_down(at_deg(0.0), CENTER);
        input.wheel_pointer_move(at_deg(30.0), CENTER);
        assert!((input.wheel().angle_deg() - 36.0).abs() < 1e-3);

        let tick = input.take_tick_input();
        assert!(tick.steering_active);
        assert!((tick.steering - 36.0 / 540.0).abs() < 1e-5);
    }

    #[test]
    fn test_drag_across_the_seam_wraps() {
        let mut input = adapter();
        input.wheel_pointer_down(at_deg(170.0), CENTER);
        input.wheel_pointer_move(at_deg(-170.0), CENTER);
        // +20 degrees of travel, not -340
        assert!((input.wheel().angle_deg() - 24.0).abs() < 1e-2);
    }

    #[test]
    fn test_drag_clamps_to_full_lock() {
        let mut wheel = SteeringWheel::new(540.0);
        for _ in 0..10 {
            wheel.begin_drag(0.0);
            wheel.drag_to(179.0, 1.2);
            wheel.end_drag();
        }
        assert_eq!(wheel.angle_deg(), 540.0);
        assert_eq!(wheel.normalized(), 1.0);
    }

    #[test]
    fn test_move_without_drag_is_ignored() {
        let mut wheel = SteeringWheel::new(540.0);
        wheel.drag_to(90.0, 1.2);
        assert_eq!(wheel.angle_deg(), 0.0);
    }

    #[test]
    fn test_release_returns_to_centre() {
        let settings = Settings::default();
        let mut wheel = SteeringWheel::new(540.0);
        wheel.begin_drag(0.0);
        wheel.drag_to(50.0, 1.0);
        wheel.end_drag();
        assert!(wheel.is_returning());

        wheel.frame(&settings);
        assert!((wheel.angle_deg() - 45.0).abs() < 1e-3);

        let mut frames = 1;
        while wheel.is_returning() {
            wheel.frame(&settings);
            frames += 1;
            assert!(frames < 200);
        }
        assert_eq!(wheel.angle_deg(), 0.0);
    }

    #[test]
    fn test_grabbing_stops_return() {
        let settings = Settings::default();
        let mut wheel = SteeringWheel::new(540.0);
        wheel.nudge(90.0);
        wheel.begin_drag(0.0);
        wheel.end_drag();
        wheel.begin_drag(0.0);
        wheel.frame(&settings);
        assert_eq!(wheel.angle_deg(), 90.0);
    }

    #[test]
    fn test_arrow_keys_nudge_and_recentre() {
        let mut input = adapter();
        input.key_down(Key::SteerRight, false);
        input.key_down(Key::SteerRight, false);
        assert_eq!(input.wheel().angle_deg(), 20.0);
        assert!(input.take_tick_input().steering_active);

        input.key_up(Key::SteerRight);
        assert_eq!(input.wheel().angle_deg(), 0.0);
        let tick = input.take_tick_input();
        assert!(!tick.steering_active);
        assert_eq!(tick.steering, 0.0);

        input.key_down(Key::SteerLeft, false);
        assert_eq!(input.wheel().angle_deg(), -10.0);
    }

    #[test]
    fn test_pedals() {
        let mut input = adapter();
        input.key_down(Key::Gas, false);
        input.brake_pedal(true);
        let tick = input.take_tick_input();
        assert!(tick.throttle && tick.brake);

        input.key_up(Key::Gas);
        input.brake_pedal(false);
        input.gas_pedal(true);
        let tick = input.take_tick_input();
        assert!(tick.throttle && !tick.brake);
    }

    #[test]
    fn test_restart_only_after_game_over_and_only_once() {
        let mut input = adapter();
        input.key_down(Key::Restart, false);
        input.tap(false);
        assert!(!input.take_tick_input().restart);

        input.tap(true);
        assert!(input.take_tick_input().restart);
        assert!(!input.take_tick_input().restart);

        input.key_down(Key::Restart, true);
        assert!(input.take_tick_input().restart);
    }
}
