//! Swap Lane - An arcade lane-dodging driving game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (kinematics, road, traffic, collisions, game loop)
//! - `platform`: Browser/native platform abstraction (input adapters, storage, frame clock)
//! - `tuning`: Data-driven game balance
//! - `settings`: Player input preferences
//! - `highscores`: The persisted best score

pub mod highscores;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::HighScore;
pub use settings::Settings;
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one tick per 60 Hz display refresh)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Milliseconds covered by one simulation tick
    pub const TICK_MS: f32 = SIM_DT * 1000.0;
}

/// Convert a wall-clock duration to a whole number of ticks (at least one)
#[inline]
pub fn ms_to_ticks(ms: f32) -> u32 {
    (ms / consts::TICK_MS).round().max(1.0) as u32
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Wrap an angle in degrees to [-180, 180]
#[inline]
pub fn wrap_degrees(mut degrees: f32) -> f32 {
    if degrees > 180.0 {
        degrees -= 360.0;
    }
    if degrees < -180.0 {
        degrees += 360.0;
    }
    degrees
}
