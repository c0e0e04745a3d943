//! Player input preferences
//!
//! Persisted as JSON in key-value storage, separately from the high score.

use serde::{Deserialize, Serialize};

use crate::platform::storage::{KeyValueStore, StorageError};

/// How the on-screen wheel and keyboard feel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Wheel degrees per degree of pointer travel while dragging
    pub steering_sensitivity: f32,
    /// Wheel degrees per arrow-key press
    pub key_steer_step_deg: f32,
    /// Per-frame factor applied to a released wheel (0-1)
    pub wheel_return_factor: f32,
    /// A returning wheel below this many degrees snaps to centre
    pub wheel_snap_deg: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            steering_sensitivity: 1.2,
            key_steer_step_deg: 10.0,
            wheel_return_factor: 0.9,
            wheel_snap_deg: 0.1,
        }
    }
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "swap_lane_settings";

    /// Pull out-of-range values back to something drivable
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.steering_sensitivity.is_finite() && self.steering_sensitivity > 0.0) {
            self.steering_sensitivity = defaults.steering_sensitivity;
        }
        if !(self.key_steer_step_deg.is_finite() && self.key_steer_step_deg > 0.0) {
            self.key_steer_step_deg = defaults.key_steer_step_deg;
        }
        if !(self.wheel_return_factor.is_finite()
            && (0.0..1.0).contains(&self.wheel_return_factor))
        {
            self.wheel_return_factor = defaults.wheel_return_factor;
        }
        if !(self.wheel_snap_deg.is_finite() && self.wheel_snap_deg > 0.0) {
            self.wheel_snap_deg = defaults.wheel_snap_deg;
        }
        self
    }

    fn try_load(store: &impl KeyValueStore) -> Result<Option<Self>, StorageError> {
        match store.get(Self::STORAGE_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str::<Self>(&json)?.sanitized())),
            None => Ok(None),
        }
    }

    /// Load settings, falling back to defaults when absent or unreadable
    pub fn load(store: &impl KeyValueStore) -> Self {
        match Self::try_load(store) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring stored settings: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut impl KeyValueStore) {
        let result = serde_json::to_string(self)
            .map_err(StorageError::from)
            .and_then(|json| store.set(Self::STORAGE_KEY, &json));
        match result {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Could not save settings: {e}"),
        }
    }
}
