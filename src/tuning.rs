//! Data-driven game balance
//!
//! Every constant the simulation reads lives here, grouped by concern.
//! Groups are `#[serde(default)]` so a partial JSON document only has to
//! name the values it overrides.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de};

/// How the player's steering input turns into lateral motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SteeringModel {
    /// Steering acts as a direct lateral-velocity scalar (`x += speed * steering`)
    #[default]
    Lateral,
    /// Tire angle drives a heading through a bicycle model
    Bicycle,
}

/// How score accrues during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScoringMode {
    /// +1 per traffic agent the player gets past
    #[default]
    PassEvents,
    /// Whole units of player speed per tick
    Distance,
}

/// Canvas and road geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaTuning {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub road_width: f32,
    pub lane_count: u32,
    /// Length of one procedurally generated road tile
    pub segment_length: f32,
    /// Horizontal camera follow factor (0-1)
    pub camera_smoothing: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            canvas_height: 600.0,
            road_width: 480.0,
            lane_count: 6,
            segment_length: 80.0,
            camera_smoothing: 0.1,
        }
    }
}

impl ArenaTuning {
    /// World x of the left road edge
    #[inline]
    pub fn road_left(&self) -> f32 {
        (self.canvas_width - self.road_width) / 2.0
    }

    /// World x of the right road edge
    #[inline]
    pub fn road_right(&self) -> f32 {
        self.road_left() + self.road_width
    }

    #[inline]
    pub fn road_center(&self) -> f32 {
        self.road_left() + self.road_width / 2.0
    }

    #[inline]
    pub fn lane_width(&self) -> f32 {
        self.road_width / self.lane_count as f32
    }

    /// Centerline x of a lane
    #[inline]
    pub fn lane_center(&self, lane: u32) -> f32 {
        self.road_left() + (lane as f32 + 0.5) * self.lane_width()
    }

    /// Lane index containing `x`, or None when off the road
    pub fn lane_at(&self, x: f32) -> Option<u32> {
        let index = ((x - self.road_left()) / self.lane_width()).floor();
        if index < 0.0 || index >= self.lane_count as f32 {
            None
        } else {
            Some(index as u32)
        }
    }

    /// Closest valid lane to `x` (clamps off-road positions to the edge lanes)
    pub fn nearest_lane(&self, x: f32) -> u32 {
        let index = ((x - self.road_left()) / self.lane_width()).floor();
        index.clamp(0.0, (self.lane_count - 1) as f32) as u32
    }
}

/// Speed control constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveTuning {
    pub max_speed: f32,
    /// Speed gained per tick with the throttle held
    pub accel: f32,
    /// Speed lost per tick with the brake held
    pub brake: f32,
    /// Speed lost per tick while coasting
    pub friction: f32,
    /// Coasting never drops below `max_speed * coast_floor_ratio`
    pub coast_floor_ratio: f32,
    /// Braking never drops below this
    pub brake_floor: f32,
}

impl Default for DriveTuning {
    fn default() -> Self {
        Self {
            max_speed: 8.0,
            accel: 0.1,
            brake: 0.1,
            friction: 0.02,
            coast_floor_ratio: 0.5,
            brake_floor: 0.0,
        }
    }
}

impl DriveTuning {
    #[inline]
    pub fn coast_floor(&self) -> f32 {
        self.max_speed * self.coast_floor_ratio
    }
}

/// Steering dynamics and wheel geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringTuning {
    pub model: SteeringModel,
    /// Largest lateral steering scalar (lateral model)
    pub max: f32,
    /// Spring constant pulling steering toward its target (player)
    pub accel: f32,
    /// Damping applied to the steering rate each tick
    pub friction: f32,
    /// Fraction of steering removed per tick when centering
    pub return_rate: f32,
    /// Steering wheel travel in degrees each side of centre
    pub max_wheel_rotation_deg: f32,
    /// Tire angle at full wheel lock (bicycle model)
    pub max_tire_angle_deg: f32,
    /// Distance between axles (bicycle model)
    pub wheel_base: f32,
    /// Heading correction factor when the wheel is released (bicycle model)
    pub straighten_rate: f32,
}

impl Default for SteeringTuning {
    fn default() -> Self {
        Self {
            model: SteeringModel::Lateral,
            max: 0.5,
            accel: 0.05,
            friction: 0.95,
            return_rate: 0.1,
            max_wheel_rotation_deg: 540.0,
            max_tire_angle_deg: 90.0,
            wheel_base: 40.0,
            straighten_rate: 0.18,
        }
    }
}

impl SteeringTuning {
    #[inline]
    pub fn max_tire_angle(&self) -> f32 {
        self.max_tire_angle_deg.to_radians()
    }
}

/// Collision impulse and free-physics decay
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactTuning {
    /// Linear velocity kept per tick while tumbling
    pub friction: f32,
    /// Angular velocity kept per tick while tumbling
    pub angular_friction: f32,
    /// Random spin added per unit of force
    pub spin_factor: f32,
    /// Linear speed below which a tumble counts as settled
    pub settle_speed: f32,
    /// Angular speed below which a tumble counts as settled
    pub settle_spin: f32,
    /// Force of a road-edge hit
    pub wall_force: f32,
    /// Lower bound on vehicle-vehicle force
    pub min_vehicle_force: f32,
}

impl Default for ImpactTuning {
    fn default() -> Self {
        Self {
            friction: 0.98,
            angular_friction: 0.95,
            spin_factor: 0.1,
            settle_speed: 0.1,
            settle_spin: 0.01,
            wall_force: 2.0,
            min_vehicle_force: 1.0,
        }
    }
}

/// Per-kind agent parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindProfile {
    /// Relative weight in the spawn draw
    pub spawn_weight: f32,
    pub width: f32,
    pub height: f32,
    /// Multiplier on the drawn cruising speed
    pub speed_factor: f32,
    /// Chance per idle tick of attempting a lane change
    pub lane_change_chance: f32,
    /// Turn-signal hold before steering over, in ms
    pub signal_ms: (f32, f32),
    /// Fixed steering bias while swerving
    pub swerve_intensity: f32,
    /// Whether target-lane and player-proximity checks run
    pub checks_safety: bool,
    /// Jump straight to the target lane instead of signal-then-steer
    pub instant_lane_change: bool,
    /// How often a cruising agent re-draws its weave, in ms (0 = drives straight)
    pub weave_ms: f32,
    /// Steering bias range drawn for each weave
    pub weave_intensity: (f32, f32),
}

impl KindProfile {
    pub fn ordinary() -> Self {
        Self {
            spawn_weight: 0.55,
            width: 36.0,
            height: 60.0,
            speed_factor: 1.0,
            lane_change_chance: 0.005,
            signal_ms: (1000.0, 3000.0),
            swerve_intensity: 0.3,
            checks_safety: true,
            instant_lane_change: false,
            weave_ms: 0.0,
            weave_intensity: (0.0, 0.0),
        }
    }

    pub fn drunk() -> Self {
        Self {
            spawn_weight: 0.2,
            lane_change_chance: 0.02,
            signal_ms: (500.0, 1500.0),
            swerve_intensity: 0.4,
            checks_safety: false,
            instant_lane_change: true,
            weave_ms: 500.0,
            weave_intensity: (0.3, 0.6),
            ..Self::ordinary()
        }
    }

    pub fn bus() -> Self {
        Self {
            spawn_weight: 0.25,
            width: 40.0,
            height: 100.0,
            speed_factor: 0.8,
            lane_change_chance: 0.003,
            signal_ms: (1500.0, 3000.0),
            swerve_intensity: 0.2,
            ..Self::ordinary()
        }
    }
}

/// Traffic spawning and behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficTuning {
    /// Delay between spawn attempts, in ms (drawn uniformly from the range)
    pub spawn_interval_ms: (f32, f32),
    /// Agents further than this from the camera don't count toward the cap
    pub spawn_radius: f32,
    /// Nearest a new agent may appear ahead of the camera
    pub min_spawn_distance: f32,
    pub max_agents_in_view: usize,
    /// Vertical clearance a spawn needs from agents in the same or adjacent lane
    pub min_spacing: f32,
    /// Cruising speed range (before the kind's speed factor)
    pub speed_range: (f32, f32),
    /// Chance that a fresh spawn immediately tries to change lanes
    pub spawn_lane_change_chance: f32,
    /// Half-extent of the box checked around a lane-change target
    pub safe_distance: f32,
    /// Player distance that triggers an emergency swerve
    pub avoidance_radius: f32,
    /// Proportional gain from lateral error to target steering
    pub lane_seek_gain: f32,
    /// Steering spring constant while changing lanes
    pub steering_accel: f32,
    pub blink_ms: f32,
    pub swerve_ms: f32,
    #[serde(deserialize_with = "ordinary_profile")]
    pub ordinary: KindProfile,
    #[serde(deserialize_with = "drunk_profile")]
    pub drunk: KindProfile,
    #[serde(deserialize_with = "bus_profile")]
    pub bus: KindProfile,
}

/// Read a (possibly partial) profile object on top of `base`
fn merge_profile<'de, D: Deserializer<'de>>(
    deserializer: D,
    base: KindProfile,
) -> Result<KindProfile, D::Error> {
    let overrides = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Object(overrides) = overrides else {
        return Err(de::Error::custom("kind profile must be an object"));
    };
    let mut merged = serde_json::to_value(base).map_err(<D::Error as de::Error>::custom)?;
    if let serde_json::Value::Object(fields) = &mut merged {
        fields.extend(overrides);
    }
    serde_json::from_value(merged).map_err(de::Error::custom)
}

fn ordinary_profile<'de, D: Deserializer<'de>>(deserializer: D) -> Result<KindProfile, D::Error> {
    merge_profile(deserializer, KindProfile::ordinary())
}

fn drunk_profile<'de, D: Deserializer<'de>>(deserializer: D) -> Result<KindProfile, D::Error> {
    merge_profile(deserializer, KindProfile::drunk())
}

fn bus_profile<'de, D: Deserializer<'de>>(deserializer: D) -> Result<KindProfile, D::Error> {
    merge_profile(deserializer, KindProfile::bus())
}

impl Default for TrafficTuning {
    fn default() -> Self {
        Self {
            spawn_interval_ms: (1000.0, 1000.0),
            spawn_radius: 1000.0,
            min_spawn_distance: 800.0,
            max_agents_in_view: 10,
            min_spacing: 90.0,
            speed_range: (3.0, 5.0),
            spawn_lane_change_chance: 0.5,
            safe_distance: 120.0,
            avoidance_radius: 180.0,
            lane_seek_gain: 0.01,
            steering_accel: 0.02,
            blink_ms: 500.0,
            swerve_ms: 1000.0,
            ordinary: KindProfile::ordinary(),
            drunk: KindProfile::drunk(),
            bus: KindProfile::bus(),
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub arena: ArenaTuning,
    pub drive: DriveTuning,
    pub steering: SteeringTuning,
    pub impact: ImpactTuning,
    pub traffic: TrafficTuning,
    pub scoring: ScoringMode,
}

/// Errors from loading or validating a tuning document
#[derive(Debug)]
pub enum TuningError {
    /// The document is not valid JSON for `Tuning`
    Parse(serde_json::Error),
    /// A value is outside the range the simulation can run with
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Parse(e) => write!(f, "Tuning parse error: {e}"),
            TuningError::Invalid { field, reason } => write!(f, "Invalid tuning `{field}`: {reason}"),
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Parse(e) => Some(e),
            TuningError::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(e: serde_json::Error) -> Self {
        TuningError::Parse(e)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> TuningError {
    TuningError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn check_range(field: &'static str, range: (f32, f32)) -> Result<(), TuningError> {
    if !(range.0 >= 0.0 && range.0 <= range.1) {
        return Err(invalid(field, format!("expected 0 <= min <= max, got {range:?}")));
    }
    Ok(())
}

fn check_probability(field: &'static str, p: f32) -> Result<(), TuningError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(invalid(field, format!("probability {p} outside [0, 1]")));
    }
    Ok(())
}

impl Tuning {
    /// Parse a (possibly partial) JSON tuning document and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let arena = &self.arena;
        if arena.lane_count == 0 {
            return Err(invalid("arena.lane_count", "need at least one lane"));
        }
        if !(arena.road_width > 0.0 && arena.road_width <= arena.canvas_width) {
            return Err(invalid(
                "arena.road_width",
                format!("{} must be positive and fit the canvas", arena.road_width),
            ));
        }
        if arena.canvas_height <= 0.0 {
            return Err(invalid("arena.canvas_height", "must be positive"));
        }
        if arena.segment_length <= 0.0 {
            return Err(invalid("arena.segment_length", "must be positive"));
        }
        check_probability("arena.camera_smoothing", arena.camera_smoothing)?;

        if self.drive.max_speed <= 0.0 {
            return Err(invalid("drive.max_speed", "must be positive"));
        }
        if self.drive.brake_floor > self.drive.max_speed {
            return Err(invalid("drive.brake_floor", "exceeds max_speed"));
        }
        check_probability("drive.coast_floor_ratio", self.drive.coast_floor_ratio)?;

        if self.steering.max <= 0.0 || self.steering.max_wheel_rotation_deg <= 0.0 {
            return Err(invalid("steering", "limits must be positive"));
        }
        if self.steering.wheel_base <= 0.0 {
            return Err(invalid("steering.wheel_base", "must be positive"));
        }
        if !(self.steering.max_tire_angle_deg > 0.0 && self.steering.max_tire_angle_deg < 180.0) {
            return Err(invalid(
                "steering.max_tire_angle_deg",
                format!("{} outside (0, 180)", self.steering.max_tire_angle_deg),
            ));
        }

        let traffic = &self.traffic;
        check_range("traffic.spawn_interval_ms", traffic.spawn_interval_ms)?;
        check_range("traffic.speed_range", traffic.speed_range)?;
        if traffic.speed_range.0 <= 0.0 {
            return Err(invalid("traffic.speed_range", "agents need a positive speed"));
        }
        if traffic.min_spawn_distance > traffic.spawn_radius {
            return Err(invalid(
                "traffic.min_spawn_distance",
                "must not exceed spawn_radius",
            ));
        }
        check_probability(
            "traffic.spawn_lane_change_chance",
            traffic.spawn_lane_change_chance,
        )?;
        for (field, profile) in [
            ("traffic.ordinary", &traffic.ordinary),
            ("traffic.drunk", &traffic.drunk),
            ("traffic.bus", &traffic.bus),
        ] {
            check_probability(field, profile.lane_change_chance)?;
            check_range(field, profile.signal_ms)?;
            if profile.spawn_weight < 0.0 || profile.width <= 0.0 || profile.height <= 0.0 {
                return Err(invalid(field, "weights must be non-negative, sizes positive"));
            }
            if profile.speed_factor <= 0.0 {
                return Err(invalid(field, "speed_factor must be positive"));
            }
            if traffic.speed_range.1 * profile.speed_factor > self.drive.max_speed {
                return Err(invalid(
                    field,
                    format!(
                        "top speed {} exceeds drive.max_speed {}",
                        traffic.speed_range.1 * profile.speed_factor,
                        self.drive.max_speed
                    ),
                ));
            }
            if profile.weave_ms < 0.0 {
                return Err(invalid(field, "weave_ms must not be negative"));
            }
            check_range(field, profile.weave_intensity)?;
        }
        let total_weight =
            traffic.ordinary.spawn_weight + traffic.drunk.spawn_weight + traffic.bus.spawn_weight;
        if total_weight <= 0.0 {
            return Err(invalid("traffic", "at least one kind needs a spawn weight"));
        }
        Ok(())
    }
}
