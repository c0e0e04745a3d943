//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod agent;
pub mod collision;
pub mod kinematics;
pub mod player;
pub mod road;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod traffic;

pub use agent::{Agent, AgentKind, Behavior, BehaviorTag, Direction, LaneChangeOutcome};
pub use collision::{Aabb, Contact, Impulse, Side, box_contact, vehicle_impulse, wall_impulse};
pub use kinematics::{Pose, SteeringState, Tumble};
pub use player::Player;
pub use road::RoadWindow;
pub use snapshot::Snapshot;
pub use state::{Camera, CrashCause, GameEvent, GamePhase, GameState};
pub use tick::{ControlInput, tick};
pub use traffic::TrafficManager;
