//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Frame timing (fixed-timestep accumulator)
//! - Input events (keyboard, pedal buttons, steering wheel)
//! - Storage (LocalStorage on web, in-memory natively)

pub mod clock;
pub mod input;
pub mod storage;

pub use clock::FrameClock;
pub use input::{InputAdapter, Key, SteeringWheel};
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStore;
pub use storage::{KeyValueStore, MemoryStore, StorageError};
