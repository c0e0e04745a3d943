//! Persisted best score
//!
//! A single number under a fixed storage key. Missing or unreadable values
//! count as zero.

use crate::platform::storage::{KeyValueStore, StorageError};

/// Best score across sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighScore {
    pub best: u64,
}

impl HighScore {
    /// Storage key
    const STORAGE_KEY: &'static str = "swap_lane_high_score";

    pub fn new(best: u64) -> Self {
        Self { best }
    }

    /// Raise the best score if `score` beats it; returns whether it did
    pub fn record(&mut self, score: u64) -> bool {
        if score > self.best {
            self.best = score;
            true
        } else {
            false
        }
    }

    fn try_load(store: &impl KeyValueStore) -> Result<Option<u64>, StorageError> {
        match store.get(Self::STORAGE_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(raw.trim())?)),
            None => Ok(None),
        }
    }

    /// Load the stored best score
    pub fn load(store: &impl KeyValueStore) -> Self {
        match Self::try_load(store) {
            Ok(Some(best)) => {
                log::info!("Loaded high score {}", best);
                Self { best }
            }
            Ok(None) => {
                log::info!("No high score stored, starting at 0");
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring stored high score: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut impl KeyValueStore) {
        match store.set(Self::STORAGE_KEY, &self.best.to_string()) {
            Ok(()) => log::info!("High score saved ({})", self.best),
            Err(e) => log::warn!("Could not save high score: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::storage::MemoryStore;

    #[test]
    fn test_record_only_raises() {
        let mut high = HighScore::new(10);
        assert!(!high.record(5));
        assert!(!high.record(10));
        assert!(high.record(11));
        assert_eq!(high.best, 11);
    }

    #[test]
    fn test_missing_key_is_zero() {
        let store = MemoryStore::new();
        assert_eq!(HighScore::load(&store).best, 0);
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        HighScore::new(42).save(&mut store);
        assert_eq!(
            store.get("swap_lane_high_score").ok().flatten().as_deref(),
            Some("42")
        );
        assert_eq!(HighScore::load(&store).best, 42);
    }

    #[test]
    fn test_unparsable_value_is_zero() {
        let mut store = MemoryStore::new();
        store
            .set("swap_lane_high_score", "lots")
            .expect("memory writes succeed");
        assert_eq!(HighScore::load(&store).best, 0);

        store
            .set("swap_lane_high_score", "-3")
            .expect("memory writes succeed");
        assert_eq!(HighScore::load(&store).best, 0);
    }
}
