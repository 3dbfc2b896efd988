use crate::errors::CoreError;
use crate::models::feedback::TripFeedback;
use crate::models::preferences::UserPreferences;

use super::kv::KeyValueStore;

/// Key holding the JSON-encoded `UserPreferences`.
pub const PREFERENCES_KEY: &str = "wanderlust_prefs";

/// Key holding the JSON-encoded `Vec<TripFeedback>`.
pub const FEEDBACK_KEY: &str = "wanderlust_feedback";

/// Typed save/load of session data on top of a [`KeyValueStore`].
///
/// Flow: value → serde_json → string → adapter. Reads never fail on bad data:
/// a corrupt or missing value is logged and treated as "nothing stored".
pub struct StorageManager {
    store: Box<dyn KeyValueStore>,
}

impl StorageManager {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load saved preferences. `None` means first run (or unreadable data).
    pub fn load_preferences(&self) -> Option<UserPreferences> {
        self.load_json(PREFERENCES_KEY)
    }

    pub fn save_preferences(&mut self, prefs: &UserPreferences) -> Result<(), CoreError> {
        let encoded = serde_json::to_string(prefs)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize preferences: {e}")))?;
        self.store.set(PREFERENCES_KEY, &encoded)
    }

    /// Load the feedback history in stored order. Unreadable data yields an empty list.
    pub fn load_feedback(&self) -> Vec<TripFeedback> {
        self.load_json(FEEDBACK_KEY).unwrap_or_default()
    }

    pub fn save_feedback(&mut self, feedback: &[TripFeedback]) -> Result<(), CoreError> {
        let encoded = serde_json::to_string(feedback)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize feedback: {e}")))?;
        self.store.set(FEEDBACK_KEY, &encoded)
    }

    /// Forget both stored values.
    pub fn clear(&mut self) -> Result<(), CoreError> {
        self.store.remove(PREFERENCES_KEY)?;
        self.store.remove(FEEDBACK_KEY)
    }

    fn load_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read stored value, starting empty");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "stored value is corrupt, ignoring it");
                None
            }
        }
    }
}

impl std::fmt::Debug for StorageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageManager").finish_non_exhaustive()
    }
}
