use thiserror::Error;

/// Message shown when the generation service returns an explicit empty batch.
pub const NO_SUITABLE_TRIPS_MESSAGE: &str =
    "No suitable trips found. Please try adjusting your preferences.";

/// Unified error type for the entire wanderlust-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── User input ──────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Action not available: {0}")]
    InvalidState(String),

    // ── Configuration ───────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ── Pipeline stages ─────────────────────────────────────────────
    #[error("Calendar connection failed: {0}")]
    CalendarConnection(String),

    #[error("Trip generation failed: {0}")]
    Generation(String),

    #[error("{}", NO_SUITABLE_TRIPS_MESSAGE)]
    NoSuitableTrips,

    #[error("Email composition failed: {0}")]
    Composition(String),

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    // ── Storage ─────────────────────────────────────────────────────
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("File I/O error: {0}")]
    FileIO(String),
}

impl CoreError {
    /// Wrap a service failure as a generation error, keeping configuration
    /// problems distinct so the user is pointed at the right fix.
    pub fn into_generation(self) -> Self {
        match self {
            e @ (CoreError::Configuration(_)
            | CoreError::Generation(_)
            | CoreError::NoSuitableTrips
            | CoreError::Validation(_)) => e,
            other => CoreError::Generation(other.to_string()),
        }
    }

    /// Same as [`CoreError::into_generation`], for the email stage.
    pub fn into_composition(self) -> Self {
        match self {
            e @ (CoreError::Configuration(_) | CoreError::Composition(_)) => e,
            other => CoreError::Composition(other.to_string()),
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(e: config::ConfigError) -> Self {
        CoreError::Configuration(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL; strip the query so keys passed
        // as parameters never reach a log line or the UI.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
