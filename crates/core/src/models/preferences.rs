use serde::{Deserialize, Serialize};

/// How much physical activity the traveler wants on a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityLevel {
    Relaxed,
    Moderate,
    Active,
}

impl std::fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityLevel::Relaxed => write!(f, "Relaxed"),
            ActivityLevel::Moderate => write!(f, "Moderate"),
            ActivityLevel::Active => write!(f, "Active"),
        }
    }
}

/// Traveler profile used to steer trip generation.
///
/// Replaced wholesale on every save and persisted in full. Field names are
/// camelCase on the wire so stored values stay compatible with the web build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    /// Home city, free text (e.g., "San Francisco")
    pub origin_city: String,

    /// IATA-style departure airport code, always uppercase (e.g., "SFO")
    pub preferred_airport: String,

    /// Total trip budget in `currency`
    pub budget: f64,

    /// ISO currency code (e.g., "USD")
    pub currency: String,

    pub activity_level: ActivityLevel,

    /// Ordered list of interests ("Hiking", "Museums", ...)
    #[serde(default)]
    pub interests: Vec<String>,

    /// Destinations the traveler never wants suggested
    #[serde(default)]
    pub excluded_destinations: Vec<String>,
}

impl Default for UserPreferences {
    /// The values the preferences form starts out with.
    fn default() -> Self {
        Self {
            origin_city: String::new(),
            preferred_airport: "SFO".to_string(),
            budget: 2000.0,
            currency: "USD".to_string(),
            activity_level: ActivityLevel::Moderate,
            interests: Vec::new(),
            excluded_destinations: Vec::new(),
        }
    }
}
