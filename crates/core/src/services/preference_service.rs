use crate::errors::CoreError;
use crate::models::preferences::UserPreferences;

/// Smallest budget the preferences form accepts.
pub const MIN_BUDGET: f64 = 100.0;

/// Validates and normalizes traveler preferences.
///
/// Pure business logic, no I/O.
pub struct PreferenceService;

impl PreferenceService {
    pub fn new() -> Self {
        Self
    }

    /// Check every required field and return the normalized value.
    ///
    /// Rules:
    /// - Origin city must be non-empty
    /// - Airport code must be 3-5 ASCII letters (uppercased)
    /// - Budget must be finite and at least [`MIN_BUDGET`]
    /// - Currency must be exactly 3 ASCII letters (uppercased)
    /// - Interests and exclusions are trimmed; blank entries are dropped
    pub fn validate(&self, prefs: &UserPreferences) -> Result<UserPreferences, CoreError> {
        let origin_city = prefs.origin_city.trim().to_string();
        if origin_city.is_empty() {
            return Err(CoreError::Validation("Origin city is required".into()));
        }

        let raw_airport = prefs.preferred_airport.trim();
        if raw_airport.is_empty() {
            return Err(CoreError::Validation("Preferred airport is required".into()));
        }
        if !(3..=5).contains(&raw_airport.len()) || !raw_airport.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::Validation(format!(
                "Invalid airport code '{}': must be 3-5 letters (e.g., SFO)",
                prefs.preferred_airport
            )));
        }

        if !prefs.budget.is_finite() || prefs.budget < MIN_BUDGET {
            return Err(CoreError::Validation(format!(
                "Budget must be at least {MIN_BUDGET}, got {}",
                prefs.budget
            )));
        }

        let currency = prefs.currency.trim();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::Validation(format!(
                "Invalid currency code '{}': must be exactly 3 ASCII letters (e.g., USD, EUR)",
                prefs.currency
            )));
        }

        Ok(UserPreferences {
            origin_city,
            preferred_airport: raw_airport.to_ascii_uppercase(),
            budget: prefs.budget,
            currency: currency.to_ascii_uppercase(),
            activity_level: prefs.activity_level,
            interests: clean_list(&prefs.interests),
            excluded_destinations: clean_list(&prefs.excluded_destinations),
        })
    }
}

impl Default for PreferenceService {
    fn default() -> Self {
        Self::new()
    }
}

fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
