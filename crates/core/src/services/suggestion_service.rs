use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::calendar::CalendarEvent;
use crate::models::feedback::{DeclineReason, TripFeedback};
use crate::models::preferences::UserPreferences;
use crate::models::trip::{SuggestionEnvelope, TripSuggestion};
use crate::providers::traits::{GenerationRequest, TextGenerator};
use crate::services::preference_service::PreferenceService;

/// Number of combinations the service is asked for.
pub const SUGGESTION_COUNT: usize = 5;

const SYSTEM_INSTRUCTION: &str =
    "You are a helpful travel assistant focusing on budget optimization and personalization.";

/// Asks the generation service for flight + hotel combinations and turns the
/// reply into a fully validated batch.
///
/// A batch is all-or-nothing: one malformed item rejects the whole reply.
pub struct SuggestionGenerator {
    generator: Arc<dyn TextGenerator>,
    preferences: PreferenceService,
}

impl SuggestionGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            preferences: PreferenceService::new(),
        }
    }

    /// Generate a suggestion batch for one travel window.
    ///
    /// Errors:
    /// - `Validation` if the preferences are incomplete or the event has no date range
    /// - `NoSuitableTrips` if the service explicitly returned an empty list
    /// - `Generation` for service failures and replies that break the schema
    /// - `Configuration` if the service has no credential
    pub async fn generate(
        &self,
        prefs: &UserPreferences,
        travel_event: &CalendarEvent,
        feedback_history: &[TripFeedback],
    ) -> Result<Vec<TripSuggestion>, CoreError> {
        let prefs = self.preferences.validate(prefs)?;
        if !travel_event.has_date_range() {
            return Err(CoreError::Validation(format!(
                "Event '{}' has no start/end date",
                travel_event.title
            )));
        }

        let prompt = build_prompt(&prefs, travel_event, feedback_history)?;
        tracing::info!(
            provider = self.generator.name(),
            event = %travel_event.title,
            feedback_entries = feedback_history.len(),
            "requesting trip suggestions"
        );
        tracing::debug!(prompt_chars = prompt.len(), "suggestion prompt built");

        let request = GenerationRequest::json(prompt, trip_response_schema())
            .with_system_instruction(SYSTEM_INSTRUCTION);
        let raw = self
            .generator
            .generate(request)
            .await
            .map_err(CoreError::into_generation)?;

        let suggestions = parse_suggestions(&raw)?;
        tracing::info!(count = suggestions.len(), "trip suggestions decoded");
        Ok(suggestions)
    }
}

// ── Prompt ──────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeclinedDigest<'a> {
    trip_id: &'a str,
    reason: Option<DeclineReason>,
    feedback_text: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AcceptedDigest<'a> {
    trip_id: &'a str,
    feedback_text: Option<&'a str>,
}

/// Summarize past feedback for the prompt.
///
/// Declined trips are listed as patterns to avoid, accepted ones as things
/// the user liked. Empty history yields an empty string.
pub fn feedback_digest(history: &[TripFeedback]) -> Result<String, CoreError> {
    let declined: Vec<DeclinedDigest<'_>> = history
        .iter()
        .filter(|f| !f.accepted)
        .map(|f| DeclinedDigest {
            trip_id: &f.trip_id,
            reason: f.reason,
            feedback_text: f.feedback_text.as_deref(),
        })
        .collect();
    let accepted: Vec<AcceptedDigest<'_>> = history
        .iter()
        .filter(|f| f.accepted)
        .map(|f| AcceptedDigest {
            trip_id: &f.trip_id,
            feedback_text: f.feedback_text.as_deref(),
        })
        .collect();

    let mut digest = String::new();
    if !declined.is_empty() {
        let encoded = serde_json::to_string(&declined)
            .map_err(|e| CoreError::Serialization(format!("Failed to encode declined feedback: {e}")))?;
        digest.push_str(&format!(
            "Avoid suggestions similar to these declined ones (user feedback included): {encoded}.\n"
        ));
    }
    if !accepted.is_empty() {
        let encoded = serde_json::to_string(&accepted)
            .map_err(|e| CoreError::Serialization(format!("Failed to encode accepted feedback: {e}")))?;
        digest.push_str(&format!(
            "The user previously accepted these types of trips: {encoded}.\n"
        ));
    }
    Ok(digest)
}

/// Full instruction for one generation call.
pub fn build_prompt(
    prefs: &UserPreferences,
    event: &CalendarEvent,
    history: &[TripFeedback],
) -> Result<String, CoreError> {
    let digest = feedback_digest(history)?;
    let interests = join_or_none(&prefs.interests);
    let excluded = join_or_none(&prefs.excluded_destinations);

    Ok(format!(
        "You are an expert travel agent.\n\
         \n\
         Traveler profile:\n\
         - Origin city: {origin}\n\
         - Preferred departure airport: {airport}\n\
         - Budget: {budget} {currency}\n\
         - Activity level: {activity}\n\
         - Interests: {interests}\n\
         - Excluded destinations: {excluded}\n\
         \n\
         Calendar trigger:\n\
         - Event: \"{title}\"\n\
         - Dates: {start} to {end}\n\
         \n\
         Task:\n\
         Propose exactly {count} of the best value (cheapest but comfortable) flight and hotel \
         combinations for this date range and traveler.\n\
         {digest}\
         \n\
         Requirements:\n\
         - Every flight departs from {airport}.\n\
         - Flight times and durations are realistic for the destination.\n\
         - The total price is within or close to the budget of {budget} {currency}.\n\
         - Use realistic synthesized airlines, flight numbers, hotels and prices; no live data is available.\n\
         - Give every suggestion a distinct id.\n",
        origin = prefs.origin_city,
        airport = prefs.preferred_airport,
        budget = prefs.budget,
        currency = prefs.currency,
        activity = prefs.activity_level,
        title = event.title,
        start = event.start,
        end = event.end,
        count = SUGGESTION_COUNT,
    ))
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/// Response schema sent with every suggestion request.
pub fn trip_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "suggestions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING" },
                        "destination": { "type": "STRING" },
                        "dates": { "type": "STRING", "description": "Format: YYYY-MM-DD to YYYY-MM-DD" },
                        "totalPrice": { "type": "NUMBER" },
                        "currency": { "type": "STRING" },
                        "summary": { "type": "STRING" },
                        "highlights": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "flight": {
                            "type": "OBJECT",
                            "properties": {
                                "airline": { "type": "STRING" },
                                "flightNumber": { "type": "STRING" },
                                "departureAirport": { "type": "STRING" },
                                "arrivalAirport": { "type": "STRING" },
                                "departureTime": { "type": "STRING" },
                                "arrivalTime": { "type": "STRING" },
                                "price": { "type": "NUMBER" }
                            },
                            "required": [
                                "airline", "flightNumber", "departureAirport",
                                "arrivalAirport", "departureTime", "arrivalTime", "price"
                            ]
                        },
                        "hotel": {
                            "type": "OBJECT",
                            "properties": {
                                "name": { "type": "STRING" },
                                "rating": { "type": "NUMBER" },
                                "address": { "type": "STRING" },
                                "pricePerNight": { "type": "NUMBER" }
                            },
                            "required": ["name", "pricePerNight"]
                        }
                    },
                    "required": [
                        "id", "destination", "totalPrice", "currency",
                        "summary", "highlights", "flight", "hotel"
                    ]
                }
            }
        },
        "required": ["suggestions"]
    })
}

// ── Response handling ───────────────────────────────────────────────

/// Remove a surrounding Markdown code fence (```` ```json ```` or ```` ``` ````).
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let rest = match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        };
        text = rest.trim_start();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }
    text
}

/// Decode and validate a raw reply into a suggestion batch.
///
/// An explicit empty `suggestions` array is `NoSuitableTrips`; an empty or
/// malformed reply is a `Generation` error.
pub fn parse_suggestions(raw: &str) -> Result<Vec<TripSuggestion>, CoreError> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return Err(CoreError::Generation(
            "The generation service returned an empty response".into(),
        ));
    }

    let envelope: SuggestionEnvelope = serde_json::from_str(cleaned).map_err(|e| {
        tracing::warn!(error = %e, "suggestion reply failed to decode");
        CoreError::Generation(format!("Response did not match the trip schema: {e}"))
    })?;

    if envelope.suggestions.is_empty() {
        return Err(CoreError::NoSuitableTrips);
    }

    let mut seen = HashSet::new();
    for trip in &envelope.suggestions {
        validate_suggestion(trip)?;
        if !seen.insert(trip.id.as_str()) {
            return Err(CoreError::Generation(format!(
                "Duplicate suggestion id '{}' in batch",
                trip.id
            )));
        }
    }

    Ok(envelope.suggestions)
}

fn validate_suggestion(trip: &TripSuggestion) -> Result<(), CoreError> {
    let invalid = |what: &str| {
        CoreError::Generation(format!("Suggestion '{}' is invalid: {what}", trip.id))
    };

    if trip.id.trim().is_empty() {
        return Err(CoreError::Generation("Suggestion without an id".into()));
    }
    if trip.destination.trim().is_empty() {
        return Err(invalid("missing destination"));
    }
    for (label, price) in [
        ("total price", trip.total_price),
        ("flight price", trip.flight.price),
        ("hotel price per night", trip.hotel.price_per_night),
    ] {
        if !price.is_finite() || price < 0.0 {
            return Err(invalid(&format!("{label} must be a non-negative number")));
        }
    }
    if !trip.hotel.rating.is_finite() || !(0.0..=5.0).contains(&trip.hotel.rating) {
        return Err(invalid("hotel rating must be between 0 and 5"));
    }
    Ok(())
}
