use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::trip::TripSuggestion;
use crate::providers::traits::{GenerationRequest, TextGenerator};

/// Returned when the service answers with nothing.
pub const FALLBACK_EMAIL_HTML: &str = "<p>Error generating email.</p>";

/// Subject line of the summary email.
pub const EMAIL_SUBJECT: &str = "Your Top 5 Travel Recommendations";

/// Greeting name used when the caller has none.
pub const DEFAULT_RECIPIENT: &str = "Traveler";

/// Turns a suggestion batch into a styled HTML summary email.
pub struct EmailComposer {
    generator: Arc<dyn TextGenerator>,
}

impl EmailComposer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Compose the email for exactly `suggestions` (the batch just generated,
    /// not the board history).
    ///
    /// The reply is returned verbatim. A blank reply degrades to
    /// [`FALLBACK_EMAIL_HTML`]; service failures are `Composition` errors.
    pub async fn compose(
        &self,
        suggestions: &[TripSuggestion],
        recipient_name: Option<&str>,
    ) -> Result<String, CoreError> {
        let name = recipient_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_RECIPIENT);

        let prompt = build_email_prompt(suggestions, name)?;
        tracing::info!(
            provider = self.generator.name(),
            suggestions = suggestions.len(),
            "composing summary email"
        );

        let html = self
            .generator
            .generate(GenerationRequest::plain_text(prompt))
            .await
            .map_err(CoreError::into_composition)?;

        if html.trim().is_empty() {
            tracing::warn!("email service returned an empty body, using fallback");
            return Ok(FALLBACK_EMAIL_HTML.to_string());
        }
        Ok(html)
    }
}

/// Instruction for the email call, with the batch embedded as JSON.
pub fn build_email_prompt(suggestions: &[TripSuggestion], recipient_name: &str) -> Result<String, CoreError> {
    let data = serde_json::to_string(suggestions)
        .map_err(|e| CoreError::Serialization(format!("Failed to encode suggestions: {e}")))?;

    let routes = suggestions
        .iter()
        .map(|t| {
            format!(
                "- {}: {} (departs {}, arrives {})",
                t.destination,
                t.flight.route(),
                t.flight.departure_time,
                t.flight.arrival_time
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!(
        "Create a professional, responsive HTML email as one complete HTML document.\n\
         Subject: {EMAIL_SUBJECT}\n\
         \n\
         Content:\n\
         - A greeting to {recipient_name}.\n\
         - A brief summary table of all {count} suggestions provided below.\n\
         - A detailed section for each suggestion: destination, total price, dates, flight and hotel \
         (hotel name and price per night).\n\
         - State each flight route explicitly in the form ORIGIN -> DESTINATION together with its times:\n\
         {routes}\n\
         - For EACH suggestion, include an \"Accept\" and a \"Decline\" button. They do not need to link \
         anywhere, but style them so they look functional.\n\
         - Use inline CSS only. Theme: clean, modern, blue/teal.\n\
         \n\
         Return only the HTML.\n\
         \n\
         Suggestions data:\n\
         {data}\n",
        count = suggestions.len(),
    ))
}
