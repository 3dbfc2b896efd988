use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use wanderlust_core::errors::CoreError;
use wanderlust_core::models::calendar::CalendarEvent;
use wanderlust_core::models::feedback::{DeclineReason, TripFeedback};
use wanderlust_core::models::preferences::{ActivityLevel, UserPreferences};
use wanderlust_core::models::trip::TripSuggestion;
use wanderlust_core::providers::traits::{GenerationRequest, OutputFormat, TextGenerator};
use wanderlust_core::services::email_service::{
    build_email_prompt, EmailComposer, EMAIL_SUBJECT, FALLBACK_EMAIL_HTML,
};
use wanderlust_core::services::preference_service::PreferenceService;
use wanderlust_core::services::suggestion_service::{
    build_prompt, feedback_digest, parse_suggestions, strip_code_fences, trip_response_schema,
    SuggestionGenerator, SUGGESTION_COUNT,
};

// ═══════════════════════════════════════════════════════════════════
//  Mock generator
// ═══════════════════════════════════════════════════════════════════

/// Replays scripted replies in order and records every request.
struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, CoreError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<Result<String, CoreError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, CoreError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CoreError::Network("no scripted reply left".into())))
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Fixtures
// ═══════════════════════════════════════════════════════════════════

fn prefs() -> UserPreferences {
    UserPreferences {
        origin_city: "San Francisco".into(),
        preferred_airport: "SFO".into(),
        budget: 2000.0,
        currency: "USD".into(),
        activity_level: ActivityLevel::Moderate,
        interests: vec!["Museums".into(), "Food".into()],
        excluded_destinations: vec!["Las Vegas".into()],
    }
}

fn europe() -> CalendarEvent {
    CalendarEvent::new("2", "Travel to Europe", "2026-02-01", "2026-02-08")
}

fn trip_json(id: &str, destination: &str) -> serde_json::Value {
    json!({
        "id": id,
        "destination": destination,
        "dates": "2026-02-01 to 2026-02-08",
        "totalPrice": 1800.0,
        "currency": "USD",
        "summary": "Good value",
        "highlights": ["Old town", "Food tour"],
        "flight": {
            "airline": "Test Air", "flightNumber": "TA1", "departureAirport": "SFO",
            "arrivalAirport": "LHR", "departureTime": "2026-02-01T08:00",
            "arrivalTime": "2026-02-02T02:00", "price": 700.0
        },
        "hotel": { "name": "Inn", "rating": 4.2, "address": "1 Road", "pricePerNight": 120.0 }
    })
}

fn batch_reply(count: usize) -> String {
    let items: Vec<_> = (0..count)
        .map(|i| trip_json(&format!("t{i}"), &format!("City {i}")))
        .collect();
    json!({ "suggestions": items }).to_string()
}

fn suggestions(count: usize) -> Vec<TripSuggestion> {
    parse_suggestions(&batch_reply(count)).unwrap()
}

// ═══════════════════════════════════════════════════════════════════
//  PreferenceService
// ═══════════════════════════════════════════════════════════════════

mod preference_service {
    use super::*;

    #[test]
    fn accepts_complete_preferences() {
        let p = PreferenceService::new().validate(&prefs()).unwrap();
        assert_eq!(p.origin_city, "San Francisco");
        assert_eq!(p.preferred_airport, "SFO");
    }

    #[test]
    fn normalizes_codes_and_lists() {
        let input = UserPreferences {
            origin_city: "  Boston ".into(),
            preferred_airport: " bos ".into(),
            currency: "eur".into(),
            interests: vec![" Hiking ".into(), "".into(), "   ".into()],
            excluded_destinations: vec!["Paris".into(), " ".into()],
            ..prefs()
        };
        let p = PreferenceService::new().validate(&input).unwrap();
        assert_eq!(p.origin_city, "Boston");
        assert_eq!(p.preferred_airport, "BOS");
        assert_eq!(p.currency, "EUR");
        assert_eq!(p.interests, vec!["Hiking".to_string()]);
        assert_eq!(p.excluded_destinations, vec!["Paris".to_string()]);
    }

    #[test]
    fn empty_lists_are_allowed() {
        let input = UserPreferences {
            interests: vec![],
            excluded_destinations: vec![],
            ..prefs()
        };
        assert!(PreferenceService::new().validate(&input).is_ok());
    }

    #[test]
    fn rejects_missing_origin() {
        let input = UserPreferences { origin_city: "  ".into(), ..prefs() };
        assert!(matches!(
            PreferenceService::new().validate(&input),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn rejects_bad_airport_codes() {
        for code in ["", "SF", "SFOXYZ", "S1O", "S-O"] {
            let input = UserPreferences { preferred_airport: code.into(), ..prefs() };
            assert!(
                matches!(PreferenceService::new().validate(&input), Err(CoreError::Validation(_))),
                "airport {code:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_non_ascii_codes_that_uppercase_to_ascii() {
        let service = PreferenceService::new();
        for code in ["ßß", "ﬀﬀ", "SFÖ"] {
            let input = UserPreferences { preferred_airport: code.into(), ..prefs() };
            assert!(
                matches!(service.validate(&input), Err(CoreError::Validation(_))),
                "airport {code:?} should be rejected"
            );
        }
        let input = UserPreferences { currency: "uſd".into(), ..prefs() };
        assert!(matches!(service.validate(&input), Err(CoreError::Validation(_))));
    }

    #[test]
    fn accepts_four_and_five_letter_codes() {
        for code in ["EGLL", "KJFKX"] {
            let input = UserPreferences { preferred_airport: code.into(), ..prefs() };
            assert!(PreferenceService::new().validate(&input).is_ok());
        }
    }

    #[test]
    fn budget_floor() {
        let service = PreferenceService::new();
        let ok = UserPreferences { budget: 100.0, ..prefs() };
        assert!(service.validate(&ok).is_ok());

        for budget in [99.99, 0.0, -5.0, f64::NAN, f64::INFINITY] {
            let bad = UserPreferences { budget, ..prefs() };
            assert!(matches!(service.validate(&bad), Err(CoreError::Validation(_))));
        }
    }

    #[test]
    fn rejects_bad_currency() {
        for currency in ["", "US", "USDX", "U$D"] {
            let input = UserPreferences { currency: currency.into(), ..prefs() };
            assert!(matches!(
                PreferenceService::new().validate(&input),
                Err(CoreError::Validation(_))
            ));
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Reply parsing
// ═══════════════════════════════════════════════════════════════════

mod reply_parsing {
    use super::*;

    #[test]
    fn strips_json_fence() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```JSON {\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(strip_code_fences("  {\"a\":1} \n"), "{\"a\":1}");
    }

    #[test]
    fn parses_full_batch() {
        let batch = parse_suggestions(&batch_reply(5)).unwrap();
        assert_eq!(batch.len(), 5);
        assert_eq!(batch[0].id, "t0");
        assert_eq!(batch[4].destination, "City 4");
    }

    #[test]
    fn fenced_reply_parses() {
        let raw = format!("```json\n{}\n```", batch_reply(2));
        assert_eq!(parse_suggestions(&raw).unwrap().len(), 2);
    }

    #[test]
    fn any_positive_count_is_accepted() {
        assert_eq!(parse_suggestions(&batch_reply(1)).unwrap().len(), 1);
        assert_eq!(parse_suggestions(&batch_reply(7)).unwrap().len(), 7);
    }

    #[test]
    fn explicit_empty_list_is_no_suitable_trips() {
        let err = parse_suggestions(r#"{"suggestions": []}"#).unwrap_err();
        assert!(matches!(err, CoreError::NoSuitableTrips));
    }

    #[test]
    fn empty_reply_is_generation_error() {
        assert!(matches!(parse_suggestions(""), Err(CoreError::Generation(_))));
        assert!(matches!(parse_suggestions("```json\n```"), Err(CoreError::Generation(_))));
    }

    #[test]
    fn malformed_json_is_generation_error() {
        assert!(matches!(
            parse_suggestions("Here are some trips!"),
            Err(CoreError::Generation(_))
        ));
    }

    #[test]
    fn missing_flight_field_rejects_whole_batch() {
        let mut bad = trip_json("t1", "Rome");
        bad["flight"].as_object_mut().unwrap().remove("arrivalAirport");
        let raw = json!({ "suggestions": [trip_json("t0", "Paris"), bad] }).to_string();
        assert!(matches!(parse_suggestions(&raw), Err(CoreError::Generation(_))));
    }

    #[test]
    fn negative_price_rejects_batch() {
        let mut bad = trip_json("t1", "Rome");
        bad["totalPrice"] = json!(-1.0);
        let raw = json!({ "suggestions": [bad] }).to_string();
        assert!(matches!(parse_suggestions(&raw), Err(CoreError::Generation(_))));
    }

    #[test]
    fn out_of_range_rating_rejects_batch() {
        let mut bad = trip_json("t1", "Rome");
        bad["hotel"]["rating"] = json!(7.5);
        let raw = json!({ "suggestions": [bad] }).to_string();
        assert!(matches!(parse_suggestions(&raw), Err(CoreError::Generation(_))));
    }

    #[test]
    fn duplicate_ids_reject_batch() {
        let raw = json!({ "suggestions": [trip_json("dup", "A"), trip_json("dup", "B")] }).to_string();
        assert!(matches!(parse_suggestions(&raw), Err(CoreError::Generation(_))));
    }

    #[test]
    fn blank_destination_rejects_batch() {
        let raw = json!({ "suggestions": [trip_json("t1", "  ")] }).to_string();
        assert!(matches!(parse_suggestions(&raw), Err(CoreError::Generation(_))));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Prompt building
// ═══════════════════════════════════════════════════════════════════

mod prompts {
    use super::*;

    #[test]
    fn empty_history_has_no_digest() {
        assert_eq!(feedback_digest(&[]).unwrap(), "");
    }

    #[test]
    fn digest_lists_declines_to_avoid() {
        let history = vec![TripFeedback::decline("t9", DeclineReason::Price, "too costly")];
        let digest = feedback_digest(&history).unwrap();
        assert!(digest.contains("Avoid suggestions similar to these declined ones"));
        assert!(digest.contains("\"tripId\":\"t9\""));
        assert!(digest.contains("\"reason\":\"Price\""));
        assert!(digest.contains("too costly"));
        assert!(!digest.contains("previously accepted"));
    }

    #[test]
    fn digest_lists_accepted_trips() {
        let history = vec![TripFeedback::accept("t3", Some("loved the beach".into()))];
        let digest = feedback_digest(&history).unwrap();
        assert!(digest.contains("The user previously accepted these types of trips"));
        assert!(digest.contains("loved the beach"));
        assert!(!digest.contains("Avoid"));
    }

    #[test]
    fn prompt_carries_profile_and_window() {
        let prompt = build_prompt(&prefs(), &europe(), &[]).unwrap();
        assert!(prompt.contains("San Francisco"));
        assert!(prompt.contains("SFO"));
        assert!(prompt.contains("2000 USD"));
        assert!(prompt.contains("Moderate"));
        assert!(prompt.contains("Museums, Food"));
        assert!(prompt.contains("Las Vegas"));
        assert!(prompt.contains("Travel to Europe"));
        assert!(prompt.contains("2026-02-01 to 2026-02-08"));
        assert!(prompt.contains(&format!("exactly {SUGGESTION_COUNT}")));
    }

    #[test]
    fn prompt_marks_empty_lists() {
        let p = UserPreferences {
            interests: vec![],
            excluded_destinations: vec![],
            ..prefs()
        };
        let prompt = build_prompt(&p, &europe(), &[]).unwrap();
        assert!(prompt.contains("Interests: none"));
        assert!(prompt.contains("Excluded destinations: none"));
    }

    #[test]
    fn prompt_includes_feedback_digest() {
        let history = vec![TripFeedback::decline("t9", DeclineReason::Dates, "wrong week")];
        let prompt = build_prompt(&prefs(), &europe(), &history).unwrap();
        assert!(prompt.contains("wrong week"));
    }

    #[test]
    fn schema_requires_flight_fields() {
        let schema = trip_response_schema();
        let item = &schema["properties"]["suggestions"]["items"];
        assert_eq!(schema["type"], "OBJECT");
        assert!(item["required"].as_array().unwrap().contains(&json!("flight")));
        assert_eq!(item["properties"]["flight"]["required"].as_array().unwrap().len(), 7);
    }

    #[test]
    fn email_prompt_mentions_routes_and_buttons() {
        let batch = suggestions(2);
        let prompt = build_email_prompt(&batch, "Alex").unwrap();
        assert!(prompt.contains(EMAIL_SUBJECT));
        assert!(prompt.contains("Alex"));
        assert!(prompt.contains("SFO -> LHR"));
        assert!(prompt.contains("\"Accept\""));
        assert!(prompt.contains("\"Decline\""));
        assert!(prompt.contains("all 2 suggestions"));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  SuggestionGenerator
// ═══════════════════════════════════════════════════════════════════

mod suggestion_generator {
    use super::*;

    #[tokio::test]
    async fn returns_validated_batch() {
        let mock = ScriptedGenerator::new(vec![Ok(batch_reply(5))]);
        let generator = SuggestionGenerator::new(mock.clone());

        let batch = generator.generate(&prefs(), &europe(), &[]).await.unwrap();
        assert_eq!(batch.len(), 5);

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert!(matches!(requests[0].format, OutputFormat::Json { .. }));
        assert!(requests[0].system_instruction.is_some());
        assert!(requests[0].prompt.contains("Travel to Europe"));
    }

    #[tokio::test]
    async fn feedback_reaches_the_prompt() {
        let mock = ScriptedGenerator::new(vec![Ok(batch_reply(1))]);
        let generator = SuggestionGenerator::new(mock.clone());
        let history = vec![TripFeedback::decline("old", DeclineReason::Price, "too costly")];

        generator.generate(&prefs(), &europe(), &history).await.unwrap();
        assert!(mock.requests()[0].prompt.contains("too costly"));
    }

    #[tokio::test]
    async fn invalid_preferences_skip_the_service() {
        let mock = ScriptedGenerator::new(vec![Ok(batch_reply(5))]);
        let generator = SuggestionGenerator::new(mock.clone());
        let bad = UserPreferences { budget: 10.0, ..prefs() };

        let err = generator.generate(&bad, &europe(), &[]).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn event_without_dates_is_rejected() {
        let mock = ScriptedGenerator::new(vec![]);
        let generator = SuggestionGenerator::new(mock.clone());
        let event = CalendarEvent::new("9", "Travel somewhere", "", "");

        let err = generator.generate(&prefs(), &event, &[]).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn empty_list_maps_to_no_suitable_trips() {
        let mock = ScriptedGenerator::new(vec![Ok(r#"{"suggestions":[]}"#.into())]);
        let generator = SuggestionGenerator::new(mock);
        let err = generator.generate(&prefs(), &europe(), &[]).await.unwrap_err();
        assert!(matches!(err, CoreError::NoSuitableTrips));
    }

    #[tokio::test]
    async fn service_failure_becomes_generation_error() {
        let mock = ScriptedGenerator::new(vec![Err(CoreError::Api {
            provider: "Scripted".into(),
            message: "HTTP 503: overloaded".into(),
        })]);
        let generator = SuggestionGenerator::new(mock);
        let err = generator.generate(&prefs(), &europe(), &[]).await.unwrap_err();
        match err {
            CoreError::Generation(msg) => assert!(msg.contains("overloaded")),
            other => panic!("expected Generation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_key_stays_configuration_error() {
        let mock = ScriptedGenerator::new(vec![Err(CoreError::Configuration("no key".into()))]);
        let generator = SuggestionGenerator::new(mock);
        let err = generator.generate(&prefs(), &europe(), &[]).await.unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  EmailComposer
// ═══════════════════════════════════════════════════════════════════

mod email_composer {
    use super::*;

    #[tokio::test]
    async fn returns_reply_verbatim() {
        let html = "<html><body><h1>Trips</h1></body></html>";
        let mock = ScriptedGenerator::new(vec![Ok(html.into())]);
        let composer = EmailComposer::new(mock.clone());

        let out = composer.compose(&suggestions(5), Some("Alex")).await.unwrap();
        assert_eq!(out, html);

        let requests = mock.requests();
        assert_eq!(requests[0].format, OutputFormat::PlainText);
        assert!(requests[0].prompt.contains("Alex"));
    }

    #[tokio::test]
    async fn blank_name_uses_default_greeting() {
        let mock = ScriptedGenerator::new(vec![Ok("<p>hi</p>".into())]);
        let composer = EmailComposer::new(mock.clone());
        composer.compose(&suggestions(1), Some("   ")).await.unwrap();
        assert!(mock.requests()[0].prompt.contains("Traveler"));
    }

    #[tokio::test]
    async fn empty_reply_uses_fallback() {
        let mock = ScriptedGenerator::new(vec![Ok("  \n".into())]);
        let composer = EmailComposer::new(mock);
        let out = composer.compose(&suggestions(2), None).await.unwrap();
        assert_eq!(out, FALLBACK_EMAIL_HTML);
    }

    #[tokio::test]
    async fn service_failure_becomes_composition_error() {
        let mock = ScriptedGenerator::new(vec![Err(CoreError::Network("timed out".into()))]);
        let composer = EmailComposer::new(mock);
        let err = composer.compose(&suggestions(2), None).await.unwrap_err();
        assert!(matches!(err, CoreError::Composition(_)));
    }

    #[tokio::test]
    async fn only_the_given_batch_is_embedded() {
        let mock = ScriptedGenerator::new(vec![Ok("<p>ok</p>".into())]);
        let composer = EmailComposer::new(mock.clone());
        let batch: Vec<TripSuggestion> = suggestions(3).into_iter().take(2).collect();

        composer.compose(&batch, None).await.unwrap();
        let prompt = &mock.requests()[0].prompt;
        assert!(prompt.contains("City 0"));
        assert!(prompt.contains("City 1"));
        assert!(!prompt.contains("City 2"));
    }
}
