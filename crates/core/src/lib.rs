pub mod config;
pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use std::sync::Arc;

use config::AppConfig;
use errors::{CoreError, NO_SUITABLE_TRIPS_MESSAGE};
use models::{
    calendar::CalendarEvent,
    feedback::{DeclineReason, FeedbackLedger, TripFeedback},
    preferences::UserPreferences,
    session::{Completion, EmailStatus, PlannerState, RequestToken, View},
    trip::{TripBoard, TripSuggestion},
};
use providers::{
    calendar::MockCalendarConnector,
    gemini::GeminiProvider,
    traits::{CalendarConnector, TextGenerator},
};
use services::{
    email_service::{EmailComposer, DEFAULT_RECIPIENT},
    preference_service::PreferenceService,
    suggestion_service::SuggestionGenerator,
};
#[cfg(not(target_arch = "wasm32"))]
use storage::kv::FileStore;
use storage::kv::{KeyValueStore, MemoryStore};
use storage::manager::StorageManager;

/// Guidance shown on the dashboard once every suggestion has been handled.
pub const EMPTY_BOARD_PROMPT: &str =
    "No Active Suggestions. Go to the calendar page to generate new trip ideas.";

/// Main entry point for the Wanderlust core library.
///
/// Owns all session state (preferences, calendar, board, feedback, email)
/// and is its only writer. Frontends render from the getters and forward
/// user actions to the methods below.
#[must_use]
pub struct TripPlanner {
    preferences: Option<UserPreferences>,
    state: PlannerState,
    view: View,

    calendar_events: Vec<CalendarEvent>,
    calendar_connected: bool,
    connection_error: Option<String>,
    connect_token: Option<RequestToken>,

    selected_event_id: Option<String>,
    generation_token: Option<RequestToken>,
    generation_error: Option<String>,

    board: TripBoard,
    ledger: FeedbackLedger,
    email: EmailStatus,
    recipient_name: String,

    storage: StorageManager,
    calendar: Arc<dyn CalendarConnector>,
    suggestions: Arc<SuggestionGenerator>,
    composer: Arc<EmailComposer>,
    preference_service: PreferenceService,
}

impl std::fmt::Debug for TripPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripPlanner")
            .field("state", &self.state)
            .field("view", &self.view)
            .field("has_preferences", &self.preferences.is_some())
            .field("calendar_events", &self.calendar_events.len())
            .field("board", &self.board.len())
            .field("feedback", &self.ledger.len())
            .field("busy", &self.is_busy())
            .finish()
    }
}

// ── Async work handed to the host ───────────────────────────────────

/// A calendar connection issued by [`TripPlanner::begin_calendar_connect`].
#[must_use]
pub struct ConnectTicket {
    token: RequestToken,
    connector: Arc<dyn CalendarConnector>,
}

impl ConnectTicket {
    pub fn token(&self) -> RequestToken {
        self.token
    }

    /// Run the connection. Never touches planner state.
    pub async fn run(self) -> ConnectOutcome {
        let result = self.connector.connect().await;
        ConnectOutcome {
            token: self.token,
            result,
        }
    }
}

impl std::fmt::Debug for ConnectTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectTicket")
            .field("token", &self.token)
            .field("connector", &self.connector.name())
            .finish()
    }
}

/// Result of a [`ConnectTicket`], to be handed back to the planner.
#[derive(Debug)]
pub struct ConnectOutcome {
    token: RequestToken,
    pub result: Result<Vec<CalendarEvent>, CoreError>,
}

/// A generation run issued by [`TripPlanner::begin_generation`].
///
/// Carries its own copy of the preferences, the event and the feedback
/// history as they were when the run was issued; later feedback does not
/// reach an in-flight request.
#[must_use]
pub struct GenerationTicket {
    token: RequestToken,
    preferences: UserPreferences,
    event: CalendarEvent,
    feedback: Vec<TripFeedback>,
    recipient_name: String,
    suggestions: Arc<SuggestionGenerator>,
    composer: Arc<EmailComposer>,
}

impl GenerationTicket {
    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub fn event(&self) -> &CalendarEvent {
        &self.event
    }

    pub fn feedback_snapshot(&self) -> &[TripFeedback] {
        &self.feedback
    }

    /// Generate suggestions, then compose the email for that batch.
    ///
    /// A failed email does not fail the run: the batch comes back with
    /// `EmailStatus::Unavailable`.
    pub async fn run(self) -> GenerationOutcome {
        let result = match self
            .suggestions
            .generate(&self.preferences, &self.event, &self.feedback)
            .await
        {
            Ok(trips) => {
                let email = match self
                    .composer
                    .compose(&trips, Some(self.recipient_name.as_str()))
                    .await
                {
                    Ok(html) => EmailStatus::Ready(html),
                    Err(e) => {
                        tracing::warn!(error = %e, "email composition failed, keeping suggestions");
                        EmailStatus::Unavailable(e.to_string())
                    }
                };
                Ok(GeneratedBatch {
                    suggestions: trips,
                    email,
                })
            }
            Err(e) => Err(e),
        };
        GenerationOutcome {
            token: self.token,
            result,
        }
    }
}

impl std::fmt::Debug for GenerationTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationTicket")
            .field("token", &self.token)
            .field("event", &self.event)
            .field("feedback", &self.feedback.len())
            .finish_non_exhaustive()
    }
}

/// A successfully generated batch plus its email.
#[derive(Debug, Clone)]
pub struct GeneratedBatch {
    pub suggestions: Vec<TripSuggestion>,
    pub email: EmailStatus,
}

/// Result of a [`GenerationTicket`], to be handed back to the planner.
#[derive(Debug)]
pub struct GenerationOutcome {
    token: RequestToken,
    pub result: Result<GeneratedBatch, CoreError>,
}

impl TripPlanner {
    /// Open a session, reading saved preferences and feedback from `store`.
    /// Unreadable saved data starts the session empty instead of failing.
    pub fn open(
        store: Box<dyn KeyValueStore>,
        generator: Arc<dyn TextGenerator>,
        calendar: Arc<dyn CalendarConnector>,
    ) -> Self {
        let storage = StorageManager::new(store);
        let preference_service = PreferenceService::new();

        let preferences = storage.load_preferences().and_then(|p| {
            preference_service
                .validate(&p)
                .map_err(|e| tracing::warn!(error = %e, "stored preferences are invalid, ignoring them"))
                .ok()
        });
        let ledger = FeedbackLedger::from_entries(storage.load_feedback());

        let (state, view) = if preferences.is_some() {
            (PlannerState::PreferencesSet, View::Dashboard)
        } else {
            (PlannerState::NoPreferences, View::Preferences)
        };

        tracing::info!(
            has_preferences = preferences.is_some(),
            feedback_entries = ledger.len(),
            "session opened"
        );

        Self {
            preferences,
            state,
            view,
            calendar_events: Vec::new(),
            calendar_connected: false,
            connection_error: None,
            connect_token: None,
            selected_event_id: None,
            generation_token: None,
            generation_error: None,
            board: TripBoard::new(),
            ledger,
            email: EmailStatus::NotGenerated,
            recipient_name: DEFAULT_RECIPIENT.to_string(),
            storage,
            calendar,
            suggestions: Arc::new(SuggestionGenerator::new(Arc::clone(&generator))),
            composer: Arc::new(EmailComposer::new(generator)),
            preference_service,
        }
    }

    /// Wire up the real collaborators from process configuration: the Gemini
    /// provider, the mock calendar, and file or memory storage.
    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        config.validate()?;
        if config.api_key().is_err() {
            tracing::warn!("no generation API key configured; trip generation will fail until one is set");
        }

        let generator: Arc<dyn TextGenerator> = Arc::new(GeminiProvider::from_config(config));
        let calendar: Arc<dyn CalendarConnector> =
            Arc::new(MockCalendarConnector::from_config(&config.calendar));
        let store: Box<dyn KeyValueStore> = match &config.storage.dir {
            #[cfg(not(target_arch = "wasm32"))]
            Some(dir) => Box::new(FileStore::open(dir)?),
            _ => Box::new(MemoryStore::new()),
        };

        Ok(Self::open(store, generator, calendar).with_recipient_name(config.recipient_name.clone()))
    }

    /// Name used in the email greeting (defaults to "Traveler").
    pub fn with_recipient_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.trim().is_empty() {
            self.recipient_name = name;
        }
        self
    }

    // ── Session & Navigation ────────────────────────────────────────

    #[must_use]
    pub fn state(&self) -> PlannerState {
        self.state
    }

    #[must_use]
    pub fn current_view(&self) -> View {
        self.view
    }

    /// Resolve a route and make it the current view.
    ///
    /// `/` goes to the dashboard once preferences exist and to the
    /// preferences form before that; unknown paths land on preferences.
    pub fn navigate(&mut self, path: &str) -> View {
        let trimmed = path.trim().trim_start_matches('#');
        let view = if trimmed.is_empty() || trimmed == "/" {
            if self.preferences.is_some() {
                View::Dashboard
            } else {
                View::Preferences
            }
        } else {
            View::from_path(trimmed)
        };
        self.view = view;
        view
    }

    /// `true` while a connect or generate request is outstanding.
    /// UIs disable the triggering control while this holds.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.connect_token.is_some() || self.generation_token.is_some()
    }

    // ── Preferences ─────────────────────────────────────────────────

    #[must_use]
    pub fn preferences(&self) -> Option<&UserPreferences> {
        self.preferences.as_ref()
    }

    /// Validate, persist and replace the current preferences.
    ///
    /// Editing later never resets the calendar, the selection or the board.
    /// On a validation or write failure nothing changes.
    pub fn save_preferences(&mut self, prefs: UserPreferences) -> Result<(), CoreError> {
        let normalized = self.preference_service.validate(&prefs)?;
        self.storage.save_preferences(&normalized)?;
        self.preferences = Some(normalized);

        if self.state == PlannerState::NoPreferences {
            self.state = PlannerState::PreferencesSet;
        }
        self.view = View::Calendar;
        tracing::info!("preferences saved");
        Ok(())
    }

    // ── Calendar ────────────────────────────────────────────────────

    /// Start a connection attempt. Any attempt already in flight is superseded,
    /// and so is a running generation: reconnecting replaces the events it was
    /// issued for.
    pub fn begin_calendar_connect(&mut self) -> Result<ConnectTicket, CoreError> {
        self.require_preferences()?;

        if self.generation_token.take().is_some() {
            tracing::info!("calendar reconnect, abandoning in-flight generation");
        }
        let token = RequestToken::new();
        self.connect_token = Some(token);
        self.connection_error = None;
        self.state = PlannerState::CalendarPending;
        tracing::info!(connector = self.calendar.name(), "connecting calendar");

        Ok(ConnectTicket {
            token,
            connector: Arc::clone(&self.calendar),
        })
    }

    /// Apply a connection result.
    ///
    /// A superseded result is dropped (`Completion::Discarded`). A failure
    /// leaves a dismissible banner and is returned so the caller can offer a retry.
    pub fn complete_calendar_connect(&mut self, outcome: ConnectOutcome) -> Result<Completion, CoreError> {
        if self.connect_token != Some(outcome.token) {
            tracing::warn!("discarding stale calendar connection result");
            return Ok(Completion::Discarded);
        }
        self.connect_token = None;

        match outcome.result {
            Ok(events) => {
                let travel = events.iter().filter(|e| e.is_travel_window()).count();
                tracing::info!(events = events.len(), travel_windows = travel, "calendar events loaded");
                self.calendar_events = events;
                self.calendar_connected = true;
                self.selected_event_id = None;
                self.state = PlannerState::CalendarConnected;
                Ok(Completion::Applied)
            }
            Err(e) => {
                self.calendar_events.clear();
                self.calendar_connected = false;
                self.selected_event_id = None;
                self.connection_error = Some(match &e {
                    CoreError::CalendarConnection(msg) => msg.clone(),
                    other => other.to_string(),
                });
                self.state = PlannerState::CalendarPending;
                Err(e)
            }
        }
    }

    /// Connect the calendar and wait for the result. Retry by calling again.
    pub async fn connect_calendar(&mut self) -> Result<&[CalendarEvent], CoreError> {
        let ticket = self.begin_calendar_connect()?;
        let outcome = ticket.run().await;
        self.complete_calendar_connect(outcome)?;
        Ok(&self.calendar_events)
    }

    #[must_use]
    pub fn is_calendar_connected(&self) -> bool {
        self.calendar_connected
    }

    /// Every event from the last successful connection.
    #[must_use]
    pub fn calendar_events(&self) -> &[CalendarEvent] {
        &self.calendar_events
    }

    /// The events that can be selected for generation.
    #[must_use]
    pub fn travel_windows(&self) -> Vec<&CalendarEvent> {
        models::calendar::travel_windows(&self.calendar_events)
    }

    #[must_use]
    pub fn connection_error(&self) -> Option<&str> {
        self.connection_error.as_deref()
    }

    pub fn dismiss_connection_error(&mut self) {
        self.connection_error = None;
    }

    /// Choose the travel window to generate for.
    ///
    /// Changing the selection while a generation is running abandons that run.
    pub fn select_travel_event(&mut self, event_id: &str) -> Result<&CalendarEvent, CoreError> {
        if !self.calendar_connected {
            return Err(CoreError::InvalidState("Connect your calendar first".into()));
        }
        let event = self
            .calendar_events
            .iter()
            .find(|e| e.id == event_id)
            .ok_or_else(|| CoreError::Validation("Selected event not found.".into()))?;
        if !event.is_travel_window() {
            return Err(CoreError::Validation(format!(
                "'{}' is not a travel event",
                event.title
            )));
        }

        if self.generation_token.take().is_some() {
            tracing::info!("selection changed, abandoning in-flight generation");
        }
        self.selected_event_id = Some(event.id.clone());
        self.generation_error = None;
        self.state = PlannerState::EventSelected;
        Ok(event)
    }

    #[must_use]
    pub fn selected_event(&self) -> Option<&CalendarEvent> {
        let id = self.selected_event_id.as_deref()?;
        self.calendar_events.iter().find(|e| e.id == id)
    }

    // ── Generation ──────────────────────────────────────────────────

    /// Start generating for the selected event. Supersedes any run in flight.
    ///
    /// The returned ticket holds a snapshot of the feedback ledger taken now.
    pub fn begin_generation(&mut self) -> Result<GenerationTicket, CoreError> {
        let preferences = self
            .preferences
            .clone()
            .ok_or_else(|| CoreError::InvalidState("User preferences are missing. Please return to settings.".into()))?;
        let event = self
            .selected_event()
            .cloned()
            .ok_or_else(|| CoreError::Validation("Please select a travel event first.".into()))?;

        let token = RequestToken::new();
        self.generation_token = Some(token);
        self.generation_error = None;
        self.state = PlannerState::Generating;

        Ok(GenerationTicket {
            token,
            preferences,
            event,
            feedback: self.ledger.entries().to_vec(),
            recipient_name: self.recipient_name.clone(),
            suggestions: Arc::clone(&self.suggestions),
            composer: Arc::clone(&self.composer),
        })
    }

    /// Apply a generation result.
    ///
    /// - Superseded results are dropped (`Completion::Discarded`).
    /// - Success replaces the board, stores the email and moves to the dashboard.
    /// - Failure keeps the selection, records a message for the selection
    ///   screen and returns the error.
    pub fn complete_generation(&mut self, outcome: GenerationOutcome) -> Result<Completion, CoreError> {
        if self.generation_token != Some(outcome.token) {
            tracing::warn!("discarding stale generation result");
            return Ok(Completion::Discarded);
        }
        self.generation_token = None;

        match outcome.result {
            Ok(batch) => {
                tracing::info!(
                    suggestions = batch.suggestions.len(),
                    email_ready = batch.email.html().is_some(),
                    "suggestion batch ready"
                );
                self.board.replace(batch.suggestions);
                self.email = batch.email;
                self.state = PlannerState::SuggestionsReady;
                self.view = View::Dashboard;
                Ok(Completion::Applied)
            }
            Err(e) => {
                tracing::warn!(error = %e, "trip generation failed");
                self.generation_error = Some(match &e {
                    CoreError::NoSuitableTrips => NO_SUITABLE_TRIPS_MESSAGE.to_string(),
                    other => other.to_string(),
                });
                self.state = if !self.calendar_connected {
                    PlannerState::CalendarPending
                } else if self.selected_event_id.is_some() {
                    PlannerState::EventSelected
                } else {
                    PlannerState::CalendarConnected
                };
                Err(e)
            }
        }
    }

    /// Generate suggestions (and the email) for the selected event and wait.
    pub async fn generate_suggestions(&mut self) -> Result<&[TripSuggestion], CoreError> {
        let ticket = self.begin_generation()?;
        let outcome = ticket.run().await;
        self.complete_generation(outcome)?;
        Ok(self.board.trips())
    }

    /// Message for the selection screen after a failed generation.
    #[must_use]
    pub fn generation_error(&self) -> Option<&str> {
        self.generation_error.as_deref()
    }

    // ── Dashboard & Feedback ────────────────────────────────────────

    #[must_use]
    pub fn board(&self) -> &TripBoard {
        &self.board
    }

    /// Suggestions still awaiting feedback.
    #[must_use]
    pub fn active_trips(&self) -> &[TripSuggestion] {
        self.board.trips()
    }

    /// Guidance for an empty dashboard, `None` while suggestions remain.
    #[must_use]
    pub fn dashboard_prompt(&self) -> Option<&'static str> {
        self.board.is_empty().then_some(EMPTY_BOARD_PROMPT)
    }

    /// Record feedback: validate, persist the ledger, then drop the trip from the board.
    ///
    /// The trip does not have to be on the board; feedback for an older
    /// batch is recorded all the same. If the write fails nothing changes.
    pub fn submit_feedback(&mut self, feedback: TripFeedback) -> Result<(), CoreError> {
        let trip_id = feedback.trip_id.clone();
        let accepted = feedback.accepted;

        let mut next = self.ledger.clone();
        next.append(feedback)?;
        self.storage.save_feedback(next.entries())?;
        self.ledger = next;

        let removed = self.board.remove(&trip_id).is_some();
        tracing::info!(trip_id = %trip_id, accepted, on_board = removed, "feedback recorded");
        Ok(())
    }

    pub fn accept_trip(&mut self, trip_id: &str, feedback_text: Option<String>) -> Result<(), CoreError> {
        self.submit_feedback(TripFeedback::accept(trip_id, feedback_text))
    }

    /// Decline a trip. `feedback_text` must not be blank.
    pub fn decline_trip(
        &mut self,
        trip_id: &str,
        reason: DeclineReason,
        feedback_text: impl Into<String>,
    ) -> Result<(), CoreError> {
        self.submit_feedback(TripFeedback::decline(trip_id, reason, feedback_text))
    }

    /// Full feedback history in submission order.
    #[must_use]
    pub fn feedback_history(&self) -> &[TripFeedback] {
        self.ledger.entries()
    }

    #[must_use]
    pub fn ledger(&self) -> &FeedbackLedger {
        &self.ledger
    }

    // ── Email ───────────────────────────────────────────────────────

    #[must_use]
    pub fn email_status(&self) -> &EmailStatus {
        &self.email
    }

    /// HTML of the last composed email, verbatim.
    #[must_use]
    pub fn email_html(&self) -> Option<&str> {
        self.email.html()
    }

    // ── Internal ────────────────────────────────────────────────────

    fn require_preferences(&self) -> Result<&UserPreferences, CoreError> {
        self.preferences.as_ref().ok_or_else(|| {
            CoreError::InvalidState("Save your travel preferences first".into())
        })
    }
}
