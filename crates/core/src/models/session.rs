use uuid::Uuid;

/// Where the user is in the preferences → calendar → suggestions flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlannerState {
    /// First run: nothing saved yet
    NoPreferences,
    PreferencesSet,
    /// Connecting, or the last attempt failed and can be retried
    CalendarPending,
    CalendarConnected,
    EventSelected,
    Generating,
    /// A batch was generated; the board may since have been emptied by feedback
    SuggestionsReady,
}

impl std::fmt::Display for PlannerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlannerState::NoPreferences => write!(f, "NoPreferences"),
            PlannerState::PreferencesSet => write!(f, "PreferencesSet"),
            PlannerState::CalendarPending => write!(f, "CalendarPending"),
            PlannerState::CalendarConnected => write!(f, "CalendarConnected"),
            PlannerState::EventSelected => write!(f, "EventSelected"),
            PlannerState::Generating => write!(f, "Generating"),
            PlannerState::SuggestionsReady => write!(f, "SuggestionsReady"),
        }
    }
}

/// The screens a frontend can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Preferences,
    Calendar,
    Dashboard,
    EmailPreview,
}

impl View {
    /// Resolve a route path. Unknown paths fall back to the preferences view.
    ///
    /// The root path `/` depends on session state and is resolved by
    /// `TripPlanner::navigate`, not here.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let trimmed = path.trim().trim_start_matches('#');
        match trimmed.trim_end_matches('/') {
            "/preferences" => View::Preferences,
            "/calendar" => View::Calendar,
            "/dashboard" => View::Dashboard,
            "/email-preview" => View::EmailPreview,
            _ => View::Preferences,
        }
    }

    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            View::Preferences => "/preferences",
            View::Calendar => "/calendar",
            View::Dashboard => "/dashboard",
            View::EmailPreview => "/email-preview",
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// State of the summary email for the current batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EmailStatus {
    #[default]
    NotGenerated,
    Ready(String),
    /// Suggestions succeeded but the email could not be composed
    Unavailable(String),
}

impl EmailStatus {
    /// The HTML to preview, if any.
    #[must_use]
    pub fn html(&self) -> Option<&str> {
        match self {
            EmailStatus::Ready(html) => Some(html),
            _ => None,
        }
    }
}

/// Identifies one issued request for a logical slot (connect, generate).
/// A result is applied only if its token is still the slot's current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(Uuid);

impl RequestToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestToken {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened to an async result handed back to the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// A newer request superseded this one; the result was dropped
    Discarded,
}
