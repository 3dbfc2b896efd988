use serde::{Deserialize, Serialize};

/// Title prefix that marks an event as a travel window.
const TRAVEL_PREFIX: &str = "travel";

/// A single entry returned by the calendar connector.
///
/// Dates are kept as the strings the calendar supplied; they are only ever
/// echoed back into the generation prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Unique within one connection session
    pub id: String,
    pub title: String,
    pub start: String,
    pub end: String,
}

impl CalendarEvent {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start: start.into(),
            end: end.into(),
        }
    }

    /// `true` if the title starts with "travel", ignoring case.
    /// Only these events can be selected for trip generation.
    #[must_use]
    pub fn is_travel_window(&self) -> bool {
        self.title.to_lowercase().starts_with(TRAVEL_PREFIX)
    }

    /// `true` if both ends of the date range are present.
    #[must_use]
    pub fn has_date_range(&self) -> bool {
        !self.start.trim().is_empty() && !self.end.trim().is_empty()
    }
}

/// Filter a connection result down to the selectable travel windows,
/// preserving calendar order.
#[must_use]
pub fn travel_windows(events: &[CalendarEvent]) -> Vec<&CalendarEvent> {
    events.iter().filter(|e| e.is_travel_window()).collect()
}
