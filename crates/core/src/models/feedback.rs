use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Why a suggestion was declined. Mirrors the options of the decline dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclineReason {
    /// Too expensive
    Price,
    /// Dates don't work
    Dates,
    /// Doesn't like the destination
    Destination,
    /// Activities not interesting
    Activity,
    Other,
}

impl std::fmt::Display for DeclineReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeclineReason::Price => write!(f, "Price"),
            DeclineReason::Dates => write!(f, "Dates"),
            DeclineReason::Destination => write!(f, "Destination"),
            DeclineReason::Activity => write!(f, "Activity"),
            DeclineReason::Other => write!(f, "Other"),
        }
    }
}

/// A user's verdict on one suggestion.
///
/// `trip_id` is a weak reference: the suggestion may already be gone from the
/// board (or belong to an older batch) by the time this is read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripFeedback {
    pub trip_id: String,
    pub accepted: bool,

    /// Epoch milliseconds
    pub timestamp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<DeclineReason>,
}

impl TripFeedback {
    /// Accept a trip, optionally with a note ("room with a view please").
    pub fn accept(trip_id: impl Into<String>, feedback_text: Option<String>) -> Self {
        Self {
            trip_id: trip_id.into(),
            accepted: true,
            timestamp: chrono::Utc::now().timestamp_millis(),
            feedback_text,
            reason: None,
        }
    }

    /// Decline a trip. `feedback_text` is mandatory; see [`TripFeedback::validate`].
    pub fn decline(
        trip_id: impl Into<String>,
        reason: DeclineReason,
        feedback_text: impl Into<String>,
    ) -> Self {
        Self {
            trip_id: trip_id.into(),
            accepted: false,
            timestamp: chrono::Utc::now().timestamp_millis(),
            feedback_text: Some(feedback_text.into()),
            reason: Some(reason),
        }
    }

    /// Check the accept/decline field rules.
    ///
    /// - Declining requires non-blank feedback text.
    /// - A reason is only allowed on a decline.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.trip_id.trim().is_empty() {
            return Err(CoreError::Validation("Feedback must reference a trip".into()));
        }
        if self.accepted {
            if self.reason.is_some() {
                return Err(CoreError::Validation(
                    "A decline reason cannot be attached to an accepted trip".into(),
                ));
            }
        } else {
            let text = self.feedback_text.as_deref().unwrap_or("");
            if text.trim().is_empty() {
                return Err(CoreError::Validation(
                    "Please provide some feedback so we can improve next time.".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Append-only history of every accept/decline the user has made.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackLedger {
    entries: Vec<TripFeedback>,
}

impl FeedbackLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted entries, in stored order.
    pub fn from_entries(entries: Vec<TripFeedback>) -> Self {
        Self { entries }
    }

    /// Validate and append. Earlier entries are never touched.
    pub fn append(&mut self, feedback: TripFeedback) -> Result<(), CoreError> {
        feedback.validate()?;
        self.entries.push(feedback);
        Ok(())
    }

    /// All entries in submission order.
    #[must_use]
    pub fn entries(&self) -> &[TripFeedback] {
        &self.entries
    }

    pub fn accepted(&self) -> impl Iterator<Item = &TripFeedback> {
        self.entries.iter().filter(|f| f.accepted)
    }

    pub fn declined(&self) -> impl Iterator<Item = &TripFeedback> {
        self.entries.iter().filter(|f| !f.accepted)
    }

    /// Every entry recorded for `trip_id`, oldest first.
    pub fn for_trip<'a>(&'a self, trip_id: &'a str) -> impl Iterator<Item = &'a TripFeedback> {
        self.entries.iter().filter(move |f| f.trip_id == trip_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
