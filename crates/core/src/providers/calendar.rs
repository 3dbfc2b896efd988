use async_trait::async_trait;
use std::time::Duration;

use crate::config::CalendarConfig;
use crate::errors::CoreError;
use crate::models::calendar::CalendarEvent;
use super::traits::CalendarConnector;

/// User-facing text for a failed connection attempt.
pub const CONNECTION_FAILED_MESSAGE: &str =
    "We couldn't access your calendar. Please check your permissions and try again.";

/// Stand-in for a real OAuth calendar integration.
///
/// Waits `latency`, then fails with probability `failure_rate`; otherwise
/// returns the same three events every time. Both knobs are parameters of
/// the mock, not business rules.
#[derive(Debug, Clone)]
pub struct MockCalendarConnector {
    failure_rate: f64,
    latency: Duration,
    events: Vec<CalendarEvent>,
}

impl MockCalendarConnector {
    pub fn new(failure_rate: f64, latency: Duration) -> Self {
        Self {
            failure_rate: failure_rate.clamp(0.0, 1.0),
            latency,
            events: Self::default_events(),
        }
    }

    pub fn from_config(config: &CalendarConfig) -> Self {
        Self::new(config.failure_rate, config.latency())
    }

    /// A connector that never fails and answers immediately.
    pub fn reliable() -> Self {
        Self::new(0.0, Duration::ZERO)
    }

    /// Replace the fixed event list.
    pub fn with_events(mut self, events: Vec<CalendarEvent>) -> Self {
        self.events = events;
        self
    }

    #[must_use]
    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }

    /// The events every successful connection returns.
    pub fn default_events() -> Vec<CalendarEvent> {
        vec![
            CalendarEvent::new("1", "Weekly Team Sync", "2026-11-10", "2026-11-10"),
            CalendarEvent::new("2", "Travel to Europe", "2026-02-01", "2026-02-08"),
            CalendarEvent::new("3", "Dentist Appointment", "2026-11-15", "2026-11-15"),
        ]
    }

    /// Roll the dice for this attempt.
    fn should_fail(&self) -> Result<bool, CoreError> {
        if self.failure_rate <= 0.0 {
            return Ok(false);
        }
        if self.failure_rate >= 1.0 {
            return Ok(true);
        }
        let mut buf = [0u8; 4];
        getrandom::getrandom(&mut buf)
            .map_err(|e| CoreError::CalendarConnection(format!("Failed to draw random sample: {e}")))?;
        let sample = f64::from(u32::from_le_bytes(buf)) / f64::from(u32::MAX);
        Ok(sample < self.failure_rate)
    }
}

impl Default for MockCalendarConnector {
    fn default() -> Self {
        Self::from_config(&CalendarConfig::default())
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl CalendarConnector for MockCalendarConnector {
    fn name(&self) -> &str {
        "MockCalendar"
    }

    async fn connect(&self) -> Result<Vec<CalendarEvent>, CoreError> {
        // Simulated network latency. WASM hosts drive their own timers.
        #[cfg(not(target_arch = "wasm32"))]
        {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
        }

        if self.should_fail()? {
            tracing::warn!(connector = self.name(), "simulated calendar connection failure");
            return Err(CoreError::CalendarConnection(CONNECTION_FAILED_MESSAGE.into()));
        }

        tracing::info!(connector = self.name(), events = self.events.len(), "calendar connected");
        Ok(self.events.clone())
    }
}
