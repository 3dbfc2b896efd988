use serde::{Deserialize, Serialize};

/// Outbound flight for a suggested trip. All fields are required on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightDetails {
    pub airline: String,
    pub flight_number: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub price: f64,
}

impl FlightDetails {
    /// Route in `ORIGIN -> DESTINATION` form.
    #[must_use]
    pub fn route(&self) -> String {
        format!("{} -> {}", self.departure_airport, self.arrival_airport)
    }
}

/// Hotel for a suggested trip. Only `name` and `price_per_night` are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelDetails {
    pub name: String,

    /// Star rating, 0 to 5
    #[serde(default)]
    pub rating: f64,

    #[serde(default)]
    pub address: String,

    pub price_per_night: f64,
}

/// One flight + hotel combination produced by the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSuggestion {
    /// Unique within a generation batch
    pub id: String,
    pub destination: String,

    /// Date range, e.g. "2026-02-01 to 2026-02-08"
    #[serde(default)]
    pub dates: String,

    pub total_price: f64,
    pub currency: String,
    pub summary: String,
    pub highlights: Vec<String>,
    pub flight: FlightDetails,
    pub hotel: HotelDetails,
}

/// Top-level shape of a structured generation reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionEnvelope {
    pub suggestions: Vec<TripSuggestion>,
}

/// The suggestion batch currently shown on the dashboard.
///
/// Entries leave the board exactly once, when feedback is recorded for them.
#[derive(Debug, Clone, Default)]
pub struct TripBoard {
    trips: Vec<TripSuggestion>,
}

impl TripBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a freshly generated batch, dropping whatever was shown before.
    pub fn replace(&mut self, suggestions: Vec<TripSuggestion>) {
        self.trips = suggestions;
    }

    /// Remove the entry with `trip_id`. Absent ids are a no-op.
    pub fn remove(&mut self, trip_id: &str) -> Option<TripSuggestion> {
        let idx = self.trips.iter().position(|t| t.id == trip_id)?;
        Some(self.trips.remove(idx))
    }

    #[must_use]
    pub fn get(&self, trip_id: &str) -> Option<&TripSuggestion> {
        self.trips.iter().find(|t| t.id == trip_id)
    }

    #[must_use]
    pub fn trips(&self) -> &[TripSuggestion] {
        &self.trips
    }

    pub fn iter(&self) -> impl Iterator<Item = &TripSuggestion> {
        self.trips.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trips.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}
