pub mod traits;

// External collaborators
pub mod calendar;
pub mod gemini;
