pub mod calendar;
pub mod feedback;
pub mod preferences;
pub mod session;
pub mod trip;
