pub mod email_service;
pub mod preference_service;
pub mod suggestion_service;
