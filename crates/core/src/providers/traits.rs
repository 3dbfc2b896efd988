use async_trait::async_trait;
use serde_json::Value;

use crate::errors::CoreError;
use crate::models::calendar::CalendarEvent;

/// How the generation service should shape its reply.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputFormat {
    /// JSON constrained by a response schema
    Json { schema: Value },
    /// Free-form text, returned as is
    PlainText,
}

/// A single prompt sent to the generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_instruction: Option<String>,
    pub format: OutputFormat,
}

impl GenerationRequest {
    pub fn json(prompt: impl Into<String>, schema: Value) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: None,
            format: OutputFormat::Json { schema },
        }
    }

    pub fn plain_text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_instruction: None,
            format: OutputFormat::PlainText,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

/// Trait abstraction for the external text/JSON completion service.
///
/// The suggestion generator and the email composer only ever talk to this
/// trait, so a different vendor (or a scripted mock) slots in without
/// touching the services.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait TextGenerator: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Send one request and return the raw reply text.
    ///
    /// An empty string means the service answered with no content; callers
    /// decide what that means for them.
    async fn generate(&self, request: GenerationRequest) -> Result<String, CoreError>;
}

/// Source of calendar events.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait CalendarConnector: Send + Sync {
    fn name(&self) -> &str;

    /// Connect and fetch events. Fails with `CoreError::CalendarConnection`;
    /// callers may retry as often as they like.
    async fn connect(&self) -> Result<Vec<CalendarEvent>, CoreError>;
}
