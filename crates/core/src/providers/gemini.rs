use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{AppConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::errors::CoreError;
use super::traits::{GenerationRequest, OutputFormat, TextGenerator};

const PROVIDER: &str = "Gemini";

/// Google Generative Language API provider (`models/{model}:generateContent`).
///
/// - **Auth**: API key in the `x-goog-api-key` header.
/// - **Structured output**: `responseMimeType: application/json` plus a
///   `responseSchema`.
/// - **Free-form output**: `responseMimeType: text/plain`.
///
/// No request timeout is set; a hung call only blocks the screen that issued it.
pub struct GeminiProvider {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(Some(api_key.into()), DEFAULT_MODEL, DEFAULT_BASE_URL)
    }

    /// Build from process configuration. A missing key is not an error here:
    /// it surfaces as `CoreError::Configuration` on the first request.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_endpoint(
            config.api_key().ok().map(str::to_string),
            &config.gemini.model,
            &config.gemini.base_url,
        )
    }

    pub fn with_endpoint(api_key: Option<String>, model: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The JSON body that `generate` posts for `request`.
    pub fn request_body(&self, request: &GenerationRequest) -> Result<Value, CoreError> {
        serde_json::to_value(build_body(request))
            .map_err(|e| CoreError::Serialization(format!("Failed to encode request: {e}")))
    }

    /// Pull the reply text out of a raw `generateContent` response body.
    pub fn parse_reply(&self, body: &str) -> Result<String, CoreError> {
        let parsed: GenerateContentResponse =
            serde_json::from_str(body).map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to parse generateContent response: {e}"),
            })?;
        Ok(extract_text(parsed))
    }

    fn api_key(&self) -> Result<&str, CoreError> {
        self.api_key.as_deref().ok_or_else(|| {
            CoreError::Configuration("Generation service API key is not configured".into())
        })
    }
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ── generateContent wire types ──────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}

/// Reason Gemini attaches to a 400 when the key itself is rejected.
const API_KEY_INVALID: &str = "API_KEY_INVALID";

/// Map a non-2xx reply to an error. A rejected credential is a configuration
/// problem, not a service failure.
fn error_for_status(status: u16, body: &str) -> CoreError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let key_rejected = matches!(status, 401 | 403)
        || parsed.as_ref().is_some_and(|e| {
            e.error
                .details
                .iter()
                .any(|d| d.reason.as_deref() == Some(API_KEY_INVALID))
        });
    let message = parsed.map(|e| e.error.message).unwrap_or_else(|| body.to_string());

    if key_rejected {
        return CoreError::Configuration(format!(
            "The generation service rejected the API key (HTTP {status}): {message}"
        ));
    }
    CoreError::Api {
        provider: PROVIDER.into(),
        message: format!("HTTP {status}: {message}"),
    }
}

fn build_body(request: &GenerationRequest) -> GenerateContentBody<'_> {
    let (mime, schema) = match &request.format {
        OutputFormat::Json { schema } => ("application/json", Some(schema)),
        OutputFormat::PlainText => ("text/plain", None),
    };
    GenerateContentBody {
        contents: vec![Content {
            role: Some("user"),
            parts: vec![Part { text: &request.prompt }],
        }],
        system_instruction: request.system_instruction.as_deref().map(|text| Content {
            role: None,
            parts: vec![Part { text }],
        }),
        generation_config: GenerationConfig {
            response_mime_type: mime,
            response_schema: schema,
        },
    }
}

/// Concatenate the text parts of the first candidate. No candidate means an
/// empty reply, not an error.
fn extract_text(resp: GenerateContentResponse) -> String {
    resp.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default()
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl TextGenerator for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, CoreError> {
        let api_key = self.api_key()?;
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = build_body(&request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let err = error_for_status(status.as_u16(), &error_text);
            tracing::warn!(status = status.as_u16(), error = %err, "generateContent request failed");
            return Err(err);
        }

        let text = response.text().await?;
        let reply = self.parse_reply(&text)?;
        tracing::debug!(model = %self.model, chars = reply.len(), "generateContent reply received");
        Ok(reply)
    }
}
