use crate::refine::{CompletionProvider, CompletionRequest, ProviderError};
use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

const API_VERSION: &str = "2023-06-01";

// ===================================================================
// Wire types (Messages API)
// ===================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    message: String,
}

// ===================================================================
// Provider
// ===================================================================

/// Blocking client for the Anthropic Messages API.
pub struct AnthropicProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl AnthropicProvider {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Unreachable(format!("building HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/v1/messages", base_url.trim_end_matches('/')),
            api_key,
        })
    }

    /// Configure from `settings`, `ANTHROPIC_API_KEY` and `ANTHROPIC_BASE_URL`.
    ///
    /// A missing key is not an error here; it surfaces on the first
    /// [`complete`](CompletionProvider::complete) call, like any other
    /// provider failure.
    pub fn from_env(settings: &Settings) -> Result<Self, ProviderError> {
        let api_key = env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty());
        let base_url = env::var("ANTHROPIC_BASE_URL")
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| settings.api_base_url.clone());
        Self::new(&base_url, api_key, settings.api_timeout())
    }
}

impl CompletionProvider for AnthropicProvider {
    fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)?;

        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            system: &request.system,
            messages: [Message {
                role: "user",
                content: &request.user,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| ProviderError::Unreachable(format!("reading response: {e}")))?;

        if !status.is_success() {
            return Err(api_error(Some(status.as_u16()), &text));
        }
        parse_reply(&text)
    }
}

fn describe(error: ErrorDetail) -> String {
    match error.kind {
        Some(kind) => format!("{kind}: {}", error.message),
        None => error.message,
    }
}

/// Pull the error message out of an error body, falling back to the raw
/// body when it isn't the documented shape.
fn api_error(status: Option<u16>, body: &str) -> ProviderError {
    let message = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(resp) => describe(resp.error),
        Err(_) => body.trim().to_string(),
    };
    ProviderError::Api { status, message }
}

/// Concatenate the text blocks of a successful reply.
fn parse_reply(body: &str) -> Result<String, ProviderError> {
    if let Ok(resp) = serde_json::from_str::<ErrorResponse>(body) {
        return Err(ProviderError::Api {
            status: None,
            message: describe(resp.error),
        });
    }
    let reply: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
    let texts: Vec<String> = reply
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .collect();
    if texts.is_empty() {
        return Err(ProviderError::MalformedResponse("no text content".into()));
    }
    Ok(texts.concat())
}
