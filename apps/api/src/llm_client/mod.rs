/// LLM Client — the single point of entry for all Claude API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// All LLM interactions MUST go through this module.
///
/// One `call` is one HTTP attempt. Retrying throttled calls is the caller's policy
/// (see `generation::retry`), so attempts never multiply across layers.
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;
/// Upper bound on a single provider call.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Message fragments that mark a provider-side throttling or quota failure.
const RATE_LIMIT_VOCABULARY: &[&str] = &[
    "rate limit",
    "rate_limit",
    "ratelimit",
    "too many requests",
    "quota",
    "resource exhausted",
    "resource_exhausted",
    "overloaded",
];

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// True when the provider is throttling us rather than rejecting the request.
    ///
    /// Matches a 429 status, or rate-limit/quota vocabulary anywhere in the message.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            LlmError::Api { status: 429, .. } => true,
            LlmError::Http(e) if e.status().map(|s| s.as_u16()) == Some(429) => true,
            other => mentions_rate_limit(&other.to_string()),
        }
    }
}

fn mentions_rate_limit(message: &str) -> bool {
    let lowered = message.to_lowercase();
    RATE_LIMIT_VOCABULARY
        .iter()
        .any(|needle| lowered.contains(needle))
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// The single LLM client used by the service.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(api_key: String, model: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(HTTP_TIMEOUT).build()?,
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Makes a single call to the Claude API and returns the full response object.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to parse error message
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("LLM API returned {}: {}", status, message);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let llm_response: LlmResponse = response.json().await?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        Ok(llm_response)
    }

    /// Calls the LLM and returns its text with any surrounding code fence removed.
    pub async fn call_text(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let response = self.call(prompt, system).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        Ok(strip_code_fences(text).to_string())
    }
}

/// Strips ```lang ... ``` or ``` ... ``` fences the model sometimes wraps output in.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("markdown", "md", ...) on the opening fence line.
    let body = match rest.find('\n') {
        Some(newline) if !rest[..newline].contains(' ') => &rest[newline + 1..],
        _ => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .map(|s| s.trim())
        .unwrap_or(body.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences_with_language_tag() {
        let input = "```markdown\n# Jane Doe\n- Built things\n```";
        assert_eq!(strip_code_fences(input), "# Jane Doe\n- Built things");
    }

    #[test]
    fn test_strip_fences_without_tag() {
        let input = "```\n# Jane Doe\n```";
        assert_eq!(strip_code_fences(input), "# Jane Doe");
    }

    #[test]
    fn test_strip_fences_no_fences() {
        assert_eq!(strip_code_fences("  # Jane Doe\n"), "# Jane Doe");
    }

    #[test]
    fn test_strip_fences_unterminated() {
        assert_eq!(strip_code_fences("```md\n# Jane"), "# Jane");
    }

    #[test]
    fn test_status_429_is_rate_limited() {
        let err = LlmError::Api {
            status: 429,
            message: "slow down".into(),
        };
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_quota_vocabulary_is_rate_limited_case_insensitive() {
        for message in [
            "RESOURCE_EXHAUSTED: Quota exceeded for model",
            "Rate Limit reached for requests",
            "Overloaded",
            "Too Many Requests",
        ] {
            let err = LlmError::Api {
                status: 400,
                message: message.into(),
            };
            assert!(err.is_rate_limited(), "{message} should classify");
        }
    }

    #[test]
    fn test_other_errors_not_rate_limited() {
        let auth = LlmError::Api {
            status: 401,
            message: "invalid x-api-key".into(),
        };
        assert!(!auth.is_rate_limited());
        assert!(!LlmError::EmptyContent.is_rate_limited());
    }

    #[test]
    fn test_response_text_picks_first_text_block() {
        let response: LlmResponse = serde_json::from_value(serde_json::json!({
            "content": [
                {"type": "tool_use"},
                {"type": "text", "text": "# Jane"}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 3}
        }))
        .unwrap();
        assert_eq!(response.text(), Some("# Jane"));
    }
}
