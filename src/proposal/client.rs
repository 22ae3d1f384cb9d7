//! Anthropic Messages API client for proposal drafting.
//!
//! One best-effort call per proposal. The model is instructed to reply with
//! bare JSON; replies wrapped in markdown code fences are tolerated.

use serde::Deserialize;
use serde_json::json;

use super::prompt::{build_prompt, ProposalContent, ProposalInputs};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, thiserror::Error)]
pub enum ProposalError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed model output: {0}")]
    Malformed(String),
}

/// Thin client over the Messages API. Cheap to clone; shares the app's
/// pooled HTTP client.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

impl AnthropicClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>, model: String) -> Self {
        AnthropicClient {
            http,
            api_key,
            model,
        }
    }

    /// Draft proposal content for the given quote facts.
    pub async fn generate(&self, inputs: &ProposalInputs) -> Result<ProposalContent, ProposalError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(ProposalError::MissingApiKey)?;

        let prompt = build_prompt(inputs);

        let response = self
            .http
            .post(MESSAGES_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&json!({
                "model": self.model,
                "max_tokens": MAX_TOKENS,
                "messages": [{ "role": "user", "content": prompt }],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProposalError::Api { status, body });
        }

        let data: MessagesResponse = response.json().await?;
        let text: String = data.content.iter().map(|block| block.text.as_str()).collect();

        parse_content(&text)
    }
}

/// Strip optional markdown code fences around the model's JSON reply.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed);
    trimmed.trim()
}

/// Parse the model reply into proposal sections. All three sections must be
/// present and non-empty; anything else is malformed and the caller falls
/// back to templated content.
pub(crate) fn parse_content(raw: &str) -> Result<ProposalContent, ProposalError> {
    let content: ProposalContent = serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| ProposalError::Malformed(e.to_string()))?;

    if content.introduction.trim().is_empty()
        || content.service_description.trim().is_empty()
        || content.value_proposition.trim().is_empty()
    {
        return Err(ProposalError::Malformed("empty proposal section".into()));
    }

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = r#"{
        "introduction": "Dear John,",
        "serviceDescription": "We will clean three times per week.",
        "valueProposition": "Choose us."
    }"#;

    #[test]
    fn parses_bare_json() {
        let content = parse_content(REPLY).unwrap();
        assert_eq!(content.introduction, "Dear John,");
        assert_eq!(content.service_description, "We will clean three times per week.");
    }

    #[test]
    fn parses_fenced_json() {
        let fenced = format!("```json\n{REPLY}\n```");
        assert!(parse_content(&fenced).is_ok());

        let plain_fence = format!("```\n{REPLY}\n```");
        assert!(parse_content(&plain_fence).is_ok());
    }

    #[test]
    fn rejects_non_json_reply() {
        let err = parse_content("Here is your proposal!").unwrap_err();
        assert!(matches!(err, ProposalError::Malformed(_)));
    }

    #[test]
    fn rejects_missing_or_empty_sections() {
        let missing = r#"{"introduction": "Hi", "serviceDescription": "x"}"#;
        assert!(matches!(
            parse_content(missing),
            Err(ProposalError::Malformed(_))
        ));

        let empty = r#"{"introduction": "", "serviceDescription": "x", "valueProposition": "y"}"#;
        assert!(matches!(
            parse_content(empty),
            Err(ProposalError::Malformed(_))
        ));
    }
}
