//! Narration strategies.
//!
//! A [`Narrator`] turns a [`CommentaryInput`] into the six commentary texts.
//! [`RuleNarrator`] is always available. [`LlmNarrator`] asks an
//! OpenAI-compatible chat-completions endpoint to rewrite the rule-based
//! draft and returns the draft unchanged if anything goes wrong.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::commentary::{Commentary, CommentaryInput, rule_commentary};
use crate::domain::{DecileBucket, TrendSeries};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = "You are a credit risk model monitoring analyst. \
Rewrite each field of the draft commentary in clear, concise business English. \
Keep every number and every status word (green, amber, red, stable, improving, declining) unchanged. \
Respond with a JSON object with exactly these string keys: volume_commentary, ks_commentary, \
psi_commentary, bad_rate_commentary, decile_commentary, ks_trigger_insight.";

pub trait Narrator: Send + Sync {
    fn narrate(&self, input: &CommentaryInput<'_>) -> Commentary;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleNarrator;

impl Narrator for RuleNarrator {
    fn narrate(&self, input: &CommentaryInput<'_>) -> Commentary {
        rule_commentary(input)
    }

    fn name(&self) -> &'static str {
        "rules"
    }
}

#[derive(Debug, Error)]
enum NarrationError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("response had no choices")]
    NoChoices,
    #[error("response content is not valid commentary JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("field `{0}` is empty")]
    EmptyField(&'static str),
}

pub struct LlmNarrator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl LlmNarrator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Configure from `OPENAI_API_KEY`, `OPENAI_CHAT_MODEL` and `OPENAI_BASE_URL`
    /// (a `.env` file is honoured). Returns `None` without a key.
    pub fn from_env() -> Option<Self> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
        let model = std::env::var("OPENAI_CHAT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Some(Self::new(api_key, model, base_url))
    }

    fn rewrite(&self, input: &CommentaryInput<'_>, draft: &Commentary) -> Result<Commentary, NarrationError> {
        let context = PromptContext {
            ks: input.ks,
            deciles: input.deciles,
            trend: input.trend,
            draft,
        };
        let request = ChatRequest {
            model: &self.model,
            temperature: 0.2,
            response_format: ResponseFormat { kind: "json_object" },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: serde_json::to_string(&context)?,
                },
            ],
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;
        if !resp.status().is_success() {
            return Err(NarrationError::Status(resp.status()));
        }

        let body: ChatResponse = resp.json()?;
        let content = body
            .choices
            .into_iter()
            .next()
            .ok_or(NarrationError::NoChoices)?
            .message
            .content;
        parse_commentary(&content)
    }
}

impl Narrator for LlmNarrator {
    fn narrate(&self, input: &CommentaryInput<'_>) -> Commentary {
        let draft = rule_commentary(input);
        match self.rewrite(input, &draft) {
            Ok(commentary) => {
                debug!(model = %self.model, "commentary rewritten by chat model");
                commentary
            }
            Err(err) => {
                warn!(error = %err, "chat narration failed, using rule-based commentary");
                draft
            }
        }
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

/// The chat narrator when a key is configured, otherwise the rule narrator.
pub fn narrator_from_env() -> Box<dyn Narrator> {
    match LlmNarrator::from_env() {
        Some(narrator) => Box::new(narrator),
        None => {
            warn!("OPENAI_API_KEY is not set, using rule-based commentary");
            Box::new(RuleNarrator)
        }
    }
}

fn parse_commentary(content: &str) -> Result<Commentary, NarrationError> {
    let commentary: Commentary = serde_json::from_str(content.trim())?;
    if let Some((key, _)) = commentary.fields().into_iter().find(|(_, text)| text.trim().is_empty()) {
        return Err(NarrationError::EmptyField(key));
    }
    Ok(commentary)
}

#[derive(Serialize)]
struct PromptContext<'a> {
    ks: Option<f64>,
    deciles: &'a [DecileBucket],
    trend: Option<&'a TrendSeries>,
    draft: &'a Commentary,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> CommentaryInput<'static> {
        CommentaryInput {
            trend: None,
            ks: Some(0.15),
            deciles: &[],
        }
    }

    #[test]
    fn rule_narrator_matches_rules() {
        assert_eq!(RuleNarrator.narrate(&input()), rule_commentary(&input()));
    }

    #[test]
    fn unreachable_service_falls_back_to_rules() {
        // Port 9 (discard) is not expected to serve HTTP on the test host.
        let narrator = LlmNarrator::new("test-key", DEFAULT_MODEL, "http://127.0.0.1:9/v1");
        assert_eq!(narrator.narrate(&input()), rule_commentary(&input()));
    }

    #[test]
    fn parse_rejects_incomplete_commentary() {
        let missing = r#"{"volume_commentary": "x"}"#;
        assert!(matches!(parse_commentary(missing), Err(NarrationError::Parse(_))));

        let draft = rule_commentary(&input());
        let mut blank = draft.clone();
        blank.ks_commentary = "  ".into();
        let text = serde_json::to_string(&blank).unwrap();
        assert!(matches!(
            parse_commentary(&text),
            Err(NarrationError::EmptyField("ks_commentary"))
        ));

        let ok = serde_json::to_string(&draft).unwrap();
        assert_eq!(parse_commentary(&ok).unwrap(), draft);
    }
}
