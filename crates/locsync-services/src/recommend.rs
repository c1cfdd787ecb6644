use std::time::Duration;

use color_eyre::eyre::WrapErr;
use locsync_config::RecommendCfg;
use locsync_core::{LocSyncError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Canonical text proposed for one inconsistency group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommendation: String,
    #[serde(default)]
    pub reasoning: String,
}

/// Picks a canonical translation among divergent variants.
pub trait Recommender: Send + Sync {
    fn resolve(&self, source: &str, variations: &[String], target_lang: &str) -> Result<Recommendation>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

const SYSTEM_PROMPT: &str = r#"You are a localization reviewer. The same source string was translated in several different ways across a project.
Pick the single best translation, or write a better one, so it can be applied everywhere.
Answer with a JSON object: {"recommendation": "<text>", "reasoning": "<one or two sentences>"}.
Keep any inline markup tags from the variants unchanged."#;

/// OpenAI-compatible chat-completions client.
pub struct HttpRecommender {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpRecommender {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .wrap_err("failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
        })
    }

    /// Build from the `[recommend]` config table; the key is read from the
    /// environment variable it names.
    pub fn from_config(cfg: Option<&RecommendCfg>) -> Result<Self> {
        let endpoint = cfg
            .and_then(|c| c.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let model = cfg
            .and_then(|c| c.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let key_env = cfg
            .and_then(|c| c.api_key_env.clone())
            .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string());
        let timeout = cfg
            .and_then(|c| c.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let api_key = std::env::var(&key_env).ok().filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!(event = "recommend_no_api_key", env = %key_env);
        }
        Self::new(endpoint, model, api_key, Duration::from_secs(timeout))
    }
}

impl Recommender for HttpRecommender {
    fn resolve(&self, source: &str, variations: &[String], target_lang: &str) -> Result<Recommendation> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: build_prompt(source, variations, target_lang),
                },
            ],
            temperature: 0.2,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let mut req = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        tracing::debug!(event = "recommend_request", endpoint = %self.endpoint, variations = variations.len());
        let response = req.send().wrap_err("failed to send recommendation request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(LocSyncError::Recommend(format!("endpoint returned {status}: {body}")).into());
        }

        let chat: ChatResponse = response.json().wrap_err("failed to parse recommendation response")?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LocSyncError::Recommend("response had no choices".into()))?;
        parse_reply(&content)
    }
}

pub fn build_prompt(source: &str, variations: &[String], target_lang: &str) -> String {
    let list = variations
        .iter()
        .enumerate()
        .map(|(i, v)| format!("{}. {}", i + 1, v))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Target language: {target_lang}\nSource text: {source}\n\nExisting translations:\n{list}")
}

/// Parse the model's reply. Tolerates a fenced code block around the JSON.
pub fn parse_reply(content: &str) -> Result<Recommendation> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    let rec: Recommendation = serde_json::from_str(body)
        .map_err(|e| LocSyncError::Recommend(format!("malformed reply: {e}")))?;
    if rec.recommendation.trim().is_empty() {
        return Err(LocSyncError::Recommend("empty recommendation".into()).into());
    }
    Ok(rec)
}
