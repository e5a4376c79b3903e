use crate::ai::prompt::PromptPayload;
use crate::error::GenerationError;
use async_trait::async_trait;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct AIConfig {
    pub provider: AIProvider,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AIProvider {
    Gemini,
    Anthropic,
    #[value(name = "openai")]
    OpenAI,
}

impl AIProvider {
    pub fn name(self) -> &'static str {
        match self {
            AIProvider::Gemini => "Gemini",
            AIProvider::Anthropic => "Anthropic",
            AIProvider::OpenAI => "OpenAI",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            AIProvider::Gemini => "gemini-2.0-flash",
            AIProvider::Anthropic => "claude-sonnet-4-6",
            AIProvider::OpenAI => "gpt-4o-mini",
        }
    }

    /// Conventional environment variable holding this provider's key.
    pub fn api_key_env(self) -> &'static str {
        match self {
            AIProvider::Gemini => "GOOGLE_API_KEY",
            AIProvider::Anthropic => "ANTHROPIC_API_KEY",
            AIProvider::OpenAI => "OPENAI_API_KEY",
        }
    }
}

/// Anything that can turn a prompt payload into response text.
#[async_trait]
pub trait SqlGenerator: Send + Sync {
    async fn generate(&self, payload: &PromptPayload) -> Result<String, GenerationError>;
}

pub struct AIService {
    config: AIConfig,
    http_client: reqwest::Client,
}

impl AIService {
    pub fn new(config: AIConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn call_gemini(&self, payload: &PromptPayload) -> Result<String, GenerationError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.config.model
        );
        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {"text": payload.instructions},
                    {"text": payload.question}
                ]
            }]
        });

        let resp = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let json = read_json(AIProvider::Gemini, resp).await?;
        parse_gemini(&json)
    }

    async fn call_anthropic(&self, payload: &PromptPayload) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": 1024,
            "system": payload.instructions,
            "messages": [
                {"role": "user", "content": payload.question}
            ]
        });

        let resp = self
            .http_client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let json = read_json(AIProvider::Anthropic, resp).await?;
        parse_anthropic(&json)
    }

    async fn call_openai(&self, payload: &PromptPayload) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": 1024,
            "messages": [
                {"role": "system", "content": payload.instructions},
                {"role": "user", "content": payload.question}
            ]
        });

        let resp = self
            .http_client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let json = read_json(AIProvider::OpenAI, resp).await?;
        parse_openai(&json)
    }
}

#[async_trait]
impl SqlGenerator for AIService {
    /// One call, no retry. The returned text is trimmed of surrounding
    /// whitespace and otherwise untouched.
    async fn generate(&self, payload: &PromptPayload) -> Result<String, GenerationError> {
        debug!(provider = self.config.provider.name(), model = %self.config.model, "requesting SQL");
        let text = match self.config.provider {
            AIProvider::Gemini => self.call_gemini(payload).await?,
            AIProvider::Anthropic => self.call_anthropic(payload).await?,
            AIProvider::OpenAI => self.call_openai(payload).await?,
        };
        Ok(text.trim().to_string())
    }
}

async fn read_json(
    provider: AIProvider,
    resp: reqwest::Response,
) -> Result<serde_json::Value, GenerationError> {
    let status = resp.status();
    let text = resp.text().await?;

    if !status.is_success() {
        return Err(GenerationError::Api {
            provider: provider.name(),
            status,
            body: text,
        });
    }

    serde_json::from_str(&text).map_err(|e| GenerationError::Parse(e.to_string()))
}

/// Gemini splits long answers across parts; they are joined back together.
fn parse_gemini(json: &serde_json::Value) -> Result<String, GenerationError> {
    let parts = json
        .pointer("/candidates/0/content/parts")
        .and_then(|v| v.as_array())
        .ok_or_else(|| GenerationError::Parse("Missing candidates[0].content.parts".into()))?;
    let text: String = parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect();
    if text.is_empty() {
        return Err(GenerationError::Parse("Gemini response has no text".into()));
    }
    Ok(text)
}

fn parse_anthropic(json: &serde_json::Value) -> Result<String, GenerationError> {
    json["content"][0]["text"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| GenerationError::Parse("Missing content[0].text".into()))
}

fn parse_openai(json: &serde_json::Value) -> Result<String, GenerationError> {
    json["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| GenerationError::Parse("Missing choices[0].message.content".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gemini_joins_parts() {
        let raw = serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "SELECT COUNT(*) "}, {"text": "FROM customers;"}]}
            }]
        });
        assert_eq!(parse_gemini(&raw).unwrap(), "SELECT COUNT(*) FROM customers;");
    }

    #[test]
    fn test_parse_gemini_blocked_response() {
        let raw = serde_json::json!({"promptFeedback": {"blockReason": "SAFETY"}});
        assert!(matches!(parse_gemini(&raw), Err(GenerationError::Parse(_))));
    }

    #[test]
    fn test_parse_anthropic() {
        let raw = serde_json::json!({"content": [{"type": "text", "text": "SELECT 1"}]});
        assert_eq!(parse_anthropic(&raw).unwrap(), "SELECT 1");
    }

    #[test]
    fn test_parse_openai() {
        let raw = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "SELECT 2"}}]
        });
        assert_eq!(parse_openai(&raw).unwrap(), "SELECT 2");
        assert!(parse_openai(&serde_json::json!({})).is_err());
    }

    #[test]
    fn test_provider_defaults() {
        assert_eq!(AIProvider::Gemini.default_model(), "gemini-2.0-flash");
        assert_eq!(AIProvider::Gemini.api_key_env(), "GOOGLE_API_KEY");
        assert_eq!(AIProvider::OpenAI.name(), "OpenAI");
    }
}
