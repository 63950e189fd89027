//! Insight synthesis through a local Ollama model.

use super::InsightSynthesizer;
use crate::error::{ReviewError, ReviewResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for the Ollama synthesizer.
#[derive(Debug, Clone)]
pub struct SynthesizerConfig {
    pub ollama_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model_name: "llama3.2:latest".to_string(),
            temperature: 0.3,
            timeout_seconds: 120,
        }
    }
}

/// Message in the chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// Sends the analysis prompt to Ollama's `/api/chat` endpoint.
pub struct OllamaSynthesizer {
    config: SynthesizerConfig,
    http_client: reqwest::Client,
}

impl OllamaSynthesizer {
    pub fn new(config: SynthesizerConfig) -> ReviewResult<Self> {
        info!(
            "Initializing insight synthesizer with model {} at {}",
            config.model_name, config.ollama_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ReviewError::Synthesis(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn request_for(&self, prompt: &str) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.config.model_name.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: ANALYST_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        }
    }
}

#[async_trait]
impl InsightSynthesizer for OllamaSynthesizer {
    async fn synthesize(&self, prompt: &str) -> ReviewResult<String> {
        let url = format!("{}/api/chat", self.config.ollama_url.trim_end_matches('/'));
        debug!("Sending {} byte prompt to {}", prompt.len(), url);

        let response = self
            .http_client
            .post(&url)
            .json(&self.request_for(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReviewError::Synthesis(format!(
                        "request timed out after {}s",
                        self.config.timeout_seconds
                    ))
                } else if e.is_connect() {
                    ReviewError::Synthesis(format!(
                        "cannot connect to Ollama at {}",
                        self.config.ollama_url
                    ))
                } else {
                    ReviewError::Synthesis(format!("failed to send request: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ReviewError::Synthesis(format!(
                "Ollama API error {}: {}",
                status, body
            )));
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| {
                ReviewError::Synthesis(format!("failed to parse Ollama response: {}", e))
            })?;

        let text = chat_response.message.content.trim().to_string();
        if text.is_empty() {
            return Err(ReviewError::Synthesis("model returned no text".to_string()));
        }

        Ok(text)
    }

    fn model_name(&self) -> String {
        self.config.model_name.clone()
    }
}

/// System prompt describing the analyst persona.
const ANALYST_SYSTEM_PROMPT: &str = r#"You are a photography business intelligence analyst helping a professional photographer understand their business metrics.

- Maintain a friendly but professional tone.
- Format currency as USD ($) and dates clearly (e.g. "January 2024" or "Q1 2024").
- Only use the numbers provided; never invent figures.
- Highlight interesting trends, and politely mention data that looks incomplete or unusual.
- Do not give business advice beyond what the data shows.
- Refer to clients by first name only, if at all."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesizer_config_default() {
        let config = SynthesizerConfig::default();
        assert_eq!(config.model_name, "llama3.2:latest");
        assert_eq!(config.ollama_url, "http://localhost:11434");
    }

    #[test]
    fn test_request_shape() {
        let synthesizer = OllamaSynthesizer::new(SynthesizerConfig::default()).unwrap();
        let request = synthesizer.request_for("numbers");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "llama3.2:latest");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "numbers");
        assert_eq!(synthesizer.model_name(), "llama3.2:latest");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_synthesis_error() {
        let synthesizer = OllamaSynthesizer::new(SynthesizerConfig {
            ollama_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 2,
            ..SynthesizerConfig::default()
        })
        .unwrap();

        let err = synthesizer.synthesize("numbers").await.unwrap_err();
        assert!(matches!(err, ReviewError::Synthesis(_)));
    }
}
