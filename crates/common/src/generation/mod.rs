//! Generation provider abstraction
//!
//! Chat-style text generation behind a uniform trait:
//! - Ollama (`/api/chat`)
//! - Canned mock for offline use and tests
//!
//! Usage counters from the provider are pass-through: fields the provider
//! did not report stay `None` instead of being defaulted to zero.

use crate::config::ProviderConfig;
use crate::errors::{RagError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Usage statistics reported by the generation provider
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UsageStats {
    /// Tokens consumed by the prompt
    pub prompt_tokens: Option<u64>,

    /// Tokens produced in the response
    pub completion_tokens: Option<u64>,

    /// Wall-clock time spent generating
    pub generation_time: Option<Duration>,
}

impl UsageStats {
    /// Generation throughput, when the provider reported enough to compute it
    pub fn tokens_per_second(&self) -> Option<f64> {
        let tokens = self.completion_tokens? as f64;
        let seconds = self.generation_time?.as_secs_f64();
        if seconds > 0.0 {
            Some(tokens / seconds)
        } else {
            None
        }
    }
}

/// Response from a generation provider
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub content: String,
    pub usage: UsageStats,
}

/// Trait for answer generation
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for the given messages
    async fn generate(&self, messages: &[ChatMessage]) -> Result<GenerationResponse>;

    /// Get the model name
    fn model(&self) -> &str;
}

/// Ollama chat client
pub struct OllamaGenerator {
    client: reqwest::Client,
    host: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
    prompt_eval_count: Option<u64>,
    eval_count: Option<u64>,
    eval_duration: Option<u64>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl OllamaGenerator {
    /// Create a new Ollama generator from provider configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RagError::configuration(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            host: config.host.trim_end_matches('/').to_string(),
            model: config.llm_model.clone(),
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<GenerationResponse> {
        let url = format!("{}/api/chat", self.host);

        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::generation(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::generation(format!("API error {}: {}", status, body)));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| RagError::generation(format!("failed to parse response: {}", e)))?;

        Ok(GenerationResponse {
            content: result.message.content,
            usage: UsageStats {
                prompt_tokens: result.prompt_eval_count,
                completion_tokens: result.eval_count,
                generation_time: result.eval_duration.map(Duration::from_nanos),
            },
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Canned generator for offline use and testing.
///
/// Echoes the question it finds in the last user message so tests can assert
/// the prompt actually reached the provider.
pub struct MockGenerator;

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<GenerationResponse> {
        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let question = prompt
            .lines()
            .find_map(|line| line.strip_prefix("Question: "))
            .unwrap_or(prompt);

        let content = format!(
            "Based on the provided context, here is an answer to: {}",
            question.trim()
        );

        Ok(GenerationResponse {
            usage: UsageStats {
                prompt_tokens: Some(prompt.len() as u64 / 4),
                completion_tokens: Some(content.len() as u64 / 4),
                generation_time: None,
            },
            content,
        })
    }

    fn model(&self) -> &str {
        "mock-llm"
    }
}

/// Create a generator based on configuration
pub fn create_generator(config: &ProviderConfig) -> Result<Arc<dyn Generator>> {
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaGenerator::new(config)?)),
        "mock" => Ok(Arc::new(MockGenerator)),
        other => Err(RagError::configuration(format!(
            "unknown generation provider: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_generator_echoes_question() {
        let generator = MockGenerator;
        let messages = [ChatMessage::user(
            "Context:\nirrelevant\n\nQuestion: What is a vector index?\n\nAnswer:",
        )];
        let response = generator.generate(&messages).await.unwrap();
        assert!(response.content.contains("What is a vector index?"));
        assert!(response.usage.completion_tokens.is_some());
    }

    #[test]
    fn test_tokens_per_second() {
        let usage = UsageStats {
            prompt_tokens: None,
            completion_tokens: Some(100),
            generation_time: Some(Duration::from_secs(4)),
        };
        assert_eq!(usage.tokens_per_second(), Some(25.0));

        // Not reported means not computable, never zero.
        assert_eq!(UsageStats::default().tokens_per_second(), None);
    }
}
