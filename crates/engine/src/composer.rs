//! Answer composition
//!
//! Builds a grounded prompt from retrieved context and delegates to the
//! generation provider. Provider failures surface unchanged; there is no
//! retry at this layer.

use ragkit_common::generation::{ChatMessage, Generator, UsageStats};
use ragkit_common::Result;
use ragkit_index::RetrievalResult;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A generated answer with the provider's usage report
#[derive(Debug, Clone)]
pub struct GeneratedAnswer {
    pub text: String,
    pub usage: UsageStats,
}

/// Composes grounded prompts and generates answers
pub struct AnswerComposer {
    generator: Arc<dyn Generator>,
}

impl AnswerComposer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// The configured generation model identifier
    pub fn model(&self) -> &str {
        self.generator.model()
    }

    /// Build the prompt for a question with retrieved context.
    ///
    /// With no context the question is asked plainly; otherwise each context
    /// block is numbered and labeled with its source and relevance score,
    /// and the model is told to say so when the context does not contain
    /// the answer.
    pub fn compose_prompt(question: &str, context: &[RetrievalResult]) -> String {
        if context.is_empty() {
            return format!(
                "You are a helpful assistant. Answer the following question:\n\n\
                 Question: {}\n\nAnswer:",
                question
            );
        }

        let blocks: Vec<String> = context
            .iter()
            .enumerate()
            .map(|(i, result)| {
                let source = result
                    .metadata
                    .get("filename")
                    .or_else(|| result.metadata.get("source"))
                    .map(String::as_str)
                    .unwrap_or("Unknown");
                format!(
                    "[Document {} - {} (relevance: {:.2})]:\n{}",
                    i + 1,
                    source,
                    result.score,
                    result.text
                )
            })
            .collect();

        format!(
            "You are a helpful assistant. Use the following context to answer the question. \
             If the answer cannot be found in the context, say so.\n\n\
             Context:\n{}\n\n\
             Question: {}\n\nAnswer:",
            blocks.join("\n\n"),
            question
        )
    }

    /// Generate an answer for the question, grounded in the given context
    #[instrument(skip(self, context), fields(context_blocks = context.len()))]
    pub async fn answer(
        &self,
        question: &str,
        context: &[RetrievalResult],
    ) -> Result<GeneratedAnswer> {
        let prompt = Self::compose_prompt(question, context);
        let messages = [ChatMessage::user(prompt)];

        let response = self.generator.generate(&messages).await?;

        debug!(
            completion_tokens = ?response.usage.completion_tokens,
            "Answer generated"
        );

        Ok(GeneratedAnswer {
            text: response.content,
            usage: response.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragkit_common::generation::MockGenerator;
    use std::collections::BTreeMap;

    fn result(text: &str, score: f32, source: Option<&str>) -> RetrievalResult {
        let mut metadata = BTreeMap::new();
        if let Some(source) = source {
            metadata.insert("filename".to_string(), source.to_string());
        }
        RetrievalResult {
            text: text.to_string(),
            score,
            metadata,
        }
    }

    #[test]
    fn test_plain_prompt_without_context() {
        let prompt = AnswerComposer::compose_prompt("What is Rust?", &[]);
        assert!(prompt.contains("Question: What is Rust?"));
        assert!(!prompt.contains("Context:"));
    }

    #[test]
    fn test_grounded_prompt_numbers_context_blocks() {
        let context = vec![
            result("Rust is a systems language.", 0.91, Some("rust.txt")),
            result("Crabs are crustaceans.", 0.40, None),
        ];
        let prompt = AnswerComposer::compose_prompt("What is Rust?", &context);

        assert!(prompt.contains("[Document 1 - rust.txt (relevance: 0.91)]:"));
        assert!(prompt.contains("[Document 2 - Unknown (relevance: 0.40)]:"));
        assert!(prompt.contains("If the answer cannot be found in the context, say so."));
        // The question comes after the context blocks.
        let question_pos = prompt.find("Question:").unwrap();
        let context_pos = prompt.find("[Document 2").unwrap();
        assert!(question_pos > context_pos);
    }

    #[tokio::test]
    async fn test_answer_passes_through_usage() {
        let composer = AnswerComposer::new(Arc::new(MockGenerator));
        let context = vec![result("Rust is a systems language.", 0.9, Some("rust.txt"))];

        let answer = composer.answer("What is Rust?", &context).await.unwrap();
        assert!(answer.text.contains("What is Rust?"));
        assert!(answer.usage.completion_tokens.is_some());
    }
}
