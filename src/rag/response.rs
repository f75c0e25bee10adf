//! Grounded answer generation.

use super::{context::format_context_for_prompt, ContextChunk};
use crate::config::Prompts;
use crate::error::Result;
use crate::generation::Generator;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Builds the grounded prompt and asks the generator for an answer.
pub struct AnswerGenerator {
    generator: Arc<dyn Generator>,
    prompts: Prompts,
}

impl AnswerGenerator {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Render the RAG template for a question and its context.
    pub fn build_prompt(&self, question: &str, chunks: &[ContextChunk]) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), format_context_for_prompt(chunks));
        vars.insert("question".to_string(), question.to_string());

        self.prompts.render_with_custom(&self.prompts.rag.template, &vars)
    }

    /// One generator call; the raw response is returned unchanged.
    #[instrument(skip(self, chunks), fields(chunks = chunks.len()))]
    pub async fn generate(&self, question: &str, chunks: &[ContextChunk]) -> Result<String> {
        let prompt = self.build_prompt(question, chunks);
        debug!("Prompt is {} bytes", prompt.len());

        let answer = self.generator.generate(&prompt).await?;
        info!("Generated answer with {}", self.generator.model());
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::EchoGenerator;

    fn chunk(order: usize, content: &str) -> ContextChunk {
        ContextChunk {
            chunk_order: order,
            content: content.to_string(),
            score: 1.0,
        }
    }

    #[test]
    fn test_prompt_contains_grounding_context_and_question() {
        let answerer = AnswerGenerator::new(Arc::new(EchoGenerator::new()));
        let prompt = answerer.build_prompt(
            "What is photosynthesis?",
            &[chunk(0, "Plants use light."), chunk(1, "They make sugar.")],
        );

        assert_eq!(
            prompt,
            "\nYou are a helpful assistant.\nAnswer ONLY from the provided transcript context.\n\
             If the context is insufficient, just say you don't know.\n\n\
             Plants use light.\n\nThey make sugar.\nQuestion: What is photosynthesis?\n"
        );
    }

    #[test]
    fn test_prompt_keeps_placeholder_text_in_context_verbatim() {
        let answerer = AnswerGenerator::new(Arc::new(EchoGenerator::new()));

        for _ in 0..16 {
            let prompt = answerer.build_prompt(
                "How do I print a variable?",
                &[chunk(0, "In Handlebars write {{question}} to print it.")],
            );
            assert!(prompt.contains("In Handlebars write {{question}} to print it.\nQuestion: How do I print a variable?\n"));
        }
    }

    #[tokio::test]
    async fn test_generate_returns_raw_text() {
        let generator = Arc::new(EchoGenerator::with_response("  It converts light. \n"));
        let answerer = AnswerGenerator::new(generator.clone());

        let answer = answerer.generate("Why?", &[chunk(0, "context")]).await.unwrap();

        assert_eq!(answer, "  It converts light. \n");
        assert_eq!(generator.calls(), 1);
        assert!(generator.last_prompt().unwrap().contains("context\nQuestion: Why?"));
    }

    #[tokio::test]
    async fn test_generate_with_empty_context_still_calls_generator() {
        let generator = Arc::new(EchoGenerator::new());
        let answerer = AnswerGenerator::new(generator.clone());

        let answer = answerer.generate("Anything?", &[]).await.unwrap();

        assert!(answer.contains("\n\nQuestion: Anything?"));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_custom_template_and_variables() {
        let mut prompts = Prompts::default();
        prompts.rag.template = "[{{persona}}] {{context}} | {{question}}".to_string();
        prompts.variables.insert("persona".to_string(), "tutor".to_string());

        let answerer = AnswerGenerator::new(Arc::new(EchoGenerator::new())).with_prompts(prompts);

        assert_eq!(answerer.build_prompt("Q", &[chunk(0, "C")]), "[tutor] C | Q");
    }

    #[tokio::test]
    async fn test_generator_failure_propagates() {
        let answerer = AnswerGenerator::new(Arc::new(EchoGenerator::failing("model crashed")));
        let err = answerer.generate("Q", &[]).await.unwrap_err();
        assert!(err.to_string().contains("model crashed"));
    }
}
