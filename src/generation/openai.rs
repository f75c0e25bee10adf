//! Chat-completion generator over an OpenAI-compatible API.

use super::Generator;
use crate::config::{GenerationSettings, ProviderSettings};
use crate::error::{Result, VidqaError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Generator that sends the whole prompt as a single user message.
pub struct OpenAIGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
}

impl OpenAIGenerator {
    /// Create a generator from settings.
    pub fn new(provider: &ProviderSettings, generation: &GenerationSettings) -> Result<Self> {
        Ok(Self::with_client(
            create_client(provider)?,
            &generation.model,
            generation.temperature,
        ))
    }

    /// Create a generator on an existing client.
    pub fn with_client(
        client: async_openai::Client<async_openai::config::OpenAIConfig>,
        model: &str,
        temperature: Option<f32>,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| VidqaError::Generation(e.to_string()))?
                .into(),
        ];

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(messages);
        if let Some(temperature) = self.temperature {
            args.temperature(temperature);
        }
        let request = args
            .build()
            .map_err(|e| VidqaError::Generation(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            VidqaError::OpenAI(format!("Failed to generate response: {}", e))
        })?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| VidqaError::Generation("Empty response from LLM".to_string()))?;

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }

    #[instrument(skip(self), fields(model = %self.model))]
    async fn check_ready(&self) -> Result<()> {
        self.client
            .models()
            .retrieve(&self.model)
            .await
            .map(|_| ())
            .map_err(|e| {
                VidqaError::ModelUnavailable(format!("generation model {}: {}", self.model, e))
            })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
