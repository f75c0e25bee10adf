//! Embeddings over an OpenAI-compatible API.

use super::Embedder;
use crate::config::{EmbeddingSettings, ProviderSettings};
use crate::error::{Result, VidqaError};
use crate::openai::create_client;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Embedder backed by the `/embeddings` endpoint.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: Option<u32>,
}

impl OpenAIEmbedder {
    /// Create an embedder from settings.
    pub fn new(provider: &ProviderSettings, embedding: &EmbeddingSettings) -> Result<Self> {
        Ok(Self::with_client(
            create_client(provider)?,
            &embedding.model,
            embedding.dimensions,
        ))
    }

    /// Create an embedder on an existing client.
    pub fn with_client(
        client: async_openai::Client<async_openai::config::OpenAIConfig>,
        model: &str,
        dimensions: Option<u32>,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            dimensions,
        }
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| VidqaError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        // Keep requests bounded for both hosted and local servers
        const BATCH_SIZE: usize = 100;
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let mut args = CreateEmbeddingRequestArgs::default();
            args.model(&self.model)
                .input(EmbeddingInput::StringArray(chunk.to_vec()));
            if let Some(dimensions) = self.dimensions {
                args.dimensions(dimensions);
            }

            let request = args
                .build()
                .map_err(|e| VidqaError::Embedding(format!("Failed to build request: {}", e)))?;

            let response = self.client.embeddings().create(request).await.map_err(|e| {
                VidqaError::OpenAI(format!("Embedding API error: {}", e))
            })?;

            if response.data.len() != chunk.len() {
                return Err(VidqaError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    chunk.len(),
                    response.data.len()
                )));
            }

            // Sort by index to ensure correct order
            let mut embeddings: Vec<_> = response.data.into_iter().collect();
            embeddings.sort_by_key(|e| e.index);

            for embedding_data in embeddings {
                all_embeddings.push(embedding_data.embedding);
            }
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    #[instrument(skip(self), fields(model = %self.model))]
    async fn check_ready(&self) -> Result<()> {
        self.client
            .models()
            .retrieve(&self.model)
            .await
            .map(|_| ())
            .map_err(|e| {
                VidqaError::ModelUnavailable(format!("embedding model {}: {}", self.model, e))
            })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
