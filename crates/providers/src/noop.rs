use crate::{ChatRequest, EmbedResponse, EmbeddingProvider, LlmProvider, ProviderError};

/// Offline stand-in: every call fails with `NotImplemented`.
#[derive(Debug, Default)]
pub struct NoopProvider;

#[async_trait::async_trait]
impl EmbeddingProvider for NoopProvider {
    async fn embed(&self, _texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        Err(ProviderError::NotImplemented)
    }
}

#[async_trait::async_trait]
impl LlmProvider for NoopProvider {
    async fn complete(&self, _req: &ChatRequest) -> Result<String, ProviderError> {
        Err(ProviderError::NotImplemented)
    }
}
