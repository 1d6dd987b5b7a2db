use anyhow::Context;
use providers::EmbeddingProvider;

/// Embeds a single text with one provider call.
pub async fn embed_text(embedder: &dyn EmbeddingProvider, text: &str) -> anyhow::Result<Vec<f32>> {
    let resp = embedder
        .embed(&[text.to_string()])
        .await
        .context("embedding call failed")?;
    let vector = resp
        .vectors
        .into_iter()
        .next()
        .context("provider returned no embedding")?;
    anyhow::ensure!(!vector.is_empty(), "provider returned an empty embedding");
    Ok(vector)
}
