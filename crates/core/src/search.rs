use crate::embeddings::embed_text;
use crate::models::ScoredChunk;
use crate::vectorstore::VectorStore;
use providers::EmbeddingProvider;

/// Embeds `question` and returns the best chunks scoring at least `threshold`.
pub async fn retrieve(
    question: &str,
    embedder: &dyn EmbeddingProvider,
    store: &dyn VectorStore,
    top_k: usize,
    threshold: f32,
) -> anyhow::Result<Vec<ScoredChunk>> {
    let vector = embed_text(embedder, question).await?;
    store.search(&vector, top_k, threshold)
}
