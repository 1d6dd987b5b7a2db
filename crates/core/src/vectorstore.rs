use crate::models::{IndexEntry, ScoredChunk};
use std::cmp::Ordering;

/// Similarity index over embedded chunks.
pub trait VectorStore: Send + Sync {
    fn insert(&mut self, entry: IndexEntry) -> anyhow::Result<()>;

    /// Up to `k` entries scoring at least `threshold`, best first.
    fn search(&self, query: &[f32], k: usize, threshold: f32) -> anyhow::Result<Vec<ScoredChunk>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Append-only in-memory store scored by cosine similarity.
#[derive(Debug, Default)]
pub struct MemoryVectorStore {
    entries: Vec<IndexEntry>,
    dimension: Option<usize>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}

impl VectorStore for MemoryVectorStore {
    fn insert(&mut self, entry: IndexEntry) -> anyhow::Result<()> {
        anyhow::ensure!(!entry.vector.is_empty(), "empty embedding for chunk {}", entry.chunk.id);
        match self.dimension {
            Some(dim) if dim != entry.vector.len() => anyhow::bail!(
                "embedding dimension mismatch: index has {}, chunk {} has {}",
                dim,
                entry.chunk.id,
                entry.vector.len()
            ),
            Some(_) => {}
            None => self.dimension = Some(entry.vector.len()),
        }
        self.entries.push(entry);
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize, threshold: f32) -> anyhow::Result<Vec<ScoredChunk>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if let Some(dim) = self.dimension {
            anyhow::ensure!(
                query.len() == dim,
                "query dimension {} does not match index dimension {}",
                query.len(),
                dim
            );
        }
        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|e| ScoredChunk {
                chunk: e.chunk.clone(),
                score: cosine_similarity(query, &e.vector),
            })
            .filter(|s| s.score >= threshold)
            .collect();
        // Stable sort keeps insertion order between equal scores.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;
    if denom <= f32::EPSILON {
        return 0.0;
    }
    dot / denom
}
