use crate::config::RagConfig;
use crate::indexer::PolicyIndex;
use crate::models::{AnswerResult, ScoredChunk, SENTINEL};
use crate::prompts::{rag_user_message, Prompts};
use crate::search::retrieve;
use anyhow::Context;
use providers::{ChatRequest, EmbeddingProvider, LlmProvider};
use std::sync::Arc;
use tracing::debug;

/// Answers policy questions strictly from retrieved document chunks.
pub struct PolicyAnswerer {
    index: PolicyIndex,
    llm: Arc<dyn LlmProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    score_threshold: f32,
    prompts: Prompts,
}

impl PolicyAnswerer {
    pub fn new(
        index: PolicyIndex,
        llm: Arc<dyn LlmProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        rag: &RagConfig,
        prompts: Prompts,
    ) -> Self {
        Self {
            index,
            llm,
            embedder,
            top_k: rag.top_k,
            score_threshold: rag.score_threshold,
            prompts,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.index.is_enabled()
    }

    pub fn index(&self) -> &PolicyIndex {
        &self.index
    }

    pub async fn ask(&self, question: &str) -> anyhow::Result<AnswerResult> {
        if !self.is_enabled() {
            return Ok(AnswerResult::unknown(false));
        }

        let hits = retrieve(
            question,
            self.embedder.as_ref(),
            self.index.store(),
            self.top_k,
            self.score_threshold,
        )
        .await
        .context("retrieval failed")?;
        if hits.is_empty() {
            debug!("no chunk above threshold {}", self.score_threshold);
            return Ok(AnswerResult::unknown(false));
        }

        let req = ChatRequest::new(
            self.prompts.rag_system.clone(),
            rag_user_message(question, &context_text(&hits)),
        );
        let reply = self.llm.complete(&req).await.context("answer call failed")?;
        let text = reply.trim();

        if text.is_empty() || is_sentinel(text) {
            return Ok(AnswerResult::unknown(true));
        }
        Ok(AnswerResult {
            answer: text.to_string(),
            citations: hits.into_iter().map(|h| h.chunk).collect(),
            context_found: true,
        })
    }
}

fn context_text(hits: &[ScoredChunk]) -> String {
    hits.iter()
        .map(|h| h.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// True when `text` is the sentinel up to trailing `.`/`!`/`?`, letter case
/// and typographic apostrophes.
pub fn is_sentinel(text: &str) -> bool {
    let stripped = text
        .trim()
        .trim_end_matches(&['.', '!', '?'][..])
        .trim_end()
        .replace('\u{2019}', "'");
    stripped.eq_ignore_ascii_case(SENTINEL)
}
