use crate::answerer::PolicyAnswerer;
use crate::classifier;
use crate::config::{self, AppConfig, ConfigError};
use crate::indexer::{self, IndexReport};
use crate::models::{AnswerResult, TriageResult};
use crate::pacing::Pacer;
use crate::prompts::Prompts;
use providers::gemini::{self, GeminiConfig, GeminiProvider};
use providers::noop::NoopProvider;
use providers::openai::{self, OpenAiConfig, OpenAiProvider};
use providers::{EmbeddingProvider, LlmProvider, ProviderRegistry};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Triage,
    Rag,
    All,
}

#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub triaged: usize,
    pub triage_failures: usize,
    pub answered: usize,
    pub answer_failures: usize,
    pub index: Option<IndexReport>,
}

/// Receives results as they are produced so a long, paced run shows progress.
pub trait Reporter {
    /// Called once before each phase starts.
    fn phase(&mut self, _phase: RunMode) -> std::io::Result<()> {
        Ok(())
    }
    fn triage(&mut self, message: &str, result: &anyhow::Result<TriageResult>)
        -> std::io::Result<()>;
    fn index_built(&mut self, report: &IndexReport) -> std::io::Result<()>;
    fn rag_disabled(&mut self) -> std::io::Result<()>;
    fn answer(&mut self, question: &str, result: &anyhow::Result<AnswerResult>)
        -> std::io::Result<()>;
}

/// One configured model client shared by triage and policy answering.
pub struct Session {
    cfg: AppConfig,
    llm: Arc<dyn LlmProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    prompts: Prompts,
    pacer: Pacer,
}

impl Session {
    pub fn new(cfg: AppConfig, registry: &ProviderRegistry) -> anyhow::Result<Self> {
        let llm = registry.llm(None)?;
        let embedder = registry.embedding(None)?;
        Ok(Self {
            prompts: Prompts::new(&cfg.assistant),
            pacer: Pacer::from_config(&cfg.pacing),
            cfg,
            llm,
            embedder,
        })
    }

    /// Resolves the credential and builds the configured provider.
    pub fn from_config(cfg: AppConfig) -> anyhow::Result<Self> {
        let registry = build_registry(&cfg)?;
        Self::new(cfg, &registry)
    }

    pub fn config(&self) -> &AppConfig {
        &self.cfg
    }

    pub async fn triage(&self, message: &str) -> anyhow::Result<TriageResult> {
        classifier::classify(message, self.llm.as_ref(), &self.prompts).await
    }

    pub async fn build_answerer(&self) -> anyhow::Result<PolicyAnswerer> {
        info!("building policy index from {:?}", self.cfg.rag.docs_dir);
        let index = indexer::build_index(&self.cfg.rag, self.embedder.as_ref(), &self.pacer).await?;
        Ok(PolicyAnswerer::new(
            index,
            self.llm.clone(),
            self.embedder.clone(),
            &self.cfg.rag,
            self.prompts.clone(),
        ))
    }

    /// Runs the requested phases over the configured sample messages, strictly
    /// one call at a time. Per-item failures are reported and counted.
    pub async fn run(
        &self,
        mode: RunMode,
        reporter: &mut dyn Reporter,
    ) -> anyhow::Result<RunSummary> {
        let mut summary = RunSummary::default();

        if matches!(mode, RunMode::Triage | RunMode::All) {
            info!("starting triage of {} messages", self.cfg.samples.len());
            reporter.phase(RunMode::Triage)?;
            for message in self.cfg.samples.iter() {
                let result = self.triage(message).await;
                match &result {
                    Ok(_) => summary.triaged += 1,
                    Err(e) => {
                        summary.triage_failures += 1;
                        warn!("triage failed for {:?}: {:#}", message, e);
                    }
                }
                reporter.triage(message, &result)?;
                self.pacer.after_chat().await;
            }
        }

        if matches!(mode, RunMode::Rag | RunMode::All) {
            reporter.phase(RunMode::Rag)?;
            let answerer = self.build_answerer().await?;
            let report = answerer.index().report().clone();
            reporter.index_built(&report)?;
            summary.index = Some(report);

            if !answerer.is_enabled() {
                reporter.rag_disabled()?;
                return Ok(summary);
            }

            info!("starting policy answering of {} questions", self.cfg.samples.len());
            for question in self.cfg.samples.iter() {
                let result = answerer.ask(question).await;
                match &result {
                    Ok(_) => summary.answered += 1,
                    Err(e) => {
                        summary.answer_failures += 1;
                        warn!("answer failed for {:?}: {:#}", question, e);
                    }
                }
                reporter.answer(question, &result)?;
                self.pacer.after_chat().await;
            }
        }

        Ok(summary)
    }
}

pub fn build_registry(cfg: &AppConfig) -> Result<ProviderRegistry, ConfigError> {
    let provider = &cfg.provider;
    let api_key = config::resolve_api_key(provider)?.unwrap_or_default();
    let reg = ProviderRegistry::new();

    let reg = match provider.name.as_str() {
        "gemini" => {
            let client = GeminiProvider::new(GeminiConfig {
                api_key,
                base_url: provider
                    .base_url
                    .clone()
                    .unwrap_or_else(|| gemini::DEFAULT_BASE_URL.to_string()),
                chat_model: provider.chat_model().to_string(),
                embedding_model: provider.embedding_model().to_string(),
                temperature: provider.temperature,
            });
            reg.with_llm("gemini", Arc::new(client.clone()))
                .with_embedding("gemini", Arc::new(client))
        }
        "openai" => {
            let client = OpenAiProvider::new(OpenAiConfig {
                api_key,
                base_url: provider
                    .base_url
                    .clone()
                    .unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_string()),
                embedding_model: provider.embedding_model().to_string(),
                chat_model: provider.chat_model().to_string(),
                temperature: provider.temperature,
            });
            reg.with_llm("openai", Arc::new(client.clone()))
                .with_embedding("openai", Arc::new(client))
        }
        "noop" => reg
            .with_llm("noop", Arc::new(NoopProvider))
            .with_embedding("noop", Arc::new(NoopProvider)),
        other => {
            return Err(ConfigError::Invalid(format!(
                "unknown provider {other:?} (expected gemini, openai or noop)"
            )))
        }
    };

    Ok(reg
        .set_preferred_llm(&provider.name)
        .set_preferred_embedding(&provider.name))
}
