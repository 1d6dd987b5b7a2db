use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("credential not found: set {var} in the environment or in .env")]
    MissingCredential { var: String },
    #[error("invalid configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub rag: RagConfig,
    pub pacing: PacingConfig,
    pub assistant: AssistantConfig,
    pub samples: SampleMessages,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// `gemini`, `openai` or `noop`.
    pub name: String,
    /// Unset means the default model of the named provider.
    pub chat_model: Option<String>,
    pub embedding_model: Option<String>,
    pub temperature: f32,
    pub base_url: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "gemini".into(),
            chat_model: None,
            embedding_model: None,
            temperature: 0.0,
            base_url: None,
            api_key_env: None,
        }
    }
}

struct ProviderDefaults {
    chat_model: &'static str,
    embedding_model: &'static str,
    api_key_env: &'static str,
}

fn provider_defaults(name: &str) -> ProviderDefaults {
    match name {
        "openai" => ProviderDefaults {
            chat_model: "gpt-4o-mini",
            embedding_model: "text-embedding-3-small",
            api_key_env: "OPENAI_API_KEY",
        },
        _ => ProviderDefaults {
            chat_model: "gemini-1.5-flash",
            embedding_model: "text-embedding-004",
            api_key_env: "GOOGLE_API_KEY",
        },
    }
}

impl ProviderConfig {
    pub fn chat_model(&self) -> &str {
        self.chat_model
            .as_deref()
            .unwrap_or(provider_defaults(&self.name).chat_model)
    }

    pub fn embedding_model(&self) -> &str {
        self.embedding_model
            .as_deref()
            .unwrap_or(provider_defaults(&self.name).embedding_model)
    }

    pub fn api_key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or(provider_defaults(&self.name).api_key_env)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub docs_dir: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub score_threshold: f32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            docs_dir: "docs".into(),
            chunk_size: 300,
            chunk_overlap: 30,
            top_k: 4,
            score_threshold: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub chat_delay_ms: u64,
    pub embedding_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            chat_delay_ms: 6_000,
            embedding_delay_ms: 1_000,
        }
    }
}

impl PacingConfig {
    pub fn chat_delay(&self) -> Duration {
        Duration::from_millis(self.chat_delay_ms)
    }

    pub fn embedding_delay(&self) -> Duration {
        Duration::from_millis(self.embedding_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Company named in the system instructions.
    pub company: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            company: "Carraro Desenvolvimento".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleMessages(pub Vec<String>);

impl Default for SampleMessages {
    fn default() -> Self {
        Self(
            [
                "Can I get the home-office internet reimbursed?",
                "I want 5 more days of remote work. How do I do that?",
                "Can I get courses or trainings from Alura reimbursed?",
                "How many capybaras are there in the Pinheiros river?",
                "I need help.",
                "Please open a ticket about my access.",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )
    }
}

impl SampleMessages {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rag.chunk_size == 0 {
            return Err(ConfigError::Invalid("rag.chunk_size must be positive".into()));
        }
        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                self.rag.chunk_overlap, self.rag.chunk_size
            )));
        }
        if self.rag.top_k == 0 {
            return Err(ConfigError::Invalid("rag.top_k must be positive".into()));
        }
        Ok(())
    }
}

/// Loads `.env`, the optional config file, then `HELPDESK_*` environment
/// overrides (`HELPDESK_RAG__TOP_K=6`).
pub fn load(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_layers(path)
}

/// Like [`load`], reading variables from `env_file` instead of `./.env`.
/// Variables already set in the process win.
pub fn load_with_env_file(path: Option<&str>, env_file: &Path) -> Result<AppConfig, ConfigError> {
    dotenvy::from_path(env_file).ok();
    load_layers(path)
}

fn load_layers(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("HELPDESK")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );
    let cfg: AppConfig = settings.build()?.try_deserialize()?;
    cfg.validate()?;
    Ok(cfg)
}

/// Reads the provider API key after loading `.env`. Missing or blank keys are fatal.
pub fn resolve_api_key(provider: &ProviderConfig) -> Result<Option<String>, ConfigError> {
    if provider.name == "noop" {
        return Ok(None);
    }
    dotenvy::dotenv().ok();
    let var = provider.api_key_env();
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(Some(key)),
        _ => Err(ConfigError::MissingCredential {
            var: var.to_string(),
        }),
    }
}
