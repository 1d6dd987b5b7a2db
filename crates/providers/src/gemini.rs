//! Google Generative Language API client (`generateContent` / `embedContent`).

use crate::http::{checked, decode};
use crate::{ChatRequest, EmbedResponse, EmbeddingProvider, LlmProvider, ProviderError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
}

#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    cfg: Arc<GeminiConfig>,
}

impl GeminiProvider {
    pub fn new(cfg: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            cfg: Arc::new(cfg),
        }
    }

    fn endpoint(&self, model: &str, action: &str) -> String {
        format!(
            "{}/v1beta/{}:{}",
            self.cfg.base_url.trim_end_matches('/'),
            model_path(model),
            action
        )
    }

    async fn post<B: Serialize + ?Sized, T: for<'de> Deserialize<'de>>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, ProviderError> {
        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.cfg.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        decode(checked(resp).await?).await
    }
}

/// Model ids may be given with or without the `models/` prefix.
fn model_path(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

/// Rewrites a JSON schema into the OpenAPI subset `responseSchema` accepts:
/// upper-case type names, no `$schema`/`title`/`additionalProperties`.
pub fn to_gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, value) in map {
                match key.as_str() {
                    "$schema" | "title" | "additionalProperties" => {}
                    // Keys of `properties` are field names, not keywords.
                    "properties" => {
                        let props = match value {
                            Value::Object(fields) => Value::Object(
                                fields
                                    .iter()
                                    .map(|(name, field)| (name.clone(), to_gemini_schema(field)))
                                    .collect(),
                            ),
                            other => other.clone(),
                        };
                        out.insert(key.clone(), props);
                    }
                    "type" => {
                        let ty = value
                            .as_str()
                            .map(|s| Value::String(s.to_uppercase()))
                            .unwrap_or_else(|| value.clone());
                        out.insert(key.clone(), ty);
                    }
                    _ => {
                        out.insert(key.clone(), to_gemini_schema(value));
                    }
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(to_gemini_schema).collect()),
        other => other.clone(),
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
}

fn embed_request<'a>(model: &str, text: &'a str) -> EmbedContentRequest<'a> {
    EmbedContentRequest {
        model: model.to_string(),
        content: Content {
            role: None,
            parts: vec![Part { text }],
        },
    }
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<ContentEmbedding>,
}

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(&self, req: &ChatRequest) -> Result<String, ProviderError> {
        let structured = req.response_schema.is_some();
        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: &req.system }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: &req.user }],
            }],
            generation_config: GenerationConfig {
                temperature: self.cfg.temperature,
                response_mime_type: structured.then_some("application/json"),
                response_schema: req.response_schema.as_ref().map(to_gemini_schema),
            },
        };

        debug!(model = %self.cfg.chat_model, structured, "gemini generateContent");
        let parsed: GenerateResponse = self
            .post(self.endpoint(&self.cfg.chat_model, "generateContent"), &body)
            .await?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .ok_or_else(|| ProviderError::InvalidResponse("no candidates in response".into()))?;
        Ok(text)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for GeminiProvider {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        let model = model_path(&self.cfg.embedding_model);

        if let [single] = texts {
            let parsed: EmbedContentResponse = self
                .post(
                    self.endpoint(&self.cfg.embedding_model, "embedContent"),
                    &embed_request(&model, single),
                )
                .await?;
            return Ok(EmbedResponse {
                vectors: vec![parsed.embedding.values],
            });
        }

        let body = BatchEmbedRequest {
            requests: texts.iter().map(|t| embed_request(&model, t)).collect(),
        };
        let parsed: BatchEmbedResponse = self
            .post(
                self.endpoint(&self.cfg.embedding_model, "batchEmbedContents"),
                &body,
            )
            .await?;
        if parsed.embeddings.len() != texts.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }
        Ok(EmbedResponse {
            vectors: parsed.embeddings.into_iter().map(|e| e.values).collect(),
        })
    }
}
