use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Canonical reply when the indexed documents do not support an answer.
pub const SENTINEL: &str = "I don't know";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    AutoResolver,
    PedirInfo,
    AbrirChamado,
}

impl Decision {
    pub const ALL: [Decision; 3] = [
        Decision::AutoResolver,
        Decision::PedirInfo,
        Decision::AbrirChamado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::AutoResolver => "AUTO_RESOLVER",
            Decision::PedirInfo => "PEDIR_INFO",
            Decision::AbrirChamado => "ABRIR_CHAMADO",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Baixa,
    Media,
    Alta,
}

impl Urgency {
    pub const ALL: [Urgency; 3] = [Urgency::Baixa, Urgency::Media, Urgency::Alta];

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Baixa => "BAIXA",
            Urgency::Media => "MEDIA",
            Urgency::Alta => "ALTA",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageResult {
    pub decision: Decision,
    pub urgency: Urgency,
    #[serde(default)]
    pub missing_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSource {
    pub path: PathBuf,
    /// 1-based; `None` when the extractor could not attribute text to a page.
    pub page: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub text: String,
    pub source: ChunkSource,
    /// Position of the chunk within its page.
    pub index: usize,
}

impl DocumentChunk {
    pub fn new(text: String, source: ChunkSource, index: usize) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(source.path.to_string_lossy().as_bytes());
        hasher.update(&source.page.unwrap_or(0).to_le_bytes());
        hasher.update(&(index as u64).to_le_bytes());
        hasher.update(text.as_bytes());
        Self {
            id: hasher.finalize().to_hex().to_string(),
            text,
            source,
            index,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: DocumentChunk,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerResult {
    pub answer: String,
    pub citations: Vec<DocumentChunk>,
    pub context_found: bool,
}

impl AnswerResult {
    pub fn unknown(context_found: bool) -> Self {
        Self {
            answer: SENTINEL.to_string(),
            citations: Vec::new(),
            context_found,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.answer == SENTINEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_use_wire_names() {
        let json = serde_json::to_string(&TriageResult {
            decision: Decision::AbrirChamado,
            urgency: Urgency::Alta,
            missing_fields: vec![],
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"decision":"ABRIR_CHAMADO","urgency":"ALTA","missing_fields":[]}"#
        );
        for d in Decision::ALL {
            assert_eq!(serde_json::to_value(d).unwrap(), d.as_str());
        }
        for u in Urgency::ALL {
            assert_eq!(serde_json::to_value(u).unwrap(), u.as_str());
        }
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let parsed: TriageResult =
            serde_json::from_str(r#"{"decision":"PEDIR_INFO","urgency":"MEDIA"}"#).unwrap();
        assert!(parsed.missing_fields.is_empty());
    }

    #[test]
    fn chunk_ids_depend_on_position_and_text() {
        let src = ChunkSource {
            path: PathBuf::from("docs/policy.pdf"),
            page: Some(1),
        };
        let a = DocumentChunk::new("same".into(), src.clone(), 0);
        let b = DocumentChunk::new("same".into(), src.clone(), 0);
        let c = DocumentChunk::new("same".into(), src, 1);
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn unknown_answer_has_no_citations() {
        let r = AnswerResult::unknown(true);
        assert!(r.is_unknown());
        assert!(r.citations.is_empty());
        assert!(r.context_found);
    }
}
