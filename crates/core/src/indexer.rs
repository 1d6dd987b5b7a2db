//! Builds the policy retrieval index from a folder of PDFs.
//!
//! Chunks are embedded one provider call at a time and inserted as soon as
//! their vector arrives, with the embedding pause after every call. This
//! keeps each request small enough for tight rate limits.

use crate::config::RagConfig;
use crate::embeddings::embed_text;
use crate::extractor;
use crate::models::{DocumentChunk, IndexEntry};
use crate::pacing::Pacer;
use crate::splitter::TextSplitter;
use crate::vectorstore::{MemoryVectorStore, VectorStore};
use providers::EmbeddingProvider;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub files_found: usize,
    pub files_loaded: usize,
    pub files_failed: usize,
    pub chunks: usize,
    pub embedded: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct PolicyIndex {
    store: MemoryVectorStore,
    report: IndexReport,
}

impl PolicyIndex {
    pub fn new(store: MemoryVectorStore, report: IndexReport) -> Self {
        Self { store, report }
    }

    /// An index with nothing to retrieve; queries against it never reach a provider.
    pub fn disabled(report: IndexReport) -> Self {
        Self::new(MemoryVectorStore::new(), report)
    }

    pub fn is_enabled(&self) -> bool {
        !self.store.is_empty()
    }

    pub fn store(&self) -> &MemoryVectorStore {
        &self.store
    }

    pub fn report(&self) -> &IndexReport {
        &self.report
    }
}

pub async fn build_index(
    rag: &RagConfig,
    embedder: &dyn EmbeddingProvider,
    pacer: &Pacer,
) -> anyhow::Result<PolicyIndex> {
    let splitter = TextSplitter::new(rag.chunk_size, rag.chunk_overlap)?;
    let loaded = extractor::load_documents(Path::new(&rag.docs_dir));

    let mut report = IndexReport {
        files_found: loaded.found,
        files_loaded: loaded.documents.len(),
        files_failed: loaded.failures.len(),
        ..IndexReport::default()
    };
    if loaded.documents.is_empty() {
        warn!("no documents loaded from {:?}; policy answering is disabled", rag.docs_dir);
        return Ok(PolicyIndex::disabled(report));
    }

    let chunks: Vec<DocumentChunk> = loaded
        .documents
        .iter()
        .flat_map(|doc| splitter.split_pages(&doc.path, &doc.pages))
        .collect();
    report.chunks = chunks.len();
    info!(
        "{} documents split into {} chunks",
        report.files_loaded, report.chunks
    );

    let mut store = MemoryVectorStore::new();
    let (embedded, failed) = embed_chunks(chunks, embedder, pacer, &mut store).await;
    report.embedded = embedded;
    report.failed = failed;
    info!("embedding finished: {} ok, {} failed", embedded, failed);

    if store.is_empty() {
        warn!("no chunk could be embedded; policy answering is disabled");
        return Ok(PolicyIndex::disabled(report));
    }
    Ok(PolicyIndex::new(store, report))
}

/// Embeds and inserts chunks one by one. Returns `(embedded, failed)`.
pub async fn embed_chunks(
    chunks: Vec<DocumentChunk>,
    embedder: &dyn EmbeddingProvider,
    pacer: &Pacer,
    store: &mut dyn VectorStore,
) -> (usize, usize) {
    let total = chunks.len();
    let mut embedded = 0usize;
    let mut failed = 0usize;
    for (i, chunk) in chunks.into_iter().enumerate() {
        let result = match embed_text(embedder, &chunk.text).await {
            Ok(vector) => store.insert(IndexEntry { chunk, vector }),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                embedded += 1;
                info!("embedded chunk {}/{}", i + 1, total);
            }
            Err(e) => {
                failed += 1;
                warn!("failed to embed chunk {}/{}: {:#}", i + 1, total, e);
            }
        }
        pacer.after_embedding().await;
    }
    (embedded, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkSource;
    use providers::{EmbedResponse, ProviderError};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails every call whose text contains "bad".
    #[derive(Default)]
    struct Picky {
        calls: AtomicUsize,
        batch_sizes: std::sync::Mutex<Vec<usize>>,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for Picky {
        async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.batch_sizes.lock().unwrap().push(texts.len());
            if texts.iter().any(|t| t.contains("bad")) {
                return Err(ProviderError::RateLimited("quota".into()));
            }
            Ok(EmbedResponse {
                vectors: texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect(),
            })
        }
    }

    fn chunk(text: &str, index: usize) -> DocumentChunk {
        DocumentChunk::new(
            text.into(),
            ChunkSource {
                path: PathBuf::from("docs/p.pdf"),
                page: Some(1),
            },
            index,
        )
    }

    #[tokio::test]
    async fn one_call_per_chunk_and_failures_are_skipped() {
        let embedder = Picky::default();
        let mut store = MemoryVectorStore::new();
        let chunks = vec![chunk("good one", 0), chunk("bad one", 1), chunk("good two", 2)];

        let (ok, failed) = embed_chunks(chunks, &embedder, &Pacer::disabled(), &mut store).await;

        assert_eq!((ok, failed), (2, 1));
        assert_eq!(store.len(), 2);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
        assert!(embedder.batch_sizes.lock().unwrap().iter().all(|n| *n == 1));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_follows_every_call_even_failures() {
        let embedder = Picky::default();
        let mut store = MemoryVectorStore::new();
        let pacer = Pacer::new(std::time::Duration::ZERO, std::time::Duration::from_secs(1));
        let start = tokio::time::Instant::now();

        embed_chunks(
            vec![chunk("bad", 0), chunk("good", 1), chunk("bad again", 2)],
            &embedder,
            &pacer,
            &mut store,
        )
        .await;

        assert!(start.elapsed() >= std::time::Duration::from_secs(3));
    }

    #[tokio::test]
    async fn empty_folder_disables_answering() {
        let temp = tempfile::tempdir().unwrap();
        let rag = RagConfig {
            docs_dir: temp.path().to_string_lossy().into_owned(),
            ..RagConfig::default()
        };
        let embedder = Picky::default();

        let index = build_index(&rag, &embedder, &Pacer::disabled()).await.unwrap();

        assert!(!index.is_enabled());
        assert_eq!(index.report().files_found, 0);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unreadable_pdf_disables_answering_without_embedding() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("x.pdf"), b"not really a pdf").unwrap();
        let rag = RagConfig {
            docs_dir: temp.path().to_string_lossy().into_owned(),
            ..RagConfig::default()
        };
        let embedder = Picky::default();

        let index = build_index(&rag, &embedder, &Pacer::disabled()).await.unwrap();

        assert!(!index.is_enabled());
        assert_eq!(index.report().files_found, 1);
        assert_eq!(index.report().files_loaded, 0);
        assert_eq!(index.report().files_failed, 1);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[cfg(feature = "pdf")]
    fn write_pdf(path: &std::path::Path, line: &str) {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[cfg(feature = "pdf")]
    #[tokio::test]
    async fn every_embedding_failing_disables_answering() {
        let temp = tempfile::tempdir().unwrap();
        write_pdf(
            &temp.path().join("policy.pdf"),
            "bad news: the remote work allowance is paid monthly.",
        );
        let rag = RagConfig {
            docs_dir: temp.path().to_string_lossy().into_owned(),
            ..RagConfig::default()
        };
        let embedder = Picky::default();

        let index = build_index(&rag, &embedder, &Pacer::disabled()).await.unwrap();

        let report = index.report();
        assert!(!index.is_enabled());
        assert!(index.store().is_empty());
        assert_eq!(report.files_loaded, 1);
        assert!(report.chunks > 0);
        assert_eq!(report.embedded, 0);
        assert_eq!(report.failed, report.chunks);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), report.chunks);
    }

    #[tokio::test]
    async fn invalid_splitter_settings_are_an_error() {
        let rag = RagConfig {
            chunk_size: 10,
            chunk_overlap: 20,
            ..RagConfig::default()
        };
        assert!(build_index(&rag, &Picky::default(), &Pacer::disabled())
            .await
            .is_err());
    }
}
