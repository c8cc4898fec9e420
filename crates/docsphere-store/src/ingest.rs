//! Ingestion: one raw document in, one committed [`Document`] out.
//!
//! OCR and embedding calls happen before the store lock is taken — they
//! are slow out-of-process calls and must not block readers. The append +
//! persist step is a single serialized unit inside [`PersistentStore`].

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use docsphere_core::error::{DocSphereError, Result};
use docsphere_core::traits::{Embedder, OcrEngine};
use docsphere_core::types::{Document, Page};
use uuid::Uuid;

use crate::mime;
use crate::persist::PersistentStore;

/// Where a document's raw bytes come from. One abstract entry point covers
/// both on-disk files and uploaded buffers.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    Path(PathBuf),
    Buffer { name: String, data: Vec<u8> },
}

impl DocumentSource {
    pub fn path(p: impl Into<PathBuf>) -> Self {
        Self::Path(p.into())
    }

    pub fn buffer(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self::Buffer {
            name: name.into(),
            data,
        }
    }

    /// The location the original file is retrievable from — recorded in
    /// the store and echoed back in query results.
    pub fn location(&self) -> String {
        match self {
            Self::Path(p) => p.display().to_string(),
            Self::Buffer { name, .. } => name.clone(),
        }
    }

    /// File name usable for extension-based media-type guessing.
    fn file_name(&self) -> Option<&str> {
        match self {
            Self::Path(p) => p.file_name().and_then(|n| n.to_str()),
            Self::Buffer { name, .. } => Some(name.as_str()),
        }
    }

    fn read(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            Self::Path(p) => Ok(Cow::Owned(std::fs::read(p)?)),
            Self::Buffer { data, .. } => Ok(Cow::Borrowed(data)),
        }
    }
}

/// Turns one raw document into a committed, durably persisted [`Document`].
pub struct IngestionPipeline {
    ocr: Arc<dyn OcrEngine>,
    embedder: Arc<dyn Embedder>,
    store: Arc<PersistentStore>,
    accept_plain_text: bool,
}

impl IngestionPipeline {
    pub fn new(
        ocr: Arc<dyn OcrEngine>,
        embedder: Arc<dyn Embedder>,
        store: Arc<PersistentStore>,
        accept_plain_text: bool,
    ) -> Self {
        Self {
            ocr,
            embedder,
            store,
            accept_plain_text,
        }
    }

    /// Ingest one document for a user with a fresh docId.
    pub async fn ingest(
        &self,
        user_id: &str,
        source: DocumentSource,
        mime_hint: Option<&str>,
    ) -> Result<Uuid> {
        self.ingest_as(user_id, source, mime_hint, Uuid::new_v4())
            .await
    }

    /// Ingest with a caller-supplied docId. Re-ingesting the same source
    /// always produces a new, independent document — there is no update or
    /// delete path.
    pub async fn ingest_as(
        &self,
        user_id: &str,
        source: DocumentSource,
        mime_hint: Option<&str>,
        doc_id: Uuid,
    ) -> Result<Uuid> {
        let raw = source.read()?;
        let media_type = mime::resolve(mime_hint, source.file_name(), &raw).ok_or_else(|| {
            DocSphereError::UnsupportedMediaType("unable to determine media type".into())
        })?;
        mime::ensure_supported(&media_type, self.accept_plain_text)?;

        // Empty extraction is legal: a document with no extractable text
        // becomes a zero-page document.
        let texts = self.ocr.extract_pages(&raw, &media_type).await?;
        let embeddings = self.embedder.embed_many(&texts).await?;
        if embeddings.len() != texts.len() {
            return Err(DocSphereError::EmbeddingCountMismatch {
                expected: texts.len(),
                actual: embeddings.len(),
            });
        }
        let dims = self.embedder.dimensions();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dims) {
            return Err(DocSphereError::EmbeddingService(format!(
                "expected {dims}-dimensional vectors, got {}",
                bad.len()
            )));
        }

        let pages: Vec<Page> = texts
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (content, embedding))| Page {
                page_no: i as u32 + 1,
                content,
                embedding,
            })
            .collect();
        let page_count = pages.len();

        let document = Document {
            doc_id,
            owner_user_id: user_id.to_string(),
            source_location: source.location(),
            ingested_at: Utc::now(),
            pages,
        };

        // Append + persist as one unit; on failure nothing was published.
        self.store.append(document).await?;

        tracing::info!(
            "📄 Ingested {} ({media_type}, {page_count} page(s)) for user {user_id}",
            doc_id
        );
        Ok(doc_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockOcr {
        pages: Vec<String>,
        calls: AtomicUsize,
    }

    impl MockOcr {
        fn with_pages(pages: &[&str]) -> Self {
            Self {
                pages: pages.iter().map(|s| s.to_string()).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl OcrEngine for MockOcr {
        fn name(&self) -> &str {
            "mock-ocr"
        }

        async fn extract_pages(&self, _raw: &[u8], _mime_type: &str) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.pages.clone())
        }
    }

    /// Deterministic 4-dim embeddings derived from text bytes.
    struct MockEmbedder {
        /// When set, embed_many returns one vector fewer than requested.
        drop_one: bool,
    }

    impl MockEmbedder {
        fn embed(text: &str) -> Vec<f32> {
            let mut v = [0.0f32; 4];
            for (i, b) in text.bytes().enumerate() {
                v[i % 4] += b as f32 / 255.0;
            }
            v.to_vec()
        }
    }

    #[async_trait]
    impl Embedder for MockEmbedder {
        fn name(&self) -> &str {
            "mock-embedder"
        }

        fn dimensions(&self) -> usize {
            4
        }

        async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out: Vec<Vec<f32>> = texts.iter().map(|t| Self::embed(t)).collect();
            if self.drop_one {
                out.pop();
            }
            Ok(out)
        }

        async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
            Ok(Self::embed(text))
        }
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("docsphere-ingest-{name}"));
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).ok();
        dir
    }

    fn pipeline(
        dir: &std::path::Path,
        ocr: MockOcr,
        embedder: MockEmbedder,
    ) -> (IngestionPipeline, Arc<PersistentStore>) {
        let store = Arc::new(PersistentStore::open(dir.join("store.json")).unwrap());
        let pipeline = IngestionPipeline::new(
            Arc::new(ocr),
            Arc::new(embedder),
            store.clone(),
            false,
        );
        (pipeline, store)
    }

    fn pdf_buffer(name: &str) -> DocumentSource {
        DocumentSource::buffer(name, b"%PDF-1.7 test".to_vec())
    }

    #[tokio::test]
    async fn test_ingest_builds_contiguous_pages() {
        let dir = scratch("pages");
        let (pipeline, store) = pipeline(
            &dir,
            MockOcr::with_pages(&["one", "two", "three"]),
            MockEmbedder { drop_one: false },
        );

        let doc_id = pipeline
            .ingest("alice", pdf_buffer("report.pdf"), None)
            .await
            .unwrap();

        let snapshot = store.snapshot();
        snapshot.check_invariants().unwrap();
        let docs = snapshot.user_documents("alice");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].doc_id, doc_id);
        let pages: Vec<u32> = docs[0].pages.iter().map(|p| p.page_no).collect();
        assert_eq!(pages, vec![1, 2, 3]);
        assert_eq!(snapshot.source_by_doc[&doc_id], "report.pdf");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_unsupported_mime_rejected_before_collaborators() {
        let dir = scratch("mime");
        let ocr = MockOcr::with_pages(&["one"]);
        let store = Arc::new(PersistentStore::open(dir.join("store.json")).unwrap());
        let ocr = Arc::new(ocr);
        let pipeline = IngestionPipeline::new(
            ocr.clone(),
            Arc::new(MockEmbedder { drop_one: false }),
            store.clone(),
            false,
        );

        let err = pipeline
            .ingest(
                "alice",
                DocumentSource::buffer("movie.mp4", vec![0, 1, 2, 3]),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DocSphereError::UnsupportedMediaType(_)));
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.snapshot().document_count(), 0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_plain_text_honors_policy_flag() {
        let dir = scratch("plain");
        let store = Arc::new(PersistentStore::open(dir.join("store.json")).unwrap());
        let strict = IngestionPipeline::new(
            Arc::new(MockOcr::with_pages(&["hello"])),
            Arc::new(MockEmbedder { drop_one: false }),
            store.clone(),
            false,
        );
        let err = strict
            .ingest("alice", DocumentSource::buffer("notes.txt", b"hi".to_vec()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DocSphereError::UnsupportedMediaType(_)));

        let lenient = IngestionPipeline::new(
            Arc::new(MockOcr::with_pages(&["hello"])),
            Arc::new(MockEmbedder { drop_one: false }),
            store,
            true,
        );
        lenient
            .ingest("alice", DocumentSource::buffer("notes.txt", b"hi".to_vec()), None)
            .await
            .unwrap();
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_embedding_count_mismatch_leaves_store_unchanged() {
        let dir = scratch("mismatch");
        let (pipeline, store) = pipeline(
            &dir,
            MockOcr::with_pages(&["one", "two"]),
            MockEmbedder { drop_one: true },
        );

        let err = pipeline
            .ingest("alice", pdf_buffer("report.pdf"), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DocSphereError::EmbeddingCountMismatch {
                expected: 2,
                actual: 1
            }
        ));
        assert_eq!(store.snapshot().document_count(), 0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_empty_extraction_is_not_an_error() {
        let dir = scratch("empty");
        let (pipeline, store) = pipeline(
            &dir,
            MockOcr::with_pages(&[]),
            MockEmbedder { drop_one: false },
        );

        let doc_id = pipeline
            .ingest("alice", pdf_buffer("blank.pdf"), None)
            .await
            .unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.user_documents("alice")[0].doc_id, doc_id);
        assert_eq!(snapshot.page_count(), 0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_reingest_creates_independent_document() {
        let dir = scratch("reingest");
        let (pipeline, store) = pipeline(
            &dir,
            MockOcr::with_pages(&["one"]),
            MockEmbedder { drop_one: false },
        );

        let first = pipeline
            .ingest("alice", pdf_buffer("same.pdf"), None)
            .await
            .unwrap();
        let second = pipeline
            .ingest("alice", pdf_buffer("same.pdf"), None)
            .await
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(store.snapshot().user_documents("alice").len(), 2);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_concurrent_ingests_lose_nothing() {
        let dir = scratch("concurrent");
        let (pipeline, store) = pipeline(
            &dir,
            MockOcr::with_pages(&["one"]),
            MockEmbedder { drop_one: false },
        );

        let (a, b) = tokio::join!(
            pipeline.ingest("alice", pdf_buffer("a.pdf"), None),
            pipeline.ingest("alice", pdf_buffer("b.pdf"), None),
        );
        a.unwrap();
        b.unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.user_documents("alice").len(), 2);
        snapshot.check_invariants().unwrap();

        // both survive a reload — neither full-store rewrite clobbered the other
        drop(store);
        let reopened = PersistentStore::open(dir.join("store.json")).unwrap();
        assert_eq!(reopened.snapshot().user_documents("alice").len(), 2);
        std::fs::remove_dir_all(&dir).ok();
    }
}
