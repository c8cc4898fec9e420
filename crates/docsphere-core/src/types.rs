//! Data model entities shared across DocSphere crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One unit of extracted text plus its embedding within a document.
///
/// `page_no` is 1-indexed and contiguous within its document. Every
/// embedding in the store has the same fixed dimension, determined by the
/// embedding collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub page_no: u32,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// An ingested document: the OCR'd pages of one uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Globally unique, assigned once at ingestion and never reused.
    pub doc_id: Uuid,
    /// Opaque namespacing identifier; no auth semantics attached.
    pub owner_user_id: String,
    /// Path or URL the original file is retrievable from.
    pub source_location: String,
    pub ingested_at: DateTime<Utc>,
    pub pages: Vec<Page>,
}

/// One ranked retrieval result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPage {
    /// Resolved from the store's docId → source index.
    pub source_location: String,
    /// 1-indexed page number within the source document.
    pub page_no: u32,
    pub content: String,
    /// Cosine similarity against the query embedding.
    pub similarity: f32,
}

/// A citation entry accompanying a synthesized answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    pub link: String,
    pub page_no: u32,
}

/// A synthesized answer with its supporting references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub references: Vec<Reference>,
}

impl RankedPage {
    /// Derive the citation entry for this result.
    pub fn reference(&self) -> Reference {
        Reference {
            link: self.source_location.clone(),
            page_no: self.page_no,
        }
    }
}
