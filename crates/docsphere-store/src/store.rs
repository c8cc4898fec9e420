//! The in-memory store: per-user document collections and the
//! docId → source-location index.

use std::collections::{HashMap, HashSet};

use docsphere_core::error::{DocSphereError, Result};
use docsphere_core::types::Document;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The full collection of all users' documents.
///
/// Invariants:
/// - every docId under `documents_by_user` has exactly one entry in
///   `source_by_doc`
/// - docIds are unique across the entire store, not just per user
/// - within a document, page numbers are exactly `1..=pages.len()`
/// - every embedding has the same dimension
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Store {
    /// Append-only per user; insertion order is ingestion order.
    pub documents_by_user: HashMap<String, Vec<Document>>,
    /// Resolves a docId back to the location its source is retrievable from.
    pub source_by_doc: HashMap<Uuid, String>,
}

impl Store {
    /// Documents owned by a user, in ingestion order. Unknown users own
    /// nothing — not an error.
    pub fn user_documents(&self, user_id: &str) -> &[Document] {
        self.documents_by_user
            .get(user_id)
            .map(|docs| docs.as_slice())
            .unwrap_or(&[])
    }

    /// Total documents across all users.
    pub fn document_count(&self) -> usize {
        self.documents_by_user.values().map(|d| d.len()).sum()
    }

    /// Total pages across all users.
    pub fn page_count(&self) -> usize {
        self.documents_by_user
            .values()
            .flat_map(|docs| docs.iter())
            .map(|d| d.pages.len())
            .sum()
    }

    /// The embedding dimension of the stored pages, if any page exists.
    pub fn dimension(&self) -> Option<usize> {
        self.documents_by_user
            .values()
            .flat_map(|docs| docs.iter())
            .flat_map(|d| d.pages.iter())
            .map(|p| p.embedding.len())
            .next()
    }

    /// Append one document, enforcing store invariants against the new
    /// entry. The caller owns durability; this only mutates memory.
    pub(crate) fn append_document(&mut self, doc: Document) -> Result<()> {
        if self.source_by_doc.contains_key(&doc.doc_id) {
            return Err(DocSphereError::StoreCorrupt(format!(
                "duplicate docId {}",
                doc.doc_id
            )));
        }
        for (i, page) in doc.pages.iter().enumerate() {
            if page.page_no as usize != i + 1 {
                return Err(DocSphereError::StoreCorrupt(format!(
                    "document {} has page number {} at position {}",
                    doc.doc_id,
                    page.page_no,
                    i + 1
                )));
            }
        }
        if let Some(dims) = self.dimension() {
            if let Some(bad) = doc.pages.iter().find(|p| p.embedding.len() != dims) {
                return Err(DocSphereError::StoreCorrupt(format!(
                    "embedding dimension {} does not match store dimension {dims}",
                    bad.embedding.len()
                )));
            }
        }

        self.source_by_doc
            .insert(doc.doc_id, doc.source_location.clone());
        self.documents_by_user
            .entry(doc.owner_user_id.clone())
            .or_default()
            .push(doc);
        Ok(())
    }

    /// Verify every store invariant. Run after loading from disk; any
    /// violation means the durable image is corrupt.
    pub fn check_invariants(&self) -> Result<()> {
        let mut seen: HashSet<Uuid> = HashSet::new();
        let mut dims: Option<usize> = None;

        for docs in self.documents_by_user.values() {
            for doc in docs {
                if !seen.insert(doc.doc_id) {
                    return Err(DocSphereError::StoreCorrupt(format!(
                        "docId {} appears more than once",
                        doc.doc_id
                    )));
                }
                if !self.source_by_doc.contains_key(&doc.doc_id) {
                    return Err(DocSphereError::StoreCorrupt(format!(
                        "docId {} has no source-location entry",
                        doc.doc_id
                    )));
                }
                for (i, page) in doc.pages.iter().enumerate() {
                    if page.page_no as usize != i + 1 {
                        return Err(DocSphereError::StoreCorrupt(format!(
                            "document {} has non-contiguous page numbers",
                            doc.doc_id
                        )));
                    }
                    match dims {
                        None => dims = Some(page.embedding.len()),
                        Some(d) if d != page.embedding.len() => {
                            return Err(DocSphereError::StoreCorrupt(format!(
                                "inconsistent embedding dimensions: {} vs {d}",
                                page.embedding.len()
                            )));
                        }
                        Some(_) => {}
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use docsphere_core::types::Page;

    fn doc(user: &str, embeddings: &[Vec<f32>]) -> Document {
        Document {
            doc_id: Uuid::new_v4(),
            owner_user_id: user.to_string(),
            source_location: format!("/docs/{user}.pdf"),
            ingested_at: Utc::now(),
            pages: embeddings
                .iter()
                .enumerate()
                .map(|(i, e)| Page {
                    page_no: i as u32 + 1,
                    content: format!("page {}", i + 1),
                    embedding: e.clone(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_append_keeps_invariants() {
        let mut store = Store::default();
        store
            .append_document(doc("alice", &[vec![1.0, 0.0], vec![0.0, 1.0]]))
            .unwrap();
        store.append_document(doc("bob", &[vec![0.5, 0.5]])).unwrap();

        assert_eq!(store.document_count(), 2);
        assert_eq!(store.page_count(), 3);
        assert_eq!(store.dimension(), Some(2));
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_append_rejects_dimension_mismatch() {
        let mut store = Store::default();
        store
            .append_document(doc("alice", &[vec![1.0, 0.0]]))
            .unwrap();
        let err = store
            .append_document(doc("alice", &[vec![1.0, 0.0, 0.0]]))
            .unwrap_err();
        assert!(matches!(err, DocSphereError::StoreCorrupt(_)));
    }

    #[test]
    fn test_append_rejects_duplicate_doc_id() {
        let mut store = Store::default();
        let d = doc("alice", &[vec![1.0]]);
        let dup = d.clone();
        store.append_document(d).unwrap();
        let err = store.append_document(dup).unwrap_err();
        assert!(matches!(err, DocSphereError::StoreCorrupt(_)));
    }

    #[test]
    fn test_invariant_check_catches_missing_source() {
        let mut store = Store::default();
        let d = doc("alice", &[vec![1.0]]);
        let id = d.doc_id;
        store.append_document(d).unwrap();
        store.source_by_doc.remove(&id);
        assert!(store.check_invariants().is_err());
    }

    #[test]
    fn test_unknown_user_owns_nothing() {
        let store = Store::default();
        assert!(store.user_documents("nobody").is_empty());
    }
}
