//! Ranked retrieval over a user's pages.
//!
//! Exact linear scan — O(N·D) per query over the user's page count, no
//! index structure. Callers needing sub-linear latency at scale must layer
//! an index on top; this engine guarantees exactness only.

use std::sync::Arc;

use docsphere_core::error::{DocSphereError, Result};
use docsphere_core::traits::Embedder;
use docsphere_core::types::{Page, RankedPage};
use uuid::Uuid;

use crate::persist::PersistentStore;
use crate::store::Store;

/// Cosine similarity between two equal-length vectors.
///
/// A zero-magnitude vector makes the raw formula undefined; the policy
/// here is zero similarity, so ranking never propagates NaN from a
/// degenerate stored embedding.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = (norm_a * norm_b).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    dot / denominator
}

/// Euclidean distance between two equal-length vectors.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

struct Candidate<'a> {
    similarity: f32,
    distance: f32,
    doc_id: Uuid,
    page: &'a Page,
}

/// Read-only ranking over the shared store.
pub struct QueryEngine {
    embedder: Arc<dyn Embedder>,
    store: Arc<PersistentStore>,
}

impl QueryEngine {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<PersistentStore>) -> Self {
        Self { embedder, store }
    }

    /// Plain ranking: cosine similarity descending.
    pub async fn rank_by_cosine(
        &self,
        user_id: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<RankedPage>> {
        let query_embedding = self.embedder.embed_one(query).await?;
        let snapshot = self.store.snapshot();
        rank_by_cosine_in(&snapshot, user_id, &query_embedding, k)
    }

    /// Production ranking: cosine similarity descending, ties broken by
    /// Euclidean distance ascending.
    pub async fn rank_hybrid(
        &self,
        user_id: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<RankedPage>> {
        let query_embedding = self.embedder.embed_one(query).await?;
        let snapshot = self.store.snapshot();
        rank_hybrid_in(&snapshot, user_id, &query_embedding, k)
    }
}

/// Rank against a pre-computed query embedding, cosine only.
pub fn rank_by_cosine_in(
    store: &Store,
    user_id: &str,
    query_embedding: &[f32],
    k: usize,
) -> Result<Vec<RankedPage>> {
    let mut candidates = scan(store, user_id, query_embedding, false);
    candidates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    candidates.truncate(k);
    resolve(store, candidates)
}

/// Rank against a pre-computed query embedding, hybrid order.
pub fn rank_hybrid_in(
    store: &Store,
    user_id: &str,
    query_embedding: &[f32],
    k: usize,
) -> Result<Vec<RankedPage>> {
    let mut candidates = scan(store, user_id, query_embedding, true);
    // Stable sort: ties on both keys keep original scan order, so the
    // result is deterministic for a given store state and query.
    candidates.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then(a.distance.total_cmp(&b.distance))
    });
    candidates.truncate(k);
    resolve(store, candidates)
}

fn scan<'a>(
    store: &'a Store,
    user_id: &str,
    query_embedding: &[f32],
    with_distance: bool,
) -> Vec<Candidate<'a>> {
    let mut candidates = Vec::new();
    for doc in store.user_documents(user_id) {
        for page in &doc.pages {
            candidates.push(Candidate {
                similarity: cosine_similarity(query_embedding, &page.embedding),
                distance: if with_distance {
                    euclidean_distance(query_embedding, &page.embedding)
                } else {
                    0.0
                },
                doc_id: doc.doc_id,
                page,
            });
        }
    }
    candidates
}

/// Materialize ranked candidates, resolving each docId back to its source
/// location. A missing entry is a broken invariant and fails the whole
/// query rather than being silently dropped.
fn resolve(store: &Store, candidates: Vec<Candidate<'_>>) -> Result<Vec<RankedPage>> {
    candidates
        .into_iter()
        .map(|c| {
            let source = store
                .source_by_doc
                .get(&c.doc_id)
                .ok_or(DocSphereError::DanglingReference(c.doc_id))?;
            Ok(RankedPage {
                source_location: source.clone(),
                page_no: c.page.page_no,
                content: c.page.content.clone(),
                similarity: c.similarity,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use docsphere_core::types::Document;

    fn store_with(user: &str, page_embeddings: &[Vec<f32>]) -> (Store, Uuid) {
        let mut store = Store::default();
        let doc = Document {
            doc_id: Uuid::new_v4(),
            owner_user_id: user.to_string(),
            source_location: format!("/docs/{user}.pdf"),
            ingested_at: Utc::now(),
            pages: page_embeddings
                .iter()
                .enumerate()
                .map(|(i, e)| Page {
                    page_no: i as u32 + 1,
                    content: format!("page {}", i + 1),
                    embedding: e.clone(),
                })
                .collect(),
        };
        let id = doc.doc_id;
        store.append_document(doc).unwrap();
        (store, id)
    }

    #[test]
    fn test_cosine_symmetry_and_self_similarity() {
        let a = vec![0.3, -1.2, 2.5];
        let b = vec![1.0, 0.4, -0.7];
        assert!((cosine_similarity(&a, &b) - cosine_similarity(&b, &a)).abs() < 1e-6);
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_magnitude_policy() {
        let zero = vec![0.0, 0.0, 0.0];
        let a = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &a), 0.0);
        assert_eq!(cosine_similarity(&a, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn test_euclidean_distance() {
        let a = vec![0.0, 0.0];
        let b = vec![3.0, 4.0];
        assert!((euclidean_distance(&a, &b) - 5.0).abs() < 1e-6);
        assert_eq!(euclidean_distance(&a, &a), 0.0);
    }

    #[test]
    fn test_exact_match_ranks_first_with_similarity_one() {
        let e1 = vec![1.0, 0.0, 0.0];
        let e2 = vec![0.0, 1.0, 0.0];
        let e3 = vec![0.0, 0.0, 1.0];
        let (store, _) = store_with("userA", &[e1, e2.clone(), e3]);

        let results = rank_hybrid_in(&store, "userA", &e2, 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].page_no, 2);
        assert!((results[0].similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_equal_cosine_breaks_tie_by_euclidean() {
        // both pages point the same direction as the query, but the longer
        // vector is Euclidean-farther
        let near = vec![1.0, 1.0];
        let far = vec![10.0, 10.0];
        let query = vec![1.0, 1.0];
        let (store, _) = store_with("userA", &[far.clone(), near.clone()]);

        let sim_far = cosine_similarity(&query, &far);
        let sim_near = cosine_similarity(&query, &near);
        assert!((sim_far - sim_near).abs() < 1e-6);

        let results = rank_hybrid_in(&store, "userA", &query, 2).unwrap();
        assert_eq!(results[0].page_no, 2); // the near one wins
        assert_eq!(results[1].page_no, 1);
    }

    #[test]
    fn test_hybrid_refines_cosine_order() {
        let (store, _) = store_with(
            "userA",
            &[
                vec![1.0, 0.0],
                vec![0.9, 0.1],
                vec![0.0, 1.0],
                vec![-1.0, 0.0],
            ],
        );
        let query = vec![1.0, 0.0];
        let plain = rank_by_cosine_in(&store, "userA", &query, 4).unwrap();
        let hybrid = rank_hybrid_in(&store, "userA", &query, 4).unwrap();

        // where similarities differ, the relative order agrees
        for i in 0..plain.len() - 1 {
            assert!(plain[i].similarity >= plain[i + 1].similarity);
            assert!(hybrid[i].similarity >= hybrid[i + 1].similarity);
        }
        let plain_pages: Vec<u32> = plain.iter().map(|r| r.page_no).collect();
        let hybrid_pages: Vec<u32> = hybrid.iter().map(|r| r.page_no).collect();
        assert_eq!(plain_pages, hybrid_pages);
    }

    #[test]
    fn test_k_larger_than_pages_returns_all_ranked() {
        let (store, _) = store_with("userA", &[vec![1.0, 0.0], vec![0.0, 1.0]]);
        let results = rank_hybrid_in(&store, "userA", &[1.0, 0.0], 100).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].similarity >= results[1].similarity);
    }

    #[test]
    fn test_k_zero_returns_empty() {
        let (store, _) = store_with("userA", &[vec![1.0, 0.0]]);
        assert!(rank_hybrid_in(&store, "userA", &[1.0, 0.0], 0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unknown_user_returns_empty_not_error() {
        let (store, _) = store_with("userA", &[vec![1.0, 0.0]]);
        let results = rank_hybrid_in(&store, "ghost", &[1.0, 0.0], 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_dangling_reference_fails_loudly() {
        let (mut store, id) = store_with("userA", &[vec![1.0, 0.0]]);
        store.source_by_doc.remove(&id);
        let err = rank_hybrid_in(&store, "userA", &[1.0, 0.0], 1).unwrap_err();
        assert!(matches!(err, DocSphereError::DanglingReference(d) if d == id));
    }

    #[test]
    fn test_result_resolves_source_location() {
        let (store, _) = store_with("userA", &[vec![1.0, 0.0]]);
        let results = rank_by_cosine_in(&store, "userA", &[1.0, 0.0], 1).unwrap();
        assert_eq!(results[0].source_location, "/docs/userA.pdf");
        assert_eq!(results[0].content, "page 1");
    }
}
