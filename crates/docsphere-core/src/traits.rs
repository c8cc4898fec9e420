//! Collaborator contracts consumed by the core.
//!
//! These are the only seams to out-of-process services. Implementations may
//! block on network I/O; callers never hold a store-wide lock across them.

use async_trait::async_trait;

use crate::error::Result;

/// Text extraction from raw document bytes.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Extract page texts in page order. An empty result is legal — a
    /// document with no extractable text is not an error.
    async fn extract_pages(&self, raw: &[u8], mime_type: &str) -> Result<Vec<String>>;
}

/// Embedding generation. All vectors returned by one implementation have
/// the same fixed dimension for the process lifetime.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// The fixed embedding dimension D.
    fn dimensions(&self) -> usize;

    /// Embed a batch of texts, preserving input order. The output length
    /// must equal the input length; callers enforce this explicitly.
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text (query path).
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>>;
}

/// Answer synthesis — a consumer of ranked results, not a dependency of the
/// retrieval core. Owns its own retry policy.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    fn name(&self) -> &str;

    /// Run one chat completion with a system and a user prompt.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}
