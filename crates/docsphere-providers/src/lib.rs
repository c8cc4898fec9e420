//! # DocSphere Providers
//!
//! Collaborator client implementations:
//! - `DocumentAiOcr` — Google Document AI processor (text extraction)
//! - `OpenAiEmbedder` — OpenAI-compatible `/embeddings` endpoint
//! - `OpenAiCompletion` — OpenAI-compatible chat completions with a bounded
//!   exponential-backoff retry policy
//!
//! Retry lives here, in the clients that own it; the retrieval core never
//! retries on its own.

pub mod docai;
pub mod openai;

use std::sync::Arc;

use docsphere_core::config::DocSphereConfig;
use docsphere_core::error::{DocSphereError, Result};
use docsphere_core::traits::{CompletionModel, Embedder, OcrEngine};

/// Create the OCR collaborator from configuration.
pub fn create_ocr(config: &DocSphereConfig) -> Result<Arc<dyn OcrEngine>> {
    Ok(Arc::new(docai::DocumentAiOcr::new(&config.ocr)?))
}

/// Create the embedding collaborator from configuration.
pub fn create_embedder(config: &DocSphereConfig) -> Result<Arc<dyn Embedder>> {
    match config.embedding.provider.as_str() {
        "openai" => Ok(Arc::new(openai::OpenAiEmbedder::new(&config.embedding)?)),
        other => Err(DocSphereError::Config(format!(
            "unknown embedding provider: {other}"
        ))),
    }
}

/// Create the completion collaborator from configuration.
pub fn create_completion(config: &DocSphereConfig) -> Result<Arc<dyn CompletionModel>> {
    match config.completion.provider.as_str() {
        "openai" => Ok(Arc::new(openai::OpenAiCompletion::new(&config.completion)?)),
        other => Err(DocSphereError::Config(format!(
            "unknown completion provider: {other}"
        ))),
    }
}
