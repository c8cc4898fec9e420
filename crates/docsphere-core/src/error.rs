//! DocSphere error taxonomy.
//!
//! Collaborator and persistence failures surface to the caller as typed
//! variants; no retry happens at this layer. Retry policy, if any, belongs
//! to the collaborator client that owns it.

use thiserror::Error;
use uuid::Uuid;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, DocSphereError>;

/// All errors produced by DocSphere components.
#[derive(Error, Debug)]
pub enum DocSphereError {
    /// Rejected MIME type — user-correctable, never retried.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// The embedding collaborator returned a different number of vectors
    /// than the number of page texts it was given.
    #[error("embedding count mismatch: {expected} page(s) but {actual} embedding(s)")]
    EmbeddingCountMismatch { expected: usize, actual: usize },

    /// Embedding collaborator failure.
    #[error("embedding service: {0}")]
    EmbeddingService(String),

    /// OCR collaborator failure.
    #[error("OCR service: {0}")]
    OcrService(String),

    /// Completion collaborator failure (after its own retry policy gave up).
    #[error("completion service: {0}")]
    Completion(String),

    /// Durable write failed — the in-memory store was rolled back.
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// The backing store file exists but cannot be deserialized, or its
    /// contents violate a store invariant. Fatal at startup.
    #[error("store corrupt: {0}")]
    StoreCorrupt(String),

    /// A ranked candidate's docId has no source-location entry. Indicates a
    /// broken store invariant; never silently masked.
    #[error("dangling document reference: {0}")]
    DanglingReference(Uuid),

    /// Configuration error.
    #[error("config: {0}")]
    Config(String),

    /// Transport-level HTTP failure.
    #[error("HTTP: {0}")]
    Http(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
