//! # DocSphere Core
//!
//! Shared foundation for the DocSphere document Q&A service:
//! - **Config** — TOML configuration with per-section defaults
//! - **Errors** — the crate-wide error taxonomy
//! - **Types** — documents, pages, ranked results, answers
//! - **Traits** — the collaborator contracts (OCR, embeddings, completion)

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::DocSphereConfig;
pub use error::{DocSphereError, Result};
pub use traits::{CompletionModel, Embedder, OcrEngine};
pub use types::{Answer, Document, Page, RankedPage, Reference};
