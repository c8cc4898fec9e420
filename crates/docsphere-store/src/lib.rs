//! # DocSphere Store
//!
//! The embedding store and ranked retrieval engine.
//!
//! ## Design
//! - **Store** — per-user, append-only document collections plus the
//!   docId → source-location index
//! - **PersistentStore** — full-collection JSON blob on disk, rewritten
//!   atomically (write temp, rename) after every mutation
//! - **IngestionPipeline** — MIME validation, OCR + embedding collaborator
//!   calls, append + persist as one serialized unit
//! - **QueryEngine** — exact linear-scan ranking: cosine similarity primary,
//!   Euclidean distance tie-break (hybrid)
//!
//! ## How it works
//! ```text
//! upload → OCR page texts → one embedding per page → Document appended
//!   ↓ persisted before ingest() returns
//! question → query embedding → scan user's pages → hybrid top-k
//!   ↓
//! context + references handed to answer synthesis
//! ```

pub mod ingest;
pub mod mime;
pub mod persist;
pub mod query;
pub mod store;

pub use ingest::{DocumentSource, IngestionPipeline};
pub use persist::PersistentStore;
pub use query::{QueryEngine, cosine_similarity, euclidean_distance};
pub use store::Store;
