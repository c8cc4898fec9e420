//! # DocSphere Gateway
//!
//! Thin HTTP surface over the ingestion pipeline and the Q&A bot:
//! - `POST /upload_document` — multipart upload, ingests for a user
//! - `GET  /get_answer` — question in, grounded answer + references out
//! - `GET  /health` — liveness probe
//!
//! The gateway holds no state of its own; everything lives in the shared
//! pipeline and bot.

pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
