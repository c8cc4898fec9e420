//! API route handlers for the gateway.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Query, State},
    http::StatusCode,
};
use docsphere_core::error::DocSphereError;
use docsphere_store::DocumentSource;
use serde::Deserialize;

use super::server::AppState;

/// Uploads without an explicit user land in a shared namespace.
const DEFAULT_USER: &str = "default";

/// Map a domain error to an HTTP status.
///
/// Client-side problems (bad upload) get 4xx; collaborator failures are
/// 502 because retrying may help; store corruption and broken invariants
/// are 500 — the operator must intervene.
fn status_for(err: &DocSphereError) -> StatusCode {
    match err {
        DocSphereError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        DocSphereError::OcrService(_)
        | DocSphereError::EmbeddingService(_)
        | DocSphereError::EmbeddingCountMismatch { .. }
        | DocSphereError::Completion(_)
        | DocSphereError::Http(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: DocSphereError) -> (StatusCode, Json<serde_json::Value>) {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!("❌ Request failed: {err}");
    }
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "docsphere-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

/// `POST /upload_document` — multipart form with a `file` part and an
/// optional `user` part naming the owner namespace.
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let mut user = DEFAULT_USER.to_string();
    let mut upload: Option<(String, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": format!("malformed multipart body: {e}") })),
        )
    })? {
        match field.name().unwrap_or("") {
            "user" => {
                user = field.text().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(serde_json::json!({ "error": format!("failed to read 'user' field: {e}") })),
                    )
                })?;
            }
            "file" => {
                let name = field
                    .file_name()
                    .unwrap_or("upload")
                    .to_string();
                let content_type = field.content_type().map(String::from);
                let data = field.bytes().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(serde_json::json!({ "error": format!("failed to read upload: {e}") })),
                    )
                })?;
                upload = Some((name, content_type, data.to_vec()));
            }
            _ => {}
        }
    }

    let Some((name, content_type, data)) = upload else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "missing 'file' field" })),
        ));
    };

    let doc_id = state
        .pipeline
        .ingest(
            &user,
            DocumentSource::buffer(name, data),
            content_type.as_deref(),
        )
        .await
        .map_err(error_response)?;

    Ok(Json(serde_json::json!({
        "status": "Document uploaded",
        "doc_id": doc_id,
        "user": user,
    })))
}

#[derive(Debug, Deserialize)]
pub struct AnswerQuery {
    pub question: String,
    #[serde(default = "default_k")]
    pub k: i64,
    #[serde(default = "default_user")]
    pub user: String,
}

fn default_k() -> i64 {
    docsphere_agent::DEFAULT_TOP_K as i64
}

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

/// Non-positive k means "retrieve nothing", not an error.
pub fn effective_k(k: i64) -> usize {
    k.max(0) as usize
}

/// `GET /get_answer?question=...&k=2&user=...`
pub async fn get_answer(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnswerQuery>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let answer = state
        .bot
        .answer(&params.user, &params.question, effective_k(params.k))
        .await
        .map_err(error_response)?;

    Ok(Json(serde_json::json!({
        "answer": answer.answer,
        "references": answer.references,
    })))
}
