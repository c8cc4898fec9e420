//! Google Document AI OCR client.
//!
//! Sends the raw document inline (base64) to a configured processor and
//! reassembles per-page text from paragraph layout text anchors. Document AI
//! addresses text by offsets into the document-wide text blob; pages come
//! back in order and are kept that way.

use async_trait::async_trait;
use base64::Engine as _;
use docsphere_core::config::OcrConfig;
use docsphere_core::error::{DocSphereError, Result};
use docsphere_core::traits::OcrEngine;
use serde_json::{Value, json};

pub struct DocumentAiOcr {
    project_id: String,
    location: String,
    processor_id: String,
    access_token: String,
    client: reqwest::Client,
}

impl DocumentAiOcr {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        if config.project_id.is_empty() || config.processor_id.is_empty() {
            return Err(DocSphereError::Config(
                "OCR requires ocr.project_id and ocr.processor_id".into(),
            ));
        }
        let access_token = if !config.access_token.is_empty() {
            config.access_token.clone()
        } else {
            std::env::var("DOCAI_ACCESS_TOKEN").unwrap_or_default()
        };
        if access_token.is_empty() {
            return Err(DocSphereError::Config(
                "OCR access token missing (set ocr.access_token or DOCAI_ACCESS_TOKEN)".into(),
            ));
        }
        Ok(Self {
            project_id: config.project_id.clone(),
            location: config.location.clone(),
            processor_id: config.processor_id.clone(),
            access_token,
            client: reqwest::Client::new(),
        })
    }

    fn process_url(&self) -> String {
        format!(
            "https://{loc}-documentai.googleapis.com/v1/projects/{proj}/locations/{loc}/processors/{proc}:process",
            loc = self.location,
            proj = self.project_id,
            proc = self.processor_id,
        )
    }
}

/// Convert a layout's text anchor to a string by resolving its segment
/// offsets against the full document text. A segment spanning several lines
/// arrives as multiple text segments. Offsets are byte positions into the
/// UTF-8 text; a segment that is out of range or lands inside a multibyte
/// character is dropped rather than panicking on a bad response.
fn layout_to_text(layout: &Value, text: &str) -> String {
    let mut out = String::new();
    if let Some(segments) = layout["textAnchor"]["textSegments"].as_array() {
        for segment in segments {
            let start = index_field(&segment["startIndex"]);
            let end = index_field(&segment["endIndex"]);
            if start < end {
                if let Some(chunk) = text.get(start..end) {
                    out.push_str(chunk);
                }
            }
        }
    }
    out
}

/// Document AI encodes 64-bit offsets as JSON strings; tolerate both forms.
fn index_field(value: &Value) -> usize {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .unwrap_or(0) as usize
}

#[async_trait]
impl OcrEngine for DocumentAiOcr {
    fn name(&self) -> &str {
        "documentai"
    }

    async fn extract_pages(&self, raw: &[u8], mime_type: &str) -> Result<Vec<String>> {
        let body = json!({
            "rawDocument": {
                "content": base64::engine::general_purpose::STANDARD.encode(raw),
                "mimeType": mime_type,
            },
            "fieldMask": "text,pages.paragraphs,pages.pageNumber",
        });

        let resp = self
            .client
            .post(self.process_url())
            .header("Authorization", format!("Bearer {}", self.access_token))
            .json(&body)
            .send()
            .await
            .map_err(|e| DocSphereError::Http(format!("Document AI connection failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(DocSphereError::OcrService(format!(
                "API error {status}: {text}"
            )));
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| DocSphereError::Http(e.to_string()))?;
        let document = &payload["document"];
        let full_text = document["text"].as_str().unwrap_or("");

        let mut page_contents = Vec::new();
        if let Some(pages) = document["pages"].as_array() {
            for page in pages {
                let mut content = String::new();
                if let Some(paragraphs) = page["paragraphs"].as_array() {
                    for paragraph in paragraphs {
                        content.push_str(&layout_to_text(&paragraph["layout"], full_text));
                        content.push('\n');
                    }
                }
                page_contents.push(content.trim().to_string());
            }
        }

        tracing::debug!("🔍 Document AI extracted {} page(s)", page_contents.len());
        Ok(page_contents)
    }
}
