//! Media-type resolution and the upload allow-list.
//!
//! Resolution order: explicit caller hint, then filename extension, then
//! content sniffing. OOXML containers all share the ZIP magic, so buffers
//! without a filename cannot be told apart by sniffing alone.

use docsphere_core::error::{DocSphereError, Result};

pub const PDF: &str = "application/pdf";
pub const PNG: &str = "image/png";
pub const JPEG: &str = "image/jpeg";
pub const TIFF: &str = "image/tiff";
pub const PLAIN_TEXT: &str = "text/plain";
pub const DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PPTX: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const XLSX: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const SUPPORTED: &[&str] = &[PDF, PNG, JPEG, TIFF, DOCX, PPTX, XLSX];

/// Reject anything outside the allow-list. Plain text is a deployment
/// policy choice, off unless enabled in config.
pub fn ensure_supported(mime: &str, accept_plain_text: bool) -> Result<()> {
    if SUPPORTED.contains(&mime) || (accept_plain_text && mime == PLAIN_TEXT) {
        Ok(())
    } else {
        Err(DocSphereError::UnsupportedMediaType(mime.to_string()))
    }
}

/// Determine the media type from hint, filename, or content.
pub fn resolve(hint: Option<&str>, file_name: Option<&str>, bytes: &[u8]) -> Option<String> {
    if let Some(h) = hint {
        return Some(h.to_string());
    }
    if let Some(name) = file_name {
        if let Some(m) = from_extension(name) {
            return Some(m.to_string());
        }
    }
    sniff(bytes).map(str::to_string)
}

/// Guess from the filename extension.
pub fn from_extension(name: &str) -> Option<&'static str> {
    let ext = name.rsplit('.').next()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(PDF),
        "png" => Some(PNG),
        "jpg" | "jpeg" => Some(JPEG),
        "tif" | "tiff" => Some(TIFF),
        "docx" => Some(DOCX),
        "pptx" => Some(PPTX),
        "xlsx" => Some(XLSX),
        "txt" => Some(PLAIN_TEXT),
        _ => None,
    }
}

/// Sniff from leading magic bytes.
pub fn sniff(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"%PDF-") {
        Some(PDF)
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some(PNG)
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(JPEG)
    } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
        Some(TIFF)
    } else {
        // ZIP magic covers docx/pptx/xlsx; without a filename the exact
        // OOXML flavor is unknowable, so sniffing stays inconclusive.
        None
    }
}
