//! DocSphere configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DocSphereConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl DocSphereConfig {
    /// Load config from the default path (~/.docsphere/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::DocSphereError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::error::DocSphereError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::DocSphereError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the DocSphere home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".docsphere")
    }
}

/// Embedding store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the persisted store blob.
    #[serde(default = "default_store_path")]
    pub path: String,
    /// Whether plain-text uploads are accepted alongside the document and
    /// image formats. Off by default.
    #[serde(default)]
    pub accept_plain_text: bool,
}

fn default_store_path() -> String { "~/.docsphere/store.json".into() }

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            accept_plain_text: false,
        }
    }
}

impl StoreConfig {
    /// Store path with a leading `~/` expanded to the home directory.
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(rest) = self.path.strip_prefix("~/") {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(rest)
        } else {
            PathBuf::from(&self.path)
        }
    }
}

/// OCR collaborator configuration (Google Document AI).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_ocr_location")]
    pub location: String,
    #[serde(default)]
    pub processor_id: String,
    /// Bearer token; falls back to the DOCAI_ACCESS_TOKEN env var.
    #[serde(default)]
    pub access_token: String,
}

fn default_ocr_location() -> String { "us".into() }

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            location: default_ocr_location(),
            processor_id: String::new(),
            access_token: String::new(),
        }
    }
}

/// Embedding collaborator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Fixed embedding dimension D for the process lifetime.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    /// Falls back to the OPENAI_API_KEY env var.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,
}

fn default_embedding_provider() -> String { "openai".into() }
fn default_embedding_model() -> String { "text-embedding-3-small".into() }
fn default_dimensions() -> usize { 1536 }
fn default_openai_endpoint() -> String { "https://api.openai.com/v1".into() }

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimensions: default_dimensions(),
            api_key: String::new(),
            endpoint: default_openai_endpoint(),
        }
    }
}

/// Completion collaborator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_completion_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Attempts before the client gives up (exponential backoff between).
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,
}

fn default_completion_model() -> String { "gpt-4".into() }
fn default_max_tokens() -> u32 { 512 }
fn default_retries() -> u32 { 3 }

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_completion_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            retries: default_retries(),
            api_key: String::new(),
            endpoint: default_openai_endpoint(),
        }
    }
}

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 { 3000 }
fn default_host() -> String { "127.0.0.1".into() }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}
