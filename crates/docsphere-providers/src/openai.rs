//! OpenAI-compatible embedding and chat-completion clients.
//!
//! Both talk the standard OpenAI wire format, so any compatible endpoint
//! works by overriding `endpoint` in config. The completion client retries
//! with exponential backoff; the embedding client does not — ingestion
//! failures surface immediately and the store stays unchanged.

use async_trait::async_trait;
use docsphere_core::config::{CompletionConfig, EmbeddingConfig};
use docsphere_core::error::{DocSphereError, Result};
use docsphere_core::traits::{CompletionModel, Embedder};
use serde_json::{Value, json};

fn resolve_api_key(configured: &str) -> String {
    if !configured.is_empty() {
        configured.to_string()
    } else {
        std::env::var("OPENAI_API_KEY").unwrap_or_default()
    }
}

/// OpenAI `/embeddings` client. Every vector it returns has the configured
/// fixed dimension for the process lifetime.
pub struct OpenAiEmbedder {
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
    client: reqwest::Client,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = resolve_api_key(&config.api_key);
        if api_key.is_empty() {
            return Err(DocSphereError::Config(
                "embedding API key missing (set embedding.api_key or OPENAI_API_KEY)".into(),
            ));
        }
        Ok(Self {
            api_key,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
            client: reqwest::Client::new(),
        })
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "input": input,
        });

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| DocSphereError::Http(format!("embeddings connection failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(DocSphereError::EmbeddingService(format!(
                "API error {status}: {text}"
            )));
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| DocSphereError::Http(e.to_string()))?;

        let mut rows: Vec<(usize, Vec<f32>)> = payload["data"]
            .as_array()
            .ok_or_else(|| DocSphereError::EmbeddingService("no data in response".into()))?
            .iter()
            .map(|entry| {
                let index = entry["index"].as_u64().unwrap_or(0) as usize;
                let vector: Vec<f32> = entry["embedding"]
                    .as_array()
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|v| v.as_f64())
                            .map(|v| v as f32)
                            .collect()
                    })
                    .unwrap_or_default();
                (index, vector)
            })
            .collect();
        // the API tags each row with its input index; re-sort to be safe
        rows.sort_by_key(|(index, _)| *index);
        let vectors: Vec<Vec<f32>> = rows.into_iter().map(|(_, v)| v).collect();

        for vector in &vectors {
            if vector.len() != self.dimensions {
                return Err(DocSphereError::EmbeddingService(format!(
                    "expected {}-dimensional vectors, got {}",
                    self.dimensions,
                    vector.len()
                )));
            }
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn name(&self) -> &str {
        "openai"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| DocSphereError::EmbeddingService("empty embedding response".into()))
    }
}

/// OpenAI chat-completion client with retry.
pub struct OpenAiCompletion {
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    retries: u32,
    client: reqwest::Client,
}

impl OpenAiCompletion {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = resolve_api_key(&config.api_key);
        if api_key.is_empty() {
            return Err(DocSphereError::Config(
                "completion API key missing (set completion.api_key or OPENAI_API_KEY)".into(),
            ));
        }
        Ok(Self {
            api_key,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            retries: config.retries.max(1),
            client: reqwest::Client::new(),
        })
    }

    async fn attempt(&self, body: &Value) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| DocSphereError::Http(format!("completion connection failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(DocSphereError::Completion(format!(
                "API error {status}: {text}"
            )));
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| DocSphereError::Http(e.to_string()))?;
        payload["choices"]
            .get(0)
            .and_then(|choice| choice["message"]["content"].as_str())
            .map(String::from)
            .ok_or_else(|| DocSphereError::Completion("no choices in response".into()))
    }
}

#[async_trait]
impl CompletionModel for OpenAiCompletion {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
        });

        let mut last_err = None;
        for attempt in 0..self.retries {
            match self.attempt(&body).await {
                Ok(answer) => return Ok(answer),
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Completion attempt {}/{} failed: {e}",
                        attempt + 1,
                        self.retries
                    );
                    last_err = Some(e);
                    if attempt + 1 < self.retries {
                        // 1s, 2s, 4s, ...
                        tokio::time::sleep(std::time::Duration::from_secs(1u64 << attempt)).await;
                    }
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| DocSphereError::Completion("no attempts executed".into())))
    }
}
