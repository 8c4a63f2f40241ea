//! Expert endpoint client.
//!
//! The model backends are external collaborators: each is an opaque HTTP
//! capability that accepts a task-class-specific text payload and returns
//! generated text. This module owns the wire format and the prompt shaping
//! per model class; everything above it deals only in task text.

mod error;

pub use error::ExpertError;

use crate::registry::ModelClass;
use async_trait::async_trait;
use serde::Deserialize;

/// Shape raw task text into the payload an expert of this class expects.
///
/// Grammar experts take the text verbatim; instruction-tuned classes get a
/// short task prefix.
pub fn shape_prompt(model_class: ModelClass, text: &str) -> String {
    match model_class {
        ModelClass::Grammar100m | ModelClass::Search7b => text.to_string(),
        ModelClass::Email7b => format!("Write a professional email: {}", text),
        ModelClass::Summarize1b => format!("Summarize the following text: {}", text),
        ModelClass::Classify100m => format!("Classify the following text: {}", text),
        ModelClass::Format100m => format!("Reformat the following text: {}", text),
    }
}

/// Client seam for expert model endpoints.
///
/// Object-safe so the dispatcher can hold `Arc<dyn ExpertClient>` and tests
/// can substitute a scripted double without HTTP.
#[async_trait]
pub trait ExpertClient: Send + Sync + 'static {
    /// Run one inference against the endpoint at `base_url`.
    ///
    /// The caller bounds the attempt with its own timeout; implementations
    /// should not retry internally — failover is the dispatcher's job.
    async fn generate(
        &self,
        model_class: ModelClass,
        base_url: &str,
        text: &str,
    ) -> Result<String, ExpertError>;
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

/// HTTP implementation speaking the inference-API wire format:
/// `POST {base_url}` with `{"inputs": prompt}`, response
/// `[{"generated_text": …}]`.
pub struct HttpExpertClient {
    client: reqwest::Client,
}

impl HttpExpertClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Build on an existing client (shared connection pool).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpExpertClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExpertClient for HttpExpertClient {
    async fn generate(
        &self,
        model_class: ModelClass,
        base_url: &str,
        text: &str,
    ) -> Result<String, ExpertError> {
        let prompt = shape_prompt(model_class, text);

        let response = self
            .client
            .post(base_url)
            .json(&serde_json::json!({ "inputs": prompt }))
            .send()
            .await
            .map_err(|e| ExpertError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExpertError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: Vec<GeneratedText> = response
            .json()
            .await
            .map_err(|e| ExpertError::InvalidResponse(e.to_string()))?;

        body.into_iter()
            .next()
            .map(|g| g.generated_text)
            .ok_or_else(|| ExpertError::InvalidResponse("empty generation list".to_string()))
    }
}
