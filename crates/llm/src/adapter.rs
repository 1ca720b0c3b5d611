//! Language model adapter
//!
//! Bridges the LlmBackend trait to the core LanguageModel trait.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use indic_commerce_core::{
    Error, FinishReason as CoreFinishReason, GenerateRequest, GenerateResponse, LanguageModel,
    Result,
};

use crate::backend::{FinishReason as BackendFinishReason, LlmBackend};

/// First `{ ... }` block in a reply, across lines
static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Adapter that wraps an LlmBackend to implement the core LanguageModel trait.
///
/// # Example
///
/// ```ignore
/// let backend = OpenAIBackend::new(OpenAIConfig::openai(key, "gpt-4o-mini"))?;
/// let classifier: Arc<dyn LanguageModel> = Arc::new(LanguageModelAdapter::new(backend));
/// ```
pub struct LanguageModelAdapter {
    backend: Arc<dyn LlmBackend>,
    model_name: String,
}

impl LanguageModelAdapter {
    pub fn new<B: LlmBackend + 'static>(backend: B) -> Self {
        let model_name = backend.model_name().to_string();
        Self {
            backend: Arc::new(backend),
            model_name,
        }
    }

    pub fn from_arc(backend: Arc<dyn LlmBackend>) -> Self {
        let model_name = backend.model_name().to_string();
        Self {
            backend,
            model_name,
        }
    }

    fn convert_finish_reason(reason: BackendFinishReason) -> CoreFinishReason {
        match reason {
            BackendFinishReason::Stop => CoreFinishReason::Stop,
            BackendFinishReason::Length => CoreFinishReason::Length,
            BackendFinishReason::ContentFilter => CoreFinishReason::ContentFilter,
        }
    }
}

/// Pull a JSON object out of a model reply
///
/// Some providers ignore JSON mode and wrap the object in a code fence or a
/// sentence; those replies are still usable.
pub fn extract_json_object(text: &str) -> Result<serde_json::Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if value.is_object() {
            return Ok(value);
        }
    }

    let candidate = JSON_OBJECT
        .find(trimmed)
        .map(|m| m.as_str())
        .ok_or_else(|| Error::InvalidResponse(format!("no JSON object in reply: {}", trimmed)))?;

    let value: serde_json::Value = serde_json::from_str(candidate)?;
    if !value.is_object() {
        return Err(Error::InvalidResponse(format!(
            "expected a JSON object, got: {}",
            value
        )));
    }
    Ok(value)
}

#[async_trait]
impl LanguageModel for LanguageModelAdapter {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        match self.backend.generate(&request).await {
            Ok(result) => Ok(GenerateResponse {
                text: result.text.trim().to_string(),
                finish_reason: Self::convert_finish_reason(result.finish_reason),
                tokens: Some(result.tokens as u32),
            }),
            Err(e) => Err(Error::from(e)),
        }
    }

    async fn classify(&self, request: GenerateRequest) -> Result<serde_json::Value> {
        let response = self.generate(request.with_json_mode()).await?;
        extract_json_object(&response.text)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
