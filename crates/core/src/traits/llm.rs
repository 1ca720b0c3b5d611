//! Language Model traits

use async_trait::async_trait;

use crate::{Error, GenerateRequest, GenerateResponse, Result};

/// Language Model interface
///
/// Implementations:
/// - `LanguageModelAdapter` - wraps any OpenAI-compatible chat backend
///
/// # Example
///
/// ```ignore
/// let llm: Arc<dyn LanguageModel> = Arc::new(LanguageModelAdapter::new(backend));
/// let request = GenerateRequest::new("You are a shopping assistant")
///     .with_user_message("Do you deliver to Pune?");
/// let response = llm.generate(request).await?;
/// println!("{}", response.text);
/// ```
#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    /// Generate free text
    ///
    /// # Arguments
    /// * `request` - Generation request with messages, parameters
    ///
    /// # Returns
    /// Generated response with text and metadata
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;

    /// Generate a JSON object
    ///
    /// The default asks for JSON mode and parses the reply. A reply that is
    /// not a JSON object is reported as [`Error::InvalidResponse`] so callers
    /// can tell a malformed payload apart from a failed call.
    async fn classify(&self, request: GenerateRequest) -> Result<serde_json::Value> {
        let response = self.generate(request.with_json_mode()).await?;
        let value: serde_json::Value = serde_json::from_str(response.text.trim())?;
        if !value.is_object() {
            return Err(Error::InvalidResponse(format!(
                "expected a JSON object, got: {}",
                value
            )));
        }
        Ok(value)
    }

    /// Get model name for logging
    fn model_name(&self) -> &str;
}
