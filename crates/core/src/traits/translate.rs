//! Text translation trait

use crate::{Language, Result};
use async_trait::async_trait;

/// Translator for Indian languages
///
/// Implementations:
/// - `SarvamTranslator` - Sarvam `translate` endpoint
#[async_trait]
pub trait Translator: Send + Sync + 'static {
    /// Translate text between languages
    async fn translate(&self, text: &str, from: Language, to: Language) -> Result<String>;

    /// Check if translation pair is supported
    fn supports_pair(&self, from: Language, to: Language) -> bool {
        from != to
    }

    /// Get translator name for logging
    fn name(&self) -> &str;
}
