//! Orchestrator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{languages, timeouts};

/// How product replies are worded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductResponseMode {
    /// Fixed sentence built from the top candidate
    #[default]
    Template,
    /// Responder model with the candidates as context
    Llm,
}

/// Budget for each adapter call. A call that overruns its budget is
/// treated exactly like a failed call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_transcription_ms")]
    pub transcription_ms: u64,
    #[serde(default = "default_classification_ms")]
    pub classification_ms: u64,
    #[serde(default = "default_search_ms")]
    pub search_ms: u64,
    #[serde(default = "default_generation_ms")]
    pub generation_ms: u64,
    #[serde(default = "default_translation_ms")]
    pub translation_ms: u64,
    #[serde(default = "default_synthesis_ms")]
    pub synthesis_ms: u64,
    #[serde(default = "default_session_ms")]
    pub session_ms: u64,
}

fn default_transcription_ms() -> u64 {
    timeouts::TRANSCRIPTION_MS
}
fn default_classification_ms() -> u64 {
    timeouts::CLASSIFICATION_MS
}
fn default_search_ms() -> u64 {
    timeouts::SEARCH_MS
}
fn default_generation_ms() -> u64 {
    timeouts::GENERATION_MS
}
fn default_translation_ms() -> u64 {
    timeouts::TRANSLATION_MS
}
fn default_synthesis_ms() -> u64 {
    timeouts::SYNTHESIS_MS
}
fn default_session_ms() -> u64 {
    timeouts::SESSION_MS
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            transcription_ms: default_transcription_ms(),
            classification_ms: default_classification_ms(),
            search_ms: default_search_ms(),
            generation_ms: default_generation_ms(),
            translation_ms: default_translation_ms(),
            synthesis_ms: default_synthesis_ms(),
            session_ms: default_session_ms(),
        }
    }
}

impl TimeoutConfig {
    pub fn transcription(&self) -> Duration {
        Duration::from_millis(self.transcription_ms)
    }
    pub fn classification(&self) -> Duration {
        Duration::from_millis(self.classification_ms)
    }
    pub fn search(&self) -> Duration {
        Duration::from_millis(self.search_ms)
    }
    pub fn generation(&self) -> Duration {
        Duration::from_millis(self.generation_ms)
    }
    pub fn translation(&self) -> Duration {
        Duration::from_millis(self.translation_ms)
    }
    pub fn synthesis(&self) -> Duration {
        Duration::from_millis(self.synthesis_ms)
    }
    pub fn session(&self) -> Duration {
        Duration::from_millis(self.session_ms)
    }

    /// All budgets with their field names, for validation
    pub(crate) fn entries(&self) -> [(&'static str, u64); 7] {
        [
            ("transcription_ms", self.transcription_ms),
            ("classification_ms", self.classification_ms),
            ("search_ms", self.search_ms),
            ("generation_ms", self.generation_ms),
            ("translation_ms", self.translation_ms),
            ("synthesis_ms", self.synthesis_ms),
            ("session_ms", self.session_ms),
        ]
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Products requested from the index per search
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    #[serde(default)]
    pub product_response: ProductResponseMode,

    /// Language the core reasons in
    #[serde(default = "default_working_language")]
    pub working_language: String,

    /// Shopper language when neither the channel nor the session knows it
    #[serde(default = "default_shopper_language")]
    pub default_language: String,

    /// History turns included in responder prompts
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,

    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

fn default_search_limit() -> usize {
    3
}
fn default_working_language() -> String {
    languages::WORKING_LANGUAGE.to_string()
}
fn default_shopper_language() -> String {
    languages::DEFAULT_SHOPPER_LANGUAGE.to_string()
}
fn default_max_history_turns() -> usize {
    6
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            search_limit: default_search_limit(),
            product_response: ProductResponseMode::default(),
            working_language: default_working_language(),
            default_language: default_shopper_language(),
            max_history_turns: default_max_history_turns(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.search_limit, 3);
        assert_eq!(config.product_response, ProductResponseMode::Template);
        assert_eq!(config.working_language, "en-IN");
        assert_eq!(config.timeouts.search(), Duration::from_millis(2_000));
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"product_response":"llm","timeouts":{"search_ms":500}}"#)
                .unwrap();
        assert_eq!(config.product_response, ProductResponseMode::Llm);
        assert_eq!(config.timeouts.search_ms, 500);
        assert_eq!(config.timeouts.classification_ms, timeouts::CLASSIFICATION_MS);
        assert_eq!(config.search_limit, 3);
    }
}
