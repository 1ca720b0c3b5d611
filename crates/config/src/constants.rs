//! Centralized constants for the shopping assistant
//!
//! User-facing strings and provider defaults live here so the pipeline,
//! adapters and tests agree on them.

/// Fixed user-facing texts
pub mod messages {
    /// Sent whenever a run ends in the error handler
    pub const APOLOGY: &str =
        "Sorry, I encountered an error while processing your request. Please try again later.";

    /// Internal error recorded when there is nothing to classify
    pub const NO_QUERY_FOUND: &str = "No query found for intent identification";

    /// Product search came back empty
    pub const NO_MATCH: &str = "I'm sorry, but I couldn't find any products matching your request. \
         Could you please try describing what you're looking for differently?";

    pub const EMPTY_CART: &str =
        "Your cart is empty right now. Tell me what you're looking for and I'll help you find it.";

    pub const EMPTY_CART_CHECKOUT: &str =
        "Your cart is empty, so there is nothing to pay for yet. Add a product to your cart first and I'll send you a payment link.";
}

/// Languages
pub mod languages {
    /// Language the classifier, search and responder work in
    pub const WORKING_LANGUAGE: &str = "en-IN";

    /// Assumed shopper language when nothing better is known
    pub const DEFAULT_SHOPPER_LANGUAGE: &str = "en-IN";
}

/// Provider endpoints
pub mod endpoints {
    pub const OPENAI: &str = "https://api.openai.com/v1";
    pub const SARVAM_CHAT: &str = "https://api.sarvam.ai/v1";
    pub const SARVAM: &str = "https://api.sarvam.ai";
}

/// Default model names
pub mod models {
    pub const CLASSIFIER: &str = "gpt-4o-mini";
    pub const RESPONDER: &str = "sarvam-m";
    pub const SARVAM_STT_TRANSLATE: &str = "saaras:v2";
    pub const SARVAM_TTS: &str = "bulbul:v1";
    pub const SARVAM_SPEAKER: &str = "meera";
}

/// Provider limits
pub mod limits {
    /// Sarvam TTS rejects inputs longer than this
    pub const TTS_MAX_CHARS: usize = 500;

    /// Sarvam translate rejects inputs longer than this
    pub const TRANSLATE_MAX_CHARS: usize = 1000;

    /// Cap for the responder's reply
    pub const RESPONSE_MAX_CHARS: usize = 900;

    /// Most units of one product a single cart update may add or remove
    pub const MAX_CART_QUANTITY: u32 = 99;
}

/// Per-call budgets (milliseconds)
pub mod timeouts {
    pub const TRANSCRIPTION_MS: u64 = 30_000;
    pub const CLASSIFICATION_MS: u64 = 10_000;
    pub const SEARCH_MS: u64 = 2_000;
    pub const GENERATION_MS: u64 = 20_000;
    pub const TRANSLATION_MS: u64 = 10_000;
    pub const SYNTHESIS_MS: u64 = 30_000;
    pub const SESSION_MS: u64 = 2_000;
}
