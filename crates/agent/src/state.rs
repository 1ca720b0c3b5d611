//! Per-run working state
//!
//! A `PipelineState` is created from one inbound message, owned by that run
//! alone and passed by value from step to step. Each step returns a new
//! state instead of mutating a shared one.

use indic_commerce_core::{Cart, CartAction, InboundMessage, Intent, Language, Product, UserSession};

/// Slots extracted by the classifier for a cart change
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartSlots {
    pub product_id: Option<String>,
    pub action: CartAction,
    pub quantity: u32,
}

/// Intent-specific slots
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Slots {
    #[default]
    None,
    Search {
        terms: String,
    },
    Cart(CartSlots),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineState {
    pub sender_id: String,
    pub is_audio: bool,
    pub user_language: Language,
    pub english_query: String,
    pub intent: Option<Intent>,
    pub confidence: f32,
    pub slots: Slots,
    pub candidate_products: Vec<Product>,
    pub llm_response_text: Option<String>,
    pub error_message: Option<String>,
    /// Session snapshot loaded at the start of the run
    pub session: UserSession,
}

impl PipelineState {
    pub fn new(message: &InboundMessage, user_language: Language) -> Self {
        Self {
            sender_id: message.sender_id().to_string(),
            is_audio: message.is_audio(),
            user_language,
            english_query: message.text_body().map(str::trim).unwrap_or_default().to_string(),
            intent: None,
            confidence: 0.0,
            slots: Slots::None,
            candidate_products: Vec::new(),
            llm_response_text: None,
            error_message: None,
            session: UserSession::default(),
        }
    }

    pub fn with_session(mut self, session: UserSession) -> Self {
        self.session = session;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.user_language = language;
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.english_query = query.into().trim().to_string();
        self
    }

    /// Record the classification. The intent is set once per run; a second
    /// classification is ignored.
    pub fn with_intent(mut self, intent: Intent, confidence: f32, slots: Slots) -> Self {
        if let Some(existing) = self.intent {
            tracing::warn!(
                existing = %existing,
                ignored = %intent,
                "Intent already set for this run"
            );
            return self;
        }
        self.intent = Some(intent);
        self.confidence = confidence;
        self.slots = slots;
        self
    }

    pub fn with_candidates(mut self, products: Vec<Product>) -> Self {
        self.candidate_products = products;
        self
    }

    pub fn with_reply(mut self, text: impl Into<String>) -> Self {
        self.llm_response_text = Some(text.into());
        self
    }

    pub fn with_cart(mut self, cart: Cart) -> Self {
        self.session.cart = cart;
        self
    }

    /// Record a failure; the first error wins
    pub fn with_error(mut self, error: impl ToString) -> Self {
        if self.error_message.is_none() {
            self.error_message = Some(error.to_string());
        }
        self
    }

    pub fn has_error(&self) -> bool {
        self.error_message.is_some()
    }

    /// Search terms from the classifier, falling back to the query itself
    pub fn search_terms(&self) -> &str {
        match &self.slots {
            Slots::Search { terms } if !terms.trim().is_empty() => terms,
            _ => &self.english_query,
        }
    }

    pub fn cart_slots(&self) -> Option<&CartSlots> {
        match &self.slots {
            Slots::Cart(slots) => Some(slots),
            _ => None,
        }
    }

    pub fn image_url(&self) -> Option<String> {
        self.candidate_products
            .first()
            .and_then(|product| product.image_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_state(body: &str) -> PipelineState {
        PipelineState::new(&InboundMessage::text("u1", body), Language::English)
    }

    #[test]
    fn test_new_from_text_trims() {
        let state = text_state("  Show me running shoes \n");
        assert_eq!(state.english_query, "Show me running shoes");
        assert!(!state.is_audio);
        assert!(state.intent.is_none());
    }

    #[test]
    fn test_intent_is_set_once() {
        let state = text_state("hi")
            .with_intent(Intent::GeneralInfo, 0.8, Slots::None)
            .with_intent(Intent::ProductQuery, 0.9, Slots::None);
        assert_eq!(state.intent, Some(Intent::GeneralInfo));
        assert_eq!(state.confidence, 0.8);
    }

    #[test]
    fn test_first_error_wins() {
        let state = text_state("hi").with_error("first").with_error("second");
        assert_eq!(state.error_message.as_deref(), Some("first"));
        assert!(state.has_error());
    }

    #[test]
    fn test_search_terms_fallback() {
        let state = text_state("blue jeans");
        assert_eq!(state.search_terms(), "blue jeans");

        let state = state.with_intent(
            Intent::ProductQuery,
            0.9,
            Slots::Search {
                terms: "denim jeans".into(),
            },
        );
        assert_eq!(state.search_terms(), "denim jeans");

        let blank = text_state("blue jeans").with_intent(
            Intent::ProductQuery,
            0.9,
            Slots::Search { terms: "  ".into() },
        );
        assert_eq!(blank.search_terms(), "blue jeans");
    }
}
