//! Intent classification contract
//!
//! The language model does the classifying; this module decides what its
//! answer means. Unknown intents and missing slots are coerced to defaults,
//! a malformed payload becomes a low-confidence product query, and only a
//! failed call yields [`Intent::Error`].

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use indic_commerce_config::constants::limits::MAX_CART_QUANTITY;
use indic_commerce_core::{CartAction, Error, Intent, Language, LanguageModel};
use indic_commerce_llm::prompt::classification_request;

use crate::bounded;
use crate::state::{CartSlots, Slots};

/// Result of classifying one query
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub intent: Intent,
    pub confidence: f32,
    pub slots: Slots,
    /// Why the call failed, for `Intent::Error`
    pub failure: Option<Error>,
}

impl Classification {
    /// The whole call failed; the query is kept as search terms for review
    pub fn failed(query: &str, error: Error) -> Self {
        Self {
            intent: Intent::Error,
            confidence: 0.0,
            slots: Slots::Search {
                terms: query.to_string(),
            },
            failure: Some(error),
        }
    }

    /// The call succeeded but its payload was unusable
    pub fn best_effort(query: &str) -> Self {
        Self {
            intent: Intent::ProductQuery,
            confidence: 0.0,
            slots: Slots::Search {
                terms: query.to_string(),
            },
            failure: None,
        }
    }
}

pub struct IntentClassifier {
    model: Arc<dyn LanguageModel>,
    timeout: Duration,
}

impl IntentClassifier {
    pub fn new(model: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// Classify a non-empty English query
    ///
    /// `language` is the shopper's language, passed to the model as a hint.
    pub async fn classify(&self, query: &str, language: Language) -> Classification {
        let request = classification_request(query, language);

        match bounded("classification", self.timeout, self.model.classify(request)).await {
            Ok(value) => {
                let classification = interpret_classification(&value, query);
                tracing::info!(
                    intent = %classification.intent,
                    confidence = classification.confidence,
                    model = self.model.model_name(),
                    "Classified query"
                );
                classification
            },
            Err(e) if e.is_malformed_payload() => {
                tracing::warn!(error = %e, "Malformed classifier payload, treating as product query");
                Classification::best_effort(query)
            },
            Err(e) => {
                tracing::warn!(error = %e, "Classification call failed");
                Classification::failed(query, e)
            },
        }
    }
}

/// Interpret a classifier JSON object
///
/// - `intent_type` outside the five recognized intents (or missing) falls
///   back to `product_query` with the confidence halved
/// - `confidence` defaults to 0.0 and is clamped to [0, 1]
/// - `search_terms` defaults to the query
/// - `cart_action` defaults to add, `quantity` to 1 and is capped at
///   [`MAX_CART_QUANTITY`]
pub fn interpret_classification(value: &Value, query: &str) -> Classification {
    let raw_intent = value.get("intent_type").and_then(Value::as_str);
    let mut confidence = read_confidence(value.get("confidence"));

    let intent = match raw_intent.and_then(Intent::parse_recognized) {
        Some(intent) => intent,
        None => {
            tracing::warn!(
                intent = raw_intent.unwrap_or("<missing>"),
                "Unrecognized intent from classifier, defaulting to product_query"
            );
            confidence /= 2.0;
            Intent::ProductQuery
        },
    };

    let slots = match intent {
        Intent::ProductQuery => Slots::Search {
            terms: read_string(value.get("search_terms")).unwrap_or_else(|| query.to_string()),
        },
        Intent::CartUpdate => Slots::Cart(CartSlots {
            product_id: read_string(value.get("product_id")),
            action: value
                .get("cart_action")
                .and_then(Value::as_str)
                .and_then(CartAction::parse)
                .unwrap_or_default(),
            quantity: read_quantity(value.get("quantity")),
        }),
        _ => Slots::None,
    };

    Classification {
        intent,
        confidence,
        slots,
        failure: None,
    }
}

fn read_confidence(value: Option<&Value>) -> f32 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if raw.is_finite() {
        raw.clamp(0.0, 1.0) as f32
    } else {
        0.0
    }
}

/// Non-empty trimmed string; numbers are accepted for ids
fn read_string(value: Option<&Value>) -> Option<String> {
    let text = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn read_quantity(value: Option<&Value>) -> u32 {
    let raw = match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 1.0).map(|f| f as u64)),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    raw.map(|q| q.clamp(1, u64::from(MAX_CART_QUANTITY)) as u32)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use indic_commerce_core::{GenerateRequest, GenerateResponse, Result};
    use serde_json::json;

    #[test]
    fn test_product_query() {
        let c = interpret_classification(
            &json!({"intent_type": "product_query", "confidence": 0.9, "search_terms": "running shoes"}),
            "Show me running shoes",
        );
        assert_eq!(c.intent, Intent::ProductQuery);
        assert!((c.confidence - 0.9).abs() < 1e-6);
        assert_eq!(c.slots, Slots::Search { terms: "running shoes".into() });
    }

    #[test]
    fn test_unrecognized_intent_is_marked_down() {
        let c = interpret_classification(
            &json!({"intent_type": "order_tracking", "confidence": 0.8}),
            "where is my order",
        );
        assert_eq!(c.intent, Intent::ProductQuery);
        assert!((c.confidence - 0.4).abs() < 1e-6);
        assert_eq!(c.slots, Slots::Search { terms: "where is my order".into() });

        let missing = interpret_classification(&json!({}), "hello");
        assert_eq!(missing.intent, Intent::ProductQuery);
        assert_eq!(missing.confidence, 0.0);
    }

    #[test]
    fn test_cart_defaults() {
        let c = interpret_classification(
            &json!({"intent_type": "cart_update", "confidence": 0.7, "product_id": "", "cart_action": ""}),
            "add this to my cart",
        );
        assert_eq!(
            c.slots,
            Slots::Cart(CartSlots {
                product_id: None,
                action: CartAction::Add,
                quantity: 1,
            })
        );

        let c = interpret_classification(
            &json!({"intent_type": "cart_update", "product_id": 4, "cart_action": "Remove", "quantity": "2"}),
            "remove two",
        );
        assert_eq!(
            c.slots,
            Slots::Cart(CartSlots {
                product_id: Some("4".into()),
                action: CartAction::Remove,
                quantity: 2,
            })
        );
    }

    #[test]
    fn test_confidence_and_quantity_coercion() {
        assert_eq!(read_confidence(Some(&json!(1.7))), 1.0);
        assert_eq!(read_confidence(Some(&json!(-3))), 0.0);
        assert!((read_confidence(Some(&json!("0.25"))) - 0.25).abs() < 1e-6);
        assert_eq!(read_confidence(Some(&json!(null))), 0.0);

        assert_eq!(read_quantity(Some(&json!(0))), 1);
        assert_eq!(read_quantity(Some(&json!(3.0))), 3);
        assert_eq!(read_quantity(Some(&json!("abc"))), 1);
        assert_eq!(read_quantity(None), 1);
        assert_eq!(read_quantity(Some(&json!(u64::MAX))), MAX_CART_QUANTITY);
        assert_eq!(read_quantity(Some(&json!("4294967295"))), MAX_CART_QUANTITY);
        assert_eq!(read_quantity(Some(&json!(1e30))), MAX_CART_QUANTITY);
    }

    #[test]
    fn test_other_intents_have_no_slots() {
        let c = interpret_classification(
            &json!({"intent_type": "initiate_payment", "confidence": 0.95, "search_terms": "x"}),
            "pay now",
        );
        assert_eq!(c.intent, Intent::InitiatePayment);
        assert_eq!(c.slots, Slots::None);
    }

    struct ScriptedModel {
        reply: Result<String>,
        delay: Duration,
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
            assert!(request.json_mode);
            tokio::time::sleep(self.delay).await;
            self.reply.clone().map(GenerateResponse::text)
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn classifier(reply: Result<String>, delay: Duration) -> IntentClassifier {
        IntentClassifier::new(
            Arc::new(ScriptedModel { reply, delay }),
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn test_malformed_payload_is_best_effort() {
        let c = classifier(Ok("not json at all".into()), Duration::ZERO)
            .classify("red saree", Language::Hindi)
            .await;
        assert_eq!(c, Classification::best_effort("red saree"));
    }

    #[tokio::test]
    async fn test_call_failure_is_error_outcome() {
        let c = classifier(Err(Error::Llm("503".into())), Duration::ZERO)
            .classify("red saree", Language::English)
            .await;
        assert_eq!(c.intent, Intent::Error);
        assert_eq!(c.slots, Slots::Search { terms: "red saree".into() });
        assert_eq!(c.failure, Some(Error::Llm("503".into())));
    }

    #[tokio::test]
    async fn test_timeout_is_error_outcome() {
        let c = classifier(Ok("{}".into()), Duration::from_millis(500))
            .classify("red saree", Language::English)
            .await;
        assert_eq!(c.intent, Intent::Error);
        assert!(c.failure.map(|e| e.is_timeout()).unwrap_or(false));
    }
}
