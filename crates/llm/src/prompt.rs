//! Prompt building
//!
//! Constructs prompts for the shopping assistant: intent classification,
//! product recommendations, cart updates and store-policy questions.

use unicode_segmentation::UnicodeSegmentation;

use indic_commerce_config::constants::limits;
use indic_commerce_core::{
    Cart, CartUpdate, ConversationTurn, GenerateRequest, Language, Message, Product, Role,
    TurnRole,
};

/// System prompt for the intent classifier
pub fn classifier_system_prompt() -> String {
    "You are an intent classifier for an Indian e-commerce platform. \
Classify the query into one of these categories:\n\
1. product_query: User is searching for or asking about products to purchase\n\
2. summarize_cart: User wants a summary of all the products currently in their cart\n\
3. cart_update: User wants to add or remove products from their shopping cart\n\
4. initiate_payment: User wants to initiate payment for their order\n\
5. general_info: User is asking general questions about policies, availability, etc.\n\n\
Consider Indian e-commerce context like 'Cash on Delivery', Indian brands, and regional preferences."
        .to_string()
}

/// User prompt for the intent classifier
///
/// Non-English shoppers get a note naming their language so the model
/// still returns English search terms.
pub fn classifier_user_prompt(query: &str, language: Language) -> String {
    let lang_note = if language.is_english() {
        String::new()
    } else {
        format!(
            " The original query was in {} ({}).",
            language.name(),
            language.code()
        )
    };

    format!(
        "Query: {query}{lang_note}\n\n\
Classify this query into one of the 5 categories. Reply with JSON containing:\n\
- intent_type (string: 'product_query', 'summarize_cart', 'cart_update', 'initiate_payment', or 'general_info')\n\
- confidence (number between 0-1)\n\
- search_terms (string in English, relevant only for product_query)\n\
- product_id (string, relevant only for cart_update, empty string if not found)\n\
- cart_action (string, 'add' or 'remove', relevant only for cart_update, empty string if not applicable)\n\
- quantity (number, relevant only for cart_update, default to 1)"
    )
}

/// Build the complete classification request
pub fn classification_request(query: &str, language: Language) -> GenerateRequest {
    GenerateRequest::new(classifier_system_prompt())
        .with_user_message(classifier_user_prompt(query, language))
        .with_temperature(0.0)
        .with_json_mode()
}

/// System prompt for product recommendations
pub fn shopping_assistant_system_prompt() -> String {
    format!(
        "You are a helpful salesperson for IndicCommerce, an Indian online store. \
Answer questions about products and provide recommendations based only on the context provided. \
Do not make things up if you don't know the answer. Try to be helpful and upsell products when possible. \
Format all monetary values in Indian format (e.g., ₹1,00,000). \
Make sure to return no more than {} characters in your response.",
        limits::RESPONSE_MAX_CHARS
    )
}

/// Product context for the shopping assistant: candidates as JSON plus
/// the recent conversation and the current query
pub fn shopping_assistant_context(
    products: &[Product],
    history: &[ConversationTurn],
    query: &str,
) -> String {
    let products_json =
        serde_json::to_string_pretty(products).unwrap_or_else(|_| "[]".to_string());

    let mut prompt = format!(
        "Here are the details of the relevant products in json format:\n{}\n\nConversation History:\n",
        products_json
    );
    for turn in history {
        prompt.push_str(&format!("{}: {}\n", turn.role, turn.content));
    }
    prompt.push_str(&format!("user: {}\n", query));
    prompt
}

/// System prompt for cart updates
pub fn cart_system_prompt() -> String {
    "You are a helpful e-commerce assistant specialized in managing shopping carts for an Indian online store. \
Provide clear confirmation of cart updates with relevant details. \
If no product could be identified, ask the shopper which product they mean. \
Use a helpful, conversational tone and suggest related products when appropriate. \
Format all monetary values in Indian format (e.g., ₹1,00,000). \
Make references to Indian shopping preferences and festivals when relevant."
        .to_string()
}

/// User prompt for cart updates
///
/// `update` is `None` when no product could be resolved, in which case the
/// cart is described unchanged.
pub fn cart_user_prompt(query: &str, update: Option<&CartUpdate>, cart: &Cart) -> String {
    let mut prompt = format!("The user query is: '{}'.", query);

    match update {
        Some(update) => {
            let name = update
                .product
                .as_ref()
                .map(|p| p.name.as_str())
                .unwrap_or(update.product_id.as_str());
            prompt.push_str(&format!(
                "\nCart change applied: {} {} x {}.",
                update.action.as_str(),
                update.quantity,
                name
            ));
        },
        None => prompt.push_str("\nNo product could be identified, so the cart was not changed."),
    }

    prompt.push_str(&format!("\n\n{}", describe_cart(cart)));
    prompt
}

/// System prompt for store-policy questions
pub fn general_info_system_prompt() -> String {
    "You are a customer support assistant for IndicCommerce, an Indian online store selling clothing, \
footwear and electronics. Answer questions about delivery, returns, exchanges, payment options \
(including Cash on Delivery and UPI) and product availability briefly and politely. \
If you are not sure about a policy detail, say so and suggest contacting support."
        .to_string()
}

/// Plain-text cart listing used inside prompts
pub fn describe_cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Current cart: empty".to_string();
    }

    let mut text = String::from("Current cart:\n");
    for item in &cart.items {
        text.push_str(&format!("- {} x {} ({})\n", item.quantity, item.name, item.price));
    }
    text.push_str(&format!("Total: {}", cart.formatted_total()));
    text
}

/// Prompt builder for responder requests
pub struct PromptBuilder {
    messages: Vec<Message>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    pub fn system(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    /// Add stored conversation history, most recent `limit` turns
    pub fn with_history(mut self, history: &[ConversationTurn], limit: usize) -> Self {
        let start = history.len().saturating_sub(limit);
        self.messages.extend(history[start..].iter().map(|turn| match turn.role {
            TurnRole::User => Message::user(turn.content.clone()),
            TurnRole::Assistant => Message::assistant(turn.content.clone()),
        }));
        self
    }

    pub fn user_message(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    pub fn build(self) -> GenerateRequest {
        GenerateRequest {
            messages: self.messages,
            ..Default::default()
        }
    }

    /// Build, dropping the oldest non-system messages until the estimate
    /// fits within `max_tokens`
    pub fn build_with_limit(self, max_tokens: usize) -> GenerateRequest {
        let current_tokens = self.estimate_tokens();
        if current_tokens <= max_tokens {
            return self.build();
        }

        let (system_msgs, conv_msgs): (Vec<_>, Vec<_>) = self
            .messages
            .into_iter()
            .partition(|m| matches!(m.role, Role::System));

        let system_tokens: usize = system_msgs.iter().map(|m| estimate_tokens(&m.content)).sum();
        let available_tokens = max_tokens.saturating_sub(system_tokens);

        let mut kept_msgs: Vec<Message> = Vec::new();
        let mut used_tokens = 0;
        let last_index = conv_msgs.len().saturating_sub(1);

        for (index, msg) in conv_msgs.into_iter().enumerate().rev() {
            let msg_tokens = estimate_tokens(&msg.content);
            // The current user message is always kept
            if index == last_index || used_tokens + msg_tokens <= available_tokens {
                kept_msgs.push(msg);
                used_tokens += msg_tokens;
            } else {
                break;
            }
        }
        kept_msgs.reverse();

        tracing::debug!(
            "Context truncated: {} -> {} tokens ({} messages kept)",
            current_tokens,
            system_tokens + used_tokens,
            system_msgs.len() + kept_msgs.len()
        );

        let mut messages = system_msgs;
        messages.extend(kept_msgs);
        GenerateRequest {
            messages,
            ..Default::default()
        }
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn estimate_tokens(&self) -> usize {
        self.messages.iter().map(|m| estimate_tokens(&m.content)).sum()
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Rough token estimate for multilingual text
///
/// Counts grapheme clusters: Indic scripts average about two graphemes per
/// token, Latin text about four.
pub fn estimate_tokens(text: &str) -> usize {
    let grapheme_count = text.graphemes(true).count();
    let indic_count = text
        .chars()
        .filter(|c| ('\u{0900}'..='\u{0DFF}').contains(c))
        .count();

    if indic_count > grapheme_count / 3 {
        grapheme_count.max(1) / 2
    } else {
        grapheme_count.max(1) / 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indic_commerce_core::{CartAction, CartItem};

    #[test]
    fn test_classifier_prompt_lists_intents() {
        let system = classifier_system_prompt();
        for intent in [
            "product_query",
            "summarize_cart",
            "cart_update",
            "initiate_payment",
            "general_info",
        ] {
            assert!(system.contains(intent), "missing {}", intent);
        }
        assert!(system.contains("Cash on Delivery"));
    }

    #[test]
    fn test_classifier_user_prompt_language_note() {
        let english = classifier_user_prompt("running shoes", Language::English);
        assert!(english.starts_with("Query: running shoes\n"));
        assert!(!english.contains("original query"));

        let hindi = classifier_user_prompt("जूते दिखाओ", Language::Hindi);
        assert!(hindi.contains("The original query was in Hindi (hi-IN)"));
        assert!(hindi.contains("search_terms (string in English"));
    }

    #[test]
    fn test_classification_request_uses_json_mode() {
        let request = classification_request("shoes", Language::English);
        assert!(request.json_mode);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.temperature, Some(0.0));
    }

    #[test]
    fn test_shopping_context() {
        let products = vec![Product {
            id: "prod4".to_string(),
            name: "Running Shoes".to_string(),
            description: "Comfortable running shoes".to_string(),
            price: "₹2499".to_string(),
            category: "footwear".to_string(),
            image_url: None,
        }];
        let history = vec![
            ConversationTurn::user("hi"),
            ConversationTurn::assistant("Hello! How can I help?"),
        ];
        let prompt = shopping_assistant_context(&products, &history, "running shoes");
        assert!(prompt.contains("\"id\": \"prod4\""));
        assert!(prompt.contains("user: hi\nassistant: Hello! How can I help?\n"));
        assert!(prompt.ends_with("user: running shoes\n"));
    }

    #[test]
    fn test_cart_user_prompt() {
        let cart = Cart {
            items: vec![CartItem {
                product_id: "prod1".to_string(),
                name: "Cotton T-Shirt".to_string(),
                price: "₹499".to_string(),
                quantity: 2,
            }],
        };
        let update = CartUpdate {
            product_id: "prod1".to_string(),
            product: None,
            action: CartAction::Add,
            quantity: 2,
        };
        let prompt = cart_user_prompt("add two t-shirts", Some(&update), &cart);
        assert!(prompt.contains("Cart change applied: add 2 x prod1."));
        assert!(prompt.contains("- 2 x Cotton T-Shirt (₹499)"));
        assert!(prompt.contains("Total: ₹998"));

        let prompt = cart_user_prompt("add this", None, &Cart::default());
        assert!(prompt.contains("cart was not changed"));
        assert!(prompt.contains("Current cart: empty"));
    }

    #[test]
    fn test_builder_history_limit() {
        let history: Vec<ConversationTurn> = (0..10)
            .map(|i| ConversationTurn::user(format!("turn {}", i)))
            .collect();
        let request = PromptBuilder::new()
            .system("sys")
            .with_history(&history, 4)
            .user_message("now")
            .build();
        assert_eq!(request.messages.len(), 6);
        assert_eq!(request.messages[1].content, "turn 6");
        assert_eq!(request.last_user_message(), Some("now"));
    }

    #[test]
    fn test_build_with_limit_keeps_system_and_latest() {
        let long_turn = "word ".repeat(200);
        let history = vec![
            ConversationTurn::user(long_turn.clone()),
            ConversationTurn::assistant(long_turn),
        ];
        let request = PromptBuilder::new()
            .system("system prompt")
            .with_history(&history, 10)
            .user_message("latest question")
            .build_with_limit(50);

        assert_eq!(request.messages.first().map(|m| m.role), Some(Role::System));
        assert_eq!(request.last_user_message(), Some("latest question"));
        assert_eq!(request.messages.len(), 2);
    }

    #[test]
    fn test_token_estimation() {
        assert_eq!(estimate_tokens("Hello world!"), 3);
        let hindi = "नमस्ते आप कैसे हैं";
        assert!(estimate_tokens(hindi) >= hindi.graphemes(true).count() / 2);
    }
}
