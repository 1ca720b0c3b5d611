//! Intent branch handlers
//!
//! Each handler reads the run state and produces the English reply text.
//! Product search and the product reply never fail the run. Cart updates
//! and general questions report errors so the run ends in the error
//! handler, except that a cart change already saved is always confirmed.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::sync::Arc;

use indic_commerce_config::constants::messages;
use indic_commerce_config::{PipelineConfig, ProductResponseMode, TimeoutConfig};
use indic_commerce_core::{
    Cart, CartAction, CartUpdate, Error, GenerateRequest, LanguageModel, Product, ProductIndex, Result,
    SessionStore,
};
use indic_commerce_llm::prompt::{
    cart_system_prompt, cart_user_prompt, general_info_system_prompt,
    shopping_assistant_context, shopping_assistant_system_prompt, PromptBuilder,
};

use crate::bounded;
use crate::state::PipelineState;

pub struct BranchHandlers {
    responder: Arc<dyn LanguageModel>,
    catalog: Arc<dyn ProductIndex>,
    sessions: Arc<dyn SessionStore>,
    search_limit: usize,
    product_response: ProductResponseMode,
    max_history_turns: usize,
    checkout_base_url: String,
    timeouts: TimeoutConfig,
}

impl BranchHandlers {
    pub fn new(
        responder: Arc<dyn LanguageModel>,
        catalog: Arc<dyn ProductIndex>,
        sessions: Arc<dyn SessionStore>,
        config: &PipelineConfig,
        checkout_base_url: impl Into<String>,
    ) -> Self {
        Self {
            responder,
            catalog,
            sessions,
            search_limit: config.search_limit,
            product_response: config.product_response,
            max_history_turns: config.max_history_turns,
            checkout_base_url: checkout_base_url.into(),
            timeouts: config.timeouts.clone(),
        }
    }

    /// Ranked candidates for the query; a failed search is an empty list
    pub async fn search_products(&self, state: &PipelineState) -> Vec<Product> {
        let terms = state.search_terms();
        match bounded(
            "search",
            self.timeouts.search(),
            self.catalog.search(terms, self.search_limit),
        )
        .await
        {
            Ok(products) => {
                tracing::debug!(terms, results = products.len(), "Product search");
                products
            },
            Err(e) => {
                tracing::warn!(terms, error = %e, "Product search failed, continuing with no candidates");
                Vec::new()
            },
        }
    }

    /// Reply for a product query; never fails
    pub async fn product_response(&self, state: &PipelineState) -> String {
        let products = &state.candidate_products;
        if products.is_empty() {
            return messages::NO_MATCH.to_string();
        }

        match self.product_response {
            ProductResponseMode::Template => template_reply(products),
            ProductResponseMode::Llm => {
                let request = PromptBuilder::new()
                    .system(shopping_assistant_system_prompt())
                    .user_message(shopping_assistant_context(
                        products,
                        state.session.recent_history(self.max_history_turns),
                        &state.english_query,
                    ))
                    .build();

                match self.respond(request).await {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(error = %e, "Product reply generation failed, using template");
                        template_reply(products)
                    },
                }
            },
        }
    }

    /// Apply the requested cart change and describe it
    ///
    /// Without a resolvable product id the cart is left unchanged and the
    /// responder asks which product was meant. Once the store has saved a
    /// change, a failed reply falls back to a fixed confirmation so the
    /// shopper is never told to retry a change that already happened.
    /// Returns the reply and the cart after the change.
    pub async fn cart_update(&self, state: &PipelineState) -> Result<(String, Cart)> {
        let slots = state.cart_slots().cloned().unwrap_or_default();
        let mut cart = state.session.cart.clone();
        let mut applied: Option<CartUpdate> = None;

        if let Some(product_id) = slots.product_id.as_deref() {
            match self.resolve_product(product_id).await {
                Some(product) => {
                    let update = CartUpdate {
                        product_id: product.id.clone(),
                        product: Some(product),
                        action: slots.action,
                        quantity: slots.quantity.max(1),
                    };
                    cart = bounded(
                        "session",
                        self.timeouts.session(),
                        self.sessions.update_cart(&state.sender_id, &update),
                    )
                    .await?;
                    tracing::info!(
                        product_id = %update.product_id,
                        action = %update.action,
                        quantity = update.quantity,
                        items = cart.item_count(),
                        "Cart updated"
                    );
                    applied = Some(update);
                },
                None => tracing::info!(product_id, "Cart update for unknown product, cart unchanged"),
            }
        }

        let request = PromptBuilder::new()
            .system(cart_system_prompt())
            .with_history(&state.session.history, self.max_history_turns)
            .user_message(cart_user_prompt(&state.english_query, applied.as_ref(), &cart))
            .build();

        let text = match (self.respond(request).await, applied.as_ref()) {
            (Ok(text), _) => text,
            (Err(e), Some(update)) => {
                tracing::warn!(error = %e, "Cart reply generation failed, using confirmation");
                cart_confirmation(update, &cart)
            },
            (Err(e), None) => return Err(e),
        };
        Ok((text, cart))
    }

    /// Deterministic cart listing
    pub fn summarize_cart(cart: &Cart) -> String {
        if cart.is_empty() {
            return messages::EMPTY_CART.to_string();
        }

        let mut text = String::from("Here's what's in your cart:\n");
        for item in &cart.items {
            if item.price.is_empty() {
                text.push_str(&format!("- {} x {}\n", item.quantity, item.name));
            } else {
                text.push_str(&format!("- {} x {} ({} each)\n", item.quantity, item.name, item.price));
            }
        }
        text.push_str(&format!("Total: {}", cart.formatted_total()));
        text
    }

    /// Checkout confirmation with a payment link for the shopper
    pub fn initiate_payment(&self, cart: &Cart, sender_id: &str) -> String {
        if cart.is_empty() {
            return messages::EMPTY_CART_CHECKOUT.to_string();
        }

        let count = cart.item_count();
        format!(
            "You have {} item{} in your cart for a total of {}. Complete your payment here: {}",
            count,
            if count == 1 { "" } else { "s" },
            cart.formatted_total(),
            checkout_link(&self.checkout_base_url, sender_id)
        )
    }

    /// Store-policy and other general questions
    pub async fn general_info(&self, state: &PipelineState) -> Result<String> {
        let request = PromptBuilder::new()
            .system(general_info_system_prompt())
            .with_history(&state.session.history, self.max_history_turns)
            .user_message(state.english_query.clone())
            .build();
        self.respond(request).await
    }

    async fn resolve_product(&self, product_id: &str) -> Option<Product> {
        match bounded("search", self.timeouts.search(), self.catalog.get(product_id)).await {
            Ok(product) => product,
            Err(e) => {
                tracing::warn!(product_id, error = %e, "Product lookup failed");
                None
            },
        }
    }

    /// Responder call; an empty reply counts as a failure
    async fn respond(&self, request: GenerateRequest) -> Result<String> {
        let response = bounded(
            "generation",
            self.timeouts.generation(),
            self.responder.generate(request),
        )
        .await?;

        let text = response.text.trim();
        if text.is_empty() {
            return Err(Error::InvalidResponse("responder returned an empty reply".to_string()));
        }
        Ok(text.to_string())
    }
}

fn checkout_link(base_url: &str, sender_id: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        utf8_percent_encode(sender_id, NON_ALPHANUMERIC)
    )
}

/// "Added 2 x Running Shoes to your cart. Cart total: ₹4,998."
fn cart_confirmation(update: &CartUpdate, cart: &Cart) -> String {
    let name = update
        .product
        .as_ref()
        .map(|p| p.name.as_str())
        .unwrap_or(update.product_id.as_str());
    let change = match update.action {
        CartAction::Add => format!("Added {} x {} to your cart.", update.quantity, name),
        CartAction::Remove => format!("Removed {} x {} from your cart.", update.quantity, name),
    };

    if cart.is_empty() {
        format!("{} {}", change, messages::EMPTY_CART)
    } else {
        format!("{} Cart total: {}.", change, cart.formatted_total())
    }
}

/// "I found a {name} for {price}. {description}" plus other matches by name
fn template_reply(products: &[Product]) -> String {
    let Some((top, rest)) = products.split_first() else {
        return messages::NO_MATCH.to_string();
    };

    let mut text = format!("I found a {} for {}.", top.name, top.price);
    let description = top.description.trim();
    if !description.is_empty() {
        text.push(' ');
        text.push_str(description);
        if !description.ends_with(['.', '!', '?']) {
            text.push('.');
        }
    }

    if !rest.is_empty() {
        let names: Vec<&str> = rest.iter().map(|p| p.name.as_str()).collect();
        text.push_str(&format!(" You might also like: {}.", names.join(", ")));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use indic_commerce_core::CartItem;

    fn product(id: &str, name: &str, price: &str, description: &str) -> Product {
        Product {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            price: price.into(),
            category: "footwear".into(),
            image_url: None,
        }
    }

    fn cart(items: &[(&str, &str, u32)]) -> Cart {
        Cart {
            items: items
                .iter()
                .map(|(name, price, quantity)| CartItem {
                    product_id: name.to_lowercase(),
                    name: name.to_string(),
                    price: price.to_string(),
                    quantity: *quantity,
                })
                .collect(),
        }
    }

    #[test]
    fn test_template_reply() {
        let text = template_reply(&[product(
            "prod4",
            "Running Shoes",
            "₹2499",
            "Comfortable running shoes with extra cushioning",
        )]);
        assert_eq!(
            text,
            "I found a Running Shoes for ₹2499. Comfortable running shoes with extra cushioning."
        );

        let text = template_reply(&[
            product("a", "Running Shoes", "₹2499", ""),
            product("b", "Trail Shoes", "₹2999", ""),
            product("c", "Sandals", "₹799", ""),
        ]);
        assert_eq!(
            text,
            "I found a Running Shoes for ₹2499. You might also like: Trail Shoes, Sandals."
        );
        assert_eq!(template_reply(&[]), messages::NO_MATCH);
    }

    #[test]
    fn test_summarize_cart() {
        assert_eq!(BranchHandlers::summarize_cart(&Cart::default()), messages::EMPTY_CART);

        let summary = BranchHandlers::summarize_cart(&cart(&[
            ("Running Shoes", "₹2499", 2),
            ("Cotton T-Shirt", "₹499", 1),
        ]));
        assert_eq!(
            summary,
            "Here's what's in your cart:\n\
             - 2 x Running Shoes (₹2499 each)\n\
             - 1 x Cotton T-Shirt (₹499 each)\n\
             Total: ₹5,497"
        );
    }

    #[test]
    fn test_cart_confirmation() {
        let update = CartUpdate {
            product_id: "prod4".into(),
            product: Some(product("prod4", "Running Shoes", "₹2499", "")),
            action: CartAction::Add,
            quantity: 2,
        };
        assert_eq!(
            cart_confirmation(&update, &cart(&[("Running Shoes", "₹2499", 2)])),
            "Added 2 x Running Shoes to your cart. Cart total: ₹4,998."
        );

        let removal = CartUpdate {
            action: CartAction::Remove,
            quantity: 1,
            ..update
        };
        assert_eq!(
            cart_confirmation(&removal, &Cart::default()),
            format!("Removed 1 x Running Shoes from your cart. {}", messages::EMPTY_CART)
        );
    }

    #[test]
    fn test_checkout_link_encodes_sender() {
        assert_eq!(
            checkout_link("https://pay.example.com/checkout/", "whatsapp:+919800000000"),
            "https://pay.example.com/checkout/whatsapp%3A%2B919800000000"
        );
    }
}
