//! Per-shopper session data kept by the external session store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::product::{format_rupees, parse_rupees};
use crate::{CartAction, Language, Product};

/// Who said a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One stored line of conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A product line in the shopper's cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub price: String,
    pub quantity: u32,
}

impl CartItem {
    /// Line total in whole rupees
    pub fn line_total(&self) -> Option<u64> {
        parse_rupees(&self.price).map(|unit| unit.saturating_mul(u64::from(self.quantity)))
    }
}

/// Requested change to a cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartUpdate {
    pub product_id: String,
    /// Resolved catalog record, when the index knows the product
    #[serde(default)]
    pub product: Option<Product>,
    pub action: CartAction,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .fold(0u64, |count, item| count.saturating_add(u64::from(item.quantity)))
    }

    /// Sum of all line totals whose price could be read
    pub fn total_rupees(&self) -> u64 {
        self.items
            .iter()
            .filter_map(CartItem::line_total)
            .fold(0, u64::saturating_add)
    }

    pub fn formatted_total(&self) -> String {
        format_rupees(self.total_rupees())
    }

    /// Apply an add/remove. Returns `false` when nothing changed, i.e.
    /// removing a product that is not in the cart.
    pub fn apply(&mut self, update: &CartUpdate) -> bool {
        let quantity = update.quantity.max(1);
        let existing = self
            .items
            .iter()
            .position(|item| item.product_id == update.product_id);

        match (update.action, existing) {
            (CartAction::Add, Some(idx)) => {
                self.items[idx].quantity = self.items[idx].quantity.saturating_add(quantity);
                true
            },
            (CartAction::Add, None) => {
                let (name, price) = match &update.product {
                    Some(product) => (product.name.clone(), product.price.clone()),
                    None => (update.product_id.clone(), String::new()),
                };
                self.items.push(CartItem {
                    product_id: update.product_id.clone(),
                    name,
                    price,
                    quantity,
                });
                true
            },
            (CartAction::Remove, Some(idx)) => {
                if self.items[idx].quantity <= quantity {
                    self.items.remove(idx);
                } else {
                    self.items[idx].quantity -= quantity;
                }
                true
            },
            (CartAction::Remove, None) => false,
        }
    }
}

/// Everything the store knows about a shopper
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSession {
    #[serde(default)]
    pub preferred_language: Option<Language>,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
    #[serde(default)]
    pub cart: Cart,
}

impl UserSession {
    /// Most recent `limit` turns, oldest first
    pub fn recent_history(&self, limit: usize) -> &[ConversationTurn] {
        let start = self.history.len().saturating_sub(limit);
        &self.history[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shoes() -> Product {
        Product {
            id: "prod4".into(),
            name: "Running Shoes".into(),
            description: "Comfortable running shoes".into(),
            price: "₹2499".into(),
            category: "footwear".into(),
            image_url: None,
        }
    }

    fn update(action: CartAction, quantity: u32) -> CartUpdate {
        CartUpdate {
            product_id: "prod4".into(),
            product: Some(shoes()),
            action,
            quantity,
        }
    }

    #[test]
    fn test_add_then_add_merges_lines() {
        let mut cart = Cart::default();
        assert!(cart.apply(&update(CartAction::Add, 1)));
        assert!(cart.apply(&update(CartAction::Add, 2)));
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.total_rupees(), 7497);
        assert_eq!(cart.formatted_total(), "₹7,497");
    }

    #[test]
    fn test_remove() {
        let mut cart = Cart::default();
        cart.apply(&update(CartAction::Add, 2));
        assert!(cart.apply(&update(CartAction::Remove, 1)));
        assert_eq!(cart.item_count(), 1);
        assert!(cart.apply(&update(CartAction::Remove, 5)));
        assert!(cart.is_empty());
        assert!(!cart.apply(&update(CartAction::Remove, 1)));
    }

    #[test]
    fn test_zero_quantity_counts_as_one() {
        let mut cart = Cart::default();
        cart.apply(&update(CartAction::Add, 0));
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_huge_quantities_do_not_overflow() {
        let mut cart = Cart::default();
        cart.apply(&update(CartAction::Add, u32::MAX));
        cart.apply(&CartUpdate {
            product_id: "prod1".into(),
            product: Some(Product {
                id: "prod1".into(),
                name: "Cotton T-Shirt".into(),
                price: "₹499".into(),
                ..shoes()
            }),
            action: CartAction::Add,
            quantity: 1,
        });

        assert_eq!(cart.item_count(), u64::from(u32::MAX) + 1);
        assert_eq!(cart.total_rupees(), 2499 * u64::from(u32::MAX) + 499);

        cart.items[0].price = format!("₹{}", u64::MAX);
        assert_eq!(cart.items[0].line_total(), Some(u64::MAX));
        assert_eq!(cart.total_rupees(), u64::MAX);
    }

    #[test]
    fn test_recent_history() {
        let session = UserSession {
            history: (0..5).map(|i| ConversationTurn::user(format!("q{}", i))).collect(),
            ..Default::default()
        };
        let recent = session.recent_history(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "q3");
        assert_eq!(session.recent_history(10).len(), 5);
    }
}
