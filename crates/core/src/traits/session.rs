//! Session store trait

use async_trait::async_trait;

use crate::{Cart, CartUpdate, ConversationTurn, Language, Result, UserSession};

/// Per-shopper persistent state (language preference, history, cart)
///
/// Implementations:
/// - `InMemorySessionStore` - process-local, lost on restart
/// - `JsonFileSessionStore` - one JSON document per shopper
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Load a shopper's session; unknown shoppers get an empty session
    async fn get(&self, user_id: &str) -> Result<UserSession>;

    /// Append one exchange (user turn + assistant reply) to the history
    async fn append(&self, user_id: &str, exchange: &[ConversationTurn]) -> Result<()>;

    /// Remember the language the shopper last used
    async fn set_preferred_language(&self, user_id: &str, language: Language) -> Result<()>;

    /// Apply a cart change and return the updated cart
    async fn update_cart(&self, user_id: &str, update: &CartUpdate) -> Result<Cart>;

    /// Forget everything about a shopper
    async fn delete(&self, user_id: &str) -> Result<()>;

    /// Backend name for logging
    fn backend_name(&self) -> &str;
}
