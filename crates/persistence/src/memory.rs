//! In-memory session store
//!
//! Sessions live in the process and are lost on restart. This is the
//! default backend and the one tests use.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use indic_commerce_core::{
    Cart, CartUpdate, ConversationTurn, Language, Result, SessionStore, UserSession,
};

use crate::{cap_history, DEFAULT_MAX_HISTORY};

pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, UserSession>>,
    max_history: usize,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl InMemorySessionStore {
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_history,
        }
    }

    /// Number of shoppers with stored state
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: &str) -> Result<UserSession> {
        Ok(self.sessions.read().get(user_id).cloned().unwrap_or_default())
    }

    async fn append(&self, user_id: &str, exchange: &[ConversationTurn]) -> Result<()> {
        let mut sessions = self.sessions.write();
        let session = sessions.entry(user_id.to_string()).or_default();
        session.history.extend_from_slice(exchange);
        cap_history(&mut session.history, self.max_history);
        Ok(())
    }

    async fn set_preferred_language(&self, user_id: &str, language: Language) -> Result<()> {
        self.sessions
            .write()
            .entry(user_id.to_string())
            .or_default()
            .preferred_language = Some(language);
        Ok(())
    }

    async fn update_cart(&self, user_id: &str, update: &CartUpdate) -> Result<Cart> {
        let mut sessions = self.sessions.write();
        let session = sessions.entry(user_id.to_string()).or_default();
        if !session.cart.apply(update) {
            tracing::debug!(
                user_id,
                product_id = %update.product_id,
                "Cart remove for a product not in the cart"
            );
        }
        Ok(session.cart.clone())
    }

    async fn delete(&self, user_id: &str) -> Result<()> {
        self.sessions.write().remove(user_id);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
