//! Session persistence for the shopping assistant
//!
//! Provides storage for each shopper's:
//! - Preferred language
//! - Conversation history (capped)
//! - Cart
//!
//! Backends: in-memory (default) and one-JSON-file-per-shopper.

pub mod error;
pub mod file;
pub mod memory;

pub use error::PersistenceError;
pub use file::JsonFileSessionStore;
pub use memory::InMemorySessionStore;

use std::sync::Arc;

use indic_commerce_config::{SessionBackend, SessionConfig};
use indic_commerce_core::{ConversationTurn, SessionStore};

pub(crate) const DEFAULT_MAX_HISTORY: usize = 20;

/// Initialize the session store selected by configuration
pub async fn init(config: &SessionConfig) -> Result<Arc<dyn SessionStore>, PersistenceError> {
    let store: Arc<dyn SessionStore> = match config.backend {
        SessionBackend::Memory => Arc::new(InMemorySessionStore::new(config.max_history)),
        SessionBackend::File => {
            let dir = config.directory.as_deref().ok_or_else(|| {
                PersistenceError::Configuration("session.directory is required".to_string())
            })?;
            Arc::new(JsonFileSessionStore::open(dir, config.max_history).await?)
        },
    };

    tracing::info!(backend = store.backend_name(), "Session store ready");
    Ok(store)
}

/// Drop the oldest turns beyond `max`
pub(crate) fn cap_history(history: &mut Vec<ConversationTurn>, max: usize) {
    if history.len() > max {
        let excess = history.len() - max;
        history.drain(..excess);
    }
}
