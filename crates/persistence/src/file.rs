//! JSON file session store
//!
//! One document per shopper under a directory. Writes go through a temp
//! file and a rename so a crash never leaves a half-written session.
//! Read-modify-write cycles are serialized by a single async mutex.

use async_trait::async_trait;
use percent_encoding::{percent_decode_str, percent_encode, NON_ALPHANUMERIC};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use indic_commerce_core::{
    Cart, CartUpdate, ConversationTurn, Language, Result, SessionStore, UserSession,
};

use crate::{cap_history, PersistenceError};

pub struct JsonFileSessionStore {
    dir: PathBuf,
    max_history: usize,
    write_lock: Mutex<()>,
}

impl JsonFileSessionStore {
    /// Open (and create if needed) a session directory
    pub async fn open(dir: impl Into<PathBuf>, max_history: usize) -> std::result::Result<Self, PersistenceError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::info!(dir = %dir.display(), "Opened file session store");
        Ok(Self {
            dir,
            max_history,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// User ids with a stored session, sorted
    pub async fn list_users(&self) -> std::result::Result<Vec<String>, PersistenceError> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut users = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".json") {
                match decode_stem(stem) {
                    Some(user_id) => users.push(user_id),
                    None => tracing::warn!(file = %name, "Skipping undecodable session file"),
                }
            }
        }
        users.sort();
        Ok(users)
    }

    fn path_for(&self, user_id: &str) -> std::result::Result<PathBuf, PersistenceError> {
        Ok(self.dir.join(format!("{}.json", file_stem(user_id)?)))
    }

    async fn load(&self, user_id: &str) -> std::result::Result<UserSession, PersistenceError> {
        let path = self.path_for(user_id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(UserSession::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, user_id: &str, session: &UserSession) -> std::result::Result<(), PersistenceError> {
        let path = self.path_for(user_id)?;
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(session)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Load, mutate and save under the write lock
    async fn modify<T, F>(&self, user_id: &str, f: F) -> std::result::Result<T, PersistenceError>
    where
        F: FnOnce(&mut UserSession) -> T + Send,
        T: Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut session = self.load(user_id).await?;
        let out = f(&mut session);
        self.save(user_id, &session).await?;
        Ok(out)
    }
}

/// Percent-encode a user id such as `whatsapp:+919800000000` into a file
/// stem; [`decode_stem`] reverses it
fn file_stem(user_id: &str) -> std::result::Result<String, PersistenceError> {
    if user_id.trim().is_empty() {
        return Err(PersistenceError::InvalidKey("empty user id".to_string()));
    }
    Ok(percent_encode(user_id.as_bytes(), NON_ALPHANUMERIC).to_string())
}

fn decode_stem(stem: &str) -> Option<String> {
    percent_decode_str(stem)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

#[async_trait]
impl SessionStore for JsonFileSessionStore {
    async fn get(&self, user_id: &str) -> Result<UserSession> {
        Ok(self.load(user_id).await?)
    }

    async fn append(&self, user_id: &str, exchange: &[ConversationTurn]) -> Result<()> {
        let max_history = self.max_history;
        self.modify(user_id, |session| {
            session.history.extend_from_slice(exchange);
            cap_history(&mut session.history, max_history);
        })
        .await?;
        Ok(())
    }

    async fn set_preferred_language(&self, user_id: &str, language: Language) -> Result<()> {
        self.modify(user_id, |session| session.preferred_language = Some(language))
            .await?;
        Ok(())
    }

    async fn update_cart(&self, user_id: &str, update: &CartUpdate) -> Result<Cart> {
        let cart = self
            .modify(user_id, |session| {
                session.cart.apply(update);
                session.cart.clone()
            })
            .await?;
        Ok(cart)
    }

    async fn delete(&self, user_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.path_for(user_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PersistenceError::from(e).into()),
        }
    }

    fn backend_name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indic_commerce_core::CartAction;

    #[test]
    fn test_file_stem_escapes() {
        assert_eq!(file_stem("user1").unwrap(), "user1");
        assert_eq!(file_stem("whatsapp:+91").unwrap(), "whatsapp%3A%2B91");
        assert_ne!(file_stem("a/b").unwrap(), file_stem("a_b").unwrap());
        assert_eq!(decode_stem("whatsapp%3A%2B91").as_deref(), Some("whatsapp:+91"));
        assert!(file_stem("  ").is_err());
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let user = "whatsapp:+919800000002";

        {
            let store = JsonFileSessionStore::open(dir.path(), 10).await.unwrap();
            store.set_preferred_language(user, Language::Tamil).await.unwrap();
            store
                .append(
                    user,
                    &[ConversationTurn::user("hi"), ConversationTurn::assistant("hello")],
                )
                .await
                .unwrap();
            store
                .update_cart(
                    user,
                    &CartUpdate {
                        product_id: "prod1".into(),
                        product: None,
                        action: CartAction::Add,
                        quantity: 1,
                    },
                )
                .await
                .unwrap();
        }

        let store = JsonFileSessionStore::open(dir.path(), 10).await.unwrap();
        assert_eq!(store.list_users().await.unwrap(), vec![user.to_string()]);
        let session = store.get(user).await.unwrap();
        assert_eq!(session.preferred_language, Some(Language::Tamil));
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.cart.item_count(), 1);
    }

    #[tokio::test]
    async fn test_history_cap_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSessionStore::open(dir.path(), 3).await.unwrap();

        for i in 0..5 {
            store.append("u", &[ConversationTurn::user(format!("q{}", i))]).await.unwrap();
        }
        let history = store.get("u").await.unwrap().history;
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "q2");

        store.delete("u").await.unwrap();
        store.delete("u").await.unwrap();
        assert!(store.get("u").await.unwrap().history.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_session_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSessionStore::open(dir.path(), 3).await.unwrap();
        std::fs::write(dir.path().join("u.json"), "{broken").unwrap();

        let err = store.get("u").await.unwrap_err();
        assert!(matches!(err, indic_commerce_core::Error::Session(_)));
    }
}
