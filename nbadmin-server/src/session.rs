//! Cookie-backed session store
//!
//! Wraps the per-request [`tower_sessions::Session`] so the proxy can bind and
//! clear remote ids through the [`SessionStore`] contract. The same session
//! also carries the queue of flash messages shown by the next listing page.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use nbadmin_core::{Binding, ConsoleError, ConsoleResult, RemoteId, SessionKey, SessionStore};

const FLASH_KEY: &str = "_flash";

/// Severity of a flash message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashLevel {
    Info,
    Warning,
    Error,
}

/// One-shot message rendered by the next page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }
}

/// [`SessionStore`] over a signed-cookie session
#[derive(Clone)]
pub struct CookieSession {
    inner: Session,
}

impl CookieSession {
    pub fn new(inner: Session) -> Self {
        Self { inner }
    }

    /// Queue a message for the next rendered page
    pub async fn flash(&self, flash: Flash) -> ConsoleResult<()> {
        let mut queue: Vec<Flash> = self
            .inner
            .get(FLASH_KEY)
            .await
            .map_err(session_error)?
            .unwrap_or_default();
        queue.push(flash);
        self.inner.insert(FLASH_KEY, queue).await.map_err(session_error)
    }

    /// Drain the queued messages
    pub async fn take_flashes(&self) -> ConsoleResult<Vec<Flash>> {
        let queue: Option<Vec<Flash>> = self.inner.remove(FLASH_KEY).await.map_err(session_error)?;
        Ok(queue.unwrap_or_default())
    }
}

#[async_trait]
impl SessionStore for CookieSession {
    async fn get(&self, key: SessionKey) -> ConsoleResult<Binding> {
        let id: Option<RemoteId> = self.inner.get(key.as_str()).await.map_err(session_error)?;
        Ok(id.into())
    }

    async fn set(&self, key: SessionKey, id: RemoteId) -> ConsoleResult<()> {
        self.inner.insert(key.as_str(), id).await.map_err(session_error)
    }

    async fn clear(&self, key: SessionKey) -> ConsoleResult<()> {
        self.inner
            .remove_value(key.as_str())
            .await
            .map_err(session_error)?;
        Ok(())
    }
}

fn session_error(e: tower_sessions::session::Error) -> ConsoleError {
    ConsoleError::Session {
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn cookie_session() -> CookieSession {
        CookieSession::new(Session::new(None, Arc::new(MemoryStore::default()), None))
    }

    #[tokio::test]
    async fn test_bindings_round_trip_through_cookie_session() {
        let session = cookie_session();
        assert_eq!(session.get(SessionKey::UserId).await.unwrap(), Binding::Unbound);

        session.set(SessionKey::UserId, RemoteId::new("42")).await.unwrap();
        assert_eq!(
            session.get(SessionKey::UserId).await.unwrap(),
            Binding::Bound(RemoteId::new("42"))
        );

        session.clear(SessionKey::UserId).await.unwrap();
        assert_eq!(session.get(SessionKey::UserId).await.unwrap(), Binding::Unbound);
    }

    #[tokio::test]
    async fn test_clear_all_keeps_flashes() {
        let session = cookie_session();
        session.set(SessionKey::EventId, RemoteId::new("7")).await.unwrap();
        session.flash(Flash::info("Created event 7")).await.unwrap();

        session.clear_all().await.unwrap();

        assert_eq!(session.get(SessionKey::EventId).await.unwrap(), Binding::Unbound);
        assert_eq!(session.take_flashes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_flashes_are_consumed_in_order() {
        let session = cookie_session();
        session.flash(Flash::info("first")).await.unwrap();
        session.flash(Flash::error("second")).await.unwrap();

        let flashes = session.take_flashes().await.unwrap();
        assert_eq!(flashes, vec![Flash::info("first"), Flash::error("second")]);
        assert!(session.take_flashes().await.unwrap().is_empty());
    }
}
