//! Session Store contract
//!
//! A browser session holds at most one remote id per [`SessionKey`]. Reads
//! never fail on an absent key: they return [`Binding::Unbound`], which callers
//! treat as "no resource selected yet".

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::ConsoleResult;

/// The fixed set of keys a session may bind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKey {
    /// Currently selected person
    UserId,
    /// Currently selected event
    EventId,
    /// Survey response given by the selected person
    QuestionAnswer,
}

impl SessionKey {
    pub const ALL: [SessionKey; 3] = [
        SessionKey::UserId,
        SessionKey::EventId,
        SessionKey::QuestionAnswer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::UserId => "user_id",
            SessionKey::EventId => "event_id",
            SessionKey::QuestionAnswer => "question_answer",
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque identifier issued by the Resource Service.
///
/// The CRM answers with numeric ids, but nothing here depends on that; ids are
/// kept in their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read an id out of a JSON value (number or non-empty string)
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self(n.to_string())),
            Value::String(s) if !s.trim().is_empty() => Some(Self(s.trim().to_string())),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for RemoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RemoteId::from_json(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("not a remote id: {}", value)))
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for RemoteId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for RemoteId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Whether a session currently references a remote resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Bound(RemoteId),
    Unbound,
}

impl Binding {
    pub fn id(&self) -> Option<&RemoteId> {
        match self {
            Binding::Bound(id) => Some(id),
            Binding::Unbound => None,
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, Binding::Bound(_))
    }

    pub fn is_bound_to(&self, id: &RemoteId) -> bool {
        self.id() == Some(id)
    }
}

impl From<Option<RemoteId>> for Binding {
    fn from(id: Option<RemoteId>) -> Self {
        match id {
            Some(id) => Binding::Bound(id),
            None => Binding::Unbound,
        }
    }
}

/// Per-browser key/value state
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the binding for a key
    async fn get(&self, key: SessionKey) -> ConsoleResult<Binding>;

    /// Bind a key, replacing any previous id
    async fn set(&self, key: SessionKey, id: RemoteId) -> ConsoleResult<()>;

    /// Remove a key's binding
    async fn clear(&self, key: SessionKey) -> ConsoleResult<()>;

    /// Remove every binding
    async fn clear_all(&self) -> ConsoleResult<()> {
        for key in SessionKey::ALL {
            self.clear(key).await?;
        }
        Ok(())
    }
}

/// In-process session, used for embedded callers and tests
#[derive(Debug, Default)]
pub struct MemorySession {
    bindings: RwLock<HashMap<SessionKey, RemoteId>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with one key already bound
    pub fn with_binding(key: SessionKey, id: RemoteId) -> Self {
        let mut bindings = HashMap::new();
        bindings.insert(key, id);
        Self {
            bindings: RwLock::new(bindings),
        }
    }

    pub async fn len(&self) -> usize {
        self.bindings.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySession {
    async fn get(&self, key: SessionKey) -> ConsoleResult<Binding> {
        Ok(self.bindings.read().await.get(&key).cloned().into())
    }

    async fn set(&self, key: SessionKey, id: RemoteId) -> ConsoleResult<()> {
        self.bindings.write().await.insert(key, id);
        Ok(())
    }

    async fn clear(&self, key: SessionKey) -> ConsoleResult<()> {
        self.bindings.write().await.remove(&key);
        Ok(())
    }

    async fn clear_all(&self) -> ConsoleResult<()> {
        self.bindings.write().await.clear();
        Ok(())
    }
}
