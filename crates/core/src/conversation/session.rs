//! Conversation state storage.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::ConversationState;

/// Keyed store for per-user conversation state.
///
/// Implementations must not leak state across users. The default is
/// in-memory; the trait exists so a durable store can be swapped in.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current state for a user, if any.
    async fn get(&self, user_id: i64) -> Option<ConversationState>;

    /// Replace the user's state.
    async fn set(&self, user_id: i64, state: ConversationState);

    /// Drop the user's state.
    async fn clear(&self, user_id: i64);
}

/// In-memory session store.
#[derive(Default)]
pub struct InMemorySessionStore {
    inner: RwLock<HashMap<i64, ConversationState>>,
}

impl InMemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: i64) -> Option<ConversationState> {
        self.inner.read().await.get(&user_id).cloned()
    }

    async fn set(&self, user_id: i64, state: ConversationState) {
        self.inner.write().await.insert(user_id, state);
    }

    async fn clear(&self, user_id: i64) {
        self.inner.write().await.remove(&user_id);
    }
}
