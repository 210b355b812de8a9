//! Key/value storage behind a seller's session.
//!
//! The console keeps the same keys the browser dashboard kept in local
//! storage, so the backend contract and the session lifecycle line up.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

pub const ACCESS_TOKEN: &str = "accessToken";
pub const REFRESH_TOKEN: &str = "refreshToken";
pub const USER_ID: &str = "userId";
pub const ROLE: &str = "role";
pub const USER_DATA: &str = "userData";
pub const RESET_EMAIL: &str = "resetEmail";
pub const RESET_OTP: &str = "resetOTP";
pub const NOTICES: &str = "notices";
pub const CHANNEL_MOUNT: &str = "channelMount";

#[derive(Debug, Error)]
#[error("session store error: {0}")]
pub struct StoreError(pub String);

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn insert(&self, key: &str, value: String) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
    async fn clear(&self) -> Result<(), StoreError>;
}

/// In-process store, shared across clones.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn insert(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.entries.clear();
        Ok(())
    }
}

#[async_trait]
impl SessionStore for tower_sessions::Session {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        tower_sessions::Session::get::<String>(self, key)
            .await
            .map_err(|e| StoreError(e.to_string()))
    }

    async fn insert(&self, key: &str, value: String) -> Result<(), StoreError> {
        tower_sessions::Session::insert(self, key, value)
            .await
            .map_err(|e| StoreError(e.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        tower_sessions::Session::remove::<String>(self, key)
            .await
            .map(|_| ())
            .map_err(|e| StoreError(e.to_string()))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        tower_sessions::Session::clear(self).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.insert(ACCESS_TOKEN, "T1".to_string()).await.unwrap();
        assert_eq!(other.get(ACCESS_TOKEN).await.unwrap().as_deref(), Some("T1"));

        other.clear().await.unwrap();
        assert!(store.is_empty());
    }
}
