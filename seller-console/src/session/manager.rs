use super::model::{CachedProfile, LoginGrant, RefreshedTokens, Session};
use super::store::{
    SessionStore, StoreError, ACCESS_TOKEN, REFRESH_TOKEN, RESET_EMAIL, RESET_OTP, ROLE,
    USER_DATA, USER_ID,
};
use crate::services::error::ApiError;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no refresh token stored")]
    NoRefreshToken,

    #[error("token refresh rejected: {0}")]
    RefreshRejected(Box<ApiError>),
}

/// Exchanges a refresh token for new credentials. Implemented by the API
/// client; tests substitute their own.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<RefreshedTokens, ApiError>;
}

/// Owns the token/identity lifecycle for one seller session.
#[derive(Clone)]
pub struct SessionManager<S> {
    store: S,
}

impl<S: SessionStore> SessionManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn login(&self, grant: &LoginGrant) -> Result<(), SessionError> {
        let profile = serde_json::to_string(&grant.profile)
            .map_err(|e| StoreError(format!("failed to encode profile: {e}")))?;

        self.store
            .insert(ACCESS_TOKEN, grant.access_token.clone())
            .await?;
        self.store
            .insert(REFRESH_TOKEN, grant.refresh_token.clone())
            .await?;
        self.store.insert(USER_ID, grant.user_id.clone()).await?;
        self.store.insert(ROLE, grant.role.clone()).await?;
        self.store.insert(USER_DATA, profile).await?;

        tracing::info!(user_id = %grant.user_id, role = %grant.role, "Session established");
        Ok(())
    }

    pub async fn read(&self) -> Result<Option<Session>, SessionError> {
        let Some(access_token) = self.store.get(ACCESS_TOKEN).await? else {
            return Ok(None);
        };

        let profile = match self.store.get(USER_DATA).await? {
            Some(raw) => match serde_json::from_str::<CachedProfile>(&raw) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable cached profile");
                    None
                }
            },
            None => None,
        };

        Ok(Some(Session {
            access_token,
            refresh_token: self.store.get(REFRESH_TOKEN).await?,
            user_id: self.store.get(USER_ID).await?,
            role: self.store.get(ROLE).await?,
            profile,
        }))
    }

    pub async fn access_token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.store.get(ACCESS_TOKEN).await?)
    }

    pub async fn refresh_token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.store.get(REFRESH_TOKEN).await?)
    }

    pub async fn user_id(&self) -> Result<Option<String>, SessionError> {
        Ok(self.store.get(USER_ID).await?)
    }

    /// Single refresh attempt. Any failure is terminal: the session is wiped
    /// and the caller must send the seller back to the login page.
    pub async fn refresh<R>(&self, refresher: &R) -> Result<String, SessionError>
    where
        R: TokenRefresher + ?Sized,
    {
        let Some(refresh_token) = self.refresh_token().await? else {
            self.logout().await?;
            return Err(SessionError::NoRefreshToken);
        };

        match refresher.refresh_tokens(&refresh_token).await {
            Ok(tokens) => {
                self.store
                    .insert(ACCESS_TOKEN, tokens.access_token.clone())
                    .await?;
                if let Some(rotated) = tokens.refresh_token {
                    self.store.insert(REFRESH_TOKEN, rotated).await?;
                }
                tracing::debug!("Access token refreshed");
                Ok(tokens.access_token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, clearing session");
                self.logout().await?;
                Err(SessionError::RefreshRejected(Box::new(e)))
            }
        }
    }

    pub async fn logout(&self) -> Result<(), SessionError> {
        self.store.clear().await?;
        Ok(())
    }

    pub async fn remember_reset_email(&self, email: &str) -> Result<(), SessionError> {
        Ok(self.store.insert(RESET_EMAIL, email.to_string()).await?)
    }

    pub async fn reset_email(&self) -> Result<Option<String>, SessionError> {
        Ok(self.store.get(RESET_EMAIL).await?)
    }

    pub async fn remember_reset_otp(&self, otp: &str) -> Result<(), SessionError> {
        Ok(self.store.insert(RESET_OTP, otp.to_string()).await?)
    }

    pub async fn reset_otp(&self) -> Result<Option<String>, SessionError> {
        Ok(self.store.get(RESET_OTP).await?)
    }

    pub async fn clear_reset_flow(&self) -> Result<(), SessionError> {
        self.store.remove(RESET_EMAIL).await?;
        self.store.remove(RESET_OTP).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::MemoryStore;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn grant() -> LoginGrant {
        LoginGrant {
            access_token: "T1".to_string(),
            refresh_token: "R1".to_string(),
            user_id: "U1".to_string(),
            role: "seller".to_string(),
            profile: CachedProfile {
                id: "U1".to_string(),
                name: "A".to_string(),
                email: "a@b.com".to_string(),
                role: "seller".to_string(),
            },
        }
    }

    struct FixedRefresher {
        result: Result<RefreshedTokens, StatusCode>,
        calls: AtomicUsize,
    }

    impl FixedRefresher {
        fn new(result: Result<RefreshedTokens, StatusCode>) -> Self {
            Self {
                result,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TokenRefresher for FixedRefresher {
        async fn refresh_tokens(&self, refresh_token: &str) -> Result<RefreshedTokens, ApiError> {
            assert_eq!(refresh_token, "R1");
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone().map_err(|status| ApiError::Http {
                status,
                message: None,
            })
        }
    }

    #[tokio::test]
    async fn login_then_read_returns_the_same_values() {
        let manager = SessionManager::new(MemoryStore::new());
        manager.login(&grant()).await.unwrap();

        let session = manager.read().await.unwrap().expect("session stored");
        assert!(session.matches(&grant()));
        assert_eq!(session.user_id.as_deref(), Some("U1"));
        assert_eq!(session.role.as_deref(), Some("seller"));
    }

    #[tokio::test]
    async fn logout_always_yields_absent_state() {
        let manager = SessionManager::new(MemoryStore::new());
        manager.logout().await.unwrap();
        assert!(manager.read().await.unwrap().is_none());

        manager.login(&grant()).await.unwrap();
        manager.remember_reset_email("a@b.com").await.unwrap();
        manager.logout().await.unwrap();

        assert!(manager.read().await.unwrap().is_none());
        assert!(manager.store().is_empty());
    }

    #[tokio::test]
    async fn refresh_overwrites_access_token_and_keeps_refresh_token() {
        let manager = SessionManager::new(MemoryStore::new());
        manager.login(&grant()).await.unwrap();
        let refresher = FixedRefresher::new(Ok(RefreshedTokens {
            access_token: "T2".to_string(),
            refresh_token: None,
        }));

        let token = manager.refresh(&refresher).await.unwrap();

        assert_eq!(token, "T2");
        let session = manager.read().await.unwrap().unwrap();
        assert_eq!(session.access_token, "T2");
        assert_eq!(session.refresh_token.as_deref(), Some("R1"));
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refresh_rotates_refresh_token_when_returned() {
        let manager = SessionManager::new(MemoryStore::new());
        manager.login(&grant()).await.unwrap();
        let refresher = FixedRefresher::new(Ok(RefreshedTokens {
            access_token: "T2".to_string(),
            refresh_token: Some("R2".to_string()),
        }));

        manager.refresh(&refresher).await.unwrap();

        assert_eq!(manager.refresh_token().await.unwrap().as_deref(), Some("R2"));
    }

    #[tokio::test]
    async fn failed_refresh_clears_the_session() {
        let manager = SessionManager::new(MemoryStore::new());
        manager.login(&grant()).await.unwrap();
        let refresher = FixedRefresher::new(Err(StatusCode::UNAUTHORIZED));

        let err = manager.refresh(&refresher).await.unwrap_err();

        assert!(matches!(err, SessionError::RefreshRejected(_)));
        assert!(manager.read().await.unwrap().is_none());
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refresh_without_refresh_token_clears_without_calling_backend() {
        let store = MemoryStore::new();
        store
            .insert(ACCESS_TOKEN, "T1".to_string())
            .await
            .unwrap();
        let manager = SessionManager::new(store);
        let refresher = FixedRefresher::new(Err(StatusCode::UNAUTHORIZED));

        let err = manager.refresh(&refresher).await.unwrap_err();

        assert!(matches!(err, SessionError::NoRefreshToken));
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
        assert!(manager.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unreadable_profile_is_dropped_not_fatal() {
        let store = MemoryStore::new();
        store.insert(ACCESS_TOKEN, "T1".to_string()).await.unwrap();
        store.insert(USER_DATA, "{not json".to_string()).await.unwrap();
        let manager = SessionManager::new(store);

        let session = manager.read().await.unwrap().unwrap();
        assert_eq!(session.access_token, "T1");
        assert!(session.profile.is_none());
    }
}
