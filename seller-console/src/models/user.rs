use crate::middleware::auth::login_redirect;
use crate::session::{CachedProfile, SessionManager};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// `GET /user/profile`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub store_name: Option<String>,
    pub email: String,
    pub role: Option<String>,
    pub shop_id: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        let joined = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if joined.is_empty() {
            "User".to_string()
        } else {
            joined
        }
    }

    /// Name shown to a customer receiving a call from this seller.
    pub fn caller_name(&self) -> String {
        [
            self.store_name.as_deref(),
            self.name.as_deref(),
            self.first_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|n| !n.is_empty())
        .unwrap_or("Seller")
        .to_string()
    }

    pub fn shop_id(&self) -> Option<&str> {
        self.shop_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Initials for the header avatar: first letter of up to two words.
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .collect::<String>()
        .to_uppercase();
    if letters.is_empty() {
        "U".to_string()
    } else {
        letters
    }
}

/// Signed-in seller, extracted from the session. Redirects to the login page
/// when no access token is stored.
#[derive(Clone)]
pub struct AuthUser {
    pub session: SessionManager<Session>,
    pub user_id: Option<String>,
    pub profile: Option<CachedProfile>,
}

impl AuthUser {
    pub fn name(&self) -> String {
        self.profile
            .as_ref()
            .map(|p| p.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "User".to_string())
    }

    pub fn initials(&self) -> String {
        initials(&self.name())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to extract session",
                )
                    .into_response()
            })?;

        let manager = SessionManager::new(session);
        match manager.read().await {
            Ok(Some(stored)) => Ok(AuthUser {
                session: manager,
                user_id: stored.user_id,
                profile: stored.profile,
            }),
            Ok(None) => Err(login_redirect(&parts.headers)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read session");
                Err(login_redirect(&parts.headers))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_first_and_last() {
        let profile = UserProfile {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            ..Default::default()
        };
        assert_eq!(profile.display_name(), "Ada Lovelace");
        assert_eq!(initials(&profile.display_name()), "AL");
    }

    #[test]
    fn caller_name_prefers_store_name() {
        let profile = UserProfile {
            name: Some("Ada".to_string()),
            store_name: Some("Ada's Yarn".to_string()),
            ..Default::default()
        };
        assert_eq!(profile.caller_name(), "Ada's Yarn");
        assert_eq!(UserProfile::default().caller_name(), "Seller");
    }

    #[test]
    fn blank_shop_id_is_absent() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"_id":"U1","email":"a@b.com","shopId":""}"#).unwrap();
        assert!(profile.shop_id().is_none());
    }
}
