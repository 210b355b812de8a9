use serde::{Deserialize, Serialize};

/// Profile cached alongside the tokens (`userData`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedProfile {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

/// Everything `login` persists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub role: String,
    pub profile: CachedProfile,
}

/// The stored session as read back. Only the access token is required for a
/// session to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user_id: Option<String>,
    pub role: Option<String>,
    pub profile: Option<CachedProfile>,
}

impl Session {
    pub fn matches(&self, grant: &LoginGrant) -> bool {
        self.access_token == grant.access_token
            && self.refresh_token.as_deref() == Some(grant.refresh_token.as_str())
            && self.user_id.as_deref() == Some(grant.user_id.as_str())
            && self.role.as_deref() == Some(grant.role.as_str())
            && self.profile.as_ref() == Some(&grant.profile)
    }
}

/// Refresh endpoint result; the refresh token is only rotated when present.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}
