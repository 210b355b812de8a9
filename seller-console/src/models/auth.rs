use crate::session::{CachedProfile, LoginGrant};
use serde::Deserialize;

/// `data` of a successful `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl LoginResponse {
    pub fn into_grant(self) -> LoginGrant {
        let profile = CachedProfile {
            id: self.id.clone(),
            name: self.name,
            email: self.email,
            role: self.role.clone(),
        };

        LoginGrant {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user_id: self.id,
            role: self.role,
            profile,
        }
    }
}
