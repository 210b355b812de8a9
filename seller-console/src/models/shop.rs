use super::catalog::ImageRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Shop {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub address: String,
    pub description: String,
    pub shop_status: Option<String>,
    pub logo: Option<ImageRef>,
}

impl Shop {
    pub fn is_verified(&self) -> bool {
        self.shop_status.as_deref() == Some("verified")
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_verified() {
            "Verified"
        } else {
            "Not verified"
        }
    }

    pub fn logo_url(&self) -> Option<&str> {
        self.logo.as_ref().map(ImageRef::url).filter(|u| !u.is_empty())
    }
}
