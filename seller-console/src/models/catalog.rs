use super::de;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Photo {
    pub url: String,
    pub public_id: Option<String>,
}

impl Photo {
    /// Identifier sent back in `removedPhotos`: the public id when the
    /// backend gave one, the url otherwise.
    pub fn removal_key(&self) -> &str {
        self.public_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(self.url.as_str())
    }
}

/// Thumbnails arrive either as a bare url or as a photo object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Url(String),
    Photo(Photo),
}

impl ImageRef {
    pub fn url(&self) -> &str {
        match self {
            ImageRef::Url(url) => url,
            ImageRef::Photo(photo) => &photo.url,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub parent: Option<serde_json::Value>,
    pub children: Vec<Category>,
}

impl Category {
    pub fn is_top_level(&self) -> bool {
        matches!(self.parent, None | Some(serde_json::Value::Null))
    }
}

/// A product's category: populated or just the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Id(String),
    Populated {
        #[serde(rename = "_id")]
        id: String,
        #[serde(default)]
        name: String,
    },
}

impl CategoryRef {
    pub fn id(&self) -> &str {
        match self {
            CategoryRef::Id(id) => id,
            CategoryRef::Populated { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub sku: String,
    #[serde(deserialize_with = "de::number")]
    pub price: f64,
    #[serde(deserialize_with = "de::integer")]
    pub stock: i64,
    pub created_at: Option<String>,
    pub verified: bool,
    pub thumbnail: Option<ImageRef>,
    pub photos: Vec<Photo>,
    pub category: Option<CategoryRef>,
    pub country: String,
    pub colors: Vec<String>,
    pub detailed_description: Option<String>,
    pub description: Option<String>,
}

impl Product {
    pub fn thumbnail_url(&self) -> Option<&str> {
        self.thumbnail
            .as_ref()
            .map(ImageRef::url)
            .filter(|url| !url.is_empty())
    }

    pub fn created_date(&self) -> String {
        self.created_at.as_deref().map(de::date_only).unwrap_or_default()
    }

    pub fn price_label(&self) -> String {
        de::money(self.price)
    }

    pub fn description_text(&self) -> &str {
        self.detailed_description
            .as_deref()
            .or(self.description.as_deref())
            .unwrap_or_default()
    }

    pub fn lowercase_colors(&self) -> Vec<String> {
        self.colors.iter().map(|c| c.to_lowercase()).collect()
    }

    pub fn category_id(&self) -> &str {
        self.category.as_ref().map(CategoryRef::id).unwrap_or_default()
    }
}

/// Split a stored category id into `(category, subcategory)` for the edit
/// form: a sub-category id resolves to its parent plus itself.
pub fn resolve_category(categories: &[Category], raw_id: &str) -> (String, Option<String>) {
    if raw_id.is_empty() || categories.is_empty() {
        return (raw_id.to_string(), None);
    }

    if categories
        .iter()
        .any(|cat| cat.id == raw_id && cat.is_top_level())
    {
        return (raw_id.to_string(), None);
    }

    match categories
        .iter()
        .find(|cat| cat.children.iter().any(|child| child.id == raw_id))
    {
        Some(parent) => (parent.id.clone(), Some(raw_id.to_string())),
        None => (raw_id.to_string(), None),
    }
}

/// Sub-categories of the selected top-level category.
pub fn subcategories<'a>(categories: &'a [Category], category_id: &str) -> &'a [Category] {
    categories
        .iter()
        .find(|cat| cat.id == category_id)
        .map(|cat| cat.children.as_slice())
        .unwrap_or_default()
}
