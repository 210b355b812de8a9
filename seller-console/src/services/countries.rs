use super::error::ApiError;
use crate::config::CountriesSettings;
use reqwest::Client;
use serde_json::Value;
use service_core::observability::TracedClientExt;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Country list for the product form, fetched from a public directory and
/// kept for `cache_ttl_secs`.
pub struct CountriesCache {
    client: Client,
    url: String,
    ttl: Duration,
    cached: RwLock<Option<(Instant, Value)>>,
}

impl CountriesCache {
    pub fn new(settings: &CountriesSettings) -> Self {
        Self {
            client: Client::new(),
            url: settings.url.clone(),
            ttl: Duration::from_secs(settings.cache_ttl_secs),
            cached: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> Result<Value, ApiError> {
        if let Some((fetched_at, body)) = self.cached.read().await.as_ref() {
            if fetched_at.elapsed() < self.ttl {
                return Ok(body.clone());
            }
        }

        let mut slot = self.cached.write().await;
        // Another request may have refilled the slot while we waited.
        if let Some((fetched_at, body)) = slot.as_ref() {
            if fetched_at.elapsed() < self.ttl {
                return Ok(body.clone());
            }
        }

        let response = self.client.traced_get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "Country list fetch failed");
            return Err(ApiError::Http {
                status,
                message: Some("Failed to load countries".to_string()),
            });
        }

        let body = sorted_by_name(response.json().await?);
        *slot = Some((Instant::now(), body.clone()));
        Ok(body)
    }
}

/// Arrays are sorted by `name`; anything else becomes an empty list.
fn sorted_by_name(body: Value) -> Value {
    match body {
        Value::Array(mut items) => {
            items.sort_by(|a, b| {
                let name = |v: &Value| v.get("name").and_then(Value::as_str).unwrap_or("").to_string();
                name(a).cmp(&name(b))
            });
            Value::Array(items)
        }
        _ => Value::Array(Vec::new()),
    }
}
