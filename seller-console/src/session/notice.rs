use super::store::{SessionStore, StoreError, NOTICES};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// A transient notification, shown once by the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// CSS class used by the templates.
    pub fn css(&self) -> &'static str {
        match self.level {
            NoticeLevel::Success => "notice notice-success",
            NoticeLevel::Error => "notice notice-error",
            NoticeLevel::Info => "notice notice-info",
        }
    }
}

async fn load<S: SessionStore + ?Sized>(store: &S) -> Result<Vec<Notice>, StoreError> {
    Ok(store
        .get(NOTICES)
        .await?
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default())
}

pub async fn push_notice<S: SessionStore + ?Sized>(
    store: &S,
    notice: Notice,
) -> Result<(), StoreError> {
    let mut queued = load(store).await?;
    queued.push(notice);
    let encoded =
        serde_json::to_string(&queued).map_err(|e| StoreError(format!("notices: {e}")))?;
    store.insert(NOTICES, encoded).await
}

pub async fn drain_notices<S: SessionStore + ?Sized>(store: &S) -> Result<Vec<Notice>, StoreError> {
    let queued = load(store).await?;
    if !queued.is_empty() {
        store.remove(NOTICES).await?;
    }
    Ok(queued)
}
