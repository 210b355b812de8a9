use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Video,
    Audio,
    File,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Attachment {
    pub url: String,
    pub mime_type: String,
    pub file_name: Option<String>,
    #[serde(rename = "public_id")]
    pub public_id: Option<String>,
}

impl Attachment {
    pub fn kind(&self) -> AttachmentKind {
        let mime = self.mime_type.as_str();
        if mime.starts_with("image/") {
            AttachmentKind::Image
        } else if mime.starts_with("video/") {
            AttachmentKind::Video
        } else if mime.starts_with("audio/") {
            AttachmentKind::Audio
        } else {
            AttachmentKind::File
        }
    }

    pub fn is_image(&self) -> bool {
        self.kind() == AttachmentKind::Image
    }

    pub fn is_video(&self) -> bool {
        self.kind() == AttachmentKind::Video
    }

    pub fn is_audio(&self) -> bool {
        self.kind() == AttachmentKind::Audio
    }

    pub fn label(&self) -> &str {
        self.file_name.as_deref().unwrap_or("File attachment")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatMessage {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: Option<ChatUser>,
    pub text: Option<String>,
    pub attachments: Vec<Attachment>,
    pub date: Option<String>,
}

impl ChatMessage {
    pub fn is_from(&self, user_id: Option<&str>) -> bool {
        match (self.user.as_ref(), user_id) {
            (Some(sender), Some(me)) => sender.id == me,
            _ => false,
        }
    }

    pub fn time_label(&self) -> String {
        self.date
            .as_deref()
            .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.format("%H:%M").to_string())
            .unwrap_or_default()
    }

    /// Attachments with a url; the rest cannot be shown.
    pub fn visible_attachments(&self) -> Vec<&Attachment> {
        self.attachments.iter().filter(|a| !a.url.is_empty()).collect()
    }
}

/// Row of `GET /chat/my-customers`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: Option<ChatUser>,
    pub name: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub updated_at: Option<String>,
}

impl ChatSummary {
    pub fn display_name(&self) -> String {
        let user = self.user.as_ref();
        if let Some(name) = user.and_then(|u| u.name.as_deref()).filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        let joined = user
            .map(|u| {
                [u.first_name.as_deref(), u.last_name.as_deref()]
                    .into_iter()
                    .flatten()
                    .filter(|p| !p.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
        if joined.is_empty() {
            "Customer".to_string()
        } else {
            joined
        }
    }

    pub fn last_message(&self) -> String {
        match self.messages.first() {
            Some(msg) => match msg.text.as_deref().filter(|t| !t.is_empty()) {
                Some(text) => text.to_string(),
                None if !msg.attachments.is_empty() => "Attachment".to_string(),
                None => "No messages yet".to_string(),
            },
            None => "No messages yet".to_string(),
        }
    }
}

/// `GET /chat/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatThread {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: Option<ChatUser>,
    pub messages: Vec<ChatMessage>,
}

impl ChatThread {
    pub fn customer_id(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|u| u.id.as_str())
            .filter(|id| !id.is_empty())
    }
}

/// Extra flags for `POST /chat/message`.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub ask_price: Option<bool>,
    pub product_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attachment_kind_follows_mime_prefix() {
        let kind = |mime: &str| {
            Attachment {
                url: "u".to_string(),
                mime_type: mime.to_string(),
                ..Default::default()
            }
            .kind()
        };
        assert_eq!(kind("image/png"), AttachmentKind::Image);
        assert_eq!(kind("video/mp4"), AttachmentKind::Video);
        assert_eq!(kind("audio/ogg"), AttachmentKind::Audio);
        assert_eq!(kind("application/pdf"), AttachmentKind::File);
        assert_eq!(kind(""), AttachmentKind::File);
    }

    #[test]
    fn summary_names_and_previews() {
        let chat: ChatSummary = serde_json::from_value(json!({
            "_id": "c1",
            "user": {"_id": "u9", "firstName": "Grace", "lastName": "Hopper"},
            "messages": [{"_id": "m1", "attachments": [{"url": "x", "mimeType": "image/png"}]}]
        }))
        .unwrap();
        assert_eq!(chat.display_name(), "Grace Hopper");
        assert_eq!(chat.last_message(), "Attachment");

        let empty = ChatSummary::default();
        assert_eq!(empty.display_name(), "Customer");
        assert_eq!(empty.last_message(), "No messages yet");
    }
}
