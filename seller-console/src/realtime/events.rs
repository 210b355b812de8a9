//! Call-signaling events exchanged over the realtime channel.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const JOIN_CHAT_ROOM: &str = "joinChatRoom";
pub const CALL_REQUEST: &str = "call:request";
pub const CALL_ANSWER: &str = "call:answer";
pub const CALL_REJECT: &str = "call:reject";
pub const CALL_END: &str = "call:end";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    #[default]
    Audio,
    Video,
}

impl CallType {
    /// Anything other than `video` is an audio call.
    pub fn from_wire(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("video") => CallType::Video,
            _ => CallType::Audio,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallType::Audio => "audio",
            CallType::Video => "video",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CallType::Audio => "Audio",
            CallType::Video => "Video",
        }
    }
}

/// Payload of the `call:*` events.
///
/// Held as the raw JSON object so fields this console does not know about
/// survive when a payload is echoed back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallSignal(Map<String, Value>);

impl CallSignal {
    pub fn new(
        chat_id: &str,
        from_user_id: Option<&str>,
        from_name: &str,
        to_user_id: &str,
        call_type: CallType,
        created_at: &str,
    ) -> Self {
        let mut fields = Map::new();
        fields.insert("chatId".into(), chat_id.into());
        if let Some(from) = from_user_id {
            fields.insert("fromUserId".into(), from.into());
        }
        fields.insert("fromName".into(), from_name.into());
        fields.insert("toUserId".into(), to_user_id.into());
        fields.insert("callType".into(), call_type.as_str().into());
        fields.insert("createdAt".into(), created_at.into());
        Self(fields)
    }

    /// Non-object payloads read as an empty signal.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self(fields),
            _ => Self::default(),
        }
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn from_user_id(&self) -> Option<&str> {
        self.text("fromUserId")
    }

    pub fn to_user_id(&self) -> Option<&str> {
        self.text("toUserId")
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.text("chatId")
    }

    pub fn from_name(&self) -> &str {
        self.text("fromName").filter(|n| !n.is_empty()).unwrap_or("Caller")
    }

    pub fn call_type(&self) -> CallType {
        CallType::from_wire(self.0.get("callType"))
    }

    pub fn created_at(&self) -> Option<&str> {
        self.text("createdAt")
    }

    /// The payload sent back to the caller: everything kept, with the
    /// direction swapped so it travels from `local_user_id` to the caller.
    pub fn reply_from(&self, local_user_id: &str) -> Self {
        let mut fields = self.0.clone();
        let caller = fields.get("fromUserId").cloned().unwrap_or(Value::Null);
        fields.insert("toUserId".into(), caller);
        fields.insert("fromUserId".into(), local_user_id.into());
        Self(fields)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    CallRequest(CallSignal),
    CallAnswer(CallSignal),
    CallReject(CallSignal),
    CallEnd(CallSignal),
    /// Anything the console does not listen for.
    Other(String),
}

impl InboundEvent {
    pub fn parse(name: &str, payload: Value) -> Self {
        match name {
            CALL_REQUEST => InboundEvent::CallRequest(CallSignal::from_value(payload)),
            CALL_ANSWER => InboundEvent::CallAnswer(CallSignal::from_value(payload)),
            CALL_REJECT => InboundEvent::CallReject(CallSignal::from_value(payload)),
            CALL_END => InboundEvent::CallEnd(CallSignal::from_value(payload)),
            other => InboundEvent::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    JoinChatRoom(String),
    CallRequest(CallSignal),
    CallAnswer(CallSignal),
    CallReject(CallSignal),
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::JoinChatRoom(_) => JOIN_CHAT_ROOM,
            OutboundEvent::CallRequest(_) => CALL_REQUEST,
            OutboundEvent::CallAnswer(_) => CALL_ANSWER,
            OutboundEvent::CallReject(_) => CALL_REJECT,
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            OutboundEvent::JoinChatRoom(user_id) => Value::String(user_id.clone()),
            OutboundEvent::CallRequest(signal)
            | OutboundEvent::CallAnswer(signal)
            | OutboundEvent::CallReject(signal) => signal.clone().into_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_name_and_unknown_type_use_defaults() {
        let signal = CallSignal::from_value(json!({"fromUserId": "C1", "callType": "hologram"}));
        assert_eq!(signal.from_name(), "Caller");
        assert_eq!(signal.call_type(), CallType::Audio);

        let video = CallSignal::from_value(json!({"callType": "video", "fromName": "Bo"}));
        assert_eq!(video.call_type(), CallType::Video);
        assert_eq!(video.from_name(), "Bo");
    }

    #[test]
    fn reply_swaps_direction_and_keeps_unknown_fields() {
        let incoming = CallSignal::from_value(json!({
            "fromUserId": "C1",
            "toUserId": "U1",
            "chatId": "chat-9",
            "callType": "video",
            "sdpHint": {"codec": "vp8"}
        }));

        let reply = incoming.reply_from("U1").into_value();
        assert_eq!(
            reply,
            json!({
                "fromUserId": "U1",
                "toUserId": "C1",
                "chatId": "chat-9",
                "callType": "video",
                "sdpHint": {"codec": "vp8"}
            })
        );
    }

    #[test]
    fn unknown_event_names_are_kept_aside() {
        assert_eq!(
            InboundEvent::parse("typing", json!({})),
            InboundEvent::Other("typing".to_string())
        );
        assert!(matches!(
            InboundEvent::parse(CALL_END, Value::Null),
            InboundEvent::CallEnd(_)
        ));
    }
}
