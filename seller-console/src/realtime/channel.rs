//! Pure state machine for one realtime channel mount.
//!
//! The async driver feeds it transport and user input and carries out the
//! outputs; nothing here touches the network.

use super::events::{CallSignal, CallType, InboundEvent, OutboundEvent};
use crate::session::Notice;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}

impl ChannelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelState::Disconnected => "disconnected",
            ChannelState::Connecting => "connecting",
            ChannelState::Connected => "connected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

impl std::str::FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(Decision::Accept),
            "reject" => Ok(Decision::Reject),
            other => Err(format!("unknown decision: {other}")),
        }
    }
}

/// An incoming call waiting for the seller to accept or reject it.
#[derive(Debug, Clone, PartialEq)]
pub struct CallPrompt {
    pub id: u64,
    pub signal: CallSignal,
}

impl CallPrompt {
    pub fn caller(&self) -> &str {
        self.signal.from_name()
    }

    pub fn call_type(&self) -> CallType {
        self.signal.call_type()
    }

    pub fn question(&self) -> String {
        format!(
            "{} is calling ({}). Accept?",
            self.caller(),
            self.call_type().as_str()
        )
    }
}

/// A call the seller wants to place to a customer.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingCall {
    pub chat_id: String,
    pub to_user_id: String,
    pub from_name: String,
    pub call_type: CallType,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Mount,
    TransportOpened,
    UserIdKnown(String),
    Inbound(InboundEvent),
    Decide(u64, Decision),
    PlaceCall(OutgoingCall),
    TransportClosed,
    Unmount,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Emit(OutboundEvent),
    Notify(Notice),
    Close,
}

#[derive(Debug)]
pub struct ChannelCore {
    state: ChannelState,
    mounted: bool,
    unmounted: bool,
    user_id: Option<String>,
    joined: bool,
    prompts: Vec<CallPrompt>,
    next_prompt_id: u64,
}

impl Default for ChannelCore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelCore {
    pub fn new() -> Self {
        Self {
            state: ChannelState::Disconnected,
            mounted: false,
            unmounted: false,
            user_id: None,
            joined: false,
            prompts: Vec::new(),
            next_prompt_id: 1,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn has_joined(&self) -> bool {
        self.joined
    }

    pub fn prompts(&self) -> &[CallPrompt] {
        &self.prompts
    }

    pub fn is_unmounted(&self) -> bool {
        self.unmounted
    }

    pub fn handle(&mut self, input: Input) -> Vec<Output> {
        if self.unmounted {
            return Vec::new();
        }

        match input {
            Input::Mount => {
                if !self.mounted {
                    self.mounted = true;
                    self.state = ChannelState::Connecting;
                }
                Vec::new()
            }
            Input::TransportOpened => {
                if self.state == ChannelState::Connecting {
                    self.state = ChannelState::Connected;
                }
                self.try_join()
            }
            Input::UserIdKnown(id) => {
                if self.user_id.is_none() && !id.is_empty() {
                    self.user_id = Some(id);
                }
                self.try_join()
            }
            Input::Inbound(event) => self.on_inbound(event),
            Input::Decide(prompt_id, decision) => self.on_decide(prompt_id, decision),
            Input::PlaceCall(call) => self.on_place_call(call),
            Input::TransportClosed => {
                self.state = ChannelState::Disconnected;
                Vec::new()
            }
            Input::Unmount => {
                self.unmounted = true;
                self.state = ChannelState::Disconnected;
                self.prompts.clear();
                vec![Output::Close]
            }
        }
    }

    /// Join once, and only with both a connection and an identity.
    fn try_join(&mut self) -> Vec<Output> {
        match (&self.user_id, self.state, self.joined) {
            (Some(id), ChannelState::Connected, false) => {
                self.joined = true;
                vec![Output::Emit(OutboundEvent::JoinChatRoom(id.clone()))]
            }
            _ => Vec::new(),
        }
    }

    fn on_inbound(&mut self, event: InboundEvent) -> Vec<Output> {
        // Call listeners only exist once the local identity is known.
        if self.user_id.is_none() {
            return Vec::new();
        }

        match event {
            InboundEvent::CallRequest(signal) => {
                let id = self.next_prompt_id;
                self.next_prompt_id += 1;
                self.prompts.push(CallPrompt { id, signal });
                Vec::new()
            }
            InboundEvent::CallAnswer(_) => vec![Output::Notify(Notice::success(
                "Call accepted. Start your WebRTC flow.",
            ))],
            InboundEvent::CallReject(_) => vec![Output::Notify(Notice::error("Call rejected."))],
            InboundEvent::CallEnd(_) => vec![Output::Notify(Notice::info("Call ended."))],
            InboundEvent::Other(_) => Vec::new(),
        }
    }

    fn on_decide(&mut self, prompt_id: u64, decision: Decision) -> Vec<Output> {
        let Some(local_id) = self.user_id.clone() else {
            return Vec::new();
        };
        let Some(index) = self.prompts.iter().position(|p| p.id == prompt_id) else {
            return Vec::new();
        };

        let prompt = self.prompts.remove(index);
        let reply = prompt.signal.reply_from(&local_id);
        let event = match decision {
            Decision::Accept => OutboundEvent::CallAnswer(reply),
            Decision::Reject => OutboundEvent::CallReject(reply),
        };
        vec![Output::Emit(event)]
    }

    fn on_place_call(&mut self, call: OutgoingCall) -> Vec<Output> {
        if self.state != ChannelState::Connected {
            return vec![Output::Notify(Notice::error("Call connection not ready"))];
        }

        let signal = CallSignal::new(
            &call.chat_id,
            self.user_id.as_deref(),
            &call.from_name,
            &call.to_user_id,
            call.call_type,
            &call.created_at,
        );
        vec![
            Output::Emit(OutboundEvent::CallRequest(signal)),
            Output::Notify(Notice::success(format!(
                "{} call request sent",
                call.call_type.title()
            ))),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn connected(user: Option<&str>) -> ChannelCore {
        let mut core = ChannelCore::new();
        core.handle(Input::Mount);
        core.handle(Input::TransportOpened);
        if let Some(id) = user {
            core.handle(Input::UserIdKnown(id.to_string()));
        }
        core
    }

    fn request_from(caller: &str) -> Input {
        Input::Inbound(InboundEvent::CallRequest(CallSignal::from_value(json!({
            "fromUserId": caller,
            "toUserId": "U1",
            "chatId": "chat-1",
            "callType": "video",
            "fromName": "Bo"
        }))))
    }

    fn joins(outputs: &[Output]) -> usize {
        outputs
            .iter()
            .filter(|o| matches!(o, Output::Emit(OutboundEvent::JoinChatRoom(_))))
            .count()
    }

    #[test]
    fn mount_moves_to_connecting_once() {
        let mut core = ChannelCore::new();
        assert_eq!(core.state(), ChannelState::Disconnected);
        core.handle(Input::Mount);
        assert_eq!(core.state(), ChannelState::Connecting);
        core.handle(Input::TransportOpened);
        core.handle(Input::Mount);
        assert_eq!(core.state(), ChannelState::Connected);
    }

    #[test]
    fn join_waits_for_identity_then_fires_once() {
        let mut core = ChannelCore::new();
        let mut emitted = Vec::new();
        emitted.extend(core.handle(Input::Mount));
        emitted.extend(core.handle(Input::TransportOpened));
        assert_eq!(joins(&emitted), 0);

        emitted.extend(core.handle(Input::UserIdKnown("U1".to_string())));
        emitted.extend(core.handle(Input::UserIdKnown("U1".to_string())));
        emitted.extend(core.handle(Input::TransportOpened));

        assert_eq!(joins(&emitted), 1);
        assert_eq!(
            emitted[0],
            Output::Emit(OutboundEvent::JoinChatRoom("U1".to_string()))
        );
    }

    #[test]
    fn join_waits_for_connection_when_identity_comes_first() {
        let mut core = ChannelCore::new();
        core.handle(Input::Mount);
        assert!(core.handle(Input::UserIdKnown("U1".to_string())).is_empty());

        let outputs = core.handle(Input::TransportOpened);
        assert_eq!(joins(&outputs), 1);
        assert!(core.has_joined());
    }

    #[test]
    fn empty_identity_never_joins() {
        let mut core = connected(None);
        assert!(core.handle(Input::UserIdKnown(String::new())).is_empty());
        assert!(!core.has_joined());
    }

    #[test]
    fn call_events_before_identity_are_dropped() {
        let mut core = connected(None);
        assert!(core.handle(request_from("C1")).is_empty());
        assert!(core.prompts().is_empty());
    }

    #[test]
    fn accepting_a_prompt_answers_the_caller() {
        let mut core = connected(Some("U1"));
        core.handle(request_from("C1"));
        let prompt = core.prompts()[0].clone();
        assert_eq!(prompt.question(), "Bo is calling (video). Accept?");

        let outputs = core.handle(Input::Decide(prompt.id, Decision::Accept));

        let Output::Emit(OutboundEvent::CallAnswer(reply)) = &outputs[0] else {
            panic!("expected call:answer, got {outputs:?}");
        };
        assert_eq!(reply.to_user_id(), Some("C1"));
        assert_eq!(reply.from_user_id(), Some("U1"));
        assert_eq!(reply.chat_id(), Some("chat-1"));
        assert!(core.prompts().is_empty());
    }

    #[test]
    fn rejecting_emits_call_reject() {
        let mut core = connected(Some("U1"));
        core.handle(request_from("C1"));
        let id = core.prompts()[0].id;

        let outputs = core.handle(Input::Decide(id, Decision::Reject));
        assert!(matches!(
            outputs.as_slice(),
            [Output::Emit(OutboundEvent::CallReject(_))]
        ));
    }

    #[test]
    fn unknown_prompt_is_a_no_op() {
        let mut core = connected(Some("U1"));
        assert!(core.handle(Input::Decide(42, Decision::Accept)).is_empty());
    }

    #[test]
    fn answer_reject_end_become_notices_without_state_change() {
        let mut core = connected(Some("U1"));
        let signal = CallSignal::default();

        let answer = core.handle(Input::Inbound(InboundEvent::CallAnswer(signal.clone())));
        let reject = core.handle(Input::Inbound(InboundEvent::CallReject(signal.clone())));
        let end = core.handle(Input::Inbound(InboundEvent::CallEnd(signal)));

        assert_eq!(
            answer,
            vec![Output::Notify(Notice::success("Call accepted. Start your WebRTC flow."))]
        );
        assert_eq!(reject, vec![Output::Notify(Notice::error("Call rejected."))]);
        assert_eq!(end, vec![Output::Notify(Notice::info("Call ended."))]);
        assert_eq!(core.state(), ChannelState::Connected);
    }

    #[test]
    fn placing_a_call_requires_a_connection() {
        let call = OutgoingCall {
            chat_id: "chat-1".to_string(),
            to_user_id: "C1".to_string(),
            from_name: "Ada's Yarn".to_string(),
            call_type: CallType::Audio,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };

        let mut idle = ChannelCore::new();
        idle.handle(Input::Mount);
        assert_eq!(
            idle.handle(Input::PlaceCall(call.clone())),
            vec![Output::Notify(Notice::error("Call connection not ready"))]
        );

        let mut core = connected(Some("U1"));
        let outputs = core.handle(Input::PlaceCall(call));
        let Output::Emit(OutboundEvent::CallRequest(signal)) = &outputs[0] else {
            panic!("expected call:request, got {outputs:?}");
        };
        assert_eq!(signal.from_user_id(), Some("U1"));
        assert_eq!(signal.to_user_id(), Some("C1"));
        assert_eq!(
            outputs[1],
            Output::Notify(Notice::success("Audio call request sent"))
        );
    }

    #[test]
    fn unmount_closes_once_and_silences_everything() {
        let mut core = connected(Some("U1"));
        assert_eq!(core.handle(Input::Unmount), vec![Output::Close]);
        assert_eq!(core.state(), ChannelState::Disconnected);

        assert!(core.handle(Input::Unmount).is_empty());
        assert!(core.handle(request_from("C1")).is_empty());
        assert!(core.handle(Input::TransportOpened).is_empty());
        assert_eq!(core.state(), ChannelState::Disconnected);
    }

    #[test]
    fn transport_loss_is_final() {
        let mut core = connected(Some("U1"));
        core.handle(Input::TransportClosed);
        assert_eq!(core.state(), ChannelState::Disconnected);

        // Only a Connecting channel can become Connected.
        core.handle(Input::TransportOpened);
        assert_eq!(core.state(), ChannelState::Disconnected);
    }
}
