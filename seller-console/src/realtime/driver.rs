//! Async driver: one tokio task per mount owning the socket and the
//! [`ChannelCore`].

use super::channel::{
    CallPrompt, ChannelCore, ChannelState, Decision, Input, OutgoingCall, Output,
};
use super::events::{InboundEvent, OutboundEvent};
use super::protocol::{self, EnginePacket, SocketPacket};
use crate::session::Notice;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel {0} is no longer running")]
    Closed(Uuid),
}

#[derive(Debug)]
enum Command {
    SetUserId(String),
    Decide(u64, Decision),
    PlaceCall(OutgoingCall),
}

impl From<Command> for Input {
    fn from(command: Command) -> Self {
        match command {
            Command::SetUserId(id) => Input::UserIdKnown(id),
            Command::Decide(id, decision) => Input::Decide(id, decision),
            Command::PlaceCall(call) => Input::PlaceCall(call),
        }
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    state: ChannelState,
    prompts: Vec<CallPrompt>,
}

/// Cheap, cloneable handle to a running channel.
#[derive(Clone)]
pub struct ChannelHandle {
    id: Uuid,
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<Snapshot>,
    notices: Arc<Mutex<Vec<Notice>>>,
    cancel: CancellationToken,
}

impl ChannelHandle {
    /// Start a channel against the socket service at `origin`
    /// (e.g. `http://localhost:5000`).
    pub fn mount(origin: &str) -> Self {
        let id = Uuid::new_v4();
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot) = watch::channel(Snapshot {
            state: ChannelState::Disconnected,
            prompts: Vec::new(),
        });
        let notices = Arc::new(Mutex::new(Vec::new()));
        let cancel = CancellationToken::new();

        let driver = Driver {
            id,
            core: ChannelCore::new(),
            commands: command_rx,
            snapshot: snapshot_tx,
            notices: notices.clone(),
            cancel: cancel.clone(),
            writer: None,
        };
        let url = protocol::socket_url(origin);
        tokio::spawn(driver.run(url));

        Self {
            id,
            commands,
            snapshot,
            notices,
            cancel,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn send(&self, command: Command) -> Result<(), ChannelError> {
        self.commands
            .send(command)
            .map_err(|_| ChannelError::Closed(self.id))
    }

    pub fn set_user_id(&self, user_id: impl Into<String>) -> Result<(), ChannelError> {
        self.send(Command::SetUserId(user_id.into()))
    }

    pub fn decide(&self, prompt_id: u64, decision: Decision) -> Result<(), ChannelError> {
        self.send(Command::Decide(prompt_id, decision))
    }

    pub fn place_call(&self, call: OutgoingCall) -> Result<(), ChannelError> {
        self.send(Command::PlaceCall(call))
    }

    pub fn state(&self) -> ChannelState {
        self.snapshot.borrow().state
    }

    pub fn pending_prompts(&self) -> Vec<CallPrompt> {
        self.snapshot.borrow().prompts.clone()
    }

    pub async fn drain_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().await)
    }

    /// Tear the channel down. Idempotent.
    pub fn unmount(&self) {
        self.cancel.cancel();
    }

    pub fn is_unmounted(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

struct Driver {
    id: Uuid,
    core: ChannelCore,
    commands: mpsc::UnboundedReceiver<Command>,
    snapshot: watch::Sender<Snapshot>,
    notices: Arc<Mutex<Vec<Notice>>>,
    cancel: CancellationToken,
    writer: Option<SplitSink<Socket, Message>>,
}

impl Driver {
    async fn run(mut self, url: String) {
        self.step(Input::Mount).await;
        tracing::debug!(mount_id = %self.id, url = %url, "Connecting realtime channel");

        let connected = tokio::select! {
            _ = self.cancel.cancelled() => {
                self.step(Input::Unmount).await;
                return;
            }
            result = connect_async(url.as_str()) => result,
        };

        let mut reader: Option<SplitStream<Socket>> = match connected {
            Ok((socket, _)) => {
                let (writer, reader) = socket.split();
                self.writer = Some(writer);
                Some(reader)
            }
            Err(e) => {
                tracing::debug!(mount_id = %self.id, error = %e, "Realtime connect failed");
                self.step(Input::TransportClosed).await;
                None
            }
        };

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.step(Input::Unmount).await;
                    break;
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.step(command.into()).await,
                    None => {
                        self.step(Input::Unmount).await;
                        break;
                    }
                },
                frame = next_frame(&mut reader) => match frame {
                    Some(Ok(Message::Text(text))) => self.on_frame(&text).await,
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(mount_id = %self.id, "Realtime transport closed");
                        reader = None;
                        self.writer = None;
                        self.step(Input::TransportClosed).await;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(mount_id = %self.id, error = %e, "Realtime socket error");
                        reader = None;
                        self.writer = None;
                        self.step(Input::TransportClosed).await;
                    }
                },
            }
        }

        tracing::debug!(mount_id = %self.id, "Realtime channel stopped");
    }

    async fn on_frame(&mut self, text: &str) {
        match protocol::decode(text) {
            Ok(EnginePacket::Open(_)) => self.write(protocol::connect_request()).await,
            Ok(EnginePacket::Ping) => self.write(protocol::encode(&EnginePacket::Pong)).await,
            Ok(EnginePacket::Message(SocketPacket::Connect(_))) => {
                self.step(Input::TransportOpened).await
            }
            Ok(EnginePacket::Message(SocketPacket::Event { name, payload })) => {
                self.step(Input::Inbound(InboundEvent::parse(&name, payload)))
                    .await
            }
            Ok(EnginePacket::Message(SocketPacket::ConnectError(reason))) => {
                tracing::debug!(mount_id = %self.id, reason = %reason, "Realtime connect refused");
                self.step(Input::TransportClosed).await
            }
            Ok(EnginePacket::Close) | Ok(EnginePacket::Message(SocketPacket::Disconnect)) => {
                self.step(Input::TransportClosed).await
            }
            Ok(EnginePacket::Pong) | Ok(EnginePacket::Noop) => {}
            Err(e) => tracing::debug!(mount_id = %self.id, error = %e, "Ignoring realtime frame"),
        }
    }

    async fn step(&mut self, input: Input) {
        for output in self.core.handle(input) {
            match output {
                Output::Emit(event) => self.emit(event).await,
                Output::Notify(notice) => self.notices.lock().await.push(notice),
                Output::Close => self.close().await,
            }
        }

        self.snapshot.send_replace(Snapshot {
            state: self.core.state(),
            prompts: self.core.prompts().to_vec(),
        });
    }

    async fn emit(&mut self, event: OutboundEvent) {
        tracing::debug!(mount_id = %self.id, event = event.name(), "Emitting realtime event");
        self.write(protocol::event(event.name(), event.payload()))
            .await;
    }

    async fn write(&mut self, frame: String) {
        let Some(writer) = self.writer.as_mut() else {
            tracing::debug!(mount_id = %self.id, "Dropping frame, socket not open");
            return;
        };
        if let Err(e) = writer.send(Message::Text(frame.into())).await {
            tracing::debug!(mount_id = %self.id, error = %e, "Realtime send failed");
        }
    }

    async fn close(&mut self) {
        self.write(protocol::disconnect_request()).await;
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.close().await {
                tracing::debug!(mount_id = %self.id, error = %e, "Realtime close failed");
            }
        }
    }
}

async fn next_frame(
    reader: &mut Option<SplitStream<Socket>>,
) -> Option<Result<Message, tokio_tungstenite::tungstenite::Error>> {
    match reader.as_mut() {
        Some(reader) => reader.next().await,
        None => std::future::pending().await,
    }
}
