//! Call-signaling channel over the backend's Socket.IO endpoint.
//!
//! [`channel`] holds the pure state machine, [`driver`] runs it against a
//! websocket, and [`registry`] ties channels to seller sessions.

pub mod channel;
pub mod driver;
pub mod events;
pub mod protocol;
pub mod registry;

pub use channel::{CallPrompt, ChannelCore, ChannelState, Decision, OutgoingCall};
pub use driver::{ChannelError, ChannelHandle};
pub use events::{CallSignal, CallType};
pub use registry::ChannelRegistry;
