//! Engine.IO v4 / Socket.IO v4 text framing over a raw WebSocket.
//!
//! Only the packets the call-signaling channel needs are modelled: the
//! Engine.IO handshake and heartbeat, and Socket.IO connect, disconnect and
//! event packets on the default namespace.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("empty frame")]
    Empty,
    #[error("unknown engine packet type {0:?}")]
    UnknownEngineType(char),
    #[error("unknown socket packet type {0:?}")]
    UnknownSocketType(char),
    #[error("malformed packet: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    /// `0`: connect request (client) or acknowledgement with handshake data.
    Connect(Option<Value>),
    /// `1`
    Disconnect,
    /// `2["name", payload]`
    Event { name: String, payload: Value },
    /// `4`
    ConnectError(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    /// `0{...}` handshake: sid, pingInterval, pingTimeout.
    Open(Value),
    /// `1`
    Close,
    /// `2`
    Ping,
    /// `3`
    Pong,
    /// `4` followed by a Socket.IO packet.
    Message(SocketPacket),
    /// `6`
    Noop,
}

/// `ws(s)://host/socket.io/?EIO=4&transport=websocket` for an http(s) origin.
pub fn socket_url(origin: &str) -> String {
    let origin = origin.trim_end_matches('/');
    let ws_origin = if let Some(rest) = origin.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = origin.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        origin.to_string()
    };
    format!("{ws_origin}/socket.io/?EIO=4&transport=websocket")
}

pub fn encode(packet: &EnginePacket) -> String {
    match packet {
        EnginePacket::Open(data) => format!("0{data}"),
        EnginePacket::Close => "1".to_string(),
        EnginePacket::Ping => "2".to_string(),
        EnginePacket::Pong => "3".to_string(),
        EnginePacket::Noop => "6".to_string(),
        EnginePacket::Message(socket) => format!("4{}", encode_socket(socket)),
    }
}

fn encode_socket(packet: &SocketPacket) -> String {
    match packet {
        SocketPacket::Connect(None) => "0".to_string(),
        SocketPacket::Connect(Some(data)) => format!("0{data}"),
        SocketPacket::Disconnect => "1".to_string(),
        SocketPacket::Event { name, payload } => {
            format!("2{}", Value::Array(vec![Value::String(name.clone()), payload.clone()]))
        }
        SocketPacket::ConnectError(data) => format!("4{data}"),
    }
}

pub fn decode(frame: &str) -> Result<EnginePacket, ProtocolError> {
    let mut chars = frame.chars();
    let kind = chars.next().ok_or(ProtocolError::Empty)?;
    let rest = chars.as_str();

    match kind {
        '0' => Ok(EnginePacket::Open(parse_json(rest)?)),
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping),
        '3' => Ok(EnginePacket::Pong),
        '4' => Ok(EnginePacket::Message(decode_socket(rest)?)),
        '6' => Ok(EnginePacket::Noop),
        other => Err(ProtocolError::UnknownEngineType(other)),
    }
}

fn decode_socket(body: &str) -> Result<SocketPacket, ProtocolError> {
    let mut chars = body.chars();
    let kind = chars.next().ok_or(ProtocolError::Empty)?;
    let rest = skip_ack_id(skip_namespace(chars.as_str()));

    match kind {
        '0' if rest.is_empty() => Ok(SocketPacket::Connect(None)),
        '0' => Ok(SocketPacket::Connect(Some(parse_json(rest)?))),
        '1' => Ok(SocketPacket::Disconnect),
        '2' => {
            let Value::Array(mut items) = parse_json(rest)? else {
                return Err(ProtocolError::Malformed("event is not an array".to_string()));
            };
            if items.is_empty() {
                return Err(ProtocolError::Malformed("event without a name".to_string()));
            }
            let payload = if items.len() > 1 {
                items.swap_remove(1)
            } else {
                Value::Null
            };
            match items.swap_remove(0) {
                Value::String(name) => Ok(SocketPacket::Event { name, payload }),
                _ => Err(ProtocolError::Malformed("event name is not a string".to_string())),
            }
        }
        '4' => Ok(SocketPacket::ConnectError(parse_json(rest).unwrap_or(Value::Null))),
        other => Err(ProtocolError::UnknownSocketType(other)),
    }
}

/// Drop a leading `/namespace,`.
fn skip_namespace(body: &str) -> &str {
    if body.starts_with('/') {
        match body.find(',') {
            Some(idx) => &body[idx + 1..],
            None => "",
        }
    } else {
        body
    }
}

fn skip_ack_id(body: &str) -> &str {
    body.trim_start_matches(|c: char| c.is_ascii_digit())
}

fn parse_json(text: &str) -> Result<Value, ProtocolError> {
    serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

pub fn connect_request() -> String {
    encode(&EnginePacket::Message(SocketPacket::Connect(None)))
}

pub fn disconnect_request() -> String {
    encode(&EnginePacket::Message(SocketPacket::Disconnect))
}

pub fn event(name: &str, payload: Value) -> String {
    encode(&EnginePacket::Message(SocketPacket::Event {
        name: name.to_string(),
        payload,
    }))
}
