//! Text framing of Socket.IO (protocol 5) over Engine.IO (protocol 4),
//! default namespace only. Each WebSocket text frame carries one packet.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;

/// Namespace connect request sent once the Engine.IO session is open.
pub(crate) const CONNECT: &str = "40";
/// Namespace disconnect, sent before closing the socket.
pub(crate) const DISCONNECT: &str = "41";
/// Reply to a server heartbeat.
pub(crate) const PONG: &str = "3";

/// Engine.IO session parameters from the server's open packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Packet {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Noop,
    Connect,
    Disconnect,
    ConnectError(String),
    Event {
        name: String,
        args: Vec<Value>,
        ack: Option<u64>,
    },
    Ack {
        id: u64,
        args: Vec<Value>,
    },
}

/// `42["name",data]`
pub(crate) fn event(name: &str, data: &impl Serialize) -> Result<String, serde_json::Error> {
    Ok(format!("42[{},{}]", Value::from(name), serde_json::to_string(data)?))
}

/// `42<id>["name"]`: an argument-less event the server answers with an ack.
pub(crate) fn ack_request(name: &str, id: u64) -> String {
    format!("42{id}[{}]", Value::from(name))
}

pub(crate) fn decode(text: &str) -> Result<Packet, TransportError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or_else(|| malformed(text))?;
    let rest = chars.as_str();
    match kind {
        '0' => Ok(Packet::Open(serde_json::from_str(rest)?)),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        '3' => Ok(Packet::Pong),
        '4' => decode_message(rest).ok_or_else(|| malformed(text)),
        '6' => Ok(Packet::Noop),
        _ => Err(malformed(text)),
    }
}

fn decode_message(text: &str) -> Option<Packet> {
    let mut chars = text.chars();
    let kind = chars.next()?;
    let rest = skip_namespace(chars.as_str());
    let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let (id, payload) = rest.split_at(digits);
    let id = if id.is_empty() { None } else { Some(id.parse().ok()?) };

    match kind {
        '0' => Some(Packet::Connect),
        '1' => Some(Packet::Disconnect),
        '2' => {
            let mut args: Vec<Value> = serde_json::from_str(payload).ok()?;
            if args.is_empty() {
                return None;
            }
            let Value::String(name) = args.remove(0) else {
                return None;
            };
            Some(Packet::Event { name, args, ack: id })
        }
        '3' => Some(Packet::Ack {
            id: id?,
            args: serde_json::from_str(payload).ok()?,
        }),
        '4' => Some(Packet::ConnectError(payload.to_string())),
        _ => None,
    }
}

fn skip_namespace(text: &str) -> &str {
    if text.starts_with('/') {
        text.split_once(',').map_or("", |(_, rest)| rest)
    } else {
        text
    }
}

fn malformed(text: &str) -> TransportError {
    TransportError::Protocol(format!("unrecognized packet {text:?}"))
}
