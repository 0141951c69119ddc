//! Gateway wire frames and the envelope handed to the dispatcher.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WireError;

/// Gateway opcodes as sent in a frame's `op` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GatewayOpcode {
    Dispatch,
    Heartbeat,
    Identify,
    PresenceUpdate,
    VoiceStateUpdate,
    VoiceServerPing,
    Resume,
    Reconnect,
    RequestGuildMembers,
    InvalidSession,
    Hello,
    HeartbeatAck,
}

impl GatewayOpcode {
    pub const fn code(self) -> u8 {
        match self {
            Self::Dispatch => 0,
            Self::Heartbeat => 1,
            Self::Identify => 2,
            Self::PresenceUpdate => 3,
            Self::VoiceStateUpdate => 4,
            Self::VoiceServerPing => 5,
            Self::Resume => 6,
            Self::Reconnect => 7,
            Self::RequestGuildMembers => 8,
            Self::InvalidSession => 9,
            Self::Hello => 10,
            Self::HeartbeatAck => 11,
        }
    }
}

impl TryFrom<u8> for GatewayOpcode {
    type Error = WireError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::Dispatch,
            1 => Self::Heartbeat,
            2 => Self::Identify,
            3 => Self::PresenceUpdate,
            4 => Self::VoiceStateUpdate,
            5 => Self::VoiceServerPing,
            6 => Self::Resume,
            7 => Self::Reconnect,
            8 => Self::RequestGuildMembers,
            9 => Self::InvalidSession,
            10 => Self::Hello,
            11 => Self::HeartbeatAck,
            other => return Err(WireError::UnknownOpcode(other)),
        })
    }
}

impl From<GatewayOpcode> for u8 {
    fn from(op: GatewayOpcode) -> Self {
        op.code()
    }
}

/// One frame as received from the gateway socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayFrame {
    pub op: GatewayOpcode,
    #[serde(default)]
    pub d: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewayFrame {
    pub fn dispatch(tag: impl Into<String>, body: Value) -> Self {
        Self {
            op: GatewayOpcode::Dispatch,
            d: body,
            s: None,
            t: Some(tag.into()),
        }
    }

    pub fn is_dispatch(&self) -> bool {
        self.op == GatewayOpcode::Dispatch
    }

    /// The dispatch payload of this frame; `None` for control frames and for
    /// dispatches missing their tag.
    pub fn into_envelope(self) -> Option<RawEnvelope> {
        if !self.is_dispatch() {
            return None;
        }
        let tag = self.t?;
        Some(RawEnvelope {
            tag,
            body: self.d,
            sequence: self.s,
        })
    }
}

/// A dispatch as handed over by the transport: discriminator tag plus body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEnvelope {
    #[serde(rename = "t")]
    pub tag: String,
    #[serde(rename = "d", default)]
    pub body: Value,
    #[serde(rename = "s", default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
}

impl RawEnvelope {
    pub fn new(tag: impl Into<String>, body: Value) -> Self {
        Self {
            tag: tag.into(),
            body,
            sequence: None,
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = Some(sequence);
        self
    }
}
