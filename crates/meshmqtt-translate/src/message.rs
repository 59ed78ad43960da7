//! Normalized message record
//!
//! A [`Message`] is built once per accepted packet and published as JSON.
//! Its key order is fixed so consumers see a stable document.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;
use crate::float::SafeFloat;
use crate::translator::position::Position;
use crate::translator::routing::{Routing, Traceroute};
use crate::translator::store_forward::StoreForward;
use crate::translator::telemetry::TelemetryPayload;
use crate::translator::user::User;

/// Node number used by Meshtastic for broadcast packets
pub const BROADCAST_ADDR: u32 = 0xFFFF_FFFF;

/// Translated payload of a packet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// Bytes with no registered translator, written as base64
    Raw(#[serde(serialize_with = "crate::encoding::base64_bytes::serialize")] Vec<u8>),
    /// UTF-8 text message
    Text(String),
    /// Telemetry report
    Telemetry(TelemetryPayload),
    /// Node identity
    User(User),
    /// Position fix
    Position(Position),
    /// Traceroute result
    Traceroute(Traceroute),
    /// Routing control packet
    Routing(Routing),
    /// Store-and-forward packet
    StoreForward(StoreForward),
    /// Payload read back from JSON, where the original kind is not recorded
    Json(serde_json::Value),
}

impl Payload {
    /// Telemetry subtype name, if this is a telemetry report with metrics.
    pub fn subtype(&self) -> Option<&'static str> {
        match self {
            Payload::Telemetry(telemetry) => telemetry.subtype(),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(text) => Ok(Payload::Text(text)),
            other => Ok(Payload::Json(other)),
        }
    }
}

/// One translated mesh packet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    /// Data bitfield, only present when the sender set it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitfield: Option<u32>,
    /// Channel index
    pub channel: u32,
    /// Sending node
    pub from: u32,
    /// Hop limit the packet started with
    pub hop_start: u32,
    /// `hop_start - hop_limit`, negative for malformed packets
    pub hops_away: i64,
    /// Packet id
    pub id: u32,
    /// Translated payload, `None` when the packet had no cleartext data
    pub payload: Option<Payload>,
    /// Receive signal strength
    pub rssi: i32,
    /// Last segment of the source topic
    pub sender: String,
    /// Receive signal to noise ratio
    pub snr: SafeFloat,
    /// Receive time, seconds since the epoch
    pub timestamp: u32,
    /// Destination node
    pub to: u32,
    /// Port name
    #[serde(rename = "type")]
    pub port: String,
}

impl Message {
    /// Publish body: compact JSON followed by a newline.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let mut body = serde_json::to_vec(self)?;
        body.push(b'\n');
        Ok(body)
    }

    /// Parse a stored or published body.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Telemetry subtype of the payload.
    pub fn subtype(&self) -> Option<&'static str> {
        self.payload.as_ref().and_then(Payload::subtype)
    }

    /// Check if this packet was addressed to every node
    pub fn is_broadcast(&self) -> bool {
        self.to == BROADCAST_ADDR
    }
}
