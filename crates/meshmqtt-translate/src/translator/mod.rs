//! Payload translators
//!
//! Each application port maps to a [`PayloadDecoder`] held in a
//! [`DecoderRegistry`]. Ports without a decoder pass through as raw bytes,
//! so new firmware ports never break translation.
//!
//! # Example
//!
//! ```rust,ignore
//! use meshmqtt_translate::translator::{DecoderRegistry, ProtoDecoder};
//! use meshmqtt_translate::proto::{PortNum, Position};
//!
//! let mut registry = DecoderRegistry::default();
//! registry.register(
//!     PortNum::PositionApp,
//!     ProtoDecoder::new(|p: Position| Payload::Position(p.into())),
//! );
//! let payload = registry.decode(PortNum::PositionApp as i32, &bytes)?;
//! ```

pub mod position;
pub mod routing;
pub mod store_forward;
pub mod telemetry;
pub mod user;

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{Result, TranslateError};
use crate::message::Payload;
use crate::proto::{self, PortNum};

/// Converts the bytes of one application port into a payload.
pub trait PayloadDecoder: Send + Sync {
    /// Decode a payload
    fn decode(&self, bytes: &[u8]) -> Result<Payload>;
}

/// Decodes a protobuf message then converts it.
pub struct ProtoDecoder<M, F> {
    convert: F,
    _message: PhantomData<fn() -> M>,
}

impl<M, F> ProtoDecoder<M, F>
where
    M: prost::Message + Default,
    F: Fn(M) -> Payload + Send + Sync,
{
    /// Create a decoder from a conversion function
    pub fn new(convert: F) -> Self {
        Self {
            convert,
            _message: PhantomData,
        }
    }
}

impl<M, F> PayloadDecoder for ProtoDecoder<M, F>
where
    M: prost::Message + Default,
    F: Fn(M) -> Payload + Send + Sync,
{
    fn decode(&self, bytes: &[u8]) -> Result<Payload> {
        let message = M::decode(bytes)?;
        Ok((self.convert)(message))
    }
}

/// Text messages are UTF-8; invalid sequences are replaced.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDecoder;

impl PayloadDecoder for TextDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Payload> {
        Ok(Payload::Text(String::from_utf8_lossy(bytes).into_owned()))
    }
}

/// Port number to decoder table.
#[derive(Clone)]
pub struct DecoderRegistry {
    decoders: HashMap<i32, Arc<dyn PayloadDecoder>>,
}

impl DecoderRegistry {
    /// Registry with no decoders; every port passes through raw
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Register or replace the decoder for a port
    pub fn register<D>(&mut self, port: PortNum, decoder: D) -> &mut Self
    where
        D: PayloadDecoder + 'static,
    {
        self.decoders.insert(port as i32, Arc::new(decoder));
        self
    }

    /// Check whether a port has a decoder
    pub fn contains(&self, port: i32) -> bool {
        self.decoders.contains_key(&port)
    }

    /// Registered port numbers, ascending
    pub fn ports(&self) -> Vec<i32> {
        let mut ports: Vec<i32> = self.decoders.keys().copied().collect();
        ports.sort_unstable();
        ports
    }

    /// Decode a payload for a port.
    ///
    /// Unregistered ports return [`Payload::Raw`]. Decoder failures are
    /// reported as [`TranslateError::PayloadDecode`].
    pub fn decode(&self, port: i32, bytes: &[u8]) -> Result<Payload> {
        match self.decoders.get(&port) {
            Some(decoder) => decoder
                .decode(bytes)
                .map_err(|e| TranslateError::PayloadDecode {
                    port: PortNum::name_of(port),
                    reason: e.to_string(),
                }),
            None => Ok(Payload::Raw(bytes.to_vec())),
        }
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register(PortNum::TextMessageApp, TextDecoder)
            .register(
                PortNum::TelemetryApp,
                ProtoDecoder::new(|t: proto::Telemetry| Payload::Telemetry(t.into())),
            )
            .register(
                PortNum::NodeinfoApp,
                ProtoDecoder::new(|u: proto::User| Payload::User(u.into())),
            )
            .register(
                PortNum::PositionApp,
                ProtoDecoder::new(|p: proto::Position| Payload::Position(p.into())),
            )
            .register(
                PortNum::StoreForwardApp,
                ProtoDecoder::new(|s: proto::StoreAndForward| Payload::StoreForward(s.into())),
            )
            .register(
                PortNum::TracerouteApp,
                ProtoDecoder::new(|r: proto::RouteDiscovery| Payload::Traceroute(r.into())),
            )
            .register(
                PortNum::RoutingApp,
                ProtoDecoder::new(|r: proto::Routing| Payload::Routing(r.into())),
            );
        registry
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderRegistry")
            .field("ports", &self.ports())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message as _;

    #[test]
    fn test_default_ports() {
        let registry = DecoderRegistry::default();
        assert_eq!(registry.ports(), vec![1, 3, 4, 5, 65, 67, 70]);
    }

    #[test]
    fn test_unknown_port_is_raw() {
        let registry = DecoderRegistry::default();
        let payload = registry.decode(PortNum::WaypointApp as i32, &[1, 2, 3]).unwrap();
        assert_eq!(payload, Payload::Raw(vec![1, 2, 3]));

        let payload = registry.decode(4242, &[9]).unwrap();
        assert_eq!(payload, Payload::Raw(vec![9]));
    }

    #[test]
    fn test_text_is_lossy_utf8() {
        let registry = DecoderRegistry::default();
        let payload = registry.decode(1, b"caf\xc3\xa9 \xff").unwrap();
        assert_eq!(payload, Payload::Text("café \u{fffd}".into()));
    }

    #[test]
    fn test_decode_failure_names_port() {
        let registry = DecoderRegistry::default();
        let err = registry.decode(PortNum::PositionApp as i32, &[0x0d, 0x01]).unwrap_err();
        match err {
            TranslateError::PayloadDecode { port, .. } => assert_eq!(port, "POSITION_APP"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_register_custom_decoder() {
        struct Constant;
        impl PayloadDecoder for Constant {
            fn decode(&self, _bytes: &[u8]) -> Result<Payload> {
                Ok(Payload::Text("waypoint".into()))
            }
        }

        let mut registry = DecoderRegistry::empty();
        assert!(!registry.contains(8));
        registry.register(PortNum::WaypointApp, Constant);
        assert!(registry.contains(8));
        assert_eq!(
            registry.decode(8, &[]).unwrap(),
            Payload::Text("waypoint".into())
        );
    }

    #[test]
    fn test_proto_decoder() {
        let bytes = proto::Routing {
            variant: Some(proto::routing::Variant::ErrorReason(1)),
        }
        .encode_to_vec();
        let registry = DecoderRegistry::default();
        match registry.decode(PortNum::RoutingApp as i32, &bytes).unwrap() {
            Payload::Routing(routing) => {
                assert_eq!(routing.error_reason.unwrap().reason, "NO_ROUTE")
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }
}
