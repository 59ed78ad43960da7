//! Meshtastic MQTT envelope translation
//!
//! Meshtastic gateways publish `ServiceEnvelope` protobufs on `msh/.../e/...`
//! topics. This crate decodes those envelopes and turns each packet into a
//! [`Message`], a stable JSON document that dashboards and archives can read
//! without knowing the wire format.
//!
//! # Pipeline
//!
//! 1. [`Parser`] decodes the outer envelope (a failure here is an error)
//! 2. Encrypted and empty packets become [`Translation`] sentinels
//! 3. The packet port selects a [`PayloadDecoder`] from the [`DecoderRegistry`]
//! 4. A failing inner decode is logged and the payload kept as raw bytes
//! 5. An optional [`ParseHook`] observes the message before it is published
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use meshmqtt_translate::{Parser, Translation};
//!
//! let parser = Parser::new();
//! match parser.translate("msh/ANZ/2/e/MediumFast/!44be043f", &bytes)? {
//!     Translation::Message(message) => publish(message.to_json()?),
//!     Translation::Encrypted | Translation::EmptyPacket => {}
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod encoding;
pub mod error;
pub mod float;
pub mod message;
pub mod parser;
#[allow(missing_docs)]
pub mod proto;
#[allow(missing_docs)]
pub mod translator;

pub use error::{Result, TranslateError};
pub use float::SafeFloat;
pub use message::{Message, Payload, BROADCAST_ADDR};
pub use parser::{sender_from_topic, ParseHook, Parser, Translation};
pub use proto::{PortNum, ServiceEnvelope};
pub use translator::telemetry::TelemetryPayload;
pub use translator::{DecoderRegistry, PayloadDecoder, ProtoDecoder, TextDecoder};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
