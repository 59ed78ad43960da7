//! Envelope decode dispatcher
//!
//! [`Parser::translate`] turns one raw broker payload into a [`Translation`].
//! A malformed envelope is an error; a malformed inner payload is logged and
//! kept as raw bytes so the call still yields a [`Message`].

use std::sync::Arc;

use async_trait::async_trait;
use prost::Message as _;
use tracing::{debug, error, info, warn};

use crate::encoding::to_base64;
use crate::error::{Result, TranslateError};
use crate::float::SafeFloat;
use crate::message::{Message, Payload};
use crate::proto::{MeshPacket, PortNum, ServiceEnvelope};
use crate::translator::DecoderRegistry;

/// Outcome of translating one envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Translation {
    /// A translated packet, ready to publish
    Message(Message),
    /// The envelope carried no packet data
    EmptyPacket,
    /// The packet is encrypted and cannot be translated
    Encrypted,
}

impl Translation {
    /// The translated message, if any.
    pub fn message(&self) -> Option<&Message> {
        match self {
            Translation::Message(message) => Some(message),
            _ => None,
        }
    }

    /// Consume into the translated message, if any.
    pub fn into_message(self) -> Option<Message> {
        match self {
            Translation::Message(message) => Some(message),
            _ => None,
        }
    }
}

/// Callback run after a packet is translated and before it is published.
///
/// Failures are logged by the parser and never fail the translation.
#[async_trait]
pub trait ParseHook: Send + Sync {
    /// Observe a translated message together with its source envelope
    async fn on_parse(
        &self,
        envelope: &ServiceEnvelope,
        raw: &[u8],
        message: &Message,
    ) -> Result<()>;
}

/// Decode dispatcher.
#[derive(Clone, Default)]
pub struct Parser {
    registry: DecoderRegistry,
    hook: Option<Arc<dyn ParseHook>>,
}

impl Parser {
    /// Parser with the default decoders and no hook
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser with a custom decoder table
    pub fn with_registry(registry: DecoderRegistry) -> Self {
        Self {
            registry,
            hook: None,
        }
    }

    /// Attach a parse hook
    pub fn with_hook(mut self, hook: Arc<dyn ParseHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Check if a parse hook is attached
    pub fn has_hook(&self) -> bool {
        self.hook.is_some()
    }

    /// Decoder table in use
    pub fn registry(&self) -> &DecoderRegistry {
        &self.registry
    }

    /// Decode the outer envelope.
    pub fn decode_envelope(raw: &[u8]) -> Result<ServiceEnvelope> {
        ServiceEnvelope::decode(raw).map_err(|e| TranslateError::EnvelopeDecode(e.to_string()))
    }

    /// Translate raw envelope bytes received on `topic`.
    pub fn translate(&self, topic: &str, raw: &[u8]) -> Result<Translation> {
        let envelope = Self::decode_envelope(raw)?;
        Ok(self.translate_envelope(topic, &envelope))
    }

    /// Translate, then run the parse hook for translated messages.
    pub async fn process(&self, topic: &str, raw: &[u8]) -> Result<Translation> {
        let envelope = Self::decode_envelope(raw)?;
        let translation = self.translate_envelope(topic, &envelope);

        if let (Translation::Message(message), Some(hook)) = (&translation, &self.hook) {
            if let Err(e) = hook.on_parse(&envelope, raw, message).await {
                error!(
                    topic = %topic,
                    id = message.id,
                    error = %e,
                    code = e.error_code(),
                    "Parse hook failed"
                );
            }
        }

        Ok(translation)
    }

    /// Translate an already decoded envelope.
    pub fn translate_envelope(&self, topic: &str, envelope: &ServiceEnvelope) -> Translation {
        let Some(packet) = envelope.packet.as_ref() else {
            info!(topic = %topic, gateway = %envelope.gateway_id, "Envelope has no packet");
            return Translation::EmptyPacket;
        };

        if packet.is_encrypted() {
            info!(topic = %topic, from = packet.from, id = packet.id, "Packet is encrypted");
            return Translation::Encrypted;
        }

        let Some(data) = packet.decoded() else {
            info!(topic = %topic, from = packet.from, id = packet.id, "Packet has no payload");
            return Translation::EmptyPacket;
        };

        let mut message = base_message(topic, packet);
        message.bitfield = data.bitfield;
        message.port = PortNum::name_of(data.portnum);

        debug!(
            topic = %topic,
            port = %message.port,
            payload = %to_base64(&data.payload),
            "Decoding payload"
        );

        let payload = match self.registry.decode(data.portnum, &data.payload) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(
                    topic = %topic,
                    port = %message.port,
                    error = %e,
                    "Payload decode failed, keeping raw bytes"
                );
                Payload::Raw(data.payload.clone())
            }
        };
        message.payload = Some(payload);

        Translation::Message(message)
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("registry", &self.registry)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// Last path segment of a topic.
pub fn sender_from_topic(topic: &str) -> &str {
    topic.rsplit('/').next().unwrap_or_default()
}

fn base_message(topic: &str, packet: &MeshPacket) -> Message {
    Message {
        bitfield: None,
        channel: packet.channel,
        from: packet.from,
        hop_start: packet.hop_start,
        hops_away: i64::from(packet.hop_start) - i64::from(packet.hop_limit),
        id: packet.id,
        payload: None,
        rssi: packet.rx_rssi,
        sender: sender_from_topic(topic).to_string(),
        snr: SafeFloat::from(packet.rx_snr),
        timestamp: packet.rx_time,
        to: packet.to,
        port: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{mesh_packet::PayloadVariant, Data};
    use parking_lot::Mutex;

    const TOPIC: &str = "msh/ANZ/2/e/MediumFast/!44be043f";

    fn envelope(packet: Option<MeshPacket>) -> Vec<u8> {
        ServiceEnvelope {
            packet,
            channel_id: "MediumFast".into(),
            gateway_id: "!44be043f".into(),
        }
        .encode_to_vec()
    }

    fn data_packet(portnum: PortNum, payload: &[u8]) -> MeshPacket {
        MeshPacket {
            from: 2003103871,
            to: 0xffffffff,
            id: 77,
            rx_time: 1762932100,
            rx_snr: 5.5,
            rx_rssi: -101,
            hop_start: 7,
            hop_limit: 4,
            payload_variant: Some(PayloadVariant::Decoded(Data {
                portnum: portnum as i32,
                payload: payload.to_vec(),
                ..Default::default()
            })),
            ..Default::default()
        }
    }

    #[test]
    fn test_malformed_envelope_is_error() {
        let err = Parser::new().translate(TOPIC, &[0x0a, 0xff, 0x01]).unwrap_err();
        assert_eq!(err.error_code(), "ENVELOPE_DECODE");
    }

    #[test]
    fn test_envelope_without_packet() {
        let result = Parser::new().translate(TOPIC, &envelope(None)).unwrap();
        assert_eq!(result, Translation::EmptyPacket);
    }

    #[test]
    fn test_packet_without_payload() {
        let packet = MeshPacket {
            from: 1,
            ..Default::default()
        };
        let result = Parser::new().translate(TOPIC, &envelope(Some(packet))).unwrap();
        assert_eq!(result, Translation::EmptyPacket);
    }

    #[test]
    fn test_encrypted_packet() {
        let packet = MeshPacket {
            from: 1,
            payload_variant: Some(PayloadVariant::Encrypted(vec![1, 2, 3, 4])),
            ..Default::default()
        };
        let result = Parser::new().translate(TOPIC, &envelope(Some(packet))).unwrap();
        assert_eq!(result, Translation::Encrypted);
        assert!(result.message().is_none());
    }

    #[test]
    fn test_base_fields() {
        let raw = envelope(Some(data_packet(PortNum::TextMessageApp, b"hello")));
        let message = Parser::new()
            .translate(TOPIC, &raw)
            .unwrap()
            .into_message()
            .unwrap();
        assert_eq!(message.from, 2003103871);
        assert_eq!(message.hops_away, 3);
        assert_eq!(message.sender, "!44be043f");
        assert_eq!(message.port, "TEXT_MESSAGE_APP");
        assert_eq!(message.rssi, -101);
        assert_eq!(message.snr, SafeFloat(5.5));
        assert_eq!(message.payload, Some(Payload::Text("hello".into())));
        assert_eq!(message.bitfield, None);
    }

    #[test]
    fn test_hops_away_negative_passes_through() {
        let mut packet = data_packet(PortNum::TextMessageApp, b"x");
        packet.hop_start = 1;
        packet.hop_limit = 3;
        let message = Parser::new()
            .translate(TOPIC, &envelope(Some(packet)))
            .unwrap()
            .into_message()
            .unwrap();
        assert_eq!(message.hops_away, -2);
    }

    #[test]
    fn test_inner_decode_failure_keeps_raw() {
        let raw = envelope(Some(data_packet(PortNum::TelemetryApp, &[0x12, 0x40, 0x01])));
        let message = Parser::new()
            .translate(TOPIC, &raw)
            .unwrap()
            .into_message()
            .unwrap();
        assert_eq!(message.port, "TELEMETRY_APP");
        assert_eq!(message.payload, Some(Payload::Raw(vec![0x12, 0x40, 0x01])));
    }

    #[test]
    fn test_unknown_port_number() {
        let mut packet = data_packet(PortNum::TextMessageApp, &[5, 6]);
        if let Some(PayloadVariant::Decoded(data)) = packet.payload_variant.as_mut() {
            data.portnum = 300;
        }
        let message = Parser::new()
            .translate(TOPIC, &envelope(Some(packet)))
            .unwrap()
            .into_message()
            .unwrap();
        assert_eq!(message.port, "300");
        assert_eq!(message.payload, Some(Payload::Raw(vec![5, 6])));
    }

    #[test]
    fn test_sender_from_topic() {
        assert_eq!(sender_from_topic("a/b/!1234"), "!1234");
        assert_eq!(sender_from_topic("single"), "single");
        assert_eq!(sender_from_topic("trailing/"), "");
    }

    struct RecordingHook {
        seen: Mutex<Vec<(u32, usize)>>,
        fail: bool,
    }

    #[async_trait]
    impl ParseHook for RecordingHook {
        async fn on_parse(
            &self,
            envelope: &ServiceEnvelope,
            raw: &[u8],
            message: &Message,
        ) -> Result<()> {
            assert_eq!(envelope.channel_id, "MediumFast");
            self.seen.lock().push((message.id, raw.len()));
            if self.fail {
                return Err(TranslateError::Hook("store unavailable".into()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_process_runs_hook_for_messages() {
        let hook = Arc::new(RecordingHook {
            seen: Mutex::new(Vec::new()),
            fail: false,
        });
        let parser = Parser::new().with_hook(hook.clone());
        assert!(parser.has_hook());

        let raw = envelope(Some(data_packet(PortNum::TextMessageApp, b"hi")));
        let result = parser.process(TOPIC, &raw).await.unwrap();
        assert!(result.message().is_some());
        assert_eq!(hook.seen.lock().as_slice(), &[(77, raw.len())]);

        let encrypted = envelope(Some(MeshPacket {
            payload_variant: Some(PayloadVariant::Encrypted(vec![9])),
            ..Default::default()
        }));
        parser.process(TOPIC, &encrypted).await.unwrap();
        parser.process(TOPIC, &envelope(None)).await.unwrap();
        assert_eq!(hook.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_hook_failure_does_not_fail_translation() {
        let hook = Arc::new(RecordingHook {
            seen: Mutex::new(Vec::new()),
            fail: true,
        });
        let parser = Parser::new().with_hook(hook.clone());
        let raw = envelope(Some(data_packet(PortNum::TextMessageApp, b"hi")));
        let result = parser.process(TOPIC, &raw).await.unwrap();
        assert_eq!(
            result.message().and_then(|m| m.payload.clone()),
            Some(Payload::Text("hi".into()))
        );
        assert_eq!(hook.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_process_rejects_malformed_envelope() {
        let result = Parser::new().process(TOPIC, &[0xff]).await;
        assert!(result.is_err());
    }
}
