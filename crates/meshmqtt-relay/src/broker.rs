//! Broker client abstraction
//!
//! Sessions talk to brokers only through [`BrokerClient`], so tests can swap
//! in an in-memory broker.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::Result;

/// A message delivered by a subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Topic the message was published on
    pub topic: String,
    /// Raw body
    pub payload: Bytes,
}

impl InboundMessage {
    /// Create an inbound message
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Events emitted by a connected client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerEvent {
    /// A subscribed message arrived
    Message(InboundMessage),
    /// The connection came back after a drop; subscriptions must be renewed
    Reconnected,
    /// The connection dropped; the client keeps retrying
    ConnectionLost(String),
}

/// One connection to an MQTT broker.
#[async_trait]
pub trait BrokerClient: Send + Sync + 'static {
    /// Connect and wait for the broker's acknowledgment.
    ///
    /// The returned receiver yields every event until the client is
    /// disconnected.
    async fn connect(&self) -> Result<mpsc::Receiver<BrokerEvent>>;

    /// Subscribe and wait for the broker to grant the filter
    async fn subscribe(&self, filter: &str) -> Result<()>;

    /// Publish at QoS 0 without the retain flag
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<()>;

    /// Disconnect, giving in-progress work the quiesce period
    async fn disconnect(&self) -> Result<()>;

    /// Check if the client currently holds a connection
    fn is_connected(&self) -> bool;

    /// Client id, for logging
    fn client_id(&self) -> &str;
}
