//! Fan-out session: one topic per node, port and telemetry kind

use std::sync::Arc;

use async_trait::async_trait;
use meshmqtt_translate::{Message, Parser, Translation};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::broker::{BrokerClient, InboundMessage};
use crate::config::FanoutConfig;
use crate::error::Result;
use crate::mqtt::MqttClient;
use crate::session::{Outbound, SessionCore, SessionState, SessionStatus, StatusSource, TopicRoute};

/// `base/<from>/<PORT>[/<Subtype>]` for a translated message.
pub fn fanout_topic(base: &str, message: &Message) -> String {
    let mut topic = format!(
        "{}/{}/{}",
        base.trim_end_matches('/'),
        message.from,
        message.port
    );
    if let Some(subtype) = message.subtype() {
        topic.push('/');
        topic.push_str(subtype);
    }
    topic
}

/// Route deriving topics from the translated message.
#[derive(Debug, Clone)]
pub struct FanoutRoute {
    parser: Parser,
    base_topic: String,
}

impl FanoutRoute {
    /// Route publishing under `base_topic`
    pub fn new(base_topic: impl Into<String>) -> Self {
        Self {
            parser: Parser::new(),
            base_topic: base_topic.into(),
        }
    }

    /// Base topic
    pub fn base_topic(&self) -> &str {
        &self.base_topic
    }
}

#[async_trait]
impl TopicRoute for FanoutRoute {
    fn name(&self) -> &'static str {
        "fanout"
    }

    async fn route(&self, message: &InboundMessage) -> Option<Outbound> {
        let translated = match self.parser.translate(&message.topic, &message.payload) {
            Ok(Translation::Message(translated)) => translated,
            Ok(_) => return None,
            Err(e) => {
                warn!(topic = %message.topic, error = %e, code = e.error_code(), "Dropping undecodable envelope");
                return None;
            }
        };

        match translated.to_json() {
            Ok(body) => Some(Outbound {
                topic: fanout_topic(&self.base_topic, &translated),
                body: body.into(),
            }),
            Err(e) => {
                warn!(topic = %message.topic, id = translated.id, error = %e, "Encoding failed");
                None
            }
        }
    }
}

/// Fan-out session. Never archives.
pub struct FanoutSession {
    core: SessionCore<FanoutRoute>,
}

impl FanoutSession {
    /// Session over MQTT clients `<clientid>-fanout-source` and `<clientid>-fanout-dest`
    pub fn new(config: FanoutConfig) -> Result<Self> {
        config.validate()?;
        let session = config.session;
        let source = Arc::new(MqttClient::new(&session.source_broker(), session.quiesce)?);
        let dest = Arc::new(MqttClient::new(&session.dest_broker(), session.quiesce)?);
        Ok(Self {
            core: SessionCore::new(session, FanoutRoute::new(config.base_topic), source, dest),
        })
    }

    /// Session over caller-supplied clients
    pub fn with_clients(
        config: FanoutConfig,
        source: Arc<dyn BrokerClient>,
        dest: Arc<dyn BrokerClient>,
    ) -> Self {
        Self {
            core: SessionCore::new(
                config.session,
                FanoutRoute::new(config.base_topic),
                source,
                dest,
            ),
        }
    }

    /// Fan out until cancelled or failed, then drain
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        self.core.run(cancel).await
    }

    /// Drain and stop
    pub async fn stop(&self) {
        self.core.stop().await
    }

    /// Lifecycle state
    pub fn state(&self) -> SessionState {
        self.core.state()
    }

    /// Connectivity snapshot
    pub fn status(&self) -> SessionStatus {
        self.core.status()
    }
}

impl StatusSource for FanoutSession {
    fn status(&self) -> SessionStatus {
        self.core.status()
    }
}
