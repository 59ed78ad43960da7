//! Relay session: `/e/` topics republished as JSON on `/json/` topics

use std::sync::Arc;

use async_trait::async_trait;
use meshmqtt_store::Store;
use meshmqtt_translate::encoding::to_base64;
use meshmqtt_translate::{Parser, Translation};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::archive::StoreHook;
use crate::broker::{BrokerClient, InboundMessage};
use crate::config::SessionConfig;
use crate::error::Result;
use crate::mqtt::MqttClient;
use crate::session::{Outbound, SessionCore, SessionState, SessionStatus, StatusSource, TopicRoute};

/// Replace the first `/e/` segment with `/json/`.
pub fn rewrite_topic(topic: &str) -> String {
    topic.replacen("/e/", "/json/", 1)
}

/// Route that keeps the source topic layout.
#[derive(Debug, Clone)]
pub struct RelayRoute {
    parser: Parser,
}

impl RelayRoute {
    /// Route translating with `parser`
    pub fn new(parser: Parser) -> Self {
        Self { parser }
    }

    /// Route archiving every translated message into `store`
    pub fn with_store(store: Option<Arc<dyn Store>>) -> Self {
        let parser = match store {
            Some(store) => Parser::new().with_hook(Arc::new(StoreHook::new(store))),
            None => Parser::new(),
        };
        Self { parser }
    }

    /// Parser in use
    pub fn parser(&self) -> &Parser {
        &self.parser
    }
}

#[async_trait]
impl TopicRoute for RelayRoute {
    fn name(&self) -> &'static str {
        "relay"
    }

    async fn route(&self, message: &InboundMessage) -> Option<Outbound> {
        debug!(topic = %message.topic, payload = %to_base64(&message.payload), "Envelope");

        let translated = match self.parser.process(&message.topic, &message.payload).await {
            Ok(Translation::Message(translated)) => translated,
            Ok(_) => return None,
            Err(e) => {
                warn!(
                    topic = %message.topic,
                    error = %e,
                    code = e.error_code(),
                    "Dropping undecodable envelope"
                );
                return None;
            }
        };

        let body = match translated.to_json() {
            Ok(body) => body,
            Err(e) => {
                warn!(topic = %message.topic, id = translated.id, error = %e, "Encoding failed");
                return None;
            }
        };

        Some(Outbound {
            topic: rewrite_topic(&message.topic),
            body: body.into(),
        })
    }
}

/// Relay session.
pub struct RelaySession {
    core: SessionCore<RelayRoute>,
}

impl RelaySession {
    /// Session over MQTT clients `<clientid>-source` and `<clientid>-dest`
    pub fn new(config: SessionConfig, store: Option<Arc<dyn Store>>) -> Result<Self> {
        config.validate()?;
        let source = Arc::new(MqttClient::new(&config.source_broker(), config.quiesce)?);
        let dest = Arc::new(MqttClient::new(&config.dest_broker(), config.quiesce)?);
        if store.is_some() {
            info!("Relay will archive translated messages");
        }
        Ok(Self::with_clients(
            config,
            RelayRoute::with_store(store),
            source,
            dest,
        ))
    }

    /// Session over caller-supplied clients
    pub fn with_clients(
        config: SessionConfig,
        route: RelayRoute,
        source: Arc<dyn BrokerClient>,
        dest: Arc<dyn BrokerClient>,
    ) -> Self {
        Self {
            core: SessionCore::new(config, route, source, dest),
        }
    }

    /// Relay until cancelled or failed, then drain
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

    /// Handler tasks still running
    pub fn in_flight(&self) -> usize {
        self.core.in_flight()
    }
}

impl StatusSource for RelaySession {
    fn status(&self) -> SessionStatus {
        self.core.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_topic() {
        assert_eq!(
            rewrite_topic("msh/ANZ/2/e/MediumFast/!44be043f"),
            "msh/ANZ/2/json/MediumFast/!44be043f"
        );
    }

    #[test]
    fn test_rewrite_first_occurrence_only() {
        assert_eq!(rewrite_topic("msh/e/x/e/y"), "msh/json/x/e/y");
        assert_eq!(rewrite_topic("msh/ANZ/2/json/x"), "msh/ANZ/2/json/x");
    }

    #[tokio::test]
    async fn test_garbage_is_dropped() {
        let route = RelayRoute::new(Parser::new());
        let message = InboundMessage::new("msh/ANZ/2/e/LongFast/!1", vec![0xff, 0xff, 0xff]);
        assert!(route.route(&message).await.is_none());
    }

    #[test]
    fn test_store_installs_hook() {
        assert!(!RelayRoute::with_store(None).parser().has_hook());
    }
}
