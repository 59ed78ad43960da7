//! Session configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{RelayError, Result};

/// Default broker address
pub const DEFAULT_BROKER: &str = "tcp://localhost:1883";
/// Default MQTT client id
pub const DEFAULT_CLIENT_ID: &str = "meshtastic-mqtt-relay";
/// Default source topic filter
pub const DEFAULT_TOPIC: &str = "msh/ANZ/2/e/#";
/// Default fan-out base topic
pub const DEFAULT_FANOUT_TOPIC: &str = "msh/ANZ/fanout/";
/// Default MQTT keepalive
pub const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(60);
/// Time given to in-progress work when a client disconnects
pub const DEFAULT_QUIESCE: Duration = Duration::from_millis(250);
/// Deadline for a single publish
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(60);
/// Capacity of a session's error channel
pub const ERROR_CHANNEL_CAPACITY: usize = 10;

/// Broker connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Broker URL, e.g. `tcp://localhost:1883`
    pub address: String,
    /// MQTT client id
    pub client_id: String,
    /// Optional username
    pub username: Option<String>,
    /// Optional password
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Keepalive interval
    #[serde(with = "humantime_serde")]
    pub keepalive: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_BROKER.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            username: None,
            password: None,
            keepalive: DEFAULT_KEEPALIVE,
        }
    }
}

impl BrokerConfig {
    /// Copy with `-suffix` appended to the client id
    pub fn with_client_suffix(&self, suffix: &str) -> Self {
        Self {
            client_id: format!("{}-{}", self.client_id, suffix),
            ..self.clone()
        }
    }
}

/// Settings shared by the relay and fan-out sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Broker used for both legs
    pub broker: BrokerConfig,
    /// Topic filter subscribed on the source leg
    pub source_topic: String,
    /// Decode and log without publishing
    pub dry_run: bool,
    /// Deadline for each publish
    #[serde(with = "humantime_serde")]
    pub publish_timeout: Duration,
    /// Disconnect quiesce
    #[serde(with = "humantime_serde")]
    pub quiesce: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            broker: BrokerConfig::default(),
            source_topic: DEFAULT_TOPIC.to_string(),
            dry_run: false,
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
            quiesce: DEFAULT_QUIESCE,
        }
    }
}

impl SessionConfig {
    /// Start building a configuration from defaults
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Broker settings for the subscribing leg
    pub fn source_broker(&self) -> BrokerConfig {
        self.broker.with_client_suffix("source")
    }

    /// Broker settings for the publishing leg
    pub fn dest_broker(&self) -> BrokerConfig {
        self.broker.with_client_suffix("dest")
    }

    /// Reject settings no session can run with
    pub fn validate(&self) -> Result<()> {
        if self.broker.address.trim().is_empty() {
            return Err(RelayError::InvalidConfig("broker address is empty".into()));
        }
        if self.broker.client_id.trim().is_empty() {
            return Err(RelayError::InvalidConfig("client id is empty".into()));
        }
        if !self.broker.keepalive.is_zero() && self.broker.keepalive < Duration::from_secs(1) {
            return Err(RelayError::InvalidConfig(
                "keepalive must be zero or at least one second".into(),
            ));
        }
        if self.source_topic.trim().is_empty() {
            return Err(RelayError::InvalidConfig("source topic is empty".into()));
        }
        if self.publish_timeout.is_zero() {
            return Err(RelayError::InvalidConfig("publish timeout must be positive".into()));
        }
        Ok(())
    }
}

/// Builder for [`SessionConfig`]
#[derive(Debug, Clone, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Broker URL
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.broker.address = address.into();
        self
    }

    /// Base client id
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.broker.client_id = client_id.into();
        self
    }

    /// Broker credentials
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.broker.username = Some(username.into());
        self.config.broker.password = Some(password.into());
        self
    }

    /// Keepalive interval
    pub fn keepalive(mut self, keepalive: Duration) -> Self {
        self.config.broker.keepalive = keepalive;
        self
    }

    /// Source topic filter
    pub fn source_topic(mut self, topic: impl Into<String>) -> Self {
        self.config.source_topic = topic.into();
        self
    }

    /// Dry-run mode
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    /// Publish deadline
    pub fn publish_timeout(mut self, timeout: Duration) -> Self {
        self.config.publish_timeout = timeout;
        self
    }

    /// Disconnect quiesce
    pub fn quiesce(mut self, quiesce: Duration) -> Self {
        self.config.quiesce = quiesce;
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<SessionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Fan-out session settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanoutConfig {
    /// Connection and drain settings
    pub session: SessionConfig,
    /// Prefix of every fan-out topic
    pub base_topic: String,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self::from_session(&SessionConfig::default(), DEFAULT_FANOUT_TOPIC)
    }
}

impl FanoutConfig {
    /// Derive from the relay settings; the client id gains `-fanout`.
    pub fn from_session(session: &SessionConfig, base_topic: impl Into<String>) -> Self {
        Self {
            session: SessionConfig {
                broker: session.broker.with_client_suffix("fanout"),
                ..session.clone()
            },
            base_topic: base_topic.into(),
        }
    }

    /// Reject settings the fan-out session cannot run with
    pub fn validate(&self) -> Result<()> {
        self.session.validate()?;
        if self.base_topic.trim_end_matches('/').is_empty() {
            return Err(RelayError::InvalidConfig("fan-out topic is empty".into()));
        }
        Ok(())
    }
}

/// Durations as humantime strings (`"1m"`, `"250ms"`).
pub mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serialize a duration
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    /// Deserialize a duration
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
