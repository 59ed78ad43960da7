//! MQTT relay sessions for Meshtastic JSON translation
//!
//! Two sessions subscribe to encrypted-topic envelopes (`msh/.../e/...`) and
//! republish each translated packet as JSON:
//!
//! - [`RelaySession`] keeps the topic layout, rewriting `/e/` to `/json/`
//! - [`FanoutSession`] files messages under `base/<node>/<PORT>[/<Subtype>]`
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  BrokerEvent   ┌──────────────┐  Outbound  ┌────────────┐
//! │ source leg   │ ─────────────▶ │ SessionCore  │ ─────────▶ │ dest leg   │
//! │ (subscribe)  │                │ + TopicRoute │            │ (publish)  │
//! └──────────────┘                └──────────────┘            └────────────┘
//!                                        │ ParseHook
//!                                        ▼
//!                                   message store
//! ```
//!
//! Both legs are [`BrokerClient`]s; [`MqttClient`] is the rumqttc
//! implementation.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use meshmqtt_relay::{RelaySession, SessionConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = SessionConfig::builder()
//!     .address("tcp://localhost:1883")
//!     .source_topic("msh/ANZ/2/e/#")
//!     .build()?;
//! let session = RelaySession::new(config, None)?;
//! session.run(CancellationToken::new()).await?;
//! ```

#![warn(missing_docs)]

pub mod archive;
pub mod broker;
pub mod config;
pub mod error;
pub mod fanout;
pub mod mqtt;
pub mod relay;
pub mod session;

// Re-exports for convenience
pub use archive::StoreHook;
pub use broker::{BrokerClient, BrokerEvent, InboundMessage};
pub use config::{BrokerConfig, FanoutConfig, SessionConfig, SessionConfigBuilder};
pub use error::{RelayError, Result};
pub use fanout::{fanout_topic, FanoutRoute, FanoutSession};
pub use mqtt::MqttClient;
pub use relay::{rewrite_topic, RelayRoute, RelaySession};
pub use session::{
    Outbound, SessionCore, SessionState, SessionStatus, StatusSource, TopicRoute,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
