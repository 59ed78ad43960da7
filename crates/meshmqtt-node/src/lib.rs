//! Meshtastic MQTT relay daemon
//!
//! Wiring for the `meshtastic-mqtt-relay` and `store-query` binaries:
//! layered [`Settings`], logging setup, optional message store and the
//! [`health`] endpoint.

pub mod health;
pub mod settings;

use std::sync::Arc;

use meshmqtt_store::{open_store, Store, StoreError};
use tracing::{debug, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub use health::{HealthReport, HealthState};
pub use settings::{Overrides, Settings, SettingsError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the global subscriber. `RUST_LOG` wins over `debug`.
pub fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Open the archive store when the feature is on and a DSN is set
pub async fn open_configured_store(
    settings: &Settings,
) -> Result<Option<Arc<dyn Store>>, StoreError> {
    if !settings.features.message_store {
        info!("Message store feature disabled, not archiving messages");
        return Ok(None);
    }
    if settings.store.dsn.is_empty() {
        debug!("No store DSN set, not archiving messages");
        return Ok(None);
    }
    open_store(&settings.store.dsn, &settings.store_config())
        .await
        .map(Some)
}
