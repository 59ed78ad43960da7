//! Runtime settings
//!
//! Settings are layered: built-in defaults, then `options.json`, then
//! environment variables, then command-line flags. Clap resolves the last
//! two layers together since every flag is bound to its variable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::builder::BoolishValueParser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use meshmqtt_relay::config::{
    humantime_serde, DEFAULT_BROKER, DEFAULT_CLIENT_ID, DEFAULT_FANOUT_TOPIC, DEFAULT_KEEPALIVE,
    DEFAULT_TOPIC,
};
use meshmqtt_relay::{BrokerConfig, FanoutConfig, SessionConfig};
use meshmqtt_store::{StoreConfig, DEFAULT_SLOW_THRESHOLD};

/// Settings file name
pub const OPTIONS_FILE: &str = "options.json";
/// Default health check port
pub const DEFAULT_HEALTHCHECK_PORT: u16 = 8099;

/// Errors loading settings
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The settings file could not be read
    #[error("Unable to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The settings file is not valid
    #[error("Unable to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Broker section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrokerSettings {
    /// Broker URL
    pub address: String,
    /// Base MQTT client id
    pub clientid: String,
    /// Username, empty for anonymous
    pub username: String,
    /// Password
    #[serde(skip_serializing)]
    pub password: String,
    /// Subscribed topic filter
    pub topic: String,
    /// Keepalive interval
    #[serde(with = "humantime_serde")]
    pub keepalive: Duration,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            address: DEFAULT_BROKER.to_string(),
            clientid: DEFAULT_CLIENT_ID.to_string(),
            username: String::new(),
            password: String::new(),
            topic: DEFAULT_TOPIC.to_string(),
            keepalive: DEFAULT_KEEPALIVE,
        }
    }
}

/// Fan-out section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanoutSettings {
    /// Base topic
    pub topic: String,
}

impl Default for FanoutSettings {
    fn default() -> Self {
        Self {
            topic: DEFAULT_FANOUT_TOPIC.to_string(),
        }
    }
}

/// Store section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StoreSettings {
    /// Store DSN, empty for none
    pub dsn: String,
    /// Slow query threshold
    #[serde(with = "humantime_serde")]
    pub slow_threshold: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            dsn: String::new(),
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
        }
    }
}

/// Health check section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthcheckSettings {
    /// Listen port, 0 disables the server
    pub port: u16,
}

impl Default for HealthcheckSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_HEALTHCHECK_PORT,
        }
    }
}

/// Feature toggles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Features {
    /// Run the fan-out session
    pub fanout_relay: bool,
    /// Archive relayed messages
    pub message_store: bool,
}

/// All runtime settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// Debug logging
    pub debug: bool,
    /// Decode without publishing
    pub dry_run: bool,
    /// Broker connection
    pub broker: BrokerSettings,
    /// Fan-out session
    pub fanout: FanoutSettings,
    /// Message store
    pub store: StoreSettings,
    /// Health server
    pub healthcheck: HealthcheckSettings,
    /// Feature toggles
    pub features: Features,
}

/// Flags shared by the binaries, each bound to an environment variable.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Settings file (default: search for options.json)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Debug output
    #[arg(short, long, env = "DEBUG", value_parser = BoolishValueParser::new(),
          num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub debug: Option<bool>,

    /// MQTT broker URL
    #[arg(short, long, env = "MQTT_BROKER")]
    pub broker: Option<String>,

    /// MQTT client ID
    #[arg(short = 'c', long, env = "MQTT_CLIENTID")]
    pub clientid: Option<String>,

    /// MQTT username
    #[arg(short, long, env = "MQTT_USERNAME")]
    pub username: Option<String>,

    /// MQTT password
    #[arg(short, long, env = "MQTT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// MQTT topic
    #[arg(short, long, env = "MQTT_TOPIC")]
    pub topic: Option<String>,

    /// Fan-out topic parent
    #[arg(short, long = "fanout-topic", env = "FANOUT_TOPIC")]
    pub fanout_topic: Option<String>,

    /// Dry run mode
    #[arg(short = 'n', long = "dry-run", env = "MQTT_DRY_RUN", value_parser = BoolishValueParser::new(),
          num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub dry_run: Option<bool>,

    /// Message store DSN
    #[arg(short = 'o', long, env = "STORE_DSN", hide_env_values = true)]
    pub dsn: Option<String>,

    /// Slow store query threshold
    #[arg(long = "slow-threshold", env = "STORE_SLOW_THRESHOLD", value_parser = humantime::parse_duration)]
    pub slow_threshold: Option<Duration>,

    /// MQTT keepalive
    #[arg(long, env = "BROKER_KEEPALIVE", value_parser = humantime::parse_duration)]
    pub keepalive: Option<Duration>,

    /// Health check port, 0 to disable
    #[arg(long = "healthcheck-port", env = "HEALTHCHECK_PORT")]
    pub healthcheck_port: Option<u16>,

    /// Enable the fan-out session
    #[arg(long = "fanout-relay", env = "FEATURE_FANOUT_RELAY", value_parser = BoolishValueParser::new(),
          num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub fanout_relay: Option<bool>,

    /// Enable message archiving
    #[arg(long = "message-store", env = "FEATURE_MESSAGE_STORE", value_parser = BoolishValueParser::new(),
          num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub message_store: Option<bool>,
}

impl Settings {
    /// Load from the discovered settings file and apply overrides
    pub fn load(overrides: &Overrides) -> Result<Self, SettingsError> {
        let path = match &overrides.config {
            Some(path) => Some(path.clone()),
            None => discover(&search_paths()),
        };
        let mut settings = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply(overrides);
        Ok(settings)
    }

    /// Read a settings file
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let bytes = std::fs::read(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply flag and environment values over the current settings
    pub fn apply(&mut self, overrides: &Overrides) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }

        set(&mut self.debug, &overrides.debug);
        set(&mut self.dry_run, &overrides.dry_run);
        set(&mut self.broker.address, &overrides.broker);
        set(&mut self.broker.clientid, &overrides.clientid);
        set(&mut self.broker.username, &overrides.username);
        set(&mut self.broker.password, &overrides.password);
        set(&mut self.broker.topic, &overrides.topic);
        set(&mut self.broker.keepalive, &overrides.keepalive);
        set(&mut self.fanout.topic, &overrides.fanout_topic);
        set(&mut self.store.dsn, &overrides.dsn);
        set(&mut self.store.slow_threshold, &overrides.slow_threshold);
        set(&mut self.healthcheck.port, &overrides.healthcheck_port);
        set(&mut self.features.fanout_relay, &overrides.fanout_relay);
        set(&mut self.features.message_store, &overrides.message_store);
    }

    /// Broker connection settings
    pub fn broker_config(&self) -> BrokerConfig {
        let optional = |s: &str| (!s.is_empty()).then(|| s.to_string());
        BrokerConfig {
            address: self.broker.address.clone(),
            client_id: self.broker.clientid.clone(),
            username: optional(&self.broker.username),
            password: optional(&self.broker.password),
            keepalive: self.broker.keepalive,
        }
    }

    /// Relay session settings
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            broker: self.broker_config(),
            source_topic: self.broker.topic.clone(),
            dry_run: self.dry_run,
            ..SessionConfig::default()
        }
    }

    /// Fan-out session settings
    pub fn fanout_config(&self) -> FanoutConfig {
        FanoutConfig::from_session(&self.session_config(), self.fanout.topic.clone())
    }

    /// Store settings
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            slow_threshold: self.store.slow_threshold,
        }
    }
}

/// Candidate settings files in priority order
pub fn search_paths() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/data"),
        PathBuf::from("./testdata"),
        PathBuf::from("./artifacts"),
    ];
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(PathBuf::from(home).join(".meshtastic-mqtt-relay"));
    }
    dirs.extend([
        PathBuf::from("/etc/meshtastic-mqtt-relay"),
        PathBuf::from("/usr/local/meshtastic-mqtt-relay/etc"),
        PathBuf::from("."),
    ]);
    dirs.into_iter().map(|dir| dir.join(OPTIONS_FILE)).collect()
}

/// First candidate that exists
pub fn discover(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|path| path.is_file()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.broker.address, "tcp://localhost:1883");
        assert_eq!(settings.broker.clientid, "meshtastic-mqtt-relay");
        assert_eq!(settings.broker.topic, "msh/ANZ/2/e/#");
        assert_eq!(settings.broker.keepalive, Duration::from_secs(60));
        assert_eq!(settings.fanout.topic, "msh/ANZ/fanout/");
        assert_eq!(settings.store.slow_threshold, Duration::from_secs(1));
        assert_eq!(settings.healthcheck.port, 8099);
        assert!(!settings.features.fanout_relay);
        assert!(!settings.features.message_store);
    }

    #[test]
    fn test_kebab_case_keys() {
        let json = r#"{
            "dry-run": true,
            "broker": {"address": "mqtts://mqtt.example.org", "keepalive": "30s"},
            "store": {"dsn": "sqlite:///data/messages.db", "slow-threshold": "250ms"},
            "features": {"fanout-relay": true, "message-store": true},
            "channels": [{"name": "LongFast", "key": "AQ=="}]
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert!(settings.dry_run);
        assert_eq!(settings.broker.address, "mqtts://mqtt.example.org");
        assert_eq!(settings.broker.keepalive, Duration::from_secs(30));
        assert_eq!(settings.broker.topic, "msh/ANZ/2/e/#");
        assert_eq!(settings.store.slow_threshold, Duration::from_millis(250));
        assert!(settings.features.fanout_relay);
        assert!(settings.features.message_store);
    }

    #[test]
    fn test_overrides_win() {
        let mut settings = Settings::default();
        settings.broker.username = "file-user".into();
        settings.apply(&Overrides {
            broker: Some("tcp://10.1.1.1:1883".into()),
            dry_run: Some(true),
            healthcheck_port: Some(0),
            ..Default::default()
        });
        assert_eq!(settings.broker.address, "tcp://10.1.1.1:1883");
        assert_eq!(settings.broker.username, "file-user");
        assert!(settings.dry_run);
        assert_eq!(settings.healthcheck.port, 0);
    }

    #[test]
    fn test_session_configs() {
        let mut settings = Settings::default();
        settings.broker.clientid = "gw".into();
        settings.broker.username = "meshdev".into();
        let session = settings.session_config();
        assert_eq!(session.broker.username.as_deref(), Some("meshdev"));
        assert_eq!(session.broker.password, None);
        assert_eq!(session.source_broker().client_id, "gw-source");
        assert_eq!(settings.fanout_config().session.dest_broker().client_id, "gw-fanout-dest");
    }

    #[test]
    fn test_search_paths_order() {
        let paths = search_paths();
        assert_eq!(paths[0], PathBuf::from("/data/options.json"));
        assert_eq!(paths[1], PathBuf::from("./testdata/options.json"));
        assert_eq!(paths.last(), Some(&PathBuf::from("./options.json")));
    }
}
