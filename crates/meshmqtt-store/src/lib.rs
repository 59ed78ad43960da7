//! Message archive for the Meshtastic MQTT relay
//!
//! Every translated packet can be kept together with its raw envelope so it
//! can be inspected or republished later. Backends are selected by the DSN
//! scheme:
//!
//! | Scheme | Backend |
//! |--------|---------|
//! | `jsondir`, `dir`, `file` | [`JsonDirStore`], one `.enc` + `.json` pair per message |
//! | `sqlite`, `sqlite3` | [`SqlStore`] on SQLite |
//! | `mysql`, `mariadb` | [`SqlStore`] on MySQL / MariaDB |
//! | `postgres`, `postgresql`, `pg`, `psql` | [`SqlStore`] on PostgreSQL |
//!
//! ## Example
//!
//! ```ignore
//! use meshmqtt_store::{open_store, StoreConfig};
//!
//! let store = open_store("sqlite:///data/messages.db", &StoreConfig::default()).await?;
//! store.save("1709065577", "POSITION_APP", &raw, &message).await?;
//! let again = store.get("1709065577").await?;
//! store.close().await?;
//! ```

pub mod dsn;
pub mod error;
pub mod jsondir;
pub mod sql;

use std::time::Duration;

use async_trait::async_trait;
use meshmqtt_translate::Message;

pub use dsn::{open_store, sanitize_dsn, StoreFactory};
pub use error::{Result, StoreError};
pub use jsondir::JsonDirStore;
pub use sql::{Dialect, SqlStore};

/// Default threshold above which a query is logged as slow
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_secs(1);

/// Backend-independent store settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Queries slower than this are logged at warn
    pub slow_threshold: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
        }
    }
}

/// Message archive.
///
/// Implementations must accept concurrent `save` calls. Dropping a returned
/// future cancels the operation.
#[async_trait]
pub trait Store: Send + Sync {
    /// Persist a translated message and its raw envelope
    async fn save(&self, message_id: &str, port_name: &str, raw: &[u8], message: &Message)
        -> Result<()>;

    /// Most recent message stored under an id
    async fn get(&self, message_id: &str) -> Result<Message>;

    /// Raw envelope bytes of the most recent message stored under an id
    async fn get_payload(&self, message_id: &str) -> Result<Vec<u8>>;

    /// Visit every message, newest first. An error from `f` stops the walk.
    async fn iterate(&self, f: &mut (dyn FnMut(Message) -> Result<()> + Send)) -> Result<()>;

    /// Release backend resources
    async fn close(&self) -> Result<()>;

    /// Backend name for logging
    fn backend(&self) -> &'static str;
}
