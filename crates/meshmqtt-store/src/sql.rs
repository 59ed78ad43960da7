//! SQL backend on SQLite, MySQL and PostgreSQL
//!
//! All three databases share one `messages` table. Rows are never updated;
//! reads return the most recent row for an id.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::TryStreamExt;
use meshmqtt_translate::Message;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::{Store, StoreConfig};

/// Maximum pooled connections
const MAX_CONNECTIONS: u32 = 5;

/// SQL flavour behind a DSN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// SQLite file database
    Sqlite,
    /// MySQL or MariaDB
    MySql,
    /// PostgreSQL
    Postgres,
}

impl Dialect {
    /// DSN schemes selecting this dialect
    pub fn schemes(&self) -> &'static [&'static str] {
        match self {
            Dialect::Sqlite => &["sqlite", "sqlite3"],
            Dialect::MySql => &["mysql", "mariadb"],
            Dialect::Postgres => &["postgres", "postgresql", "pg", "psql"],
        }
    }

    /// Scheme the driver expects
    pub fn driver_scheme(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
        }
    }

    /// Bind placeholder for the nth (1-based) parameter
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", n),
            _ => "?".to_string(),
        }
    }

    fn create_table(&self) -> &'static str {
        match self {
            Dialect::Sqlite => {
                "CREATE TABLE IF NOT EXISTS messages (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    message_id VARCHAR(64) NOT NULL,
                    node_from BIGINT NOT NULL,
                    node_to BIGINT NOT NULL,
                    port_num VARCHAR(64) NOT NULL,
                    payload BLOB NOT NULL,
                    json_data TEXT NOT NULL,
                    created_at BIGINT NOT NULL
                )"
            }
            Dialect::MySql => {
                "CREATE TABLE IF NOT EXISTS messages (
                    id BIGINT AUTO_INCREMENT PRIMARY KEY,
                    message_id VARCHAR(64) NOT NULL,
                    node_from BIGINT NOT NULL,
                    node_to BIGINT NOT NULL,
                    port_num VARCHAR(64) NOT NULL,
                    payload LONGBLOB NOT NULL,
                    json_data LONGTEXT NOT NULL,
                    created_at BIGINT NOT NULL,
                    INDEX idx_messages_message_id (message_id)
                )"
            }
            Dialect::Postgres => {
                "CREATE TABLE IF NOT EXISTS messages (
                    id BIGSERIAL PRIMARY KEY,
                    message_id VARCHAR(64) NOT NULL,
                    node_from BIGINT NOT NULL,
                    node_to BIGINT NOT NULL,
                    port_num VARCHAR(64) NOT NULL,
                    payload BYTEA NOT NULL,
                    json_data TEXT NOT NULL,
                    created_at BIGINT NOT NULL
                )"
            }
        }
    }

    fn create_index(&self) -> Option<&'static str> {
        match self {
            Dialect::MySql => None,
            _ => Some(
                "CREATE INDEX IF NOT EXISTS idx_messages_message_id ON messages (message_id)",
            ),
        }
    }
}

/// Message store on a SQL database.
#[derive(Debug, Clone)]
pub struct SqlStore {
    pool: AnyPool,
    dialect: Dialect,
    slow_threshold: Duration,
}

impl SqlStore {
    /// Connect with a driver URL and create the schema
    pub async fn connect(dialect: Dialect, url: &str, config: &StoreConfig) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(url)
            .await?;

        let store = Self {
            pool,
            dialect,
            slow_threshold: config.slow_threshold,
        };
        store.migrate().await?;

        info!(dialect = ?dialect, "SQL store connected");
        Ok(store)
    }

    /// Dialect in use
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Underlying pool
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(self.dialect.create_table())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        if let Some(index) = self.dialect.create_index() {
            sqlx::query(index)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Migration(e.to_string()))?;
        }
        Ok(())
    }

    fn observe(&self, operation: &'static str, started: Instant) {
        let elapsed = started.elapsed();
        if elapsed > self.slow_threshold {
            warn!(
                operation,
                elapsed_ms = elapsed.as_millis() as u64,
                threshold_ms = self.slow_threshold.as_millis() as u64,
                "Slow store query"
            );
        }
    }

    async fn latest(&self, column: &str, message_id: &str) -> Result<Option<AnyRow>> {
        let sql = format!(
            "SELECT {} FROM messages WHERE message_id = {} ORDER BY created_at DESC, id DESC LIMIT 1",
            column,
            self.dialect.placeholder(1)
        );
        let started = Instant::now();
        let row = sqlx::query(&sql)
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?;
        self.observe("get", started);
        Ok(row)
    }
}

#[async_trait]
impl Store for SqlStore {
    async fn save(
        &self,
        message_id: &str,
        port_name: &str,
        raw: &[u8],
        message: &Message,
    ) -> Result<()> {
        let json = String::from_utf8(message.to_json()?)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let p = |n| self.dialect.placeholder(n);
        let sql = format!(
            "INSERT INTO messages (message_id, node_from, node_to, port_num, payload, json_data, created_at) \
             VALUES ({}, {}, {}, {}, {}, {}, {})",
            p(1),
            p(2),
            p(3),
            p(4),
            p(5),
            p(6),
            p(7)
        );

        let started = Instant::now();
        sqlx::query(&sql)
            .bind(message_id)
            .bind(i64::from(message.from))
            .bind(i64::from(message.to))
            .bind(port_name)
            .bind(raw.to_vec())
            .bind(json)
            .bind(chrono::Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await?;
        self.observe("save", started);

        debug!(id = %message_id, port = %port_name, "Message row inserted");
        Ok(())
    }

    async fn get(&self, message_id: &str) -> Result<Message> {
        let row = self
            .latest("json_data", message_id)
            .await?
            .ok_or_else(|| StoreError::message_not_found(message_id))?;
        let json: String = row.try_get("json_data")?;
        Ok(Message::from_json(json.as_bytes())?)
    }

    async fn get_payload(&self, message_id: &str) -> Result<Vec<u8>> {
        let row = self
            .latest("payload", message_id)
            .await?
            .ok_or_else(|| StoreError::message_not_found(message_id))?;
        Ok(row.try_get("payload")?)
    }

    async fn iterate(&self, f: &mut (dyn FnMut(Message) -> Result<()> + Send)) -> Result<()> {
        let started = Instant::now();
        let mut rows =
            sqlx::query("SELECT json_data FROM messages ORDER BY created_at DESC, id DESC")
                .fetch(&self.pool);

        while let Some(row) = rows.try_next().await? {
            let json: String = row.try_get("json_data")?;
            f(Message::from_json(json.as_bytes())?)?;
        }
        self.observe("iterate", started);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        self.dialect.driver_scheme()
    }
}
