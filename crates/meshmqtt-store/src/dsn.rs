//! DSN parsing and backend detection

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use url::Url;

use crate::error::{Result, StoreError};
use crate::jsondir::JsonDirStore;
use crate::sql::{Dialect, SqlStore};
use crate::{Store, StoreConfig};

/// Opens a store for the DSN schemes it recognises.
#[async_trait]
pub trait StoreFactory: Send + Sync {
    /// Check whether this factory handles the DSN
    fn matches(&self, dsn: &Url) -> bool;

    /// Open the backend
    async fn open(&self, dsn: &Url, config: &StoreConfig) -> Result<Arc<dyn Store>>;
}

/// Factory for [`JsonDirStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDirFactory;

#[async_trait]
impl StoreFactory for JsonDirFactory {
    fn matches(&self, dsn: &Url) -> bool {
        matches!(dsn.scheme(), "jsondir" | "dir" | "file")
    }

    async fn open(&self, dsn: &Url, _config: &StoreConfig) -> Result<Arc<dyn Store>> {
        let store = JsonDirStore::open(directory_from_url(dsn)?).await?;
        Ok(Arc::new(store))
    }
}

/// Factory for [`SqlStore`] on one dialect.
#[derive(Debug, Clone, Copy)]
pub struct SqlFactory(pub Dialect);

#[async_trait]
impl StoreFactory for SqlFactory {
    fn matches(&self, dsn: &Url) -> bool {
        self.0.schemes().contains(&dsn.scheme())
    }

    async fn open(&self, dsn: &Url, config: &StoreConfig) -> Result<Arc<dyn Store>> {
        let store = SqlStore::connect(self.0, &driver_url(dsn, self.0), config).await?;
        Ok(Arc::new(store))
    }
}

/// Factories in detection order.
pub fn factories() -> Vec<Box<dyn StoreFactory>> {
    vec![
        Box::new(JsonDirFactory),
        Box::new(SqlFactory(Dialect::Sqlite)),
        Box::new(SqlFactory(Dialect::MySql)),
        Box::new(SqlFactory(Dialect::Postgres)),
    ]
}

/// Parse a DSN, rejecting empty input.
pub fn parse_dsn(dsn: &str) -> Result<Url> {
    let dsn = dsn.trim();
    if dsn.is_empty() {
        return Err(StoreError::EmptyDsn);
    }
    Url::parse(dsn).map_err(|e| StoreError::InvalidDsn(format!("{}: {}", sanitize_str(dsn), e)))
}

/// Open the backend selected by the DSN scheme.
pub async fn open_store(dsn: &str, config: &StoreConfig) -> Result<Arc<dyn Store>> {
    let url = parse_dsn(dsn)?;
    for factory in factories() {
        if factory.matches(&url) {
            let store = factory.open(&url, config).await?;
            info!(
                dsn = %sanitize_dsn(&url),
                backend = store.backend(),
                "Message store opened"
            );
            return Ok(store);
        }
    }
    Err(StoreError::UnsupportedStore(url.scheme().to_string()))
}

/// DSN with any password replaced by `****`, safe for logs.
pub fn sanitize_dsn(dsn: &Url) -> String {
    let mut sanitized = dsn.clone();
    if sanitized.password().is_some() {
        let _ = sanitized.set_password(Some("****"));
    }
    sanitized.to_string()
}

fn sanitize_str(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(url) => sanitize_dsn(&url),
        Err(_) => "<unparsable dsn>".to_string(),
    }
}

/// Directory named by a JSON directory DSN: host and path joined.
pub fn directory_from_url(dsn: &Url) -> Result<String> {
    let host = dsn.host_str().unwrap_or_default();
    let directory = format!("{}{}", host, dsn.path());
    if directory.is_empty() {
        return Err(StoreError::InvalidDsn(format!(
            "{}: no directory",
            sanitize_dsn(dsn)
        )));
    }
    Ok(directory)
}

/// Rewrite a DSN into the form the SQL driver expects.
pub fn driver_url(dsn: &Url, dialect: Dialect) -> String {
    let rest = &dsn.as_str()[dsn.scheme().len()..];
    let mut url = format!("{}{}", dialect.driver_scheme(), rest);
    if dialect == Dialect::Sqlite && !dsn.query_pairs().any(|(k, _)| k == "mode") {
        url.push(if dsn.query().is_some() { '&' } else { '?' });
        url.push_str("mode=rwc");
    }
    url
}
