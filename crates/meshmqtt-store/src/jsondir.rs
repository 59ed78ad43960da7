//! Directory-of-files backend
//!
//! Each message is written as two files named `{id}_{PORT}`: `.enc` holds
//! the raw envelope and `.json` the translated document. Writes go to a
//! temporary file first and are renamed into place, so readers never see a
//! partial file.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use meshmqtt_translate::Message;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::Store;

const RAW_EXTENSION: &str = "enc";
const JSON_EXTENSION: &str = "json";

/// Message store backed by a directory.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Open the directory, creating it if needed
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "JSON directory store ready");
        Ok(Self { dir })
    }

    /// Directory holding the files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(message_id: &str, port_name: &str, extension: &str) -> String {
        format!("{}_{}.{}", message_id, port_name, extension)
    }

    async fn write_atomic(&self, name: &str, contents: &[u8]) -> Result<()> {
        let tmp = self.dir.join(format!(".tmp-{}", Uuid::new_v4()));
        if let Err(e) = fs::write(&tmp, contents).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, self.dir.join(name)).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Files with the given extension, newest first; ties broken by name.
    async fn list(&self, extension: &str, prefix: Option<&str>) -> Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut found: Vec<(SystemTime, PathBuf)> = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with(".tmp-") {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            if let Some(prefix) = prefix {
                if !name.starts_with(prefix) {
                    continue;
                }
            }
            let modified = entry
                .metadata()
                .await?
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH);
            found.push((modified, path));
        }

        found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        Ok(found.into_iter().map(|(_, path)| path).collect())
    }

    async fn newest(&self, message_id: &str, extension: &str) -> Result<PathBuf> {
        let prefix = format!("{}_", message_id);
        self.list(extension, Some(&prefix))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::message_not_found(message_id))
    }
}

#[async_trait]
impl Store for JsonDirStore {
    async fn save(
        &self,
        message_id: &str,
        port_name: &str,
        raw: &[u8],
        message: &Message,
    ) -> Result<()> {
        let json = message.to_json()?;
        self.write_atomic(&Self::file_name(message_id, port_name, RAW_EXTENSION), raw)
            .await?;
        self.write_atomic(&Self::file_name(message_id, port_name, JSON_EXTENSION), &json)
            .await?;
        debug!(id = %message_id, port = %port_name, "Message written");
        Ok(())
    }

    async fn get(&self, message_id: &str) -> Result<Message> {
        let path = self.newest(message_id, JSON_EXTENSION).await?;
        let bytes = fs::read(&path).await?;
        Ok(Message::from_json(&bytes)?)
    }

    async fn get_payload(&self, message_id: &str) -> Result<Vec<u8>> {
        let path = self.newest(message_id, RAW_EXTENSION).await?;
        Ok(fs::read(&path).await?)
    }

    async fn iterate(&self, f: &mut (dyn FnMut(Message) -> Result<()> + Send)) -> Result<()> {
        for path in self.list(JSON_EXTENSION, None).await? {
            let bytes = match fs::read(&path).await {
                Ok(bytes) => bytes,
                // removed between listing and reading
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            match Message::from_json(&bytes) {
                Ok(message) => f(message)?,
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable message"),
            }
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "jsondir"
    }
}
