//! Parse hook that archives translated messages

use std::sync::Arc;

use async_trait::async_trait;
use meshmqtt_store::Store;
use meshmqtt_translate::{Message, ParseHook, ServiceEnvelope, TranslateError};
use tracing::debug;

/// Saves every translated message with its raw envelope.
///
/// Messages are keyed by packet id in decimal and filed under their port
/// name.
pub struct StoreHook {
    store: Arc<dyn Store>,
}

impl StoreHook {
    /// Archive into `store`
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ParseHook for StoreHook {
    async fn on_parse(
        &self,
        _envelope: &ServiceEnvelope,
        raw: &[u8],
        message: &Message,
    ) -> meshmqtt_translate::Result<()> {
        let id = message.id.to_string();
        self.store
            .save(&id, &message.port, raw, message)
            .await
            .map_err(|e| TranslateError::Hook(format!("{} ({})", e, e.error_code())))?;
        debug!(id = %id, port = %message.port, backend = self.store.backend(), "Message archived");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshmqtt_store::JsonDirStore;
    use meshmqtt_translate::Payload;

    #[tokio::test]
    async fn test_saves_under_packet_id_and_port() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn Store> = Arc::new(JsonDirStore::open(dir.path()).await.unwrap());
        let hook = StoreHook::new(store.clone());

        let message = Message {
            id: 3_735_928_559,
            port: "TEXT_MESSAGE_APP".into(),
            payload: Some(Payload::Text("hi".into())),
            ..Default::default()
        };
        hook.on_parse(&ServiceEnvelope::default(), b"raw", &message)
            .await
            .unwrap();

        assert!(dir.path().join("3735928559_TEXT_MESSAGE_APP.enc").exists());
        assert_eq!(store.get_payload("3735928559").await.unwrap(), b"raw");
    }
}
