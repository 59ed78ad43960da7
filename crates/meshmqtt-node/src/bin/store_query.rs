//! Message store query tool
//!
//! Dumps archived messages as JSON lines, shows one message, or republishes
//! a stored raw envelope to the broker.

use std::io::Write;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use meshmqtt_node::{init_tracing, Overrides, Settings};
use meshmqtt_relay::{BrokerClient, MqttClient};
use meshmqtt_store::{open_store, Store};
use meshmqtt_translate::Message;

#[derive(Parser, Debug)]
#[command(name = "store-query", version)]
#[command(about = "Query the Meshtastic MQTT relay message store")]
struct Args {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every stored message as a JSON line, newest first
    Iterate,
    /// Print one stored message
    Show {
        /// Message id
        id: String,
    },
    /// Publish a stored raw envelope to the configured topic
    Repeat {
        /// Message id
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(&args.overrides)?;
    init_tracing(settings.debug)?;

    if settings.store.dsn.is_empty() {
        bail!("No store DSN set, use --dsn or STORE_DSN");
    }
    let store = open_store(&settings.store.dsn, &settings.store_config())
        .await
        .context("Failed to open message store")?;

    let result = match args.command.unwrap_or(Command::Iterate) {
        Command::Iterate => iterate(store.as_ref()).await,
        Command::Show { id } => show(store.as_ref(), &id).await,
        Command::Repeat { id } => repeat(store.as_ref(), &settings, &id).await,
    };

    store.close().await.context("Failed to close message store")?;
    result
}

async fn iterate(store: &dyn Store) -> Result<()> {
    let stdout = std::io::stdout();
    let mut count = 0usize;
    store
        .iterate(&mut |message: Message| -> meshmqtt_store::Result<()> {
            let line = message.to_json()?;
            stdout.lock().write_all(&line)?;
            count += 1;
            Ok(())
        })
        .await?;
    info!(count, "Done");
    Ok(())
}

async fn show(store: &dyn Store, id: &str) -> Result<()> {
    let message = store.get(id).await?;
    std::io::stdout().write_all(&message.to_json()?)?;
    Ok(())
}

async fn repeat(store: &dyn Store, settings: &Settings, id: &str) -> Result<()> {
    let topic = &settings.broker.topic;
    if topic.contains(['#', '+']) {
        bail!("Cannot publish to wildcard topic {topic}, set --topic to a concrete topic");
    }

    let payload = store.get_payload(id).await?;
    if settings.dry_run {
        info!(id, topic = %topic, bytes = payload.len(), "Dry run, not publishing");
        return Ok(());
    }

    let session = settings.session_config();
    let client = MqttClient::new(&session.dest_broker(), session.quiesce)?;
    let _events = client.connect().await?;
    let published = client.publish(topic, payload.into()).await;
    client.disconnect().await?;
    published?;

    info!(id, topic = %topic, "Published stored envelope");
    Ok(())
}
