//! Meshtastic MQTT Relay
//!
//! Subscribes to encrypted-topic envelopes and republishes them as JSON:
//! - Relay session on the `/json/` mirror of each topic
//! - Optional fan-out session under `<fanout-topic>/<node>/<PORT>`
//! - Optional message archive
//! - Health check endpoint

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use meshmqtt_node::{health, init_tracing, open_configured_store, HealthState, Overrides, Settings, VERSION};
use meshmqtt_relay::{FanoutSession, RelaySession, StatusSource};

#[derive(Parser, Debug)]
#[command(name = "meshtastic-mqtt-relay", version)]
#[command(about = "Relay Meshtastic MQTT protobuf envelopes as JSON")]
struct Args {
    #[command(flatten)]
    overrides: Overrides,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(&args.overrides)?;
    init_tracing(settings.debug)?;

    info!(
        version = VERSION,
        broker = %settings.broker.address,
        topic = %settings.broker.topic,
        fanout_topic = %settings.fanout.topic,
        fanout_relay = settings.features.fanout_relay,
        message_store = settings.features.message_store,
        dry_run = settings.dry_run,
        "Starting Meshtastic MQTT Relay"
    );

    let store = open_configured_store(&settings)
        .await
        .context("Failed to open message store")?;

    let relay = Arc::new(RelaySession::new(settings.session_config(), store.clone())?);
    let mut health_state = HealthState::new(relay.clone() as Arc<dyn StatusSource>);

    let fanout = if settings.features.fanout_relay {
        let session = Arc::new(FanoutSession::new(settings.fanout_config())?);
        health_state = health_state.with_fanout(session.clone() as Arc<dyn StatusSource>);
        Some(session)
    } else {
        None
    };

    let cancel = CancellationToken::new();
    let mut tasks: JoinSet<Result<()>> = JoinSet::new();

    {
        let relay = relay.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move { relay.run(cancel).await.context("Relay session failed") });
    }

    if let Some(fanout) = &fanout {
        let fanout = fanout.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move { fanout.run(cancel).await.context("Fan-out session failed") });
    }

    if settings.healthcheck.port > 0 {
        let listener = health::bind(settings.healthcheck.port)
            .await
            .with_context(|| format!("Failed to bind health check port {}", settings.healthcheck.port))?;
        let cancel = cancel.clone();
        tasks.spawn(async move {
            health::serve(listener, health_state, cancel)
                .await
                .context("Health check server failed")
        });
    }

    let mut failure = None;
    tokio::select! {
        _ = shutdown_signal() => {}
        Some(joined) = tasks.join_next() => {
            failure = task_failure(joined);
        }
    }

    info!("Shutting down");
    cancel.cancel();
    while let Some(joined) = tasks.join_next().await {
        if let Some(e) = task_failure(joined) {
            failure.get_or_insert(e);
        }
    }

    if let Some(store) = store {
        if let Err(e) = store.close().await {
            warn!(error = %e, "Failed to close message store");
        }
    }

    match failure {
        Some(e) => {
            error!(error = %format!("{e:#}"), "Exited with error");
            Err(e)
        }
        None => {
            info!("Stopped");
            Ok(())
        }
    }
}

fn task_failure(joined: Result<Result<()>, tokio::task::JoinError>) -> Option<anyhow::Error> {
    match joined {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e),
        Err(e) => Some(anyhow::Error::new(e).context("Task panicked")),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Signal received, starting graceful shutdown");
}
