//! Session engine shared by the relay and fan-out sessions
//!
//! A session owns two broker clients. The source leg subscribes to the
//! configured filter; every inbound message is handled in its own task,
//! routed to an output topic by a [`TopicRoute`] and published on the
//! destination leg.
//!
//! # Lifecycle
//!
//! ```text
//! Idle -> Connecting(source) + Connecting(dest) -> Ready -> Draining -> Stopped
//! ```
//!
//! [`SessionCore::run`] ends on the first of parent cancellation, an explicit
//! [`SessionCore::stop`], or a transport error. It always drains before
//! returning: both clients are disconnected and every handler task is
//! awaited.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::broker::{BrokerClient, BrokerEvent, InboundMessage};
use crate::config::{SessionConfig, ERROR_CHANNEL_CAPACITY};
use crate::error::{RelayError, Result};

/// A message ready to publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    /// Destination topic
    pub topic: String,
    /// Body
    pub body: Bytes,
}

/// Maps an inbound message to what the session publishes.
#[async_trait]
pub trait TopicRoute: Send + Sync + 'static {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Decode and address an inbound message.
    ///
    /// `None` means nothing is published; failures are logged by the route.
    async fn route(&self, message: &InboundMessage) -> Option<Outbound>;
}

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Not started
    Idle,
    /// Waiting for the brokers
    Connecting,
    /// Subscribed and relaying
    Ready,
    /// Waiting for handlers to finish
    Draining,
    /// Fully stopped
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Ready => "ready",
            SessionState::Draining => "draining",
            SessionState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Point-in-time connectivity snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Source leg connected
    pub source_broker_connected: bool,
    /// Destination leg connected
    pub dest_broker_connected: bool,
    /// Overall health
    pub status: bool,
}

/// Anything that can report a [`SessionStatus`] without blocking.
pub trait StatusSource: Send + Sync {
    /// Current status
    fn status(&self) -> SessionStatus;
}

struct Inner<R> {
    name: &'static str,
    config: SessionConfig,
    route: R,
    source: Arc<dyn BrokerClient>,
    dest: Arc<dyn BrokerClient>,
    legs: TaskTracker,
    handlers: TaskTracker,
    shutdown: CancellationToken,
    errors_tx: mpsc::Sender<RelayError>,
    errors_rx: Mutex<Option<mpsc::Receiver<RelayError>>>,
    dest_ready: watch::Sender<bool>,
    state: Mutex<SessionState>,
    stopping: AtomicBool,
}

/// Connection, dispatch and drain engine.
pub struct SessionCore<R: TopicRoute> {
    inner: Arc<Inner<R>>,
}

impl<R: TopicRoute> Clone for SessionCore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: TopicRoute> SessionCore<R> {
    /// Create a session over two clients
    pub fn new(
        config: SessionConfig,
        route: R,
        source: Arc<dyn BrokerClient>,
        dest: Arc<dyn BrokerClient>,
    ) -> Self {
        let (errors_tx, errors_rx) = mpsc::channel(ERROR_CHANNEL_CAPACITY);
        let (dest_ready, _) = watch::channel(false);

        Self {
            inner: Arc::new(Inner {
                name: route.name(),
                config,
                route,
                source,
                dest,
                legs: TaskTracker::new(),
                handlers: TaskTracker::new(),
                shutdown: CancellationToken::new(),
                errors_tx,
                errors_rx: Mutex::new(Some(errors_rx)),
                dest_ready,
                state: Mutex::new(SessionState::Idle),
                stopping: AtomicBool::new(false),
            }),
        }
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Route in use
    pub fn route(&self) -> &R {
        &self.inner.route
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        *self.inner.state.lock()
    }

    /// Number of message handlers still running
    pub fn in_flight(&self) -> usize {
        self.inner.handlers.len()
    }

    /// Connectivity snapshot
    pub fn status(&self) -> SessionStatus {
        let source = self.inner.source.is_connected();
        let dest = self.inner.dest.is_connected();
        SessionStatus {
            source_broker_connected: source,
            dest_broker_connected: dest,
            status: source && (dest || self.inner.config.dry_run),
        }
    }

    fn set_state(&self, state: SessionState) {
        *self.inner.state.lock() = state;
        debug!(session = self.inner.name, state = %state, "Session state changed");
    }

    /// Connect, relay until cancelled or failed, then drain.
    ///
    /// A session runs once; a second call fails.
    pub async fn run(&self, parent: CancellationToken) -> Result<()> {
        let mut errors = self.inner.errors_rx.lock().take().ok_or_else(|| {
            RelayError::InvalidConfig(format!("{} session already started", self.inner.name))
        })?;

        info!(
            session = self.inner.name,
            source = %self.inner.config.source_topic,
            dry_run = self.inner.config.dry_run,
            "Starting session"
        );
        if !self.inner.shutdown.is_cancelled() {
            self.set_state(SessionState::Connecting);
        }

        let dest = self.clone();
        self.inner.legs.spawn(async move { dest.run_dest().await });
        let source = self.clone();
        self.inner.legs.spawn(async move { source.run_source().await });

        let result = tokio::select! {
            _ = parent.cancelled() => {
                info!(session = self.inner.name, "Session cancelled");
                Ok(())
            }
            _ = self.inner.shutdown.cancelled() => Ok(()),
            err = errors.recv() => match err {
                Some(e) => {
                    error!(
                        session = self.inner.name,
                        error = %e,
                        code = e.error_code(),
                        "Session failed"
                    );
                    Err(e)
                }
                None => Ok(()),
            },
        };

        self.stop().await;
        result
    }

    /// Cancel pending waits, disconnect both legs and wait for every handler.
    ///
    /// Safe to call more than once; later calls wait for the first to finish.
    pub async fn stop(&self) {
        if self.inner.stopping.swap(true, Ordering::SeqCst) {
            self.inner.legs.wait().await;
            self.inner.handlers.wait().await;
            return;
        }

        self.set_state(SessionState::Draining);
        info!(
            session = self.inner.name,
            in_flight = self.inner.handlers.len(),
            "Draining session"
        );
        self.inner.shutdown.cancel();

        for client in [&self.inner.source, &self.inner.dest] {
            if let Err(e) = client.disconnect().await {
                warn!(
                    session = self.inner.name,
                    client_id = client.client_id(),
                    error = %e,
                    "Disconnect failed"
                );
            }
        }

        self.inner.legs.close();
        self.inner.handlers.close();
        self.inner.legs.wait().await;
        self.inner.handlers.wait().await;

        self.set_state(SessionState::Stopped);
        info!(session = self.inner.name, "Session stopped");
    }

    fn report(&self, err: RelayError) {
        error!(
            session = self.inner.name,
            error = %err,
            code = err.error_code(),
            "Session error"
        );
        if self.inner.errors_tx.try_send(err).is_err() {
            debug!(session = self.inner.name, "Error channel full, dropping error");
        }
    }

    async fn run_dest(&self) {
        let dest = &self.inner.dest;
        let connected = tokio::select! {
            biased;
            _ = self.inner.shutdown.cancelled() => return self.abandon(dest).await,
            connected = dest.connect() => connected,
        };
        let mut events = match connected {
            Ok(events) => events,
            Err(e) => return self.report(e),
        };

        if self.inner.config.dry_run {
            info!(
                session = self.inner.name,
                client_id = dest.client_id(),
                "Dry run, disconnecting destination"
            );
            if let Err(e) = dest.disconnect().await {
                warn!(session = self.inner.name, error = %e, "Disconnect failed");
            }
        }
        self.inner.dest_ready.send_replace(true);

        loop {
            let event = tokio::select! {
                _ = self.inner.shutdown.cancelled() => break,
                event = events.recv() => event,
            };
            match event {
                None => break,
                Some(BrokerEvent::ConnectionLost(reason)) => warn!(
                    session = self.inner.name,
                    client_id = dest.client_id(),
                    reason = %reason,
                    "Destination connection lost"
                ),
                Some(BrokerEvent::Reconnected) => info!(
                    session = self.inner.name,
                    client_id = dest.client_id(),
                    "Destination reconnected"
                ),
                Some(BrokerEvent::Message(_)) => {}
            }
        }
    }

    /// Tear down a connect cut short by shutdown
    async fn abandon(&self, client: &Arc<dyn BrokerClient>) {
        if let Err(e) = client.disconnect().await {
            debug!(
                session = self.inner.name,
                client_id = client.client_id(),
                error = %e,
                "Disconnect after cancelled connect failed"
            );
        }
    }

    async fn subscribe(&self) -> bool {
        let filter = &self.inner.config.source_topic;
        let subscribed = tokio::select! {
            biased;
            _ = self.inner.shutdown.cancelled() => return false,
            subscribed = self.inner.source.subscribe(filter) => subscribed,
        };
        match subscribed {
            Ok(()) => true,
            Err(e) => {
                self.report(e);
                false
            }
        }
    }

    async fn run_source(&self) {
        let source = &self.inner.source;
        let connected = tokio::select! {
            biased;
            _ = self.inner.shutdown.cancelled() => return self.abandon(source).await,
            connected = source.connect() => connected,
        };
        let mut events = match connected {
            Ok(events) => events,
            Err(e) => return self.report(e),
        };

        if !self.subscribe().await {
            return;
        }
        if !self.inner.shutdown.is_cancelled() {
            self.set_state(SessionState::Ready);
        }

        loop {
            let event = tokio::select! {
                _ = self.inner.shutdown.cancelled() => break,
                event = events.recv() => event,
            };
            match event {
                None => break,
                Some(BrokerEvent::Message(message)) => {
                    let handler = self.clone();
                    self.inner
                        .handlers
                        .spawn(async move { handler.handle(message).await });
                }
                Some(BrokerEvent::Reconnected) => {
                    info!(
                        session = self.inner.name,
                        client_id = source.client_id(),
                        "Source reconnected, renewing subscription"
                    );
                    if !self.subscribe().await {
                        break;
                    }
                }
                Some(BrokerEvent::ConnectionLost(reason)) => warn!(
                    session = self.inner.name,
                    client_id = source.client_id(),
                    reason = %reason,
                    "Source connection lost"
                ),
            }
        }
    }

    async fn wait_dest_ready(&self) -> bool {
        let mut ready = self.inner.dest_ready.subscribe();
        loop {
            if *ready.borrow_and_update() {
                return true;
            }
            tokio::select! {
                _ = self.inner.shutdown.cancelled() => return false,
                changed = ready.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }
    }

    async fn handle(&self, message: InboundMessage) {
        info!(
            session = self.inner.name,
            topic = %message.topic,
            bytes = message.payload.len(),
            "<"
        );

        let Some(outbound) = self.inner.route.route(&message).await else {
            return;
        };

        if self.inner.config.dry_run {
            info!(
                session = self.inner.name,
                topic = %outbound.topic,
                bytes = outbound.body.len(),
                "Dry run, not publishing"
            );
            return;
        }

        if !self.wait_dest_ready().await {
            debug!(
                session = self.inner.name,
                topic = %outbound.topic,
                "Shutting down before destination was ready"
            );
            return;
        }

        let timeout = self.inner.config.publish_timeout;
        let topic = outbound.topic;
        let published = tokio::select! {
            biased;
            _ = self.inner.shutdown.cancelled() => {
                debug!(session = self.inner.name, topic = %topic, "Publish abandoned on shutdown");
                return;
            }
            published = tokio::time::timeout(timeout, self.inner.dest.publish(&topic, outbound.body)) => published,
        };

        match published {
            Ok(Ok(())) => info!(session = self.inner.name, topic = %topic, ">"),
            Ok(Err(e)) => self.report(e),
            Err(_) => self.report(RelayError::PublishTimeout {
                topic,
                duration_ms: timeout.as_millis() as u64,
            }),
        }
    }
}

impl<R: TopicRoute> StatusSource for SessionCore<R> {
    fn status(&self) -> SessionStatus {
        SessionCore::status(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Draining.to_string(), "draining");
        assert_eq!(
            serde_json::to_value(SessionState::Ready).unwrap(),
            serde_json::json!("ready")
        );
    }

    #[test]
    fn test_status_serializes_field_names() {
        let status = SessionStatus {
            source_broker_connected: true,
            dest_broker_connected: false,
            status: false,
        };
        assert_eq!(
            serde_json::to_value(status).unwrap(),
            serde_json::json!({
                "source_broker_connected": true,
                "dest_broker_connected": false,
                "status": false
            })
        );
    }
}
