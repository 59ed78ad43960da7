//! [`BrokerClient`] over rumqttc
//!
//! The rumqttc event loop runs in its own task. A failed first connect is
//! returned from [`BrokerClient::connect`]; after that the loop keeps polling
//! through dropped connections, which is what re-establishes the session with
//! the broker. Subscriptions are renewed by the owner on
//! [`BrokerEvent::Reconnected`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
    SubscribeReasonCode, Transport,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::broker::{BrokerClient, BrokerEvent, InboundMessage};
use crate::config::BrokerConfig;
use crate::error::{RelayError, Result};

/// Delay before the event loop retries a failed connection
const RECONNECT_DELAY: Duration = Duration::from_secs(1);
/// Capacity of the rumqttc request queue
const REQUEST_CAPACITY: usize = 64;
/// Capacity of the event channel handed to the owner
const EVENT_CAPACITY: usize = 256;
/// Largest packet accepted or sent
const MAX_PACKET_SIZE: usize = 256 * 1024;

type Ack = oneshot::Sender<std::result::Result<(), String>>;

/// Broker address split into its connection parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    /// Host name or IP
    pub host: String,
    /// TCP port
    pub port: u16,
    /// Use TLS
    pub tls: bool,
}

impl BrokerAddress {
    /// Parse `tcp://`, `mqtt://`, `ssl://`, `tls://` or `mqtts://` URLs
    pub fn parse(address: &str) -> Result<Self> {
        let url = Url::parse(address)
            .map_err(|e| RelayError::InvalidBrokerUrl(format!("{}: {}", address, e)))?;

        let tls = match url.scheme() {
            "tcp" | "mqtt" => false,
            "ssl" | "tls" | "mqtts" => true,
            other => {
                return Err(RelayError::InvalidBrokerUrl(format!(
                    "{}: unsupported scheme {}",
                    address, other
                )))
            }
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| RelayError::InvalidBrokerUrl(format!("{}: missing host", address)))?
            .to_string();
        let port = url.port().unwrap_or(if tls { 8883 } else { 1883 });

        Ok(Self { host, port, tls })
    }
}

/// Build rumqttc options from broker settings
pub fn mqtt_options(config: &BrokerConfig) -> Result<MqttOptions> {
    let address = BrokerAddress::parse(&config.address)?;

    let mut options = MqttOptions::new(&config.client_id, address.host, address.port);
    options.set_keep_alive(config.keepalive);
    options.set_clean_session(true);
    options.set_max_packet_size(MAX_PACKET_SIZE, MAX_PACKET_SIZE);

    if let Some(username) = config.username.as_deref().filter(|u| !u.is_empty()) {
        options.set_credentials(username, config.password.clone().unwrap_or_default());
    }
    if address.tls {
        options.set_transport(Transport::tls_with_default_config());
    }
    Ok(options)
}

struct Running {
    client: AsyncClient,
    task: JoinHandle<()>,
    shutdown: CancellationToken,
}

/// MQTT connection backed by rumqttc.
pub struct MqttClient {
    client_id: String,
    options: MqttOptions,
    quiesce: Duration,
    running: Mutex<Option<Running>>,
    connected: Arc<AtomicBool>,
    pending_subscribes: Arc<Mutex<VecDeque<Ack>>>,
}

impl MqttClient {
    /// Create a client; nothing is sent until [`BrokerClient::connect`].
    pub fn new(config: &BrokerConfig, quiesce: Duration) -> Result<Self> {
        Ok(Self {
            client_id: config.client_id.clone(),
            options: mqtt_options(config)?,
            quiesce,
            running: Mutex::new(None),
            connected: Arc::new(AtomicBool::new(false)),
            pending_subscribes: Arc::new(Mutex::new(VecDeque::new())),
        })
    }

    fn client(&self) -> Option<AsyncClient> {
        self.running.lock().as_ref().map(|r| r.client.clone())
    }
}

#[async_trait]
impl BrokerClient for MqttClient {
    async fn connect(&self) -> Result<mpsc::Receiver<BrokerEvent>> {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);
        let (connack_tx, connack_rx) = oneshot::channel();

        {
            let mut running = self.running.lock();
            if running.is_some() {
                return Err(RelayError::connect(&self.client_id, "already connected"));
            }

            let (client, eventloop) = AsyncClient::new(self.options.clone(), REQUEST_CAPACITY);
            let shutdown = CancellationToken::new();
            let driver = EventDriver {
                client_id: self.client_id.clone(),
                connected: self.connected.clone(),
                pending_subscribes: self.pending_subscribes.clone(),
                events: events_tx,
                connack: Some(connack_tx),
                shutdown: shutdown.clone(),
            };
            let task = tokio::spawn(driver.run(eventloop));
            *running = Some(Running {
                client,
                task,
                shutdown,
            });
        }

        debug!(client_id = %self.client_id, "Waiting for broker acknowledgment");
        match connack_rx.await {
            Ok(Ok(())) => Ok(events_rx),
            Ok(Err(reason)) => {
                self.disconnect().await?;
                Err(RelayError::connect(&self.client_id, reason))
            }
            Err(_) => Err(RelayError::connect(&self.client_id, "event loop stopped")),
        }
    }

    async fn subscribe(&self, filter: &str) -> Result<()> {
        let client = self.client().ok_or_else(|| RelayError::Subscribe {
            filter: filter.to_string(),
            reason: "not connected".into(),
        })?;

        let (ack_tx, ack_rx) = oneshot::channel();
        self.pending_subscribes.lock().push_back(ack_tx);

        client
            .subscribe(filter, QoS::AtMostOnce)
            .await
            .map_err(|e| RelayError::Subscribe {
                filter: filter.to_string(),
                reason: e.to_string(),
            })?;

        match ack_rx.await {
            Ok(Ok(())) => {
                info!(client_id = %self.client_id, filter = %filter, "Subscribed");
                Ok(())
            }
            Ok(Err(reason)) => Err(RelayError::Subscribe {
                filter: filter.to_string(),
                reason,
            }),
            Err(_) => Err(RelayError::Subscribe {
                filter: filter.to_string(),
                reason: "connection closed before acknowledgment".into(),
            }),
        }
    }

    async fn publish(&self, topic: &str, payload: Bytes) -> Result<()> {
        let client = self.client().ok_or_else(|| RelayError::Publish {
            topic: topic.to_string(),
            reason: "not connected".into(),
        })?;

        client
            .publish_bytes(topic, QoS::AtMostOnce, false, payload)
            .await
            .map_err(|e| RelayError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })
    }

    async fn disconnect(&self) -> Result<()> {
        let Some(mut running) = self.running.lock().take() else {
            return Ok(());
        };

        if self.connected.load(Ordering::SeqCst) {
            if let Err(e) = running.client.disconnect().await {
                debug!(client_id = %self.client_id, error = %e, "Disconnect request not sent");
            }
        }

        if tokio::time::timeout(self.quiesce, &mut running.task)
            .await
            .is_err()
        {
            running.shutdown.cancel();
            let _ = running.task.await;
        }

        self.connected.store(false, Ordering::SeqCst);
        info!(client_id = %self.client_id, "Disconnected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn client_id(&self) -> &str {
        &self.client_id
    }
}

struct EventDriver {
    client_id: String,
    connected: Arc<AtomicBool>,
    pending_subscribes: Arc<Mutex<VecDeque<Ack>>>,
    events: mpsc::Sender<BrokerEvent>,
    connack: Option<Ack>,
    shutdown: CancellationToken,
}

impl EventDriver {
    async fn run(mut self, mut eventloop: EventLoop) {
        loop {
            let polled = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                polled = eventloop.poll() => polled,
            };

            match polled {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if ack.code != ConnectReturnCode::Success {
                        let reason = format!("connection refused: {:?}", ack.code);
                        if let Some(tx) = self.connack.take() {
                            let _ = tx.send(Err(reason));
                            break;
                        }
                        warn!(client_id = %self.client_id, reason = %reason, "Reconnect refused");
                        continue;
                    }

                    self.connected.store(true, Ordering::SeqCst);
                    match self.connack.take() {
                        Some(tx) => {
                            info!(client_id = %self.client_id, "Connected to broker");
                            let _ = tx.send(Ok(()));
                        }
                        None => {
                            info!(client_id = %self.client_id, "Reconnected to broker");
                            let _ = self.events.send(BrokerEvent::Reconnected).await;
                        }
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let message = InboundMessage {
                        topic: publish.topic.clone(),
                        payload: publish.payload.clone(),
                    };
                    let _ = self.events.send(BrokerEvent::Message(message)).await;
                }
                Ok(Event::Incoming(Packet::SubAck(ack))) => {
                    let result = if ack
                        .return_codes
                        .iter()
                        .any(|code| matches!(code, SubscribeReasonCode::Failure))
                    {
                        Err("subscription refused by broker".to_string())
                    } else {
                        Ok(())
                    };
                    if let Some(tx) = self.pending_subscribes.lock().pop_front() {
                        let _ = tx.send(result);
                    }
                }
                Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
                Ok(_) => {}
                Err(e) => {
                    if let Some(tx) = self.connack.take() {
                        let _ = tx.send(Err(e.to_string()));
                        break;
                    }

                    if self.connected.swap(false, Ordering::SeqCst) {
                        warn!(client_id = %self.client_id, error = %e, "Connection lost");
                        let _ = self
                            .events
                            .send(BrokerEvent::ConnectionLost(e.to_string()))
                            .await;
                    } else {
                        debug!(client_id = %self.client_id, error = %e, "Connect attempt failed");
                    }

                    for tx in self.pending_subscribes.lock().drain(..) {
                        let _ = tx.send(Err(e.to_string()));
                    }

                    tokio::select! {
                        _ = self.shutdown.cancelled() => break,
                        _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                    }
                }
            }
        }

        self.connected.store(false, Ordering::SeqCst);
        debug!(client_id = %self.client_id, "Event loop stopped");
    }
}
