//! Event Channel Client
//!
//! Explicitly constructed (no import-time singleton): build one at
//! application start, clone it into every consumer, call [`close`] on
//! teardown. A background read task dispatches inbound messages to
//! per-event handlers; [`Subscription`] guards unsubscribe on drop so
//! teardown is mechanical rather than conventional.
//!
//! [`close`]: EventChannelClient::close

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch, RwLock};
use tokio_util::sync::CancellationToken;

use super::transport::{MemoryTransport, TcpTransport, TlsTransport, Transport};
use super::ChannelError;
use crate::config::ClientConfig;
use serde::Serialize;
use shared::events::{ChannelMessage, EventName, JoinPayload};

type Handler = Arc<dyn Fn(&ChannelMessage) + Send + Sync>;

/// Connection state published over a watch channel.
///
/// Consumers that care about staleness re-fetch authoritative state on
/// every transition back to `Connected`: missed pushes are never
/// replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Reconnecting { attempt: u32 },
    /// Reconnect attempts exhausted; the client stays down until
    /// rebuilt
    Disconnected,
}

#[derive(Default)]
struct HandlerRegistry {
    next_id: u64,
    handlers: HashMap<EventName, Vec<(u64, Handler)>>,
}

impl HandlerRegistry {
    fn insert(&mut self, event: EventName, handler: Handler) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.handlers.entry(event).or_default().push((id, handler));
        id
    }

    fn remove(&mut self, event: EventName, id: u64) {
        if let Some(list) = self.handlers.get_mut(&event) {
            list.retain(|(handler_id, _)| *handler_id != id);
            if list.is_empty() {
                self.handlers.remove(&event);
            }
        }
    }

    fn matching(&self, event: EventName) -> Vec<Handler> {
        self.handlers
            .get(&event)
            .map(|list| list.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default()
    }
}

/// Active subscription to one event name.
///
/// Dropping the guard unsubscribes; views must hold their
/// subscriptions for as long as they render and release them on
/// teardown.
pub struct Subscription {
    event: EventName,
    id: u64,
    registry: Arc<Mutex<HandlerRegistry>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.registry.lock() {
            registry.remove(self.event, self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("id", &self.id)
            .finish()
    }
}

/// How to re-establish the connection after a read failure.
#[derive(Debug, Clone)]
enum ConnectSpec {
    Tcp { addr: String },
    Tls { addr: String, domain: String },
    /// In-process channel; cannot be redialed
    Memory,
}

impl ConnectSpec {
    async fn dial(&self) -> Result<Arc<dyn Transport>, ChannelError> {
        match self {
            ConnectSpec::Tcp { addr } => Ok(Arc::new(TcpTransport::connect(addr).await?)),
            ConnectSpec::Tls { addr, domain } => {
                Ok(Arc::new(TlsTransport::connect(addr, domain).await?))
            }
            ConnectSpec::Memory => Err(ChannelError::Closed),
        }
    }
}

struct ClientShared {
    transport: RwLock<Arc<dyn Transport>>,
    spec: ConnectSpec,
    registry: Arc<Mutex<HandlerRegistry>>,
    identity: Mutex<Option<String>>,
    status_tx: watch::Sender<ConnectionStatus>,
    shutdown: CancellationToken,
    reconnect_delay: Duration,
    max_reconnect_attempts: u32,
}

/// Event channel client.
#[derive(Clone)]
pub struct EventChannelClient {
    shared: Arc<ClientShared>,
}

impl std::fmt::Debug for EventChannelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannelClient")
            .field("spec", &self.shared.spec)
            .finish()
    }
}

impl EventChannelClient {
    /// Connect using the configured channel address (TLS when a server
    /// name is configured, plain TCP otherwise).
    pub async fn connect(config: &ClientConfig) -> Result<Self, ChannelError> {
        let addr = config
            .channel_addr
            .clone()
            .ok_or_else(|| ChannelError::Connection("no channel address configured".to_string()))?;

        let (spec, transport): (ConnectSpec, Arc<dyn Transport>) = match &config.channel_tls_domain
        {
            Some(domain) => (
                ConnectSpec::Tls {
                    addr: addr.clone(),
                    domain: domain.clone(),
                },
                Arc::new(TlsTransport::connect(&addr, domain).await?),
            ),
            None => (
                ConnectSpec::Tcp { addr: addr.clone() },
                Arc::new(TcpTransport::connect(&addr).await?),
            ),
        };

        Ok(Self::start(
            spec,
            transport,
            config.reconnect_delay,
            config.max_reconnect_attempts,
        ))
    }

    /// Create an in-process client (tests).
    pub fn memory(
        server_broadcast_tx: &broadcast::Sender<ChannelMessage>,
        client_to_server_tx: &broadcast::Sender<ChannelMessage>,
    ) -> Self {
        let transport = Arc::new(MemoryTransport::new(server_broadcast_tx, client_to_server_tx));
        Self::start(ConnectSpec::Memory, transport, Duration::from_millis(50), 1)
    }

    fn start(
        spec: ConnectSpec,
        transport: Arc<dyn Transport>,
        reconnect_delay: Duration,
        max_reconnect_attempts: u32,
    ) -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::Connected);
        let shared = Arc::new(ClientShared {
            transport: RwLock::new(transport),
            spec,
            registry: Arc::new(Mutex::new(HandlerRegistry::default())),
            identity: Mutex::new(None),
            status_tx,
            shutdown: CancellationToken::new(),
            reconnect_delay,
            max_reconnect_attempts,
        });

        let task_shared = shared.clone();
        tokio::spawn(async move {
            Self::read_loop(task_shared).await;
        });

        Self { shared }
    }

    async fn read_loop(shared: Arc<ClientShared>) {
        loop {
            let transport = shared.transport.read().await.clone();
            tokio::select! {
                _ = shared.shutdown.cancelled() => break,
                result = transport.read_message() => match result {
                    Ok(msg) => Self::dispatch(&shared.registry, &msg),
                    Err(e) => {
                        tracing::warn!(error = %e, "Event channel read failed");
                        if !Self::reconnect(&shared).await {
                            break;
                        }
                    }
                }
            }
        }
        tracing::debug!("Event channel read task stopped");
    }

    /// Handlers run on the read task and must not block.
    fn dispatch(registry: &Arc<Mutex<HandlerRegistry>>, msg: &ChannelMessage) {
        let handlers = match registry.lock() {
            Ok(registry) => registry.matching(msg.event),
            Err(_) => return,
        };
        if handlers.is_empty() {
            tracing::trace!(event = %msg.event, "No subscribers for event");
        }
        for handler in handlers {
            handler(msg);
        }
    }

    /// Returns true when a new transport is in place.
    async fn reconnect(shared: &Arc<ClientShared>) -> bool {
        if matches!(shared.spec, ConnectSpec::Memory) {
            let _ = shared.status_tx.send(ConnectionStatus::Disconnected);
            return false;
        }

        for attempt in 1..=shared.max_reconnect_attempts {
            let _ = shared
                .status_tx
                .send(ConnectionStatus::Reconnecting { attempt });

            tokio::select! {
                _ = shared.shutdown.cancelled() => return false,
                _ = tokio::time::sleep(shared.reconnect_delay) => {}
            }

            match shared.spec.dial().await {
                Ok(transport) => {
                    *shared.transport.write().await = transport.clone();

                    // Rejoin the identity room; pushes missed while down
                    // are gone, so consumers re-fetch on Connected.
                    let identity = shared.identity.lock().ok().and_then(|i| i.clone());
                    if let Some(email) = identity {
                        match ChannelMessage::encode(EventName::Join, &JoinPayload { email }) {
                            Ok(msg) => {
                                if let Err(e) = transport.write_message(&msg).await {
                                    tracing::warn!(error = %e, "Failed to rejoin identity room");
                                }
                            }
                            Err(e) => tracing::warn!(error = %e, "Failed to encode join"),
                        }
                    }

                    tracing::info!("Event channel reconnected");
                    let _ = shared.status_tx.send(ConnectionStatus::Connected);
                    return true;
                }
                Err(e) => {
                    tracing::warn!(
                        "Reconnect attempt {}/{} failed: {}",
                        attempt,
                        shared.max_reconnect_attempts,
                        e
                    );
                }
            }
        }

        tracing::error!("Event channel reconnect attempts exhausted");
        let _ = shared.status_tx.send(ConnectionStatus::Disconnected);
        false
    }

    /// Register a handler for one event name.
    pub fn subscribe<F>(&self, event: EventName, handler: F) -> Subscription
    where
        F: Fn(&ChannelMessage) + Send + Sync + 'static,
    {
        let id = self
            .shared
            .registry
            .lock()
            .expect("handler registry poisoned")
            .insert(event, Arc::new(handler));
        Subscription {
            event,
            id,
            registry: self.shared.registry.clone(),
        }
    }

    /// Emit an event upstream, fire-and-forget.
    ///
    /// Delivery is at-most-once: an emit lost to a disconnection is
    /// dropped, never buffered for replay.
    pub async fn emit<T: Serialize>(
        &self,
        event: EventName,
        payload: &T,
    ) -> Result<(), ChannelError> {
        let msg = ChannelMessage::encode(event, payload)?;
        let transport = self.shared.transport.read().await.clone();
        transport.write_message(&msg).await
    }

    /// Set the session identity and join its room.
    ///
    /// The backend routes identity-scoped events only to joined
    /// connections; the room is rejoined automatically on reconnect.
    pub async fn set_identity(&self, email: &str) -> Result<(), ChannelError> {
        if let Ok(mut identity) = self.shared.identity.lock() {
            *identity = Some(email.to_string());
        }
        self.emit(
            EventName::Join,
            &JoinPayload {
                email: email.to_string(),
            },
        )
        .await
    }

    /// Watch the connection state.
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status_tx.subscribe()
    }

    /// Stop the read task and close the connection.
    pub async fn close(&self) {
        self.shared.shutdown.cancel();
        let transport = self.shared.transport.read().await.clone();
        if let Err(e) = transport.close().await {
            tracing::debug!(error = %e, "Error closing event channel transport");
        }
    }
}
