use crate::{
    config::MultiplexerConfig,
    error::DataError,
    exchange::{Connector, ExchangeId},
    streams::{
        handle::{TopicHandle, TopicStream},
        table::{Command, ConnectionState, TopicTable, lock},
        task::connection_task,
    },
    subscription::{Request, RequestKind, key::TopicKey},
};
use derive_more::Display;
use feedmux_integration::protocol::{Transport, websocket::WebSocketTransport};
use serde::{Deserialize, Serialize};
use std::{
    collections::hash_map::Entry,
    marker::PhantomData,
    sync::{Arc, Mutex},
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Observable lifecycle of the single connection owned by a [`Multiplexer`].
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// No subscribe has been issued yet, so no connection exists.
    #[display("uninitialised")]
    Uninitialised,
    /// Connection task spawned, outbound frames are queued until the connection opens.
    #[display("connecting")]
    Connecting,
    #[display("ready")]
    Ready,
    /// Connection failed or was closed. It is never re-created.
    #[display("closed")]
    Closed,
}

impl From<&ConnectionState> for ConnectionStatus {
    fn from(state: &ConnectionState) -> Self {
        match state {
            ConnectionState::Uninitialised => Self::Uninitialised,
            ConnectionState::Connecting(_) => Self::Connecting,
            ConnectionState::Ready(_) => Self::Ready,
            ConnectionState::Closed => Self::Closed,
        }
    }
}

/// Single-connection, multi-subscription stream multiplexer.
///
/// One [`Transport`] connection to the `Exchange` carries every topic. The connection is
/// opened lazily by the first [`subscribe`](Self::subscribe) and is created at most once per
/// [`Multiplexer`]. Inbound messages are routed to the [`TopicHandle`] addressed by their
/// [`TopicKey`], and each topic replays its latest message to newly joining consumers.
///
/// `subscribe` and `unsubscribe` never wait on the network: request frames are queued for the
/// connection task and the call returns immediately. A Tokio runtime must be running.
///
/// If the connection fails or is closed by the server, every open [`TopicStream`] completes and
/// the [`Multiplexer`] reports [`ConnectionStatus::Closed`]. Subsequent subscribes yield empty
/// streams, resubscribing is left to the caller (eg/ via a fresh [`Multiplexer`]).
pub struct Multiplexer<Exchange, Tr = WebSocketTransport> {
    transport: Arc<Tr>,
    config: MultiplexerConfig,
    table: Arc<Mutex<TopicTable>>,
    phantom: PhantomData<fn() -> Exchange>,
}

impl<Exchange, Tr> std::fmt::Debug for Multiplexer<Exchange, Tr>
where
    Exchange: Connector,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = lock(&self.table);
        f.debug_struct("Multiplexer")
            .field("exchange", &Exchange::ID)
            .field("status", &ConnectionStatus::from(&table.connection))
            .field("num_topics", &table.topics.len())
            .finish()
    }
}

impl<Exchange> Default for Multiplexer<Exchange, WebSocketTransport>
where
    Exchange: Connector,
{
    fn default() -> Self {
        Self::new(WebSocketTransport)
    }
}

impl<Exchange, Tr> Multiplexer<Exchange, Tr>
where
    Exchange: Connector,
    Tr: Transport,
{
    /// Construct a new [`Multiplexer`] with the default [`MultiplexerConfig`].
    ///
    /// No connection is opened until the first [`subscribe`](Self::subscribe).
    pub fn new(transport: Tr) -> Self {
        Self::with_config(transport, MultiplexerConfig::default())
    }

    pub fn with_config(transport: Tr, config: MultiplexerConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            config,
            table: Arc::new(Mutex::new(TopicTable::default())),
            phantom: PhantomData,
        }
    }

    pub fn exchange(&self) -> ExchangeId {
        Exchange::ID
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        ConnectionStatus::from(&lock(&self.table).connection)
    }

    /// [`TopicKey`]s with an active [`TopicHandle`], sorted.
    pub fn active_topics(&self) -> Vec<TopicKey> {
        let mut topics = lock(&self.table).topics.keys().cloned().collect::<Vec<_>>();
        topics.sort_unstable();
        topics
    }

    /// Subscribe to the topic named by a [`RequestKind::Subscribe`] [`Request`].
    ///
    /// Opens the connection on first use. The subscribe frame is only sent when no
    /// [`TopicHandle`] exists yet for the topic; re-subscribing returns another view over the
    /// same live topic. The returned [`TopicStream`] replays the topic's latest message (if any)
    /// before live messages.
    ///
    /// Returns an already terminated [`TopicStream`] if the [`Request`] is not a
    /// [`RequestKind::Subscribe`]. The kind is checked before the lazy connection
    /// initialisation, so such a call never opens the connection. Also returns one if the
    /// connection is closed or cannot be initialised.
    pub fn subscribe<T>(&self, request: &Request) -> TopicStream<T> {
        let exchange = Exchange::ID;

        if request.kind != RequestKind::Subscribe {
            debug!(%exchange, ?request, "ignoring subscribe with non-subscribe request");
            return TopicStream::empty();
        }

        let mut table = lock(&self.table);

        if matches!(table.connection, ConnectionState::Uninitialised) {
            if let Err(error) = self.init_connection(&mut table) {
                error!(%exchange, %error, "failed to initialise connection");
                return TopicStream::empty();
            }
        }

        let Some(command_tx) = table.connection.command_tx().cloned() else {
            warn!(%exchange, ?request, "ignoring subscribe on closed connection");
            return TopicStream::empty();
        };

        let key = request.key();
        let handle = match table.topics.entry(key) {
            Entry::Occupied(entry) => {
                debug!(%exchange, key = %entry.key(), "topic already subscribed, reusing handle");
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                if command_tx.send(Command::Subscribe(request.clone())).is_err() {
                    warn!(%exchange, ?request, "connection task terminated, ignoring subscribe");
                    return TopicStream::empty();
                }
                debug!(%exchange, key = %entry.key(), "subscribed to new topic");
                entry.insert(TopicHandle::new())
            }
        };

        handle.register()
    }

    /// Unsubscribe from the topic named by a [`RequestKind::Unsubscribe`] [`Request`].
    ///
    /// The unsubscribe frame is sent whenever a connection exists, even if no local topic is
    /// active. An active topic is removed, completing all of its [`TopicStream`]s. No
    /// acknowledgement from the server is awaited.
    ///
    /// Does nothing if no connection exists, or if the [`Request`] is not a
    /// [`RequestKind::Unsubscribe`].
    pub fn unsubscribe(&self, request: &Request) {
        let exchange = Exchange::ID;

        let mut table = lock(&self.table);

        let Some(command_tx) = table.connection.command_tx() else {
            debug!(%exchange, ?request, "ignoring unsubscribe without connection");
            return;
        };

        if request.kind != RequestKind::Unsubscribe {
            debug!(%exchange, ?request, "ignoring unsubscribe with non-unsubscribe request");
            return;
        }

        if command_tx.send(Command::Unsubscribe(request.clone())).is_err() {
            warn!(%exchange, ?request, "connection task terminated, unsubscribe frame dropped");
        }

        let key = request.key();
        match table.topics.remove(&key) {
            Some(handle) => {
                debug!(%exchange, %key, consumers = handle.consumers(), "unsubscribed from topic")
            }
            None => debug!(%exchange, %key, "unsubscribed from inactive topic"),
        }
    }

    /// Spawn the connection task and transition `Uninitialised -> Connecting`.
    ///
    /// Must be called with the table lock held. Calling it once a connection exists is a logic
    /// error and returns [`DataError::ConnectionAlreadyInitialised`].
    fn init_connection(&self, table: &mut TopicTable) -> Result<(), DataError> {
        let exchange = Exchange::ID;

        if !matches!(table.connection, ConnectionState::Uninitialised) {
            error!(
                %exchange,
                status = %ConnectionStatus::from(&table.connection),
                "attempted to initialise connection more than once"
            );
            return Err(DataError::ConnectionAlreadyInitialised);
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| DataError::NoRuntime)?;

        let url = match &self.config.url {
            Some(url) => url.clone(),
            None => Exchange::url()?,
        };

        info!(%exchange, %url, policy = ?self.config.connect_retry, "initialising connection");

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        runtime.spawn(connection_task::<Exchange, Tr>(
            Arc::clone(&self.transport),
            url,
            self.config.connect_retry,
            command_rx,
            Arc::downgrade(&self.table),
        ));

        table.connection = ConnectionState::Connecting(command_tx);
        Ok(())
    }
}
