use super::handle::TopicHandle;
use crate::{
    exchange::Connector,
    subscription::{Request, key::TopicKey},
};
use fnv::FnvHashMap;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// Outbound command sent from a [`Multiplexer`](crate::multiplexer::Multiplexer) to its
/// connection task.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Subscribe(Request),
    Unsubscribe(Request),
}

impl Command {
    pub(crate) fn request(&self) -> &Request {
        match self {
            Command::Subscribe(request) | Command::Unsubscribe(request) => request,
        }
    }
}

pub(crate) type CommandTx = mpsc::UnboundedSender<Command>;

/// Lifecycle of the single connection owned by a
/// [`Multiplexer`](crate::multiplexer::Multiplexer).
///
/// Transitions only ever move forwards: `Uninitialised -> Connecting -> Ready -> Closed`
/// (`Connecting -> Closed` if the connection cannot be opened).
#[derive(Debug)]
pub(crate) enum ConnectionState {
    Uninitialised,
    Connecting(CommandTx),
    Ready(CommandTx),
    Closed,
}

impl ConnectionState {
    /// Outbound command channel, if a connection has been initialised and is not yet closed.
    pub(crate) fn command_tx(&self) -> Option<&CommandTx> {
        match self {
            ConnectionState::Connecting(tx) | ConnectionState::Ready(tx) => Some(tx),
            ConnectionState::Uninitialised | ConnectionState::Closed => None,
        }
    }
}

/// Outcome of routing one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Routed {
    Delivered(TopicKey),
    Unrouted(TopicKey),
    Malformed,
}

/// Topic table and connection state, guarded together by one [`Mutex`] so that
/// check-and-create of the connection and of topic handles is atomic.
#[derive(Debug)]
pub(crate) struct TopicTable {
    pub(crate) connection: ConnectionState,
    pub(crate) topics: FnvHashMap<TopicKey, TopicHandle>,
}

impl Default for TopicTable {
    fn default() -> Self {
        Self {
            connection: ConnectionState::Uninitialised,
            topics: FnvHashMap::default(),
        }
    }
}

impl TopicTable {
    /// Route an inbound message to the [`TopicHandle`] its derived [`TopicKey`] addresses.
    pub(crate) fn route<Exchange>(&mut self, message: Value) -> Routed
    where
        Exchange: Connector,
    {
        let Some(key) = TopicKey::from_inbound::<Exchange>(&message) else {
            return Routed::Malformed;
        };

        match self.topics.get_mut(&key) {
            Some(handle) => {
                handle.publish(message);
                Routed::Delivered(key)
            }
            None => Routed::Unrouted(key),
        }
    }

    /// Transition `Connecting -> Ready`. Any other state is left untouched.
    pub(crate) fn mark_ready(&mut self) {
        if let ConnectionState::Connecting(tx) = &self.connection {
            self.connection = ConnectionState::Ready(tx.clone());
        }
    }

    /// Transition to `Closed`, removing every topic and so completing every open
    /// [`TopicStream`](super::handle::TopicStream). Returns the number of topics removed.
    pub(crate) fn close(&mut self) -> usize {
        self.connection = ConnectionState::Closed;
        let closed = self.topics.len();
        self.topics.clear();
        closed
    }
}

/// Lock the shared [`TopicTable`].
///
/// Every critical section leaves the table consistent before it can panic, so a poisoned lock
/// is recovered rather than propagated.
pub(crate) fn lock(table: &Mutex<TopicTable>) -> MutexGuard<'_, TopicTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{ExchangeId, coinbase::Coinbase};
    use feedmux_integration::error::SocketError;
    use futures::StreamExt;
    use serde_json::json;
    use url::Url;

    struct NoAliases;

    impl Connector for NoAliases {
        const ID: ExchangeId = ExchangeId::Mock;

        fn url() -> Result<Url, SocketError> {
            Url::parse("ws://127.0.0.1:1").map_err(SocketError::UrlParse)
        }
    }

    fn table_with(keys: &[TopicKey]) -> TopicTable {
        let mut table = TopicTable::default();
        for key in keys {
            table.topics.insert(key.clone(), TopicHandle::new());
        }
        table
    }

    #[test]
    fn test_route() {
        struct TestCase {
            input: Value,
            expected: Routed,
        }

        let cases = vec![
            TestCase {
                // TC0: ticker delivered
                input: json!({"type": "ticker", "product_id": "BTC-USD", "price": "50000"}),
                expected: Routed::Delivered(TopicKey::new("ticker", "BTC-USD")),
            },
            TestCase {
                // TC1: l2update delivered to level2 via alias
                input: json!({"type": "l2update", "product_id": "ETH-USD", "changes": []}),
                expected: Routed::Delivered(TopicKey::new("level2", "ETH-USD")),
            },
            TestCase {
                // TC2: topic never subscribed
                input: json!({"type": "ticker", "product_id": "ETH-USD"}),
                expected: Routed::Unrouted(TopicKey::new("ticker", "ETH-USD")),
            },
            TestCase {
                // TC3: subscription confirmation lacks product_id
                input: json!({"type": "subscriptions", "channels": []}),
                expected: Routed::Malformed,
            },
            TestCase {
                // TC4: error message lacks product_id
                input: json!({"type": "error", "message": "Failed to subscribe"}),
                expected: Routed::Malformed,
            },
        ];

        let mut table = table_with(&[
            TopicKey::new("ticker", "BTC-USD"),
            TopicKey::new("level2", "ETH-USD"),
        ]);

        for (index, test) in cases.into_iter().enumerate() {
            let actual = table.route::<Coinbase>(test.input);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_route_without_aliases_uses_type_verbatim() {
        let mut table = table_with(&[TopicKey::new("level2", "ETH-USD")]);

        let actual = table.route::<NoAliases>(json!({"type": "l2update", "product_id": "ETH-USD"}));
        assert_eq!(actual, Routed::Unrouted(TopicKey::new("l2update", "ETH-USD")));
    }

    #[test]
    fn test_route_updates_replay_value() {
        let key = TopicKey::new("ticker", "BTC-USD");
        let mut table = table_with(&[key.clone()]);

        table.route::<Coinbase>(json!({"type": "ticker", "product_id": "BTC-USD", "seq": 1}));
        table.route::<Coinbase>(json!({"type": "ticker", "product_id": "BTC-USD", "seq": 2}));

        assert_eq!(
            table.topics[&key].latest(),
            Some(&json!({"type": "ticker", "product_id": "BTC-USD", "seq": 2}))
        );
    }

    #[test]
    fn test_connection_state_transitions() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut table = TopicTable::default();
        assert!(table.connection.command_tx().is_none());

        // Ready is only reachable from Connecting
        table.mark_ready();
        assert!(matches!(table.connection, ConnectionState::Uninitialised));

        table.connection = ConnectionState::Connecting(tx);
        assert!(table.connection.command_tx().is_some());

        table.mark_ready();
        assert!(matches!(table.connection, ConnectionState::Ready(_)));
        assert!(table.connection.command_tx().is_some());

        table.close();
        assert!(matches!(table.connection, ConnectionState::Closed));
        assert!(table.connection.command_tx().is_none());

        table.mark_ready();
        assert!(matches!(table.connection, ConnectionState::Closed));
    }

    #[tokio::test]
    async fn test_close_completes_open_streams() {
        let key = TopicKey::new("ticker", "BTC-USD");
        let mut table = table_with(&[key.clone(), TopicKey::new("matches", "BTC-USD")]);
        let mut stream = table
            .topics
            .get_mut(&key)
            .map(TopicHandle::register::<Value>)
            .unwrap();

        assert_eq!(table.close(), 2);
        assert!(table.topics.is_empty());
        assert_eq!(stream.next().await, None);
    }

    #[test]
    fn test_command_request() {
        let request = Request::subscribe("ticker", "BTC-USD");
        assert_eq!(Command::Subscribe(request.clone()).request(), &request);
        assert_eq!(Command::Unsubscribe(request.clone()).request(), &request);
    }
}
