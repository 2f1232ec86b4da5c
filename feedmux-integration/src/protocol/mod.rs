use crate::error::SocketError;
use futures::{Sink, stream::BoxStream};
use serde_json::Value;
use std::{fmt::Debug, future::Future, pin::Pin};
use url::Url;

/// `tokio-tungstenite` WebSocket [`Transport`] implementation and frame decoding.
pub mod websocket;

/// Outbound half of a [`Connection`]: accepts serialised text frames.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = SocketError> + Send>>;

/// Inbound half of a [`Connection`]: lazily yields decoded frames as they arrive, ending when
/// the connection closes.
pub type FrameStream = BoxStream<'static, Result<Value, SocketError>>;

/// A single open duplex connection produced by a [`Transport`].
pub struct Connection {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl Connection {
    pub fn new(sink: FrameSink, stream: FrameStream) -> Self {
        Self { sink, stream }
    }
}

impl Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

/// Opens physical connections to an endpoint.
///
/// Decoding of the wire format happens here, so consumers of a [`Connection`] only ever see
/// JSON [`Value`]s. An `Err` yielded by the inbound [`FrameStream`] for which
/// [`SocketError::is_terminal`] holds signals the end of the connection.
pub trait Transport
where
    Self: Send + Sync + 'static,
{
    fn open(&self, url: &Url) -> impl Future<Output = Result<Connection, SocketError>> + Send;
}
