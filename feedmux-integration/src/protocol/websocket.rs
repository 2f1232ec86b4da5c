use super::{Connection, Transport};
use crate::error::SocketError;
use futures::{SinkExt, StreamExt, future};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};
use tracing::{debug, info, trace};
use url::Url;

/// Convenient type alias for a tungstenite `WebSocketStream`.
pub type WebSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Communicative type alias for a tungstenite [`Message`](tungstenite::Message).
pub type WsMessage = tungstenite::Message;

/// Communicative type alias for a tungstenite [`Error`](tungstenite::Error).
pub type WsError = tungstenite::Error;

/// Connect asynchronously to a [`WebSocket`] server.
pub async fn connect(url: &Url) -> Result<WebSocket, SocketError> {
    debug!(%url, "attempting to establish WebSocket connection");
    connect_async(url.as_str())
        .await
        .map(|(websocket, _)| websocket)
        .map_err(SocketError::from)
}

/// [`Transport`] over a `tokio-tungstenite` WebSocket.
///
/// Outbound `String` frames are sent as text messages. Inbound text messages are decoded into
/// JSON [`Value`]s, see [`process_frame`] for how every other message kind is handled.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct WebSocketTransport;

impl Transport for WebSocketTransport {
    async fn open(&self, url: &Url) -> Result<Connection, SocketError> {
        let websocket = connect(url).await?;
        info!(%url, "WebSocket connection established");

        let (ws_sink, ws_stream) = websocket.split();

        let sink = ws_sink.with(|frame: String| {
            future::ready(Ok::<WsMessage, SocketError>(WsMessage::text(frame)))
        });

        let stream = ws_stream.filter_map(|frame| future::ready(process_frame(frame)));

        Ok(Connection::new(Box::pin(sink), stream.boxed()))
    }
}

/// Decode a raw WebSocket frame into a JSON [`Value`].
///
/// Returns `None` for control and binary frames that carry no feed data. A `Close` frame maps
/// to a terminal [`SocketError::Terminated`], malformed JSON maps to a non-terminal
/// [`SocketError::Deserialise`].
pub fn process_frame(frame: Result<WsMessage, WsError>) -> Option<Result<Value, SocketError>> {
    match frame {
        Ok(WsMessage::Text(text)) => Some(serde_json::from_str::<Value>(text.as_str()).map_err(
            |error| SocketError::Deserialise {
                error,
                payload: text.as_str().to_owned(),
            },
        )),
        Ok(WsMessage::Close(close_frame)) => Some(Err(SocketError::Terminated(format!(
            "received WebSocket close frame: {close_frame:?}"
        )))),
        Ok(WsMessage::Ping(_) | WsMessage::Pong(_)) => {
            trace!("skipping WebSocket control frame");
            None
        }
        Ok(WsMessage::Binary(payload)) => {
            debug!(len = payload.len(), "skipping unexpected binary WebSocket frame");
            None
        }
        Ok(WsMessage::Frame(_)) => None,
        Err(error) => Some(Err(SocketError::from(error))),
    }
}
