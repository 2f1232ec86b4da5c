use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// All socket IO related errors generated in `feedmux-integration`.
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("UrlParse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),

    #[error("Deserialising JSON error: {error} for payload: {payload}")]
    Deserialise {
        error: serde_json::Error,
        payload: String,
    },

    #[error("Serialising JSON error: {0}")]
    Serialise(#[from] serde_json::Error),

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("connection terminated: {0}")]
    Terminated(String),
}

impl From<tungstenite::Error> for SocketError {
    fn from(value: tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(value))
    }
}

impl SocketError {
    /// Determines if the error ends the inbound frame sequence it was yielded from.
    ///
    /// Only a single undecodable frame is recoverable, every other error means the underlying
    /// connection is no longer usable.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Deserialise { .. })
    }

    /// Determines if a failed attempt to open a connection is worth retrying.
    ///
    /// Retries on IO failures, server errors and rate limits. Does not retry on TLS, URL or
    /// client handshake errors.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::WebSocket(error) => match error.as_ref() {
                tungstenite::Error::Io(_) => true,
                tungstenite::Error::Http(response) => {
                    let status = response.status();
                    status.is_server_error() || status.as_u16() == 429
                }
                _ => false,
            },
            _ => false,
        }
    }
}
