use derive_more::Display;
use feedmux_integration::error::SocketError;
use serde::{Deserialize, Serialize};
use url::Url;

/// `Coinbase` [`Connector`] and associated channel and market types.
pub mod coinbase;

/// Unique identifier for an exchange feed server.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(rename = "exchange", rename_all = "snake_case")]
pub enum ExchangeId {
    #[display("mock")]
    Mock,
    #[display("coinbase")]
    Coinbase,
}

impl ExchangeId {
    /// Return the &str representation of this [`ExchangeId`]
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Mock => "mock",
            ExchangeId::Coinbase => "coinbase",
        }
    }
}

/// Defines the exchange specific knowledge a
/// [`Multiplexer`](crate::multiplexer::Multiplexer) needs: where to connect, and how inbound
/// message types map back onto subscribed channels.
pub trait Connector
where
    Self: Send + Sync + 'static,
{
    /// Unique identifier for the exchange server being connected with.
    const ID: ExchangeId;

    /// Base [`Url`] of the exchange server being connected with.
    fn url() -> Result<Url, SocketError>;

    /// Channel an inbound message `type` belongs to, when the response type differs from the
    /// subscribed channel name.
    fn channel_alias(_kind: &str) -> Option<&'static str> {
        None
    }

    /// Resolve the channel an inbound message `type` belongs to, falling back to the `type`
    /// itself when no alias exists.
    fn channel(kind: &str) -> &str {
        Self::channel_alias(kind).unwrap_or(kind)
    }
}
