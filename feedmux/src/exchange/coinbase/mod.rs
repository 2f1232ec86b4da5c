use self::channel::CoinbaseChannel;
use crate::exchange::{Connector, ExchangeId};
use derive_more::Display;
use feedmux_integration::error::SocketError;
use url::Url;

/// Defines the type that names a [`Coinbase`] channel to be subscribed to.
pub mod channel;

/// Defines the type that names a [`Coinbase`] market (product) to be subscribed to.
pub mod market;

/// [`Coinbase`] server base url.
///
/// See docs: <https://docs.cloud.coinbase.com/exchange/docs/websocket-overview>
pub const BASE_URL_COINBASE: &str = "wss://ws-feed.exchange.coinbase.com";

/// [`Coinbase`] exchange.
///
/// Inbound messages are keyed by their `type`, which normally equals the subscribed channel.
/// The exceptions are resolved by [`Connector::channel_alias`]:
///
/// | message `type` | channel   |
/// |----------------|-----------|
/// | `snapshot`     | `level2`  |
/// | `l2update`     | `level2`  |
/// | `match`        | `matches` |
///
/// See docs: <https://docs.cloud.coinbase.com/exchange/docs/websocket-overview>
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Display)]
pub struct Coinbase;

impl Connector for Coinbase {
    const ID: ExchangeId = ExchangeId::Coinbase;

    fn url() -> Result<Url, SocketError> {
        Url::parse(BASE_URL_COINBASE).map_err(SocketError::UrlParse)
    }

    fn channel_alias(kind: &str) -> Option<&'static str> {
        match kind {
            "snapshot" | "l2update" => Some(CoinbaseChannel::LEVEL2_STR),
            "match" => Some(CoinbaseChannel::MATCHES_STR),
            _ => None,
        }
    }
}
