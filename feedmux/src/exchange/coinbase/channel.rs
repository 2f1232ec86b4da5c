use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Type that names a [`Coinbase`](super::Coinbase) channel to be subscribed to.
///
/// See docs: <https://docs.cloud.coinbase.com/exchange/docs/websocket-channels>
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub struct CoinbaseChannel(pub SmolStr);

impl CoinbaseChannel {
    pub(super) const LEVEL2_STR: &'static str = "level2";
    pub(super) const MATCHES_STR: &'static str = "matches";

    /// [`Coinbase`](super::Coinbase) real-time price updates for every match.
    ///
    /// See docs: <https://docs.cloud.coinbase.com/exchange/docs/websocket-channels#ticker-channel>
    pub const TICKER: Self = Self(SmolStr::new_static("ticker"));

    /// [`Coinbase`](super::Coinbase) order book snapshot followed by incremental `l2update`s.
    ///
    /// See docs: <https://docs.cloud.coinbase.com/exchange/docs/websocket-channels#level2-channel>
    pub const LEVEL2: Self = Self(SmolStr::new_static(Self::LEVEL2_STR));

    /// [`Coinbase`](super::Coinbase) real-time trades channel.
    ///
    /// See docs: <https://docs.cloud.coinbase.com/exchange/docs/websocket-channels#match>
    pub const MATCHES: Self = Self(SmolStr::new_static(Self::MATCHES_STR));

    /// [`Coinbase`](super::Coinbase) per-product heartbeat messages.
    pub const HEARTBEAT: Self = Self(SmolStr::new_static("heartbeat"));

    /// [`Coinbase`](super::Coinbase) product and currency status updates.
    pub const STATUS: Self = Self(SmolStr::new_static("status"));
}

impl AsRef<str> for CoinbaseChannel {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for CoinbaseChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}
